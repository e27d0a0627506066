//! Zone file handling
//!
//! - [`parse_zone`] / [`parse_zone_file`]: bind syntax to [`ResourceRecord`]s
//! - [`translate`]: records to [`RecordSet`]s, decoding `_alias` TXT records
//! - [`render_zone`]: record sets back to bind text
//! - [`load_zone`]: all of the above for one configured domain

mod lexer;
pub mod parser;
pub mod record;
pub mod render;
pub mod translate;

pub use parser::{parse_ttl, parse_zone, parse_zone_file};
pub use record::{
    ALIAS_TTL, AliasTarget, RecordKey, RecordSet, RecordTarget, RecordType, ResourceRecord,
    normalize_name,
};
pub use render::render_zone;
pub use translate::translate;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// The desired state of one hosted zone, as read from its zone file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredZone {
    /// Absolute zone name (`example.com.`)
    pub name: String,
    pub source: PathBuf,
    pub record_sets: Vec<RecordSet>,
}

/// Parse and translate the zone file for `zone_name`.
pub fn load_zone(zone_name: &str, path: &Path) -> Result<DesiredZone> {
    let records = parse_zone_file(path, zone_name)?;
    let record_sets = translate(&records, zone_name, path)?;
    Ok(DesiredZone {
        name: normalize_name(zone_name),
        source: path.to_path_buf(),
        record_sets,
    })
}
