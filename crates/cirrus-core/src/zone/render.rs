//! Bind text output for record sets
//!
//! Alias record sets are written back in their `_alias` TXT form so the
//! output can be fed straight into `dns-setup` again.

use super::record::{ALIAS_LABEL, RecordSet, RecordTarget, RecordType, normalize_name};

/// Render `sets` as zone file text for `zone_name`.
pub fn render_zone(zone_name: &str, sets: &[RecordSet]) -> String {
    let mut lines = vec![format!("$ORIGIN {}", normalize_name(zone_name))];

    for set in sets {
        match &set.target {
            RecordTarget::Values(values) => {
                lines.extend(values.iter().map(|value| {
                    format!(
                        "{}\t{}\tIN\t{}\t{}",
                        set.name, set.ttl, set.record_type, value
                    )
                }));
            }
            RecordTarget::Alias(alias) => lines.push(format!(
                "{}.{}\t{}\tIN\t{}\t\"{}\"",
                ALIAS_LABEL,
                set.name,
                set.ttl,
                RecordType::Txt,
                alias.to_txt_value()
            )),
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
