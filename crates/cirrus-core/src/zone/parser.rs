//! Bind-style zone file parser
//!
//! Turns presentation-format text into [`ResourceRecord`]s with absolute
//! owner names and normalized rdata. Supports `$ORIGIN`, `$TTL`,
//! `$INCLUDE`, `@`, owner inheritance, TTL units and the `IN` class.
//!
//! Without a `$TTL` directive the SOA MINIMUM field becomes the default
//! TTL, as older BIND zone files expect.

use super::lexer::{Entry, Token, tokenize};
use super::record::{RecordType, ResourceRecord, normalize_name};
use crate::error::{Error, Result};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How deep `$INCLUDE` files may nest
const MAX_INCLUDE_DEPTH: usize = 8;

/// Read and parse a zone file for `origin`.
pub fn parse_zone_file(path: &Path, origin: &str) -> Result<Vec<ResourceRecord>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("cannot read zone file {}: {}", path.display(), e))
    })?;
    parse_zone(&text, origin, path)
}

/// Parse zone text. `path` names the text in error messages and anchors
/// relative `$INCLUDE` paths.
pub fn parse_zone(input: &str, origin: &str, path: &Path) -> Result<Vec<ResourceRecord>> {
    let mut parser = ZoneParser::new(path, origin);
    let mut records = Vec::new();
    parser.parse(input, &mut records)?;

    debug!(
        "Parsed {} record(s) from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

struct ZoneParser {
    /// File currently being read; changes while inside an `$INCLUDE`
    path: PathBuf,
    origin: String,
    default_ttl: Option<u32>,
    last_ttl: Option<u32>,
    last_owner: Option<String>,
    depth: usize,
}

impl ZoneParser {
    fn new(path: &Path, origin: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            origin: normalize_name(origin),
            default_ttl: None,
            last_ttl: None,
            last_owner: None,
            depth: 0,
        }
    }

    fn error(&self, line: usize, msg: impl Into<String>) -> Error {
        Error::zone_parse(&self.path, line, msg)
    }

    fn parse(&mut self, input: &str, records: &mut Vec<ResourceRecord>) -> Result<()> {
        let entries = tokenize(input, &self.path)?;

        for entry in &entries {
            let first = &entry.tokens[0];
            if !entry.indented && !first.quoted && first.text.starts_with('$') {
                self.directive(entry, records)?;
                continue;
            }

            let record = self.record(entry)?;
            debug!(
                "Parsed {} {} {} {}",
                record.name, record.ttl, record.record_type, record.data
            );
            records.push(record);
        }
        Ok(())
    }

    fn directive(&mut self, entry: &Entry, records: &mut Vec<ResourceRecord>) -> Result<()> {
        let line = entry.line;
        let name = entry.tokens[0].text.to_ascii_uppercase();
        let arg = entry.tokens.get(1).map(|t| t.text.as_str());

        match (name.as_str(), arg) {
            ("$ORIGIN", Some(origin)) => {
                self.origin = self.absolute_name(origin, line)?;
            }
            ("$TTL", Some(ttl)) => {
                let ttl = parse_ttl(ttl)
                    .ok_or_else(|| self.error(line, format!("invalid $TTL '{}'", ttl)))?;
                self.default_ttl = Some(ttl);
            }
            ("$INCLUDE", Some(file)) => {
                let origin = entry.tokens.get(2).map(|t| t.text.as_str());
                self.include(file, origin, line, records)?;
            }
            ("$ORIGIN" | "$TTL" | "$INCLUDE", None) => {
                return Err(self.error(line, format!("{} needs an argument", name)));
            }
            _ => {
                return Err(self.error(line, format!("unsupported directive '{}'", name)));
            }
        }
        Ok(())
    }

    /// Parse `file` (relative to the current file) in place of the directive.
    ///
    /// The included file starts from the current state, optionally with a
    /// new origin; whatever it changes is undone when it ends.
    fn include(
        &mut self,
        file: &str,
        origin: Option<&str>,
        line: usize,
        records: &mut Vec<ResourceRecord>,
    ) -> Result<()> {
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(self.error(
                line,
                format!("$INCLUDE nested more than {} deep", MAX_INCLUDE_DEPTH),
            ));
        }

        let path = match self.path.parent() {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        };
        let text = std::fs::read_to_string(&path).map_err(|e| {
            self.error(
                line,
                format!("cannot read included file {}: {}", path.display(), e),
            )
        })?;
        let origin = match origin {
            Some(origin) => self.absolute_name(origin, line)?,
            None => self.origin.clone(),
        };
        debug!("Including {} with origin {}", path.display(), origin);

        let saved_path = std::mem::replace(&mut self.path, path);
        let saved_origin = std::mem::replace(&mut self.origin, origin);
        let saved_owner = self.last_owner.take();
        let (saved_default, saved_last) = (self.default_ttl, self.last_ttl);

        self.depth += 1;
        let result = self.parse(&text, records);
        self.depth -= 1;

        self.path = saved_path;
        self.origin = saved_origin;
        self.last_owner = saved_owner;
        self.default_ttl = saved_default;
        self.last_ttl = saved_last;
        result
    }

    fn record(&mut self, entry: &Entry) -> Result<ResourceRecord> {
        let line = entry.line;
        let tokens = &entry.tokens;
        let mut idx = 0;

        let owner = if entry.indented {
            self.last_owner
                .clone()
                .ok_or_else(|| self.error(line, "record has no owner name"))?
        } else {
            idx += 1;
            self.absolute_name(&tokens[0].text, line)?
        };

        // TTL and class may appear in either order
        let mut ttl = None;
        let mut class_seen = false;
        while let Some(token) = tokens.get(idx) {
            if ttl.is_none() && !token.quoted {
                if let Some(value) = parse_ttl(&token.text) {
                    ttl = Some(value);
                    idx += 1;
                    continue;
                }
            }
            if !class_seen && !token.quoted {
                match token.text.to_ascii_uppercase().as_str() {
                    "IN" => {
                        class_seen = true;
                        idx += 1;
                        continue;
                    }
                    "CH" | "CS" | "HS" | "ANY" => {
                        return Err(self.error(
                            line,
                            format!("unsupported class '{}'", token.text),
                        ));
                    }
                    _ => {}
                }
            }
            break;
        }

        let type_token = tokens
            .get(idx)
            .ok_or_else(|| self.error(line, "missing record type"))?;
        let record_type: RecordType = type_token
            .text
            .parse()
            .map_err(|_| self.error(line, format!("unknown record type '{}'", type_token.text)))?;
        idx += 1;

        if let Some(ttl) = ttl {
            self.last_ttl = Some(ttl);
        }
        let data = self.rdata(record_type, &tokens[idx..], line)?;

        // the SOA MINIMUM stands in for a missing $TTL
        let mut ttl = ttl.or(self.default_ttl).or(self.last_ttl);
        if record_type == RecordType::Soa && self.default_ttl.is_none() {
            let minimum = data
                .rsplit(' ')
                .next()
                .and_then(|field| field.parse::<u32>().ok())
                .ok_or_else(|| self.error(line, "invalid SOA minimum"))?;
            self.default_ttl = Some(minimum);
            ttl = ttl.or(Some(minimum));
        }
        let ttl = ttl.ok_or_else(|| self.error(line, "missing TTL and no $TTL default"))?;

        self.last_owner = Some(owner.clone());

        Ok(ResourceRecord {
            name: owner,
            ttl,
            record_type,
            data,
            line,
        })
    }

    /// Validate and normalize rdata for `record_type`.
    fn rdata(&self, record_type: RecordType, rdata: &[Token], line: usize) -> Result<String> {
        let arity = |expected: usize| -> Result<()> {
            if rdata.len() == expected {
                Ok(())
            } else {
                Err(self.error(
                    line,
                    format!(
                        "{} record needs {} field(s), found {}",
                        record_type,
                        expected,
                        rdata.len()
                    ),
                ))
            }
        };

        match record_type {
            RecordType::A => {
                arity(1)?;
                let addr: Ipv4Addr = rdata[0].text.parse().map_err(|_| {
                    self.error(line, format!("invalid IPv4 address '{}'", rdata[0].text))
                })?;
                Ok(addr.to_string())
            }
            RecordType::Aaaa => {
                arity(1)?;
                let addr: Ipv6Addr = rdata[0].text.parse().map_err(|_| {
                    self.error(line, format!("invalid IPv6 address '{}'", rdata[0].text))
                })?;
                Ok(addr.to_string())
            }
            RecordType::Cname | RecordType::Ns | RecordType::Ptr => {
                arity(1)?;
                self.absolute_name(&rdata[0].text, line)
            }
            RecordType::Mx => {
                arity(2)?;
                let preference = self.number::<u16>(&rdata[0], "preference", line)?;
                let exchange = self.absolute_name(&rdata[1].text, line)?;
                Ok(format!("{} {}", preference, exchange))
            }
            RecordType::Srv => {
                arity(4)?;
                let priority = self.number::<u16>(&rdata[0], "priority", line)?;
                let weight = self.number::<u16>(&rdata[1], "weight", line)?;
                let port = self.number::<u16>(&rdata[2], "port", line)?;
                let target = self.absolute_name(&rdata[3].text, line)?;
                Ok(format!("{} {} {} {}", priority, weight, port, target))
            }
            RecordType::Soa => {
                arity(7)?;
                let mname = self.absolute_name(&rdata[0].text, line)?;
                let rname = self.absolute_name(&rdata[1].text, line)?;
                let serial = self.number::<u32>(&rdata[2], "serial", line)?;
                let mut timers = Vec::with_capacity(4);
                for token in &rdata[3..] {
                    let value = parse_ttl(&token.text).ok_or_else(|| {
                        self.error(line, format!("invalid SOA timer '{}'", token.text))
                    })?;
                    timers.push(value.to_string());
                }
                Ok(format!("{} {} {} {}", mname, rname, serial, timers.join(" ")))
            }
            RecordType::Txt | RecordType::Spf => {
                if rdata.is_empty() {
                    return Err(self.error(line, format!("{} record has no text", record_type)));
                }
                Ok(rdata.iter().map(quote).collect::<Vec<_>>().join(" "))
            }
            RecordType::Caa => {
                arity(3)?;
                let flags = self.number::<u8>(&rdata[0], "flags", line)?;
                let tag = &rdata[1].text;
                if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(self.error(line, format!("invalid CAA tag '{}'", tag)));
                }
                Ok(format!("{} {} {}", flags, tag.to_ascii_lowercase(), quote(&rdata[2])))
            }
            RecordType::Ds => {
                if rdata.len() < 4 {
                    return Err(self.error(line, "DS record needs at least 4 fields"));
                }
                let key_tag = self.number::<u16>(&rdata[0], "key tag", line)?;
                let algorithm = self.number::<u8>(&rdata[1], "algorithm", line)?;
                let digest_type = self.number::<u8>(&rdata[2], "digest type", line)?;
                let digest: String = rdata[3..].iter().map(|t| t.text.as_str()).collect();
                if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(self.error(line, "DS digest must be hexadecimal"));
                }
                Ok(format!(
                    "{} {} {} {}",
                    key_tag,
                    algorithm,
                    digest_type,
                    digest.to_ascii_uppercase()
                ))
            }
            RecordType::Naptr => {
                arity(6)?;
                let order = self.number::<u16>(&rdata[0], "order", line)?;
                let preference = self.number::<u16>(&rdata[1], "preference", line)?;
                let replacement = self.absolute_name(&rdata[5].text, line)?;
                Ok(format!(
                    "{} {} {} {} {} {}",
                    order,
                    preference,
                    quote(&rdata[2]),
                    quote(&rdata[3]),
                    quote(&rdata[4]),
                    replacement
                ))
            }
        }
    }

    fn number<T: std::str::FromStr>(&self, token: &Token, field: &str, line: usize) -> Result<T> {
        token
            .text
            .parse()
            .map_err(|_| self.error(line, format!("invalid {} '{}'", field, token.text)))
    }

    /// Resolve `name` against the current origin and validate its labels.
    fn absolute_name(&self, name: &str, line: usize) -> Result<String> {
        let absolute = if name == "@" {
            self.origin.clone()
        } else if name.ends_with('.') {
            name.to_string()
        } else if self.origin == "." {
            format!("{}.", name)
        } else {
            format!("{}.{}", name, self.origin)
        };

        if absolute != "." {
            let body = absolute.trim_end_matches('.');
            for label in body.split('.') {
                if label.is_empty() {
                    return Err(self.error(line, format!("empty label in name '{}'", name)));
                }
                if label.len() > 63 {
                    return Err(self.error(line, format!("label too long in name '{}'", name)));
                }
            }
            if body.len() > 253 {
                return Err(self.error(line, format!("name too long '{}'", name)));
            }
        }

        Ok(normalize_name(&absolute))
    }
}

fn quote(token: &Token) -> String {
    if token.quoted {
        format!("\"{}\"", token.text)
    } else {
        format!("\"{}\"", token.text.replace('"', "\\\""))
    }
}

/// Parse a TTL in seconds or BIND unit notation (`1h30m`, `2d`, `1w`).
pub fn parse_ttl(text: &str) -> Option<u32> {
    if text.is_empty() || !text.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(seconds) = text.parse::<u32>() {
        return Some(seconds);
    }

    let mut total: u32 = 0;
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let multiplier = match c.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            'w' => 604_800,
            _ => return None,
        };
        let value: u32 = digits.parse().ok()?;
        total = total.checked_add(value.checked_mul(multiplier)?)?;
        digits.clear();
    }
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: &str = r#"
$TTL 1h
@   IN  SOA ns1.example.com. hostmaster (
        2024010101 ; serial
        3h 15m 1w 1d )
    IN  NS  ns1.example.com.
    IN  NS  ns2
    IN  MX  10 mail
www 300 IN A 192.0.2.10
        IN A 192.0.2.11
mail    A    192.0.2.20
ftp     IN 600 CNAME www
*.dev   CNAME www.example.com.
_sip._tcp SRV 10 60 5060 sipserver
v6      AAAA 2001:DB8:0:0::1
txt     TXT "v=spf1 include:_spf.example.com ~all" second
caa     CAA 0 issue "letsencrypt.org"
"#;

    fn parse(zone: &str) -> Result<Vec<ResourceRecord>> {
        parse_zone(zone, "example.com", Path::new("example.com.zone"))
    }

    #[test]
    fn parses_a_representative_zone() {
        let records = parse(ZONE).unwrap();
        assert_eq!(records.len(), 13);

        let soa = &records[0];
        assert_eq!(soa.name, "example.com.");
        assert_eq!(soa.ttl, 3600);
        assert_eq!(
            soa.data,
            "ns1.example.com. hostmaster.example.com. 2024010101 10800 900 604800 86400"
        );

        let ns2 = &records[2];
        assert_eq!(ns2.name, "example.com.");
        assert_eq!(ns2.data, "ns2.example.com.");

        let mx = &records[3];
        assert_eq!(mx.data, "10 mail.example.com.");

        let www2 = &records[5];
        assert_eq!(www2.name, "www.example.com.");
        assert_eq!(www2.ttl, 3600, "indented record without TTL uses $TTL");

        let ftp = records.iter().find(|r| r.name == "ftp.example.com.").unwrap();
        assert_eq!(ftp.ttl, 600);
        assert_eq!(ftp.record_type, RecordType::Cname);
        assert_eq!(ftp.data, "www.example.com.");

        let wildcard = records.iter().find(|r| r.name == "*.dev.example.com.").unwrap();
        assert_eq!(wildcard.data, "www.example.com.");

        let srv = records.iter().find(|r| r.record_type == RecordType::Srv).unwrap();
        assert_eq!(srv.name, "_sip._tcp.example.com.");
        assert_eq!(srv.data, "10 60 5060 sipserver.example.com.");

        let v6 = records.iter().find(|r| r.record_type == RecordType::Aaaa).unwrap();
        assert_eq!(v6.data, "2001:db8::1");

        let txt = records.iter().find(|r| r.record_type == RecordType::Txt).unwrap();
        assert_eq!(txt.data, "\"v=spf1 include:_spf.example.com ~all\" \"second\"");

        let caa = records.iter().find(|r| r.record_type == RecordType::Caa).unwrap();
        assert_eq!(caa.data, "0 issue \"letsencrypt.org\"");
    }

    #[test]
    fn origin_directive_changes_relative_names() {
        let records = parse("$TTL 300\n$ORIGIN sub.example.com.\nhost A 10.1.1.1\n").unwrap();
        assert_eq!(records[0].name, "host.sub.example.com.");

        let records = parse("$TTL 300\n$ORIGIN sub\nhost A 10.1.1.1\n").unwrap();
        assert_eq!(records[0].name, "host.sub.example.com.");
    }

    #[test]
    fn ttl_falls_back_to_last_explicit_value() {
        let records = parse("a 120 A 10.0.0.1\nb A 10.0.0.2\n").unwrap();
        assert_eq!(records[1].ttl, 120);
    }

    #[test]
    fn soa_minimum_is_the_default_without_ttl_directive() {
        let records =
            parse("@ IN SOA ns1 admin 1 7200 900 1209600 300\nwww IN A 10.0.0.1\n").unwrap();
        assert_eq!(records[0].ttl, 300, "SOA without TTL takes its own minimum");
        assert_eq!(records[1].ttl, 300);

        let records =
            parse("@ 86400 IN SOA ns1 admin 1 7200 900 1209600 1h\nwww IN A 10.0.0.1\n").unwrap();
        assert_eq!(records[0].ttl, 86400);
        assert_eq!(records[1].ttl, 3600, "minimum wins over the SOA's own TTL");

        let records =
            parse("$TTL 60\n@ IN SOA ns1 admin 1 7200 900 1209600 300\nwww IN A 10.0.0.1\n")
                .unwrap();
        assert_eq!(records[1].ttl, 60, "$TTL wins over the minimum");
    }

    #[test]
    fn include_reads_files_relative_to_the_zone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hosts.inc"), "www A 10.0.0.1\n").unwrap();
        std::fs::create_dir(dir.path().join("lab")).unwrap();
        std::fs::write(
            dir.path().join("lab/hosts.inc"),
            "$TTL 60\nhost A 10.0.0.2\n",
        )
        .unwrap();
        let main = dir.path().join("example.com.zone");
        std::fs::write(
            &main,
            "$TTL 300\n$INCLUDE hosts.inc\n$INCLUDE lab/hosts.inc lab\nafter A 10.0.0.9\n",
        )
        .unwrap();

        let records = parse_zone_file(&main, "example.com").unwrap();
        let names: Vec<(&str, u32)> = records.iter().map(|r| (r.name.as_str(), r.ttl)).collect();
        assert_eq!(
            names,
            vec![
                ("www.example.com.", 300),
                ("host.lab.example.com.", 60),
                ("after.example.com.", 300),
            ]
        );
    }

    #[test]
    fn include_errors_name_the_included_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.inc");
        std::fs::write(&bad, "ok A 10.0.0.1\nwww A 999.1.1.1\n").unwrap();
        std::fs::write(dir.path().join("loop.inc"), "$INCLUDE loop.inc\n").unwrap();
        let main = dir.path().join("example.com.zone");

        std::fs::write(&main, "$TTL 300\n$INCLUDE bad.inc\n").unwrap();
        match parse_zone_file(&main, "example.com") {
            Err(Error::ZoneParse { path, line, .. }) => {
                assert_eq!(path, bad);
                assert_eq!(line, 2);
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        std::fs::write(&main, "$TTL 300\n\n$INCLUDE missing.inc\n").unwrap();
        match parse_zone_file(&main, "example.com") {
            Err(Error::ZoneParse { path, line, .. }) => {
                assert_eq!(path, main);
                assert_eq!(line, 3);
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        std::fs::write(&main, "$TTL 300\n$INCLUDE loop.inc\n").unwrap();
        match parse_zone_file(&main, "example.com") {
            Err(Error::ZoneParse { message, .. }) => assert!(message.contains("nested")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn missing_ttl_is_an_error() {
        let err = parse("a A 10.0.0.1\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "example.com.zone:1: missing TTL and no $TTL default"
        );
    }

    #[test]
    fn malformed_records_report_file_and_line() {
        let cases = [
            ("$TTL 60\nwww A 300.1.1.1\n", 2, "invalid IPv4 address '300.1.1.1'"),
            ("$TTL 60\n\nwww BOGUS data\n", 3, "unknown record type 'BOGUS'"),
            ("$TTL 60\nmx MX mail\n", 2, "MX record needs 2 field(s), found 1"),
            ("$TTL 60\n  A 10.0.0.1\n", 2, "record has no owner name"),
            ("$TTL 60\n$GENERATE 1-4 h$ A 10.0.0.$\n", 2, "unsupported directive '$GENERATE'"),
            ("$TTL 60\n$INCLUDE\n", 2, "$INCLUDE needs an argument"),
            ("$TTL 60\nwww CH A 10.0.0.1\n", 2, "unsupported class 'CH'"),
            ("$TTL soon\n", 1, "invalid $TTL 'soon'"),
            ("$TTL 60\nbad..name A 10.0.0.1\n", 2, "empty label in name 'bad..name'"),
        ];

        for (zone, line, message) in cases {
            match parse(zone) {
                Err(Error::ZoneParse {
                    line: got_line,
                    message: got_message,
                    ..
                }) => {
                    assert_eq!(got_line, line, "line for {:?}", zone);
                    assert_eq!(got_message, message, "message for {:?}", zone);
                }
                other => panic!("expected parse error for {:?}, got {:?}", zone, other),
            }
        }
    }

    #[test]
    fn ttl_units() {
        assert_eq!(parse_ttl("3600"), Some(3600));
        assert_eq!(parse_ttl("1h30m"), Some(5400));
        assert_eq!(parse_ttl("1W"), Some(604_800));
        assert_eq!(parse_ttl("10"), Some(10));
        assert_eq!(parse_ttl("IN"), None);
        assert_eq!(parse_ttl("1x"), None);
        assert_eq!(parse_ttl("15m5"), None);
    }
}
