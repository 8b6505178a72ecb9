use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Timestamp used when an entry carries no `createTimestamp` attribute.
///
/// Sorts (and therefore files) before every real `YYYYMMDDHHMMSSZ` stamp.
pub const SENTINEL_TIMESTAMP: &str = "00000000000000Z";

/// One parsed directory entry from an LDIF export.
///
/// `raw` is the entry text exactly as it appeared in the export stream,
/// minus the blank-line separator. The DN and creation timestamp are
/// extracted up front because they are all the pipeline needs to name
/// the entry's file.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Raw LDIF text of the entry, written back out verbatim.
    pub raw: String,
    /// Canonicalized distinguished name; empty when the entry has no DN line.
    pub canonical_dn: String,
    /// `createTimestamp` value, or [`SENTINEL_TIMESTAMP`] when absent.
    pub create_timestamp: String,
}

impl Entry {
    /// Parse one entry record from its raw LDIF text.
    ///
    /// Never fails: a missing DN yields an empty identity and a missing
    /// `createTimestamp` yields the sentinel. Both are valid exports in
    /// the wild (e.g. slapcat without operational attributes).
    pub fn parse(raw: &str) -> Self {
        let mut canonical_dn = None;
        let mut create_timestamp = None;

        for line in unfold(raw) {
            let Some((name, value)) = split_attribute(&line) else {
                continue;
            };
            if canonical_dn.is_none() && name.eq_ignore_ascii_case("dn") {
                canonical_dn = Some(canonicalize_dn(&value));
            } else if create_timestamp.is_none() && name.eq_ignore_ascii_case("createTimestamp") {
                create_timestamp = Some(value.trim().to_string());
            }
        }

        Entry {
            raw: raw.to_string(),
            canonical_dn: canonical_dn.unwrap_or_default(),
            create_timestamp: create_timestamp
                .unwrap_or_else(|| SENTINEL_TIMESTAMP.to_string()),
        }
    }
}

/// Join folded LDIF lines into logical attribute lines.
///
/// A line starting with a single space continues the previous line; the
/// newline and the one leading space are removed when joining.
fn unfold(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix(' ') {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }

    lines
}

/// Split one logical line into attribute name and decoded value.
///
/// `name: value` carries the value verbatim (one optional leading space
/// stripped); `name:: value` carries it base64-encoded. Lines without a
/// colon and comment lines are not attribute lines.
fn split_attribute(line: &str) -> Option<(&str, String)> {
    if line.starts_with('#') {
        return None;
    }

    let colon = line.find(':')?;
    let name = &line[..colon];
    let rest = &line[colon + 1..];

    if let Some(encoded) = rest.strip_prefix(':') {
        let encoded = encoded.trim();
        match BASE64.decode(encoded) {
            Ok(bytes) => Some((name, String::from_utf8_lossy(&bytes).into_owned())),
            Err(err) => {
                log::warn!("Undecodable base64 value for attribute '{name}': {err}");
                Some((name, encoded.to_string()))
            }
        }
    } else {
        Some((name, rest.strip_prefix(' ').unwrap_or(rest).to_string()))
    }
}

/// Normalize a DN so that identity-equivalent spellings compare equal.
///
/// Components are split on commas and each `key=value` pair is trimmed
/// and lower-cased on both sides; component order is preserved.
pub fn canonicalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|component| match component.split_once('=') {
            Some((key, value)) => {
                format!("{}={}", key.trim().to_lowercase(), value.trim().to_lowercase())
            }
            None => component.trim().to_lowercase(),
        })
        .collect::<Vec<_>>()
        .join(",")
}
