use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::entry::Entry;

/// Run-scoped collision counters for generated file names.
///
/// Maps a base file name (timestamp plus digest, without extension) to the
/// number of times it has already been handed out this run. One registry is
/// created per pipeline run and passed down explicitly; counters are never
/// persisted, since file names from different runs already diverge through
/// their timestamps and digests.
#[derive(Debug, Default)]
pub struct FilenameRegistry {
    counters: HashMap<String, u32>,
}

impl FilenameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique file name for `base`.
    ///
    /// The first caller gets `{base}.ldif`; each subsequent caller for the
    /// same base gets `{base}-{n}.ldif` with n counting up from 1.
    fn assign(&mut self, base: &str) -> String {
        match self.counters.get_mut(base) {
            None => {
                self.counters.insert(base.to_string(), 0);
                format!("{base}.ldif")
            }
            Some(counter) => {
                *counter += 1;
                format!("{base}-{counter}.ldif")
            }
        }
    }
}

/// First seven hex characters of the SHA-256 of the canonical DN.
///
/// Seven characters are plenty here: the timestamp prefix already
/// partitions the namespace, and true collisions fall back to the
/// registry counter.
fn digest7(identity: &str) -> String {
    let hash = Sha256::digest(identity.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in hash.iter().take(4) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(7);
    hex
}

/// Derive the target file name for an entry: `{timestamp}-{digest7}[-{n}].ldif`.
pub fn target_file_name(entry: &Entry, registry: &mut FilenameRegistry) -> String {
    let base = format!(
        "{}-{}",
        entry.create_timestamp,
        digest7(&entry.canonical_dn)
    );
    registry.assign(&base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::SENTINEL_TIMESTAMP;

    fn entry(dn: &str, timestamp: &str) -> Entry {
        Entry {
            raw: String::new(),
            canonical_dn: dn.to_string(),
            create_timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_name_format() {
        let mut registry = FilenameRegistry::new();
        let name = target_file_name(
            &entry("uid=jdoe,dc=example,dc=com", "20240311094512Z"),
            &mut registry,
        );

        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "ldif");
        let (timestamp, digest) = stem.split_once('-').unwrap();
        assert_eq!(timestamp, "20240311094512Z");
        assert_eq!(digest.len(), 7);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_name_is_deterministic() {
        let e = entry("uid=jdoe,dc=example,dc=com", "20240311094512Z");
        let first = target_file_name(&e, &mut FilenameRegistry::new());
        let second = target_file_name(&e, &mut FilenameRegistry::new());
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_identities_get_distinct_digests() {
        let mut registry = FilenameRegistry::new();
        let a = target_file_name(&entry("uid=a,dc=example,dc=com", "20240311094512Z"), &mut registry);
        let b = target_file_name(&entry("uid=b,dc=example,dc=com", "20240311094512Z"), &mut registry);
        assert_ne!(a, b);
    }

    #[test]
    fn test_registry_disambiguates_colliding_names() {
        let mut registry = FilenameRegistry::new();
        let e = entry("uid=jdoe,dc=example,dc=com", "20240311094512Z");

        let first = target_file_name(&e, &mut registry);
        let second = target_file_name(&e, &mut registry);
        let third = target_file_name(&e, &mut registry);

        assert!(!first.trim_end_matches(".ldif").ends_with("-1"));
        assert_eq!(second, first.replace(".ldif", "-1.ldif"));
        assert_eq!(third, first.replace(".ldif", "-2.ldif"));
    }

    #[test]
    fn test_entries_without_dns_still_get_unique_names() {
        // Degenerate entries share the empty identity and the sentinel
        // timestamp; only the registry keeps them apart.
        let mut registry = FilenameRegistry::new();
        let a = target_file_name(&entry("", SENTINEL_TIMESTAMP), &mut registry);
        let b = target_file_name(&entry("", SENTINEL_TIMESTAMP), &mut registry);
        assert_ne!(a, b);
    }
}
