use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::dump::{self, CommandDumpSource, DumpSource};
use crate::entry::Entry;
use crate::naming::{self, FilenameRegistry};
use crate::scm::{self, Scm};

/// Effective settings for one backup run, after merging CLI flags over the
/// config file.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Shell command producing the LDIF export on stdout.
    pub ldif_cmd: String,
    /// Directory holding the git-tracked per-entry files.
    pub backup_dir: PathBuf,
    /// Commit message for the snapshot revision.
    pub commit_message: String,
    /// Commit date, or a path whose mtime supplies the date; defaults to now.
    pub commit_date: Option<String>,
}

/// What one run produced, for reporting.
#[derive(Debug)]
pub struct BackupSummary {
    pub entry_count: usize,
    pub files: Vec<String>,
    pub committed: bool,
}

/// Run the full backup pipeline against the real dump command and git.
pub fn run_backup(opts: &BackupOptions) -> Result<BackupSummary> {
    let scm = scm::init(&opts.backup_dir)?;
    let mut source = CommandDumpSource::new(&opts.ldif_cmd);
    run_pipeline(opts, &mut source, scm.as_ref())
}

/// Pipeline core: read → canonicalize → name → synchronize → commit.
///
/// Linear and non-branching; the first hard failure aborts the run and
/// nothing is committed. Files written before an abort stay on disk.
pub fn run_pipeline(
    opts: &BackupOptions,
    source: &mut dyn DumpSource,
    scm: &dyn Scm,
) -> Result<BackupSummary> {
    let records = dump::read_stable(source)?;
    log::info!("Read {} entries from export", records.len());

    let entries: Vec<Entry> = records.iter().map(|r| Entry::parse(r)).collect();

    let mut registry = FilenameRegistry::new();
    let files = synchronize(scm, &entries, &mut registry)?;

    let date = resolve_commit_date(opts.commit_date.as_deref())?;
    let committed = if scm.has_staged_changes()? {
        scm.commit(&opts.commit_message, &date)?;
        log::info!("Committed {} entry files", files.len());
        true
    } else {
        log::info!("Snapshot unchanged since last backup; skipping commit");
        false
    };

    Ok(BackupSummary {
        entry_count: entries.len(),
        files,
        committed,
    })
}

/// Replace the tracked `.ldif` file set with files for the new entries.
///
/// Every `.ldif` file currently in the snapshot directory is untracked
/// first, then each entry is written under its generated name and tracked.
/// Full replace, not an incremental diff: the version history still ends
/// up with a correct add/remove delta and there is no state to reconcile.
pub fn synchronize(
    scm: &dyn Scm,
    entries: &[Entry],
    registry: &mut FilenameRegistry,
) -> Result<Vec<String>> {
    let snapshot_dir = scm.workdir();

    for existing in WalkDir::new(snapshot_dir).min_depth(1).max_depth(1) {
        let existing = existing?;
        let path = existing.path();
        if path.extension().is_some_and(|ext| ext == "ldif") {
            scm.remove(path)?;
        }
    }

    let mut files = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = naming::target_file_name(entry, registry);
        let path = snapshot_dir.join(&name);
        fs::write(&path, format!("{}\n", entry.raw))
            .with_context(|| format!("Failed to write entry file '{}'", path.display()))?;
        scm.add(&path)?;
        files.push(name);
    }

    Ok(files)
}

/// Resolve the commit date argument.
///
/// A date naming an existing file is replaced by that file's last-modified
/// time; any other string is passed through verbatim for git to interpret.
/// No date at all means the current time.
pub fn resolve_commit_date(date: Option<&str>) -> Result<String> {
    match date {
        None => Ok(chrono::Local::now().to_rfc2822()),
        Some(date) => {
            let path = Path::new(date);
            if path.exists() {
                let modified = fs::metadata(path)
                    .and_then(|m| m.modified())
                    .with_context(|| {
                        format!("Failed to read mtime of date file '{}'", path.display())
                    })?;
                Ok(chrono::DateTime::<chrono::Local>::from(modified).to_rfc2822())
            } else {
                Ok(date.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records collaborator calls instead of touching git.
    struct RecordingScm {
        workdir: PathBuf,
        ops: RefCell<Vec<String>>,
    }

    impl RecordingScm {
        fn new(workdir: &Path) -> Self {
            Self {
                workdir: workdir.to_path_buf(),
                ops: RefCell::new(Vec::new()),
            }
        }

        fn file_name(path: &Path) -> String {
            path.file_name().unwrap().to_string_lossy().into_owned()
        }
    }

    impl Scm for RecordingScm {
        fn workdir(&self) -> &Path {
            &self.workdir
        }

        fn remove(&self, path: &Path) -> Result<()> {
            self.ops
                .borrow_mut()
                .push(format!("remove {}", Self::file_name(path)));
            Ok(())
        }

        fn add(&self, path: &Path) -> Result<()> {
            self.ops
                .borrow_mut()
                .push(format!("add {}", Self::file_name(path)));
            Ok(())
        }

        fn commit(&self, message: &str, _date: &str) -> Result<()> {
            self.ops.borrow_mut().push(format!("commit {message}"));
            Ok(())
        }

        fn has_staged_changes(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn entry(dn: &str, timestamp: &str) -> Entry {
        Entry::parse(&format!("dn: {dn}\ncreateTimestamp: {timestamp}"))
    }

    #[test]
    fn test_synchronize_writes_and_tracks_entry_files() {
        let temp = TempDir::new().unwrap();
        let scm = RecordingScm::new(temp.path());
        let entries = vec![
            entry("uid=a,dc=example,dc=com", "20240311094512Z"),
            entry("uid=b,dc=example,dc=com", "20240311094512Z"),
        ];

        let mut registry = FilenameRegistry::new();
        let files = synchronize(&scm, &entries, &mut registry).unwrap();

        assert_eq!(files.len(), 2);
        for name in &files {
            let content = fs::read_to_string(temp.path().join(name)).unwrap();
            assert!(content.starts_with("dn: uid="));
            assert!(content.ends_with('\n'));
        }

        let ops = scm.ops.borrow();
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|op| op.starts_with("add ")));
    }

    #[test]
    fn test_synchronize_untracks_existing_ldif_files_first() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("old.ldif"), "dn: uid=old,dc=x\n").unwrap();
        fs::write(temp.path().join("notes.txt"), "keep me\n").unwrap();

        let scm = RecordingScm::new(temp.path());
        let entries = vec![entry("uid=new,dc=example,dc=com", "20240311094512Z")];

        let mut registry = FilenameRegistry::new();
        synchronize(&scm, &entries, &mut registry).unwrap();

        let ops = scm.ops.borrow();
        assert_eq!(ops[0], "remove old.ldif");
        assert!(ops[1].starts_with("add "));
        // non-.ldif files are outside the managed class
        assert!(!ops.iter().any(|op| op.contains("notes.txt")));
        assert!(temp.path().join("notes.txt").exists());
    }

    #[test]
    fn test_synchronize_is_idempotent_on_identical_input() {
        let temp = TempDir::new().unwrap();
        let scm = RecordingScm::new(temp.path());
        let entries = vec![
            entry("uid=a,dc=example,dc=com", "20240311094512Z"),
            entry("uid=b,dc=example,dc=com", "20240311100000Z"),
        ];

        let first = synchronize(&scm, &entries, &mut FilenameRegistry::new()).unwrap();
        let second = synchronize(&scm, &entries, &mut FilenameRegistry::new()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_commit_date_passes_plain_dates_through() {
        let date = resolve_commit_date(Some("2024-03-11T09:45:12+0000")).unwrap();
        assert_eq!(date, "2024-03-11T09:45:12+0000");
    }

    #[test]
    fn test_resolve_commit_date_uses_file_mtime() {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join("last-run");
        fs::write(&marker, "").unwrap();

        let modified = fs::metadata(&marker).unwrap().modified().unwrap();
        let expected = chrono::DateTime::<chrono::Local>::from(modified).to_rfc2822();

        let date = resolve_commit_date(Some(&marker.to_string_lossy())).unwrap();
        assert_eq!(date, expected);
    }

    #[test]
    fn test_resolve_commit_date_defaults_to_now() {
        let date = resolve_commit_date(None).unwrap();
        assert!(chrono::DateTime::parse_from_rfc2822(&date).is_ok());
    }
}
