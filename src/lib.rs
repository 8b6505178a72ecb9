//! # ldif2git
//!
//! A command-line tool that backs up an LDAP directory as individually
//! versioned files in a git repository.
//!
//! ## Overview
//!
//! `ldif2git` runs a dump command (typically `slapcat`), splits the resulting
//! LDIF export into one file per directory entry, and commits the new file
//! set into a git-tracked snapshot directory. Because every entry lives in
//! its own stably named file, the history of any single entry can be
//! inspected and restored with plain git tooling, run after run.
//!
//! ## Pipeline
//!
//! The backup is a linear pipeline: read the export (re-reading until the
//! entry count is stable), canonicalize each entry's DN and creation
//! timestamp, derive a collision-safe file name per entry, replace the
//! tracked file set, and commit. The first hard failure aborts the whole
//! run; a run produces exactly one new commit or none.
//!
//! ## Modules
//!
//! - Export reading and quiescence detection ([`dump`])
//! - Entry parsing and DN canonicalization ([`entry`])
//! - File naming and collision handling ([`naming`])
//! - Git collaborator ([`scm`])
//! - Pipeline and snapshot synchronization ([`sync`])
//! - Configuration and logging ([`config`], [`logger`])

/// Platform-agnostic configuration management.
///
/// Locates the config directory per platform conventions and holds the
/// persisted backup defaults (dump command, snapshot directory, commit
/// message) in a TOML file.
pub mod config;

/// Export stream acquisition.
///
/// Runs the external dump command, splits its output into entry records on
/// blank lines, and re-reads until two consecutive reads agree on entry
/// count so a mid-mutation dump is not backed up.
pub mod dump;

/// LDIF entry parsing.
///
/// Unfolds continuation lines, decodes base64 attribute values, and
/// canonicalizes the DN so identity-equivalent spellings name the same file.
pub mod entry;

/// Logging configuration and utilities.
pub mod logger;

/// Target file naming.
///
/// Derives `{timestamp}-{digest}[-{n}].ldif` names from canonical identity
/// and creation time, with a run-scoped registry resolving collisions.
pub mod naming;

/// Version-control collaborator abstraction and its git CLI backend.
pub mod scm;

/// The backup pipeline: snapshot synchronization and commit composition.
pub mod sync;
