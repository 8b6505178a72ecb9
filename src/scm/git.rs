//! Git backend using CLI commands.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::Scm;

/// Git implementation of the snapshot collaborator, shelling out to the
/// git CLI.
pub struct GitScm {
    workdir: PathBuf,
}

impl GitScm {
    /// Open an existing Git repository.
    pub fn open(path: &Path) -> Result<Self> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if !path.join(".git").exists() {
            return Err(anyhow!(
                "Not a git repository: '{}' (no .git directory)",
                path.display()
            ));
        }

        Ok(Self { workdir: path })
    }

    /// Initialize a Git repository, creating the directory if needed.
    ///
    /// Safe to call on an already-initialized repository; `git init` is a
    /// no-op there.
    pub fn init(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory '{}'", path.display()))?;

        let output = Command::new("git")
            .args(["init"])
            .current_dir(path)
            .output()
            .context("Failed to run 'git init'")?;

        if !output.status.success() {
            return Err(anyhow!(
                "git init failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        // Give commits an identity on machines with no global git config
        let _ = Command::new("git")
            .args(["config", "user.name", "LDAP Backup"])
            .current_dir(path)
            .output();
        let _ = Command::new("git")
            .args(["config", "user.email", "ldif2git@localhost"])
            .current_dir(path)
            .output();

        Self::open(path)
    }

    /// Run a git command and return stdout as a string.
    fn run_git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("Failed to run 'git {}'", args.join(" ")))?;

        if !output.status.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a git command, returning Ok if it succeeds (ignoring stdout).
    fn run_git_ok(&self, args: &[&str]) -> Result<()> {
        self.run_git(args)?;
        Ok(())
    }
}

impl Scm for GitScm {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn remove(&self, path: &Path) -> Result<()> {
        // --cached keeps the working-tree file; --ignore-unmatch tolerates
        // files that were never tracked (e.g. leftovers from an aborted run)
        self.run_git_ok(&[
            "rm",
            "--cached",
            "--quiet",
            "--ignore-unmatch",
            &path.to_string_lossy(),
        ])
    }

    fn add(&self, path: &Path) -> Result<()> {
        self.run_git_ok(&["add", &path.to_string_lossy()])
    }

    fn commit(&self, message: &str, date: &str) -> Result<()> {
        let output = Command::new("git")
            .args(["commit", "--quiet", "-m", message, "--date", date])
            .env("GIT_COMMITTER_DATE", date)
            .current_dir(&self.workdir)
            .output()
            .context("Failed to run 'git commit'")?;

        if !output.status.success() {
            return Err(anyhow!(
                "git commit failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        Ok(())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let output = self.run_git(&["status", "--porcelain"])?;
        // First status column is the index side; untracked lines are "??"
        Ok(output
            .lines()
            .any(|line| !line.starts_with(' ') && !line.starts_with("??")))
    }
}
