use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/ldif2git or ~/.config/ldif2git
    /// - macOS: ~/Library/Application Support/ldif2git
    /// - Windows: %APPDATA%\ldif2git
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join("ldif2git"))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join("ldif2git"))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home
                .join("Library")
                .join("Application Support")
                .join("ldif2git"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            Ok(dirs::config_dir()
                .context("Failed to get config directory")?
                .join("ldif2git"))
        }
    }

    /// Get the backup config file path (config.toml)
    pub fn backup_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("ldif2git.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }
}

/// Persistent defaults for backup runs; CLI flags override these per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Shell command producing the LDIF export on stdout
    #[serde(default = "default_ldif_cmd")]
    pub ldif_cmd: String,

    /// Snapshot directory holding the git-tracked entry files
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Default commit message
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

fn default_ldif_cmd() -> String {
    "/usr/sbin/slapcat".to_string()
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/var/backups/ldap")
}

fn default_commit_message() -> String {
    "ldap backup".to_string()
}

impl Default for BackupConfig {
    fn default() -> Self {
        BackupConfig {
            ldif_cmd: default_ldif_cmd(),
            backup_dir: default_backup_dir(),
            commit_message: default_commit_message(),
        }
    }
}

impl BackupConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        let config_path = ConfigManager::backup_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: BackupConfig =
            toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = ConfigManager::backup_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }
}

/// Update the stored backup configuration
pub fn update_config(
    ldif_cmd: Option<String>,
    backup_dir: Option<PathBuf>,
    commit_message: Option<String>,
) -> Result<()> {
    let mut config = BackupConfig::load()?;

    if let Some(cmd) = ldif_cmd {
        println!("{}", format!("Set ldif_cmd to '{cmd}'").green());
        config.ldif_cmd = cmd;
    }

    if let Some(dir) = backup_dir {
        println!(
            "{}",
            format!("Set backup_dir to '{}'", dir.display()).green()
        );
        config.backup_dir = dir;
    }

    if let Some(message) = commit_message {
        println!("{}", format!("Set commit_message to '{message}'").green());
        config.commit_message = message;
    }

    config.save()?;
    println!("{}", "Configuration saved successfully!".green().bold());

    Ok(())
}

/// Show the current backup configuration
pub fn show_config() -> Result<()> {
    let config = BackupConfig::load()?;

    println!("{}", "Current Backup Configuration:".bold());
    println!("  {}: {}", "Dump command".cyan(), config.ldif_cmd);
    println!(
        "  {}: {}",
        "Backup directory".cyan(),
        config.backup_dir.display()
    );
    println!("  {}: {}", "Commit message".cyan(), config.commit_message);

    Ok(())
}
