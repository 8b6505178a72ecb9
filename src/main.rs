mod config;
mod dump;
mod entry;
mod logger;
mod naming;
mod scm;
mod sync;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use config::BackupConfig;
use sync::BackupOptions;

#[derive(Parser)]
#[command(name = "ldif2git")]
#[command(about = "Back up an LDAP directory as per-entry LDIF files tracked in git", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the directory and record a new snapshot commit
    Backup {
        /// Command producing the LDIF export on stdout (default from config)
        #[arg(short, long)]
        ldif_cmd: Option<String>,

        /// Snapshot directory holding the git-tracked entry files
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Commit date, or a path whose modification time supplies the date
        #[arg(long)]
        commit_date: Option<String>,
    },

    /// Configure backup defaults
    Config {
        /// Set the dump command
        #[arg(long)]
        ldif_cmd: Option<String>,

        /// Set the snapshot directory
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Set the default commit message
        #[arg(long)]
        commit_message: Option<String>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    logger::rotate_log_if_needed().ok();
    logger::init_logger()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Backup {
            ldif_cmd,
            dir,
            message,
            commit_date,
        } => {
            let defaults = BackupConfig::load()?;
            let opts = BackupOptions {
                ldif_cmd: ldif_cmd.unwrap_or(defaults.ldif_cmd),
                backup_dir: dir.unwrap_or(defaults.backup_dir),
                commit_message: message.unwrap_or(defaults.commit_message),
                commit_date,
            };

            let summary = sync::run_backup(&opts)?;

            println!(
                "{} {} entries into {} files in {}",
                "Backed up".green().bold(),
                summary.entry_count,
                summary.files.len(),
                opts.backup_dir.display()
            );
            if summary.committed {
                println!("{}", "Snapshot committed.".green());
            } else {
                println!("{}", "No changes since last backup; commit skipped.".yellow());
            }
        }
        Commands::Config {
            ldif_cmd,
            backup_dir,
            commit_message,
            show,
        } => {
            if show {
                config::show_config()?;
            } else {
                config::update_config(ldif_cmd, backup_dir, commit_message)?;
            }
        }
    }

    Ok(())
}
