use anyhow::Result;
use clap::Args;
use colored::Colorize;
use nectar_codemod::{RestoreOutcome, restore_latest};
use nectar_core::{BACKUPS_DIR, NECTAR_DIR};
use std::{io::Write, path::PathBuf};

#[derive(Debug, Clone, Args)]
pub struct RestoreArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

pub fn run<W: Write>(args: &RestoreArgs, out: &mut W) -> Result<i32> {
    let backups_root = args.root.join(NECTAR_DIR).join(BACKUPS_DIR);
    match restore_latest(&args.root, &backups_root)? {
        RestoreOutcome::Restored { restored, folder } => {
            writeln!(out, "{}", format!("Restored {} file(s) from {}", restored, folder.display()).green())?;
            Ok(0)
        }
        RestoreOutcome::NoBackupsDir => {
            writeln!(out, "{}", "Restore failed: No backups directory".red())?;
            Ok(1)
        }
        RestoreOutcome::NoBackupSets => {
            writeln!(out, "{}", "Restore failed: No backups found".red())?;
            Ok(1)
        }
    }
}
