use anyhow::Result;
use clap::{Parser, Subcommand};
use log::debug;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

mod analyze;
mod codemod;
mod render;
mod restore;
mod validate;

#[derive(Parser)]
#[command(name = "nectar")]
#[command(about = "Find and safely apply client bundle slimming codemods", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Suggest or apply codemods, ranked by estimated KB
    Codemod(codemod::CodemodArgs),
    /// Restore files from the most recent backup set
    Restore(restore::RestoreArgs),
    /// Render a plan to markdown or JSON
    Render(render::RenderArgs),
    /// Analyze the build output and client/server boundaries
    Analyze(analyze::AnalyzeArgs),
    /// Validate nectar.config.json
    Validate(validate::ValidateArgs),
}

/// Paths given on the command line are relative to the project root.
pub(crate) fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() { path.to_path_buf() } else { root.join(path) }
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let exit_code = match cli.command {
        Commands::Codemod(args) => codemod::run(&args, &mut stdout)?,
        Commands::Restore(args) => restore::run(&args, &mut stdout)?,
        Commands::Render(args) => render::run(&args, &mut stdout)?,
        Commands::Analyze(args) => analyze::run(&args, &mut stdout)?,
        Commands::Validate(args) => validate::run(&args, &mut stdout)?,
    };
    stdout.flush()?;

    if exit_code != 0 {
        // Non-zero exit to fail CI
        std::process::exit(exit_code);
    }
    Ok(())
}
