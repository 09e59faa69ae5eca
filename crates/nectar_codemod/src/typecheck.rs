use log::{debug, warn};
use std::{path::Path, process::Command};

/// What a validation run reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    pub ok: bool,
    /// Combined stdout and stderr
    pub output: String,
}

/// The external check that decides whether an invocation's edits are kept.
pub trait TypecheckGate {
    fn run(&self, root: &Path) -> GateReport;
}

/// `npx tsc --noEmit` in the project root.
#[derive(Debug, Clone, Copy, Default)]
pub struct TscGate;

impl TypecheckGate for TscGate {
    fn run(&self, root: &Path) -> GateReport {
        debug!("Running npx tsc --noEmit in {}", root.display());
        match Command::new("npx").args(["tsc", "--noEmit"]).current_dir(root).output() {
            Ok(out) => {
                let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
                output.push_str(&String::from_utf8_lossy(&out.stderr));
                GateReport { ok: out.status.success(), output }
            }
            Err(e) => {
                // a gate that cannot run cannot vouch for the edits
                warn!("Failed to spawn typecheck: {}", e);
                GateReport { ok: false, output: format!("Failed to run npx tsc --noEmit: {}", e) }
            }
        }
    }
}
