use log::{debug, info, trace};
use nectar_core::{SourceFile, imports_in_source, load_sources};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::{collections::HashSet, path::Path, sync::OnceLock, thread};

pub const SERVER_ONLY_IN_CLIENT: &str = "SERVER_ONLY_IN_CLIENT";

/// Node built-ins that cannot ship to the browser.
pub const SERVER_ONLY_MODULES: &[&str] = &["fs", "path", "crypto", "child_process", "os"];

static CLIENT_HOOK_RE: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub id: String,
    pub rule: &'static str,
    pub severity: Severity,
    pub file: String,
    pub message: String,
    pub module: String,
}

/// Client components that import server-only modules, in scan order.
pub fn detect_server_only_in_client(root: &Path) -> Vec<Finding> {
    let files = load_sources(root);
    info!("Checking {} files for server-only imports in parallel", files.len());

    let per_file: Vec<Vec<Finding>> = files
        .par_iter()
        .map(|file| {
            trace!("Thread {:?} checking {}", thread::current().id(), file.rel);
            check_file(file)
        })
        .collect();

    let findings: Vec<Finding> = per_file.into_iter().flatten().collect();
    debug!("Found {} server-only-in-client findings", findings.len());
    findings
}

/// `"use client"` at the very top, or a call to a React client hook.
pub fn is_client_source(src: &str) -> bool {
    if src.starts_with("\"use client\"") || src.starts_with("'use client'") {
        return true;
    }
    let hooks = CLIENT_HOOK_RE.get_or_init(|| {
        Regex::new(r"\b(useState|useEffect|useLayoutEffect|useRef|useReducer|useMemo|useCallback)\s*\(")
            .expect("client hook regex is valid")
    });
    hooks.is_match(src)
}

fn check_file(file: &SourceFile) -> Vec<Finding> {
    if !is_client_source(&file.text) {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    imports_in_source(&file.path, &file.text)
        .into_iter()
        .filter_map(|spec| {
            let module = spec.request.strip_prefix("node:").unwrap_or(&spec.request).to_string();
            (SERVER_ONLY_MODULES.contains(&module.as_str()) && seen.insert(module.clone())).then(|| Finding {
                id: format!("F-SERVER-ONLY-{:x}", fnv1a(&format!("{}{}", file.rel, module))),
                rule: SERVER_ONLY_IN_CLIENT,
                severity: Severity::Error,
                file: file.rel.clone(),
                message: format!("Client component imports server-only module \"{}\"", module),
                module,
            })
        })
        .collect()
}

/// 32-bit FNV-1a over UTF-16 code units.
fn fnv1a(s: &str) -> u32 {
    s.encode_utf16().fold(0x811c_9dc5_u32, |h, unit| (h ^ u32::from(unit)).wrapping_mul(0x0100_0193))
}
