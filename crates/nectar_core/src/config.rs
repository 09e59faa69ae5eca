use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashSet, fs, path::Path};

use crate::constants::CONFIG_FILE;

/// Project configuration read from `nectar.config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NectarConfig {
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub heavy_deps: Vec<String>,
    #[serde(default)]
    pub dynamic_allowlist: Vec<String>,
    #[serde(default)]
    pub rules: RuleToggles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagesConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self { include: vec!["/**".to_string()], exclude: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "minKBDeltaToReport")]
    pub min_kb_delta_to_report: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_ms_delta_to_report: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "minEstimatedKB")]
    pub min_estimated_kb: Option<f64>,
}

/// Per-rule enable switches. An absent switch means enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleToggles {
    #[serde(default, rename = "STAR_IMPORT_SLIMMING", skip_serializing_if = "Option::is_none")]
    pub star_import_slimming: Option<bool>,
    #[serde(default, rename = "DYNAMIC_HEAVY_DEP", skip_serializing_if = "Option::is_none")]
    pub dynamic_heavy_dep: Option<bool>,
}

impl RuleToggles {
    pub fn star_import_enabled(&self) -> bool {
        self.star_import_slimming != Some(false)
    }

    pub fn dynamic_enabled(&self) -> bool {
        self.dynamic_heavy_dep != Some(false)
    }
}

impl NectarConfig {
    pub fn min_estimated_kb(&self) -> f64 {
        self.thresholds.min_estimated_kb.unwrap_or(0.0)
    }
}

/// Load `nectar.config.json` from `root`.
///
/// A missing or unparsable file yields the default config (no heavy deps).
/// Individual fields of the wrong shape fall back to their defaults.
pub fn load_config(root: &Path) -> NectarConfig {
    let path = root.join(CONFIG_FILE);
    debug!("Loading config from {}", path.display());
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => {
            debug!("No config at {}, using defaults", path.display());
            return NectarConfig::default();
        }
    };
    let user: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Ignoring invalid {}: {}", path.display(), e);
            return NectarConfig::default();
        }
    };
    coerce_config(&user)
}

fn coerce_config(user: &Value) -> NectarConfig {
    fn field<T: serde::de::DeserializeOwned + Default>(user: &Value, key: &str) -> T {
        match user.get(key) {
            Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
                warn!("Ignoring config field '{}': {}", key, e);
                T::default()
            }),
            None => T::default(),
        }
    }

    let cfg = NectarConfig {
        pages: field(user, "pages"),
        thresholds: field(user, "thresholds"),
        heavy_deps: field(user, "heavyDeps"),
        dynamic_allowlist: field(user, "dynamicAllowlist"),
        rules: field(user, "rules"),
    };
    trace!("Loaded config: {:?}", cfg);
    cfg
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub issues: Vec<ValidationIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

const RULE_KEYS: &[&str] = &["STAR_IMPORT_SLIMMING", "DYNAMIC_HEAVY_DEP"];

/// Check the shape of a config file without loading it into [`NectarConfig`].
pub fn validate_config_file(path: &Path) -> ValidationReport {
    let where_ = path.display().to_string();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => {
            return ValidationReport {
                ok: false,
                issues: vec![issue(&where_, "File not found")],
                config: None,
            };
        }
    };
    let cfg: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            return ValidationReport {
                ok: false,
                issues: vec![issue(&where_, &format!("Invalid JSON: {}", e))],
                config: None,
            };
        }
    };
    let issues = validate_config_value(&cfg);
    ValidationReport { ok: issues.is_empty(), issues, config: Some(cfg) }
}

pub fn validate_config_value(cfg: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_array_of_strings(cfg.get("heavyDeps"), "heavyDeps", &mut issues);
    check_array_of_strings(cfg.get("dynamicAllowlist"), "dynamicAllowlist", &mut issues);

    if let Some(pages) = cfg.get("pages").filter(|v| !v.is_null()) {
        if !pages.is_object() {
            issues.push(issue("pages", "pages must be an object"));
        } else {
            check_array_of_strings(pages.get("include"), "pages.include", &mut issues);
            check_array_of_strings(pages.get("exclude"), "pages.exclude", &mut issues);
        }
    }

    if let Some(thresholds) = cfg.get("thresholds").filter(|v| !v.is_null()) {
        if !thresholds.is_object() {
            issues.push(issue("thresholds", "thresholds must be an object"));
        } else if let Some(v) = thresholds.get("minEstimatedKB").filter(|v| !v.is_null()) {
            let valid = v.as_f64().is_some_and(|n| n.is_finite() && n >= 0.0);
            if !valid {
                issues.push(issue("thresholds.minEstimatedKB", "must be a non-negative number"));
            }
        }
    }

    if let Some(rules) = cfg.get("rules").filter(|v| !v.is_null()) {
        match rules.as_object() {
            None => issues.push(issue("rules", "rules must be an object")),
            Some(obj) => {
                for (k, v) in obj {
                    let at = format!("rules.{}", k);
                    if !RULE_KEYS.contains(&k.as_str()) {
                        issues.push(issue(&at, "unknown rule key"));
                    } else if !v.is_boolean() {
                        issues.push(issue(&at, "must be boolean"));
                    }
                }
            }
        }
    }

    report_duplicates(cfg.get("heavyDeps"), "heavyDeps", &mut issues);
    report_duplicates(cfg.get("dynamicAllowlist"), "dynamicAllowlist", &mut issues);

    issues
}

fn issue(path: &str, message: &str) -> ValidationIssue {
    ValidationIssue { path: path.to_string(), message: message.to_string() }
}

fn check_array_of_strings(v: Option<&Value>, at: &str, issues: &mut Vec<ValidationIssue>) {
    let Some(v) = v.filter(|v| !v.is_null()) else {
        return;
    };
    match v.as_array() {
        None => issues.push(issue(at, "must be an array")),
        Some(arr) if !arr.iter().all(Value::is_string) => {
            issues.push(issue(at, "must contain only strings"))
        }
        Some(_) => {}
    }
}

fn report_duplicates(v: Option<&Value>, at: &str, issues: &mut Vec<ValidationIssue>) {
    let Some(arr) = v.and_then(Value::as_array) else {
        return;
    };
    let mut seen = HashSet::new();
    for s in arr.iter().filter_map(Value::as_str) {
        if !seen.insert(s.to_lowercase()) {
            issues.push(issue(at, &format!("duplicate entry: {}", s)));
        }
    }
}
