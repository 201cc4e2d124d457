//! Record acceptance by level and module
//!
//! This module provides:
//! - `LevelMap`: resolves the threshold configured for a module
//! - `ModuleFilter`: the per-call keep/drop decision

use super::error::{Result, ShipperError};
use super::log_level::LogLevel;
use super::log_record::Bindings;
use regex::Regex;
use std::collections::HashSet;

/// Module whose critical records survive exclusion by default.
pub const DEFAULT_CORE_MODULE: &str = "broker";

/// Least severe level covered by the exclusion carve-out by default.
pub const DEFAULT_CRITICAL_LEVEL: LogLevel = LogLevel::Error;

/// Keep/drop decision for a single log call.
#[derive(Debug, Clone)]
pub struct ModuleFilter {
    excluded: HashSet<String>,
    core_module: String,
    critical_level: LogLevel,
}

impl ModuleFilter {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
            core_module: DEFAULT_CORE_MODULE.to_string(),
            critical_level: DEFAULT_CRITICAL_LEVEL,
        }
    }

    /// Change the module whose critical records bypass exclusion
    #[must_use]
    pub fn with_core_module(mut self, module: impl Into<String>) -> Self {
        self.core_module = module.into();
        self
    }

    /// Change the least severe level that bypasses exclusion
    #[must_use]
    pub fn with_critical_level(mut self, level: LogLevel) -> Self {
        self.critical_level = level;
        self
    }

    pub fn is_excluded(&self, module: &str) -> bool {
        self.excluded.contains(module)
    }

    /// Decide whether a record at `level` from `bindings.module` is kept.
    ///
    /// `threshold` is the level configured for the module; `None` means the
    /// module is disabled and nothing is kept.
    pub fn accept(&self, bindings: &Bindings, level: LogLevel, threshold: Option<LogLevel>) -> bool {
        let Some(threshold) = threshold else {
            return false;
        };
        if !level.is_at_least(threshold) {
            return false;
        }

        if self.is_excluded(&bindings.module) {
            return bindings.module == self.core_module && level.is_at_least(self.critical_level);
        }

        true
    }
}

impl Default for ModuleFilter {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

#[derive(Debug, Clone)]
struct LevelRule {
    pattern: String,
    matcher: Regex,
    level: Option<LogLevel>,
}

/// Per-module level thresholds
///
/// Module patterns are matched case-insensitively in insertion order; the
/// first match wins. `*` matches within one dot-separated segment and `**`
/// matches anything. Modules matching no pattern use the default level.
///
/// # Example
///
/// ```
/// use datadog_log_shipper::core::{LevelMap, LogLevel};
///
/// let levels = LevelMap::new(Some(LogLevel::Info))
///     .with_module("BROKER", Some(LogLevel::Warn)).unwrap()
///     .with_module("TRANS*", None).unwrap();
///
/// assert_eq!(levels.level_for("broker"), Some(LogLevel::Warn));
/// assert_eq!(levels.level_for("transit"), None);
/// assert_eq!(levels.level_for("users"), Some(LogLevel::Info));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LevelMap {
    default: Option<LogLevel>,
    rules: Vec<LevelRule>,
}

impl LevelMap {
    pub fn new(default: Option<LogLevel>) -> Self {
        Self {
            default,
            rules: Vec::new(),
        }
    }

    /// Same threshold for every module
    pub fn uniform(level: LogLevel) -> Self {
        Self::new(Some(level))
    }

    /// Add a module pattern; `None` disables matching modules.
    pub fn with_module(mut self, pattern: &str, level: Option<LogLevel>) -> Result<Self> {
        let matcher = Regex::new(&glob_to_regex(pattern))
            .map_err(|e| ShipperError::config("LevelMap", format!("pattern '{}': {}", pattern, e)))?;
        self.rules.push(LevelRule {
            pattern: pattern.to_string(),
            matcher,
            level,
        });
        Ok(self)
    }

    /// Threshold for `module`, or `None` if the module is disabled.
    pub fn level_for(&self, module: &str) -> Option<LogLevel> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.is_match(module))
            .map_or(self.default, |rule| rule.level)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.pattern.as_str())
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("(?i)^");
    let mut rest = pattern;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("**") {
            out.push_str(".*");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('*') {
            out.push_str("[^.]*");
            rest = tail;
        } else {
            let next = rest.find('*').unwrap_or(rest.len());
            out.push_str(&regex::escape(&rest[..next]));
            rest = &rest[next..];
        }
    }
    out.push('$');
    out
}
