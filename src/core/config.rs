//! Shipper configuration
//!
//! All options are resolved once, before the shipper is constructed. Values
//! taken from the process environment (API key, hostname) are read by
//! [`ShipperConfigBuilder::build`], never later.

use super::error::{Result, ShipperError};
use super::filter::{LevelMap, ModuleFilter, DEFAULT_CORE_MODULE, DEFAULT_CRITICAL_LEVEL};
use super::hostname::get_hostname;
use super::log_level::LogLevel;
use super::serializer::{ObjectPrinter, Serializer};
use std::env;
use std::fmt;
use std::time::Duration;

/// Datadog v2 logs intake (US5 site)
pub const DEFAULT_URL: &str = "https://http-intake.logs.us5.datadoghq.com/api/v2/logs";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "DATADOG_API_KEY";

/// Default `ddsource`
pub const DEFAULT_SOURCE: &str = "moleculer";

/// Default time between timer-driven flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(10_000);

#[derive(Clone)]
pub struct ShipperConfig {
    pub url: String,
    pub api_key: String,
    /// Sent as `ddsource`
    pub source: String,
    pub env: Option<String>,
    pub hostname: String,
    pub object_printer: Option<ObjectPrinter>,
    /// Zero flushes on every record
    pub flush_interval: Duration,
    pub exclude_modules: Vec<String>,
    /// Module whose critical records survive exclusion
    pub core_module: String,
    /// Least severe level that survives exclusion for `core_module`
    pub critical_level: LogLevel,
    /// Thresholds per module
    pub levels: LevelMap,
    /// Per-request timeout for the HTTP transport; `None` keeps the client default
    pub request_timeout: Option<Duration>,
}

impl ShipperConfig {
    #[must_use]
    pub fn builder() -> ShipperConfigBuilder {
        ShipperConfigBuilder::new()
    }

    /// Check the invariants required to run a shipper.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ShipperError::MissingApiKey);
        }
        if self.url.trim().is_empty() {
            return Err(ShipperError::config("url", "must not be empty"));
        }
        Ok(())
    }

    pub fn is_immediate(&self) -> bool {
        self.flush_interval.is_zero()
    }

    pub fn module_filter(&self) -> ModuleFilter {
        ModuleFilter::new(self.exclude_modules.iter().cloned())
            .with_core_module(self.core_module.clone())
            .with_critical_level(self.critical_level)
    }

    pub fn serializer(&self) -> Serializer {
        match &self.object_printer {
            Some(printer) => Serializer::with_printer(printer.clone()),
            None => Serializer::new(),
        }
    }
}

impl fmt::Debug for ShipperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShipperConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("source", &self.source)
            .field("env", &self.env)
            .field("hostname", &self.hostname)
            .field("object_printer", &self.object_printer.as_ref().map(|_| "<custom>"))
            .field("flush_interval", &self.flush_interval)
            .field("exclude_modules", &self.exclude_modules)
            .field("core_module", &self.core_module)
            .field("critical_level", &self.critical_level)
            .field("levels", &self.levels)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Builder for [`ShipperConfig`]
///
/// # Example
/// ```
/// use datadog_log_shipper::prelude::*;
/// use std::time::Duration;
///
/// let config = ShipperConfig::builder()
///     .api_key("0123456789abcdef")
///     .env("prod")
///     .hostname("web-1")
///     .flush_interval(Duration::from_secs(5))
///     .exclude_module("registry")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.hostname, "web-1");
/// ```
pub struct ShipperConfigBuilder {
    url: String,
    api_key: Option<String>,
    source: String,
    env: Option<String>,
    hostname: Option<String>,
    object_printer: Option<ObjectPrinter>,
    flush_interval: Duration,
    exclude_modules: Vec<String>,
    core_module: String,
    critical_level: LogLevel,
    levels: LevelMap,
    request_timeout: Option<Duration>,
}

impl ShipperConfigBuilder {
    pub fn new() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            api_key: None,
            source: DEFAULT_SOURCE.to_string(),
            env: None,
            hostname: None,
            object_printer: None,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            exclude_modules: Vec::new(),
            core_module: DEFAULT_CORE_MODULE.to_string(),
            critical_level: DEFAULT_CRITICAL_LEVEL,
            levels: LevelMap::uniform(LogLevel::Info),
            request_timeout: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the API key; otherwise it is read from `DATADOG_API_KEY`
    #[must_use = "builder methods return a new value"]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    /// Set the hostname; otherwise it is detected at build time
    #[must_use = "builder methods return a new value"]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn object_printer(mut self, printer: ObjectPrinter) -> Self {
        self.object_printer = Some(printer);
        self
    }

    /// Set the flush period; `Duration::ZERO` flushes on every record
    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_interval_ms(self, millis: u64) -> Self {
        self.flush_interval(Duration::from_millis(millis))
    }

    #[must_use = "builder methods return a new value"]
    pub fn exclude_module(mut self, module: impl Into<String>) -> Self {
        self.exclude_modules.push(module.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn exclude_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_modules.extend(modules.into_iter().map(Into::into));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn core_module(mut self, module: impl Into<String>) -> Self {
        self.core_module = module.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn critical_level(mut self, level: LogLevel) -> Self {
        self.critical_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn levels(mut self, levels: LevelMap) -> Self {
        self.levels = levels;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Resolve environment-backed defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ShipperError::MissingApiKey`] when no key was given and
    /// `DATADOG_API_KEY` is unset or empty.
    pub fn build(self) -> Result<ShipperConfig> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).unwrap_or_default(),
        };

        let config = ShipperConfig {
            url: self.url,
            api_key,
            source: self.source,
            env: self.env,
            hostname: self.hostname.unwrap_or_else(get_hostname),
            object_printer: self.object_printer,
            flush_interval: self.flush_interval,
            exclude_modules: self.exclude_modules,
            core_module: self.core_module,
            critical_level: self.critical_level,
            levels: self.levels,
            request_timeout: self.request_timeout,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for ShipperConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
