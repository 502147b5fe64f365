// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use footprint_app::{DEFAULT_ASSET_ID, DEFAULT_ROWS_PER_PAGE, validate_rows_per_page};
use footprint_credentials::{DEFAULT_BASE_URL, DEFAULT_RETRIES, RetryPolicy};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const APP_NAME: &str = "footprint";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_RETRY_BACKOFF: &str = "250ms";
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_RETRIES: u32 = 10;
const MAX_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(60);
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            service: Service::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub base_url: Option<String>,
    pub asset_id: Option<String>,
    pub timeout: Option<String>,
    pub retries: Option<u32>,
    pub retry_backoff: Option<String>,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            asset_id: Some(DEFAULT_ASSET_ID.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
            retries: Some(DEFAULT_RETRIES),
            retry_backoff: Some(DEFAULT_RETRY_BACKOFF.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub rows_per_page: Option<usize>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            rows_per_page: Some(DEFAULT_ROWS_PER_PAGE),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("FOOTPRINT_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set FOOTPRINT_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [service], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let base_url = self.base_url();
        if base_url.is_empty() {
            bail!("service.base_url in {} must not be empty", path.display());
        }
        let parsed = Url::parse(base_url)
            .with_context(|| format!("service.base_url in {} is not a URL", path.display()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "service.base_url in {} must use http or https, got {:?}",
                path.display(),
                parsed.scheme()
            );
        }

        if self.asset_id().trim().is_empty() {
            bail!("service.asset_id in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.service.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "service.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
            if parsed > MAX_TIMEOUT {
                bail!(
                    "service.timeout in {} must be at most 10m, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(retries) = self.service.retries
            && retries > MAX_RETRIES
        {
            bail!(
                "service.retries in {} must be at most {MAX_RETRIES}, got {retries}",
                path.display()
            );
        }

        if let Some(backoff) = &self.service.retry_backoff
            && parse_duration(backoff)? > MAX_RETRY_BACKOFF
        {
            bail!(
                "service.retry_backoff in {} must be at most 1m, got {}",
                path.display(),
                backoff
            );
        }

        if let Some(rows_per_page) = self.ui.rows_per_page {
            validate_rows_per_page(rows_per_page)
                .with_context(|| format!("invalid ui.rows_per_page in {}", path.display()))?;
        }

        let level = self.log_level();
        if !LOG_LEVELS.contains(&level) {
            bail!(
                "log.level in {} must be one of {}, got {level:?}",
                path.display(),
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.service
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn asset_id(&self) -> &str {
        self.service.asset_id.as_deref().unwrap_or(DEFAULT_ASSET_ID)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.service.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        Ok(RetryPolicy {
            retries: self.service.retries.unwrap_or(DEFAULT_RETRIES),
            backoff: parse_duration(
                self.service
                    .retry_backoff
                    .as_deref()
                    .unwrap_or(DEFAULT_RETRY_BACKOFF),
            )?,
        })
    }

    pub fn rows_per_page(&self) -> usize {
        self.ui.rows_per_page.unwrap_or(DEFAULT_ROWS_PER_PAGE)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => default_log_path(),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# footprint config\n# Place this file at: {}\n\nversion = 1\n\n[service]\nbase_url = \"{}\"\nasset_id = \"{}\"\n# Per-request timeout: <N>ms, <N>s or <N>m\ntimeout = \"{}\"\nretries = {}\nretry_backoff = \"{}\"\n\n[ui]\nrows_per_page = {}\n\n[log]\n# off, error, warn, info, debug or trace. FOOTPRINT_LOG overrides this.\nlevel = \"{}\"\n# Optional. Default is platform data dir (for example ~/.local/share/footprint/footprint.log)\n# file = \"/absolute/path/to/footprint.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_ASSET_ID,
            DEFAULT_TIMEOUT,
            DEFAULT_RETRIES,
            DEFAULT_RETRY_BACKOFF,
            DEFAULT_ROWS_PER_PAGE,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn default_log_path() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("cannot resolve data directory; set [log].file in the config"))?;
    Ok(data_root.join(APP_NAME).join(format!("{APP_NAME}.log")))
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins.saturating_mul(60)));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
