// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FOOTPRINT_LOG";

/// `FOOTPRINT_LOG` wins over the configured level when set and non-empty.
pub fn filter_directive(configured: &str, env_override: Option<&str>) -> String {
    match env_override.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => configured.to_owned(),
    }
}

/// Routes tracing output to `path`; the terminal belongs to the page.
pub fn init(level: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let env_override = env::var(LOG_ENV).ok();
    let directive = filter_directive(level, env_override.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter {directive:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::filter_directive;

    #[test]
    fn env_override_replaces_configured_level() {
        assert_eq!(filter_directive("info", None), "info");
        assert_eq!(filter_directive("info", Some("")), "info");
        assert_eq!(filter_directive("info", Some("  ")), "info");
        assert_eq!(
            filter_directive("info", Some("footprint_credentials=trace")),
            "footprint_credentials=trace"
        );
    }
}
