//! Engine configuration file.
//!
//! ```toml
//! [engine]
//! json_column = "enrollments"
//! max_retries = 2
//! default_page_size = 50
//! max_page_size = 50000
//! ```

use std::fs;
use std::path::Path;

use analytics_model::{AnalyticsError, EngineOptions};
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    engine: EngineOptions,
}

/// Engine options from `path`, or the defaults when no file is given.
pub fn load_options(path: Option<&Path>) -> Result<EngineOptions> {
    let Some(path) = path else {
        return Ok(EngineOptions::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let options = parse_options(&content)
        .with_context(|| format!("load config {}", path.display()))?;
    debug!(path = %path.display(), ?options, "loaded engine configuration");
    Ok(options)
}

pub fn parse_options(content: &str) -> analytics_model::Result<EngineOptions> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|error| AnalyticsError::Config(error.to_string()))?;
    let options = file.engine;
    if options.json_column.trim().is_empty() {
        return Err(AnalyticsError::Config("json_column must not be empty".to_string()));
    }
    if options.max_page_size == 0 || options.default_page_size == 0 {
        return Err(AnalyticsError::Config("page sizes must be positive".to_string()));
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_keep_defaults() {
        let options = parse_options("[engine]\nmax_retries = 3\n").expect("options");
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.json_column, "enrollments");
        assert_eq!(parse_options("").expect("empty"), EngineOptions::default());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            parse_options("[engine]\nmax_page_size = 0\n"),
            Err(AnalyticsError::Config(_))
        ));
        assert!(matches!(
            parse_options("[engine]\njson_column = \" \"\n"),
            Err(AnalyticsError::Config(_))
        ));
        assert!(matches!(
            parse_options("[engines]\n"),
            Err(AnalyticsError::Config(_))
        ));
    }
}
