use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use snapcdc_monitor::MonitorConfig;
use snapcdc_source::FetcherConfig;

/// Top-level `snapcdc watch` configuration file.
///
/// ```toml
/// [source]
/// path = "directory.json"
/// key_attribute = "sAMAccountName"
/// page_size = 512
///
/// [monitor]
/// refresh_period_secs = 20
/// ignore_fields = ["logonCount", "lastLogon"]
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CdcConfig {
    pub source: SourceConfig,
    pub monitor: MonitorConfig,
}

/// Where snapshots come from and how they are read.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON export reread on every poll.
    pub path: PathBuf,
    #[serde(flatten)]
    pub fetcher: FetcherConfig,
}

impl CdcConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config = Self::from_toml(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        // A relative source path is relative to the config file.
        if config.source.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.source.path = dir.join(&config.source.path);
            }
        }
        Ok(config)
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.source.path.as_os_str().is_empty() {
            bail!("source.path is required");
        }
        Ok(config)
    }

    /// Apply command-line overrides on top of the file.
    pub fn apply_overrides(
        &mut self,
        refresh_secs: Option<u64>,
        ignore: &[String],
        diagnostics: bool,
    ) {
        if let Some(secs) = refresh_secs {
            self.monitor.refresh_period = Duration::from_secs(secs);
        }
        if !ignore.is_empty() {
            self.monitor.ignore_fields = self
                .monitor
                .ignore_fields
                .iter()
                .map(str::to_string)
                .chain(ignore.iter().cloned())
                .collect();
        }
        if diagnostics {
            self.monitor.diagnostics = true;
            self.source.fetcher.diagnostics = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [source]
        path = "users.json"
        key_attribute = "uid"
        page_size = 100

        [monitor]
        refresh_period_secs = 30
        ignore_fields = ["logonCount"]
    "#;

    #[test]
    fn parse_full_config() {
        let config = CdcConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.source.path, PathBuf::from("users.json"));
        assert_eq!(config.source.fetcher.key_attribute, "uid");
        assert_eq!(config.source.fetcher.page_size, 100);
        assert_eq!(config.source.fetcher.max_reconnects, 3);
        assert_eq!(config.monitor.refresh_period, Duration::from_secs(30));
        assert!(config.monitor.ignore_fields.contains("logonCount"));
    }

    #[test]
    fn defaults_apply() {
        let config = CdcConfig::from_toml("[source]\npath = \"d.json\"\n").unwrap();
        assert_eq!(config.source.fetcher.key_attribute, "sAMAccountName");
        assert_eq!(config.monitor, MonitorConfig::default());
    }

    #[test]
    fn missing_path_rejected() {
        assert!(CdcConfig::from_toml("[monitor]\nrefresh_period_secs = 5\n").is_err());
    }

    #[test]
    fn overrides() {
        let mut config = CdcConfig::from_toml(SAMPLE).unwrap();
        config.apply_overrides(Some(2), &["lastLogon".to_string()], true);
        assert_eq!(config.monitor.refresh_period, Duration::from_secs(2));
        assert!(config.monitor.ignore_fields.contains("logonCount"));
        assert!(config.monitor.ignore_fields.contains("lastLogon"));
        assert!(config.monitor.diagnostics);
        assert!(config.source.fetcher.diagnostics);
    }

    #[test]
    fn load_resolves_relative_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cdc.toml");
        std::fs::write(&file, SAMPLE).unwrap();
        let config = CdcConfig::load(&file).unwrap();
        assert_eq!(config.source.path, dir.path().join("users.json"));
    }
}
