use crate::core::config::AppConfig;
use anyhow::{Context, Result, bail};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

/// Writes the example configuration to the platform config directory.
pub fn setup() -> Result<()> {
    let path = setup_at_path(AppConfig::default_config_path()?)?;
    println!("Created configuration at {}", path.display());
    Ok(())
}

/// Writes the example configuration to `path`. An existing file is never
/// touched.
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            bail!("Configuration file already exists at {}", path.display())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to create {}", path.display()));
        }
    };
    file.write_all(EXAMPLE_CONFIG.as_bytes())
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RateSourceKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_setup_writes_loadable_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.yaml");

        let written = setup_at_path(&config_path)?;
        assert_eq!(written, config_path);

        let content = fs::read_to_string(&config_path)?;
        assert!(content.starts_with("# Example configuration file for kyatfast"));

        let config = AppConfig::load_from_path(&config_path)?;
        assert_eq!(config.local_currency, "MMK");
        Ok(())
    }

    #[test]
    fn test_setup_keeps_existing_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "local_currency: THB")?;

        let err = setup_at_path(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&config_path)?, "local_currency: THB");
        Ok(())
    }

    #[test]
    fn test_example_config_matches_defaults() -> Result<()> {
        let example: AppConfig = serde_yaml::from_str(EXAMPLE_CONFIG)?;
        let defaults = AppConfig::default();

        assert_eq!(example.rates.source, RateSourceKind::Simulated);
        assert_eq!(example.rates.latency_ms, 800);
        assert!(example.data_path.is_none());
        assert_eq!(example.currencies, defaults.currencies);
        assert_eq!(example.language, defaults.language);
        // The only value that differs from the built-in defaults
        assert_ne!(example.rates.latency_ms, defaults.rates.latency_ms);
        assert_eq!(example.rates.jitter_percent, defaults.rates.jitter_percent);
        assert_eq!(example.base_rates()?, defaults.base_rates()?);
        assert_eq!(
            example.rates.refresh_interval_secs,
            defaults.rates.refresh_interval_secs
        );
        Ok(())
    }
}
