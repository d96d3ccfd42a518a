use crate::core::currency::{CurrencyCode, CurrencySet};
use crate::core::rates::RateTable;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateSourceKind {
    #[default]
    Simulated,
    Yahoo,
}

/// Language of labels in tables and the calculator.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Mm,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Mm,
            Language::Mm => Language::En,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RatesConfig {
    pub source: RateSourceKind,
    pub refresh_interval_secs: u64,
    pub jitter_percent: f64,
    pub latency_ms: u64,
    pub base: BTreeMap<CurrencyCode, f64>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        let base: BTreeMap<CurrencyCode, f64> = [
            ("USD", 4500.0),
            ("THB", 132.0),
            ("MYR", 1020.0),
            ("SGD", 3350.0),
            ("CNY", 620.0),
            ("EUR", 4850.0),
        ]
        .into_iter()
        .filter_map(|(code, rate)| code.parse().ok().map(|code| (code, rate)))
        .collect();

        RatesConfig {
            source: RateSourceKind::Simulated,
            refresh_interval_secs: 15 * 60,
            jitter_percent: 1.0,
            latency_ms: 0,
            base,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub local_currency: String,
    pub currencies: Vec<String>,
    pub language: Language,
    pub rates: RatesConfig,
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            local_currency: "MMK".to_string(),
            currencies: ["THB", "USD", "MYR", "SGD", "CNY", "EUR"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            language: Language::En,
            rates: RatesConfig::default(),
            providers: ProvidersConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when
    /// it has not been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "kyatfast", "kyatfast")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "kyatfast", "kyatfast")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn currency_set(&self) -> Result<CurrencySet> {
        let local: CurrencyCode = self
            .local_currency
            .parse()
            .context("Invalid local_currency")?;
        let foreign = self
            .currencies
            .iter()
            .map(|c| c.parse::<CurrencyCode>())
            .collect::<Result<Vec<_>>>()
            .context("Invalid entry in currencies")?;
        CurrencySet::new(local, foreign)
    }

    /// The configured base rates, restricted to the selectable currencies.
    pub fn base_rates(&self) -> Result<RateTable> {
        let currencies = self.currency_set()?;
        let table: RateTable = currencies
            .foreign_codes()
            .iter()
            .filter_map(|code| self.rates.base.get(code).map(|rate| (code.clone(), *rate)))
            .collect();
        if table.is_empty() {
            bail!("No valid base rates configured for {:?}", self.currencies);
        }
        Ok(table)
    }
}
