//! Currency identities and the closed set of selectable currencies

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A three letter, upper-case ISO style currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(anyhow!("Invalid currency code: {}", s));
        }
        Ok(CurrencyCode(code))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A currency as seen by the conversion engine.
///
/// Rates are always quoted as "1 unit of a foreign currency = N units of the
/// local currency", so the local side never needs a lookup and always
/// divides, while a foreign source always multiplies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Currency {
    Local,
    Foreign(CurrencyCode),
}

impl Currency {
    pub fn is_local(&self) -> bool {
        matches!(self, Currency::Local)
    }

    pub fn foreign_code(&self) -> Option<&CurrencyCode> {
        match self {
            Currency::Local => None,
            Currency::Foreign(code) => Some(code),
        }
    }
}

/// The closed set of currencies a calculator session can select from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencySet {
    local: CurrencyCode,
    foreign: Vec<CurrencyCode>,
}

impl CurrencySet {
    pub fn new(local: CurrencyCode, foreign: Vec<CurrencyCode>) -> Result<Self> {
        if foreign.is_empty() {
            bail!("At least one foreign currency is required");
        }
        if foreign.contains(&local) {
            bail!("Local currency {} cannot also be a foreign currency", local);
        }
        for (i, code) in foreign.iter().enumerate() {
            if foreign[..i].contains(code) {
                bail!("Duplicate foreign currency: {}", code);
            }
        }
        Ok(Self { local, foreign })
    }

    pub fn local_code(&self) -> &CurrencyCode {
        &self.local
    }

    pub fn foreign_codes(&self) -> &[CurrencyCode] {
        &self.foreign
    }

    /// The foreign currency used when a side has to be forced away from LOCAL.
    pub fn default_foreign(&self) -> Currency {
        Currency::Foreign(self.foreign[0].clone())
    }

    pub fn code_of<'a>(&'a self, currency: &'a Currency) -> &'a CurrencyCode {
        match currency {
            Currency::Local => &self.local,
            Currency::Foreign(code) => code,
        }
    }

    pub fn contains(&self, currency: &Currency) -> bool {
        match currency {
            Currency::Local => true,
            Currency::Foreign(code) => self.foreign.contains(code),
        }
    }

    /// Resolves user text such as "thb" to a member of this set.
    pub fn parse(&self, text: &str) -> Result<Currency> {
        let code: CurrencyCode = text.parse()?;
        if code == self.local {
            return Ok(Currency::Local);
        }
        if self.foreign.contains(&code) {
            return Ok(Currency::Foreign(code));
        }
        Err(anyhow!("Unsupported currency: {}", code))
    }

    /// Every selectable currency, LOCAL first.
    pub fn all(&self) -> impl Iterator<Item = Currency> + '_ {
        std::iter::once(Currency::Local).chain(self.foreign.iter().cloned().map(Currency::Foreign))
    }
}

#[cfg(test)]
pub(crate) fn code(s: &str) -> CurrencyCode {
    s.parse().unwrap()
}

#[cfg(test)]
pub(crate) fn test_set() -> CurrencySet {
    CurrencySet::new(
        code("MMK"),
        ["THB", "USD", "MYR", "SGD", "CNY", "EUR"]
            .iter()
            .map(|c| code(c))
            .collect(),
    )
    .unwrap()
}
