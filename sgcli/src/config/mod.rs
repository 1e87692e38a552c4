//! Hierarchical configuration ("aspects") and resolved connection settings.
//!
//! Aspects are a tree of text values addressed with dotted keys, so
//! `proxysg_1.ipaddr` reads the `ipaddr` entry of the `proxysg_1` table.
//! A run loads them once (usually from a TOML file) and hands them to the
//! [`SessionBuilder`](crate::session::SessionBuilder).
//!
//! ```toml
//! [aspects]
//! proxysg_1.ipaddr = "10.0.0.5"
//! proxysg_1.cliaccess = "serial"
//! proxysg_1.serial = "10.0.0.200:2005"
//! ```

mod params;

pub use params::{CliAccess, ConnectionParams, DEFAULT_PAGER_RESIDUE, Timeouts};
pub(crate) use params::{parse_seconds, parse_serial};

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// A node in the aspects tree.
#[derive(Debug, Clone, PartialEq)]
pub enum AspectValue {
    /// Leaf value.
    Text(String),
    /// Nested table.
    Table(Aspects),
}

impl AspectValue {
    /// The text of a leaf, `None` for tables.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AspectValue::Text(s) => Some(s),
            AspectValue::Table(_) => None,
        }
    }

    /// The nested table, `None` for leaves.
    pub fn as_table(&self) -> Option<&Aspects> {
        match self {
            AspectValue::Table(t) => Some(t),
            AspectValue::Text(_) => None,
        }
    }
}

impl From<&str> for AspectValue {
    fn from(value: &str) -> Self {
        AspectValue::Text(value.to_string())
    }
}

impl From<String> for AspectValue {
    fn from(value: String) -> Self {
        AspectValue::Text(value)
    }
}

impl From<Aspects> for AspectValue {
    fn from(value: Aspects) -> Self {
        AspectValue::Table(value)
    }
}

impl fmt::Display for AspectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectValue::Text(s) => write!(f, "{}", s),
            AspectValue::Table(t) => write!(f, "{{{} entries}}", t.len()),
        }
    }
}

/// Tree of configuration values addressed by dotted keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aspects {
    entries: IndexMap<String, AspectValue>,
}

#[derive(Deserialize)]
struct ConfigFile {
    aspects: Option<toml::Table>,
}

impl Aspects {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a dotted key.
    pub fn get(&self, key: &str) -> Option<&AspectValue> {
        match key.split_once('.') {
            None => self.entries.get(key),
            Some((head, rest)) => self.entries.get(head)?.as_table()?.get(rest),
        }
    }

    /// Look up a dotted key holding text.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AspectValue::as_str)
    }

    /// Look up a dotted key holding a table.
    pub fn table(&self, key: &str) -> Option<&Aspects> {
        self.get(key).and_then(AspectValue::as_table)
    }

    /// Look up a dotted key that must be present.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get_str(key).ok_or_else(|| {
            ConfigError::Missing {
                key: key.to_string(),
            }
            .into()
        })
    }

    /// Whether a dotted key resolves to a value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a dotted key, creating intermediate tables on the way.
    ///
    /// Fails when an intermediate level already holds text.
    pub fn insert(&mut self, key: &str, value: impl Into<AspectValue>) -> Result<()> {
        match key.split_once('.') {
            None => {
                self.entries.insert(key.to_string(), value.into());
                Ok(())
            }
            Some((head, rest)) => {
                let node = self
                    .entries
                    .entry(head.to_string())
                    .or_insert_with(|| AspectValue::Table(Aspects::new()));
                match node {
                    AspectValue::Table(table) => table.insert(rest, value),
                    AspectValue::Text(_) => Err(ConfigError::NotATable {
                        key: head.to_string(),
                        rest: rest.to_string(),
                    }
                    .into()),
                }
            }
        }
    }

    /// Top-level entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AspectValue)> {
        self.entries.iter()
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the `[aspects]` table of a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(source).map_err(ConfigError::Parse)?;
        let table = file.aspects.ok_or(ConfigError::MissingSection)?;
        let mut aspects = Aspects::new();
        for (key, value) in table {
            aspects.insert(&key, Self::convert(value)?)?;
        }
        Ok(aspects)
    }

    /// Load aspects from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&source)
    }

    fn convert(value: toml::Value) -> Result<AspectValue> {
        Ok(match value {
            toml::Value::String(s) => AspectValue::Text(s),
            toml::Value::Table(table) => {
                let mut nested = Aspects::new();
                for (key, value) in table {
                    nested.insert(&key, Self::convert(value)?)?;
                }
                AspectValue::Table(nested)
            }
            toml::Value::Array(items) => AspectValue::Text(
                items
                    .iter()
                    .map(|item| match item {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            other => AspectValue::Text(other.to_string()),
        })
    }
}
