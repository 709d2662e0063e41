use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::controller::Ports;

/// The standard ACPI embedded controller location.
pub const DEFAULT_PORTS: Ports = Ports {
    command: 0x66,
    data: 0x62,
};

/// Controller locations, read from a TOML file of `[[controller]]` tables.
///
/// The first entry is the primary controller, the rest are secondaries in file order.
#[derive(Debug, Deserialize, Eq, PartialEq)]
pub struct Config {
    #[serde(default, rename = "controller")]
    pub controllers: Vec<Ports>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            controllers: vec![DEFAULT_PORTS],
        }
    }
}

impl Config {
    pub fn parse(data: &str) -> Result<Self> {
        toml::from_str(data).context("invalid controller configuration")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("in {}", path.display()))
    }
}
