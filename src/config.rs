use std::env::VarError;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use pnet::util::MacAddr;
use serde::Deserialize;
use thiserror::Error;

use crate::common::DEFAULT_PORT;
use crate::filter::TargetFilter;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{0}'")]
    Missing(&'static str),
    #[error("invalid MAC address '{0}', expected the form aa:bb:cc:dd:ee:ff")]
    InvalidMac(String),
    #[error("cannot expand config path: {0}")]
    Expand(#[from] shellexpand::LookupError<VarError>),
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yml::Error),
}

/// Settings as they come from the command line or a config file, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub command: Option<String>,
    pub mac: Option<String>,
    pub source_ip: Option<Ipv4Addr>,
    pub port: Option<u16>,
}

impl Settings {
    /// Values set in `over` win.
    pub fn merge(self, over: Settings) -> Settings {
        Settings {
            command: over.command.or(self.command),
            mac: over.mac.or(self.mac),
            source_ip: over.source_ip.or(self.source_ip),
            port: over.port.or(self.port),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(text)?)
    }

    /// Reads a YAML file; `~` and `$VAR` in the path are expanded.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let path = PathBuf::from(shellexpand::full(path)?.into_owned());
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        log::debug!("loaded config from {}", path.display());
        Self::from_yaml(&text)
    }
}

#[derive(Debug)]
pub struct Config {
    pub filter: TargetFilter,
    pub command: String,
}

impl TryFrom<Settings> for Config {
    type Error = ConfigError;

    fn try_from(s: Settings) -> Result<Self, Self::Error> {
        let mac = s.mac.ok_or(ConfigError::Missing("mac"))?;
        let mac: MacAddr = mac.parse().map_err(|_| ConfigError::InvalidMac(mac.clone()))?;
        let command = s.command.ok_or(ConfigError::Missing("command"))?;

        Ok(Config {
            filter: TargetFilter::new(mac, s.source_ip, s.port.unwrap_or(DEFAULT_PORT)),
            command,
        })
    }
}
