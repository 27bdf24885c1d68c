//! Host configuration file

use std::path::{Path, PathBuf};
use std::str::FromStr;

use midimatrix_core::{ConfigError, MatrixConfig, MatrixFx, MidiEffect, MidiFxChain, StrumConfig, StrumFx};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("invalid engine settings: {0}")]
    Invalid(#[from] ConfigError),
    #[error("target {0} mapped twice")]
    DuplicateTarget(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Matrix,
    Strum,
}

impl EngineKind {
    /// Effect name used for parameter changes
    pub fn effect_name(self) -> &'static str {
        match self {
            Self::Matrix => "Matrix",
            Self::Strum => "Strum",
        }
    }
}

/// MIDI ports to open. Names match by substring; a missing name opens a
/// virtual port where the platform supports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    pub input: Option<String>,
    pub output: Option<String>,
}

/// Where a matrix target's value is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMapping {
    /// 1-based target index
    pub target: usize,
    #[serde(default)]
    pub channel: u8,
    pub controller: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Chain order
    pub engines: Vec<EngineKind>,
    pub ports: PortConfig,
    pub matrix: MatrixConfig,
    pub strum: StrumConfig,
    pub targets: Vec<TargetMapping>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            engines: vec![EngineKind::Matrix, EngineKind::Strum],
            ports: PortConfig::default(),
            matrix: MatrixConfig::default(),
            strum: StrumConfig::default(),
            targets: Vec::new(),
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<(), HostConfigError> {
        self.matrix.validate()?;
        self.strum.validate()?;
        for (i, mapping) in self.targets.iter().enumerate() {
            if mapping.controller > 127 {
                return Err(ConfigError::ControllerOutOfRange(mapping.controller).into());
            }
            if self.targets[..i].iter().any(|m| m.target == mapping.target) {
                return Err(HostConfigError::DuplicateTarget(mapping.target));
            }
        }
        Ok(())
    }

    pub fn build_chain(&self) -> midimatrix_core::Result<MidiFxChain> {
        let mut chain = MidiFxChain::new();
        for engine in &self.engines {
            let effect = match engine {
                EngineKind::Matrix => MidiEffect::Matrix(MatrixFx::new(self.matrix.clone())?),
                EngineKind::Strum => MidiEffect::Strum(StrumFx::new(self.strum.clone())?),
            };
            chain.add(effect);
        }
        Ok(chain)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("midimatrix")
        .join("config.toml")
}

/// Load `path`, or the default location when `None`. A missing default file
/// yields the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<HostConfig, HostConfigError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (config_path(), false),
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(HostConfig::default());
        }
        Err(source) => return Err(HostConfigError::Read { path, source }),
    };

    let config = parse_config(&text).map_err(|source| HostConfigError::Parse { path: path.clone(), source })?;
    config.validate()?;
    tracing::info!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<HostConfig, toml::de::Error> {
    toml::from_str(text)
}

/// `engine.param=value` from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct ParamOverride {
    pub engine: EngineKind,
    pub param: String,
    pub value: f32,
}

impl FromStr for ParamOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s.split_once('=').ok_or_else(|| format!("expected ENGINE.PARAM=VALUE, got '{s}'"))?;
        let (engine, param) = key.split_once('.').ok_or_else(|| format!("expected ENGINE.PARAM, got '{key}'"))?;
        let engine = match engine.trim().to_ascii_lowercase().as_str() {
            "matrix" => EngineKind::Matrix,
            "strum" => EngineKind::Strum,
            other => return Err(format!("unknown engine '{other}'")),
        };
        let value = value.trim().parse().map_err(|e| format!("bad value '{value}': {e}"))?;
        Ok(Self { engine, param: param.trim().to_string(), value })
    }
}
