use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::acoustics::infrastructure::room_acoustics_transformer::{
    RoomOutputLength, RoomSimulationSettings, DEFAULT_ROOM_POOL_SIZE,
};
use crate::augmentation::infrastructure::noise_mix_transformer::{
    DEFAULT_NOISE_MU, DEFAULT_NOISE_SD,
};
use crate::augmentation::infrastructure::tempo_shift_transformer::DEFAULT_TEMPO_RATIO;

/// Failures reading a pipeline description from disk.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One stage of the augmentation pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformConfig {
    Noise {
        library: PathBuf,
        #[serde(default = "default_noise_mu")]
        mu: f64,
        #[serde(default = "default_noise_sd")]
        sd: f64,
    },
    Room(RoomSimulationSettings),
    Tempo {
        #[serde(default = "default_tempo_ratio")]
        ratio: f64,
    },
}

fn default_noise_mu() -> f64 {
    DEFAULT_NOISE_MU
}

fn default_noise_sd() -> f64 {
    DEFAULT_NOISE_SD
}

fn default_tempo_ratio() -> f64 {
    DEFAULT_TEMPO_RATIO
}

/// Ordered transform descriptors plus the base seed for a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

/// Per-transform command-line switches.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformFlags {
    pub noise_dir: Option<PathBuf>,
    pub noise_mu: f64,
    pub noise_sd: f64,
    pub room_simulation: bool,
    pub rooms: usize,
    pub room_output: RoomOutputLength,
    pub tempo: f64,
}

impl Default for TransformFlags {
    fn default() -> Self {
        Self {
            noise_dir: None,
            noise_mu: DEFAULT_NOISE_MU,
            noise_sd: DEFAULT_NOISE_SD,
            room_simulation: false,
            rooms: DEFAULT_ROOM_POOL_SIZE,
            room_output: RoomOutputLength::Full,
            tempo: DEFAULT_TEMPO_RATIO,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys always serializes.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Builds the noise -> room -> tempo chain, leaving out disabled stages.
    pub fn from_flags(flags: &TransformFlags, seed: Option<u64>) -> Self {
        let mut transforms = Vec::new();
        if let Some(dir) = &flags.noise_dir {
            transforms.push(TransformConfig::Noise {
                library: dir.clone(),
                mu: flags.noise_mu,
                sd: flags.noise_sd,
            });
        }
        if flags.room_simulation {
            transforms.push(TransformConfig::Room(RoomSimulationSettings {
                pool_size: flags.rooms,
                output_length: flags.room_output,
                ..RoomSimulationSettings::default()
            }));
        }
        if flags.tempo != DEFAULT_TEMPO_RATIO {
            transforms.push(TransformConfig::Tempo { ratio: flags.tempo });
        }
        Self { seed, transforms }
    }
}
