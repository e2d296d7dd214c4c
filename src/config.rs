//! Параметры анализа и сервера

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{MlError, Result};

pub const MIN_K: usize = 2;
pub const MAX_K: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_elbow_min_k")]
    pub elbow_min_k: usize,
    #[serde(default = "default_elbow_max_k")]
    pub elbow_max_k: usize,
}

fn default_k() -> usize { 4 }
fn default_max_iterations() -> usize { 100 }
fn default_tolerance() -> f64 { 1e-4 }
fn default_train_ratio() -> f64 { 0.7 }
fn default_delimiter() -> char { ',' }
fn default_elbow_min_k() -> usize { MIN_K }
fn default_elbow_max_k() -> usize { MAX_K }

/// Независимые потоки случайности, чтобы перезапуск кластеризации
/// не сдвигал разбиение train/test и не зависел от кривой локтя
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngStream {
    Elbow,
    ClusterFit { k: usize },
    Regression,
}

impl RngStream {
    fn offset(&self) -> u64 {
        match self {
            RngStream::Elbow => 0,
            RngStream::ClusterFit { k } => 0x5851_F42D_4C95_7F2D_u64.wrapping_mul(*k as u64 + 1),
            RngStream::Regression => 0x9E37_79B9_7F4A_7C15,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        validate_k(self.k)?;

        if self.max_iterations == 0 {
            return Err(MlError::InvalidConfig("max_iterations must be positive".to_string()));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(MlError::InvalidConfig(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(MlError::InvalidConfig(format!(
                "train_ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        if !self.delimiter.is_ascii() {
            return Err(MlError::InvalidConfig(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )));
        }
        if self.elbow_min_k < 1 || self.elbow_min_k > self.elbow_max_k {
            return Err(MlError::InvalidConfig(format!(
                "elbow range {}..={} is empty",
                self.elbow_min_k, self.elbow_max_k
            )));
        }

        Ok(())
    }

    /// Генератор для указанного потока: детерминированный при заданном seed,
    /// иначе из энтропии ОС
    pub fn rng(&self, stream: RngStream) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ stream.offset()),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            train_ratio: default_train_ratio(),
            seed: None,
            delimiter: default_delimiter(),
            elbow_min_k: default_elbow_min_k(),
            elbow_max_k: default_elbow_max_k(),
        }
    }
}

pub fn validate_k(k: usize) -> Result<()> {
    if !(MIN_K..=MAX_K).contains(&k) {
        return Err(MlError::InvalidConfig(format!(
            "k must be between {} and {}, got {}",
            MIN_K, MAX_K, k
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: std::net::SocketAddr,
}

impl ServerConfig {
    pub const ADDR_ENV: &'static str = "SALES_ML_ADDR";

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_value(std::env::var(Self::ADDR_ENV).ok().as_deref())
    }

    /// Адрес из значения переменной окружения, `0.0.0.0:8000` если она не задана
    pub fn from_value(value: Option<&str>) -> anyhow::Result<Self> {
        let addr = match value {
            Some(value) => value
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", Self::ADDR_ENV, value, e))?,
            None => std::net::SocketAddr::from(([0, 0, 0, 0], 8000)),
        };
        Ok(Self { addr })
    }
}
