//! Run fingerprinting — deterministic identification of a backtest run.
//!
//! Two runs with the same fingerprint are guaranteed bit-identical outputs
//! (the engine is a pure function of its inputs), so callers can dedupe
//! sweeps or verify reproducibility by comparing hashes alone.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{BacktestConfig, StrategyConfig};
use crate::domain::Bar;

/// BLAKE3 hash of the canonical JSON of both configs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

/// BLAKE3 content hash of the bar series (exact bit patterns, not display
/// forms — two series differing in the last mantissa bit hash differently).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

/// Deterministic run identity: config + dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash both configs via their canonical JSON form.
///
/// serde emits struct fields in declaration order, so the serialization is
/// deterministic without any sorting step.
pub fn config_hash(strategy: &StrategyConfig, backtest: &BacktestConfig) -> ConfigHash {
    let json = serde_json::json!({
        "strategy": strategy,
        "backtest": backtest,
    });
    ConfigHash(blake3::hash(json.to_string().as_bytes()).to_hex().to_string())
}

/// Hash the bar series content.
pub fn dataset_hash(bars: &[Bar]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp_millis().to_le_bytes());
        hasher.update(&bar.open.to_bits().to_le_bytes());
        hasher.update(&bar.high.to_bits().to_le_bytes());
        hasher.update(&bar.low.to_bits().to_le_bytes());
        hasher.update(&bar.close.to_bits().to_le_bytes());
        hasher.update(&bar.volume.to_bits().to_le_bytes());
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}

/// Complete fingerprint of one run, embedded in the run result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub run_id: RunId,
}

impl RunFingerprint {
    pub fn new(strategy: &StrategyConfig, backtest: &BacktestConfig, bars: &[Bar]) -> Self {
        let config_hash = config_hash(strategy, backtest);
        let dataset_hash = dataset_hash(bars);
        let run_id = RunId(
            blake3::hash(format!("{}:{}", config_hash.0, dataset_hash.0).as_bytes())
                .to_hex()
                .to_string(),
        );
        Self {
            config_hash,
            dataset_hash,
            run_id,
        }
    }
}
