//! Model configuration.
//!
//! The defaults describe the routing example: a 16-dimensional vocabulary,
//! a state buffer cycling A→B→C→D→E→A, a vision input of `0.8*LETTER+D`
//! for the first 10 seconds and one clean-up memory aligned with `A`.

use crate::error::{CleanupError, Result};
use crate::kernel::expression::is_identifier;
use crate::memory::Normalization;
use serde::{Deserialize, Serialize};

/// Clean-up memory attached to the state buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Output port name (default: "cleanup A")
    pub name: String,
    /// Reference symbols, in output order (default: ["A"])
    pub symbols: Vec<String>,
    /// Input treatment (default: raw dot product)
    pub normalization: Normalization,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            name: "cleanup A".to_string(),
            symbols: vec!["A".to_string()],
            normalization: Normalization::Raw,
        }
    }
}

/// Stimulus presented to a buffer at the start of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Target buffer (default: "vision")
    pub buffer: String,
    /// Symbol expression (default: "0.8*LETTER+D")
    pub expression: String,
    /// Seconds the stimulus stays on (default: 10.0)
    pub duration: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            buffer: "vision".to_string(),
            expression: "0.8*LETTER+D".to_string(),
            duration: 10.0,
        }
    }
}

/// Everything needed to assemble a [`Model`](crate::highlevel::Model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Semantic pointer dimensionality (default: 16)
    pub dimensions: usize,
    /// Vocabulary seed (default: 0)
    pub seed: u64,
    /// Bound on |dot| between generated symbols (default: 0.1)
    pub max_similarity: f64,
    /// Vocabulary symbols, generated in order
    pub symbols: Vec<String>,
    /// Cyclic state sequence (default: A..E)
    pub sequence: Vec<String>,
    /// Vision symbol that routes vision into state (default: "LETTER")
    pub start_symbol: String,
    /// Name of the sequenced buffer (default: "state")
    pub state_buffer: String,
    /// Minimum seconds between rule firings (default: 0.05)
    pub dwell: f64,
    /// Simulation time step in seconds (default: 0.001)
    pub dt: f64,
    pub cleanup: CleanupConfig,
    pub input: InputConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dimensions: 16,
            seed: 0,
            max_similarity: 0.1,
            symbols: ["A", "B", "C", "D", "E", "LETTER"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sequence: ["A", "B", "C", "D", "E"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            start_symbol: "LETTER".to_string(),
            state_buffer: "state".to_string(),
            dwell: 0.05,
            dt: 0.001,
            cleanup: CleanupConfig::default(),
            input: InputConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(invalid("dimensions must be positive"));
        }
        if self.symbols.is_empty() {
            return Err(invalid("symbols must not be empty"));
        }
        if let Some(bad) = self.symbols.iter().find(|s| !is_identifier(s)) {
            return Err(invalid(&format!("symbol {:?} is not an identifier", bad)));
        }
        if self.max_similarity.is_nan() || self.max_similarity < 0.0 {
            return Err(invalid("max_similarity must be non-negative"));
        }
        if self.dt.is_nan() || self.dt <= 0.0 {
            return Err(invalid("dt must be positive"));
        }
        if self.dwell.is_nan() || self.dwell <= 0.0 {
            return Err(invalid("dwell must be positive"));
        }
        if self.input.duration < 0.0 {
            return Err(invalid("input duration must be non-negative"));
        }
        if self.state_buffer == self.input.buffer {
            return Err(invalid("state and input buffers must differ"));
        }
        if self.cleanup.symbols.is_empty() {
            return Err(invalid("cleanup needs at least one symbol"));
        }

        let known = |s: &String| self.symbols.contains(s);
        for s in self
            .sequence
            .iter()
            .chain(self.cleanup.symbols.iter())
            .chain(std::iter::once(&self.start_symbol))
        {
            if !known(s) {
                return Err(invalid(&format!("symbol {:?} is not in symbols", s)));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> CleanupError {
    CleanupError::InvalidConfig(msg.to_string())
}
