//! Simulator configuration.
//!
//! Configuration arrives either from the CLI (clap options mapped onto these
//! structs) or deserialized from JSON for embedding. Defaults live in the
//! `defaults` module; `BpMode` parses from the user-facing mode strings and
//! rejects anything outside the closed set.

use std::str::FromStr;

use serde::Deserialize;

/// Default configuration constants.
mod defaults {
    /// Default BTB size in entries.
    pub const BP_SIZE: u32 = 128;

    /// Default number of ways per BTB set.
    pub const BP_WAYS: u32 = 16;
}

/// Branch prediction strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BpMode {
    /// BTB with 2-bit saturating direction counters (default).
    #[default]
    DynamicTwoBit,
    /// Always taken.
    AlwaysTaken,
    /// Never taken.
    AlwaysNotTaken,
    /// Taken only for backward (loop) branches.
    StaticBackwardTaken,
}

impl FromStr for BpMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dynamic_two_bit" => Ok(Self::DynamicTwoBit),
            "always_taken" => Ok(Self::AlwaysTaken),
            "always_not_taken" => Ok(Self::AlwaysNotTaken),
            "static_backward_taken" => Ok(Self::StaticBackwardTaken),
            _ => Err(format!("unknown branch prediction mode '{s}'")),
        }
    }
}

/// Branch predictor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BpConfig {
    /// Branch prediction mode.
    #[serde(default)]
    pub mode: BpMode,

    /// BTB size in entries. Must be a nonzero power of two.
    #[serde(default = "BpConfig::default_size")]
    pub size: u32,

    /// Number of ways in the BTB. Must divide `size`.
    #[serde(default = "BpConfig::default_ways")]
    pub ways: u32,
}

impl BpConfig {
    /// Returns the default BTB entry count.
    pub fn default_size() -> u32 {
        defaults::BP_SIZE
    }

    /// Returns the default BTB way count.
    pub fn default_ways() -> u32 {
        defaults::BP_WAYS
    }
}

impl Default for BpConfig {
    fn default() -> Self {
        Self {
            mode: BpMode::default(),
            size: defaults::BP_SIZE,
            ways: defaults::BP_WAYS,
        }
    }
}

/// Root configuration for a simulation run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimConfig {
    /// Branch predictor settings.
    #[serde(default)]
    pub bp: BpConfig,

    /// Print the per-stage pipeline log to stdout.
    #[serde(default)]
    pub log: bool,
}
