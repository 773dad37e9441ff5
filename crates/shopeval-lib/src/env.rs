//! Environment adapter contract.
//!
//! The evaluation loop consumes a Gymnasium-style reset/step surface and
//! forwards solver actions verbatim. The environment's internal simulation
//! logic is an external concern; this module only fixes the call contract
//! and the configuration accepted over the wire.

use crate::error::EvalError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod sim;

/// Configuration carried in the task message's `<env_config>` tag.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnvConfig {
    /// Size of the product catalog.
    #[serde(default = "default_num_products")]
    pub num_products: usize,
    /// Whether to sample from human-authored goal templates.
    #[serde(default = "default_human_goals")]
    pub human_goals: bool,
    /// Optional seed for reproducible catalogs and goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_num_products() -> usize {
    1000
}

fn default_human_goals() -> bool {
    true
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            num_products: default_num_products(),
            human_goals: default_human_goals(),
            seed: None,
        }
    }
}

/// The output of resetting an environment to a fresh episode.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetOutcome {
    /// Initial page observation text.
    pub observation: String,
    /// The episode's goal instruction text.
    pub instruction: String,
}

/// The output of a single environment step.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StepOutcome {
    /// Page observation text after the action.
    pub observation: String,
    /// Reward signal; 1.0 exactly marks a successful purchase.
    pub reward: f64,
    /// True once the episode reached a terminal state.
    pub done: bool,
    /// Diagnostic data, opaque to the loop.
    pub info: Value,
}

/// The minimal surface the evaluation loop requires from an environment.
pub trait ShopEnv: Send {
    /// Starts a fresh episode, returning the first observation and the
    /// goal instruction.
    fn reset(&mut self) -> Result<ResetOutcome, EvalError>;

    /// Applies one opaque action string and returns the resulting state.
    fn step(&mut self, action: &str) -> Result<StepOutcome, EvalError>;
}
