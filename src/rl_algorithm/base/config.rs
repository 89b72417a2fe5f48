use burn::config::Config;
use serde::{Deserialize, Serialize};

use crate::rl_algorithm::ppo::actor_critic::ActorCriticCfg;
use crate::rl_algorithm::ppo::config::PpoAlgorithmCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerKind {
    Tensorboard,
    Neptune,
    Wandb,
}

/// Hyperparameters of the on-policy training runner.
#[derive(Config, Debug, PartialEq)]
pub struct OnPolicyRunnerCfg {
    /// `-1` draws a random seed when the run starts.
    pub seed: i64,
    pub device: String,
    pub num_steps_per_env: usize,
    pub max_iterations: usize,
    pub save_interval: usize,
    /// Name of the log directory under the logger root.
    pub experiment_name: String,
    /// Suffix appended to the timestamped run directory.
    pub run_name: String,
    pub logger: LoggerKind,
    pub neptune_project: String,
    pub wandb_project: String,
    pub resume: bool,
    /// Pattern of the run directory to resume from.
    pub load_run: String,
    /// Pattern of the checkpoint file to resume from.
    pub load_checkpoint: String,
    pub clip_actions: Option<f64>,
    pub policy: ActorCriticCfg,
    pub algorithm: PpoAlgorithmCfg,
}
