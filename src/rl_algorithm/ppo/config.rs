use burn::config::Config;
use serde::{Deserialize, Serialize};

/// How the learning rate evolves during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningRateSchedule {
    /// Adjusted after every update to keep the policy KL near `desired_kl`.
    Adaptive,
    Fixed,
}

#[derive(Config, Debug, PartialEq)]
pub struct PpoAlgorithmCfg {
    pub class_name: String,
    pub value_loss_coef: f64,
    pub use_clipped_value_loss: bool,
    pub clip_param: f64,
    pub entropy_coef: f64,
    pub num_learning_epochs: usize,
    pub num_mini_batches: usize,
    pub learning_rate: f64,
    pub schedule: LearningRateSchedule,
    pub gamma: f64,
    pub lam: f64,
    pub desired_kl: f64,
    pub max_grad_norm: f64,
    pub normalize_advantage_per_mini_batch: bool,
}
