use burn::config::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Elu,
    Selu,
    Relu,
    Crelu,
    Lrelu,
    Tanh,
    Sigmoid,
    Identity,
}

/// Parameterization of the policy's exploration noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseStdType {
    Scalar,
    Log,
}

/// Shape of the MLP actor-critic the training runner builds.
#[derive(Config, Debug, PartialEq)]
pub struct ActorCriticCfg {
    pub class_name: String,
    pub init_noise_std: f64,
    pub noise_std_type: NoiseStdType,
    pub actor_obs_normalization: bool,
    pub critic_obs_normalization: bool,
    pub actor_hidden_dims: Vec<usize>,
    pub critic_hidden_dims: Vec<usize>,
    pub activation: Activation,
}
