//! Unitree G1 humanoid tasks: velocity tracking on rough and flat ground,
//! and squatting in place.

use crate::rl_env::config::EnvConfig;

pub mod agents;
pub mod flat_env;
pub mod robot;
pub mod rough_env;
pub mod squat_env;
pub mod squat_rewards;

/// Evaluation scene shared by every `-Play-` task.
pub fn play_overrides(cfg: &mut EnvConfig) {
    cfg.scene.num_envs = 50;
    cfg.scene.env_spacing = 2.5;
    cfg.observations.policy.enable_corruption = false;
}
