use super::flat_env::use_plane_terrain;
use super::rough_env::g1_rough_env_cfg;
use crate::rl_env::config::EnvConfig;
use crate::rl_env::mdp::{RewardFunc, RewardTermCfg};

/// Squat in place on flat ground: every velocity command is zero and the
/// root height follows the squat trajectory.
pub fn squat_overrides(cfg: &mut EnvConfig) {
    use_plane_terrain(cfg);

    let ranges = &mut cfg.commands.base_velocity.ranges;
    ranges.lin_vel_x = (0.0, 0.0);
    ranges.lin_vel_y = (0.0, 0.0);
    ranges.ang_vel_z = (0.0, 0.0);
    ranges.heading = Some((0.0, 0.0));

    let rewards = &mut cfg.rewards;
    rewards.insert("dynamic_squat", RewardTermCfg::new(RewardFunc::DynamicSquat, 5.0));
    rewards.insert("double_support", RewardTermCfg::new(RewardFunc::DoubleSupport, 2.0));

    rewards.set_weight("track_lin_vel_xy_exp", 1.5);
    rewards.set_weight("track_ang_vel_z_exp", 1.0);

    rewards.set_weight("feet_slide", -1.0);
    if let Some(term) = rewards.get_mut("feet_air_time") {
        term.weight = -1.0;
        term.params.insert("threshold", 0.1);
    }

    rewards.set_weight("action_rate_l2", -0.005);
    rewards.set_weight("dof_acc_l2", -2.5e-7);
}

pub fn g1_squat_env_cfg() -> EnvConfig {
    let mut cfg = g1_rough_env_cfg();
    squat_overrides(&mut cfg);
    cfg
}

pub fn g1_squat_env_cfg_play() -> EnvConfig {
    let mut cfg = g1_squat_env_cfg();
    super::play_overrides(&mut cfg);
    cfg
}
