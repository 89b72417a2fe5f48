use super::rough_env::g1_rough_env_cfg;
use crate::rl_env::config::{EnvConfig, TerrainType};
use crate::rl_env::scene::SceneEntityCfg;

/// Switches to a flat ground plane and drops everything that only makes
/// sense on generated terrain.
pub fn use_plane_terrain(cfg: &mut EnvConfig) {
    cfg.scene.terrain.terrain_type = TerrainType::Plane;
    cfg.scene.terrain.terrain_generator = None;
    cfg.scene.height_scanner = None;
    cfg.observations.policy.terms.remove("height_scan");
    cfg.curriculum.terrain_levels = None;
}

pub fn flat_overrides(cfg: &mut EnvConfig) {
    use_plane_terrain(cfg);

    let rewards = &mut cfg.rewards;
    rewards.set_weight("track_ang_vel_z_exp", 1.0);
    rewards.set_weight("lin_vel_z_l2", -0.2);
    rewards.set_weight("action_rate_l2", -0.005);
    rewards.set_weight("dof_acc_l2", -1.0e-7);
    if let Some(term) = rewards.get_mut("feet_air_time") {
        term.weight = 0.75;
        term.params.insert("threshold", 0.4);
    }
    if let Some(term) = rewards.get_mut("dof_torques_l2") {
        term.weight = -2.0e-6;
        term.params.insert(
            "asset_cfg",
            SceneEntityCfg::new("robot").with_joint_names(&[".*_hip_.*", ".*_knee_joint"]),
        );
    }

    let ranges = &mut cfg.commands.base_velocity.ranges;
    ranges.lin_vel_x = (0.0, 1.0);
    ranges.lin_vel_y = (-0.5, 0.5);
    ranges.ang_vel_z = (-1.0, 1.0);
}

pub fn g1_flat_env_cfg() -> EnvConfig {
    let mut cfg = g1_rough_env_cfg();
    flat_overrides(&mut cfg);
    cfg
}

pub fn g1_flat_env_cfg_play() -> EnvConfig {
    let mut cfg = g1_flat_env_cfg();
    super::play_overrides(&mut cfg);
    cfg
}
