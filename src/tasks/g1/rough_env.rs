use crate::rl_env::config::EnvConfig;
use crate::rl_env::mdp::{RewardFunc, RewardTermCfg};
use crate::rl_env::scene::SceneEntityCfg;

const FEET: &str = ".*_ankle_roll_link";

fn robot_joints(patterns: &[&str]) -> SceneEntityCfg {
    SceneEntityCfg::new("robot").with_joint_names(patterns)
}

fn joint_deviation(weight: f64, patterns: &[&str]) -> RewardTermCfg {
    RewardTermCfg::new(RewardFunc::JointDeviationL1, weight).with_param("asset_cfg", robot_joints(patterns))
}

/// Replaces the generic velocity terms with the G1 biped set.
fn g1_rewards(cfg: &mut EnvConfig) {
    let rewards = &mut cfg.rewards;
    rewards.insert(
        "termination_penalty",
        RewardTermCfg::new(RewardFunc::IsTerminated, -200.0),
    );
    rewards.insert(
        "track_lin_vel_xy_exp",
        RewardTermCfg::new(RewardFunc::TrackLinVelXyYawFrameExp, 1.0)
            .with_param("command_name", "base_velocity")
            .with_param("std", 0.5),
    );
    rewards.insert(
        "track_ang_vel_z_exp",
        RewardTermCfg::new(RewardFunc::TrackAngVelZWorldExp, 2.0)
            .with_param("command_name", "base_velocity")
            .with_param("std", 0.5),
    );
    rewards.insert(
        "feet_air_time",
        RewardTermCfg::new(RewardFunc::FeetAirTimePositiveBiped, 0.25)
            .with_param("command_name", "base_velocity")
            .with_param(
                "sensor_cfg",
                SceneEntityCfg::new("contact_forces").with_body_names(&[FEET]),
            )
            .with_param("threshold", 0.4),
    );
    rewards.insert(
        "feet_slide",
        RewardTermCfg::new(RewardFunc::FeetSlide, -0.1)
            .with_param(
                "sensor_cfg",
                SceneEntityCfg::new("contact_forces").with_body_names(&[FEET]),
            )
            .with_param("asset_cfg", SceneEntityCfg::new("robot").with_body_names(&[FEET])),
    );
    rewards.insert(
        "dof_pos_limits",
        RewardTermCfg::new(RewardFunc::JointPosLimits, -1.0).with_param(
            "asset_cfg",
            robot_joints(&[".*_ankle_pitch_joint", ".*_ankle_roll_joint"]),
        ),
    );
    rewards.insert(
        "joint_deviation_hip",
        joint_deviation(-0.1, &[".*_hip_yaw_joint", ".*_hip_roll_joint"]),
    );
    rewards.insert(
        "joint_deviation_arms",
        joint_deviation(
            -0.1,
            &[
                ".*_shoulder_pitch_joint",
                ".*_shoulder_roll_joint",
                ".*_shoulder_yaw_joint",
                ".*_elbow_pitch_joint",
                ".*_elbow_roll_joint",
            ],
        ),
    );
    rewards.insert(
        "joint_deviation_fingers",
        joint_deviation(
            -0.05,
            &[
                ".*_five_joint",
                ".*_three_joint",
                ".*_six_joint",
                ".*_four_joint",
                ".*_zero_joint",
                ".*_one_joint",
                ".*_two_joint",
            ],
        ),
    );
    rewards.insert("joint_deviation_torso", joint_deviation(-0.1, &["torso_joint"]));
}

pub fn rough_overrides(cfg: &mut EnvConfig) {
    g1_rewards(cfg);
    if let Some(scanner) = cfg.scene.height_scanner.as_mut() {
        scanner.prim_path = "{ENV_REGEX_NS}/Robot/torso_link".to_string();
    }

    let rewards = &mut cfg.rewards;
    rewards.set_weight("lin_vel_z_l2", 0.0);
    rewards.remove("undesired_contacts");
    rewards.set_weight("flat_orientation_l2", -1.0);
    rewards.set_weight("action_rate_l2", -0.005);
    if let Some(term) = rewards.get_mut("dof_acc_l2") {
        term.weight = -1.25e-7;
        term.params
            .insert("asset_cfg", robot_joints(&[".*_hip_.*", ".*_knee_joint"]));
    }
    if let Some(term) = rewards.get_mut("dof_torques_l2") {
        term.weight = -1.5e-7;
        term.params.insert(
            "asset_cfg",
            robot_joints(&[".*_hip_.*", ".*_knee_joint", ".*_ankle_.*"]),
        );
    }

    let ranges = &mut cfg.commands.base_velocity.ranges;
    ranges.lin_vel_x = (0.0, 1.0);
    ranges.lin_vel_y = (0.0, 0.0);
    ranges.ang_vel_z = (-1.0, 1.0);

    if let Some(base_contact) = cfg.terminations.base_contact.as_mut() {
        base_contact.sensor_cfg = SceneEntityCfg::new("contact_forces").with_body_names(&["torso_link"]);
    }
}

pub fn g1_rough_env_cfg() -> EnvConfig {
    let mut cfg = EnvConfig::default();
    rough_overrides(&mut cfg);
    cfg
}

/// Small evaluation scene: a 5x5 terrain grid, longer episodes and a fixed
/// forward command.
pub fn rough_play_overrides(cfg: &mut EnvConfig) {
    super::play_overrides(cfg);
    cfg.episode_length_s = 40.0;
    cfg.scene.terrain.max_init_terrain_level = None;
    if let Some(generator) = cfg.scene.terrain.terrain_generator.as_mut() {
        generator.num_rows = 5;
        generator.num_cols = 5;
        generator.curriculum = false;
    }
    let ranges = &mut cfg.commands.base_velocity.ranges;
    ranges.lin_vel_x = (1.0, 1.0);
    ranges.lin_vel_y = (0.0, 0.0);
    ranges.ang_vel_z = (-1.0, 1.0);
    ranges.heading = Some((0.0, 0.0));
}

pub fn g1_rough_env_cfg_play() -> EnvConfig {
    let mut cfg = g1_rough_env_cfg();
    rough_play_overrides(&mut cfg);
    cfg
}
