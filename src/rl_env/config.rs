use std::collections::BTreeMap;
use std::f64::consts::PI;

use burn::config::Config;
use serde::{Deserialize, Serialize};

use super::mdp::{RewardFunc, RewardTermCfg};
use super::scene::SceneEntityCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    Plane,
    Generator,
}

/// Procedural terrain grid; sub-terrain proportions are keyed by terrain name.
#[derive(Config, Debug, PartialEq)]
pub struct TerrainGeneratorCfg {
    pub size: (f64, f64),
    pub border_width: f64,
    pub num_rows: usize,
    pub num_cols: usize,
    pub horizontal_scale: f64,
    pub vertical_scale: f64,
    pub slope_threshold: f64,
    pub curriculum: bool,
    pub sub_terrains: BTreeMap<String, f64>,
}

impl TerrainGeneratorCfg {
    pub fn rough() -> Self {
        let sub_terrains = [
            ("pyramid_stairs", 0.2),
            ("pyramid_stairs_inv", 0.2),
            ("boxes", 0.2),
            ("random_rough", 0.2),
            ("hf_pyramid_slope", 0.1),
            ("hf_pyramid_slope_inv", 0.1),
        ]
        .into_iter()
        .map(|(name, proportion)| (name.to_string(), proportion))
        .collect();
        Self {
            size: (8.0, 8.0),
            border_width: 20.0,
            num_rows: 10,
            num_cols: 20,
            horizontal_scale: 0.1,
            vertical_scale: 0.005,
            slope_threshold: 0.75,
            curriculum: true,
            sub_terrains,
        }
    }
}

#[derive(Config, Debug, PartialEq)]
pub struct TerrainCfg {
    pub terrain_type: TerrainType,
    pub terrain_generator: Option<TerrainGeneratorCfg>,
    pub max_init_terrain_level: Option<usize>,
}

#[derive(Config, Debug, PartialEq)]
pub struct HeightScannerCfg {
    pub prim_path: String,
    pub offset_z: f64,
    pub resolution: f64,
    pub size: (f64, f64),
}

#[derive(Config, Debug, PartialEq)]
pub struct ContactSensorCfg {
    pub prim_path: String,
    pub history_length: usize,
    pub track_air_time: bool,
}

#[derive(Config, Debug, PartialEq)]
pub struct SceneCfg {
    pub num_envs: usize,
    pub env_spacing: f64,
    pub robot_prim_path: String,
    pub terrain: TerrainCfg,
    pub height_scanner: Option<HeightScannerCfg>,
    pub contact_forces: ContactSensorCfg,
}

#[derive(Config, Debug, PartialEq)]
pub struct SimCfg {
    pub dt: f64,
    pub render_interval: usize,
}

/// Sampling bounds of a velocity command, each `(low, high)`.
#[derive(Config, Debug, PartialEq)]
pub struct VelocityRanges {
    pub lin_vel_x: (f64, f64),
    pub lin_vel_y: (f64, f64),
    pub ang_vel_z: (f64, f64),
    pub heading: Option<(f64, f64)>,
}

#[derive(Config, Debug, PartialEq)]
pub struct UniformVelocityCommandCfg {
    pub asset_name: String,
    pub resampling_time_range: (f64, f64),
    /// Fraction of envs commanded to stand still.
    pub rel_standing_envs: f64,
    /// Fraction of envs whose yaw rate is derived from a heading target.
    pub rel_heading_envs: f64,
    pub heading_command: bool,
    pub heading_control_stiffness: f64,
    pub ranges: VelocityRanges,
}

#[derive(Config, Debug, PartialEq)]
pub struct CommandsCfg {
    pub base_velocity: UniformVelocityCommandCfg,
}

/// Uniform noise `(low, high)` and clip bounds of an observation term.
#[derive(Config, Debug, PartialEq)]
pub struct ObsTermCfg {
    pub noise: Option<(f64, f64)>,
    pub clip: Option<(f64, f64)>,
}

impl ObsTermCfg {
    fn noisy(low: f64, high: f64) -> Self {
        Self {
            noise: Some((low, high)),
            clip: None,
        }
    }

    fn exact() -> Self {
        Self {
            noise: None,
            clip: None,
        }
    }
}

#[derive(Config, Debug, PartialEq)]
pub struct ObsGroupCfg {
    pub enable_corruption: bool,
    pub concatenate_terms: bool,
    pub terms: BTreeMap<String, ObsTermCfg>,
}

#[derive(Config, Debug, PartialEq)]
pub struct ObservationsCfg {
    pub policy: ObsGroupCfg,
}

#[derive(Config, Debug, PartialEq)]
pub struct RewardsCfg {
    pub terms: BTreeMap<String, RewardTermCfg>,
}

impl RewardsCfg {
    pub fn get(&self, name: &str) -> Option<&RewardTermCfg> {
        self.terms.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RewardTermCfg> {
        self.terms.get_mut(name)
    }

    /// Adds a term, replacing any term with the same name.
    pub fn insert(&mut self, name: &str, term: RewardTermCfg) {
        self.terms.insert(name.to_string(), term);
    }

    pub fn remove(&mut self, name: &str) -> Option<RewardTermCfg> {
        self.terms.remove(name)
    }

    pub fn set_weight(&mut self, name: &str, weight: f64) {
        match self.terms.get_mut(name) {
            Some(term) => term.weight = weight,
            None => log::warn!("reward term `{}` is not configured, weight ignored", name),
        }
    }
}

#[derive(Config, Debug, PartialEq)]
pub struct BaseContactCfg {
    pub sensor_cfg: SceneEntityCfg,
    pub threshold: f64,
}

#[derive(Config, Debug, PartialEq)]
pub struct TerminationsCfg {
    pub time_out: bool,
    pub base_contact: Option<BaseContactCfg>,
}

#[derive(Config, Debug, PartialEq)]
pub struct CurriculumTermCfg {
    pub func: String,
}

#[derive(Config, Debug, PartialEq)]
pub struct CurriculumCfg {
    pub terrain_levels: Option<CurriculumTermCfg>,
}

/// A manager-based RL environment. `Default` is the generic rough-terrain
/// velocity-tracking task; robot-specific tasks start from it.
#[derive(Config, Debug, PartialEq)]
pub struct EnvConfig {
    pub scene: SceneCfg,
    pub sim: SimCfg,
    pub decimation: usize,
    pub episode_length_s: f64,
    pub commands: CommandsCfg,
    pub observations: ObservationsCfg,
    pub rewards: RewardsCfg,
    pub terminations: TerminationsCfg,
    pub curriculum: CurriculumCfg,
}

impl EnvConfig {
    /// Seconds between two policy steps.
    pub fn step_dt(&self) -> f64 {
        self.sim.dt * self.decimation as f64
    }

    /// Episode length in policy steps.
    pub fn max_episode_length(&self) -> usize {
        (self.episode_length_s / self.step_dt()).ceil() as usize
    }
}

fn velocity_rewards() -> RewardsCfg {
    let feet = SceneEntityCfg::new("contact_forces").with_body_names(&[".*FOOT"]);
    let thighs = SceneEntityCfg::new("contact_forces").with_body_names(&[".*THIGH"]);
    let terms = [
        (
            "track_lin_vel_xy_exp",
            RewardTermCfg::new(RewardFunc::TrackLinVelXyExp, 1.0)
                .with_param("command_name", "base_velocity")
                .with_param("std", 0.5),
        ),
        (
            "track_ang_vel_z_exp",
            RewardTermCfg::new(RewardFunc::TrackAngVelZExp, 0.5)
                .with_param("command_name", "base_velocity")
                .with_param("std", 0.5),
        ),
        ("lin_vel_z_l2", RewardTermCfg::new(RewardFunc::LinVelZL2, -2.0)),
        ("ang_vel_xy_l2", RewardTermCfg::new(RewardFunc::AngVelXyL2, -0.05)),
        ("dof_torques_l2", RewardTermCfg::new(RewardFunc::JointTorquesL2, -1.0e-5)),
        ("dof_acc_l2", RewardTermCfg::new(RewardFunc::JointAccL2, -2.5e-7)),
        ("action_rate_l2", RewardTermCfg::new(RewardFunc::ActionRateL2, -0.01)),
        (
            "feet_air_time",
            RewardTermCfg::new(RewardFunc::FeetAirTime, 0.125)
                .with_param("sensor_cfg", feet)
                .with_param("command_name", "base_velocity")
                .with_param("threshold", 0.5),
        ),
        (
            "undesired_contacts",
            RewardTermCfg::new(RewardFunc::UndesiredContacts, -1.0)
                .with_param("sensor_cfg", thighs)
                .with_param("threshold", 1.0),
        ),
        ("flat_orientation_l2", RewardTermCfg::new(RewardFunc::FlatOrientationL2, 0.0)),
        ("dof_pos_limits", RewardTermCfg::new(RewardFunc::JointPosLimits, 0.0)),
    ];
    RewardsCfg {
        terms: terms
            .into_iter()
            .map(|(name, term)| (name.to_string(), term))
            .collect(),
    }
}

fn velocity_policy_observations() -> ObsGroupCfg {
    let terms = [
        ("base_lin_vel", ObsTermCfg::noisy(-0.1, 0.1)),
        ("base_ang_vel", ObsTermCfg::noisy(-0.2, 0.2)),
        ("projected_gravity", ObsTermCfg::noisy(-0.05, 0.05)),
        ("velocity_commands", ObsTermCfg::exact()),
        ("joint_pos", ObsTermCfg::noisy(-0.01, 0.01)),
        ("joint_vel", ObsTermCfg::noisy(-1.5, 1.5)),
        ("actions", ObsTermCfg::exact()),
        (
            "height_scan",
            ObsTermCfg {
                noise: Some((-0.1, 0.1)),
                clip: Some((-1.0, 1.0)),
            },
        ),
    ];
    ObsGroupCfg {
        enable_corruption: true,
        concatenate_terms: true,
        terms: terms
            .into_iter()
            .map(|(name, term)| (name.to_string(), term))
            .collect(),
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        let decimation = 4;
        Self {
            scene: SceneCfg {
                num_envs: 4096,
                env_spacing: 2.5,
                robot_prim_path: "{ENV_REGEX_NS}/Robot".to_string(),
                terrain: TerrainCfg {
                    terrain_type: TerrainType::Generator,
                    terrain_generator: Some(TerrainGeneratorCfg::rough()),
                    max_init_terrain_level: Some(5),
                },
                height_scanner: Some(HeightScannerCfg {
                    prim_path: "{ENV_REGEX_NS}/Robot/base".to_string(),
                    offset_z: 20.0,
                    resolution: 0.1,
                    size: (1.6, 1.0),
                }),
                contact_forces: ContactSensorCfg {
                    prim_path: "{ENV_REGEX_NS}/Robot/.*".to_string(),
                    history_length: 3,
                    track_air_time: true,
                },
            },
            sim: SimCfg {
                dt: 0.005,
                render_interval: decimation,
            },
            decimation,
            episode_length_s: 20.0,
            commands: CommandsCfg {
                base_velocity: UniformVelocityCommandCfg {
                    asset_name: "robot".to_string(),
                    resampling_time_range: (10.0, 10.0),
                    rel_standing_envs: 0.02,
                    rel_heading_envs: 1.0,
                    heading_command: true,
                    heading_control_stiffness: 0.5,
                    ranges: VelocityRanges {
                        lin_vel_x: (-1.0, 1.0),
                        lin_vel_y: (-1.0, 1.0),
                        ang_vel_z: (-1.0, 1.0),
                        heading: Some((-PI, PI)),
                    },
                },
            },
            observations: ObservationsCfg {
                policy: velocity_policy_observations(),
            },
            rewards: velocity_rewards(),
            terminations: TerminationsCfg {
                time_out: true,
                base_contact: Some(BaseContactCfg {
                    sensor_cfg: SceneEntityCfg::new("contact_forces").with_body_names(&["base"]),
                    threshold: 1.0,
                }),
            },
            curriculum: CurriculumCfg {
                terrain_levels: Some(CurriculumTermCfg {
                    func: "terrain_levels_vel".to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_timing() {
        let cfg = EnvConfig::default();
        assert!((cfg.step_dt() - 0.02).abs() < 1e-12);
        assert_eq!(cfg.max_episode_length(), 1000);
    }

    #[test]
    fn test_set_weight_ignores_unknown_terms() {
        let mut rewards = EnvConfig::default().rewards;
        let before = rewards.clone();
        rewards.set_weight("does_not_exist", 3.0);
        assert_eq!(rewards, before);
        rewards.set_weight("lin_vel_z_l2", 0.0);
        assert_eq!(rewards.get("lin_vel_z_l2").unwrap().weight, 0.0);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.json");
        let cfg = EnvConfig::default();
        cfg.save(&path).unwrap();
        let loaded = EnvConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }
}
