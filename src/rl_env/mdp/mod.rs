use std::collections::BTreeMap;

use burn::prelude::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::env::RlEnv;
use super::scene::SceneEntityCfg;
use crate::error::{Result, TaskError};
use crate::tasks::g1::squat_rewards;

pub mod rewards;

/// Reward functions a term can refer to. Serialized by their snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardFunc {
    IsTerminated,
    TrackLinVelXyExp,
    TrackLinVelXyYawFrameExp,
    TrackAngVelZExp,
    TrackAngVelZWorldExp,
    LinVelZL2,
    AngVelXyL2,
    FlatOrientationL2,
    JointTorquesL2,
    JointAccL2,
    ActionRateL2,
    JointPosLimits,
    JointDeviationL1,
    FeetAirTime,
    FeetAirTimePositiveBiped,
    FeetSlide,
    UndesiredContacts,
    DynamicSquat,
    DoubleSupport,
}

impl RewardFunc {
    pub fn evaluate<B: Backend>(&self, env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
        match self {
            RewardFunc::IsTerminated => rewards::is_terminated(env),
            RewardFunc::TrackLinVelXyExp => rewards::track_lin_vel_xy_exp(env, params),
            RewardFunc::TrackLinVelXyYawFrameExp => {
                rewards::track_lin_vel_xy_yaw_frame_exp(env, params)
            }
            RewardFunc::TrackAngVelZExp => rewards::track_ang_vel_z_exp(env, params),
            RewardFunc::TrackAngVelZWorldExp => rewards::track_ang_vel_z_world_exp(env, params),
            RewardFunc::LinVelZL2 => rewards::lin_vel_z_l2(env, params),
            RewardFunc::AngVelXyL2 => rewards::ang_vel_xy_l2(env, params),
            RewardFunc::FlatOrientationL2 => rewards::flat_orientation_l2(env, params),
            RewardFunc::JointTorquesL2 => rewards::joint_torques_l2(env, params),
            RewardFunc::JointAccL2 => rewards::joint_acc_l2(env, params),
            RewardFunc::ActionRateL2 => rewards::action_rate_l2(env),
            RewardFunc::JointPosLimits => rewards::joint_pos_limits(env, params),
            RewardFunc::JointDeviationL1 => rewards::joint_deviation_l1(env, params),
            RewardFunc::FeetAirTime => rewards::feet_air_time(env, params),
            RewardFunc::FeetAirTimePositiveBiped => {
                rewards::feet_air_time_positive_biped(env, params)
            }
            RewardFunc::FeetSlide => rewards::feet_slide(env, params),
            RewardFunc::UndesiredContacts => rewards::undesired_contacts(env, params),
            RewardFunc::DynamicSquat => squat_rewards::reward_dynamic_squat(env),
            RewardFunc::DoubleSupport => squat_rewards::reward_double_support(env, params),
        }
    }
}

/// Value of a reward term parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermParam {
    Float(f64),
    Str(String),
    Entity(SceneEntityCfg),
}

impl From<f64> for TermParam {
    fn from(value: f64) -> Self {
        TermParam::Float(value)
    }
}

impl From<&str> for TermParam {
    fn from(value: &str) -> Self {
        TermParam::Str(value.to_string())
    }
}

impl From<SceneEntityCfg> for TermParam {
    fn from(value: SceneEntityCfg) -> Self {
        TermParam::Entity(value)
    }
}

/// Keyword parameters handed to a reward function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermParams(BTreeMap<String, TermParam>);

impl TermParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<TermParam>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<TermParam>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&TermParam> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        match self.get(name) {
            Some(TermParam::Float(v)) => Ok(*v),
            _ => Err(bad_param(name, "number")),
        }
    }

    pub fn string(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(TermParam::Str(v)) => Ok(v.as_str()),
            _ => Err(bad_param(name, "string")),
        }
    }

    pub fn entity(&self, name: &str) -> Result<&SceneEntityCfg> {
        match self.get(name) {
            Some(TermParam::Entity(v)) => Ok(v),
            _ => Err(bad_param(name, "scene entity")),
        }
    }

    /// Falls back to the whole entity `default` when the parameter is absent.
    pub fn entity_or(&self, name: &str, default: &str) -> Result<SceneEntityCfg> {
        match self.get(name) {
            None => Ok(SceneEntityCfg::new(default)),
            Some(TermParam::Entity(v)) => Ok(v.clone()),
            Some(_) => Err(bad_param(name, "scene entity")),
        }
    }
}

fn bad_param(name: &str, expected: &'static str) -> TaskError {
    TaskError::BadParam {
        name: name.to_string(),
        expected,
    }
}

/// A weighted reward term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTermCfg {
    pub func: RewardFunc,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "TermParams::is_empty")]
    pub params: TermParams,
}

impl RewardTermCfg {
    pub fn new(func: RewardFunc, weight: f64) -> Self {
        Self {
            func,
            weight,
            params: TermParams::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<TermParam>) -> Self {
        self.params = self.params.with(name, value);
        self
    }
}
