use std::collections::BTreeMap;

use burn::prelude::Backend;
use burn::tensor::Tensor;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskError};

/// Reference to a scene entity, optionally narrowed to a subset of its joints
/// or bodies by name pattern. Patterns must match the whole name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntityCfg {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joint_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_names: Vec<String>,
}

impl SceneEntityCfg {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            joint_names: Vec::new(),
            body_names: Vec::new(),
        }
    }

    pub fn with_joint_names(mut self, patterns: &[&str]) -> Self {
        self.joint_names = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_body_names(mut self, patterns: &[&str]) -> Self {
        self.body_names = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    /// `None` selects every joint.
    pub fn resolve_joint_ids(&self, available: &[String]) -> Result<Option<Vec<usize>>> {
        resolve_names(&self.joint_names, available, &self.name)
    }

    /// `None` selects every body.
    pub fn resolve_body_ids(&self, available: &[String]) -> Result<Option<Vec<usize>>> {
        resolve_names(&self.body_names, available, &self.name)
    }
}

/// Indices (in `available` order) of names matching any pattern. Every pattern
/// has to match at least one name.
pub fn resolve_names(
    patterns: &[String],
    available: &[String],
    entity: &str,
) -> Result<Option<Vec<usize>>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let regexes = patterns
        .iter()
        .map(|p| Regex::new(&format!("^(?:{})$", p)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (pattern, re) in patterns.iter().zip(&regexes) {
        if !available.iter().any(|name| re.is_match(name)) {
            return Err(TaskError::NoMatch {
                pattern: pattern.clone(),
                entity: entity.to_string(),
            });
        }
    }
    let ids = available
        .iter()
        .enumerate()
        .filter(|(_, name)| regexes.iter().any(|re| re.is_match(name)))
        .map(|(i, _)| i)
        .collect();
    Ok(Some(ids))
}

/// Per-env state of an articulated robot. Quaternions are (w, x, y, z).
#[derive(Debug, Clone)]
pub struct ArticulationData<B: Backend> {
    /// [N, 3]
    pub root_pos_w: Tensor<B, 2>,
    /// [N, 4]
    pub root_quat_w: Tensor<B, 2>,
    pub root_lin_vel_w: Tensor<B, 2>,
    pub root_ang_vel_w: Tensor<B, 2>,
    pub root_lin_vel_b: Tensor<B, 2>,
    pub root_ang_vel_b: Tensor<B, 2>,
    pub projected_gravity_b: Tensor<B, 2>,
    /// [N, J]
    pub joint_pos: Tensor<B, 2>,
    pub default_joint_pos: Tensor<B, 2>,
    pub joint_acc: Tensor<B, 2>,
    pub applied_torque: Tensor<B, 2>,
    /// [N, J, 2] lower and upper bound
    pub soft_joint_pos_limits: Tensor<B, 3>,
    /// [N, bodies, 3]
    pub body_lin_vel_w: Tensor<B, 3>,
}

impl<B: Backend> ArticulationData<B> {
    /// Robot standing still at the origin with identity orientation.
    pub fn zeros(num_envs: usize, num_joints: usize, num_bodies: usize, device: &B::Device) -> Self {
        let vec3 = || Tensor::<B, 2>::zeros([num_envs, 3], device);
        let joints = || Tensor::<B, 2>::zeros([num_envs, num_joints], device);
        let root_quat_w = Tensor::<B, 2>::zeros([num_envs, 4], device).slice_assign(
            [0..num_envs, 0..1],
            Tensor::ones([num_envs, 1], device),
        );
        let projected_gravity_b = vec3().slice_assign(
            [0..num_envs, 2..3],
            Tensor::ones([num_envs, 1], device).neg(),
        );
        let lower = Tensor::<B, 3>::full([num_envs, num_joints, 1], -1.0, device);
        let upper = Tensor::<B, 3>::full([num_envs, num_joints, 1], 1.0, device);
        Self {
            root_pos_w: vec3(),
            root_quat_w,
            root_lin_vel_w: vec3(),
            root_ang_vel_w: vec3(),
            root_lin_vel_b: vec3(),
            root_ang_vel_b: vec3(),
            projected_gravity_b,
            joint_pos: joints(),
            default_joint_pos: joints(),
            joint_acc: joints(),
            applied_torque: joints(),
            soft_joint_pos_limits: Tensor::cat(vec![lower, upper], 2),
            body_lin_vel_w: Tensor::zeros([num_envs, num_bodies, 3], device),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Articulation<B: Backend> {
    pub joint_names: Vec<String>,
    pub body_names: Vec<String>,
    pub data: ArticulationData<B>,
}

#[derive(Debug, Clone)]
pub struct ContactSensorData<B: Backend> {
    /// [N, history, bodies, 3]; history index 0 is the most recent sample.
    pub net_forces_w_history: Tensor<B, 4>,
    /// [N, bodies]
    pub current_air_time: Tensor<B, 2>,
    pub current_contact_time: Tensor<B, 2>,
    /// Duration of the air phase that ended at the last touchdown.
    pub last_air_time: Tensor<B, 2>,
}

impl<B: Backend> ContactSensorData<B> {
    pub fn zeros(num_envs: usize, history: usize, num_bodies: usize, device: &B::Device) -> Self {
        Self {
            net_forces_w_history: Tensor::zeros([num_envs, history, num_bodies, 3], device),
            current_air_time: Tensor::zeros([num_envs, num_bodies], device),
            current_contact_time: Tensor::zeros([num_envs, num_bodies], device),
            last_air_time: Tensor::zeros([num_envs, num_bodies], device),
        }
    }

    /// 1.0 for bodies that touched down within the last `dt` seconds.
    pub fn compute_first_contact(&self, dt: f32) -> Tensor<B, 2> {
        let contact_time = self.current_contact_time.clone();
        let touching = contact_time.clone().greater_elem(0.0).float();
        let recent = contact_time.lower_elem(dt + 1.0e-8).float();
        touching * recent
    }
}

#[derive(Debug, Clone)]
pub struct ContactSensor<B: Backend> {
    pub body_names: Vec<String>,
    pub data: ContactSensorData<B>,
}

#[derive(Debug, Clone)]
pub struct InteractiveScene<B: Backend> {
    articulations: BTreeMap<String, Articulation<B>>,
    contact_sensors: BTreeMap<String, ContactSensor<B>>,
}

impl<B: Backend> Default for InteractiveScene<B> {
    fn default() -> Self {
        Self {
            articulations: BTreeMap::new(),
            contact_sensors: BTreeMap::new(),
        }
    }
}

impl<B: Backend> InteractiveScene<B> {
    pub fn insert_articulation(&mut self, name: &str, articulation: Articulation<B>) {
        self.articulations.insert(name.to_string(), articulation);
    }

    pub fn insert_contact_sensor(&mut self, name: &str, sensor: ContactSensor<B>) {
        self.contact_sensors.insert(name.to_string(), sensor);
    }

    pub fn articulation(&self, name: &str) -> Result<&Articulation<B>> {
        self.articulations
            .get(name)
            .ok_or_else(|| TaskError::MissingEntity {
                kind: "articulation",
                name: name.to_string(),
            })
    }

    pub fn contact_sensor(&self, name: &str) -> Result<&ContactSensor<B>> {
        self.contact_sensors
            .get(name)
            .ok_or_else(|| TaskError::MissingEntity {
                kind: "contact sensor",
                name: name.to_string(),
            })
    }

    pub fn articulation_mut(&mut self, name: &str) -> Result<&mut Articulation<B>> {
        self.articulations
            .get_mut(name)
            .ok_or_else(|| TaskError::MissingEntity {
                kind: "articulation",
                name: name.to_string(),
            })
    }

    pub fn contact_sensor_mut(&mut self, name: &str) -> Result<&mut ContactSensor<B>> {
        self.contact_sensors
            .get_mut(name)
            .ok_or_else(|| TaskError::MissingEntity {
                kind: "contact sensor",
                name: name.to_string(),
            })
    }
}
