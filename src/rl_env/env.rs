use std::collections::BTreeMap;

use burn::prelude::Backend;
use burn::tensor::{Bool, Int, Tensor};

use super::scene::InteractiveScene;
use crate::error::{Result, TaskError};

/// State a simulator exposes to reward terms. One row per parallel env.
pub trait RlEnv<B: Backend> {
    fn num_envs(&self) -> usize;

    fn device(&self) -> B::Device;

    /// Steps elapsed in the current episode, per env.
    fn episode_length_buf(&self) -> Tensor<B, 1, Int>;

    /// Seconds per environment step (physics dt times decimation).
    fn step_dt(&self) -> f32;

    fn scene(&self) -> &InteractiveScene<B>;

    /// Current value of a named command, [N, dims].
    fn command(&self, name: &str) -> Result<Tensor<B, 2>>;

    fn action(&self) -> Tensor<B, 2>;

    fn prev_action(&self) -> Tensor<B, 2>;

    /// Envs terminated this step for a reason other than a time-out.
    fn reset_terminated(&self) -> Tensor<B, 1, Bool>;
}

/// Snapshot of a batch of simulated envs, filled in by a simulator bridge.
#[derive(Debug, Clone)]
pub struct EnvState<B: Backend> {
    pub num_envs: usize,
    pub step_dt: f32,
    pub device: B::Device,
    pub episode_length_buf: Tensor<B, 1, Int>,
    pub scene: InteractiveScene<B>,
    pub commands: BTreeMap<String, Tensor<B, 2>>,
    pub action: Tensor<B, 2>,
    pub prev_action: Tensor<B, 2>,
    pub reset_terminated: Tensor<B, 1, Bool>,
}

impl<B: Backend> EnvState<B> {
    pub fn new(num_envs: usize, num_actions: usize, step_dt: f32, device: &B::Device) -> Self {
        Self {
            num_envs,
            step_dt,
            device: device.clone(),
            episode_length_buf: Tensor::zeros([num_envs], device),
            scene: InteractiveScene::default(),
            commands: BTreeMap::new(),
            action: Tensor::zeros([num_envs, num_actions], device),
            prev_action: Tensor::zeros([num_envs, num_actions], device),
            reset_terminated: Tensor::<B, 1, Int>::zeros([num_envs], device).equal_elem(1),
        }
    }

    pub fn set_command(&mut self, name: &str, command: Tensor<B, 2>) {
        self.commands.insert(name.to_string(), command);
    }

    /// Records a new action, shifting the current one into `prev_action`.
    pub fn push_action(&mut self, action: Tensor<B, 2>) {
        self.prev_action = std::mem::replace(&mut self.action, action);
    }

    /// Advances every episode counter by one step.
    pub fn advance(&mut self) {
        self.episode_length_buf = self.episode_length_buf.clone().add_scalar(1);
    }

    /// Elapsed episode time in seconds, per env.
    pub fn episode_time(&self) -> Tensor<B, 1> {
        self.episode_length_buf.clone().float().mul_scalar(self.step_dt)
    }
}

impl<B: Backend> RlEnv<B> for EnvState<B> {
    fn num_envs(&self) -> usize {
        self.num_envs
    }

    fn device(&self) -> B::Device {
        self.device.clone()
    }

    fn episode_length_buf(&self) -> Tensor<B, 1, Int> {
        self.episode_length_buf.clone()
    }

    fn step_dt(&self) -> f32 {
        self.step_dt
    }

    fn scene(&self) -> &InteractiveScene<B> {
        &self.scene
    }

    fn command(&self, name: &str) -> Result<Tensor<B, 2>> {
        self.commands
            .get(name)
            .cloned()
            .ok_or_else(|| TaskError::MissingCommand(name.to_string()))
    }

    fn action(&self) -> Tensor<B, 2> {
        self.action.clone()
    }

    fn prev_action(&self) -> Tensor<B, 2> {
        self.prev_action.clone()
    }

    fn reset_terminated(&self) -> Tensor<B, 1, Bool> {
        self.reset_terminated.clone()
    }
}
