use std::f32::consts::PI;
use std::marker::PhantomData;

use burn::prelude::Backend;
use burn::tensor::Tensor;
use ndarray::{Array1, Array2};
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use super::config::UniformVelocityCommandCfg;
use crate::burn_utils::ndarray2tensor;

/// Wraps an angle into [-pi, pi).
pub fn wrap_to_pi(angle: f32) -> f32 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Body-frame velocity command (vx, vy, wz) resampled uniformly within the
/// configured ranges. Heading envs derive wz from a heading target instead.
pub struct UniformVelocityCommand<B: Backend> {
    cfg: UniformVelocityCommandCfg,
    vel_command_b: Array2<f32>,
    heading_target: Array1<f32>,
    is_heading_env: Array1<bool>,
    is_standing_env: Array1<bool>,
    time_left: Array1<f32>,
    rng: StdRng,
    backend: PhantomData<B>,
}

impl<B: Backend> UniformVelocityCommand<B> {
    pub fn new(cfg: UniformVelocityCommandCfg, num_envs: usize, seed: u64) -> Self {
        let mut command = Self {
            cfg,
            vel_command_b: Array2::zeros((num_envs, 3)),
            heading_target: Array1::zeros(num_envs),
            is_heading_env: Array1::from_elem(num_envs, false),
            is_standing_env: Array1::from_elem(num_envs, false),
            time_left: Array1::zeros(num_envs),
            rng: StdRng::seed_from_u64(seed),
            backend: PhantomData,
        };
        let all = (0..num_envs).collect::<Vec<_>>();
        command.resample(&all);
        command
    }

    pub fn num_envs(&self) -> usize {
        self.vel_command_b.nrows()
    }

    fn uniform(&mut self, (low, high): (f64, f64), n: usize) -> Array1<f32> {
        if high <= low {
            return Array1::from_elem(n, low as f32);
        }
        Array1::random_using(n, Uniform::new_inclusive(low as f32, high as f32), &mut self.rng)
    }

    /// Draws in [0, 1) for the heading and standing coin flips.
    fn unit_draws(&mut self, n: usize) -> Array1<f32> {
        Array1::random_using(n, Uniform::new(0.0f32, 1.0), &mut self.rng)
    }

    /// Draws new commands and resampling deadlines for `env_ids`.
    pub fn resample(&mut self, env_ids: &[usize]) {
        let n = env_ids.len();
        let ranges = self.cfg.ranges.clone();
        let lin_x = self.uniform(ranges.lin_vel_x, n);
        let lin_y = self.uniform(ranges.lin_vel_y, n);
        let ang_z = self.uniform(ranges.ang_vel_z, n);
        let heading = match ranges.heading {
            Some(range) if self.cfg.heading_command => self.uniform(range, n),
            _ => Array1::zeros(n),
        };
        let heading_draw = self.unit_draws(n);
        let standing_draw = self.unit_draws(n);
        let resampling = self.uniform(self.cfg.resampling_time_range, n);

        for (k, &env_id) in env_ids.iter().enumerate() {
            self.vel_command_b[[env_id, 0]] = lin_x[k];
            self.vel_command_b[[env_id, 1]] = lin_y[k];
            self.vel_command_b[[env_id, 2]] = ang_z[k];
            self.heading_target[env_id] = heading[k];
            self.is_heading_env[env_id] =
                self.cfg.heading_command && (heading_draw[k] as f64) <= self.cfg.rel_heading_envs;
            self.is_standing_env[env_id] = (standing_draw[k] as f64) <= self.cfg.rel_standing_envs;
            self.time_left[env_id] = resampling[k];
        }
        log::trace!("resampled velocity commands for {} envs", n);
    }

    /// Recomputes yaw rates of heading envs from the robot heading and zeroes
    /// standing envs. `heading_w` holds one yaw angle per env.
    pub fn update(&mut self, heading_w: &[f32]) {
        let (low, high) = self.cfg.ranges.ang_vel_z;
        let stiffness = self.cfg.heading_control_stiffness as f32;
        for env_id in 0..self.num_envs() {
            if self.is_heading_env[env_id] {
                let error = wrap_to_pi(self.heading_target[env_id] - heading_w[env_id]);
                self.vel_command_b[[env_id, 2]] = (stiffness * error).clamp(low as f32, high as f32);
            }
            if self.is_standing_env[env_id] {
                self.vel_command_b.row_mut(env_id).fill(0.0);
            }
        }
    }

    /// Advances resampling timers by `dt`, resamples expired envs and updates.
    pub fn step(&mut self, dt: f32, heading_w: &[f32]) {
        self.time_left -= dt;
        let expired = self
            .time_left
            .iter()
            .enumerate()
            .filter(|(_, t)| **t <= 0.0)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if !expired.is_empty() {
            self.resample(&expired);
        }
        self.update(heading_w);
    }

    /// Current command, [N, 3].
    pub fn command(&self, device: &B::Device) -> Tensor<B, 2> {
        ndarray2tensor(&self.vel_command_b, device)
    }
}
