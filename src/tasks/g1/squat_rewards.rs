//! Reward terms of the G1 squat task.

use burn::prelude::Backend;
use burn::tensor::Tensor;

use crate::error::Result;
use crate::rl_env::env::RlEnv;
use crate::rl_env::mdp::TermParams;

/// Standing root height the squat oscillates around, in meters.
pub const SQUAT_MEAN_HEIGHT: f64 = 0.60;
/// Half the squat depth, in meters.
pub const SQUAT_AMPLITUDE: f64 = 0.16;
/// Multiplier on elapsed seconds inside the sine.
pub const SQUAT_FREQUENCY: f64 = 0.1;
/// Height error at which the reward has fallen to 1/e.
pub const SQUAT_TOLERANCE: f64 = 0.05;
/// Vertical force above which a body counts as touching the ground.
pub const CONTACT_FORCE_THRESHOLD: f64 = 1.0;

/// Target root height per env at the given elapsed episode times, in seconds.
pub fn squat_target_height<B: Backend>(time: Tensor<B, 1>) -> Tensor<B, 1> {
    time.mul_scalar(SQUAT_FREQUENCY)
        .sin()
        .mul_scalar(SQUAT_AMPLITUDE)
        .add_scalar(SQUAT_MEAN_HEIGHT)
}

/// `exp(-(h - target)^2 / tol^2)` per env; 1.0 exactly on the trajectory.
pub fn squat_tracking<B: Backend>(root_height: Tensor<B, 1>, time: Tensor<B, 1>) -> Tensor<B, 1> {
    let error = (root_height - squat_target_height(time)).abs();
    error
        .powf_scalar(2.0)
        .div_scalar(-(SQUAT_TOLERANCE * SQUAT_TOLERANCE))
        .exp()
}

/// Rewards the robot's root height for following the sinusoidal squat trajectory.
pub fn reward_dynamic_squat<B: Backend>(env: &dyn RlEnv<B>) -> Result<Tensor<B, 1>> {
    let time = env
        .episode_length_buf()
        .float()
        .mul_scalar(env.step_dt());
    let root_pos = &env.scene().articulation("robot")?.data.root_pos_w;
    let n = root_pos.dims()[0];
    let height = root_pos.clone().slice([0..n, 2..3]).squeeze::<1>(1);
    Ok(squat_tracking(height, time))
}

/// 1.0 when exactly two monitored bodies are loaded in the latest contact sample.
///
/// Every body of the `contact_forces` sensor is monitored unless a `sensor_cfg`
/// parameter narrows the set by body name.
pub fn reward_double_support<B: Backend>(
    env: &dyn RlEnv<B>,
    params: &TermParams,
) -> Result<Tensor<B, 1>> {
    let sensor_cfg = params.entity_or("sensor_cfg", "contact_forces")?;
    let sensor = env.scene().contact_sensor(&sensor_cfg.name)?;
    let ids = sensor_cfg.resolve_body_ids(&sensor.body_names)?;

    let history = &sensor.data.net_forces_w_history;
    let [n, _, b, _] = history.dims();
    let mut vertical = history
        .clone()
        .slice([0..n, 0..1, 0..b, 2..3])
        .reshape([n, b]);
    if let Some(ids) = &ids {
        vertical = vertical.select(1, crate::burn_utils::index_tensor::<B>(ids, &env.device()));
    }
    let num_contacts = vertical
        .greater_elem(CONTACT_FORCE_THRESHOLD)
        .int()
        .sum_dim(1);
    Ok(num_contacts.equal_elem(2).float().squeeze::<1>(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn_utils::{tensor2vec1, vec2tensor1};
    use crate::rl_env::env::EnvState;
    use crate::rl_env::scene::{
        Articulation, ArticulationData, ContactSensor, ContactSensorData, SceneEntityCfg,
    };
    use approx::assert_relative_eq;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    const STEP_DT: f32 = 0.02;

    fn squat_env(heights: &[f32], steps: i64) -> EnvState<TestBackend> {
        let device = Default::default();
        let n = heights.len();
        let mut env = EnvState::new(n, 1, STEP_DT, &device);
        env.episode_length_buf = Tensor::from_data(TensorData::new(vec![steps; n], [n]), &device);
        let mut data = ArticulationData::zeros(n, 1, 1, &device);
        let mut pos = vec![0.0f32; n * 3];
        for (i, h) in heights.iter().enumerate() {
            pos[i * 3 + 2] = *h;
        }
        data.root_pos_w = Tensor::from_data(TensorData::new(pos, [n, 3]), &device);
        env.scene.insert_articulation(
            "robot",
            Articulation {
                joint_names: vec!["knee".to_string()],
                body_names: vec!["pelvis".to_string()],
                data,
            },
        );
        env
    }

    /// `vertical[env][body]` in the most recent sample; older samples are loaded.
    fn contact_env(vertical: &[Vec<f32>], bodies: &[&str]) -> EnvState<TestBackend> {
        let device = Default::default();
        let n = vertical.len();
        let b = bodies.len();
        let history = 3;
        let mut forces = vec![0.0f32; n * history * b * 3];
        for env_id in 0..n {
            for h in 0..history {
                for body in 0..b {
                    let z = if h == 0 { vertical[env_id][body] } else { 100.0 };
                    forces[((env_id * history + h) * b + body) * 3 + 2] = z;
                }
            }
        }
        let mut env = EnvState::new(n, 1, STEP_DT, &device);
        let mut data = ContactSensorData::zeros(n, history, b, &device);
        data.net_forces_w_history =
            Tensor::from_data(TensorData::new(forces, [n, history, b, 3]), &device);
        env.scene.insert_contact_sensor(
            "contact_forces",
            ContactSensor {
                body_names: bodies.iter().map(|s| s.to_string()).collect(),
                data,
            },
        );
        env
    }

    #[test]
    fn test_target_height_bounds() {
        let device = Default::default();
        let times = (0..20_000).map(|i| i as f32 * 0.01).collect::<Vec<_>>();
        let heights = tensor2vec1(squat_target_height(vec2tensor1::<TestBackend, f32>(
            times.clone(),
            &device,
        )))
        .unwrap();
        for (t, h) in times.iter().zip(heights) {
            assert!((0.44 - 1e-5..=0.76 + 1e-5).contains(&h), "t={} h={}", t, h);
        }
    }

    #[test]
    fn test_target_height_examples() {
        let device = Default::default();
        let tensor = squat_target_height(vec2tensor1::<TestBackend, f32>(vec![0.0, 15.7], &device));
        let values = tensor2vec1(tensor).unwrap();
        assert_relative_eq!(values[0], 0.60, epsilon = 1e-6);
        assert_relative_eq!(values[1], 0.76, epsilon = 1e-4);
    }

    #[test]
    fn test_dynamic_squat_max_on_target() {
        let env = squat_env(&[0.60, 0.65], 0);
        let reward = tensor2vec1(reward_dynamic_squat(&env).unwrap()).unwrap();
        assert_relative_eq!(reward[0], 1.0);
        assert_relative_eq!(reward[1], (-1.0f32).exp(), epsilon = 1e-5);
    }

    #[test]
    fn test_dynamic_squat_reads_time_from_env() {
        // 785 steps of 0.02s: the target is at its top
        let env = squat_env(&[0.76, 0.60], 785);
        let reward = tensor2vec1(reward_dynamic_squat(&env).unwrap()).unwrap();
        assert_relative_eq!(reward[0], 1.0, epsilon = 1e-3);
        assert!(reward[1] < 1e-4);
    }

    #[test]
    fn test_dynamic_squat_strictly_decreasing_in_error() {
        let offsets = [0.0f32, 0.01, 0.02, 0.05, 0.1];
        let above: Vec<f32> = offsets.iter().map(|d| 0.60 + d).collect();
        let below: Vec<f32> = offsets.iter().map(|d| 0.60 - d).collect();
        for heights in [above, below] {
            let env = squat_env(&heights, 0);
            let reward = tensor2vec1(reward_dynamic_squat(&env).unwrap()).unwrap();
            for pair in reward.windows(2) {
                assert!(pair[0] > pair[1], "{:?}", reward);
            }
            assert!(reward.iter().all(|r| *r > 0.0 && *r <= 1.0));
        }
    }

    #[test]
    fn test_dynamic_squat_is_deterministic() {
        let env = squat_env(&[0.5, 0.7], 123);
        let first = tensor2vec1(reward_dynamic_squat(&env).unwrap()).unwrap();
        let second = tensor2vec1(reward_dynamic_squat(&env).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dynamic_squat_needs_robot() {
        let device = Default::default();
        let env = EnvState::<TestBackend>::new(1, 1, STEP_DT, &device);
        assert!(reward_dynamic_squat(&env).is_err());
    }

    #[test]
    fn test_double_support_two_feet() {
        let env = contact_env(
            &[vec![50.0, 50.0], vec![50.0, 0.0], vec![0.0, 0.0]],
            &["left_ankle_roll_link", "right_ankle_roll_link"],
        );
        let reward = tensor2vec1(reward_double_support(&env, &TermParams::new()).unwrap()).unwrap();
        assert_eq!(reward, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_double_support_threshold_is_strict() {
        let env = contact_env(&[vec![1.0, 1.5]], &["left", "right"]);
        let reward = tensor2vec1(reward_double_support(&env, &TermParams::new()).unwrap()).unwrap();
        assert_eq!(reward, vec![0.0]);
    }

    #[test]
    fn test_double_support_counts_all_monitored_bodies() {
        let bodies = ["left_ankle_roll_link", "right_ankle_roll_link", "left_hand"];
        let env = contact_env(&[vec![5.0, 5.0, 5.0], vec![5.0, 0.0, 5.0]], &bodies);
        let reward = tensor2vec1(reward_double_support(&env, &TermParams::new()).unwrap()).unwrap();
        assert_eq!(reward, vec![0.0, 1.0]);

        let feet = TermParams::new().with(
            "sensor_cfg",
            SceneEntityCfg::new("contact_forces").with_body_names(&[".*_ankle_roll_link"]),
        );
        let reward = tensor2vec1(reward_double_support(&env, &feet).unwrap()).unwrap();
        assert_eq!(reward, vec![1.0, 0.0]);
    }
}
