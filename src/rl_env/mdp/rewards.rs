//! Standard locomotion reward terms.
//!
//! Every term returns one value per env. Terms that need a subset of joints or
//! bodies take a `SceneEntityCfg` parameter (`asset_cfg` defaults to the whole
//! `robot`, `sensor_cfg` is required).

use burn::prelude::Backend;
use burn::tensor::Tensor;

use super::TermParams;
use crate::burn_utils::index_tensor;
use crate::error::Result;
use crate::rl_env::env::RlEnv;
use crate::rl_env::scene::{Articulation, ContactSensor, SceneEntityCfg};

/// Commands below this planar speed count as "stand still".
const MOVING_COMMAND_THRESHOLD: f32 = 0.1;

fn col<B: Backend>(tensor: &Tensor<B, 2>, i: usize) -> Tensor<B, 1> {
    let n = tensor.dims()[0];
    tensor.clone().slice([0..n, i..i + 1]).squeeze::<1>(1)
}

fn sum_sq<B: Backend>(tensor: Tensor<B, 2>) -> Tensor<B, 1> {
    tensor.powf_scalar(2.0).sum_dim(1).squeeze::<1>(1)
}

fn select_cols<B: Backend>(
    tensor: Tensor<B, 2>,
    ids: &Option<Vec<usize>>,
    device: &B::Device,
) -> Tensor<B, 2> {
    match ids {
        Some(ids) => tensor.select(1, index_tensor::<B>(ids, device)),
        None => tensor,
    }
}

fn xy<B: Backend>(tensor: &Tensor<B, 2>) -> Tensor<B, 2> {
    let n = tensor.dims()[0];
    tensor.clone().slice([0..n, 0..2])
}

fn asset<'a, B: Backend>(
    env: &'a dyn RlEnv<B>,
    params: &TermParams,
) -> Result<(&'a Articulation<B>, SceneEntityCfg)> {
    let cfg = params.entity_or("asset_cfg", "robot")?;
    let asset = env.scene().articulation(&cfg.name)?;
    Ok((asset, cfg))
}

fn sensor<'a, B: Backend>(
    env: &'a dyn RlEnv<B>,
    params: &TermParams,
) -> Result<(&'a ContactSensor<B>, Option<Vec<usize>>)> {
    let cfg = params.entity("sensor_cfg")?;
    let sensor = env.scene().contact_sensor(&cfg.name)?;
    let ids = cfg.resolve_body_ids(&sensor.body_names)?;
    Ok((sensor, ids))
}

/// 1.0 where the planar command asks the robot to move.
fn moving_command<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let command = env.command(params.string("command_name")?)?;
    Ok(sum_sq(xy(&command))
        .sqrt()
        .greater_elem(MOVING_COMMAND_THRESHOLD)
        .float())
}

/// Rotates world-frame planar velocity into the heading (yaw-only) frame.
pub fn yaw_frame_xy<B: Backend>(
    quat_w: &Tensor<B, 2>,
    vel_w: &Tensor<B, 2>,
) -> (Tensor<B, 1>, Tensor<B, 1>) {
    let (w, x, y, z) = (col(quat_w, 0), col(quat_w, 1), col(quat_w, 2), col(quat_w, 3));
    // cos/sin of the yaw angle, up to a common positive factor
    let a = (y.clone() * y.clone() + z.clone() * z.clone())
        .mul_scalar(-2.0)
        .add_scalar(1.0);
    let b = (w * z + x * y).mul_scalar(2.0);
    let r = (a.clone() * a.clone() + b.clone() * b.clone())
        .sqrt()
        .clamp_min(1.0e-9);
    let cos = a / r.clone();
    let sin = b / r;
    let (vx, vy) = (col(vel_w, 0), col(vel_w, 1));
    let local_x = cos.clone() * vx.clone() + sin.clone() * vy.clone();
    let local_y = cos * vy - sin * vx;
    (local_x, local_y)
}

pub fn is_terminated<B: Backend>(env: &dyn RlEnv<B>) -> Result<Tensor<B, 1>> {
    Ok(env.reset_terminated().float())
}

pub fn track_lin_vel_xy_exp<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let std = params.float("std")?;
    let (asset, _) = asset(env, params)?;
    let command = env.command(params.string("command_name")?)?;
    let error = sum_sq(xy(&command) - xy(&asset.data.root_lin_vel_b));
    Ok(error.div_scalar(-(std * std)).exp())
}

pub fn track_lin_vel_xy_yaw_frame_exp<B: Backend>(
    env: &dyn RlEnv<B>,
    params: &TermParams,
) -> Result<Tensor<B, 1>> {
    let std = params.float("std")?;
    let (asset, _) = asset(env, params)?;
    let command = env.command(params.string("command_name")?)?;
    let (vx, vy) = yaw_frame_xy(&asset.data.root_quat_w, &asset.data.root_lin_vel_w);
    let error = (col(&command, 0) - vx).powf_scalar(2.0) + (col(&command, 1) - vy).powf_scalar(2.0);
    Ok(error.div_scalar(-(std * std)).exp())
}

pub fn track_ang_vel_z_exp<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let std = params.float("std")?;
    let (asset, _) = asset(env, params)?;
    let command = env.command(params.string("command_name")?)?;
    let error = (col(&command, 2) - col(&asset.data.root_ang_vel_b, 2)).powf_scalar(2.0);
    Ok(error.div_scalar(-(std * std)).exp())
}

pub fn track_ang_vel_z_world_exp<B: Backend>(
    env: &dyn RlEnv<B>,
    params: &TermParams,
) -> Result<Tensor<B, 1>> {
    let std = params.float("std")?;
    let (asset, _) = asset(env, params)?;
    let command = env.command(params.string("command_name")?)?;
    let error = (col(&command, 2) - col(&asset.data.root_ang_vel_w, 2)).powf_scalar(2.0);
    Ok(error.div_scalar(-(std * std)).exp())
}

pub fn lin_vel_z_l2<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let (asset, _) = asset(env, params)?;
    Ok(col(&asset.data.root_lin_vel_b, 2).powf_scalar(2.0))
}

pub fn ang_vel_xy_l2<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let (asset, _) = asset(env, params)?;
    Ok(sum_sq(xy(&asset.data.root_ang_vel_b)))
}

pub fn flat_orientation_l2<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let (asset, _) = asset(env, params)?;
    Ok(sum_sq(xy(&asset.data.projected_gravity_b)))
}

pub fn joint_torques_l2<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let (asset, cfg) = asset(env, params)?;
    let ids = cfg.resolve_joint_ids(&asset.joint_names)?;
    let torque = select_cols(asset.data.applied_torque.clone(), &ids, &env.device());
    Ok(sum_sq(torque))
}

pub fn joint_acc_l2<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let (asset, cfg) = asset(env, params)?;
    let ids = cfg.resolve_joint_ids(&asset.joint_names)?;
    let acc = select_cols(asset.data.joint_acc.clone(), &ids, &env.device());
    Ok(sum_sq(acc))
}

pub fn action_rate_l2<B: Backend>(env: &dyn RlEnv<B>) -> Result<Tensor<B, 1>> {
    Ok(sum_sq(env.action() - env.prev_action()))
}

/// Distance by which joints exceed their soft position limits.
pub fn joint_pos_limits<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let (asset, cfg) = asset(env, params)?;
    let ids = cfg.resolve_joint_ids(&asset.joint_names)?;
    let device = env.device();
    let limits = &asset.data.soft_joint_pos_limits;
    let [n, j, _] = limits.dims();
    let lower = limits.clone().slice([0..n, 0..j, 0..1]).squeeze::<2>(2);
    let upper = limits.clone().slice([0..n, 0..j, 1..2]).squeeze::<2>(2);
    let pos = asset.data.joint_pos.clone();
    let below = (pos.clone() - lower).clamp_max(0.0).neg();
    let above = (pos - upper).clamp_min(0.0);
    Ok(select_cols(below + above, &ids, &device)
        .sum_dim(1)
        .squeeze::<1>(1))
}

pub fn joint_deviation_l1<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let (asset, cfg) = asset(env, params)?;
    let ids = cfg.resolve_joint_ids(&asset.joint_names)?;
    let deviation = (asset.data.joint_pos.clone() - asset.data.default_joint_pos.clone()).abs();
    Ok(select_cols(deviation, &ids, &env.device())
        .sum_dim(1)
        .squeeze::<1>(1))
}

/// Rewards long steps: air time beyond `threshold`, paid out at touchdown.
pub fn feet_air_time<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let threshold = params.float("threshold")?;
    let (sensor, ids) = sensor(env, params)?;
    let device = env.device();
    let first_contact = select_cols(sensor.data.compute_first_contact(env.step_dt()), &ids, &device);
    let last_air_time = select_cols(sensor.data.last_air_time.clone(), &ids, &device);
    let reward = (last_air_time.sub_scalar(threshold) * first_contact)
        .sum_dim(1)
        .squeeze::<1>(1);
    Ok(reward * moving_command(env, params)?)
}

/// Bipeds: rewards time spent in single stance, capped at `threshold`.
pub fn feet_air_time_positive_biped<B: Backend>(
    env: &dyn RlEnv<B>,
    params: &TermParams,
) -> Result<Tensor<B, 1>> {
    let threshold = params.float("threshold")?;
    let (sensor, ids) = sensor(env, params)?;
    let device = env.device();
    let air_time = select_cols(sensor.data.current_air_time.clone(), &ids, &device);
    let contact_time = select_cols(sensor.data.current_contact_time.clone(), &ids, &device);
    let in_contact = contact_time.clone().greater_elem(0.0).float();
    let in_mode_time =
        contact_time * in_contact.clone() + air_time * in_contact.clone().neg().add_scalar(1.0);
    let single_stance = in_contact.sum_dim(1).equal_elem(1.0).float();
    let reward = (in_mode_time * single_stance)
        .min_dim(1)
        .squeeze::<1>(1)
        .clamp_max(threshold);
    Ok(reward * moving_command(env, params)?)
}

/// Planar speed of feet that are in contact with the ground.
pub fn feet_slide<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let (sensor, sensor_ids) = sensor(env, params)?;
    let (asset, cfg) = asset(env, params)?;
    let body_ids = cfg.resolve_body_ids(&asset.body_names)?;
    let device = env.device();

    let contacts = peak_force_norm(sensor, &sensor_ids, &device).greater_elem(1.0).float();

    let mut body_vel = asset.data.body_lin_vel_w.clone();
    if let Some(ids) = &body_ids {
        body_vel = body_vel.select(1, index_tensor::<B>(ids, &device));
    }
    let [n, b, _] = body_vel.dims();
    let speed = body_vel
        .slice([0..n, 0..b, 0..2])
        .powf_scalar(2.0)
        .sum_dim(2)
        .sqrt()
        .squeeze::<2>(2);
    Ok((speed * contacts).sum_dim(1).squeeze::<1>(1))
}

/// Number of monitored bodies whose contact force exceeds `threshold`.
pub fn undesired_contacts<B: Backend>(env: &dyn RlEnv<B>, params: &TermParams) -> Result<Tensor<B, 1>> {
    let threshold = params.float("threshold")?;
    let (sensor, ids) = sensor(env, params)?;
    let is_contact = peak_force_norm(sensor, &ids, &env.device())
        .greater_elem(threshold)
        .float();
    Ok(is_contact.sum_dim(1).squeeze::<1>(1))
}

/// Largest force magnitude over the sensor history, [N, bodies].
fn peak_force_norm<B: Backend>(
    sensor: &ContactSensor<B>,
    ids: &Option<Vec<usize>>,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut forces = sensor.data.net_forces_w_history.clone();
    if let Some(ids) = ids {
        forces = forces.select(2, index_tensor::<B>(ids, device));
    }
    let [n, _, b, _] = forces.dims();
    forces
        .powf_scalar(2.0)
        .sum_dim(3)
        .sqrt()
        .max_dim(1)
        .reshape([n, b])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn_utils::tensor2vec1;
    use crate::rl_env::env::EnvState;
    use crate::rl_env::scene::{ArticulationData, ContactSensorData};
    use approx::assert_relative_eq;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn joint_names() -> Vec<String> {
        ["left_hip_yaw_joint", "left_knee_joint", "torso_joint"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn feet() -> Vec<String> {
        ["left_ankle_roll_link", "right_ankle_roll_link", "torso_link"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn env(num_envs: usize) -> EnvState<TestBackend> {
        let device = Default::default();
        let mut env = EnvState::new(num_envs, 3, 0.02, &device);
        env.scene.insert_articulation(
            "robot",
            Articulation {
                joint_names: joint_names(),
                body_names: feet(),
                data: ArticulationData::zeros(num_envs, 3, 3, &device),
            },
        );
        env.scene.insert_contact_sensor(
            "contact_forces",
            ContactSensor {
                body_names: feet(),
                data: ContactSensorData::zeros(num_envs, 3, 3, &device),
            },
        );
        env.set_command("base_velocity", Tensor::zeros([num_envs, 3], &device));
        env
    }

    fn feet_cfg() -> SceneEntityCfg {
        SceneEntityCfg::new("contact_forces").with_body_names(&[".*_ankle_roll_link"])
    }

    #[test]
    fn test_yaw_frame_rotates_by_heading() {
        let device = Default::default();
        // 90 degrees about z
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let quat = Tensor::<TestBackend, 2>::from_floats([[half, 0.0, 0.0, half]], &device);
        let vel = Tensor::<TestBackend, 2>::from_floats([[0.0, 1.0, 0.0]], &device);
        let (vx, vy) = yaw_frame_xy(&quat, &vel);
        assert_relative_eq!(tensor2vec1(vx).unwrap()[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(tensor2vec1(vy).unwrap()[0], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_tracking_is_one_at_zero_error() {
        let env = env(2);
        let params = TermParams::new().with("std", 0.5).with("command_name", "base_velocity");
        let lin = tensor2vec1(track_lin_vel_xy_yaw_frame_exp(&env, &params).unwrap()).unwrap();
        let ang = tensor2vec1(track_ang_vel_z_world_exp(&env, &params).unwrap()).unwrap();
        assert_eq!(lin, vec![1.0, 1.0]);
        assert_eq!(ang, vec![1.0, 1.0]);
    }

    #[test]
    fn test_tracking_decays_with_error() {
        let mut env = env(1);
        let device = Default::default();
        env.set_command("base_velocity", Tensor::from_floats([[0.5, 0.0, 0.0]], &device));
        let params = TermParams::new().with("std", 0.5).with("command_name", "base_velocity");
        let value = tensor2vec1(track_lin_vel_xy_exp(&env, &params).unwrap()).unwrap();
        assert_relative_eq!(value[0], (-1.0f32).exp(), epsilon = 1e-6);
    }

    #[test]
    fn test_missing_std_is_reported() {
        let env = env(1);
        let params = TermParams::new().with("command_name", "base_velocity");
        assert!(track_ang_vel_z_exp(&env, &params).is_err());
    }

    #[test]
    fn test_action_rate_l2() {
        let mut env = env(1);
        let device = Default::default();
        env.push_action(Tensor::from_floats([[1.0, 0.0, 0.0]], &device));
        env.push_action(Tensor::from_floats([[2.0, 0.0, 2.0]], &device));
        let value = tensor2vec1(action_rate_l2(&env).unwrap()).unwrap();
        assert_relative_eq!(value[0], 5.0);
    }

    #[test]
    fn test_joint_terms_respect_selection() {
        let mut env = env(1);
        let device = Default::default();
        let mut robot = env.scene.articulation("robot").unwrap().clone();
        robot.data.joint_acc = Tensor::from_floats([[1.0, 2.0, 3.0]], &device);
        robot.data.joint_pos = Tensor::from_floats([[1.5, -0.5, -2.0]], &device);
        env.scene.insert_articulation("robot", robot);

        let legs = TermParams::new().with(
            "asset_cfg",
            SceneEntityCfg::new("robot").with_joint_names(&[".*_hip_.*", ".*_knee_joint"]),
        );
        let acc = tensor2vec1(joint_acc_l2(&env, &legs).unwrap()).unwrap();
        assert_relative_eq!(acc[0], 5.0);

        let all = TermParams::new();
        let limits = tensor2vec1(joint_pos_limits(&env, &all).unwrap()).unwrap();
        assert_relative_eq!(limits[0], 1.5, epsilon = 1e-6);
        let deviation = tensor2vec1(joint_deviation_l1(&env, &legs).unwrap()).unwrap();
        assert_relative_eq!(deviation[0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_biped_air_time_single_stance() {
        let mut env = env(2);
        let device = Default::default();
        env.set_command(
            "base_velocity",
            Tensor::from_floats([[1.0, 0.0, 0.0], [1.0, 0.0, 0.0]], &device),
        );
        let mut sensor = env.scene.contact_sensor("contact_forces").unwrap().clone();
        // env 0: left foot in stance for 0.3s, right foot airborne for 0.2s
        // env 1: both feet down
        sensor.data.current_contact_time =
            Tensor::from_floats([[0.3, 0.0, 0.0], [0.5, 0.5, 0.0]], &device);
        sensor.data.current_air_time =
            Tensor::from_floats([[0.0, 0.2, 0.0], [0.0, 0.0, 0.0]], &device);
        env.scene.insert_contact_sensor("contact_forces", sensor);

        let params = TermParams::new()
            .with("threshold", 0.4)
            .with("command_name", "base_velocity")
            .with("sensor_cfg", feet_cfg());
        let value = tensor2vec1(feet_air_time_positive_biped(&env, &params).unwrap()).unwrap();
        assert_relative_eq!(value[0], 0.2, epsilon = 1e-6);
        assert_relative_eq!(value[1], 0.0);
    }

    #[test]
    fn test_air_time_gated_by_standing_command() {
        let mut env = env(1);
        let device = Default::default();
        let mut sensor = env.scene.contact_sensor("contact_forces").unwrap().clone();
        sensor.data.current_contact_time = Tensor::from_floats([[0.01, 0.0, 0.0]], &device);
        sensor.data.last_air_time = Tensor::from_floats([[0.9, 0.0, 0.0]], &device);
        env.scene.insert_contact_sensor("contact_forces", sensor);
        let params = TermParams::new()
            .with("threshold", 0.5)
            .with("command_name", "base_velocity")
            .with("sensor_cfg", feet_cfg());

        let standing = tensor2vec1(feet_air_time(&env, &params).unwrap()).unwrap();
        assert_eq!(standing, vec![0.0]);

        env.set_command("base_velocity", Tensor::from_floats([[1.0, 0.0, 0.0]], &device));
        let moving = tensor2vec1(feet_air_time(&env, &params).unwrap()).unwrap();
        assert_relative_eq!(moving[0], 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_feet_slide_counts_only_feet_in_contact() {
        let mut env = env(1);
        let device = Default::default();
        let mut robot = env.scene.articulation("robot").unwrap().clone();
        robot.data.body_lin_vel_w = Tensor::from_floats(
            [[[3.0, 4.0, 9.0], [1.0, 0.0, 0.0], [7.0, 7.0, 7.0]]],
            &device,
        );
        env.scene.insert_articulation("robot", robot);
        let mut sensor = env.scene.contact_sensor("contact_forces").unwrap().clone();
        let mut forces = Tensor::<TestBackend, 4>::zeros([1, 3, 3, 3], &device);
        // left foot loaded in an older sample only, right foot in the air
        forces = forces.slice_assign(
            [0..1, 2..3, 0..1, 2..3],
            Tensor::full([1, 1, 1, 1], 50.0, &device),
        );
        sensor.data.net_forces_w_history = forces;
        env.scene.insert_contact_sensor("contact_forces", sensor);

        let params = TermParams::new().with("sensor_cfg", feet_cfg()).with(
            "asset_cfg",
            SceneEntityCfg::new("robot").with_body_names(&[".*_ankle_roll_link"]),
        );
        let value = tensor2vec1(feet_slide(&env, &params).unwrap()).unwrap();
        assert_relative_eq!(value[0], 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_undesired_contacts() {
        let mut env = env(1);
        let device = Default::default();
        let mut sensor = env.scene.contact_sensor("contact_forces").unwrap().clone();
        sensor.data.net_forces_w_history = Tensor::<TestBackend, 4>::zeros([1, 3, 3, 3], &device)
            .slice_assign([0..1, 0..1, 2..3, 0..1], Tensor::full([1, 1, 1, 1], 2.0, &device));
        env.scene.insert_contact_sensor("contact_forces", sensor);
        let params = TermParams::new().with("threshold", 1.0).with(
            "sensor_cfg",
            SceneEntityCfg::new("contact_forces").with_body_names(&["torso_link"]),
        );
        let value = tensor2vec1(undesired_contacts(&env, &params).unwrap()).unwrap();
        assert_eq!(value, vec![1.0]);
    }

    #[test]
    fn test_flat_orientation_zero_when_upright() {
        let env = env(3);
        let value = tensor2vec1(flat_orientation_l2(&env, &TermParams::new()).unwrap()).unwrap();
        assert_eq!(value, vec![0.0, 0.0, 0.0]);
    }
}
