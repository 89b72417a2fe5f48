use burn::prelude::Backend;

use crate::rl_env::scene::{
    Articulation, ArticulationData, ContactSensor, ContactSensorData, InteractiveScene,
};

/// Actuated joints of the G1 in simulator order, fingers included.
pub const G1_JOINT_NAMES: [&str; 37] = [
    "left_hip_pitch_joint",
    "right_hip_pitch_joint",
    "torso_joint",
    "left_hip_roll_joint",
    "right_hip_roll_joint",
    "left_shoulder_pitch_joint",
    "right_shoulder_pitch_joint",
    "left_hip_yaw_joint",
    "right_hip_yaw_joint",
    "left_shoulder_roll_joint",
    "right_shoulder_roll_joint",
    "left_knee_joint",
    "right_knee_joint",
    "left_shoulder_yaw_joint",
    "right_shoulder_yaw_joint",
    "left_ankle_pitch_joint",
    "right_ankle_pitch_joint",
    "left_elbow_pitch_joint",
    "right_elbow_pitch_joint",
    "left_ankle_roll_joint",
    "right_ankle_roll_joint",
    "left_elbow_roll_joint",
    "right_elbow_roll_joint",
    "left_five_joint",
    "left_three_joint",
    "left_zero_joint",
    "right_five_joint",
    "right_three_joint",
    "right_zero_joint",
    "left_six_joint",
    "left_four_joint",
    "left_one_joint",
    "right_six_joint",
    "right_four_joint",
    "right_one_joint",
    "left_two_joint",
    "right_two_joint",
];

/// Leg and trunk links; the contact sensor covers the same set.
pub const G1_BODY_NAMES: [&str; 14] = [
    "pelvis",
    "torso_link",
    "left_hip_pitch_link",
    "right_hip_pitch_link",
    "left_hip_roll_link",
    "right_hip_roll_link",
    "left_hip_yaw_link",
    "right_hip_yaw_link",
    "left_knee_link",
    "right_knee_link",
    "left_ankle_pitch_link",
    "right_ankle_pitch_link",
    "left_ankle_roll_link",
    "right_ankle_roll_link",
];

pub const LEFT_FOOT: usize = 12;
pub const RIGHT_FOOT: usize = 13;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

/// A scene holding `robot` and `contact_forces` for `num_envs` G1s at rest.
pub fn g1_scene<B: Backend>(num_envs: usize, history: usize, device: &B::Device) -> InteractiveScene<B> {
    let mut scene = InteractiveScene::default();
    scene.insert_articulation(
        "robot",
        Articulation {
            joint_names: names(&G1_JOINT_NAMES),
            body_names: names(&G1_BODY_NAMES),
            data: ArticulationData::zeros(num_envs, G1_JOINT_NAMES.len(), G1_BODY_NAMES.len(), device),
        },
    );
    scene.insert_contact_sensor(
        "contact_forces",
        ContactSensor {
            body_names: names(&G1_BODY_NAMES),
            data: ContactSensorData::zeros(num_envs, history, G1_BODY_NAMES.len(), device),
        },
    );
    scene
}
