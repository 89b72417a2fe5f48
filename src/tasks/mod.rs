use lazy_static::lazy_static;

use crate::error::{Result, TaskError};
use crate::rl_algorithm::base::config::OnPolicyRunnerCfg;
use crate::rl_env::config::EnvConfig;

pub mod g1;

use g1::agents::{g1_flat_ppo_runner_cfg, g1_rough_ppo_runner_cfg, g1_squat_ppo_runner_cfg};
use g1::flat_env::{g1_flat_env_cfg, g1_flat_env_cfg_play};
use g1::rough_env::{g1_rough_env_cfg, g1_rough_env_cfg_play};
use g1::squat_env::{g1_squat_env_cfg, g1_squat_env_cfg_play};

/// A registered task: how to build its environment and its training runner.
pub struct TaskEntry {
    pub id: &'static str,
    pub env_cfg: fn() -> EnvConfig,
    pub agent_cfg: fn() -> OnPolicyRunnerCfg,
}

lazy_static! {
    static ref TASKS: Vec<TaskEntry> = vec![
        TaskEntry {
            id: "Isaac-Velocity-Rough-G1-v0",
            env_cfg: g1_rough_env_cfg,
            agent_cfg: g1_rough_ppo_runner_cfg,
        },
        TaskEntry {
            id: "Isaac-Velocity-Rough-G1-Play-v0",
            env_cfg: g1_rough_env_cfg_play,
            agent_cfg: g1_rough_ppo_runner_cfg,
        },
        TaskEntry {
            id: "Isaac-Velocity-Flat-G1-v0",
            env_cfg: g1_flat_env_cfg,
            agent_cfg: g1_flat_ppo_runner_cfg,
        },
        TaskEntry {
            id: "Isaac-Velocity-Flat-G1-Play-v0",
            env_cfg: g1_flat_env_cfg_play,
            agent_cfg: g1_flat_ppo_runner_cfg,
        },
        TaskEntry {
            id: "Isaac-Velocity-Squat-G1-v0",
            env_cfg: g1_squat_env_cfg,
            agent_cfg: g1_squat_ppo_runner_cfg,
        },
        TaskEntry {
            id: "Isaac-Velocity-Squat-G1-Play-v0",
            env_cfg: g1_squat_env_cfg_play,
            agent_cfg: g1_squat_ppo_runner_cfg,
        },
    ];
}

pub fn tasks() -> &'static [TaskEntry] {
    &TASKS
}

pub fn lookup(id: &str) -> Result<&'static TaskEntry> {
    TASKS
        .iter()
        .find(|task| task.id == id)
        .ok_or_else(|| TaskError::UnknownTask(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let task = lookup("Isaac-Velocity-Squat-G1-v0").unwrap();
        assert_eq!((task.agent_cfg)().experiment_name, "g1_squat");
        assert!((task.env_cfg)().rewards.get("dynamic_squat").is_some());
        assert!(matches!(
            lookup("Isaac-Velocity-Squat-H1-v0"),
            Err(TaskError::UnknownTask(_))
        ));
    }

    #[test]
    fn test_every_task_builds() {
        assert_eq!(tasks().len(), 6);
        for task in tasks() {
            let env = (task.env_cfg)();
            let agent = (task.agent_cfg)();
            assert!(env.scene.num_envs > 0, "{}", task.id);
            assert!(agent.experiment_name.starts_with("g1_"), "{}", task.id);
            if task.id.contains("-Play-") {
                assert_eq!(env.scene.num_envs, 50);
                assert!(!env.observations.policy.enable_corruption);
            }
        }
    }
}
