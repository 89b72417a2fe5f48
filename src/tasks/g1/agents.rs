use crate::rl_algorithm::base::config::{LoggerKind, OnPolicyRunnerCfg};
use crate::rl_algorithm::ppo::actor_critic::{ActorCriticCfg, Activation, NoiseStdType};
use crate::rl_algorithm::ppo::config::{LearningRateSchedule, PpoAlgorithmCfg};

const SMALL_HIDDEN_DIMS: [usize; 3] = [256, 128, 128];

pub fn g1_rough_ppo_runner_cfg() -> OnPolicyRunnerCfg {
    OnPolicyRunnerCfg {
        seed: 42,
        device: "cuda:0".to_string(),
        num_steps_per_env: 24,
        max_iterations: 3000,
        save_interval: 50,
        experiment_name: "g1_rough".to_string(),
        run_name: String::new(),
        logger: LoggerKind::Tensorboard,
        neptune_project: "isaaclab".to_string(),
        wandb_project: "isaaclab".to_string(),
        resume: false,
        load_run: ".*".to_string(),
        load_checkpoint: "model_.*.pt".to_string(),
        clip_actions: None,
        policy: ActorCriticCfg {
            class_name: "ActorCritic".to_string(),
            init_noise_std: 1.0,
            noise_std_type: NoiseStdType::Scalar,
            actor_obs_normalization: false,
            critic_obs_normalization: false,
            actor_hidden_dims: vec![512, 256, 128],
            critic_hidden_dims: vec![512, 256, 128],
            activation: Activation::Elu,
        },
        algorithm: PpoAlgorithmCfg {
            class_name: "PPO".to_string(),
            value_loss_coef: 1.0,
            use_clipped_value_loss: true,
            clip_param: 0.2,
            entropy_coef: 0.008,
            num_learning_epochs: 5,
            num_mini_batches: 4,
            learning_rate: 1.0e-3,
            schedule: LearningRateSchedule::Adaptive,
            gamma: 0.99,
            lam: 0.95,
            desired_kl: 0.01,
            max_grad_norm: 1.0,
            normalize_advantage_per_mini_batch: false,
        },
    }
}

pub fn flat_overrides(cfg: &mut OnPolicyRunnerCfg) {
    cfg.max_iterations = 1500;
    cfg.experiment_name = "g1_flat".to_string();
    cfg.policy.actor_hidden_dims = SMALL_HIDDEN_DIMS.to_vec();
    cfg.policy.critic_hidden_dims = SMALL_HIDDEN_DIMS.to_vec();
}

/// Squatting is learned quickly, so it trains a shorter run on the small network.
pub fn squat_overrides(cfg: &mut OnPolicyRunnerCfg) {
    cfg.experiment_name = "g1_squat".to_string();
    cfg.max_iterations = 1000;
    cfg.policy.actor_hidden_dims = SMALL_HIDDEN_DIMS.to_vec();
    cfg.policy.critic_hidden_dims = SMALL_HIDDEN_DIMS.to_vec();
}

pub fn g1_flat_ppo_runner_cfg() -> OnPolicyRunnerCfg {
    let mut cfg = g1_rough_ppo_runner_cfg();
    flat_overrides(&mut cfg);
    cfg
}

pub fn g1_squat_ppo_runner_cfg() -> OnPolicyRunnerCfg {
    let mut cfg = g1_rough_ppo_runner_cfg();
    squat_overrides(&mut cfg);
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squat_runner() {
        let cfg = g1_squat_ppo_runner_cfg();
        assert_eq!(cfg.experiment_name, "g1_squat");
        assert_eq!(cfg.max_iterations, 1000);
        assert_eq!(cfg.policy.actor_hidden_dims, vec![256, 128, 128]);
        assert_eq!(cfg.policy.critic_hidden_dims, vec![256, 128, 128]);
        // inherited untouched
        assert_eq!(cfg.num_steps_per_env, 24);
        assert_eq!(cfg.algorithm, g1_rough_ppo_runner_cfg().algorithm);
    }

    #[test]
    fn test_flat_runner() {
        let cfg = g1_flat_ppo_runner_cfg();
        assert_eq!(cfg.experiment_name, "g1_flat");
        assert_eq!(cfg.max_iterations, 1500);
        assert_eq!(cfg.save_interval, 50);
        assert_eq!(cfg.policy.activation, Activation::Elu);
    }

    #[test]
    fn test_overrides_are_idempotent() {
        let once = g1_squat_ppo_runner_cfg();
        let mut twice = once.clone();
        squat_overrides(&mut twice);
        assert_eq!(once, twice);

        let once = g1_flat_ppo_runner_cfg();
        let mut twice = once.clone();
        flat_overrides(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rough_agent_json_names() {
        let json = serde_json::to_value(g1_rough_ppo_runner_cfg()).unwrap();
        assert_eq!(json["policy"]["activation"], "elu");
        assert_eq!(json["algorithm"]["schedule"], "adaptive");
        assert_eq!(json["logger"], "tensorboard");
        assert_eq!(json["algorithm"]["entropy_coef"], 0.008);
    }
}
