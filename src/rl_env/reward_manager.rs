use std::collections::BTreeMap;

use burn::prelude::Backend;
use burn::tensor::Tensor;

use super::config::RewardsCfg;
use super::env::RlEnv;
use super::mdp::RewardTermCfg;
use crate::burn_utils::{index_tensor, tensor2vec1, vec2booltensor1};
use crate::error::{Result, TaskError};
use crate::rl_algorithm::base::EpochLogger;

/// Sums weighted reward terms into one reward per env and keeps per-term
/// episode totals for logging.
pub struct RewardManager<B: Backend> {
    terms: Vec<(String, RewardTermCfg)>,
    episode_sums: BTreeMap<String, Tensor<B, 1>>,
    step_reward: BTreeMap<String, Tensor<B, 1>>,
    num_envs: usize,
    device: B::Device,
}

impl<B: Backend> RewardManager<B> {
    pub fn new(cfg: &RewardsCfg, num_envs: usize, device: &B::Device) -> Self {
        let terms = cfg
            .terms
            .iter()
            .map(|(name, term)| (name.clone(), term.clone()))
            .collect::<Vec<_>>();
        let zeros = || Tensor::<B, 1>::zeros([num_envs], device);
        let episode_sums = terms.iter().map(|(name, _)| (name.clone(), zeros())).collect();
        let step_reward = terms.iter().map(|(name, _)| (name.clone(), zeros())).collect();
        for (name, term) in &terms {
            log::debug!("reward term {:<28} weight={}", name, term.weight);
        }
        Self {
            terms,
            episode_sums,
            step_reward,
            num_envs,
            device: device.clone(),
        }
    }

    pub fn active_terms(&self) -> Vec<&str> {
        self.terms.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Reward of the current step, [N].
    pub fn compute(&mut self, env: &dyn RlEnv<B>) -> Result<Tensor<B, 1>> {
        if env.num_envs() != self.num_envs {
            return Err(TaskError::EnvCount {
                expected: self.num_envs,
                actual: env.num_envs(),
            });
        }
        let dt = env.step_dt() as f64;
        let mut reward = Tensor::<B, 1>::zeros([self.num_envs], &self.device);
        for (name, term) in &self.terms {
            if term.weight == 0.0 {
                self.step_reward
                    .insert(name.clone(), Tensor::zeros([self.num_envs], &self.device));
                continue;
            }
            let weighted = term.func.evaluate(env, &term.params)?.mul_scalar(term.weight);
            let value = weighted.clone().mul_scalar(dt);
            reward = reward + value.clone();
            if let Some(sum) = self.episode_sums.get_mut(name) {
                *sum = sum.clone() + value;
            }
            self.step_reward.insert(name.clone(), weighted);
        }
        Ok(reward)
    }

    /// Averages the episode totals of `env_ids` per second of episode, reports
    /// them under `Episode_Reward` and clears those envs. Fails without
    /// touching any total when an id is out of range.
    pub fn reset(&mut self, env_ids: &[usize], max_episode_length_s: f64) -> Result<BTreeMap<String, f32>> {
        let mut extras = BTreeMap::new();
        if env_ids.is_empty() {
            return Ok(extras);
        }
        let mut mask = vec![false; self.num_envs];
        for &env_id in env_ids {
            if env_id >= self.num_envs {
                return Err(TaskError::EnvIndex {
                    index: env_id,
                    num_envs: self.num_envs,
                });
            }
            mask[env_id] = true;
        }
        let ids = index_tensor::<B>(env_ids, &self.device);
        let mask = vec2booltensor1::<B>(mask, &self.device);

        for (name, sum) in self.episode_sums.iter_mut() {
            let mean = tensor2vec1(sum.clone().select(0, ids.clone()).mean())?[0];
            let value = mean / max_episode_length_s as f32;
            EpochLogger::add_scalar(("Episode_Reward", name), value);
            extras.insert(format!("Episode_Reward/{}", name), value);
            *sum = sum.clone().mask_fill(mask.clone(), 0.0);
        }
        Ok(extras)
    }

    /// Last weighted value of each term before scaling by the step duration.
    pub fn step_reward(&self) -> &BTreeMap<String, Tensor<B, 1>> {
        &self.step_reward
    }
}
