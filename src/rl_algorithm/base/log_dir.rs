use std::fs;
use std::path::{Path, PathBuf};

use burn::config::Config;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rand::Rng;
use regex::Regex;

use super::config::OnPolicyRunnerCfg;
use crate::error::{Result, TaskError};
use crate::rl_env::config::EnvConfig;

pub const RUN_DIR_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| TaskError::Timezone(name.to_string()))
}

/// `<root>/rsl_rl/<experiment_name>`
pub fn log_root(root: &Path, experiment_name: &str) -> PathBuf {
    root.join("rsl_rl").join(experiment_name)
}

pub fn run_dir_name(now: DateTime<Tz>, run_name: &str) -> String {
    let stamp = now.format(RUN_DIR_TIME_FORMAT).to_string();
    if run_name.is_empty() {
        stamp
    } else {
        format!("{}_{}", stamp, run_name)
    }
}

/// Creates a fresh timestamped run directory for `agent`.
pub fn create_run_dir(root: &Path, agent: &OnPolicyRunnerCfg, tz: Tz) -> Result<PathBuf> {
    let name = run_dir_name(Utc::now().with_timezone(&tz), &agent.run_name);
    let path = log_root(root, &agent.experiment_name).join(name);
    fs::create_dir_all(&path)?;
    log::info!("logging experiment in {}", path.display());
    Ok(path)
}

/// A negative seed asks for a random one.
pub fn resolve_seed(seed: i64) -> u64 {
    if seed < 0 {
        rand::rng().random_range(0..10_000)
    } else {
        seed as u64
    }
}

/// Dumps both configurations under `<run_dir>/params`.
pub fn export_params(run_dir: &Path, env: &EnvConfig, agent: &OnPolicyRunnerCfg) -> Result<()> {
    let params = run_dir.join("params");
    fs::create_dir_all(&params)?;
    env.save(params.join("env.json"))?;
    agent.save(params.join("agent.json"))?;
    Ok(())
}

/// Anchored at the start of the name only, so a pattern may be a prefix.
fn prefix_match(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{})", pattern))?)
}

fn natural_key(name: &str) -> String {
    format!("{:0>15}", name)
}

/// Picks the last run under `log_root` matching `load_run`, then the last
/// checkpoint in it matching `load_checkpoint`.
pub fn get_checkpoint_path(log_root: &Path, load_run: &str, load_checkpoint: &str) -> Result<PathBuf> {
    let run_re = prefix_match(load_run)?;
    let mut runs = fs::read_dir(log_root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| run_re.is_match(name))
        .collect::<Vec<_>>();
    runs.sort();
    let run = runs.pop().ok_or_else(|| TaskError::NoRun {
        root: log_root.display().to_string(),
        pattern: load_run.to_string(),
    })?;
    let run_path = log_root.join(run);

    let ckpt_re = prefix_match(load_checkpoint)?;
    let mut checkpoints = fs::read_dir(&run_path)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| ckpt_re.is_match(name))
        .collect::<Vec<_>>();
    checkpoints.sort_by_key(|name| natural_key(name));
    let checkpoint = checkpoints.pop().ok_or_else(|| TaskError::NoCheckpoint {
        run: run_path.display().to_string(),
        pattern: load_checkpoint.to_string(),
    })?;
    Ok(run_path.join(checkpoint))
}
