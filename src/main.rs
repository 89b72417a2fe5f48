mod burn_utils;
mod error;
mod rl_algorithm;
mod rl_env;
mod tasks;

use std::path::PathBuf;

use anyhow::Context;
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::NdArray;
use burn::tensor::{Tensor, TensorData};
use clap::{Parser, Subcommand};

use burn_utils::{tensor2vec1, vec2tensor1};
use rl_algorithm::base::log_dir::{
    create_run_dir, export_params, get_checkpoint_path, log_root, parse_timezone, resolve_seed,
};
use rl_algorithm::base::{EpochLogger, EpochLoggerAggMode};
use rl_env::commands::UniformVelocityCommand;
use rl_env::env::EnvState;
use rl_env::reward_manager::RewardManager;
use tasks::g1::robot::{g1_scene, G1_BODY_NAMES, G1_JOINT_NAMES, LEFT_FOOT, RIGHT_FOOT};
use tasks::g1::squat_rewards::squat_target_height;

type Backend = NdArray;

#[derive(Parser)]
#[command(name = "g1-tasks")]
#[command(about = "Inspect and export the G1 locomotion and squat training tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered task ids
    List,

    /// Print a task's configuration as JSON
    Show {
        task: String,

        /// Only the training runner configuration
        #[arg(long, conflicts_with = "env")]
        agent: bool,

        /// Only the environment configuration
        #[arg(long)]
        env: bool,
    },

    /// Create a run directory and dump both configurations into it
    Export {
        task: String,

        #[arg(long, default_value = "logs")]
        log_root: PathBuf,

        /// Overrides the runner's run name
        #[arg(long)]
        run_name: Option<String>,

        /// Timezone of the run directory timestamp
        #[arg(long, default_value = "UTC")]
        tz: String,
    },

    /// Resolve the checkpoint a resumed run would load
    Checkpoint {
        task: String,

        #[arg(long, default_value = "logs")]
        log_root: PathBuf,
    },

    /// Step the squat rewards over a scripted trajectory and log them
    Profile {
        /// Simulated seconds
        #[arg(long, default_value_t = 60.0)]
        duration: f64,

        #[arg(long, default_value_t = 64)]
        num_envs: usize,

        /// Tensorboard directory; console only when absent
        #[arg(long)]
        logdir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::List => {
            for task in tasks::tasks() {
                println!("{}", task.id);
            }
        }
        Command::Show { task, agent, env } => {
            let task = tasks::lookup(&task)?;
            let json = if agent {
                serde_json::to_string_pretty(&(task.agent_cfg)())?
            } else if env {
                serde_json::to_string_pretty(&(task.env_cfg)())?
            } else {
                serde_json::to_string_pretty(&serde_json::json!({
                    "env": (task.env_cfg)(),
                    "agent": (task.agent_cfg)(),
                }))?
            };
            println!("{}", json);
        }
        Command::Export {
            task,
            log_root,
            run_name,
            tz,
        } => {
            let task = tasks::lookup(&task)?;
            let env = (task.env_cfg)();
            let mut agent = (task.agent_cfg)();
            if let Some(run_name) = run_name {
                agent.run_name = run_name;
            }
            let tz = parse_timezone(&tz)?;
            let run_dir = create_run_dir(&log_root, &agent, tz)?;
            export_params(&run_dir, &env, &agent)
                .with_context(|| format!("exporting params to {}", run_dir.display()))?;
            log::info!("seed {}", resolve_seed(agent.seed));
            println!("{}", run_dir.display());
        }
        Command::Checkpoint { task, log_root: root } => {
            let agent = (tasks::lookup(&task)?.agent_cfg)();
            let root = log_root(&root, &agent.experiment_name);
            let path = get_checkpoint_path(&root, &agent.load_run, &agent.load_checkpoint)?;
            println!("{}", path.display());
        }
        Command::Profile {
            duration,
            num_envs,
            logdir,
        } => profile(duration, num_envs, logdir)?,
    }
    Ok(())
}

/// Robots that lag the squat trajectory by a per-env phase, standing on both
/// feet, scored by the squat task's reward terms.
fn profile(duration: f64, num_envs: usize, logdir: Option<PathBuf>) -> anyhow::Result<()> {
    let task = tasks::lookup("Isaac-Velocity-Squat-G1-v0")?;
    let cfg = (task.env_cfg)();
    let agent = (task.agent_cfg)();
    let seed = resolve_seed(agent.seed);
    if let Some(logdir) = logdir {
        EpochLogger::init_writer(logdir);
    }

    let device = NdArrayDevice::default();
    let step_dt = cfg.step_dt();
    let history = cfg.scene.contact_forces.history_length;
    let bodies = G1_BODY_NAMES.len();

    let mut env = EnvState::<Backend>::new(num_envs, G1_JOINT_NAMES.len(), step_dt as f32, &device);
    env.scene = g1_scene(num_envs, history, &device);
    let mut forces = vec![0.0f32; num_envs * history * bodies * 3];
    for e in 0..num_envs {
        for h in 0..history {
            for foot in [LEFT_FOOT, RIGHT_FOOT] {
                forces[((e * history + h) * bodies + foot) * 3 + 2] = 170.0;
            }
        }
    }
    env.scene.contact_sensor_mut("contact_forces")?.data.net_forces_w_history =
        Tensor::from_data(TensorData::new(forces, [num_envs, history, bodies, 3]), &device);

    let mut command = UniformVelocityCommand::<Backend>::new(
        cfg.commands.base_velocity.clone(),
        num_envs,
        seed,
    );
    let mut rewards = RewardManager::<Backend>::new(&cfg.rewards, num_envs, &device);
    for name in rewards.active_terms() {
        if let Some(term) = cfg.rewards.get(name) {
            log::info!("reward term {:<28} {:?} weight={}", name, term.func, term.weight);
        }
    }
    let all_envs = (0..num_envs).collect::<Vec<_>>();
    let lags = vec2tensor1::<Backend, f32>(
        all_envs.iter().map(|&e| 0.5 * e as f32 / num_envs as f32).collect(),
        &device,
    );
    let heading = vec![0.0f32; num_envs];

    let total_steps = (duration / step_dt).ceil() as usize;
    let max_episode_length = cfg.max_episode_length();
    log::info!(
        "profiling {} for {} steps over {} envs (seed {})",
        task.id,
        total_steps,
        num_envs,
        seed
    );

    let start = std::time::Instant::now();
    let mut episode_step = 0;
    for step in 0..total_steps {
        let height = squat_target_height(env.episode_time() - lags.clone());
        env.scene.articulation_mut("robot")?.data.root_pos_w = Tensor::zeros([num_envs, 3], &device)
            .slice_assign([0..num_envs, 2..3], height.unsqueeze_dim::<2>(1));
        env.push_action(Tensor::zeros([num_envs, G1_JOINT_NAMES.len()], &device));

        command.step(step_dt as f32, &heading);
        env.set_command("base_velocity", command.command(&device));

        let reward = rewards.compute(&env)?;
        let mean_reward = tensor2vec1(reward.clone().mean())?[0];
        let max_reward = tensor2vec1(reward.max())?[0];
        EpochLogger::add_scalar_agg(("Train", "reward_sum"), mean_reward, EpochLoggerAggMode::Sum);
        EpochLogger::add_scalar_agg(("Train", "reward_max"), max_reward, EpochLoggerAggMode::Max);
        for (name, value) in rewards.step_reward() {
            EpochLogger::add_scalar(("Step_Reward", name), tensor2vec1(value.clone().mean())?[0]);
        }
        env.advance();
        episode_step += 1;

        if episode_step >= max_episode_length {
            rewards.reset(&all_envs, cfg.episode_length_s)?;
            command.resample(&all_envs);
            env.episode_length_buf = Tensor::zeros([num_envs], &device);
            episode_step = 0;
        }
        if (step + 1) % agent.num_steps_per_env == 0 {
            EpochLogger::log((step + 1) / agent.num_steps_per_env);
        }
    }
    log::info!("stepped rewards in {:?}", start.elapsed());
    Ok(())
}
