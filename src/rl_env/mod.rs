pub mod commands;
pub mod config;
pub mod env;
pub mod mdp;
pub mod reward_manager;
pub mod scene;
