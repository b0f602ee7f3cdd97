//! Episode runner for lookahead-search agents
//!
//! A command-line process that:
//! 1. Registers the built-in simulators
//! 2. Runs planning episodes with the configured search method
//! 3. Emits one structured trace line per decision frame

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::info;

mod config;

use crate::config::Config;
use lookahead::SearchAgent;
use sim_core::SimContext;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    games_gridworld::register_gridworld();

    let mut ctx = SimContext::new(&config.env_id)
        .ok_or_else(|| anyhow!("no simulator registered for env_id '{}'", config.env_id))?;

    let search_config = config.search_config()?;
    info!(
        env_id = %config.env_id,
        method = search_config.method.as_str(),
        budget = search_config.max_sim_steps_per_frame,
        "Starting runner"
    );

    let mut agent = SearchAgent::new(search_config, &ctx)?;

    let mut total_score = 0.0;
    for episode in 0..config.max_episodes {
        let seed = config.seed.wrapping_add(episode as u64);
        agent.episode_start(&mut ctx, seed)?;

        let mut score = 0.0;
        let mut frames = 0;
        while !agent.is_terminal() && frames < config.max_frames_per_episode {
            let step = agent.step(&mut ctx)?;
            score += step.reward;
            frames += 1;
        }

        agent.episode_end();
        total_score += score;

        if config.log_interval > 0 && (episode as u32 + 1) % config.log_interval == 0 {
            info!(
                episode = episode + 1,
                frames,
                score,
                terminal = agent.is_terminal(),
                "episode summary"
            );
        }
    }

    info!(
        episodes = config.max_episodes,
        total_score,
        total_simulation_steps = ctx.total_simulation_steps(),
        "runner finished"
    );
    Ok(())
}
