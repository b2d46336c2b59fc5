use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::info;

use intersection_sim::simulation::{
    SignalTiming, SimConfig, SimWorld, PENDING_TIMEOUT_TICKS, PHASE_DURATION_TICKS,
    STARVATION_THRESHOLD_TICKS,
};

#[derive(Parser)]
#[command(name = "intersection_sim")]
#[command(about = "Four-way signalized intersection simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "3600")]
    ticks: u32,

    /// Seed for reproducible arrivals
    #[arg(long)]
    seed: Option<u64>,

    /// Probability that a random vehicle arrives on each tick
    #[arg(long, default_value = "0.05")]
    spawn_chance: f64,

    /// Print a summary every N ticks (0 disables periodic summaries)
    #[arg(long, default_value = "600")]
    report_every: u32,

    /// Draw the terminal map with each summary
    #[arg(long)]
    map: bool,

    /// Milliseconds to pause after each summary
    #[arg(long, default_value = "0")]
    pause_ms: u64,

    /// Base green duration in ticks
    #[arg(long, default_value_t = PHASE_DURATION_TICKS)]
    base_duration: u32,

    /// Ticks a phase change may wait for the intersection to clear
    #[arg(long, default_value_t = PENDING_TIMEOUT_TICKS)]
    pending_timeout: u32,

    /// Ticks of denied demand before a lane preempts the current phase
    #[arg(long, default_value_t = STARVATION_THRESHOLD_TICKS)]
    starvation_threshold: u32,
}

impl Cli {
    fn config(&self) -> SimConfig {
        SimConfig {
            timing: SignalTiming {
                base_duration: self.base_duration,
                pending_timeout: self.pending_timeout,
                starvation_threshold: self.starvation_threshold,
                ..SignalTiming::default()
            },
            ..SimConfig::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,intersection_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    ensure!(
        (0.0..=1.0).contains(&cli.spawn_chance),
        "spawn chance must be between 0 and 1, got {}",
        cli.spawn_chance
    );

    let world = SimWorld::with_config(cli.config(), cli.seed)
        .context("Invalid simulation configuration")?;
    run_headless(world, &cli);
    Ok(())
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(mut world: SimWorld, cli: &Cli) {
    info!("Running intersection simulation in headless mode...");
    info!(
        "Ticks: {}, spawn chance: {}, seed: {:?}",
        cli.ticks, cli.spawn_chance, cli.seed
    );

    for tick in 1..=cli.ticks {
        world.random_arrival(cli.spawn_chance);
        world.tick();

        if cli.report_every > 0 && tick % cli.report_every == 0 {
            println!("--- After tick {} ---", tick);
            world.print_summary();
            if cli.map {
                world.draw_map();
            }
            println!();

            if cli.pause_ms > 0 && tick < cli.ticks {
                std::thread::sleep(Duration::from_millis(cli.pause_ms));
            }
        }
    }

    log_final_stats(&world);
}

fn log_final_stats(world: &SimWorld) {
    let stats = world.stats();
    let scheduler = world.scheduler();

    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks simulated: {}", stats.ticks);
    info!("Total vehicles spawned: {}", stats.spawned);
    info!("Spawn requests rejected: {}", stats.rejected);
    info!("Vehicles exited: {}", stats.exited);
    info!("Active vehicles: {}", world.vehicle_count());
    info!("Turns completed: {}", stats.turns);
    info!("Phase switches: {}", scheduler.phase_switches());
    info!("Forced phase switches: {}", scheduler.forced_switches());
    info!(
        "Throughput: {:.1}%",
        if stats.spawned > 0 {
            (stats.exited as f64 / stats.spawned as f64) * 100.0
        } else {
            0.0
        }
    );
}
