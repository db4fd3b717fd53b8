use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;

use workout_core::cli::{print_history, print_workout_report};
use workout_core::sensor::{SensorState, StaticAuthorizer};
use workout_core::{
    display, load_config, metrics, request_authorization, FileStore, LiveWorkout, MetricChannel,
    SimulatedSensor, WorkoutConfig, WorkoutHistoryStore, WorkoutSessionController,
};

#[derive(Parser)]
#[command(name = "workout-cli", about = "Inspect and simulate recorded workouts")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List persisted workouts
    History {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run a scripted workout against a simulated sensor and persist it
    Simulate {
        #[arg(long)]
        store: PathBuf,
        #[arg(long, default_value_t = 6)]
        seconds: u64,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print prometheus counters
    Metrics,
}

fn config_from(path: Option<PathBuf>) -> anyhow::Result<WorkoutConfig> {
    match path {
        Some(p) => load_config(&p).with_context(|| format!("loading {}", p.display())),
        None => Ok(WorkoutConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::History { store, config } => {
            let cfg = config_from(config)?;
            let mut history = WorkoutHistoryStore::with_key(FileStore::new(store), cfg.history_key);
            print_history(history.load());
        }
        Commands::Simulate { store, seconds, config } => {
            let cfg = config_from(config)?;
            if seconds == 0 {
                bail!("--seconds must be at least 1");
            }
            request_authorization(&StaticAuthorizer { granted: true });

            let controller =
                WorkoutSessionController::new(SimulatedSensor::new(), FileStore::new(store), cfg);
            let (handle, task) = LiveWorkout::start(controller)?;

            let mut distance = 0.0;
            let mut steps = 0.0;
            for i in 1..=seconds {
                tokio::time::sleep(Duration::from_secs(1)).await;
                distance += 9.0 + (i % 3) as f64;
                steps += 3.0;
                handle.deliver_sample(MetricChannel::HeartRate, 110.0 + i as f64 * 1.7).await?;
                handle.deliver_sample(MetricChannel::ActiveCalories, i as f64 * 1.3).await?;
                handle.deliver_sample(MetricChannel::Distance, distance).await?;
                handle.deliver_sample(MetricChannel::Steps, steps).await?;

                // enheten pauser midt i økten
                if i == seconds / 2 {
                    handle.state_changed(SensorState::Running, SensorState::Paused).await?;
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    handle.state_changed(SensorState::Paused, SensorState::Running).await?;
                }
                let stats = handle.stats();
                info!(
                    "{} | {} | {}",
                    display::format_elapsed(stats.elapsed_seconds),
                    display::format_metric(stats.heart_rate, MetricChannel::HeartRate),
                    display::format_metric(
                        stats.active_calories,
                        MetricChannel::ActiveCalories
                    ),
                );
            }
            handle.end().await?;
            let record = task.await.context("workout task panicked")??;
            print_workout_report(&record);
        }
        Commands::Metrics => {
            print!("{}", metrics::gather_text());
        }
    }
    Ok(())
}
