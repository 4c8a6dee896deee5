mod config;
mod control;
mod device;
mod director;
mod drone;
mod rtk;
mod station;
mod transport;

use clap::Parser;
use config::StationConfig;
use control::ControlServer;
use station::Station;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "skyfleet")]
#[command(about = "Ground station for synchronized drone fleet flight")]
struct Args {
    /// Operator control plane address
    #[arg(short, long, default_value = "127.0.0.1:7700")]
    listen: String,

    /// Seed for the simulated survey-in
    #[arg(long)]
    seed: Option<u64>,

    /// Survey-in tick period in milliseconds
    #[arg(
        long,
        default_value_t = skyfleet_shared::tuning::SURVEY_IN_TICK_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    survey_tick_ms: u64,

    /// Horizontal convergence tolerance in meters
    #[arg(long, default_value_t = skyfleet_shared::tuning::ASSIGN_POSITION_TOLERANCE_M)]
    position_tolerance: f64,

    /// Heading convergence tolerance in degrees
    #[arg(long, default_value_t = skyfleet_shared::tuning::ASSIGN_HEADING_TOLERANCE_DEG)]
    heading_tolerance: f64,

    /// Position polls a simulated drone needs to reach its slot
    #[arg(long, default_value_t = 3)]
    settle_polls: u32,

    /// Drone id present in the simulated fleet (repeatable)
    #[arg(long = "drone")]
    drones: Vec<u32>,

    /// Serial device offered to operators (repeatable)
    #[arg(long = "device")]
    devices: Vec<String>,
}

impl Args {
    fn into_config(self) -> StationConfig {
        let mut config = StationConfig {
            listen_addr: self.listen,
            survey_in_tick: Duration::from_millis(self.survey_tick_ms),
            simulation_seed: self.seed,
            settle_polls: self.settle_polls,
            ..Default::default()
        };
        config.director.position_tolerance_m = self.position_tolerance;
        config.director.heading_tolerance_deg = self.heading_tolerance;
        if !self.devices.is_empty() {
            config.serial_devices = self.devices;
        }
        if !self.drones.is_empty() {
            config.simulated_drones = self.drones;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = Args::parse().into_config();
    config.validate()?;

    info!("Ground station starting");
    info!("  Control plane: {}", config.listen_addr);
    info!("  Serial devices: {}", config.serial_devices.join(", "));
    info!("  Simulated drones: {:?}", config.simulated_drones);
    info!(
        "  Tolerances: {:.2}m / {:.1}deg",
        config.director.position_tolerance_m, config.director.heading_tolerance_deg
    );

    let station = Arc::new(Station::simulated(&config));
    let server = ControlServer::bind(&config.listen_addr, station.clone()).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Control server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    station.shutdown().await;
    Ok(())
}
