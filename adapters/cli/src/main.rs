#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter for Taxi Dash.
//!
//! Composes the world with the proximity and guidance systems and drives a
//! complete session with a scripted autopilot: every frame the car steers
//! toward the current guidance target, trigger-zone crossings become pickup
//! and delivery commands, and world events are rendered as log lines.

mod autopilot;
mod highscore;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use taxi_dash_core::{
    Command, DestinationSeed, Event, GameState, PassengerSeed, Position, SessionConfig,
    SpawnConfig,
};
use taxi_dash_system_guidance::Guidance;
use taxi_dash_system_proximity::Proximity;
use taxi_dash_world::{apply, query, World};

use autopilot::Car;
use highscore::FileHighScoreStore;

/// Command-line arguments accepted by the Taxi Dash runner.
#[derive(Debug, Parser)]
#[command(name = "taxi-dash", about = "Runs a headless Taxi Dash session")]
struct Args {
    /// TOML file overriding the session and spawn settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// File that persists the high score between runs.
    #[arg(long, default_value = "taxi-dash-highscore.toml")]
    high_score_file: PathBuf,

    /// Spawn-selection seed, overriding the config file.
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated frame length in milliseconds.
    #[arg(long, default_value_t = 50)]
    frame_ms: u64,

    /// Autopilot driving speed in world units per second.
    #[arg(long, default_value_t = 40.0)]
    car_speed: f32,

    /// Frame budget after which the session is ended early.
    #[arg(long, default_value_t = 20_000)]
    max_frames: u64,
}

/// Session settings section of the config file, in whole seconds.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionSection {
    starting_time_secs: u64,
    max_time_secs: u64,
    time_warning_secs: u64,
    base_delivery_score: u32,
}

impl Default for SessionSection {
    fn default() -> Self {
        let config = SessionConfig::default();
        Self {
            starting_time_secs: config.starting_time.as_secs(),
            max_time_secs: config.max_time.as_secs(),
            time_warning_secs: config.time_warning_threshold.as_secs(),
            base_delivery_score: config.base_delivery_score,
        }
    }
}

impl SessionSection {
    fn into_config(self) -> SessionConfig {
        SessionConfig {
            starting_time: Duration::from_secs(self.starting_time_secs),
            max_time: Duration::from_secs(self.max_time_secs),
            time_warning_threshold: Duration::from_secs(self.time_warning_secs),
            base_delivery_score: self.base_delivery_score,
        }
    }
}

/// Spawn settings section of the config file.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SpawnSection {
    max_active_passengers: usize,
    min_active_passengers: usize,
    spawn_check_interval_secs: u64,
    instant_respawn: bool,
    rng_seed: u64,
}

impl Default for SpawnSection {
    fn default() -> Self {
        let config = SpawnConfig::default();
        Self {
            max_active_passengers: config.max_active_passengers,
            min_active_passengers: config.min_active_passengers,
            spawn_check_interval_secs: config.spawn_check_interval.as_secs(),
            instant_respawn: config.instant_respawn,
            rng_seed: config.rng_seed,
        }
    }
}

impl SpawnSection {
    fn into_config(self) -> SpawnConfig {
        SpawnConfig {
            max_active_passengers: self.max_active_passengers,
            min_active_passengers: self.min_active_passengers,
            spawn_check_interval: Duration::from_secs(self.spawn_check_interval_secs),
            instant_respawn: self.instant_respawn,
            rng_seed: self.rng_seed,
        }
    }
}

/// Root of the optional TOML config file.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    session: SessionSection,
    spawn: SpawnSection,
}

fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

/// Fixed city layout: passenger stands on an outer ring, delivery zones on
/// an inner ring so every fare crosses town.
fn city_seeds() -> (Vec<PassengerSeed>, Vec<DestinationSeed>) {
    let passengers = (0..12)
        .map(|index| {
            let angle = index as f32 * (std::f32::consts::TAU / 12.0);
            PassengerSeed::at(Position::new(angle.cos() * 150.0, angle.sin() * 150.0))
        })
        .collect();
    let destinations = (0..8)
        .map(|index| {
            let angle = index as f32 * (std::f32::consts::TAU / 8.0) + 0.3;
            DestinationSeed::at(Position::new(angle.cos() * 60.0, angle.sin() * 60.0))
        })
        .collect();
    (passengers, destinations)
}

fn report(event: &Event) {
    match event {
        Event::GameStarted => info!("session started"),
        Event::TimeChanged { remaining } => {
            debug!(remaining_secs = remaining.as_secs_f32(), "clock updated");
        }
        Event::ScoreChanged { score } => info!(score, "score updated"),
        Event::TimeWarning { remaining } => {
            warn!(remaining_secs = remaining.as_secs_f32(), "time running out");
        }
        Event::PassengerSpawned { passenger } => {
            debug!(passenger = passenger.get(), "passenger spawned");
        }
        Event::PassengerExpired { passenger } => {
            info!(passenger = passenger.get(), "passenger gave up waiting");
        }
        Event::PassengerPickedUp { passenger } => {
            info!(passenger = passenger.get(), "passenger aboard");
        }
        Event::PassengerDelivered { score, bonus_time } => {
            info!(
                fare = score,
                bonus_secs = bonus_time.as_secs_f32(),
                "passenger delivered"
            );
        }
        Event::PickUpRejected { passenger, reason } => {
            debug!(passenger = passenger.get(), %reason, "pickup rejected");
        }
        Event::DeliveryRejected { destination, reason } => {
            debug!(destination = destination.get(), %reason, "delivery rejected");
        }
        Event::GameOver {
            final_score,
            high_score,
        } => info!(final_score, high_score, "session over"),
    }
}

fn report_all(events: &mut Vec<Event>) {
    for event in events.drain(..) {
        report(&event);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let session_config = config.session.into_config();
    let mut spawn_config = config.spawn.into_config();
    if let Some(seed) = args.seed {
        spawn_config.rng_seed = seed;
    }

    let (passenger_seeds, destination_seeds) = city_seeds();
    let mut world = World::new(
        passenger_seeds,
        destination_seeds,
        session_config,
        spawn_config,
        Box::new(FileHighScoreStore::new(args.high_score_file.clone())),
    );
    let mut proximity = Proximity::new();
    let guidance = Guidance::new();
    let mut car = Car::new(Position::new(0.0, 0.0), args.car_speed);
    let dt = Duration::from_millis(args.frame_ms.max(1));

    let mut events = Vec::new();
    let mut commands = Vec::new();

    apply(&mut world, Command::StartGame, &mut events);
    proximity.reset();
    report_all(&mut events);

    let mut frames = 0_u64;
    while query::game_state(&world) == GameState::Playing {
        if frames >= args.max_frames {
            info!(frames, "frame budget exhausted, ending session");
            apply(&mut world, Command::EndGame, &mut events);
            report_all(&mut events);
            break;
        }
        frames += 1;

        let target = guidance.target(
            car.position(),
            query::passenger_state(&world),
            query::current_destination(&world),
            &query::passenger_view(&world),
            &query::destination_view(&world),
        );
        car.advance(target.map(|target| target.position()), dt);

        proximity.handle(
            car.position(),
            query::passenger_state(&world),
            query::current_destination(&world),
            &query::passenger_view(&world),
            &query::destination_view(&world),
            &mut commands,
        );
        for command in commands.drain(..) {
            apply(&mut world, command, &mut events);
            report_all(&mut events);
        }

        apply(&mut world, Command::Tick { dt }, &mut events);
        report_all(&mut events);
    }

    info!(
        frames,
        score = query::current_score(&world),
        deliveries = query::deliveries_completed(&world),
        high_score = query::high_score(&world),
        "session complete"
    );
    Ok(())
}

/// Entry point for the Taxi Dash command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    run(&args)
}
