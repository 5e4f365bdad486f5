#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Taxi Dash engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level mode of the game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameState {
    /// No session is running; the player sits in the front-end menu.
    Menu,
    /// A session is running and the simulation clock is advancing.
    Playing,
    /// A session exists but the simulation clock is frozen.
    Paused,
    /// The session ended because the timer reached zero or was ended early.
    GameOver,
}

/// Occupancy state of the taxi during a running session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassengerState {
    /// The car is empty and any active-waiting passenger may be picked up.
    WaitingForPassenger,
    /// Exactly one passenger occupies the car; pickup is disabled.
    DeliveringPassenger,
}

/// Lifecycle phase a passenger occupies at any instant.
///
/// A passenger is in exactly one phase at a time; the world enforces the
/// transitions between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassengerPhase {
    /// Not placed in the world; available for a future spawn.
    Dormant,
    /// Spawned, visible, and counting down patience.
    Waiting,
    /// Riding in the taxi toward the assigned destination.
    PickedUp,
}

/// Unique identifier assigned to a passenger in the world registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PassengerId(u32);

impl PassengerId {
    /// Creates a new passenger identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the passenger within the world registry.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier assigned to a destination in the world registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DestinationId(u32);

impl DestinationId {
    /// Creates a new destination identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the destination within the world registry.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Ground-plane coordinate measured in world units.
///
/// The city is flat, so trigger zones and distances ignore elevation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    z: f32,
}

impl Position {
    /// Creates a new ground-plane position.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// East-west component of the position.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// North-south component of the position.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance_to(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Begins a fresh session from the menu or the game-over screen.
    StartGame,
    /// Tears the current session down and begins a fresh one from any state.
    RestartGame,
    /// Abandons the current session and returns to the menu.
    ReturnToMenu,
    /// Toggles between the playing and paused states.
    TogglePause,
    /// Ends the running session immediately, as if the timer expired.
    EndGame,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of real time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the identified passenger board the taxi.
    PickUpPassenger {
        /// Identifier of the passenger entering the car.
        passenger: PassengerId,
    },
    /// Requests delivery of the current passenger at the identified destination.
    DeliverPassenger {
        /// Identifier of the destination the taxi arrived at.
        destination: DestinationId,
    },
    /// Grants extra session time, clamped to the configured maximum.
    AddTime {
        /// Amount of time to add to the session clock.
        seconds: Duration,
    },
    /// Grants extra score outside the normal delivery economy.
    AddScore {
        /// Number of points to add to the session score.
        points: u32,
    },
    /// Spawns waiting passengers up to the configured maximum immediately.
    ForceSpawnPassengers,
}

/// Events broadcast by the world after processing commands.
///
/// Delivery is synchronous and ordered: events appear in the output buffer in
/// the order the world produced them, and the buffer is fully populated before
/// `apply` returns.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A fresh session began and the world was repopulated.
    GameStarted,
    /// The session clock changed, by ticking down or by a time grant.
    TimeChanged {
        /// Time remaining on the session clock.
        remaining: Duration,
    },
    /// The session score changed.
    ScoreChanged {
        /// Total score accumulated so far.
        score: u32,
    },
    /// The session clock crossed below the warning threshold.
    ///
    /// Fires once per crossing; granting time back above the threshold
    /// re-arms it.
    TimeWarning {
        /// Time remaining at the moment of the crossing.
        remaining: Duration,
    },
    /// A dormant passenger was placed into the active-waiting set.
    PassengerSpawned {
        /// Identifier of the passenger that spawned.
        passenger: PassengerId,
    },
    /// A waiting passenger ran out of patience and despawned.
    PassengerExpired {
        /// Identifier of the passenger that expired.
        passenger: PassengerId,
    },
    /// A waiting passenger boarded the taxi.
    PassengerPickedUp {
        /// Identifier of the passenger now riding in the car.
        passenger: PassengerId,
    },
    /// The current passenger was delivered at the assigned destination.
    PassengerDelivered {
        /// Points awarded for this delivery.
        score: u32,
        /// Session time granted for this delivery.
        bonus_time: Duration,
    },
    /// A pickup request was rejected and the world state is unchanged.
    PickUpRejected {
        /// Identifier of the passenger named in the request.
        passenger: PassengerId,
        /// Specific reason the pickup failed.
        reason: PickUpError,
    },
    /// A delivery request was rejected and the world state is unchanged.
    DeliveryRejected {
        /// Identifier of the destination named in the request.
        destination: DestinationId,
        /// Specific reason the delivery failed.
        reason: DeliveryError,
    },
    /// The session ended.
    GameOver {
        /// Score held at the moment the session ended.
        final_score: u32,
        /// Best score on record after the game-over comparison.
        high_score: u32,
    },
}

/// Reasons a pickup request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PickUpError {
    /// The car already carries a passenger.
    #[error("the car already carries a passenger")]
    CarOccupied,
    /// The passenger is not a member of the active-waiting set.
    #[error("the passenger is not waiting for pickup")]
    NotWaiting,
    /// No passenger with the provided identifier exists.
    #[error("no passenger with this identifier exists")]
    UnknownPassenger,
}

/// Reasons a delivery request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum DeliveryError {
    /// The car is empty, so there is nothing to deliver.
    #[error("no passenger is aboard the car")]
    NoPassengerAboard,
    /// The destination is not the one assigned to the current passenger.
    #[error("this is not the assigned destination")]
    WrongDestination,
    /// No destination with the provided identifier exists.
    #[error("no destination with this identifier exists")]
    UnknownDestination,
}

/// Static placement of a passenger stand in the world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassengerSeed {
    /// Where the passenger stands while waiting.
    pub position: Position,
    /// Full patience granted on each activation.
    pub max_patience: Duration,
    /// Radius of the trigger zone the taxi must enter to pick up.
    pub pickup_radius: f32,
}

impl PassengerSeed {
    /// Creates a seed with the default patience and pickup radius.
    #[must_use]
    pub const fn at(position: Position) -> Self {
        Self {
            position,
            max_patience: Duration::from_secs(30),
            pickup_radius: 5.0,
        }
    }
}

/// Static placement of a delivery zone in the world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DestinationSeed {
    /// Centre of the delivery zone.
    pub position: Position,
    /// Radius of the trigger zone the taxi must enter to deliver.
    pub delivery_radius: f32,
}

impl DestinationSeed {
    /// Creates a seed with the default delivery radius.
    #[must_use]
    pub const fn at(position: Position) -> Self {
        Self {
            position,
            delivery_radius: 8.0,
        }
    }
}

/// Timer and scoring parameters of a session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Time on the clock when a session begins.
    pub starting_time: Duration,
    /// Upper clamp applied whenever time is granted.
    pub max_time: Duration,
    /// Clock value below which the one-shot time warning fires.
    pub time_warning_threshold: Duration,
    /// Score awarded for a delivery before the patience bonus.
    pub base_delivery_score: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_time: Duration::from_secs(60),
            max_time: Duration::from_secs(120),
            time_warning_threshold: Duration::from_secs(15),
            base_delivery_score: 100,
        }
    }
}

/// Bounds and cadence governing the active-waiting passenger pool.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Largest number of passengers allowed to wait simultaneously.
    pub max_active_passengers: usize,
    /// Smallest number of passengers the periodic top-up maintains.
    pub min_active_passengers: usize,
    /// Interval between periodic top-up checks.
    pub spawn_check_interval: Duration,
    /// Whether pickups and expiries trigger an immediate replacement spawn.
    pub instant_respawn: bool,
    /// Seed for the random source used in spawn selection.
    pub rng_seed: u64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            max_active_passengers: 5,
            min_active_passengers: 3,
            spawn_check_interval: Duration::from_secs(2),
            instant_respawn: true,
            rng_seed: 0x5eed_cab5_d15b_a7c4,
        }
    }
}

/// Immutable representation of a single passenger's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassengerSnapshot {
    /// Unique identifier assigned to the passenger.
    pub id: PassengerId,
    /// Where the passenger stands while waiting.
    pub position: Position,
    /// Radius of the pickup trigger zone.
    pub pickup_radius: f32,
    /// Lifecycle phase at the time of capture.
    pub phase: PassengerPhase,
    /// Patience left on the countdown.
    pub remaining_patience: Duration,
    /// Full patience granted on activation.
    pub max_patience: Duration,
    /// Destination assigned for the next delivery, if any.
    pub assigned_destination: Option<DestinationId>,
}

/// Read-only snapshot describing every passenger in the registry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassengerView {
    snapshots: Vec<PassengerSnapshot>,
}

impl PassengerView {
    /// Creates a view from pre-captured snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<PassengerSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &PassengerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PassengerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single destination's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DestinationSnapshot {
    /// Unique identifier assigned to the destination.
    pub id: DestinationId,
    /// Centre of the delivery zone.
    pub position: Position,
    /// Radius of the delivery trigger zone.
    pub delivery_radius: f32,
    /// Whether the zone currently accepts a delivery.
    pub active: bool,
}

/// Read-only snapshot describing every destination in the registry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DestinationView {
    snapshots: Vec<DestinationSnapshot>,
}

impl DestinationView {
    /// Creates a view from pre-captured snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<DestinationSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &DestinationSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<DestinationSnapshot> {
        self.snapshots
    }
}

/// Synchronous best-effort storage for the single persisted scalar.
///
/// The world reads the stored value during the game-over comparison and
/// writes back only when the session score exceeds it. Implementations must
/// never fail the caller: a write that cannot complete is logged and dropped.
pub trait HighScoreStore: fmt::Debug {
    /// Returns the best score on record, or zero when none exists.
    fn load(&self) -> u32;

    /// Records a new best score.
    fn store(&mut self, score: u32);
}

/// In-memory high-score store used by tests and headless sessions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryHighScoreStore {
    best: u32,
}

impl MemoryHighScoreStore {
    /// Creates a store pre-populated with an existing best score.
    #[must_use]
    pub const fn with_best(best: u32) -> Self {
        Self { best }
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&self) -> u32 {
        self.best
    }

    fn store(&mut self, score: u32) {
        self.best = score;
    }
}
