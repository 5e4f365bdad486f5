#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Taxi Dash.
//!
//! The world owns the passenger and destination registries, the spawn pool,
//! and the session coordinator. Adapters and systems never mutate this state
//! directly: they submit [`Command`] values through [`apply`] and read back
//! through the [`query`] module. Every precondition violation degrades to a
//! no-op plus a rejection event and a diagnostic log, never a panic.

mod destination;
mod passenger;
mod spawn;

use std::time::Duration;

use taxi_dash_core::{
    Command, DeliveryError, DestinationId, DestinationSeed, Event, GameState, HighScoreStore,
    PassengerId, PassengerSeed, PassengerState, PickUpError, SessionConfig, SpawnConfig,
};
use tracing::{debug, warn};

use destination::Destination;
use passenger::Passenger;
use spawn::{SpawnPool, Transit};

/// Session time granted for a delivery before the patience bonus.
const BASE_BONUS_TIME_SECS: f32 = 10.0;
/// Additional bonus time scaled by the patience remaining at delivery.
const PATIENCE_BONUS_TIME_SECS: f32 = 5.0;

/// Mutable session variables reset wholesale when a game begins.
#[derive(Debug)]
struct Session {
    game_state: GameState,
    passenger_state: PassengerState,
    current_time: Duration,
    current_score: u32,
    deliveries_completed: u32,
    current_passenger: Option<PassengerId>,
    current_destination: Option<DestinationId>,
    time_warning_fired: bool,
}

impl Session {
    fn idle(config: &SessionConfig) -> Self {
        Self {
            game_state: GameState::Menu,
            passenger_state: PassengerState::WaitingForPassenger,
            current_time: config.starting_time,
            current_score: 0,
            deliveries_completed: 0,
            current_passenger: None,
            current_destination: None,
            time_warning_fired: false,
        }
    }
}

/// Represents the authoritative Taxi Dash world state.
#[derive(Debug)]
pub struct World {
    session: Session,
    session_config: SessionConfig,
    passengers: Vec<Passenger>,
    destinations: Vec<Destination>,
    pool: SpawnPool,
    high_scores: Box<dyn HighScoreStore>,
}

impl World {
    /// Creates a new world from static entity placements.
    ///
    /// Registries are fixed for the lifetime of the world; sessions activate
    /// and deactivate entities in place. The high-score store is injected so
    /// hosts decide where the single persisted scalar lives.
    #[must_use]
    pub fn new(
        passenger_seeds: Vec<PassengerSeed>,
        destination_seeds: Vec<DestinationSeed>,
        session_config: SessionConfig,
        spawn_config: SpawnConfig,
        high_scores: Box<dyn HighScoreStore>,
    ) -> Self {
        let passengers: Vec<Passenger> = passenger_seeds
            .into_iter()
            .enumerate()
            .map(|(index, seed)| Passenger::from_seed(PassengerId::new(index as u32), seed))
            .collect();
        let destinations: Vec<Destination> = destination_seeds
            .into_iter()
            .enumerate()
            .map(|(index, seed)| Destination::from_seed(DestinationId::new(index as u32), seed))
            .collect();

        debug!(
            passengers = passengers.len(),
            destinations = destinations.len(),
            "world constructed"
        );

        Self {
            session: Session::idle(&session_config),
            pool: SpawnPool::new(spawn_config),
            session_config,
            passengers,
            destinations,
            high_scores,
        }
    }

    fn transit(&self) -> Transit {
        Transit {
            passenger: self.session.current_passenger,
            destination: self.session.current_destination,
        }
    }

    fn dorm_everyone(&mut self) {
        for passenger in &mut self.passengers {
            passenger.reset();
        }
        for destination in &mut self.destinations {
            destination.deactivate();
        }
        self.pool.clear();
    }

    fn begin_session(&mut self, out_events: &mut Vec<Event>) {
        self.session = Session::idle(&self.session_config);
        self.session.game_state = GameState::Playing;
        self.dorm_everyone();

        out_events.push(Event::GameStarted);
        out_events.push(Event::TimeChanged {
            remaining: self.session.current_time,
        });
        out_events.push(Event::ScoreChanged { score: 0 });

        let transit = self.transit();
        let spawned = self
            .pool
            .force_top_up(&mut self.passengers, &self.destinations, transit);
        push_spawned(out_events, &spawned);
        debug!(waiting = self.pool.len(), "session started");
    }

    fn start_game(&mut self, out_events: &mut Vec<Event>) {
        match self.session.game_state {
            GameState::Menu | GameState::GameOver => self.begin_session(out_events),
            other => debug!(state = ?other, "start requested mid-session, ignoring"),
        }
    }

    fn return_to_menu(&mut self) {
        self.session = Session::idle(&self.session_config);
        self.dorm_everyone();
    }

    fn toggle_pause(&mut self) {
        self.session.game_state = match self.session.game_state {
            GameState::Playing => GameState::Paused,
            GameState::Paused => GameState::Playing,
            other => {
                debug!(state = ?other, "pause toggle outside a session, ignoring");
                other
            }
        };
    }

    fn end_game(&mut self, out_events: &mut Vec<Event>) {
        if self.session.game_state == GameState::Playing {
            self.finish_session(out_events);
        } else {
            debug!(state = ?self.session.game_state, "end requested outside play, ignoring");
        }
    }

    fn finish_session(&mut self, out_events: &mut Vec<Event>) {
        self.session.game_state = GameState::GameOver;
        let final_score = self.session.current_score;
        let previous_best = self.high_scores.load();
        if final_score > previous_best {
            self.high_scores.store(final_score);
        }
        out_events.push(Event::GameOver {
            final_score,
            high_score: previous_best.max(final_score),
        });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.session.game_state != GameState::Playing {
            return;
        }

        self.session.current_time = self.session.current_time.saturating_sub(dt);
        out_events.push(Event::TimeChanged {
            remaining: self.session.current_time,
        });

        if !self.session.time_warning_fired
            && self.session.current_time <= self.session_config.time_warning_threshold
        {
            self.session.time_warning_fired = true;
            out_events.push(Event::TimeWarning {
                remaining: self.session.current_time,
            });
        }

        if self.session.current_time.is_zero() {
            self.finish_session(out_events);
            return;
        }

        for id in self.pool.waiting().to_vec() {
            if let Some(passenger) = self.passengers.get_mut(id.index()) {
                // Expired members stay in the set until the sweep below.
                let _ = passenger.tick(dt);
            }
        }

        let transit = self.transit();
        let spawned =
            self.pool
                .periodic_top_up(dt, &mut self.passengers, &self.destinations, transit);
        push_spawned(out_events, &spawned);

        let sweep = self
            .pool
            .check_expirations(&mut self.passengers, &self.destinations, transit);
        for id in sweep.expired {
            out_events.push(Event::PassengerExpired { passenger: id });
        }
        push_spawned(out_events, &sweep.spawned);
    }

    fn pick_up_passenger(&mut self, passenger: PassengerId, out_events: &mut Vec<Event>) {
        if self.session.passenger_state != PassengerState::WaitingForPassenger {
            debug!(passenger = passenger.get(), "pickup rejected: car occupied");
            out_events.push(Event::PickUpRejected {
                passenger,
                reason: PickUpError::CarOccupied,
            });
            return;
        }

        if self.passengers.get(passenger.index()).is_none() {
            debug!(passenger = passenger.get(), "pickup rejected: unknown id");
            out_events.push(Event::PickUpRejected {
                passenger,
                reason: PickUpError::UnknownPassenger,
            });
            return;
        }

        if !self.pool.contains(passenger) {
            debug!(passenger = passenger.get(), "pickup rejected: not waiting");
            out_events.push(Event::PickUpRejected {
                passenger,
                reason: PickUpError::NotWaiting,
            });
            return;
        }

        let _ = self.pool.remove(passenger);
        self.session.current_passenger = Some(passenger);
        self.session.passenger_state = PassengerState::DeliveringPassenger;

        let assigned = match self.passengers.get_mut(passenger.index()) {
            Some(boarding) => {
                boarding.pick_up();
                boarding.assigned_destination()
            }
            None => None,
        };
        self.session.current_destination = assigned;
        if let Some(id) = assigned {
            if let Some(destination) = self.destinations.get_mut(id.index()) {
                destination.activate();
            }
        }

        out_events.push(Event::PassengerPickedUp { passenger });

        if self.pool.instant_respawn() && self.pool.len() < self.pool.max_active() {
            let transit = self.transit();
            if let Some(id) =
                self.pool
                    .try_spawn_one(&mut self.passengers, &self.destinations, transit)
            {
                out_events.push(Event::PassengerSpawned { passenger: id });
            }
        }
    }

    fn deliver_passenger(&mut self, destination: DestinationId, out_events: &mut Vec<Event>) {
        if self.session.passenger_state != PassengerState::DeliveringPassenger {
            debug!(
                destination = destination.get(),
                "delivery rejected: car empty"
            );
            out_events.push(Event::DeliveryRejected {
                destination,
                reason: DeliveryError::NoPassengerAboard,
            });
            return;
        }

        if self.destinations.get(destination.index()).is_none() {
            debug!(
                destination = destination.get(),
                "delivery rejected: unknown id"
            );
            out_events.push(Event::DeliveryRejected {
                destination,
                reason: DeliveryError::UnknownDestination,
            });
            return;
        }

        if self.session.current_destination != Some(destination) {
            debug!(
                destination = destination.get(),
                "delivery rejected: wrong destination"
            );
            out_events.push(Event::DeliveryRejected {
                destination,
                reason: DeliveryError::WrongDestination,
            });
            return;
        }

        let Some(passenger_id) = self.session.current_passenger else {
            // Unreachable while the delivering-implies-passenger invariant
            // holds; recover to the empty-car state rather than panic.
            warn!("delivering state without a passenger aboard, recovering");
            self.session.passenger_state = PassengerState::WaitingForPassenger;
            self.session.current_destination = None;
            return;
        };

        let ratio = self
            .passengers
            .get(passenger_id.index())
            .map_or(0.0, Passenger::patience_ratio);
        let base = self.session_config.base_delivery_score;
        let score_gain = base.saturating_add((base as f32 * ratio).round() as u32);
        let bonus_time =
            Duration::from_secs_f32(BASE_BONUS_TIME_SECS + PATIENCE_BONUS_TIME_SECS * ratio);

        self.session.current_score = self.session.current_score.saturating_add(score_gain);
        self.grant_time(bonus_time);
        self.session.deliveries_completed += 1;

        if let Some(zone) = self.destinations.get_mut(destination.index()) {
            zone.deactivate();
        }
        if let Some(delivered) = self.passengers.get_mut(passenger_id.index()) {
            delivered.reset();
        }
        self.session.current_passenger = None;
        self.session.current_destination = None;
        self.session.passenger_state = PassengerState::WaitingForPassenger;

        out_events.push(Event::ScoreChanged {
            score: self.session.current_score,
        });
        out_events.push(Event::TimeChanged {
            remaining: self.session.current_time,
        });
        out_events.push(Event::PassengerDelivered {
            score: score_gain,
            bonus_time,
        });

        let transit = self.transit();
        let spawned = self
            .pool
            .top_up_to_min(&mut self.passengers, &self.destinations, transit);
        push_spawned(out_events, &spawned);
    }

    fn grant_time(&mut self, amount: Duration) {
        let raised = self.session.current_time.saturating_add(amount);
        self.session.current_time = raised.min(self.session_config.max_time);
        if self.session.current_time > self.session_config.time_warning_threshold {
            // Re-arm the one-shot warning for the next crossing.
            self.session.time_warning_fired = false;
        }
    }

    fn add_time(&mut self, seconds: Duration, out_events: &mut Vec<Event>) {
        self.grant_time(seconds);
        out_events.push(Event::TimeChanged {
            remaining: self.session.current_time,
        });
    }

    fn add_score(&mut self, points: u32, out_events: &mut Vec<Event>) {
        self.session.current_score = self.session.current_score.saturating_add(points);
        out_events.push(Event::ScoreChanged {
            score: self.session.current_score,
        });
    }

    fn force_spawn_passengers(&mut self, out_events: &mut Vec<Event>) {
        let transit = self.transit();
        let spawned = self
            .pool
            .force_top_up(&mut self.passengers, &self.destinations, transit);
        push_spawned(out_events, &spawned);
    }
}

fn push_spawned(out_events: &mut Vec<Event>, spawned: &[PassengerId]) {
    for id in spawned {
        out_events.push(Event::PassengerSpawned { passenger: *id });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartGame => world.start_game(out_events),
        Command::RestartGame => world.begin_session(out_events),
        Command::ReturnToMenu => world.return_to_menu(),
        Command::TogglePause => world.toggle_pause(),
        Command::EndGame => world.end_game(out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::PickUpPassenger { passenger } => world.pick_up_passenger(passenger, out_events),
        Command::DeliverPassenger { destination } => {
            world.deliver_passenger(destination, out_events);
        }
        Command::AddTime { seconds } => world.add_time(seconds, out_events),
        Command::AddScore { points } => world.add_score(points, out_events),
        Command::ForceSpawnPassengers => world.force_spawn_passengers(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use taxi_dash_core::{
        DestinationId, DestinationSnapshot, DestinationView, GameState, PassengerId,
        PassengerSnapshot, PassengerState, PassengerView, Position,
    };

    use super::World;

    /// Current top-level mode of the game session.
    #[must_use]
    pub fn game_state(world: &World) -> GameState {
        world.session.game_state
    }

    /// Current occupancy state of the taxi.
    #[must_use]
    pub fn passenger_state(world: &World) -> PassengerState {
        world.session.passenger_state
    }

    /// Time remaining on the session clock.
    #[must_use]
    pub fn current_time(world: &World) -> Duration {
        world.session.current_time
    }

    /// Score accumulated in the running session.
    #[must_use]
    pub fn current_score(world: &World) -> u32 {
        world.session.current_score
    }

    /// Number of deliveries completed in the running session.
    #[must_use]
    pub fn deliveries_completed(world: &World) -> u32 {
        world.session.deliveries_completed
    }

    /// Passenger riding in the car, if any.
    #[must_use]
    pub fn current_passenger(world: &World) -> Option<PassengerId> {
        world.session.current_passenger
    }

    /// Destination the car is delivering to, if any.
    #[must_use]
    pub fn current_destination(world: &World) -> Option<DestinationId> {
        world.session.current_destination
    }

    /// Identifiers of passengers currently waiting on the street, in spawn
    /// order.
    #[must_use]
    pub fn active_waiting(world: &World) -> Vec<PassengerId> {
        world.pool.waiting().to_vec()
    }

    /// Number of passengers currently waiting on the street.
    #[must_use]
    pub fn active_waiting_count(world: &World) -> usize {
        world.pool.len()
    }

    /// Best score on record in the injected store.
    #[must_use]
    pub fn high_score(world: &World) -> u32 {
        world.high_scores.load()
    }

    /// Waiting passenger closest to the provided position.
    ///
    /// Linear scan in set order; ties keep the first encountered minimum.
    #[must_use]
    pub fn nearest_passenger(world: &World, from: Position) -> Option<PassengerId> {
        let mut nearest = None;
        let mut nearest_distance = f32::MAX;
        for id in world.pool.waiting() {
            let Some(passenger) = world.passengers.get(id.index()) else {
                continue;
            };
            if !passenger.is_active() {
                continue;
            }
            let distance = from.distance_to(passenger.position());
            if distance < nearest_distance {
                nearest_distance = distance;
                nearest = Some(*id);
            }
        }
        nearest
    }

    /// Captures a read-only view of every passenger in the registry.
    #[must_use]
    pub fn passenger_view(world: &World) -> PassengerView {
        PassengerView::from_snapshots(
            world
                .passengers
                .iter()
                .map(|passenger| PassengerSnapshot {
                    id: passenger.id(),
                    position: passenger.position(),
                    pickup_radius: passenger.pickup_radius(),
                    phase: passenger.phase(),
                    remaining_patience: passenger.remaining_patience(),
                    max_patience: passenger.max_patience(),
                    assigned_destination: passenger.assigned_destination(),
                })
                .collect(),
        )
    }

    /// Captures a read-only view of every destination in the registry.
    #[must_use]
    pub fn destination_view(world: &World) -> DestinationView {
        DestinationView::from_snapshots(
            world
                .destinations
                .iter()
                .map(|destination| DestinationSnapshot {
                    id: destination.id(),
                    position: destination.position(),
                    delivery_radius: destination.delivery_radius(),
                    active: destination.is_active(),
                })
                .collect(),
        )
    }

    /// Snapshot of a single destination, if the handle is valid.
    #[must_use]
    pub fn destination_snapshot(
        world: &World,
        destination: DestinationId,
    ) -> Option<DestinationSnapshot> {
        world
            .destinations
            .get(destination.index())
            .map(|zone| DestinationSnapshot {
                id: zone.id(),
                position: zone.position(),
                delivery_radius: zone.delivery_radius(),
                active: zone.is_active(),
            })
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_dash_core::{MemoryHighScoreStore, Position};

    fn seeds() -> (Vec<PassengerSeed>, Vec<DestinationSeed>) {
        let passengers = (0..8)
            .map(|index| PassengerSeed::at(Position::new(index as f32 * 20.0, 0.0)))
            .collect();
        let destinations = (0..6)
            .map(|index| DestinationSeed::at(Position::new(0.0, 50.0 + index as f32 * 30.0)))
            .collect();
        (passengers, destinations)
    }

    fn demo_world(rng_seed: u64) -> World {
        let (passengers, destinations) = seeds();
        World::new(
            passengers,
            destinations,
            SessionConfig::default(),
            SpawnConfig {
                rng_seed,
                ..SpawnConfig::default()
            },
            Box::new(MemoryHighScoreStore::default()),
        )
    }

    fn start(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::StartGame, &mut events);
        events
    }

    #[test]
    fn start_game_populates_to_maximum() {
        let mut world = demo_world(1);
        let events = start(&mut world);

        assert_eq!(query::game_state(&world), GameState::Playing);
        assert_eq!(query::active_waiting_count(&world), 5);
        assert_eq!(query::current_time(&world), Duration::from_secs(60));
        let spawns = events
            .iter()
            .filter(|event| matches!(event, Event::PassengerSpawned { .. }))
            .count();
        assert_eq!(spawns, 5);
        assert!(events.contains(&Event::GameStarted));
    }

    #[test]
    fn delivery_scoring_matches_patience_formula() {
        let mut world = demo_world(2);
        let _ = start(&mut world);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(15),
            },
            &mut events,
        );

        let passenger = query::active_waiting(&world)[0];
        events.clear();
        apply(&mut world, Command::PickUpPassenger { passenger }, &mut events);
        assert!(events.contains(&Event::PassengerPickedUp { passenger }));

        let destination = query::current_destination(&world).expect("assigned destination");
        events.clear();
        apply(&mut world, Command::DeliverPassenger { destination }, &mut events);

        // Picked up at 15 of 30 seconds patience: 100 * (1 + 0.5) = 150
        // points and 10 + 5 * 0.5 = 12.5 seconds of bonus time.
        assert!(events.contains(&Event::PassengerDelivered {
            score: 150,
            bonus_time: Duration::from_millis(12_500),
        }));
        assert_eq!(query::current_score(&world), 150);
        assert_eq!(query::deliveries_completed(&world), 1);
        assert_eq!(
            query::current_time(&world),
            Duration::from_millis(57_500),
            "45 s remaining plus the 12.5 s bonus"
        );
        assert_eq!(
            query::passenger_state(&world),
            PassengerState::WaitingForPassenger
        );
        assert!(query::current_passenger(&world).is_none());
    }

    #[test]
    fn pickup_moves_passenger_out_of_waiting_set() {
        let mut world = demo_world(3);
        let _ = start(&mut world);

        let passenger = query::active_waiting(&world)[2];
        let mut events = Vec::new();
        apply(&mut world, Command::PickUpPassenger { passenger }, &mut events);

        assert_eq!(query::current_passenger(&world), Some(passenger));
        assert!(!query::active_waiting(&world).contains(&passenger));
        assert_eq!(
            query::passenger_state(&world),
            PassengerState::DeliveringPassenger
        );
        // Instant respawn keeps the street full while the car is occupied.
        assert_eq!(query::active_waiting_count(&world), 5);

        let destination = query::current_destination(&world).expect("assigned destination");
        let zone = query::destination_snapshot(&world, destination).expect("valid handle");
        assert!(zone.active, "assigned destination activates on pickup");
    }

    #[test]
    fn pickup_of_non_waiting_passenger_is_rejected() {
        let mut world = demo_world(4);
        let _ = start(&mut world);

        let waiting = query::active_waiting(&world);
        let dormant = (0..8)
            .map(PassengerId::new)
            .find(|id| !waiting.contains(id))
            .expect("some passenger is dormant");

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PickUpPassenger { passenger: dormant },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::PickUpRejected {
                passenger: dormant,
                reason: PickUpError::NotWaiting,
            }]
        );
        assert!(query::current_passenger(&world).is_none());
        assert_eq!(query::active_waiting(&world), waiting);
    }

    #[test]
    fn second_pickup_is_rejected_while_delivering() {
        let mut world = demo_world(5);
        let _ = start(&mut world);

        let first = query::active_waiting(&world)[0];
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PickUpPassenger { passenger: first },
            &mut events,
        );

        let second = query::active_waiting(&world)[0];
        events.clear();
        apply(
            &mut world,
            Command::PickUpPassenger { passenger: second },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::PickUpRejected {
                passenger: second,
                reason: PickUpError::CarOccupied,
            }]
        );
        assert_eq!(query::current_passenger(&world), Some(first));
    }

    #[test]
    fn delivery_at_wrong_destination_is_rejected() {
        let mut world = demo_world(6);
        let _ = start(&mut world);

        let passenger = query::active_waiting(&world)[0];
        let mut events = Vec::new();
        apply(&mut world, Command::PickUpPassenger { passenger }, &mut events);

        let assigned = query::current_destination(&world).expect("assigned destination");
        let wrong = (0..6)
            .map(DestinationId::new)
            .find(|id| *id != assigned)
            .expect("another destination exists");

        events.clear();
        apply(
            &mut world,
            Command::DeliverPassenger { destination: wrong },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::DeliveryRejected {
                destination: wrong,
                reason: DeliveryError::WrongDestination,
            }]
        );
        assert_eq!(query::current_passenger(&world), Some(passenger));
        assert_eq!(query::deliveries_completed(&world), 0);
    }

    #[test]
    fn delivery_with_empty_car_is_rejected() {
        let mut world = demo_world(7);
        let _ = start(&mut world);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DeliverPassenger {
                destination: DestinationId::new(0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::DeliveryRejected {
                destination: DestinationId::new(0),
                reason: DeliveryError::NoPassengerAboard,
            }]
        );
    }

    #[test]
    fn expired_passenger_is_replaced_instantly() {
        let mut world = demo_world(8);
        let _ = start(&mut world);

        let before = query::active_waiting(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(31),
            },
            &mut events,
        );

        let expired = events
            .iter()
            .filter(|event| matches!(event, Event::PassengerExpired { .. }))
            .count();
        let respawned = events
            .iter()
            .filter(|event| matches!(event, Event::PassengerSpawned { .. }))
            .count();
        assert_eq!(expired, before.len(), "every waiting passenger timed out");
        assert_eq!(respawned, expired, "instant respawn backfills each expiry");
        assert_eq!(query::active_waiting_count(&world), 5);
    }

    #[test]
    fn time_warning_fires_once_per_crossing() {
        let mut world = demo_world(9);
        let _ = start(&mut world);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(46),
            },
            &mut events,
        );
        let warnings = |events: &[Event]| {
            events
                .iter()
                .filter(|event| matches!(event, Event::TimeWarning { .. }))
                .count()
        };
        assert_eq!(warnings(&events), 1, "crossing below 15 s warns once");

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        assert_eq!(warnings(&events), 0, "latched while below the threshold");

        events.clear();
        apply(
            &mut world,
            Command::AddTime {
                seconds: Duration::from_secs(30),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(29),
            },
            &mut events,
        );
        assert_eq!(warnings(&events), 1, "re-arms after rising above threshold");
    }

    #[test]
    fn timer_expiry_finishes_the_session_once() {
        let mut world = demo_world(10);
        let _ = start(&mut world);

        let mut events = Vec::new();
        apply(&mut world, Command::AddScore { points: 300 }, &mut events);

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(120),
            },
            &mut events,
        );

        assert_eq!(query::game_state(&world), GameState::GameOver);
        assert_eq!(query::current_time(&world), Duration::ZERO);
        assert!(events.contains(&Event::GameOver {
            final_score: 300,
            high_score: 300,
        }));
        assert_eq!(query::high_score(&world), 300);

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(5),
            },
            &mut events,
        );
        assert!(events.is_empty(), "ticks after game over are inert");
        assert_eq!(query::game_state(&world), GameState::GameOver);
    }

    #[test]
    fn high_score_survives_a_worse_follow_up_session() {
        let mut world = demo_world(11);
        let _ = start(&mut world);

        let mut events = Vec::new();
        apply(&mut world, Command::AddScore { points: 500 }, &mut events);
        apply(&mut world, Command::EndGame, &mut events);
        assert_eq!(query::high_score(&world), 500);

        let _ = start(&mut world);
        events.clear();
        apply(&mut world, Command::AddScore { points: 100 }, &mut events);
        apply(&mut world, Command::EndGame, &mut events);

        assert!(events.contains(&Event::GameOver {
            final_score: 100,
            high_score: 500,
        }));
        assert_eq!(query::high_score(&world), 500);
    }

    #[test]
    fn pause_freezes_the_simulation_clock() {
        let mut world = demo_world(12);
        let _ = start(&mut world);
        let frozen = query::current_time(&world);

        let mut events = Vec::new();
        apply(&mut world, Command::TogglePause, &mut events);
        assert_eq!(query::game_state(&world), GameState::Paused);

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(10),
            },
            &mut events,
        );
        assert_eq!(query::current_time(&world), frozen);
        assert!(events.is_empty());

        apply(&mut world, Command::TogglePause, &mut events);
        assert_eq!(query::game_state(&world), GameState::Playing);
    }

    #[test]
    fn added_time_clamps_to_maximum() {
        let mut world = demo_world(13);
        let _ = start(&mut world);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AddTime {
                seconds: Duration::from_secs(600),
            },
            &mut events,
        );

        assert_eq!(query::current_time(&world), Duration::from_secs(120));
        assert!(events.contains(&Event::TimeChanged {
            remaining: Duration::from_secs(120),
        }));
    }

    #[test]
    fn return_to_menu_dorms_every_entity() {
        let mut world = demo_world(14);
        let _ = start(&mut world);

        let passenger = query::active_waiting(&world)[0];
        let mut events = Vec::new();
        apply(&mut world, Command::PickUpPassenger { passenger }, &mut events);

        apply(&mut world, Command::ReturnToMenu, &mut events);

        assert_eq!(query::game_state(&world), GameState::Menu);
        assert_eq!(query::active_waiting_count(&world), 0);
        assert!(query::current_passenger(&world).is_none());
        for snapshot in query::passenger_view(&world).iter() {
            assert_eq!(snapshot.phase, taxi_dash_core::PassengerPhase::Dormant);
        }
        for snapshot in query::destination_view(&world).iter() {
            assert!(!snapshot.active);
        }
    }

    #[test]
    fn nearest_passenger_keeps_first_encountered_minimum() {
        let passengers = vec![
            PassengerSeed::at(Position::new(10.0, 0.0)),
            PassengerSeed::at(Position::new(-10.0, 0.0)),
            PassengerSeed::at(Position::new(30.0, 0.0)),
        ];
        let destinations = vec![DestinationSeed::at(Position::new(0.0, 100.0))];
        let mut world = World::new(
            passengers,
            destinations,
            SessionConfig::default(),
            SpawnConfig {
                max_active_passengers: 3,
                min_active_passengers: 3,
                rng_seed: 15,
                ..SpawnConfig::default()
            },
            Box::new(MemoryHighScoreStore::default()),
        );
        let _ = start(&mut world);

        // Equidistant candidates: the one spawned first wins the tie.
        let nearest = query::nearest_passenger(&world, Position::new(0.0, 0.0))
            .expect("waiting passengers exist");
        let first_equidistant = query::active_waiting(&world)
            .into_iter()
            .find(|id| id.index() < 2)
            .expect("an equidistant passenger is waiting");
        assert_eq!(nearest, first_equidistant);
    }

    #[test]
    fn force_spawn_fills_the_street() {
        let (passengers, destinations) = seeds();
        let mut world = World::new(
            passengers,
            destinations,
            SessionConfig::default(),
            SpawnConfig {
                instant_respawn: false,
                rng_seed: 16,
                ..SpawnConfig::default()
            },
            Box::new(MemoryHighScoreStore::default()),
        );
        let _ = start(&mut world);

        // Without instant respawn the expiry sweep leaves the street empty.
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(31),
            },
            &mut events,
        );
        assert_eq!(query::active_waiting_count(&world), 0);

        events.clear();
        apply(&mut world, Command::ForceSpawnPassengers, &mut events);
        assert_eq!(query::active_waiting_count(&world), 5);
        let spawns = events
            .iter()
            .filter(|event| matches!(event, Event::PassengerSpawned { .. }))
            .count();
        assert_eq!(spawns, 5);
    }

    #[test]
    fn start_is_ignored_mid_session() {
        let mut world = demo_world(17);
        let _ = start(&mut world);

        let mut events = Vec::new();
        apply(&mut world, Command::AddScore { points: 50 }, &mut events);

        events.clear();
        apply(&mut world, Command::StartGame, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::current_score(&world), 50, "session kept its state");
    }
}
