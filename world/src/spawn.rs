//! Spawn pool management for the active-waiting passenger set.
//!
//! The pool keeps the number of waiting passengers within the configured
//! bounds, matches newly spawned passengers to destinations, and replaces
//! expired entries. Candidate selection is uniform-random over the eligible
//! set from a seeded ChaCha8 source, so identical seeds replay identically.

use std::time::Duration;

use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use taxi_dash_core::{DestinationId, PassengerId, SpawnConfig};
use tracing::{debug, warn};

use crate::{destination::Destination, passenger::Passenger};

/// Entities currently bound to the car, excluded from every spawn decision.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Transit {
    pub(crate) passenger: Option<PassengerId>,
    pub(crate) destination: Option<DestinationId>,
}

/// Result of an expiry sweep over the active-waiting set.
#[derive(Clone, Debug, Default)]
pub(crate) struct ExpirySweep {
    /// Passengers removed because their patience ran out.
    pub(crate) expired: Vec<PassengerId>,
    /// Replacements spawned under the instant-respawn policy.
    pub(crate) spawned: Vec<PassengerId>,
}

/// Owns the active-waiting set and all spawn-selection state.
#[derive(Debug)]
pub(crate) struct SpawnPool {
    config: SpawnConfig,
    active_waiting: Vec<PassengerId>,
    spawn_timer: Duration,
    rng: ChaCha8Rng,
}

impl SpawnPool {
    pub(crate) fn new(config: SpawnConfig) -> Self {
        Self {
            active_waiting: Vec::with_capacity(config.max_active_passengers),
            spawn_timer: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    pub(crate) fn waiting(&self) -> &[PassengerId] {
        &self.active_waiting
    }

    pub(crate) fn len(&self) -> usize {
        self.active_waiting.len()
    }

    pub(crate) fn contains(&self, passenger: PassengerId) -> bool {
        self.active_waiting.contains(&passenger)
    }

    pub(crate) fn instant_respawn(&self) -> bool {
        self.config.instant_respawn
    }

    pub(crate) fn max_active(&self) -> usize {
        self.config.max_active_passengers
    }

    /// Empties the set and restarts the top-up cadence. The RNG keeps its
    /// stream so successive sessions within one world stay reproducible.
    pub(crate) fn clear(&mut self) {
        self.active_waiting.clear();
        self.spawn_timer = Duration::ZERO;
    }

    /// Removes the passenger from the set, reporting whether it was a member.
    pub(crate) fn remove(&mut self, passenger: PassengerId) -> bool {
        match self.active_waiting.iter().position(|id| *id == passenger) {
            Some(index) => {
                let _ = self.active_waiting.remove(index);
                true
            }
            None => false,
        }
    }

    /// Activates one dormant passenger and adds it to the active-waiting set.
    ///
    /// Candidates are drawn uniformly from passengers that are neither
    /// waiting, nor aboard, nor already active. When the candidate pool is
    /// empty every passenger outside the set and the car is recycled with a
    /// forced reset. Starvation after the recycle is logged and reported as
    /// `None`; the pool stays under-populated until a later call succeeds.
    pub(crate) fn try_spawn_one(
        &mut self,
        passengers: &mut [Passenger],
        destinations: &[Destination],
        transit: Transit,
    ) -> Option<PassengerId> {
        if self.active_waiting.len() >= self.config.max_active_passengers {
            return None;
        }

        let mut candidates: Vec<PassengerId> = passengers
            .iter()
            .filter(|p| {
                !p.is_active()
                    && !p.is_picked_up()
                    && !self.contains(p.id())
                    && transit.passenger != Some(p.id())
            })
            .map(Passenger::id)
            .collect();

        if candidates.is_empty() {
            for passenger in passengers.iter_mut() {
                let id = passenger.id();
                if !self.contains(id) && transit.passenger != Some(id) {
                    passenger.reset();
                    candidates.push(id);
                }
            }
        }

        if candidates.is_empty() {
            warn!("no passenger available for spawn, pool stays under-populated");
            return None;
        }

        let chosen = candidates[self.rng.gen_range(0..candidates.len())];
        let assignment = self.choose_destination(passengers, destinations, transit);

        let passenger = &mut passengers[chosen.index()];
        passenger.assign_destination(assignment);
        passenger.activate();
        self.active_waiting.push(chosen);
        Some(chosen)
    }

    /// Picks a destination for a freshly spawned passenger.
    ///
    /// Uniqueness across the waiting set and the in-car delivery is a soft
    /// preference: when every destination is taken the choice falls back to
    /// the full registry, accepting duplicates.
    fn choose_destination(
        &mut self,
        passengers: &[Passenger],
        destinations: &[Destination],
        transit: Transit,
    ) -> Option<DestinationId> {
        if destinations.is_empty() {
            return None;
        }

        let used: Vec<DestinationId> = self
            .active_waiting
            .iter()
            .filter_map(|id| {
                passengers
                    .get(id.index())
                    .and_then(Passenger::assigned_destination)
            })
            .chain(transit.destination)
            .collect();

        let mut available: Vec<DestinationId> = destinations
            .iter()
            .map(Destination::id)
            .filter(|id| !used.contains(id))
            .collect();

        if available.is_empty() {
            debug!("no unique destination remains, permitting duplicate assignment");
            available = destinations.iter().map(Destination::id).collect();
        }

        Some(available[self.rng.gen_range(0..available.len())])
    }

    /// Accumulates tick time and tops the set up to the configured minimum
    /// once per check interval.
    pub(crate) fn periodic_top_up(
        &mut self,
        dt: Duration,
        passengers: &mut [Passenger],
        destinations: &[Destination],
        transit: Transit,
    ) -> Vec<PassengerId> {
        self.spawn_timer = self.spawn_timer.saturating_add(dt);
        if self.spawn_timer < self.config.spawn_check_interval {
            return Vec::new();
        }

        self.spawn_timer = Duration::ZERO;
        self.top_up_to_min(passengers, destinations, transit)
    }

    /// Spawns until the set reaches the configured minimum.
    pub(crate) fn top_up_to_min(
        &mut self,
        passengers: &mut [Passenger],
        destinations: &[Destination],
        transit: Transit,
    ) -> Vec<PassengerId> {
        self.spawn_up_to(self.config.min_active_passengers, passengers, destinations, transit)
    }

    /// Spawns until the set reaches the configured maximum.
    pub(crate) fn force_top_up(
        &mut self,
        passengers: &mut [Passenger],
        destinations: &[Destination],
        transit: Transit,
    ) -> Vec<PassengerId> {
        self.spawn_up_to(self.config.max_active_passengers, passengers, destinations, transit)
    }

    fn spawn_up_to(
        &mut self,
        target: usize,
        passengers: &mut [Passenger],
        destinations: &[Destination],
        transit: Transit,
    ) -> Vec<PassengerId> {
        let mut spawned = Vec::new();
        while self.active_waiting.len() < target {
            match self.try_spawn_one(passengers, destinations, transit) {
                Some(id) => spawned.push(id),
                None => break,
            }
        }
        spawned
    }

    /// Removes every member whose patience ran out, deactivating it. Under
    /// instant respawn each removal is backfilled with one replacement.
    pub(crate) fn check_expirations(
        &mut self,
        passengers: &mut [Passenger],
        destinations: &[Destination],
        transit: Transit,
    ) -> ExpirySweep {
        let expired: Vec<PassengerId> = self
            .active_waiting
            .iter()
            .filter(|id| {
                passengers
                    .get(id.index())
                    .is_some_and(|p| p.remaining_patience().is_zero())
            })
            .copied()
            .collect();

        let mut sweep = ExpirySweep::default();
        for id in expired {
            if let Some(passenger) = passengers.get_mut(id.index()) {
                passenger.deactivate();
            }
            let _ = self.remove(id);
            sweep.expired.push(id);

            if self.config.instant_respawn {
                if let Some(spawned) = self.try_spawn_one(passengers, destinations, transit) {
                    sweep.spawned.push(spawned);
                }
            }
        }
        sweep
    }
}
