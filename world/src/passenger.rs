//! Passenger entities and their patience lifecycle.

use std::time::Duration;

use taxi_dash_core::{DestinationId, PassengerId, PassengerPhase, PassengerSeed, Position};

/// A passenger stand placed once at world construction and reused forever.
///
/// Activation pulls the passenger out of the dormant pool and restarts the
/// patience countdown; deactivation returns it without destroying identity.
#[derive(Clone, Debug)]
pub(crate) struct Passenger {
    id: PassengerId,
    position: Position,
    pickup_radius: f32,
    max_patience: Duration,
    remaining_patience: Duration,
    active: bool,
    picked_up: bool,
    assigned_destination: Option<DestinationId>,
}

impl Passenger {
    pub(crate) fn from_seed(id: PassengerId, seed: PassengerSeed) -> Self {
        Self {
            id,
            position: seed.position,
            pickup_radius: seed.pickup_radius,
            max_patience: seed.max_patience,
            remaining_patience: seed.max_patience,
            active: false,
            picked_up: false,
            assigned_destination: None,
        }
    }

    pub(crate) fn id(&self) -> PassengerId {
        self.id
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn pickup_radius(&self) -> f32 {
        self.pickup_radius
    }

    pub(crate) fn max_patience(&self) -> Duration {
        self.max_patience
    }

    pub(crate) fn remaining_patience(&self) -> Duration {
        self.remaining_patience
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn is_picked_up(&self) -> bool {
        self.picked_up
    }

    pub(crate) fn assigned_destination(&self) -> Option<DestinationId> {
        self.assigned_destination
    }

    pub(crate) fn phase(&self) -> PassengerPhase {
        if self.picked_up {
            PassengerPhase::PickedUp
        } else if self.active {
            PassengerPhase::Waiting
        } else {
            PassengerPhase::Dormant
        }
    }

    /// Fraction of patience remaining, in `[0, 1]`.
    pub(crate) fn patience_ratio(&self) -> f32 {
        if self.max_patience.is_zero() {
            return 0.0;
        }
        self.remaining_patience.as_secs_f32() / self.max_patience.as_secs_f32()
    }

    /// Puts the passenger on the street with a full patience countdown.
    pub(crate) fn activate(&mut self) {
        self.active = true;
        self.picked_up = false;
        self.remaining_patience = self.max_patience;
    }

    /// Counts patience down while the passenger waits on the street.
    ///
    /// On reaching zero the passenger deactivates in place and `true` is
    /// returned. It does not remove itself from the active-waiting set; the
    /// spawn pool owns that bookkeeping.
    pub(crate) fn tick(&mut self, dt: Duration) -> bool {
        if !self.active || self.picked_up {
            return false;
        }

        self.remaining_patience = self.remaining_patience.saturating_sub(dt);
        if self.remaining_patience.is_zero() {
            self.active = false;
            return true;
        }
        false
    }

    /// Marks the passenger as riding in the taxi.
    ///
    /// Callers validate that the passenger is active and not already aboard;
    /// the patience countdown freezes from here until delivery.
    pub(crate) fn pick_up(&mut self) {
        self.picked_up = true;
    }

    /// Returns the passenger to the dormant pool. Idempotent.
    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.picked_up = false;
        self.assigned_destination = None;
    }

    /// Returns the passenger to the dormant pool with patience restored.
    /// Idempotent.
    pub(crate) fn reset(&mut self) {
        self.deactivate();
        self.remaining_patience = self.max_patience;
    }

    /// Pure setter; destination availability is the caller's responsibility.
    pub(crate) fn assign_destination(&mut self, destination: Option<DestinationId>) {
        self.assigned_destination = destination;
    }
}
