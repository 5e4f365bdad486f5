#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns taxi movement into pickup and delivery requests.
//!
//! The system compares the car position against every trigger zone each frame
//! and remembers which zones the car already occupies. Requests are emitted on
//! the entering edge only, so parking inside a zone produces exactly one
//! command and re-entering after leaving produces another.

use taxi_dash_core::{
    Command, DestinationId, DestinationView, PassengerId, PassengerPhase, PassengerState,
    PassengerView, Position,
};

/// Trigger-zone tracker that reuses its occupancy sets across frames.
#[derive(Debug, Default)]
pub struct Proximity {
    inside_pickup: Vec<PassengerId>,
    inside_delivery: Vec<DestinationId>,
    pickup_scratch: Vec<PassengerId>,
    delivery_scratch: Vec<DestinationId>,
}

impl Proximity {
    /// Creates a new proximity system with empty occupancy sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every zone the car was inside.
    ///
    /// Call on session boundaries so a car that starts a session inside a
    /// zone still triggers the entering edge.
    pub fn reset(&mut self) {
        self.inside_pickup.clear();
        self.inside_delivery.clear();
    }

    /// Compares the car position against all trigger zones and appends a
    /// command for every zone entered this frame.
    ///
    /// Pickup requests are only produced while the car is empty and only for
    /// waiting passengers; delivery requests only while a passenger is aboard
    /// and only for the active zone the session assigned. Occupancy tracking
    /// runs unconditionally so a state change mid-zone does not fire a stale
    /// entering edge.
    pub fn handle(
        &mut self,
        car: Position,
        passenger_state: PassengerState,
        current_destination: Option<DestinationId>,
        passengers: &PassengerView,
        destinations: &DestinationView,
        out: &mut Vec<Command>,
    ) {
        self.pickup_scratch.clear();
        for snapshot in passengers.iter() {
            if snapshot.phase != PassengerPhase::Waiting {
                continue;
            }
            if car.distance_to(snapshot.position) > snapshot.pickup_radius {
                continue;
            }

            self.pickup_scratch.push(snapshot.id);
            if passenger_state == PassengerState::WaitingForPassenger
                && !self.inside_pickup.contains(&snapshot.id)
            {
                out.push(Command::PickUpPassenger {
                    passenger: snapshot.id,
                });
            }
        }
        std::mem::swap(&mut self.inside_pickup, &mut self.pickup_scratch);

        self.delivery_scratch.clear();
        for snapshot in destinations.iter() {
            if car.distance_to(snapshot.position) > snapshot.delivery_radius {
                continue;
            }

            self.delivery_scratch.push(snapshot.id);
            if passenger_state == PassengerState::DeliveringPassenger
                && snapshot.active
                && current_destination == Some(snapshot.id)
                && !self.inside_delivery.contains(&snapshot.id)
            {
                out.push(Command::DeliverPassenger {
                    destination: snapshot.id,
                });
            }
        }
        std::mem::swap(&mut self.inside_delivery, &mut self.delivery_scratch);
    }
}
