#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks the point the direction indicator should aim at.
//!
//! With an empty car the indicator tracks the closest waiting passenger; with
//! a passenger aboard it tracks the assigned destination. The system holds no
//! state between frames, so hosts may call it at any cadence.

use taxi_dash_core::{
    DestinationId, DestinationView, PassengerId, PassengerState, PassengerView, Position,
};

/// Point the host should steer the player toward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GuidanceTarget {
    /// Aim at a waiting passenger to start the next fare.
    Passenger {
        /// Identifier of the closest waiting passenger.
        passenger: PassengerId,
        /// Where that passenger stands.
        position: Position,
        /// Straight-line distance from the car.
        distance: f32,
    },
    /// Aim at the delivery zone for the fare in progress.
    Destination {
        /// Identifier of the assigned destination.
        destination: DestinationId,
        /// Centre of the delivery zone.
        position: Position,
        /// Straight-line distance from the car.
        distance: f32,
    },
}

impl GuidanceTarget {
    /// Position component of the target, whichever variant it is.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::Passenger { position, .. } | Self::Destination { position, .. } => *position,
        }
    }
}

/// Direction-indicator system.
#[derive(Clone, Copy, Debug, Default)]
pub struct Guidance;

impl Guidance {
    /// Creates a new guidance system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolves the current navigation target, if one exists.
    ///
    /// Returns `None` when the street is empty or, mid-fare, when the
    /// assigned destination is missing from the view. Ties between
    /// equidistant passengers keep the first one in registry order.
    #[must_use]
    pub fn target(
        &self,
        car: Position,
        passenger_state: PassengerState,
        current_destination: Option<DestinationId>,
        passengers: &PassengerView,
        destinations: &DestinationView,
    ) -> Option<GuidanceTarget> {
        match passenger_state {
            PassengerState::WaitingForPassenger => {
                let mut best: Option<GuidanceTarget> = None;
                let mut best_distance = f32::MAX;
                for snapshot in passengers.iter() {
                    if snapshot.phase != taxi_dash_core::PassengerPhase::Waiting {
                        continue;
                    }
                    let distance = car.distance_to(snapshot.position);
                    if distance < best_distance {
                        best_distance = distance;
                        best = Some(GuidanceTarget::Passenger {
                            passenger: snapshot.id,
                            position: snapshot.position,
                            distance,
                        });
                    }
                }
                best
            }
            PassengerState::DeliveringPassenger => {
                let assigned = current_destination?;
                destinations
                    .iter()
                    .find(|snapshot| snapshot.id == assigned)
                    .map(|snapshot| GuidanceTarget::Destination {
                        destination: snapshot.id,
                        position: snapshot.position,
                        distance: car.distance_to(snapshot.position),
                    })
            }
        }
    }
}
