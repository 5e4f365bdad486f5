//! Destination entities marking delivery zones.

use taxi_dash_core::{DestinationId, DestinationSeed, Position};

/// A delivery zone placed once at world construction.
///
/// Activation toggles delivery eligibility only; the proximity collaborator
/// decides when the taxi enters the zone. No internal timers.
#[derive(Clone, Debug)]
pub(crate) struct Destination {
    id: DestinationId,
    position: Position,
    delivery_radius: f32,
    active: bool,
}

impl Destination {
    pub(crate) fn from_seed(id: DestinationId, seed: DestinationSeed) -> Self {
        Self {
            id,
            position: seed.position,
            delivery_radius: seed.delivery_radius,
            active: false,
        }
    }

    pub(crate) fn id(&self) -> DestinationId {
        self.id
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn delivery_radius(&self) -> f32 {
        self.delivery_radius
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn activate(&mut self) {
        self.active = true;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }
}
