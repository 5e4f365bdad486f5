//! Scripted driver that steers the car toward the current guidance target.

use std::time::Duration;

use taxi_dash_core::Position;

/// Constant-speed car controlled by the autopilot.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Car {
    position: Position,
    speed: f32,
}

impl Car {
    pub(crate) fn new(position: Position, speed: f32) -> Self {
        Self { position, speed }
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    /// Steps straight toward the target, stopping exactly on it when the
    /// frame's travel distance overshoots. Without a target the car stays
    /// parked.
    pub(crate) fn advance(&mut self, target: Option<Position>, dt: Duration) {
        let Some(target) = target else {
            return;
        };

        let distance = self.position.distance_to(target);
        let step = self.speed * dt.as_secs_f32();
        if distance <= step || distance == 0.0 {
            self.position = target;
            return;
        }

        let fraction = step / distance;
        self.position = Position::new(
            self.position.x() + (target.x() - self.position.x()) * fraction,
            self.position.z() + (target.z() - self.position.z()) * fraction,
        );
    }
}
