//! Navigation collaborator.
//!
//! Path computation is out of scope. Agents steer through the [`Navigator`]
//! trait; hosts with a navmesh implement it over their pathfinder. The
//! bundled [`LinearNavigator`] walks straight lines, which is enough for
//! headless runs and tests.

use core::fmt;

use skirmish_types::Position;

/// Callback-style outcomes reported by [`Navigator::advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationEvent {
    /// The agent came within tolerance of its destination.
    DestinationReached(Position),
    /// The destination cannot be reached.
    NavigationFailed,
}

/// Moves an agent through the world.
pub trait Navigator: fmt::Debug {
    /// Current position.
    fn position(&self) -> Position;

    /// Current destination, `None` when idle.
    fn destination(&self) -> Option<Position>;

    /// Start (or redirect) a route toward `destination`.
    fn set_destination(&mut self, destination: Position);

    /// Set the speed multiplier.
    fn set_speed(&mut self, speed_factor: f32);

    /// Distance from the destination at which the route counts as done.
    fn set_destination_tolerance(&mut self, tolerance: f32);

    /// Pause or resume movement without dropping the route.
    fn set_paused(&mut self, paused: bool);

    /// Whether movement is paused.
    fn is_paused(&self) -> bool;

    /// Jump to `position` instantly.
    fn teleport(&mut self, position: Position);

    /// Abandon the current route.
    fn quit_route(&mut self);

    /// Advance movement by `delta_time` seconds.
    ///
    /// Hosts whose movement runs elsewhere keep the default, which reports
    /// nothing.
    fn advance(&mut self, delta_time: f32) -> Option<NavigationEvent> {
        let _ = delta_time;
        None
    }
}

/// Straight-line navigator moving at `base_speed * speed_factor`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearNavigator {
    position: Position,
    destination: Option<Position>,
    base_speed: f32,
    speed_factor: f32,
    tolerance: f32,
    paused: bool,
}

impl LinearNavigator {
    /// Create an idle navigator at `position`.
    pub fn new(position: Position, base_speed: f32) -> Self {
        Self {
            position,
            destination: None,
            base_speed: base_speed.max(0.0),
            speed_factor: 1.0,
            tolerance: 0.0,
            paused: false,
        }
    }

    /// Effective speed in world units per second.
    pub fn speed(&self) -> f32 {
        self.base_speed * self.speed_factor
    }

    /// Current arrival tolerance.
    pub const fn tolerance(&self) -> f32 {
        self.tolerance
    }
}

impl Navigator for LinearNavigator {
    fn position(&self) -> Position {
        self.position
    }

    fn destination(&self) -> Option<Position> {
        self.destination
    }

    fn set_destination(&mut self, destination: Position) {
        self.destination = Some(destination);
    }

    fn set_speed(&mut self, speed_factor: f32) {
        self.speed_factor = speed_factor.max(0.0);
    }

    fn set_destination_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance.max(0.0);
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn teleport(&mut self, position: Position) {
        self.position = position;
    }

    fn quit_route(&mut self) {
        self.destination = None;
    }

    fn advance(&mut self, delta_time: f32) -> Option<NavigationEvent> {
        if self.paused {
            return None;
        }
        let destination = self.destination?;
        let offset = destination - self.position;
        let remaining = offset.length();
        if !remaining.is_finite() {
            self.destination = None;
            return Some(NavigationEvent::NavigationFailed);
        }

        let step = self.speed() * delta_time.max(0.0);
        if step >= remaining {
            self.position = destination;
        } else {
            self.position = self.position + offset.normalized() * step;
        }

        let left = (destination - self.position).length();
        if left <= self.tolerance || left <= f32::EPSILON {
            self.destination = None;
            return Some(NavigationEvent::DestinationReached(destination));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_toward_destination_at_speed() {
        let mut nav = LinearNavigator::new(Position::ZERO, 2.0);
        nav.set_destination(Position::new(10.0, 0.0, 0.0));
        assert_eq!(nav.advance(1.0), None);
        assert!((nav.position().x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn reports_arrival_within_tolerance() {
        let mut nav = LinearNavigator::new(Position::ZERO, 1.0);
        nav.set_destination_tolerance(1.5);
        nav.set_destination(Position::new(2.0, 0.0, 0.0));
        let event = nav.advance(1.0);
        assert_eq!(
            event,
            Some(NavigationEvent::DestinationReached(Position::new(2.0, 0.0, 0.0)))
        );
        assert_eq!(nav.destination(), None);
    }

    #[test]
    fn paused_navigator_holds_position() {
        let mut nav = LinearNavigator::new(Position::ZERO, 5.0);
        nav.set_destination(Position::new(0.0, 0.0, 9.0));
        nav.set_paused(true);
        assert_eq!(nav.advance(1.0), None);
        assert_eq!(nav.position(), Position::ZERO);
    }

    #[test]
    fn speed_factor_scales_movement() {
        let mut nav = LinearNavigator::new(Position::ZERO, 2.0);
        nav.set_speed(0.5);
        nav.set_destination(Position::new(0.0, 0.0, 10.0));
        nav.advance(2.0);
        assert!((nav.position().z - 2.0).abs() < 1e-5);
    }
}
