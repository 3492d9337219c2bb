//! Display collaborator for vitals.

use core::fmt;

/// Receives `(current, max)` pushes whenever a displayed value changes.
///
/// Implemented by health bars, cooldown dials, or anything else that wants
/// to mirror a bounded value.
pub trait Meter: fmt::Debug {
    /// Show `value` out of `max`.
    fn set_meter(&mut self, value: f32, max: f32);
}
