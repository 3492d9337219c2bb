//! Finite-state machine with a dense state table.
//!
//! A [`StateMachine`] owns one behavior object per state key, stored in a
//! `Vec` indexed by [`StateKey::index`]. The active key selects which
//! behavior receives [`State::tick`].
//!
//! # Re-entrancy
//!
//! Hooks ([`State::entered`], [`State::exited`], [`State::tick`]) receive
//! only a caller-supplied context, never the machine itself. A hook that
//! wants another transition (or any other side effect on the wider world)
//! records it in the context; the owner applies it right after the call
//! returns, still inside the same synchronous call chain. Nested
//! transitions therefore happen in order and never observe a half-updated
//! machine.

use core::fmt;

/// Errors from state table construction and lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    /// A key has no behavior registered for it.
    #[error("no behavior registered for state {key}")]
    MissingState {
        /// Debug rendering of the key.
        key: String,
    },

    /// A key's index falls outside the table.
    #[error("state {key} maps to index {index}, outside a table of {len} states")]
    IndexOutOfRange {
        /// Debug rendering of the key.
        key: String,
        /// The offending index.
        index: usize,
        /// Size of the table.
        len: usize,
    },
}

/// A closed set of state keys usable as a dense table index.
///
/// Implementors must list every key in [`Self::ALL`] such that
/// `ALL[k.index()] == k`.
pub trait StateKey: Copy + Eq + fmt::Debug + 'static {
    /// Every key, ordered by index.
    const ALL: &'static [Self];

    /// Position of this key in [`Self::ALL`].
    fn index(self) -> usize;
}

/// Receives the machine's state-changed notification.
///
/// Raised after the new state's [`State::entered`] hook has run.
pub trait TransitionObserver<K> {
    /// The active state changed from `from` to `to`.
    fn state_changed(&mut self, from: K, to: K);
}

impl<K> TransitionObserver<K> for () {
    fn state_changed(&mut self, _from: K, _to: K) {}
}

/// A behavior object driven by a [`StateMachine`].
pub trait State<C: ?Sized> {
    /// The machine switched to this state.
    fn entered(&mut self, ctx: &mut C);

    /// The machine is leaving this state.
    fn exited(&mut self, ctx: &mut C);

    /// Per-frame update while this state is active.
    fn tick(&mut self, ctx: &mut C, delta_time: f32) {
        let _ = (ctx, delta_time);
    }
}

/// Finite-state machine mapping every key of `K` to a behavior `S`.
#[derive(Debug, Clone)]
pub struct StateMachine<K, S> {
    states: Vec<S>,
    current: K,
}

impl<K: StateKey, S> StateMachine<K, S> {
    /// Build the table by calling `build` once per key.
    ///
    /// Exhaustive by construction: every key gets a behavior.
    pub fn from_fn<F>(initial: K, build: F) -> Self
    where
        F: FnMut(K) -> S,
    {
        let states = K::ALL.iter().copied().map(build).collect();
        Self {
            states,
            current: initial,
        }
    }

    /// Build the table from explicit `(key, behavior)` pairs.
    ///
    /// Later pairs replace earlier ones for the same key. Fails when any key
    /// is left without a behavior.
    pub fn with_states<I>(initial: K, pairs: I) -> Result<Self, MachineError>
    where
        I: IntoIterator<Item = (K, S)>,
    {
        let len = K::ALL.len();
        let mut slots: Vec<Option<S>> = K::ALL.iter().map(|_| None).collect();
        for (key, state) in pairs {
            let index = key.index();
            let slot = slots.get_mut(index).ok_or_else(|| MachineError::IndexOutOfRange {
                key: format!("{key:?}"),
                index,
                len,
            })?;
            *slot = Some(state);
        }

        let mut states = Vec::with_capacity(len);
        for (key, slot) in K::ALL.iter().zip(slots) {
            let state = slot.ok_or_else(|| MachineError::MissingState {
                key: format!("{key:?}"),
            })?;
            states.push(state);
        }

        Ok(Self {
            states,
            current: initial,
        })
    }

    /// The active key.
    pub const fn current(&self) -> K {
        self.current
    }

    /// The active behavior.
    pub fn active(&self) -> Option<&S> {
        self.states.get(self.current.index())
    }

    /// The active behavior, mutably.
    pub fn active_mut(&mut self) -> Option<&mut S> {
        self.states.get_mut(self.current.index())
    }

    /// The behavior registered for `key`.
    pub fn state(&self, key: K) -> Result<&S, MachineError> {
        let len = self.states.len();
        self.states
            .get(key.index())
            .ok_or_else(|| missing(key, len))
    }

    /// The behavior registered for `key`, mutably.
    pub fn state_mut(&mut self, key: K) -> Result<&mut S, MachineError> {
        let len = self.states.len();
        self.states
            .get_mut(key.index())
            .ok_or_else(|| missing(key, len))
    }

    /// Every `(key, behavior)` pair in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut S)> {
        K::ALL.iter().copied().zip(self.states.iter_mut())
    }

    /// Run the initial state's `entered` hook.
    ///
    /// Construction does not enter the initial state; the owner calls this
    /// once the surrounding world is ready. No state-changed notification
    /// is raised.
    pub fn activate<C>(&mut self, ctx: &mut C) -> Result<(), MachineError>
    where
        C: ?Sized,
        S: State<C>,
    {
        let key = self.current;
        self.state_mut(key)?.entered(ctx);
        Ok(())
    }

    /// Switch to `key`.
    ///
    /// No-op returning `Ok(false)` when `key` is already active. Otherwise
    /// runs `exited` on the old behavior, updates the key, runs `entered` on
    /// the new behavior and finally notifies the observer.
    pub fn set_state<C>(&mut self, key: K, ctx: &mut C) -> Result<bool, MachineError>
    where
        C: TransitionObserver<K> + ?Sized,
        S: State<C>,
    {
        if key == self.current {
            return Ok(false);
        }
        // Validate before running any hook so a bad key leaves no trace.
        self.state(key)?;

        let from = self.current;
        if let Some(old) = self.states.get_mut(from.index()) {
            old.exited(ctx);
        }
        self.current = key;
        self.state_mut(key)?.entered(ctx);
        ctx.state_changed(from, key);
        Ok(true)
    }

    /// Run the active behavior's `exited` hook, then `between` on that
    /// behavior, then its `entered` hook.
    ///
    /// The key does not change and the observer is not notified. Used when
    /// the active behavior's parameters change under it and its hooks must
    /// undo and redo their work.
    pub fn reenter<C, F, R>(&mut self, ctx: &mut C, between: F) -> Result<R, MachineError>
    where
        C: ?Sized,
        S: State<C>,
        F: FnOnce(&mut S) -> R,
    {
        let key = self.current;
        let active = self.state_mut(key)?;
        active.exited(ctx);
        let outcome = between(active);
        active.entered(ctx);
        Ok(outcome)
    }

    /// Forward a frame to the active behavior.
    pub fn tick<C>(&mut self, ctx: &mut C, delta_time: f32)
    where
        C: ?Sized,
        S: State<C>,
    {
        if let Some(active) = self.active_mut() {
            active.tick(ctx, delta_time);
        }
    }
}

fn missing<K: StateKey>(key: K, len: usize) -> MachineError {
    MachineError::IndexOutOfRange {
        key: format!("{key:?}"),
        index: key.index(),
        len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
        Amber,
    }

    impl StateKey for Light {
        const ALL: &'static [Self] = &[Self::Red, Self::Green, Self::Amber];

        fn index(self) -> usize {
            self as usize
        }
    }

    #[derive(Debug, Default)]
    struct Log {
        hooks: Vec<String>,
        changes: Vec<(Light, Light)>,
    }

    impl TransitionObserver<Light> for Log {
        fn state_changed(&mut self, from: Light, to: Light) {
            self.changes.push((from, to));
        }
    }

    #[derive(Debug)]
    struct Lamp {
        key: Light,
        ticks: u32,
    }

    impl State<Log> for Lamp {
        fn entered(&mut self, ctx: &mut Log) {
            ctx.hooks.push(format!("enter {:?}", self.key));
        }

        fn exited(&mut self, ctx: &mut Log) {
            ctx.hooks.push(format!("exit {:?}", self.key));
        }

        fn tick(&mut self, _ctx: &mut Log, _delta_time: f32) {
            self.ticks = self.ticks.saturating_add(1);
        }
    }

    fn lamps() -> StateMachine<Light, Lamp> {
        StateMachine::from_fn(Light::Red, |key| Lamp { key, ticks: 0 })
    }

    #[test]
    fn transition_runs_exit_then_enter_then_notifies() {
        let mut machine = lamps();
        let mut log = Log::default();

        let changed = machine.set_state(Light::Green, &mut log);
        assert_eq!(changed, Ok(true));
        assert_eq!(machine.current(), Light::Green);
        assert_eq!(log.hooks, vec!["exit Red", "enter Green"]);
        assert_eq!(log.changes, vec![(Light::Red, Light::Green)]);
    }

    #[test]
    fn setting_the_same_state_is_a_no_op() {
        let mut machine = lamps();
        let mut log = Log::default();

        assert_eq!(machine.set_state(Light::Red, &mut log), Ok(false));
        assert!(log.hooks.is_empty());
        assert!(log.changes.is_empty());
    }

    #[test]
    fn reenter_wraps_the_change_in_exit_and_enter() {
        let mut machine = lamps();
        let mut log = Log::default();
        let _ = machine.set_state(Light::Green, &mut log);
        log.hooks.clear();
        log.changes.clear();

        let outcome = machine.reenter(&mut log, |lamp| {
            lamp.ticks = 7;
            lamp.key
        });
        assert_eq!(outcome, Ok(Light::Green));
        assert_eq!(machine.current(), Light::Green);
        assert_eq!(log.hooks, vec!["exit Green", "enter Green"]);
        assert!(log.changes.is_empty());
        assert_eq!(machine.state(Light::Green).map(|s| s.ticks), Ok(7));
    }

    #[test]
    fn tick_reaches_only_the_active_state() {
        let mut machine = lamps();
        let mut log = Log::default();
        machine.tick(&mut log, 0.1);
        let _ = machine.set_state(Light::Amber, &mut log);
        machine.tick(&mut log, 0.1);
        machine.tick(&mut log, 0.1);

        assert_eq!(machine.state(Light::Red).map(|s| s.ticks), Ok(1));
        assert_eq!(machine.state(Light::Amber).map(|s| s.ticks), Ok(2));
        assert_eq!(machine.state(Light::Green).map(|s| s.ticks), Ok(0));
    }

    #[test]
    fn activate_enters_initial_without_notifying() {
        let mut machine = lamps();
        let mut log = Log::default();
        assert!(machine.activate(&mut log).is_ok());
        assert_eq!(log.hooks, vec!["enter Red"]);
        assert!(log.changes.is_empty());
    }

    #[test]
    fn missing_state_is_a_configuration_error() {
        let result = StateMachine::with_states(
            Light::Red,
            [
                (Light::Red, Lamp { key: Light::Red, ticks: 0 }),
                (Light::Green, Lamp { key: Light::Green, ticks: 0 }),
            ],
        );
        assert!(matches!(
            result,
            Err(MachineError::MissingState { ref key }) if key == "Amber"
        ));
    }

    #[test]
    fn with_states_accepts_a_complete_table() {
        let machine = StateMachine::with_states(
            Light::Amber,
            Light::ALL.iter().map(|&key| (key, Lamp { key, ticks: 0 })),
        );
        assert!(machine.is_ok_and(|m| m.active().is_some_and(|s| s.key == Light::Amber)));
    }
}
