//! Defeat/destruction subscriptions and weak target slots.
//!
//! Targets are never owned. A behavior that tracks a target holds its ID in
//! a [`TargetSlot`] and registers a [`Listener`] for that ID in the shared
//! [`Subscriptions`] registry. When the target is defeated or destroyed the
//! simulation takes the listener list for it and notifies each listener in
//! registration order.
//!
//! [`TargetSlot::rebind`] is the only way a slot changes target while
//! subscribed: it unsubscribes from the old target and subscribes to the new
//! one in a single step, so a slot and its registration never drift apart.

use std::collections::BTreeMap;

use skirmish_types::{AgentId, EntityRef, TeamId};

use crate::kinds::StateKind;

/// Who wants to hear about an entity's defeat or destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    /// The roster of a team, for automatic de-registration.
    Roster(TeamId),
    /// A targeted behavior of an agent.
    Behavior {
        /// The agent holding the target.
        agent: AgentId,
        /// The state whose behavior holds the target.
        state: StateKind,
    },
}

/// Registry of listeners keyed by the entity they watch.
#[derive(Debug, Clone, Default)]
pub struct Subscriptions {
    by_target: BTreeMap<EntityRef, Vec<Listener>>,
}

impl Subscriptions {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            by_target: BTreeMap::new(),
        }
    }

    /// Register `listener` for `target`. Returns `false` if it already was.
    pub fn subscribe(&mut self, target: EntityRef, listener: Listener) -> bool {
        let listeners = self.by_target.entry(target).or_default();
        if listeners.contains(&listener) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Remove `listener` from `target`. Returns `false` if it was not there.
    pub fn unsubscribe(&mut self, target: EntityRef, listener: Listener) -> bool {
        let Some(listeners) = self.by_target.get_mut(&target) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|l| *l != listener);
        let removed = listeners.len() < before;
        if listeners.is_empty() {
            self.by_target.remove(&target);
        }
        removed
    }

    /// Listeners registered for `target`, in registration order.
    pub fn listeners(&self, target: EntityRef) -> &[Listener] {
        self.by_target.get(&target).map_or(&[], Vec::as_slice)
    }

    /// Whether `listener` is registered for `target`.
    pub fn is_subscribed(&self, target: EntityRef, listener: Listener) -> bool {
        self.listeners(target).contains(&listener)
    }

    /// Remove and return every listener for `target`.
    ///
    /// Used when `target` is defeated or destroyed: the returned list is a
    /// snapshot, so listeners may subscribe and unsubscribe freely while it
    /// is being walked.
    pub fn take(&mut self, target: EntityRef) -> Vec<Listener> {
        self.by_target.remove(&target).unwrap_or_default()
    }

    /// Number of `(target, listener)` registrations.
    pub fn len(&self) -> usize {
        self.by_target.values().map(Vec::len).sum()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

/// A weak reference to a target of type `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSlot<T> {
    target: Option<T>,
}

impl<T> Default for TargetSlot<T> {
    fn default() -> Self {
        Self { target: None }
    }
}

impl<T> TargetSlot<T>
where
    T: Copy + PartialEq + Into<EntityRef>,
{
    /// An empty slot.
    pub const fn empty() -> Self {
        Self { target: None }
    }

    /// The current target.
    pub const fn get(&self) -> Option<T> {
        self.target
    }

    /// Point the slot at `target`, moving `listener`'s registration along.
    ///
    /// Unsubscribes from the previous target (if any) before subscribing to
    /// the new one. Rebinding to the current target is a no-op. Returns
    /// whether the target changed.
    pub fn rebind(
        &mut self,
        target: Option<T>,
        subscriptions: &mut Subscriptions,
        listener: Listener,
    ) -> bool {
        if self.target == target {
            return false;
        }
        if let Some(previous) = self.target.take() {
            subscriptions.unsubscribe(previous.into(), listener);
        }
        if let Some(next) = target {
            subscriptions.subscribe(next.into(), listener);
        }
        self.target = target;
        true
    }

    /// Clear the slot if it still points at `lost`, without touching the
    /// registry. The caller already removed the registration.
    pub fn forget(&mut self, lost: T) -> bool {
        if self.target == Some(lost) {
            self.target = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn behavior_listener(agent: AgentId) -> Listener {
        Listener::Behavior {
            agent,
            state: StateKind::AttackingUnit,
        }
    }

    #[test]
    fn rebind_moves_registration() {
        let mut subs = Subscriptions::new();
        let holder = AgentId::new();
        let first = AgentId::new();
        let second = AgentId::new();
        let listener = behavior_listener(holder);
        let mut slot = TargetSlot::empty();

        assert!(slot.rebind(Some(first), &mut subs, listener));
        assert!(subs.is_subscribed(first.into(), listener));

        assert!(slot.rebind(Some(second), &mut subs, listener));
        assert!(!subs.is_subscribed(first.into(), listener));
        assert!(subs.is_subscribed(second.into(), listener));
        assert_eq!(subs.len(), 1);

        assert!(slot.rebind(None, &mut subs, listener));
        assert!(subs.is_empty());
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn rebind_to_same_target_is_a_no_op() {
        let mut subs = Subscriptions::new();
        let target = AgentId::new();
        let listener = behavior_listener(AgentId::new());
        let mut slot = TargetSlot::empty();
        slot.rebind(Some(target), &mut subs, listener);
        assert!(!slot.rebind(Some(target), &mut subs, listener));
        assert_eq!(subs.listeners(target.into()).len(), 1);
    }

    #[test]
    fn take_preserves_registration_order() {
        let mut subs = Subscriptions::new();
        let target = EntityRef::Agent(AgentId::new());
        let roster = Listener::Roster(TeamId(1));
        let hunter = behavior_listener(AgentId::new());
        subs.subscribe(target, roster);
        subs.subscribe(target, hunter);
        assert!(!subs.subscribe(target, roster));

        assert_eq!(subs.take(target), vec![roster, hunter]);
        assert!(subs.listeners(target).is_empty());
    }

    #[test]
    fn forget_ignores_stale_targets() {
        let mut subs = Subscriptions::new();
        let current = AgentId::new();
        let mut slot = TargetSlot::empty();
        slot.rebind(Some(current), &mut subs, behavior_listener(AgentId::new()));
        assert!(!slot.forget(AgentId::new()));
        assert!(slot.forget(current));
        assert_eq!(slot.get(), None);
    }
}
