use std::sync::Arc;

use derive_where::derive_where;
use rustc_hash::FxHashSet;

use crate::{Referent, ReferentId, Strong, WeakRef, notifier::ReclaimSender};

// === Slot === //

/// The unit of storage of a [`WeakList`](crate::WeakList). One slot occupies one position.
#[derive_where(Clone)]
pub(crate) enum Slot<V: Referent> {
    Tracked(WeakRef<V::Target>),
    Permanent(V),
}

impl<V: Referent> Slot<V> {
    /// Converts `value` into a slot, registering `sender` for its reclamation if it is tracked.
    ///
    /// Registration is idempotent per sender, so repeated insertions of one value share a single
    /// notification.
    pub fn new(value: V, sender: &Arc<ReclaimSender>) -> Self {
        let Some(strong) = value.as_tracked() else {
            tracing::trace!("value cannot be observed weakly, holding it permanently");
            return Slot::Permanent(value);
        };

        Strong::watch(strong, sender);
        Slot::Tracked(Strong::downgrade(strong))
    }

    /// Dereferences the slot, returning `None` if it refers to a reclaimed value.
    pub fn resolve(&self) -> Option<V> {
        match self {
            Slot::Tracked(handle) => handle.upgrade().map(V::from_tracked),
            Slot::Permanent(value) => Some(value.clone()),
        }
    }

    pub fn is_reclaimed_by(&self, reclaimed: &FxHashSet<ReferentId>) -> bool {
        match self {
            Slot::Tracked(handle) => reclaimed.contains(&handle.id()),
            Slot::Permanent(_) => false,
        }
    }
}

// === Probe === //

/// A comparison key built from a value, matching slots by the identity of their referent.
pub(crate) enum Probe<'a, V: Referent> {
    Tracked(ReferentId),
    Permanent(&'a V),
}

impl<'a, V: Referent> Probe<'a, V> {
    pub fn new(value: &'a V) -> Self {
        match value.as_tracked() {
            Some(strong) => Probe::Tracked(Strong::id(strong)),
            None => Probe::Permanent(value),
        }
    }

    pub fn matches(&self, slot: &Slot<V>) -> bool {
        match (self, slot) {
            (Probe::Tracked(id), Slot::Tracked(handle)) => handle.id() == *id && handle.is_alive(),
            (Probe::Permanent(value), Slot::Permanent(other)) => *value == other,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{ReclaimQueue, drain_reclaimed};

    #[test]
    fn repeated_value_registers_once() {
        let queue = ReclaimQueue::new();
        let value = Strong::new(7u32);

        let first = Slot::new(value.clone(), queue.sender());
        let second = Slot::new(value.clone(), queue.sender());

        let (Slot::Tracked(first), Slot::Tracked(second)) = (&first, &second) else {
            panic!("expected tracked slots");
        };

        assert_eq!(first.id(), second.id());

        // Already registered by the first conversion.
        assert!(!Strong::watch(&value, queue.sender()));

        drop(value);
        assert_eq!(drain_reclaimed(&queue.lock()).len(), 1);
    }

    #[test]
    fn permanent_values_bypass_the_notifier() {
        let queue = ReclaimQueue::new();
        let slot = Slot::new(5u32, queue.sender());

        assert!(matches!(slot, Slot::Permanent(5)));
        assert_eq!(slot.resolve(), Some(5));
        assert!(Probe::new(&5).matches(&slot));
        assert!(!Probe::new(&6).matches(&slot));
    }

    #[test]
    fn reclaimed_slot_resolves_to_nothing() {
        let queue = ReclaimQueue::new();
        let value = Strong::new(String::from("gone"));
        let slot = Slot::new(value.clone(), queue.sender());
        let probe_id = Strong::id(&value);

        drop(value);

        let reclaimed = drain_reclaimed(&queue.lock());
        assert!(reclaimed.contains(&probe_id));
        assert!(slot.is_reclaimed_by(&reclaimed));
        assert!(slot.resolve().is_none());
        assert!(!Probe::<Strong<String>>::Tracked(probe_id).matches(&slot));
    }
}
