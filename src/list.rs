use std::{
    cmp::Ordering,
    fmt,
    iter::FusedIterator,
    mem,
    ops::AddAssign,
    sync::Arc,
};

use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashSet;

use crate::{
    Error, Referent, ReferentId, Result, Slice,
    notifier::{ReclaimQueue, ReclaimSender, drain_reclaimed},
    slot::{Probe, Slot},
};

// === SortOrder === //

#[derive(Debug, Copy, Clone, Default, Hash, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

// === WeakList === //

/// An ordered list of values which does not keep its values alive.
///
/// Values observed through a [`Strong`](crate::Strong) are held by a weak handle. Once the last
/// `Strong` to such a value is dropped, every slot referring to it is removed from the list before
/// the list's length or contents are observed again. Values which cannot be observed weakly (see
/// [`Referent`]) are held permanently.
///
/// ```
/// use weaklist::{Strong, WeakList};
///
/// let obj = Strong::new("obj");
///
/// let mut list = WeakList::new();
/// list.push(obj.clone());
/// list.push(obj.clone());
/// assert_eq!(list.len(), 2);
///
/// drop(obj);
/// assert_eq!(list.len(), 0);
/// ```
///
/// ## Concurrency
///
/// Mutating methods take `&mut self` and read methods take `&self`. Reads may therefore run
/// concurrently with one another but never with a mutation. Reclamation may happen on any thread;
/// its purge is applied by whichever operation next observes the list, under the list's own lock.
/// A reclamation which races an in-progress read is either not yet visible to that read or causes
/// it to skip the reclaimed slot ([`iter`](WeakList::iter)) or fail with
/// [`ErrorKind::StaleSlot`](crate::ErrorKind::StaleSlot) ([`get`](WeakList::get)).
pub struct WeakList<V: Referent> {
    slots: RwLock<Vec<Slot<V>>>,
    queue: ReclaimQueue,
}

impl<V: Referent> Default for WeakList<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn purge<V: Referent>(slots: &mut Vec<Slot<V>>, reclaimed: &FxHashSet<ReferentId>) {
    if reclaimed.is_empty() {
        return;
    }

    let before = slots.len();
    slots.retain(|slot| !slot.is_reclaimed_by(reclaimed));

    tracing::trace!(
        referents = reclaimed.len(),
        removed = before - slots.len(),
        "purged reclaimed slots"
    );
}

fn resolve_at<V: Referent>(slot: &Slot<V>, index: usize) -> Result<V> {
    slot.resolve().ok_or_else(|| {
        tracing::debug!(index, "slot was reclaimed during a read");
        Error::StaleSlot { index }
    })
}

impl<V: Referent> WeakList<V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(Vec::with_capacity(capacity)),
            queue: ReclaimQueue::new(),
        }
    }

    // === Purging === //

    /// Applies every pending purge and acquires the slots for reading.
    ///
    /// The queue lock is held for the duration of the purge so that a concurrent reader which finds
    /// the queue empty cannot observe the slots before they have been purged.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Slot<V>>> {
        {
            let receiver = self.queue.lock();
            let reclaimed = drain_reclaimed(&receiver);

            if !reclaimed.is_empty() {
                purge(&mut self.slots.write(), &reclaimed);
            }
        }

        self.slots.read()
    }

    /// Applies every pending purge and acquires the slots for writing alongside the sender new
    /// slots must register with.
    fn parts_mut(&mut self) -> (&mut Vec<Slot<V>>, &Arc<ReclaimSender>) {
        let reclaimed = drain_reclaimed(self.queue.get_mut());
        let slots = self.slots.get_mut();

        purge(slots, &reclaimed);

        (slots, self.queue.sender())
    }

    fn slots_mut(&mut self) -> &mut Vec<Slot<V>> {
        self.parts_mut().0
    }

    // === Observation === //

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns whether some slot refers to a value identical to `value`.
    pub fn contains(&self, value: &V) -> bool {
        let probe = Probe::new(value);

        self.read().iter().any(|slot| probe.matches(slot))
    }

    pub fn get(&self, index: usize) -> Result<V> {
        let slots = self.read();
        let slot = slots.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: slots.len(),
        })?;

        resolve_at(slot, index)
    }

    pub fn first(&self) -> Option<V> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<V> {
        self.read().iter().rev().find_map(Slot::resolve)
    }

    /// Copies the values selected by `slice` into a new, independent list.
    ///
    /// The new list registers for the reclamation of its values separately. Mutating either list
    /// never affects the other, but a reclaimed value disappears from both.
    pub fn slice(&self, slice: impl Into<Slice>) -> Result<Self> {
        let slots = self.read();
        let selection = slice.into().resolve(slots.len())?;

        let mut copy = Self::with_capacity(selection.len());
        let (copy_slots, sender) = copy.parts_mut();

        for index in selection.indices() {
            // A value reclaimed mid-copy would be purged from the copy straight away.
            let Some(value) = slots[index].resolve() else {
                continue;
            };

            let slot = Slot::new(value, sender);
            copy_slots.push(slot);
        }

        drop(slots);

        Ok(copy)
    }

    /// Returns the position of the first slot referring to a value identical to `value`.
    pub fn index_of(&self, value: &V) -> Result<usize> {
        let probe = Probe::new(value);

        self.read()
            .iter()
            .position(|slot| probe.matches(slot))
            .ok_or(Error::NotFound)
    }

    /// Counts the slots referring to a value identical to `value`.
    pub fn count(&self, value: &V) -> usize {
        let probe = Probe::new(value);

        self.read().iter().filter(|slot| probe.matches(slot)).count()
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            cursor: 0,
        }
    }

    pub fn to_vec(&self) -> Vec<V> {
        self.iter().collect()
    }

    /// Returns an independent copy of the list in reverse order.
    pub fn reversed(&self) -> Self {
        let mut copy = self.clone();
        copy.reverse();
        copy
    }

    // === Mutation === //

    pub fn push(&mut self, value: V) {
        let (slots, sender) = self.parts_mut();
        let slot = Slot::new(value, sender);

        slots.push(slot);
    }

    /// Inserts `value` at `index`, shifting all later values to the right. An `index` equal to the
    /// list's length appends.
    pub fn insert(&mut self, index: usize, value: V) -> Result<()> {
        let (slots, sender) = self.parts_mut();
        let len = slots.len();

        if index > len {
            return Err(Error::IndexOutOfRange { index, len });
        }

        let slot = Slot::new(value, sender);
        slots.insert(index, slot);

        Ok(())
    }

    /// Replaces the value at `index`.
    pub fn set(&mut self, index: usize, value: V) -> Result<()> {
        let (slots, sender) = self.parts_mut();
        let len = slots.len();

        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }

        let slot = Slot::new(value, sender);
        slots[index] = slot;

        Ok(())
    }

    /// Replaces the values selected by `slice` with `values`.
    ///
    /// A contiguous slice may be replaced by any number of values, growing or shrinking the list.
    /// A stepped slice must be replaced by exactly as many values as it selects.
    pub fn set_slice(
        &mut self,
        slice: impl Into<Slice>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<()> {
        let (slots, sender) = self.parts_mut();
        let selection = slice.into().resolve(slots.len())?;
        let values = values.into_iter().collect::<Vec<_>>();

        if !selection.is_contiguous() && values.len() != selection.len() {
            return Err(Error::SliceLength {
                expected: selection.len(),
                found: values.len(),
            });
        }

        let mut replacements = Vec::with_capacity(values.len());
        for value in values {
            let slot = Slot::new(value, sender);
            replacements.push(slot);
        }

        if selection.is_contiguous() {
            slots.splice(selection.range(), replacements);
        } else {
            for (index, slot) in selection.indices().zip(replacements) {
                slots[index] = slot;
            }
        }

        Ok(())
    }

    /// Removes the first slot referring to a value identical to `value`.
    pub fn remove(&mut self, value: &V) -> Result<()> {
        let probe = Probe::new(value);
        let slots = self.slots_mut();

        let index = slots
            .iter()
            .position(|slot| probe.matches(slot))
            .ok_or(Error::NotFound)?;

        slots.remove(index);

        Ok(())
    }

    /// Removes every slot referring to a value identical to `value`, returning how many were
    /// removed.
    pub fn remove_all(&mut self, value: &V) -> usize {
        let probe = Probe::new(value);
        let slots = self.slots_mut();

        let before = slots.len();
        slots.retain(|slot| !probe.matches(slot));
        before - slots.len()
    }

    /// Removes and returns the last value.
    pub fn pop(&mut self) -> Result<V> {
        let slots = self.slots_mut();
        let index = slots.len().saturating_sub(1);

        let slot = slots
            .pop()
            .ok_or(Error::IndexOutOfRange { index, len: 0 })?;

        resolve_at(&slot, index)
    }

    /// Removes and returns the value at `index`, shifting all later values to the left.
    pub fn pop_at(&mut self, index: usize) -> Result<V> {
        let slots = self.slots_mut();
        let len = slots.len();

        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }

        let slot = slots.remove(index);
        resolve_at(&slot, index)
    }

    /// Removes every value selected by `slice`.
    pub fn delete(&mut self, slice: impl Into<Slice>) -> Result<()> {
        let slots = self.slots_mut();
        let selection = slice.into().resolve(slots.len())?;

        if selection.is_contiguous() {
            slots.drain(selection.range());
            return Ok(());
        }

        let mut doomed = selection.indices().peekable();
        let mut index = 0;

        slots.retain(|_| {
            let keep = doomed.next_if_eq(&index).is_none();
            index += 1;
            keep
        });

        Ok(())
    }

    pub fn clear(&mut self) {
        self.slots_mut().clear();
    }

    /// Appends every value of `other`. Each value is registered for reclamation with this list
    /// independently of `other`.
    pub fn extend_from(&mut self, other: &Self) {
        self.extend(other.iter());
    }

    // === Ordering === //

    pub fn reverse(&mut self) {
        self.slots_mut().reverse();
    }

    pub fn sort(&mut self)
    where
        V: Ord,
    {
        self.sort_by(V::cmp);
    }

    /// Stably sorts the list by `key`.
    ///
    /// The key function is called exactly once per value.
    pub fn sort_by_key<K, F>(&mut self, key: F)
    where
        K: Ord,
        F: FnMut(&V) -> K,
    {
        self.sort_by_key_with(key, SortOrder::Ascending);
    }

    pub fn sort_by_key_with<K, F>(&mut self, key: F, order: SortOrder)
    where
        K: Ord,
        F: FnMut(&V) -> K,
    {
        self.sort_keyed(key, K::cmp, order);
    }

    /// Stably sorts the list with a two-argument comparator.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        self.sort_by_with(compare, SortOrder::Ascending);
    }

    pub fn sort_by_with<F>(&mut self, compare: F, order: SortOrder)
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        // The comparator is adapted into a key ordering: each value becomes its own key.
        self.sort_keyed(V::clone, compare, order);
    }

    fn sort_keyed<K>(
        &mut self,
        mut key: impl FnMut(&V) -> K,
        mut compare: impl FnMut(&K, &K) -> Ordering,
        order: SortOrder,
    ) {
        let slots = self.slots_mut();
        let mut keyed = Vec::with_capacity(slots.len());

        // User code only runs while the slots are still in place, so a panicking key or
        // comparator leaves the list untouched.
        for (index, slot) in slots.iter().enumerate() {
            // Only reachable if the value was reclaimed on another thread after the purge above.
            // Its notification is still pending and would remove the slot regardless.
            let Some(value) = slot.resolve() else {
                continue;
            };

            keyed.push((key(&value), index));
        }

        keyed.sort_by(|(lhs, _), (rhs, _)| match order {
            SortOrder::Ascending => compare(lhs, rhs),
            SortOrder::Descending => compare(rhs, lhs),
        });

        let mut taken = mem::take(slots).into_iter().map(Some).collect::<Vec<_>>();
        slots.extend(keyed.into_iter().filter_map(|(_, index)| taken[index].take()));
    }
}

impl<V: Referent> Clone for WeakList<V> {
    fn clone(&self) -> Self {
        self.iter().collect()
    }
}

impl<V: Referent + fmt::Debug> fmt::Debug for WeakList<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakList").field(&self.to_vec()).finish()
    }
}

impl<V: Referent> FromIterator<V> for WeakList<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut list = Self::with_capacity(iter.size_hint().0);
        list.extend(iter);
        list
    }
}

impl<V: Referent> Extend<V> for WeakList<V> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        let (slots, sender) = self.parts_mut();

        for value in iter {
            let slot = Slot::new(value, sender);
            slots.push(slot);
        }
    }
}

impl<V: Referent> AddAssign<&WeakList<V>> for WeakList<V> {
    fn add_assign(&mut self, rhs: &WeakList<V>) {
        self.extend_from(rhs);
    }
}

impl<V: Referent> AddAssign<Vec<V>> for WeakList<V> {
    fn add_assign(&mut self, rhs: Vec<V>) {
        self.extend(rhs);
    }
}

impl<V: Referent> PartialEq for WeakList<V> {
    fn eq(&self, other: &Self) -> bool {
        self.to_vec() == other.to_vec()
    }
}

impl<V: Referent> PartialEq<[V]> for WeakList<V> {
    fn eq(&self, other: &[V]) -> bool {
        self.to_vec() == other
    }
}

impl<V: Referent> PartialEq<Vec<V>> for WeakList<V> {
    fn eq(&self, other: &Vec<V>) -> bool {
        self.to_vec() == *other
    }
}

impl<V: Referent, const N: usize> PartialEq<[V; N]> for WeakList<V> {
    fn eq(&self, other: &[V; N]) -> bool {
        self.to_vec() == other
    }
}

impl<'a, V: Referent> IntoIterator for &'a WeakList<V> {
    type Item = V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// === Iter === //

/// A lazy iterator over the values of a [`WeakList`].
///
/// Each step observes the list afresh, so slots purged ahead of the cursor are skipped and
/// reclaimed values are never yielded.
#[derive(Debug)]
pub struct Iter<'a, V: Referent> {
    list: &'a WeakList<V>,
    cursor: usize,
}

impl<V: Referent> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            cursor: self.cursor,
        }
    }
}

impl<V: Referent> Iterator for Iter<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let slots = self.list.read();

        while let Some(slot) = slots.get(self.cursor) {
            self.cursor += 1;

            if let Some(value) = slot.resolve() {
                return Some(value);
            }
        }

        None
    }
}

impl<V: Referent> FusedIterator for Iter<'_, V> {}
