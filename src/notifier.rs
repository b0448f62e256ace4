use std::{
    fmt, hash,
    num::NonZeroU64,
    ops::Deref,
    ptr,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering::Relaxed},
        mpsc,
    },
};

use derive_where::derive_where;
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashSet;

// === ReferentId === //

/// The identity of a value owned by one or more [`Strong`] pointers.
///
/// Identifiers are allocated from a process-wide counter and are never reused, even after the value
/// they identify has been reclaimed.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ReferentId(NonZeroU64);

impl ReferentId {
    fn allocate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);

        let id = NEXT.fetch_add(1, Relaxed);
        Self(NonZeroU64::new(id).expect("allocated too many referents"))
    }

    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ReferentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// === Pointee === //

pub(crate) type ReclaimSender = mpsc::Sender<ReferentId>;

struct Pointee<T> {
    id: ReferentId,

    /// Back-references to the queues of every container which holds a slot for this value. These
    /// are weak so that a dropped container is never kept alive by the values it observed.
    watchers: Mutex<Vec<Weak<ReclaimSender>>>,

    value: T,
}

impl<T> Drop for Pointee<T> {
    fn drop(&mut self) {
        for watcher in self.watchers.get_mut().drain(..) {
            let Some(sender) = watcher.upgrade() else {
                continue;
            };

            // The receiving end may be dropped concurrently.
            _ = sender.send(self.id);
        }
    }
}

// === Strong === //

/// A strong, shared owner of a value of type `T`.
///
/// This behaves much like an [`Arc`]: cloning it shares ownership and the value is dropped once the
/// last `Strong` goes away. Unlike an `Arc`, however, the end of the value's lifetime is observable.
/// Every [`WeakList`](crate::WeakList) holding a slot for the value is notified exactly once so that
/// it may purge those slots.
///
/// Equality and hashing are by identity, not by value. Two separately constructed `Strong`s never
/// compare equal, even if their values do.
#[derive_where(Clone)]
pub struct Strong<T>(Arc<Pointee<T>>);

impl<T> Strong<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(Pointee {
            id: ReferentId::allocate(),
            watchers: Mutex::new(Vec::new()),
            value,
        }))
    }

    /// Fetches the identity of the owned value.
    ///
    /// Note that this is an associated function—not a method.
    pub fn id(me: &Self) -> ReferentId {
        me.0.id
    }

    /// Creates a [`WeakRef`] to the owned value which does not keep it alive.
    ///
    /// Note that this is an associated function—not a method.
    pub fn downgrade(me: &Self) -> WeakRef<T> {
        WeakRef {
            id: me.0.id,
            pointee: Arc::downgrade(&me.0),
        }
    }

    /// Returns the number of `Strong`s currently sharing ownership of the value.
    ///
    /// Note that this is an associated function—not a method.
    pub fn strong_count(me: &Self) -> usize {
        Arc::strong_count(&me.0)
    }

    pub fn ptr_eq(lhs: &Self, rhs: &Self) -> bool {
        Arc::ptr_eq(&lhs.0, &rhs.0)
    }

    /// Registers `sender` to receive this value's [`ReferentId`] once it is reclaimed, returning
    /// `false` if it was already registered.
    pub(crate) fn watch(me: &Self, sender: &Arc<ReclaimSender>) -> bool {
        let mut watchers = me.0.watchers.lock();

        watchers.retain(|watcher| watcher.strong_count() > 0);

        if watchers
            .iter()
            .any(|watcher| ptr::eq(watcher.as_ptr(), Arc::as_ptr(sender)))
        {
            return false;
        }

        watchers.push(Arc::downgrade(sender));
        true
    }
}

impl<T> Deref for Strong<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Strong<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.value.fmt(f)
    }
}

impl<T> Eq for Strong<T> {}

impl<T> PartialEq for Strong<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T> hash::Hash for Strong<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

// === WeakRef === //

/// A non-owning handle to a value owned by one or more [`Strong`]s.
#[derive_where(Clone)]
pub struct WeakRef<T> {
    id: ReferentId,
    pointee: Weak<Pointee<T>>,
}

impl<T> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<T> WeakRef<T> {
    pub fn id(&self) -> ReferentId {
        self.id
    }

    /// Attempts to obtain a new [`Strong`] to the value, returning `None` if it has been reclaimed.
    pub fn upgrade(&self) -> Option<Strong<T>> {
        self.pointee.upgrade().map(Strong)
    }

    pub fn is_alive(&self) -> bool {
        self.pointee.strong_count() > 0
    }
}

// === ReclaimQueue === //

/// The receiving end of the reclamation notifications addressed to a single container.
pub(crate) struct ReclaimQueue {
    sender: Arc<ReclaimSender>,
    receiver: Mutex<mpsc::Receiver<ReferentId>>,
}

impl fmt::Debug for ReclaimQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReclaimQueue").finish_non_exhaustive()
    }
}

impl Default for ReclaimQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ReclaimQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();

        Self {
            sender: Arc::new(sender),
            receiver: Mutex::new(receiver),
        }
    }

    pub fn sender(&self) -> &Arc<ReclaimSender> {
        &self.sender
    }

    /// Locks the receiver. Holding this guard serializes concurrent readers which are all trying to
    /// apply the same batch of notifications.
    pub fn lock(&self) -> MutexGuard<'_, mpsc::Receiver<ReferentId>> {
        self.receiver.lock()
    }

    pub fn get_mut(&mut self) -> &mut mpsc::Receiver<ReferentId> {
        self.receiver.get_mut()
    }
}

pub(crate) fn drain_reclaimed(receiver: &mpsc::Receiver<ReferentId>) -> FxHashSet<ReferentId> {
    receiver.try_iter().collect()
}
