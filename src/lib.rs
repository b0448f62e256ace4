//! A list which observes its values without owning them.
//!
//! ```
//! use weaklist::{Strong, WeakList};
//!
//! #[derive(Debug)]
//! struct Listener {
//!     name: &'static str,
//! }
//!
//! let alice = Strong::new(Listener { name: "alice" });
//! let bob = Strong::new(Listener { name: "bob" });
//!
//! let listeners = WeakList::from_iter([alice.clone(), bob.clone()]);
//! assert_eq!(listeners.len(), 2);
//!
//! drop(alice);
//!
//! assert_eq!(listeners.len(), 1);
//! assert_eq!(listeners.get(0).unwrap().name, "bob");
//! ```
//!
//! # Lifecycle
//!
//! Values which a [`WeakList`] can observe weakly are owned through a [`Strong`] pointer. A
//! `Strong` is a lot like an [`Arc`](std::sync::Arc) except that the end of its value's lifetime is
//! observable: when the last `Strong` to a value is dropped, every list holding a slot for that
//! value receives a notification carrying the value's [`ReferentId`].
//!
//! Lists never act on these notifications from within the dropping thread. Instead, a notification
//! is queued and applied by whichever list operation next observes the list's length or contents.
//! This means that...
//!
//! - Dropping a `Strong` never blocks on a list's lock.
//! - A list never shows a reclaimed value to its callers.
//! - Every slot referring to a reclaimed value is removed, including duplicates inserted after the
//!   first.
//!
//! The list itself only ever holds [`WeakRef`]s to these values. Its presence never keeps a value
//! alive.
//!
//! # Permanent values
//!
//! Not every value has a lifetime of its own. Integers, strings, and other plain values implement
//! [`Referent`] by declining to be observed weakly. The list stores them as-is and never removes
//! them on its own.
//!
//! ```
//! use weaklist::WeakList;
//!
//! let list = WeakList::from_iter(0..10);
//!
//! assert_eq!(list.len(), 10);
//! assert_eq!(list.slice(1..4).unwrap(), [1, 2, 3]);
//! ```
//!
//! # Identity
//!
//! Searches ([`contains`](WeakList::contains), [`index_of`](WeakList::index_of),
//! [`count`](WeakList::count), [`remove`](WeakList::remove)) use the element type's `PartialEq`.
//! For [`Strong`] this is identity: two separately allocated values never match, even if their
//! contents are equal.
//!
//! ```
//! use weaklist::{ErrorKind, Strong, WeakList};
//!
//! let x = Strong::new(1);
//! let y = Strong::new(1);
//!
//! let mut list = WeakList::new();
//! list.push(x.clone());
//! list.push(x.clone());
//!
//! assert!(list.contains(&x));
//! assert!(!list.contains(&y));
//! assert_eq!(list.count(&x), 2);
//! assert_eq!(list.remove(&y).unwrap_err().kind(), ErrorKind::NotFound);
//! ```

mod error;
pub use self::error::*;

mod list;
pub use self::list::*;

mod notifier;
pub use self::notifier::{ReferentId, Strong, WeakRef};

mod referent;
pub use self::referent::*;

mod slice;
pub use self::slice::*;

mod slot;
