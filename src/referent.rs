use crate::Strong;

// === Referent === //

/// A value which can be stored in a [`WeakList`](crate::WeakList).
///
/// The list asks each value, at the time it is inserted, whether it can be observed weakly. Values
/// which return a [`Strong`] from [`as_tracked`](Referent::as_tracked) are held through a weak
/// handle and purged once reclaimed. All other values are held permanently, as-is.
///
/// The element type's [`PartialEq`] is used as the identity relation for searches. For [`Strong`]
/// this compares identity, never contents. Permanently held values have no independent identity so
/// they are compared by value.
///
/// The decision is made per value, so an enum may mix both kinds:
///
/// ```
/// use weaklist::{Referent, Strong, WeakList};
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum Entry {
///     Shared(Strong<String>),
///     Inline(u32),
/// }
///
/// impl Referent for Entry {
///     type Target = String;
///
///     fn as_tracked(&self) -> Option<&Strong<String>> {
///         match self {
///             Entry::Shared(strong) => Some(strong),
///             Entry::Inline(_) => None,
///         }
///     }
///
///     fn from_tracked(strong: Strong<String>) -> Self {
///         Entry::Shared(strong)
///     }
/// }
///
/// let shared = Strong::new(String::from("shared"));
/// let list = WeakList::from_iter([Entry::Shared(shared.clone()), Entry::Inline(4)]);
/// assert_eq!(list.len(), 2);
///
/// drop(shared);
/// assert_eq!(list.to_vec(), [Entry::Inline(4)]);
/// ```
pub trait Referent: Clone + PartialEq {
    type Target;

    /// Returns the owner through which this value can be observed weakly, or `None` if it must be
    /// held permanently.
    fn as_tracked(&self) -> Option<&Strong<Self::Target>>;

    /// Reconstructs a value from the owner previously returned by
    /// [`as_tracked`](Referent::as_tracked).
    fn from_tracked(strong: Strong<Self::Target>) -> Self;
}

impl<T> Referent for Strong<T> {
    type Target = T;

    fn as_tracked(&self) -> Option<&Strong<T>> {
        Some(self)
    }

    fn from_tracked(strong: Strong<T>) -> Self {
        strong
    }
}

macro_rules! permanent_referent {
    ($($ty:ty),*$(,)?) => {$(
        impl Referent for $ty {
            type Target = Self;

            fn as_tracked(&self) -> Option<&Strong<Self>> {
                None
            }

            fn from_tracked(strong: Strong<Self>) -> Self {
                (*strong).clone()
            }
        }
    )*};
}

permanent_referent!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
);
