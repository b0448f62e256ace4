use std::{
    num::NonZeroUsize,
    ops::{
        Bound, Range, RangeBounds, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive,
    },
};

use crate::{Error, Result};

// === Slice === //

/// A possibly-stepped range of positions within a [`WeakList`](crate::WeakList).
///
/// Every standard range type converts into a contiguous `Slice`. Stepped slices are built with
/// [`Slice::step_by`]:
///
/// ```
/// use weaklist::{Slice, WeakList};
///
/// let list = WeakList::from_iter(0..10);
/// assert_eq!(list.slice(Slice::new(1..).step_by(3)).unwrap(), [1, 4, 7]);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Slice {
    start: Bound<usize>,
    end: Bound<usize>,
    step: NonZeroUsize,
}

impl Slice {
    pub fn new(range: impl RangeBounds<usize>) -> Self {
        Self {
            start: range.start_bound().cloned(),
            end: range.end_bound().cloned(),
            step: NonZeroUsize::MIN,
        }
    }

    /// Selects every `step`-th position of the range, starting with its first.
    ///
    /// # Panics
    ///
    /// Panics if `step` is zero.
    #[track_caller]
    pub fn step_by(self, step: usize) -> Self {
        let step = NonZeroUsize::new(step).expect("slice step must be non-zero");

        Self { step, ..self }
    }

    pub fn step(&self) -> usize {
        self.step.get()
    }

    /// Resolves the slice against a list of length `len`. Bounds are checked strictly: neither
    /// bound may exceed `len` and the start may not come after the end.
    pub(crate) fn resolve(&self, len: usize) -> Result<Selection> {
        let out_of_range = |index| Error::IndexOutOfRange { index, len };

        let start = match self.start {
            Bound::Included(start) => start,
            Bound::Excluded(start) => start.checked_add(1).ok_or(out_of_range(start))?,
            Bound::Unbounded => 0,
        };

        let end = match self.end {
            Bound::Included(end) => end.checked_add(1).ok_or(out_of_range(end))?,
            Bound::Excluded(end) => end,
            Bound::Unbounded => len,
        };

        if end > len {
            return Err(out_of_range(end));
        }

        if start > end {
            return Err(out_of_range(start));
        }

        Ok(Selection {
            range: start..end,
            step: self.step,
        })
    }
}

impl Default for Slice {
    fn default() -> Self {
        Self::new(..)
    }
}

macro_rules! slice_from_range {
    ($($ty:ty),*$(,)?) => {$(
        impl From<$ty> for Slice {
            fn from(range: $ty) -> Self {
                Self::new(range)
            }
        }
    )*};
}

slice_from_range!(
    Range<usize>,
    RangeFrom<usize>,
    RangeTo<usize>,
    RangeFull,
    RangeInclusive<usize>,
    RangeToInclusive<usize>,
);

// === Selection === //

/// A [`Slice`] resolved against a concrete length.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Selection {
    range: Range<usize>,
    step: NonZeroUsize,
}

impl Selection {
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn is_contiguous(&self) -> bool {
        self.step.get() == 1
    }

    pub fn indices(&self) -> impl DoubleEndedIterator<Item = usize> + Clone + use<> {
        self.range.clone().step_by(self.step.get())
    }

    pub fn len(&self) -> usize {
        self.range.len().div_ceil(self.step.get())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn resolves_std_ranges() {
        assert_eq!(Slice::from(1..3).resolve(5).unwrap().range(), 1..3);
        assert_eq!(Slice::from(2..).resolve(5).unwrap().range(), 2..5);
        assert_eq!(Slice::from(..2).resolve(5).unwrap().range(), 0..2);
        assert_eq!(Slice::from(..).resolve(5).unwrap().range(), 0..5);
        assert_eq!(Slice::from(1..=3).resolve(5).unwrap().range(), 1..4);
        assert_eq!(Slice::from(..=4).resolve(5).unwrap().range(), 0..5);
        assert_eq!(Slice::from(5..).resolve(5).unwrap().len(), 0);
    }

    #[test]
    fn rejects_out_of_range_bounds() {
        let err = Slice::from(0..6).resolve(5).unwrap_err();
        assert_eq!(err, Error::IndexOutOfRange { index: 6, len: 5 });

        let err = Slice::from(6..).resolve(5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);

        #[allow(clippy::reversed_empty_ranges)]
        let err = Slice::from(3..2).resolve(5).unwrap_err();
        assert_eq!(err, Error::IndexOutOfRange { index: 3, len: 5 });
    }

    #[test]
    fn stepped_indices() {
        let selection = Slice::new(1..).step_by(2).resolve(6).unwrap();

        assert!(!selection.is_contiguous());
        assert_eq!(selection.indices().collect::<Vec<_>>(), [1, 3, 5]);
        assert_eq!(selection.len(), 3);
    }

    #[test]
    #[should_panic = "slice step must be non-zero"]
    fn zero_step_panics() {
        let _ = Slice::new(..).step_by(0);
    }

    proptest! {
        #[test]
        fn selection_len_matches_indices(
            len in 0usize..64,
            a in 0usize..64,
            b in 0usize..64,
            step in 1usize..8,
        ) {
            let (start, end) = (a.min(b).min(len), a.max(b).min(len));
            let selection = Slice::new(start..end).step_by(step).resolve(len).unwrap();

            let indices = selection.indices().collect::<Vec<_>>();
            prop_assert_eq!(indices.len(), selection.len());
            prop_assert!(indices.iter().all(|&i| i >= start && i < end));
            prop_assert!(indices.windows(2).all(|w| w[1] - w[0] == step));
        }
    }
}
