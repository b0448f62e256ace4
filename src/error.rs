use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The coarse category of an [`Error`].
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum ErrorKind {
    IndexOutOfRange,
    NotFound,
    StaleSlot,
    SliceLength,
}

/// An error returned by a [`WeakList`](crate::WeakList) operation.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum Error {
    /// An index or slice bound fell outside of the list.
    #[error("index {index} is out of range for a list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A search for a value (`remove`, `index_of`) found no matching slot.
    #[error("value is not present in the list")]
    NotFound,

    /// A slot was about to expose a value which has already been reclaimed.
    ///
    /// Purges are applied before every observation so this is only reachable when the last owner
    /// of a value is dropped on another thread while a read is in progress.
    #[error("slot {index} refers to a value which has already been reclaimed")]
    StaleSlot { index: usize },

    /// A stepped slice was assigned a different number of values than it selects.
    #[error("attempted to assign {found} values to a stepped slice of length {expected}")]
    SliceLength { expected: usize, found: usize },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Error::NotFound => ErrorKind::NotFound,
            Error::StaleSlot { .. } => ErrorKind::StaleSlot,
            Error::SliceLength { .. } => ErrorKind::SliceLength,
        }
    }
}
