use thiserror::Error;

/// Errors that can occur when operating on a [`Sequence`](crate::Sequence) or its
/// [`Cursor`](crate::Cursor).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// An index fell outside the range valid for the operation.
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The cursor has no element left to yield.
    #[error("no more elements in sequence")]
    EndOfSequence,

    /// The cursor has not yielded an element since it was created or last removed one.
    #[error("no current element to remove")]
    NoCurrentElement,

    /// The sequence was structurally changed behind the cursor's back.
    #[error("sequence changed concurrently (expected revision {expected}, found {found})")]
    ConcurrentStructuralChange { expected: u64, found: u64 },
}

pub type Result<T> = std::result::Result<T, SequenceError>;
