//! A doubly-linked sequence with indexed insertion, retrieval and replacement, and a
//! fail-fast [`Cursor`] that can remove elements while scanning.
//!
//! ```
//! use linked_sequence::{Sequence, SequenceError};
//!
//! let mut list: Sequence<&str> = ["A", "B", "C"].into_iter().collect();
//! let mut cur = list.cursor();
//! cur.next(&list)?;
//! cur.next(&list)?;
//! cur.remove(&mut list)?;
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), ["A", "C"]);
//!
//! list.push_back("D");
//! assert!(matches!(
//!     cur.next(&list),
//!     Err(SequenceError::ConcurrentStructuralChange { .. })
//! ));
//! # Ok::<(), SequenceError>(())
//! ```
mod cursor;
mod errors;
mod node;
mod sequence;

pub use cursor::Cursor;
pub use errors::{Result, SequenceError};
pub use sequence::{IntoIter, Iter, Sequence};
