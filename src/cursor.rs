use crate::{
    errors::{Result, SequenceError},
    sequence::Sequence,
};
use tracing::debug;

/// Forward-only cursor that can remove the element it last yielded.
///
/// A cursor does not borrow its [`Sequence`]; the sequence is passed to each call
/// instead. It remembers the sequence's revision when it was created and refuses to
/// move once the sequence has been structurally changed by anything other than this
/// cursor's own [`remove`](Cursor::remove). Replacing elements with
/// [`Sequence::set`] is not a structural change.
///
/// A cursor must only be used with the sequence that created it.
#[derive(Debug, Clone)]
pub struct Cursor {
    next: Option<usize>,
    last_yielded: Option<usize>,
    revision: u64,
}

impl Cursor {
    pub(crate) fn new(first: Option<usize>, revision: u64) -> Self {
        Cursor {
            next: first,
            last_yielded: None,
            revision,
        }
    }

    /// Is there an element left to yield? Never fails, even on a stale cursor.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Yield the next element and advance.
    pub fn next<'a, T>(&mut self, list: &'a Sequence<T>) -> Result<&'a T> {
        self.check_revision(list)?;
        let id = self.next.ok_or(SequenceError::EndOfSequence)?;
        let (value, after) = list.entry(id).ok_or_else(|| self.stale(list))?;
        self.last_yielded = Some(id);
        self.next = after;
        Ok(value)
    }

    /// Remove the element most recently yielded by [`next`](Cursor::next) and return it.
    ///
    /// The cursor resynchronizes with the sequence afterwards, so iteration continues
    /// with the element that followed the removed one.
    pub fn remove<T>(&mut self, list: &mut Sequence<T>) -> Result<T> {
        let id = self.last_yielded.ok_or(SequenceError::NoCurrentElement)?;
        self.check_revision(list)?;
        let (_, after) = list.entry(id).ok_or_else(|| self.stale(list))?;
        let value = list.unlink(id);
        if self.next == Some(id) {
            self.next = after;
        }
        self.last_yielded = None;
        self.revision = list.revision();
        Ok(value)
    }

    fn check_revision<T>(&self, list: &Sequence<T>) -> Result<()> {
        if list.revision() == self.revision {
            Ok(())
        } else {
            Err(self.stale(list))
        }
    }

    fn stale<T>(&self, list: &Sequence<T>) -> SequenceError {
        let found = list.revision();
        debug!(expected = self.revision, found, "stale cursor");
        SequenceError::ConcurrentStructuralChange {
            expected: self.revision,
            found,
        }
    }
}
