#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    pub(crate) prev: Option<usize>,
    /// Successor in the chain, or the next free slot while the node is vacant.
    pub(crate) next: Option<usize>,
    pub(crate) value: Option<T>,
}

impl<T> Node<T> {
    pub(crate) fn new(prev: Option<usize>, value: T, next: Option<usize>) -> Self {
        Node {
            prev,
            next,
            value: Some(value),
        }
    }

    /// Is this node holding an element (not on the free-list)?
    pub(crate) fn is_live(&self) -> bool {
        self.value.is_some()
    }
}
