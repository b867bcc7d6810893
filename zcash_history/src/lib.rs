//! Chain history library for Zcash
//!
//! Implements the Merkle Mountain Range committed to by block headers from the Heartwood
//! network upgrade onwards ([ZIP 221](https://zips.z.cash/zip-0221)).

// Catch documentation errors caused by code changes.
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_docs)]

mod entry;
pub mod node_data;
mod tree;
mod version;

pub use entry::{Entry, MAX_ENTRY_SIZE};
pub use node_data::{NodeData, MAX_NODE_DATA_SIZE};
pub use tree::{make_parent, IndexedNode, Tree};
pub use version::{personalization, Version, V1, V2};

/// Errors from navigating a partially loaded tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tree view does not hold an entry it needed.
    #[error("entry {0} is not loaded in the tree view")]
    ExpectedInMemory(EntryLink),
    /// A leaf was found where an inner node was required.
    #[error("expected an inner node{}", .0.map_or(String::new(), |l| format!(" at {}", l)))]
    ExpectedNode(Option<EntryLink>),
    /// The tree has no root because no leaf has been appended yet.
    #[error("history tree is empty")]
    EmptyTree,
}

/// Where a tree entry lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryLink {
    /// Position in the flat array of appended entries.
    Stored(u32),
    /// Index of an entry synthesized while bagging peaks, which is never persisted.
    Generated(u32),
}

impl std::fmt::Display for EntryLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Stored(v) => write!(f, "stored({})", v),
            Self::Generated(v) => write!(f, "generated({})", v),
        }
    }
}

/// Whether an entry is a leaf or an inner node with two children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// A single block.
    Leaf,
    /// Left and right children.
    Node(EntryLink, EntryLink),
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Leaf => write!(f, "leaf"),
            EntryKind::Node(left, right) => write!(f, "node({}, {})", left, right),
        }
    }
}

impl Error {
    /// Attaches the link being resolved to an [`Error::ExpectedNode`].
    pub(crate) fn augment(self, link: EntryLink) -> Self {
        match self {
            Error::ExpectedNode(None) => Error::ExpectedNode(Some(link)),
            other => other,
        }
    }
}
