use std::fmt;
use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{EntryKind, EntryLink, Error, Version, MAX_NODE_DATA_SIZE};

/// Max serialized length of entry data.
pub const MAX_ENTRY_SIZE: usize = MAX_NODE_DATA_SIZE + 9;

/// MMR Entry.
///
/// The persisted form is a one-byte tag (`0` for a node followed by the two little-endian
/// indices of its stored children, `1` for a leaf), then the node data.
pub struct Entry<V: Version> {
    pub(crate) kind: EntryKind,
    pub(crate) data: V::NodeData,
}

impl<V: Version> Entry<V> {
    /// New entry of type node.
    pub fn new(data: V::NodeData, left: EntryLink, right: EntryLink) -> Self {
        Entry {
            kind: EntryKind::Node(left, right),
            data,
        }
    }

    /// Creates a new leaf.
    pub fn new_leaf(data: V::NodeData) -> Self {
        Entry {
            kind: EntryKind::Leaf,
            data,
        }
    }

    /// Returns if is this node complete (has total of 2^N leaves)
    pub fn complete(&self) -> bool {
        V::is_complete(&self.data)
    }

    /// Number of leaves under this node.
    pub fn leaf_count(&self) -> u64 {
        V::leaf_count(&self.data)
    }

    /// Is this node a leaf.
    pub fn leaf(&self) -> bool {
        matches!(self.kind, EntryKind::Leaf)
    }

    /// Left child
    pub fn left(&self) -> Result<EntryLink, Error> {
        match self.kind {
            EntryKind::Leaf => Err(Error::ExpectedNode(None)),
            EntryKind::Node(left, _) => Ok(left),
        }
    }

    /// Right child.
    pub fn right(&self) -> Result<EntryLink, Error> {
        match self.kind {
            EntryKind::Leaf => Err(Error::ExpectedNode(None)),
            EntryKind::Node(_, right) => Ok(right),
        }
    }

    /// The node metadata.
    pub fn data(&self) -> &V::NodeData {
        &self.data
    }

    /// Read from byte representation.
    pub fn read<R: io::Read>(consensus_branch_id: u32, r: &mut R) -> io::Result<Self> {
        let kind = {
            match r.read_u8()? {
                0 => {
                    let left = r.read_u32::<LittleEndian>()?;
                    let right = r.read_u32::<LittleEndian>()?;
                    EntryKind::Node(EntryLink::Stored(left), EntryLink::Stored(right))
                }
                1 => EntryKind::Leaf,
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "invalid history entry kind",
                    ))
                }
            }
        };

        let data = V::read(consensus_branch_id, r)?;

        Ok(Entry { kind, data })
    }

    /// Write to byte representation.
    ///
    /// Only entries whose children are stored can be persisted.
    pub fn write<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        match self.kind {
            EntryKind::Node(EntryLink::Stored(left), EntryLink::Stored(right)) => {
                w.write_u8(0)?;
                w.write_u32::<LittleEndian>(left)?;
                w.write_u32::<LittleEndian>(right)?;
            }
            EntryKind::Leaf => {
                w.write_u8(1)?;
            }
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "history entry links to a generated node",
                ));
            }
        }

        V::write(&self.data, w)
    }

    /// Convert from byte representation.
    pub fn from_bytes<T: AsRef<[u8]>>(consensus_branch_id: u32, buf: T) -> io::Result<Self> {
        let mut cursor = io::Cursor::new(buf);
        Self::read(consensus_branch_id, &mut cursor)
    }

    /// Convert to byte representation.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(MAX_ENTRY_SIZE);
        self.write(&mut buf)?;
        Ok(buf)
    }
}

impl<V: Version> Clone for Entry<V> {
    fn clone(&self) -> Self {
        Entry {
            kind: self.kind,
            data: self.data.clone(),
        }
    }
}

impl<V: Version> fmt::Debug for Entry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("kind", &self.kind)
            .field("data", &self.data)
            .finish()
    }
}

impl<V: Version> fmt::Display for Entry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntryKind::Node(l, r) => write!(f, "node({}, {}, ..)", l, r),
            EntryKind::Leaf => write!(f, "leaf(..)"),
        }
    }
}
