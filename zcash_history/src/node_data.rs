use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use primitive_types::U256;
use zcash_encoding::CompactSize;

/// Upper bound on the encoded length of [`V2`] metadata, reached when every compact
/// integer takes its 9-byte form.
pub const MAX_NODE_DATA_SIZE: usize = 32 // subtree_commitment
    + 4 * 4 // start_time, end_time, start_target, end_target
    + 32 * 2 // Sapling roots
    + 32 // subtree_total_work
    + 9 * 3 // start_height, end_height, sapling_tx
    + 32 * 2 // Orchard roots
    + 9; // orchard_tx

/// Metadata committed to by every history tree node from Heartwood until NU5.
///
/// A leaf describes a single block. An inner node summarizes the contiguous range of
/// blocks beneath it: `start_*` fields come from its leftmost leaf, `end_*` fields from
/// its rightmost leaf, and counters are summed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeData {
    /// Branch id of the epoch this node belongs to. Not serialized; it keys the hash.
    pub consensus_branch_id: u32,
    /// The block hash for a leaf, or the hash of both children for an inner node.
    pub subtree_commitment: [u8; 32],
    /// Header timestamp of the first block.
    pub start_time: u32,
    /// Header timestamp of the last block.
    pub end_time: u32,
    /// Compact difficulty bits of the first block.
    pub start_target: u32,
    /// Compact difficulty bits of the last block.
    pub end_target: u32,
    /// Sapling note commitment tree root after the first block.
    pub start_sapling_root: [u8; 32],
    /// Sapling note commitment tree root after the last block.
    pub end_sapling_root: [u8; 32],
    /// Expected hash count to produce every block in the subtree.
    pub subtree_total_work: U256,
    /// Height of the first block.
    pub start_height: u64,
    /// Height of the last block.
    pub end_height: u64,
    /// Number of transactions with Sapling spends or outputs.
    pub sapling_tx: u64,
}

impl NodeData {
    /// Combines the metadata of two adjacent subtrees under the given commitment.
    ///
    /// # Panics
    ///
    /// Panics if the accumulated work does not fit in 256 bits.
    pub fn combine_inner(
        subtree_commitment: [u8; 32],
        left: &NodeData,
        right: &NodeData,
    ) -> NodeData {
        NodeData {
            consensus_branch_id: left.consensus_branch_id,
            subtree_commitment,
            start_time: left.start_time,
            end_time: right.end_time,
            start_target: left.start_target,
            end_target: right.end_target,
            start_sapling_root: left.start_sapling_root,
            end_sapling_root: right.end_sapling_root,
            subtree_total_work: left
                .subtree_total_work
                .checked_add(right.subtree_total_work)
                .expect("total work of a subtree must fit in 256 bits"),
            start_height: left.start_height,
            end_height: right.end_height,
            sapling_tx: left.sapling_tx + right.sapling_tx,
        }
    }

    /// Write to the byte representation.
    pub fn write<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.subtree_commitment)?;
        w.write_u32::<LittleEndian>(self.start_time)?;
        w.write_u32::<LittleEndian>(self.end_time)?;
        w.write_u32::<LittleEndian>(self.start_target)?;
        w.write_u32::<LittleEndian>(self.end_target)?;
        w.write_all(&self.start_sapling_root)?;
        w.write_all(&self.end_sapling_root)?;

        let mut work_buf = [0u8; 32];
        self.subtree_total_work.to_little_endian(&mut work_buf[..]);
        w.write_all(&work_buf)?;

        CompactSize::write_u64(&mut *w, self.start_height)?;
        CompactSize::write_u64(&mut *w, self.end_height)?;
        CompactSize::write_u64(&mut *w, self.sapling_tx)?;
        Ok(())
    }

    /// Read from the byte representation.
    pub fn read<R: std::io::Read>(consensus_branch_id: u32, r: &mut R) -> std::io::Result<Self> {
        let mut data = NodeData {
            consensus_branch_id,
            ..Default::default()
        };
        r.read_exact(&mut data.subtree_commitment)?;
        data.start_time = r.read_u32::<LittleEndian>()?;
        data.end_time = r.read_u32::<LittleEndian>()?;
        data.start_target = r.read_u32::<LittleEndian>()?;
        data.end_target = r.read_u32::<LittleEndian>()?;
        r.read_exact(&mut data.start_sapling_root)?;
        r.read_exact(&mut data.end_sapling_root)?;

        let mut work_buf = [0u8; 32];
        r.read_exact(&mut work_buf)?;
        data.subtree_total_work = U256::from_little_endian(&work_buf);

        data.start_height = CompactSize::read_unbounded(&mut *r)?;
        data.end_height = CompactSize::read_unbounded(&mut *r)?;
        data.sapling_tx = CompactSize::read_unbounded(&mut *r)?;

        Ok(data)
    }
}

/// V2 node metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct V2 {
    /// Heartwood-era fields, unchanged.
    pub v1: NodeData,
    /// Orchard note commitment tree root after the first block.
    pub start_orchard_root: [u8; 32],
    /// Orchard note commitment tree root after the last block.
    pub end_orchard_root: [u8; 32],
    /// Number of transactions with Orchard actions.
    pub orchard_tx: u64,
}

impl V2 {
    pub(crate) fn combine_inner(subtree_commitment: [u8; 32], left: &V2, right: &V2) -> V2 {
        V2 {
            v1: NodeData::combine_inner(subtree_commitment, &left.v1, &right.v1),
            start_orchard_root: left.start_orchard_root,
            end_orchard_root: right.end_orchard_root,
            orchard_tx: left.orchard_tx + right.orchard_tx,
        }
    }

    /// Write to the byte representation.
    pub fn write<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.v1.write(w)?;
        w.write_all(&self.start_orchard_root)?;
        w.write_all(&self.end_orchard_root)?;
        CompactSize::write_u64(&mut *w, self.orchard_tx)?;
        Ok(())
    }

    /// Read from the byte representation.
    pub fn read<R: std::io::Read>(consensus_branch_id: u32, r: &mut R) -> std::io::Result<Self> {
        let mut data = V2 {
            v1: NodeData::read(consensus_branch_id, r)?,
            ..Default::default()
        };
        r.read_exact(&mut data.start_orchard_root)?;
        r.read_exact(&mut data.end_orchard_root)?;
        data.orchard_tx = CompactSize::read_unbounded(&mut *r)?;

        Ok(data)
    }
}

#[cfg(test)]
fn arb_root<G: quickcheck::Gen>(gen: &mut G) -> [u8; 32] {
    let mut root = [0u8; 32];
    gen.fill_bytes(&mut root);
    root
}

#[cfg(test)]
impl quickcheck::Arbitrary for NodeData {
    fn arbitrary<G: quickcheck::Gen>(gen: &mut G) -> Self {
        NodeData {
            consensus_branch_id: 0,
            subtree_commitment: arb_root(gen),
            start_time: gen.next_u32(),
            end_time: gen.next_u32(),
            start_target: gen.next_u32(),
            end_target: gen.next_u32(),
            start_sapling_root: arb_root(gen),
            end_sapling_root: arb_root(gen),
            subtree_total_work: U256::from_little_endian(&arb_root(gen)),
            start_height: gen.next_u64(),
            end_height: gen.next_u64(),
            sapling_tx: gen.next_u64(),
        }
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for V2 {
    fn arbitrary<G: quickcheck::Gen>(gen: &mut G) -> Self {
        V2 {
            v1: <NodeData as quickcheck::Arbitrary>::arbitrary(gen),
            start_orchard_root: arb_root(gen),
            end_orchard_root: arb_root(gen),
            orchard_tx: gen.next_u64(),
        }
    }
}
