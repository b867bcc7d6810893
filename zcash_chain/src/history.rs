//! Construction of [ZIP 221] chain history tree leaves from block headers.
//!
//! [ZIP 221]: https://zips.z.cash/zip-0221
use primitive_types::U256;
use tracing::trace;

use zcash_history::{node_data, NodeData};
use zcash_protocol::consensus::{BlockHeight, BranchId};

use crate::block::BlockHeader;

/// Expands compact difficulty bits into a target.
///
/// Returns `(target, is_negative, did_overflow)`.
fn target_from_compact(compact: u32) -> (U256, bool, bool) {
    let size = compact >> 24;
    let word = compact & 0x007fffff;
    let result = if size <= 3 {
        U256::from(word >> (8 * (3 - size)))
    } else {
        U256::from(word) << (8 * (size - 3)) as usize
    };
    (
        result,
        word != 0 && (compact & 0x00800000) != 0,
        word != 0 && ((size > 34) || (word > 0xff && size > 33) || (word > 0xffff && size > 32)),
    )
}

/// Returns the expected number of hashes required to produce a block with the given
/// difficulty bits, `2^256 / (target + 1)`.
///
/// Bits that encode a negative, overflowing, or zero target represent no work.
pub fn block_work(bits: u32) -> U256 {
    let (target, is_negative, did_overflow) = target_from_compact(bits);
    if is_negative || did_overflow || target.is_zero() {
        return U256::zero();
    }

    // 2^256 / (target + 1) == ~target / (target + 1) + 1
    (!target / (target + U256::one())) + U256::one()
}

/// Builds the V1 (Heartwood and Canopy) history tree leaf for a block.
///
/// The leaf commitment is the block hash itself.
pub fn leaf_from_block(
    header: &BlockHeader,
    height: BlockHeight,
    sapling_root: [u8; 32],
    sapling_tx: u64,
    consensus_branch_id: BranchId,
) -> NodeData {
    let height = u64::from(height);
    trace!(height, hash = %header.hash(), "Building history leaf");

    NodeData {
        consensus_branch_id: consensus_branch_id.into(),
        subtree_commitment: header.hash().0,
        start_time: header.time,
        end_time: header.time,
        start_target: header.bits,
        end_target: header.bits,
        start_sapling_root: sapling_root,
        end_sapling_root: sapling_root,
        subtree_total_work: block_work(header.bits),
        start_height: height,
        end_height: height,
        sapling_tx,
    }
}

/// Builds the V2 (NU5 onwards) history tree leaf for a block.
#[allow(clippy::too_many_arguments)]
pub fn leaf_from_block_v2(
    header: &BlockHeader,
    height: BlockHeight,
    sapling_root: [u8; 32],
    sapling_tx: u64,
    orchard_root: [u8; 32],
    orchard_tx: u64,
    consensus_branch_id: BranchId,
) -> node_data::V2 {
    node_data::V2 {
        v1: leaf_from_block(header, height, sapling_root, sapling_tx, consensus_branch_id),
        start_orchard_root: orchard_root,
        end_orchard_root: orchard_root,
        orchard_tx,
    }
}
