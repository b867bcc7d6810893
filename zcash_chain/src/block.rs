//! Structs and methods for handling Zcash block headers and blocks.
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::cmp;
use std::fmt;
use std::io::{self, Read, Write};
use std::ops::Deref;
use tracing::debug;

use zcash_encoding::{CompactSize, Vector, MAX_PREALLOCATION};

use crate::{
    transaction::{
        txid::hasher,
        util::sha256d::{sha256d, HashReader, HashWriter},
        Transaction,
    },
    Error,
};

const ZCASH_AUTH_DATA_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashAuthDatHash";
const ZCASH_BLOCK_COMMITMENTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashBlockCommit";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockHash(pub [u8; 32]);

impl fmt::Display for BlockHash {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = self.0;
        data.reverse();
        formatter.write_str(&hex::encode(data))
    }
}

impl BlockHash {
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hash = [0; 32];
        reader.read_exact(&mut hash)?;
        Ok(BlockHash(hash))
    }
}

/// A Zcash block header.
#[derive(Clone, Debug)]
pub struct BlockHeader {
    hash: BlockHash,
    data: BlockHeaderData,
}

impl Deref for BlockHeader {
    type Target = BlockHeaderData;

    fn deref(&self) -> &BlockHeaderData {
        &self.data
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeaderData {
    pub version: i32,
    pub prev_block: BlockHash,
    pub merkle_root: [u8; 32],
    /// The Sapling note commitment tree root before Heartwood, the chain history root
    /// during Heartwood and Canopy, and the [`block_commitments_hash`] from NU5 onwards.
    pub block_commitments: [u8; 32],
    pub time: u32,
    pub bits: u32,
    pub nonce: [u8; 32],
    pub solution: Vec<u8>,
}

impl BlockHeaderData {
    pub fn freeze(self) -> io::Result<BlockHeader> {
        BlockHeader::from_data(self)
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_all(&self.prev_block.0)?;
        writer.write_all(&self.merkle_root)?;
        writer.write_all(&self.block_commitments)?;
        writer.write_u32::<LittleEndian>(self.time)?;
        writer.write_u32::<LittleEndian>(self.bits)?;
        writer.write_all(&self.nonce)?;
        Vector::write(&mut writer, &self.solution, |w, b| w.write_u8(*b))
    }
}

impl BlockHeader {
    fn from_data(data: BlockHeaderData) -> io::Result<Self> {
        let mut writer = HashWriter::default();
        data.write(&mut writer)?;
        Ok(BlockHeader {
            hash: BlockHash(writer.into_hash()),
            data,
        })
    }

    /// Returns the hash of this header.
    pub fn hash(&self) -> BlockHash {
        self.hash
    }

    pub fn into_data(self) -> BlockHeaderData {
        self.data
    }

    pub fn read<R: Read>(reader: R) -> io::Result<Self> {
        let mut reader = HashReader::new(reader);

        let version = reader.read_i32::<LittleEndian>()?;
        let prev_block = BlockHash::read(&mut reader)?;

        let mut merkle_root = [0; 32];
        reader.read_exact(&mut merkle_root)?;

        let mut block_commitments = [0; 32];
        reader.read_exact(&mut block_commitments)?;

        let time = reader.read_u32::<LittleEndian>()?;
        let bits = reader.read_u32::<LittleEndian>()?;

        let mut nonce = [0; 32];
        reader.read_exact(&mut nonce)?;

        let solution = Vector::read(&mut reader, |r| r.read_u8())?;

        Ok(BlockHeader {
            hash: BlockHash(reader.into_hash()),
            data: BlockHeaderData {
                version,
                prev_block,
                merkle_root,
                block_commitments,
                time,
                bits,
                nonce,
                solution,
            },
        })
    }

    pub fn write<W: Write>(&self, writer: W) -> io::Result<()> {
        self.data.write(writer)
    }
}

/// A Zcash block: a header followed by its transactions.
#[derive(Clone, Debug)]
pub struct Block {
    pub header: BlockHeader,
    pub vtx: Vec<Transaction>,
}

impl Block {
    pub fn read<R: Read>(mut reader: R) -> Result<Self, Error> {
        let header = BlockHeader::read(&mut reader)?;

        let count = CompactSize::read(&mut reader)?;
        let mut vtx = Vec::with_capacity(cmp::min(count as usize, MAX_PREALLOCATION));
        for _ in 0..count {
            vtx.push(Transaction::read(&mut reader)?);
        }

        debug!(hash = %header.hash(), txs = vtx.len(), "Parsed block");
        Ok(Block { header, vtx })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        self.header.write(&mut writer)?;
        CompactSize::write(&mut writer, self.vtx.len())?;
        for tx in &self.vtx {
            tx.write(&mut writer)?;
        }
        Ok(())
    }

    /// Builds the Merkle tree for this block and returns its root.
    ///
    /// The returned `bool` indicates whether mutation was detected in the Merkle tree (a
    /// duplication of transactions in the block leading to an identical Merkle root).
    pub fn build_merkle_root(&self) -> ([u8; 32], bool) {
        let mut layer: Vec<[u8; 32]> = self.vtx.iter().map(|tx| *tx.txid().as_ref()).collect();
        let mut mutated = false;

        while layer.len() > 1 {
            let size = layer.len();
            layer = (0..size)
                .step_by(2)
                .map(|i| {
                    let i2 = cmp::min(i + 1, size - 1);
                    if i2 == i + 1 && i2 + 1 == size && layer[i] == layer[i2] {
                        // Two identical hashes at the end of the list at a particular level.
                        mutated = true;
                    }
                    let mut buf = [0; 64];
                    buf[..32].copy_from_slice(&layer[i]);
                    buf[32..].copy_from_slice(&layer[i2]);
                    sha256d(&buf)
                })
                .collect();
        }

        (layer.first().copied().unwrap_or([0; 32]), mutated)
    }

    /// Builds the [ZIP 244] authorizing data tree for this block and returns its root.
    ///
    /// The leaves are the transactions' authorizing data commitments, padded with zero
    /// leaves to the next power of two.
    ///
    /// [ZIP 244]: https://zips.z.cash/zip-0244#block-header-changes
    pub fn build_auth_data_root(&self) -> [u8; 32] {
        let mut layer: Vec<[u8; 32]> = self.vtx.iter().map(|tx| tx.auth_commitment()).collect();
        layer.resize(self.vtx.len().next_power_of_two(), [0; 32]);

        while layer.len() > 1 {
            layer = layer
                .chunks(2)
                .map(|pair| {
                    let mut h = hasher(ZCASH_AUTH_DATA_HASH_PERSONALIZATION);
                    h.update(&pair[0]);
                    h.update(&pair[1]);
                    let mut node = [0; 32];
                    node.copy_from_slice(h.finalize().as_bytes());
                    node
                })
                .collect();
        }

        layer.first().copied().unwrap_or([0; 32])
    }
}

/// Derives the NU5 `hashBlockCommitments` header field from the chain history root and
/// the authorizing data root.
pub fn block_commitments_hash(chain_history_root: [u8; 32], auth_data_root: [u8; 32]) -> [u8; 32] {
    let mut h = hasher(ZCASH_BLOCK_COMMITMENTS_HASH_PERSONALIZATION);
    h.update(&chain_history_root);
    h.update(&auth_data_root);
    h.update(&[0; 32]);

    let mut hash = [0; 32];
    hash.copy_from_slice(h.finalize().as_bytes());
    hash
}
