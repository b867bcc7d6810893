//! Structs and methods for handling Zcash transactions.
pub mod components;
pub mod sighash;
mod sighash_v4;
mod sighash_v5;
pub mod txid;
pub mod util;

#[cfg(test)]
pub(crate) mod tests;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use std::ops::Deref;
use tracing::debug;

use zcash_protocol::{
    consensus::{BlockHeight, BranchId},
    constants::{
        OVERWINTERED_FLAG, OVERWINTER_TX_VERSION, OVERWINTER_VERSION_GROUP_ID,
        SAPLING_TX_VERSION, SAPLING_VERSION_GROUP_ID, V5_TX_VERSION, V5_VERSION_GROUP_ID,
    },
    value::ZatBalance,
};

pub use zcash_protocol::TxId;

use self::{
    components::{orchard, sapling, sprout, transparent},
    txid::{to_txid, BlockTxCommitmentDigester, TxIdDigester},
    util::sha256d::{HashReader, HashWriter},
};
use crate::Error;

/// The set of transaction formats that this crate can read and write.
///
/// Versions 1 and 2 predate Overwinter and carry no version group; they are both
/// represented by [`TxVersion::Sprout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxVersion {
    /// A pre-Overwinter transaction, with the given version number.
    Sprout(u32),
    Overwinter,
    Sapling,
    /// The v5 transaction format introduced by NU5 ([ZIP 225]).
    ///
    /// [ZIP 225]: https://zips.z.cash/zip-0225
    Zip225,
}

impl TxVersion {
    /// Reads the transaction header, and the version group ID if the header has the
    /// `fOverwintered` bit set.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, Error> {
        let header = reader.read_u32::<LittleEndian>()?;
        let overwintered = (header >> 31) == 1;
        let version = header & 0x7FFFFFFF;

        if overwintered {
            let version_group_id = reader.read_u32::<LittleEndian>()?;
            match (version, version_group_id) {
                (OVERWINTER_TX_VERSION, OVERWINTER_VERSION_GROUP_ID) => Ok(TxVersion::Overwinter),
                (SAPLING_TX_VERSION, SAPLING_VERSION_GROUP_ID) => Ok(TxVersion::Sapling),
                (V5_TX_VERSION, V5_VERSION_GROUP_ID) => Ok(TxVersion::Zip225),
                _ => Err(Error::UnsupportedVersion {
                    header,
                    version_group_id,
                }),
            }
        } else if version >= 1 {
            Ok(TxVersion::Sprout(version))
        } else {
            Err(Error::UnsupportedVersion {
                header,
                version_group_id: 0,
            })
        }
    }

    pub fn header(&self) -> u32 {
        // After Sprout, the overwintered bit is always set.
        let overwintered = match self {
            TxVersion::Sprout(_) => 0,
            _ => OVERWINTERED_FLAG,
        };

        overwintered
            | match self {
                TxVersion::Sprout(v) => *v,
                TxVersion::Overwinter => OVERWINTER_TX_VERSION,
                TxVersion::Sapling => SAPLING_TX_VERSION,
                TxVersion::Zip225 => V5_TX_VERSION,
            }
    }

    pub fn version_group_id(&self) -> u32 {
        match self {
            TxVersion::Sprout(_) => 0,
            TxVersion::Overwinter => OVERWINTER_VERSION_GROUP_ID,
            TxVersion::Sapling => SAPLING_VERSION_GROUP_ID,
            TxVersion::Zip225 => V5_VERSION_GROUP_ID,
        }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.header())?;
        match self {
            TxVersion::Sprout(_) => Ok(()),
            _ => writer.write_u32::<LittleEndian>(self.version_group_id()),
        }
    }

    /// Returns `true` if this transaction version carries an expiry height.
    pub fn has_overwinter(&self) -> bool {
        !matches!(self, TxVersion::Sprout(_))
    }

    /// Returns `true` if this transaction version may carry a JoinSplit vector.
    pub fn has_sprout(&self) -> bool {
        match self {
            TxVersion::Sprout(v) => *v >= 2u32,
            TxVersion::Overwinter | TxVersion::Sapling => true,
            TxVersion::Zip225 => false,
        }
    }

    /// Returns `true` if JoinSplit proofs in this version are Groth16 proofs rather than
    /// PHGR13 proofs.
    pub fn uses_groth_proofs(&self) -> bool {
        matches!(self, TxVersion::Sapling)
    }

    pub fn has_sapling(&self) -> bool {
        matches!(self, TxVersion::Sapling | TxVersion::Zip225)
    }

    pub fn has_orchard(&self) -> bool {
        matches!(self, TxVersion::Zip225)
    }

    /// Suggests the transaction version that should be used in the given Zcash epoch.
    pub fn suggested_for_branch(consensus_branch_id: BranchId) -> Self {
        match consensus_branch_id {
            BranchId::Sprout => TxVersion::Sprout(2),
            BranchId::Overwinter => TxVersion::Overwinter,
            BranchId::Sapling | BranchId::Blossom | BranchId::Heartwood | BranchId::Canopy => {
                TxVersion::Sapling
            }
            BranchId::Nu5 | BranchId::Nu6 => TxVersion::Zip225,
        }
    }
}

/// A v1 or v2 transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SproutTx {
    pub version: u32,
    pub transparent_bundle: Option<transparent::Bundle>,
    pub lock_time: u32,
    pub sprout_bundle: Option<sprout::Bundle>,
}

/// A v3 transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverwinterTx {
    pub transparent_bundle: Option<transparent::Bundle>,
    pub lock_time: u32,
    pub expiry_height: BlockHeight,
    pub sprout_bundle: Option<sprout::Bundle>,
}

/// A v4 transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaplingTx {
    pub transparent_bundle: Option<transparent::Bundle>,
    pub lock_time: u32,
    pub expiry_height: BlockHeight,
    pub sapling_bundle: Option<sapling::Bundle>,
    pub sprout_bundle: Option<sprout::Bundle>,
}

/// A v5 transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zip225Tx {
    pub consensus_branch_id: BranchId,
    pub lock_time: u32,
    pub expiry_height: BlockHeight,
    pub transparent_bundle: Option<transparent::Bundle>,
    pub sapling_bundle: Option<sapling::Bundle>,
    pub orchard_bundle: Option<orchard::Bundle>,
}

impl Zip225Tx {
    /// Computes the [ZIP 244] digest tree of this transaction with the given digester.
    ///
    /// [ZIP 244]: https://zips.z.cash/zip-0244
    pub fn digest<D: TransactionDigest>(&self, digester: D) -> D::Digest {
        digester.combine(
            digester.digest_header(
                TxVersion::Zip225,
                self.consensus_branch_id,
                self.lock_time,
                self.expiry_height,
            ),
            digester.digest_transparent(self.transparent_bundle.as_ref()),
            digester.digest_sapling(self.sapling_bundle.as_ref()),
            digester.digest_orchard(self.orchard_bundle.as_ref()),
        )
    }

    fn txid(&self) -> TxId {
        to_txid(self.consensus_branch_id, &self.digest(TxIdDigester))
    }
}

/// The data contained in a transaction, tagged by its format.
///
/// Fields that a format does not carry are not representable in its variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionData {
    Sprout(SproutTx),
    Overwinter(OverwinterTx),
    Sapling(SaplingTx),
    Zip225(Zip225Tx),
}

impl TransactionData {
    pub fn version(&self) -> TxVersion {
        match self {
            TransactionData::Sprout(tx) => TxVersion::Sprout(tx.version),
            TransactionData::Overwinter(_) => TxVersion::Overwinter,
            TransactionData::Sapling(_) => TxVersion::Sapling,
            TransactionData::Zip225(_) => TxVersion::Zip225,
        }
    }

    /// Returns the consensus branch ID committed to by the transaction encoding, if any.
    ///
    /// Only v5 transactions carry a consensus branch ID.
    pub fn consensus_branch_id(&self) -> Option<BranchId> {
        match self {
            TransactionData::Zip225(tx) => Some(tx.consensus_branch_id),
            _ => None,
        }
    }

    pub fn lock_time(&self) -> u32 {
        match self {
            TransactionData::Sprout(tx) => tx.lock_time,
            TransactionData::Overwinter(tx) => tx.lock_time,
            TransactionData::Sapling(tx) => tx.lock_time,
            TransactionData::Zip225(tx) => tx.lock_time,
        }
    }

    /// Returns the expiry height, which is zero for pre-Overwinter transactions.
    pub fn expiry_height(&self) -> BlockHeight {
        match self {
            TransactionData::Sprout(_) => BlockHeight::from_u32(0),
            TransactionData::Overwinter(tx) => tx.expiry_height,
            TransactionData::Sapling(tx) => tx.expiry_height,
            TransactionData::Zip225(tx) => tx.expiry_height,
        }
    }

    pub fn transparent_bundle(&self) -> Option<&transparent::Bundle> {
        match self {
            TransactionData::Sprout(tx) => tx.transparent_bundle.as_ref(),
            TransactionData::Overwinter(tx) => tx.transparent_bundle.as_ref(),
            TransactionData::Sapling(tx) => tx.transparent_bundle.as_ref(),
            TransactionData::Zip225(tx) => tx.transparent_bundle.as_ref(),
        }
    }

    pub fn sprout_bundle(&self) -> Option<&sprout::Bundle> {
        match self {
            TransactionData::Sprout(tx) => tx.sprout_bundle.as_ref(),
            TransactionData::Overwinter(tx) => tx.sprout_bundle.as_ref(),
            TransactionData::Sapling(tx) => tx.sprout_bundle.as_ref(),
            TransactionData::Zip225(_) => None,
        }
    }

    pub fn sapling_bundle(&self) -> Option<&sapling::Bundle> {
        match self {
            TransactionData::Sapling(tx) => tx.sapling_bundle.as_ref(),
            TransactionData::Zip225(tx) => tx.sapling_bundle.as_ref(),
            _ => None,
        }
    }

    pub fn orchard_bundle(&self) -> Option<&orchard::Bundle> {
        match self {
            TransactionData::Zip225(tx) => tx.orchard_bundle.as_ref(),
            _ => None,
        }
    }

    /// Returns the net Sapling value balance, which is zero when there is no bundle.
    pub fn sapling_value_balance(&self) -> ZatBalance {
        self.sapling_bundle()
            .map_or(ZatBalance::zero(), |b| b.value_balance)
    }

    /// Checks the structural rules that every encodable transaction must satisfy.
    ///
    /// Parsed transactions always satisfy these rules; they only need checking for data
    /// assembled by hand.
    pub fn validate(&self) -> Result<(), Error> {
        let version = self.version();

        if let TxVersion::Sprout(v) = version {
            if v == 0 || v & OVERWINTERED_FLAG != 0 {
                return Err(Error::InvariantViolation(
                    "pre-Overwinter transaction versions must lie between 1 and 2^31 - 1",
                ));
            }
        }

        if self
            .transparent_bundle()
            .map_or(false, |b| b.vin.is_empty() && b.vout.is_empty())
        {
            return Err(Error::InvariantViolation(
                "transparent bundles must contain at least one input or output",
            ));
        }

        if let Some(bundle) = self.sprout_bundle() {
            if !version.has_sprout() {
                return Err(Error::InvariantViolation(
                    "JoinSplits require transaction version 2 or later",
                ));
            }
            if !bundle.proofs_match(version.uses_groth_proofs()) {
                return Err(Error::InvariantViolation(
                    "JoinSplit proof type does not match the transaction version",
                ));
            }
        }

        if let Some(bundle) = self.sapling_bundle() {
            if bundle.is_empty() {
                return Err(Error::InvariantViolation(
                    "Sapling bundles must contain at least one spend or output",
                ));
            }
            if version == TxVersion::Zip225
                && !bundle.shielded_spends.is_empty()
                && bundle.shared_anchor().is_none()
            {
                return Err(Error::InvariantViolation(
                    "v5 Sapling spends must share a single anchor",
                ));
            }
        }

        Ok(())
    }

    /// Validates the data and computes its transaction ID.
    pub fn freeze(self) -> Result<Transaction, Error> {
        Transaction::from_data(self)
    }

    /// Writes the consensus encoding of this transaction, after checking that it is
    /// well-formed.
    pub fn write<W: Write>(&self, writer: W) -> Result<(), Error> {
        self.validate()?;
        self.write_unchecked(writer)?;
        Ok(())
    }

    fn write_unchecked<W: Write>(&self, mut writer: W) -> io::Result<()> {
        self.version().write(&mut writer)?;

        match self {
            TransactionData::Sprout(tx) => {
                transparent::Bundle::write(tx.transparent_bundle.as_ref(), &mut writer)?;
                writer.write_u32::<LittleEndian>(tx.lock_time)?;
                if self.version().has_sprout() {
                    sprout::Bundle::write(tx.sprout_bundle.as_ref(), &mut writer)?;
                }
            }
            TransactionData::Overwinter(tx) => {
                transparent::Bundle::write(tx.transparent_bundle.as_ref(), &mut writer)?;
                writer.write_u32::<LittleEndian>(tx.lock_time)?;
                writer.write_u32::<LittleEndian>(u32::from(tx.expiry_height))?;
                sprout::Bundle::write(tx.sprout_bundle.as_ref(), &mut writer)?;
            }
            TransactionData::Sapling(tx) => {
                transparent::Bundle::write(tx.transparent_bundle.as_ref(), &mut writer)?;
                writer.write_u32::<LittleEndian>(tx.lock_time)?;
                writer.write_u32::<LittleEndian>(u32::from(tx.expiry_height))?;
                sapling::write_v4_components(tx.sapling_bundle.as_ref(), &mut writer)?;
                sprout::Bundle::write(tx.sprout_bundle.as_ref(), &mut writer)?;
                if let Some(bundle) = &tx.sapling_bundle {
                    writer.write_all(&bundle.binding_sig)?;
                }
            }
            TransactionData::Zip225(tx) => {
                writer.write_u32::<LittleEndian>(u32::from(tx.consensus_branch_id))?;
                writer.write_u32::<LittleEndian>(tx.lock_time)?;
                writer.write_u32::<LittleEndian>(u32::from(tx.expiry_height))?;
                transparent::Bundle::write(tx.transparent_bundle.as_ref(), &mut writer)?;
                sapling::write_v5_bundle(tx.sapling_bundle.as_ref(), &mut writer)?;
                orchard::write_v5_bundle(tx.orchard_bundle.as_ref(), &mut writer)?;
            }
        }

        Ok(())
    }
}

/// A Zcash transaction, together with its transaction ID.
#[derive(Clone, Debug)]
pub struct Transaction {
    txid: TxId,
    data: TransactionData,
}

impl Deref for Transaction {
    type Target = TransactionData;

    fn deref(&self) -> &TransactionData {
        &self.data
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Transaction) -> bool {
        self.txid == other.txid
    }
}

impl Transaction {
    fn from_data(data: TransactionData) -> Result<Self, Error> {
        data.validate()?;
        let txid = match &data {
            TransactionData::Zip225(tx) => tx.txid(),
            _ => {
                let mut writer = HashWriter::default();
                data.write_unchecked(&mut writer)?;
                TxId::from_bytes(writer.into_hash())
            }
        };

        Ok(Transaction { txid, data })
    }

    pub fn into_data(self) -> TransactionData {
        self.data
    }

    pub fn txid(&self) -> TxId {
        self.txid
    }

    /// Reads a transaction from its consensus encoding.
    ///
    /// Bytes following the end of the transaction are left unread.
    pub fn read<R: Read>(reader: R) -> Result<Self, Error> {
        let mut reader = HashReader::new(reader);
        let version = TxVersion::read(&mut reader)?;

        let tx = match version {
            TxVersion::Zip225 => Self::read_v5(reader.into_base_reader())?,
            _ => Self::read_v4(reader, version)?,
        };

        debug!(txid = %tx.txid, version = ?tx.version(), "Parsed transaction");
        Ok(tx)
    }

    fn read_v4<R: Read>(mut reader: HashReader<R>, version: TxVersion) -> Result<Self, Error> {
        let transparent_bundle = transparent::Bundle::read(&mut reader)?;
        let lock_time = reader.read_u32::<LittleEndian>()?;
        let expiry_height: BlockHeight = if version.has_overwinter() {
            reader.read_u32::<LittleEndian>()?.into()
        } else {
            0u32.into()
        };

        let sapling_components = if version == TxVersion::Sapling {
            Some(sapling::read_v4_components(&mut reader)?)
        } else {
            None
        };

        let sprout_bundle = if version.has_sprout() {
            sprout::Bundle::read(&mut reader, version.uses_groth_proofs())?
        } else {
            None
        };

        let sapling_bundle = match sapling_components {
            Some((value_balance, shielded_spends, shielded_outputs))
                if !(shielded_spends.is_empty() && shielded_outputs.is_empty()) =>
            {
                let binding_sig = sapling::read_signature(&mut reader)?;
                Some(sapling::Bundle {
                    shielded_spends,
                    shielded_outputs,
                    value_balance,
                    binding_sig,
                })
            }
            _ => None,
        };

        let txid = TxId::from_bytes(reader.into_hash());
        let data = match version {
            TxVersion::Sprout(version) => TransactionData::Sprout(SproutTx {
                version,
                transparent_bundle,
                lock_time,
                sprout_bundle,
            }),
            TxVersion::Overwinter => TransactionData::Overwinter(OverwinterTx {
                transparent_bundle,
                lock_time,
                expiry_height,
                sprout_bundle,
            }),
            TxVersion::Sapling => TransactionData::Sapling(SaplingTx {
                transparent_bundle,
                lock_time,
                expiry_height,
                sapling_bundle,
                sprout_bundle,
            }),
            TxVersion::Zip225 => {
                return Err(Error::UnsupportedVersion {
                    header: version.header(),
                    version_group_id: version.version_group_id(),
                })
            }
        };

        Ok(Transaction { txid, data })
    }

    pub(crate) fn read_amount<R: Read>(mut reader: R) -> io::Result<ZatBalance> {
        let mut tmp = [0; 8];
        reader.read_exact(&mut tmp)?;
        ZatBalance::from_i64_le_bytes(tmp)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "valueBalance out of range"))
    }

    fn read_v5<R: Read>(mut reader: R) -> Result<Self, Error> {
        let raw_branch_id = reader.read_u32::<LittleEndian>()?;
        let consensus_branch_id = BranchId::try_from(raw_branch_id)
            .map_err(|_| Error::UnknownConsensusBranch(raw_branch_id))?;
        let lock_time = reader.read_u32::<LittleEndian>()?;
        let expiry_height: BlockHeight = reader.read_u32::<LittleEndian>()?.into();

        let transparent_bundle = transparent::Bundle::read(&mut reader)?;
        let sapling_bundle = sapling::read_v5_bundle(&mut reader)?;
        let orchard_bundle = orchard::read_v5_bundle(&mut reader)?;

        let tx = Zip225Tx {
            consensus_branch_id,
            lock_time,
            expiry_height,
            transparent_bundle,
            sapling_bundle,
            orchard_bundle,
        };

        Ok(Transaction {
            txid: tx.txid(),
            data: TransactionData::Zip225(tx),
        })
    }

    /// Writes the consensus encoding of this transaction.
    pub fn write<W: Write>(&self, writer: W) -> io::Result<()> {
        self.data.write_unchecked(writer)
    }

    /// Returns the commitment to the authorizing data of this transaction, as used in the
    /// block's `hashAuthDataRoot`.
    ///
    /// Transactions that predate v5 have no such commitment and return `[0xFF; 32]`.
    pub fn auth_commitment(&self) -> [u8; 32] {
        match &self.data {
            TransactionData::Zip225(tx) => {
                let mut hash = [0; 32];
                hash.copy_from_slice(tx.digest(BlockTxCommitmentDigester).as_bytes());
                hash
            }
            _ => [0xFF; 32],
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransparentDigests<A> {
    pub prevout_digest: A,
    pub sequence_digest: A,
    pub outputs_digest: A,
    pub per_input_digest: Option<A>,
}

#[derive(Clone, Debug)]
pub struct TxDigests<A> {
    pub header_digest: A,
    pub transparent_digests: Option<TransparentDigests<A>>,
    pub sapling_digest: A,
    pub orchard_digest: A,
}

/// A visitor over the parts of a v5 transaction that the [ZIP 244] digest tree commits to.
///
/// [ZIP 244]: https://zips.z.cash/zip-0244
pub trait TransactionDigest {
    type HeaderDigest;
    type TransparentDigest;
    type SaplingDigest;
    type OrchardDigest;

    type Digest;

    fn digest_header(
        &self,
        version: TxVersion,
        consensus_branch_id: BranchId,
        lock_time: u32,
        expiry_height: BlockHeight,
    ) -> Self::HeaderDigest;

    fn digest_transparent(
        &self,
        transparent_bundle: Option<&transparent::Bundle>,
    ) -> Self::TransparentDigest;

    fn digest_sapling(&self, sapling_bundle: Option<&sapling::Bundle>) -> Self::SaplingDigest;

    fn digest_orchard(&self, orchard_bundle: Option<&orchard::Bundle>) -> Self::OrchardDigest;

    fn combine(
        &self,
        header_digest: Self::HeaderDigest,
        transparent_digest: Self::TransparentDigest,
        sapling_digest: Self::SaplingDigest,
        orchard_digest: Self::OrchardDigest,
    ) -> Self::Digest;
}

/// Returns the consensus encoding of the given transaction.
pub fn serialize(tx: &Transaction) -> Vec<u8> {
    let mut bytes = vec![];
    tx.write(&mut bytes)
        .expect("writing to a Vec cannot fail");
    bytes
}

/// Parses a transaction that must occupy the whole of `bytes`.
pub fn deserialize(bytes: &[u8]) -> Result<Transaction, Error> {
    let mut reader = bytes;
    let tx = Transaction::read(&mut reader)?;
    if !reader.is_empty() {
        return Err(Error::TrailingBytes(reader.len()));
    }
    Ok(tx)
}

#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing {
    use proptest::prelude::*;

    use zcash_protocol::consensus::BranchId;

    use super::{
        components::{
            orchard::testing::{self as orchard},
            sapling::testing::{self as sapling},
            sprout::testing::{self as sprout},
            transparent::testing::{self as transparent},
        },
        OverwinterTx, SaplingTx, SproutTx, Transaction, TransactionData, TxVersion, Zip225Tx,
    };

    /// Any version valid in the given epoch: both Sprout versions before Overwinter,
    /// v4 alongside v5 from NU5, and otherwise the suggested version.
    pub fn arb_tx_version(branch_id: BranchId) -> impl Strategy<Value = TxVersion> {
        match branch_id {
            BranchId::Sprout => (1..=2u32).prop_map(TxVersion::Sprout).boxed(),
            BranchId::Nu5 | BranchId::Nu6 => prop_oneof![
                Just(TxVersion::Sapling),
                Just(TxVersion::suggested_for_branch(branch_id)),
            ]
            .boxed(),
            _ => Just(TxVersion::suggested_for_branch(branch_id)).boxed(),
        }
    }

    prop_compose! {
        pub fn arb_txdata(consensus_branch_id: BranchId)(
            version in arb_tx_version(consensus_branch_id),
        )(
            lock_time in any::<u32>(),
            expiry_height in any::<u32>(),
            transparent_bundle in transparent::arb_bundle(),
            sprout_bundle in sprout::arb_bundle_for_version(version),
            sapling_bundle in sapling::arb_bundle_for_version(version),
            orchard_bundle in orchard::arb_bundle_for_version(version),
            version in Just(version)
        ) -> TransactionData {
            match version {
                TxVersion::Sprout(version) => TransactionData::Sprout(SproutTx {
                    version,
                    transparent_bundle,
                    lock_time,
                    sprout_bundle,
                }),
                TxVersion::Overwinter => TransactionData::Overwinter(OverwinterTx {
                    transparent_bundle,
                    lock_time,
                    expiry_height: expiry_height.into(),
                    sprout_bundle,
                }),
                TxVersion::Sapling => TransactionData::Sapling(SaplingTx {
                    transparent_bundle,
                    lock_time,
                    expiry_height: expiry_height.into(),
                    sapling_bundle,
                    sprout_bundle,
                }),
                TxVersion::Zip225 => TransactionData::Zip225(Zip225Tx {
                    consensus_branch_id,
                    lock_time,
                    expiry_height: expiry_height.into(),
                    transparent_bundle,
                    sapling_bundle,
                    orchard_bundle,
                }),
            }
        }
    }

    prop_compose! {
        pub fn arb_tx(branch_id: BranchId)(tx_data in arb_txdata(branch_id)) -> Transaction {
            Transaction::from_data(tx_data).unwrap()
        }
    }
}
