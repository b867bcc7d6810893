use std::borrow::Borrow;
use std::io::Write;

use blake2b_simd::{Hash as Blake2bHash, Params, State};
use byteorder::{LittleEndian, WriteBytesExt};

use zcash_protocol::{
    consensus::{BlockHeight, BranchId},
    constants::{COMPACT_NOTE_SIZE, NOTE_PLAINTEXT_SIZE},
};

use super::{
    components::{
        orchard,
        sapling::{self, OutputDescription, SpendDescription},
        transparent::{self, TxIn, TxOut},
    },
    TransactionDigest, TransparentDigests, TxDigests, TxId, TxVersion,
};

/// TxId tree root personalization
const ZCASH_TX_PERSONALIZATION_PREFIX: &[u8; 12] = b"ZcashTxHash_";

// TxId level 1 node personalization
const ZCASH_HEADERS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdHeadersHash";
const ZCASH_TRANSPARENT_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdTranspaHash";
const ZCASH_SAPLING_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdSaplingHash";
const ZCASH_ORCHARD_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdOrchardHash";

// TxId transparent level 2 node personalization
const ZCASH_PREVOUTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdPrevoutHash";
const ZCASH_SEQUENCE_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdSequencHash";
const ZCASH_OUTPUTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdOutputsHash";

// TxId sapling level 2 node personalization
const ZCASH_SAPLING_SPENDS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdSSpendsHash";
const ZCASH_SAPLING_SPENDS_COMPACT_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdSSpendCHash";
const ZCASH_SAPLING_SPENDS_NONCOMPACT_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdSSpendNHash";

const ZCASH_SAPLING_OUTPUTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdSOutputHash";
const ZCASH_SAPLING_OUTPUTS_COMPACT_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdSOutC__Hash";
const ZCASH_SAPLING_OUTPUTS_MEMOS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdSOutM__Hash";
const ZCASH_SAPLING_OUTPUTS_NONCOMPACT_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdSOutN__Hash";

// TxId orchard level 2 node personalization
const ZCASH_ORCHARD_ACTIONS_COMPACT_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdOrcActCHash";
const ZCASH_ORCHARD_ACTIONS_MEMOS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdOrcActMHash";
const ZCASH_ORCHARD_ACTIONS_NONCOMPACT_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxIdOrcActNHash";

// Authorizing data commitment personalization
const ZCASH_AUTH_PERSONALIZATION_PREFIX: &[u8; 12] = b"ZTxAuthHash_";
const ZCASH_TRANSPARENT_SCRIPTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxAuthTransHash";
const ZCASH_SAPLING_SIGS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxAuthSapliHash";
const ZCASH_ORCHARD_SIGS_HASH_PERSONALIZATION: &[u8; 16] = b"ZTxAuthOrchaHash";

pub(crate) fn hasher(personal: &[u8; 16]) -> State {
    Params::new().hash_length(32).personal(personal).to_state()
}

/// Builds a 16-byte personalization from a 12-byte prefix and a consensus branch ID.
pub(crate) fn branch_personalization(prefix: &[u8; 12], consensus_branch_id: BranchId) -> [u8; 16] {
    let mut personal = [0; 16];
    personal[..12].copy_from_slice(prefix);
    personal[12..].copy_from_slice(&u32::from(consensus_branch_id).to_le_bytes());
    personal
}

/// Sequentially append the serialized value of each transparent input
/// to a hash personalized by ZCASH_PREVOUTS_HASH_PERSONALIZATION.
/// In the case that no inputs are provided, this produces a default
/// hash from just the personalization string.
pub(crate) fn transparent_prevout_hash(vin: &[TxIn]) -> Blake2bHash {
    let mut h = hasher(ZCASH_PREVOUTS_HASH_PERSONALIZATION);
    for t_in in vin {
        t_in.prevout.write(&mut h).unwrap();
    }
    h.finalize()
}

/// Hash of the little-endian u32 interpretation of the
/// `sequence` values for each TxIn record passed in vin.
pub(crate) fn transparent_sequence_hash(vin: &[TxIn]) -> Blake2bHash {
    let mut h = hasher(ZCASH_SEQUENCE_HASH_PERSONALIZATION);
    for t_in in vin {
        (&mut h).write_u32::<LittleEndian>(t_in.sequence).unwrap();
    }
    h.finalize()
}

/// Sequentially append the full serialized value of each transparent output
/// to a hash personalized by ZCASH_OUTPUTS_HASH_PERSONALIZATION.
/// In the case that no outputs are provided, this produces a default
/// hash from just the personalization string.
pub(crate) fn transparent_outputs_hash<T: Borrow<TxOut>>(vout: &[T]) -> Blake2bHash {
    let mut h = hasher(ZCASH_OUTPUTS_HASH_PERSONALIZATION);
    for t_out in vout {
        t_out.borrow().write(&mut h).unwrap();
    }
    h.finalize()
}

/// Write disjoint parts of each Sapling shielded spend to a pair of hashes:
/// * [nullifier*] - personalized with ZCASH_SAPLING_SPENDS_COMPACT_HASH_PERSONALIZATION
/// * [(cv, anchor, rk)*] - personalized with ZCASH_SAPLING_SPENDS_NONCOMPACT_HASH_PERSONALIZATION
///
/// Then, hash these together personalized by ZCASH_SAPLING_SPENDS_HASH_PERSONALIZATION
pub(crate) fn hash_sapling_spends(shielded_spends: &[SpendDescription]) -> Blake2bHash {
    let mut ch = hasher(ZCASH_SAPLING_SPENDS_COMPACT_HASH_PERSONALIZATION);
    let mut nh = hasher(ZCASH_SAPLING_SPENDS_NONCOMPACT_HASH_PERSONALIZATION);
    for s_spend in shielded_spends {
        // we build the hash of nullifiers separately for compact blocks.
        ch.write_all(&s_spend.nullifier).unwrap();

        nh.write_all(&s_spend.cv).unwrap();
        nh.write_all(&s_spend.anchor).unwrap();
        nh.write_all(&s_spend.rk).unwrap();
    }

    let mut h = hasher(ZCASH_SAPLING_SPENDS_HASH_PERSONALIZATION);
    if !shielded_spends.is_empty() {
        h.write_all(ch.finalize().as_bytes()).unwrap();
        h.write_all(nh.finalize().as_bytes()).unwrap();
    }
    h.finalize()
}

/// Write disjoint parts of each Sapling shielded output as 3 separate hashes:
/// * [(cmu, epk, enc_ciphertext[..52])*] personalized with ZCASH_SAPLING_OUTPUTS_COMPACT_HASH_PERSONALIZATION
/// * [enc_ciphertext[52..564]*] (memo ciphertexts) personalized with ZCASH_SAPLING_OUTPUTS_MEMOS_HASH_PERSONALIZATION
/// * [(cv, enc_ciphertext[564..], out_ciphertext)*] personalized with ZCASH_SAPLING_OUTPUTS_NONCOMPACT_HASH_PERSONALIZATION
///
/// Then, hash these together personalized with ZCASH_SAPLING_OUTPUTS_HASH_PERSONALIZATION
pub(crate) fn hash_sapling_outputs(shielded_outputs: &[OutputDescription]) -> Blake2bHash {
    let mut ch = hasher(ZCASH_SAPLING_OUTPUTS_COMPACT_HASH_PERSONALIZATION);
    let mut mh = hasher(ZCASH_SAPLING_OUTPUTS_MEMOS_HASH_PERSONALIZATION);
    let mut nh = hasher(ZCASH_SAPLING_OUTPUTS_NONCOMPACT_HASH_PERSONALIZATION);
    for s_out in shielded_outputs {
        ch.write_all(&s_out.cmu).unwrap();
        ch.write_all(&s_out.ephemeral_key).unwrap();
        ch.write_all(&s_out.enc_ciphertext[..COMPACT_NOTE_SIZE])
            .unwrap();

        mh.write_all(&s_out.enc_ciphertext[COMPACT_NOTE_SIZE..NOTE_PLAINTEXT_SIZE])
            .unwrap();

        nh.write_all(&s_out.cv).unwrap();
        nh.write_all(&s_out.enc_ciphertext[NOTE_PLAINTEXT_SIZE..])
            .unwrap();
        nh.write_all(&s_out.out_ciphertext).unwrap();
    }

    let mut h = hasher(ZCASH_SAPLING_OUTPUTS_HASH_PERSONALIZATION);
    if !shielded_outputs.is_empty() {
        h.write_all(ch.finalize().as_bytes()).unwrap();
        h.write_all(mh.finalize().as_bytes()).unwrap();
        h.write_all(nh.finalize().as_bytes()).unwrap();
    }
    h.finalize()
}

/// The txid commits to the prevouts, sequence numbers and outputs of a transparent bundle.
fn transparent_digests(bundle: &transparent::Bundle) -> TransparentDigests<Blake2bHash> {
    TransparentDigests {
        prevout_digest: transparent_prevout_hash(&bundle.vin),
        sequence_digest: transparent_sequence_hash(&bundle.vin),
        outputs_digest: transparent_outputs_hash(&bundle.vout),
        per_input_digest: None,
    }
}

fn hash_header_txid_data(
    version: TxVersion,
    // we commit to the consensus branch ID with the header
    consensus_branch_id: BranchId,
    lock_time: u32,
    expiry_height: BlockHeight,
) -> Blake2bHash {
    let mut h = hasher(ZCASH_HEADERS_HASH_PERSONALIZATION);

    (&mut h)
        .write_u32::<LittleEndian>(version.header())
        .unwrap();
    (&mut h)
        .write_u32::<LittleEndian>(version.version_group_id())
        .unwrap();
    (&mut h)
        .write_u32::<LittleEndian>(consensus_branch_id.into())
        .unwrap();
    (&mut h).write_u32::<LittleEndian>(lock_time).unwrap();
    (&mut h)
        .write_u32::<LittleEndian>(expiry_height.into())
        .unwrap();

    h.finalize()
}

fn hash_transparent_txid_data(
    t_digests: Option<&TransparentDigests<Blake2bHash>>,
) -> Blake2bHash {
    let mut h = hasher(ZCASH_TRANSPARENT_HASH_PERSONALIZATION);
    if let Some(d) = t_digests {
        h.write_all(d.prevout_digest.as_bytes()).unwrap();
        h.write_all(d.sequence_digest.as_bytes()).unwrap();
        h.write_all(d.outputs_digest.as_bytes()).unwrap();
        if let Some(s) = d.per_input_digest {
            h.write_all(s.as_bytes()).unwrap();
        };
    }
    h.finalize()
}

fn hash_sapling_txid_data(sapling_bundle: Option<&sapling::Bundle>) -> Blake2bHash {
    let mut h = hasher(ZCASH_SAPLING_HASH_PERSONALIZATION);
    if let Some(bundle) = sapling_bundle {
        if !bundle.is_empty() {
            h.write_all(hash_sapling_spends(&bundle.shielded_spends).as_bytes())
                .unwrap();

            h.write_all(hash_sapling_outputs(&bundle.shielded_outputs).as_bytes())
                .unwrap();

            h.write_all(&bundle.value_balance.to_i64_le_bytes())
                .unwrap();
        }
    }
    h.finalize()
}

/// Write disjoint parts of each Orchard shielded action as 3 separate hashes:
/// * [(nullifier, cmx, ephemeral_key, enc_ciphertext[..52])*] personalized
///   with ZCASH_ORCHARD_ACTIONS_COMPACT_HASH_PERSONALIZATION
/// * [enc_ciphertext[52..564]*] (memo ciphertexts) personalized
///   with ZCASH_ORCHARD_ACTIONS_MEMOS_HASH_PERSONALIZATION
/// * [(cv, rk, enc_ciphertext[564..], out_ciphertext)*] personalized
///   with ZCASH_ORCHARD_ACTIONS_NONCOMPACT_HASH_PERSONALIZATION
///
/// Then, hash these together along with (flags, value_balance_orchard, anchor_orchard),
/// personalized with ZCASH_ORCHARD_HASH_PERSONALIZATION
fn hash_orchard_txid_data(orchard_bundle: Option<&orchard::Bundle>) -> Blake2bHash {
    let mut h = hasher(ZCASH_ORCHARD_HASH_PERSONALIZATION);
    if let Some(bundle) = orchard_bundle {
        let mut ch = hasher(ZCASH_ORCHARD_ACTIONS_COMPACT_HASH_PERSONALIZATION);
        let mut mh = hasher(ZCASH_ORCHARD_ACTIONS_MEMOS_HASH_PERSONALIZATION);
        let mut nh = hasher(ZCASH_ORCHARD_ACTIONS_NONCOMPACT_HASH_PERSONALIZATION);

        for action in bundle.actions.iter() {
            ch.write_all(&action.nullifier).unwrap();
            ch.write_all(&action.cmx).unwrap();
            ch.write_all(&action.ephemeral_key).unwrap();
            ch.write_all(&action.enc_ciphertext[..COMPACT_NOTE_SIZE])
                .unwrap();

            mh.write_all(&action.enc_ciphertext[COMPACT_NOTE_SIZE..NOTE_PLAINTEXT_SIZE])
                .unwrap();

            nh.write_all(&action.cv_net).unwrap();
            nh.write_all(&action.rk).unwrap();
            nh.write_all(&action.enc_ciphertext[NOTE_PLAINTEXT_SIZE..])
                .unwrap();
            nh.write_all(&action.out_ciphertext).unwrap();
        }

        h.write_all(ch.finalize().as_bytes()).unwrap();
        h.write_all(mh.finalize().as_bytes()).unwrap();
        h.write_all(nh.finalize().as_bytes()).unwrap();
        h.write_all(&[bundle.flags.to_byte()]).unwrap();
        h.write_all(&bundle.value_balance.to_i64_le_bytes())
            .unwrap();
        h.write_all(&bundle.anchor).unwrap();
    }
    h.finalize()
}

pub struct TxIdDigester;

// A TransactionDigest implementation that commits to all of the effecting
// data of a transaction to produce a nonmalleable transaction identifier.
//
// This expects and relies upon the existence of canonical encodings for
// each effecting component of a transaction.
impl TransactionDigest for TxIdDigester {
    type HeaderDigest = Blake2bHash;
    type TransparentDigest = Option<TransparentDigests<Blake2bHash>>;
    type SaplingDigest = Blake2bHash;
    type OrchardDigest = Blake2bHash;

    type Digest = TxDigests<Blake2bHash>;

    fn digest_header(
        &self,
        version: TxVersion,
        consensus_branch_id: BranchId,
        lock_time: u32,
        expiry_height: BlockHeight,
    ) -> Self::HeaderDigest {
        hash_header_txid_data(version, consensus_branch_id, lock_time, expiry_height)
    }

    fn digest_transparent(
        &self,
        transparent_bundle: Option<&transparent::Bundle>,
    ) -> Self::TransparentDigest {
        transparent_bundle.map(transparent_digests)
    }

    fn digest_sapling(&self, sapling_bundle: Option<&sapling::Bundle>) -> Self::SaplingDigest {
        hash_sapling_txid_data(sapling_bundle)
    }

    fn digest_orchard(&self, orchard_bundle: Option<&orchard::Bundle>) -> Self::OrchardDigest {
        hash_orchard_txid_data(orchard_bundle)
    }

    fn combine(
        &self,
        header_digest: Self::HeaderDigest,
        transparent_digests: Self::TransparentDigest,
        sapling_digest: Self::SaplingDigest,
        orchard_digest: Self::OrchardDigest,
    ) -> Self::Digest {
        TxDigests {
            header_digest,
            transparent_digests,
            sapling_digest,
            orchard_digest,
        }
    }
}

pub fn to_hash(
    consensus_branch_id: BranchId,
    header_digest: Blake2bHash,
    transparent_digests: Option<&TransparentDigests<Blake2bHash>>,
    sapling_digest: Blake2bHash,
    orchard_digest: Blake2bHash,
) -> Blake2bHash {
    let personal = branch_personalization(ZCASH_TX_PERSONALIZATION_PREFIX, consensus_branch_id);

    let mut h = hasher(&personal);
    h.write_all(header_digest.as_bytes()).unwrap();
    h.write_all(hash_transparent_txid_data(transparent_digests).as_bytes())
        .unwrap();
    h.write_all(sapling_digest.as_bytes()).unwrap();
    h.write_all(orchard_digest.as_bytes()).unwrap();

    h.finalize()
}

pub fn to_txid(consensus_branch_id: BranchId, digests: &TxDigests<Blake2bHash>) -> TxId {
    let txid_digest = to_hash(
        consensus_branch_id,
        digests.header_digest,
        digests.transparent_digests.as_ref(),
        digests.sapling_digest,
        digests.orchard_digest,
    );

    let mut txid = [0; 32];
    txid.copy_from_slice(txid_digest.as_bytes());
    TxId::from_bytes(txid)
}

/// Digester which constructs a digest of only the witness data.
/// This does not internally commit to the txid, so if that is
/// desired it should be done using the result of this digest
/// function.
pub struct BlockTxCommitmentDigester;

impl TransactionDigest for BlockTxCommitmentDigester {
    /// We use the header digest to pass the consensus branch ID into
    /// where it needs to be used for personalization string construction.
    type HeaderDigest = BranchId;
    type TransparentDigest = Blake2bHash;
    type SaplingDigest = Blake2bHash;
    type OrchardDigest = Blake2bHash;

    type Digest = Blake2bHash;

    fn digest_header(
        &self,
        _version: TxVersion,
        consensus_branch_id: BranchId,
        _lock_time: u32,
        _expiry_height: BlockHeight,
    ) -> Self::HeaderDigest {
        consensus_branch_id
    }

    fn digest_transparent(&self, transparent_bundle: Option<&transparent::Bundle>) -> Blake2bHash {
        let mut h = hasher(ZCASH_TRANSPARENT_SCRIPTS_HASH_PERSONALIZATION);
        if let Some(bundle) = transparent_bundle {
            for txin in &bundle.vin {
                txin.script_sig.write(&mut h).unwrap();
            }
        }
        h.finalize()
    }

    fn digest_sapling(&self, sapling_bundle: Option<&sapling::Bundle>) -> Blake2bHash {
        let mut h = hasher(ZCASH_SAPLING_SIGS_HASH_PERSONALIZATION);
        if let Some(bundle) = sapling_bundle {
            for spend in &bundle.shielded_spends {
                h.write_all(&spend.zkproof).unwrap();
            }

            for spend in &bundle.shielded_spends {
                h.write_all(&spend.spend_auth_sig).unwrap();
            }

            for output in &bundle.shielded_outputs {
                h.write_all(&output.zkproof).unwrap();
            }

            h.write_all(&bundle.binding_sig).unwrap();
        }
        h.finalize()
    }

    fn digest_orchard(&self, orchard_bundle: Option<&orchard::Bundle>) -> Self::OrchardDigest {
        let mut h = hasher(ZCASH_ORCHARD_SIGS_HASH_PERSONALIZATION);
        if let Some(bundle) = orchard_bundle {
            h.write_all(&bundle.proof).unwrap();
            for action in bundle.actions.iter() {
                h.write_all(&action.spend_auth_sig).unwrap();
            }
            h.write_all(&bundle.binding_sig).unwrap();
        }
        h.finalize()
    }

    fn combine(
        &self,
        consensus_branch_id: Self::HeaderDigest,
        transparent_digest: Self::TransparentDigest,
        sapling_digest: Self::SaplingDigest,
        orchard_digest: Self::OrchardDigest,
    ) -> Self::Digest {
        let digests = [transparent_digest, sapling_digest, orchard_digest];

        let personal =
            branch_personalization(ZCASH_AUTH_PERSONALIZATION_PREFIX, consensus_branch_id);

        let mut h = hasher(&personal);
        for digest in &digests {
            h.write_all(digest.as_bytes()).unwrap();
        }

        h.finalize()
    }
}
