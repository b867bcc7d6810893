use std::io::Write;

use blake2b_simd::Hash as Blake2bHash;
use byteorder::{LittleEndian, WriteBytesExt};

use super::{
    components::transparent::{self, TxOut},
    sighash::{SignableInput, TransparentInput},
    txid::{
        hasher, to_hash, transparent_outputs_hash, transparent_prevout_hash,
        transparent_sequence_hash,
    },
    TransparentDigests, TxDigests, Zip225Tx,
};

pub(crate) const ZCASH_TRANSPARENT_INPUT_HASH_PERSONALIZATION: &[u8; 16] = b"Zcash___TxInHash";

fn transparent_input_sigdigests(
    bundle: &transparent::Bundle,
    input: &TransparentInput<'_>,
    txid_digests: &TransparentDigests<Blake2bHash>,
) -> TransparentDigests<Blake2bHash> {
    let hash_type = input.hash_type();
    let flag_anyonecanpay = hash_type.anyone_can_pay();
    let flag_single = hash_type.is_single();
    let flag_none = hash_type.is_none();

    let prevout_digest = if flag_anyonecanpay {
        transparent_prevout_hash(&[])
    } else {
        txid_digests.prevout_digest
    };

    let sequence_digest = if flag_anyonecanpay || flag_single || flag_none {
        transparent_sequence_hash(&[])
    } else {
        txid_digests.sequence_digest
    };

    let outputs_digest = if flag_single {
        if input.index() < bundle.vout.len() {
            transparent_outputs_hash(&[&bundle.vout[input.index()]])
        } else {
            transparent_outputs_hash::<TxOut>(&[])
        }
    } else if flag_none {
        transparent_outputs_hash::<TxOut>(&[])
    } else {
        txid_digests.outputs_digest
    };

    // If we are serializing an input (i.e. this is not a shielded signature hash):
    //   a. outpoint (32-byte hash + 4-byte little endian)
    //   b. scriptCode of the input (serialized as scripts inside CTxOuts)
    //   c. value of the output spent by this input (8-byte little endian)
    //   d. nSequence of the input (4-byte little endian)
    let mut ch = hasher(ZCASH_TRANSPARENT_INPUT_HASH_PERSONALIZATION);
    let txin = &bundle.vin[input.index()];
    txin.prevout.write(&mut ch).unwrap();
    input.script_code().write(&mut ch).unwrap();
    ch.write_all(&input.value().to_i64_le_bytes()).unwrap();
    ch.write_u32::<LittleEndian>(txin.sequence).unwrap();
    let per_input_digest = ch.finalize();

    TransparentDigests {
        prevout_digest,
        sequence_digest,
        outputs_digest,
        per_input_digest: Some(per_input_digest),
    }
}

/// Computes a [ZIP 244] signature hash from the transaction's txid digests.
///
/// The caller must ensure that a transparent signable input refers to an existing input.
///
/// [ZIP 244]: https://zips.z.cash/zip-0244
pub(crate) fn v5_signature_hash(
    tx: &Zip225Tx,
    signable_input: &SignableInput<'_>,
    txid_parts: &TxDigests<Blake2bHash>,
) -> Blake2bHash {
    let transparent_digests = match signable_input {
        SignableInput::Shielded => txid_parts.transparent_digests.clone(),
        SignableInput::Transparent(input) => tx
            .transparent_bundle
            .as_ref()
            .zip(txid_parts.transparent_digests.as_ref())
            .map(|(bundle, txid_digests)| {
                transparent_input_sigdigests(bundle, input, txid_digests)
            }),
    };

    to_hash(
        tx.consensus_branch_id,
        txid_parts.header_digest,
        transparent_digests.as_ref(),
        txid_parts.sapling_digest,
        txid_parts.orchard_digest,
    )
}
