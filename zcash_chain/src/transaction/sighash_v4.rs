use blake2b_simd::{Hash as Blake2bHash, Params as Blake2bParams};

use zcash_protocol::consensus::BranchId;

use super::{
    components::{
        sapling::{OutputDescription, SpendDescription},
        sprout,
        transparent::{self, TxIn, TxOut},
    },
    sighash::{SignableInput, SIGHASH_ANYONECANPAY, SIGHASH_MASK, SIGHASH_NONE, SIGHASH_SINGLE},
    txid::branch_personalization,
    TransactionData,
};

pub(crate) const ZCASH_SIGHASH_PERSONALIZATION_PREFIX: &[u8; 12] = b"ZcashSigHash";
pub(crate) const ZCASH_PREVOUTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashPrevoutHash";
pub(crate) const ZCASH_SEQUENCE_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashSequencHash";
pub(crate) const ZCASH_OUTPUTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashOutputsHash";
pub(crate) const ZCASH_JOINSPLITS_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashJSplitsHash";
pub(crate) const ZCASH_SHIELDED_SPENDS_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashSSpendsHash";
pub(crate) const ZCASH_SHIELDED_OUTPUTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashSOutputHash";

macro_rules! update_hash {
    ($h:expr, $cond:expr, $value:expr) => {
        if $cond {
            $h.update(&$value.as_ref());
        } else {
            $h.update(&[0; 32]);
        }
    };
}

fn personalized_hash(personal: &[u8; 16], data: &[u8]) -> Blake2bHash {
    Blake2bParams::new()
        .hash_length(32)
        .personal(personal)
        .hash(data)
}

fn prevout_hash(vin: &[TxIn]) -> Blake2bHash {
    let mut data = Vec::with_capacity(vin.len() * 36);
    for t_in in vin {
        t_in.prevout.write(&mut data).unwrap();
    }
    personalized_hash(ZCASH_PREVOUTS_HASH_PERSONALIZATION, &data)
}

fn sequence_hash(vin: &[TxIn]) -> Blake2bHash {
    let mut data = Vec::with_capacity(vin.len() * 4);
    for t_in in vin {
        data.extend_from_slice(&t_in.sequence.to_le_bytes());
    }
    personalized_hash(ZCASH_SEQUENCE_HASH_PERSONALIZATION, &data)
}

fn outputs_hash(vout: &[TxOut]) -> Blake2bHash {
    let mut data = Vec::with_capacity(vout.len() * (4 + 1));
    for t_out in vout {
        t_out.write(&mut data).unwrap();
    }
    personalized_hash(ZCASH_OUTPUTS_HASH_PERSONALIZATION, &data)
}

fn single_output_hash(
    transparent_bundle: Option<&transparent::Bundle>,
    signable_input: &SignableInput<'_>,
) -> Option<Blake2bHash> {
    match (transparent_bundle, signable_input) {
        (Some(b), SignableInput::Transparent(input)) if input.index() < b.vout.len() => {
            Some(outputs_hash(&b.vout[input.index()..=input.index()]))
        }
        _ => None,
    }
}

fn joinsplits_hash(bundle: &sprout::Bundle) -> Blake2bHash {
    let mut data = vec![];
    for js in bundle.joinsplits.iter() {
        js.write(&mut data).unwrap();
    }
    data.extend_from_slice(&bundle.joinsplit_pubkey);
    personalized_hash(ZCASH_JOINSPLITS_HASH_PERSONALIZATION, &data)
}

fn shielded_spends_hash(shielded_spends: &[SpendDescription]) -> Blake2bHash {
    let mut data = Vec::with_capacity(shielded_spends.len() * 384);
    for s_spend in shielded_spends {
        data.extend_from_slice(&s_spend.cv);
        data.extend_from_slice(&s_spend.anchor);
        data.extend_from_slice(&s_spend.nullifier);
        data.extend_from_slice(&s_spend.rk);
        data.extend_from_slice(&s_spend.zkproof);
    }
    personalized_hash(ZCASH_SHIELDED_SPENDS_HASH_PERSONALIZATION, &data)
}

fn shielded_outputs_hash(shielded_outputs: &[OutputDescription]) -> Blake2bHash {
    let mut data = Vec::with_capacity(shielded_outputs.len() * 948);
    for s_out in shielded_outputs {
        s_out.write_v4(&mut data).unwrap();
    }
    personalized_hash(ZCASH_SHIELDED_OUTPUTS_HASH_PERSONALIZATION, &data)
}

/// Computes a [ZIP 143] or [ZIP 243] signature hash.
///
/// The caller must ensure that `tx` is a v3 or v4 transaction, and that a transparent
/// signable input refers to an existing input.
///
/// [ZIP 143]: https://zips.z.cash/zip-0143
/// [ZIP 243]: https://zips.z.cash/zip-0243
pub(crate) fn v4_signature_hash(
    tx: &TransactionData,
    signable_input: &SignableInput<'_>,
    consensus_branch_id: BranchId,
) -> Blake2bHash {
    let hash_type = signable_input.hash_type();
    let version = tx.version();
    let transparent_bundle = tx.transparent_bundle();
    let vin = transparent_bundle.map_or(&[][..], |b| &b.vin[..]);
    let vout = transparent_bundle.map_or(&[][..], |b| &b.vout[..]);

    let personal = branch_personalization(ZCASH_SIGHASH_PERSONALIZATION_PREFIX, consensus_branch_id);
    let mut h = Blake2bParams::new()
        .hash_length(32)
        .personal(&personal)
        .to_state();

    h.update(&version.header().to_le_bytes());
    h.update(&version.version_group_id().to_le_bytes());
    update_hash!(
        h,
        hash_type & SIGHASH_ANYONECANPAY == 0,
        prevout_hash(vin)
    );
    update_hash!(
        h,
        (hash_type & SIGHASH_ANYONECANPAY) == 0
            && (hash_type & SIGHASH_MASK) != SIGHASH_SINGLE
            && (hash_type & SIGHASH_MASK) != SIGHASH_NONE,
        sequence_hash(vin)
    );

    if (hash_type & SIGHASH_MASK) != SIGHASH_SINGLE && (hash_type & SIGHASH_MASK) != SIGHASH_NONE
    {
        h.update(outputs_hash(vout).as_bytes());
    } else if (hash_type & SIGHASH_MASK) == SIGHASH_SINGLE {
        match single_output_hash(transparent_bundle, signable_input) {
            Some(hash) => h.update(hash.as_bytes()),
            None => h.update(&[0; 32]),
        };
    } else {
        h.update(&[0; 32]);
    };

    match tx.sprout_bundle() {
        Some(bundle) => h.update(joinsplits_hash(bundle).as_bytes()),
        None => h.update(&[0; 32]),
    };

    if version.has_sapling() {
        let sapling_bundle = tx.sapling_bundle();
        match sapling_bundle.filter(|b| !b.shielded_spends.is_empty()) {
            Some(bundle) => h.update(shielded_spends_hash(&bundle.shielded_spends).as_bytes()),
            None => h.update(&[0; 32]),
        };
        match sapling_bundle.filter(|b| !b.shielded_outputs.is_empty()) {
            Some(bundle) => h.update(shielded_outputs_hash(&bundle.shielded_outputs).as_bytes()),
            None => h.update(&[0; 32]),
        };
    }
    h.update(&tx.lock_time().to_le_bytes());
    h.update(&u32::from(tx.expiry_height()).to_le_bytes());
    if version.has_sapling() {
        h.update(&tx.sapling_value_balance().to_i64_le_bytes());
    }
    h.update(&u32::from(hash_type).to_le_bytes());

    if let (SignableInput::Transparent(input), Some(bundle)) = (signable_input, transparent_bundle)
    {
        let txin = &bundle.vin[input.index()];
        let mut data = vec![];
        txin.prevout.write(&mut data).unwrap();
        input.script_code().write(&mut data).unwrap();
        data.extend_from_slice(&input.value().to_i64_le_bytes());
        data.extend_from_slice(&txin.sequence.to_le_bytes());
        h.update(&data);
    }

    h.finalize()
}
