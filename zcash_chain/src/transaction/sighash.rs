//! Signature digests for transparent and shielded inputs.
use blake2b_simd::Hash as Blake2bHash;

use zcash_protocol::{consensus::BranchId, value::Zatoshis};

use super::{
    components::transparent::Script,
    sighash_v4::v4_signature_hash,
    sighash_v5::v5_signature_hash,
    txid::TxIdDigester,
    TransactionData,
};
use crate::Error;

pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_MASK: u8 = 0x1f;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

/// A [ZIP 244] sighash type.
///
/// [ZIP 244]: https://zips.z.cash/zip-0244#s-2a-hash-type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SighashType(u8);

impl SighashType {
    pub const ALL: Self = Self(SIGHASH_ALL);
    pub const NONE: Self = Self(SIGHASH_NONE);
    pub const SINGLE: Self = Self(SIGHASH_SINGLE);
    pub const ALL_ANYONECANPAY: Self = Self(SIGHASH_ALL | SIGHASH_ANYONECANPAY);
    pub const NONE_ANYONECANPAY: Self = Self(SIGHASH_NONE | SIGHASH_ANYONECANPAY);
    pub const SINGLE_ANYONECANPAY: Self = Self(SIGHASH_SINGLE | SIGHASH_ANYONECANPAY);

    /// Parses the given `hash_type` using the [ZIP 244] rules.
    ///
    /// [ZIP 244]: https://zips.z.cash/zip-0244#s-2a-hash-type
    pub fn parse(hash_type: u8) -> Option<Self> {
        match hash_type & !SIGHASH_ANYONECANPAY {
            SIGHASH_ALL | SIGHASH_NONE | SIGHASH_SINGLE => Some(Self(hash_type)),
            _ => None,
        }
    }

    /// Encodes this `SighashType` using the [ZIP 244] rules.
    ///
    /// [ZIP 244]: https://zips.z.cash/zip-0244#s-2a-hash-type
    pub fn encode(&self) -> u8 {
        // Correct by construction.
        self.0
    }

    pub(crate) fn anyone_can_pay(&self) -> bool {
        self.0 & SIGHASH_ANYONECANPAY != 0
    }

    pub(crate) fn is_single(&self) -> bool {
        self.0 & SIGHASH_MASK == SIGHASH_SINGLE
    }

    pub(crate) fn is_none(&self) -> bool {
        self.0 & SIGHASH_MASK == SIGHASH_NONE
    }
}

/// The transparent input being signed, along with the data from the output it spends.
#[derive(Clone, Debug)]
pub struct TransparentInput<'a> {
    hash_type: SighashType,
    index: usize,
    script_code: &'a Script,
    value: Zatoshis,
}

impl<'a> TransparentInput<'a> {
    pub fn new(hash_type: SighashType, index: usize, script_code: &'a Script, value: Zatoshis) -> Self {
        TransparentInput {
            hash_type,
            index,
            script_code,
            value,
        }
    }

    pub fn hash_type(&self) -> &SighashType {
        &self.hash_type
    }

    /// The index of the input within the transaction's `vin`.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn script_code(&self) -> &'a Script {
        self.script_code
    }

    pub fn value(&self) -> Zatoshis {
        self.value
    }
}

pub enum SignableInput<'a> {
    /// A signature over the transaction as a whole, as made by Sapling spend
    /// authorizations, Orchard actions and binding signatures.
    Shielded,
    Transparent(TransparentInput<'a>),
}

impl<'a> SignableInput<'a> {
    pub fn hash_type(&self) -> u8 {
        match self {
            SignableInput::Shielded => SIGHASH_ALL,
            SignableInput::Transparent(input) => input.hash_type().encode(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureHash([u8; 32]);

impl SignatureHash {
    fn from_blake2b(hash: Blake2bHash) -> Self {
        let mut bytes = [0; 32];
        bytes.copy_from_slice(hash.as_bytes());
        SignatureHash(bytes)
    }
}

impl AsRef<[u8; 32]> for SignatureHash {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Computes the signature hash for an input to a transaction, given the full data of the
/// transaction, the input being signed, and the consensus branch the signature is made
/// for.
///
/// v5 transactions follow [ZIP 244], and commit to their own consensus branch ID; the
/// given `consensus_branch_id` must match it. v3 and v4 transactions follow [ZIP 143] and
/// [ZIP 243]. Pre-Overwinter transactions cannot be signed with this function.
///
/// [ZIP 143]: https://zips.z.cash/zip-0143
/// [ZIP 243]: https://zips.z.cash/zip-0243
/// [ZIP 244]: https://zips.z.cash/zip-0244
pub fn signature_hash(
    tx: &TransactionData,
    signable_input: &SignableInput<'_>,
    consensus_branch_id: BranchId,
) -> Result<SignatureHash, Error> {
    if let SignableInput::Transparent(input) = signable_input {
        if tx
            .transparent_bundle()
            .map_or(true, |b| input.index() >= b.vin.len())
        {
            return Err(Error::InvariantViolation(
                "transparent input index is out of range",
            ));
        }
    }

    let hash = match tx {
        TransactionData::Sprout(_) => {
            let version = tx.version();
            return Err(Error::UnsupportedVersion {
                header: version.header(),
                version_group_id: version.version_group_id(),
            });
        }
        TransactionData::Overwinter(_) | TransactionData::Sapling(_) => {
            v4_signature_hash(tx, signable_input, consensus_branch_id)
        }
        TransactionData::Zip225(v5_tx) => {
            if v5_tx.consensus_branch_id != consensus_branch_id {
                return Err(Error::InvariantViolation(
                    "v5 transactions can only be signed for their own consensus branch",
                ));
            }
            let txid_parts = v5_tx.digest(TxIdDigester);
            v5_signature_hash(v5_tx, signable_input, &txid_parts)
        }
    };

    Ok(SignatureHash::from_blake2b(hash))
}

#[cfg(test)]
mod tests {
    use super::{SighashType, SIGHASH_ANYONECANPAY};

    #[test]
    fn sighash_type_parsing() {
        assert_eq!(SighashType::parse(0x01), Some(SighashType::ALL));
        assert_eq!(SighashType::parse(0x83), Some(SighashType::SINGLE_ANYONECANPAY));
        assert_eq!(SighashType::parse(0x00), None);
        assert_eq!(SighashType::parse(0x04), None);
        assert_eq!(SighashType::parse(0x41), None);

        let t = SighashType::NONE_ANYONECANPAY;
        assert!(t.anyone_can_pay());
        assert!(t.is_none());
        assert!(!t.is_single());
        assert_eq!(t.encode() & SIGHASH_ANYONECANPAY, SIGHASH_ANYONECANPAY);
    }
}
