//! Structs representing the Sprout components within Zcash transactions.

use std::io::{self, Read, Write};

use nonempty::NonEmpty;
use zcash_encoding::Vector;
use zcash_protocol::value::Zatoshis;

use super::{GROTH_PROOF_SIZE, PHGR_PROOF_SIZE};

const ZC_NUM_JS_INPUTS: usize = 2;
const ZC_NUM_JS_OUTPUTS: usize = 2;

/// Size of a Sprout note ciphertext: the 585-byte note plaintext plus the AEAD tag.
pub const JS_CIPHERTEXT_SIZE: usize = 601;

/// The joinsplits of a transaction, together with the key that signs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub joinsplits: NonEmpty<JsDescription>,
    pub joinsplit_pubkey: [u8; 32],
    pub joinsplit_sig: [u8; 64],
}

impl Bundle {
    /// Reads the joinsplit vector, followed by the pubkey and signature when it is
    /// non-empty.
    pub fn read<R: Read>(mut reader: R, use_groth: bool) -> io::Result<Option<Self>> {
        let joinsplits = Vector::read(&mut reader, |r| JsDescription::read(r, use_groth))?;

        match NonEmpty::from_vec(joinsplits) {
            Some(joinsplits) => {
                let mut bundle = Bundle {
                    joinsplits,
                    joinsplit_pubkey: [0; 32],
                    joinsplit_sig: [0; 64],
                };
                reader.read_exact(&mut bundle.joinsplit_pubkey)?;
                reader.read_exact(&mut bundle.joinsplit_sig)?;
                Ok(Some(bundle))
            }
            None => Ok(None),
        }
    }

    /// Writes an optional bundle; an absent bundle is written as an empty vector.
    pub fn write<W: Write>(bundle: Option<&Self>, mut writer: W) -> io::Result<()> {
        match bundle {
            Some(bundle) => {
                Vector::write_nonempty(&mut writer, &bundle.joinsplits, |w, e| e.write(w))?;
                writer.write_all(&bundle.joinsplit_pubkey)?;
                writer.write_all(&bundle.joinsplit_sig)
            }
            None => Vector::write(&mut writer, &[] as &[JsDescription], |w, e| e.write(w)),
        }
    }

    /// Returns `true` if every joinsplit carries the proof type given by `use_groth`.
    pub fn proofs_match(&self, use_groth: bool) -> bool {
        self.joinsplits
            .iter()
            .all(|js| matches!(js.proof, SproutProof::Groth(_)) == use_groth)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum SproutProof {
    Groth([u8; GROTH_PROOF_SIZE]),
    PHGR([u8; PHGR_PROOF_SIZE]),
}

impl std::fmt::Debug for SproutProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            SproutProof::Groth(_) => write!(f, "SproutProof::Groth"),
            SproutProof::PHGR(_) => write!(f, "SproutProof::PHGR"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct JsDescription {
    pub(crate) vpub_old: Zatoshis,
    pub(crate) vpub_new: Zatoshis,
    pub(crate) anchor: [u8; 32],
    pub(crate) nullifiers: [[u8; 32]; ZC_NUM_JS_INPUTS],
    pub(crate) commitments: [[u8; 32]; ZC_NUM_JS_OUTPUTS],
    pub(crate) ephemeral_key: [u8; 32],
    pub(crate) random_seed: [u8; 32],
    pub(crate) macs: [[u8; 32]; ZC_NUM_JS_INPUTS],
    pub(crate) proof: SproutProof,
    pub(crate) ciphertexts: [[u8; JS_CIPHERTEXT_SIZE]; ZC_NUM_JS_OUTPUTS],
}

impl std::fmt::Debug for JsDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "JSDescription(
                vpub_old = {:?}, vpub_new = {:?},
                anchor = {:?},
                nullifiers = {:?},
                commitments = {:?},
                ephemeral_key = {:?},
                random_seed = {:?},
                macs = {:?},
                proof = {:?},
                ciphertexts = ...
            )",
            self.vpub_old,
            self.vpub_new,
            self.anchor,
            self.nullifiers,
            self.commitments,
            self.ephemeral_key,
            self.random_seed,
            self.macs,
            self.proof
        )
    }
}

impl JsDescription {
    pub fn read<R: Read>(mut reader: R, use_groth: bool) -> io::Result<Self> {
        // Public values are bounded by MAX_MONEY.
        let vpub_old = {
            let mut tmp = [0u8; 8];
            reader.read_exact(&mut tmp)?;
            Zatoshis::from_u64_le_bytes(tmp)
        }
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "vpub_old out of range"))?;

        let vpub_new = {
            let mut tmp = [0u8; 8];
            reader.read_exact(&mut tmp)?;
            Zatoshis::from_u64_le_bytes(tmp)
        }
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "vpub_new out of range"))?;

        let mut anchor = [0u8; 32];
        reader.read_exact(&mut anchor)?;

        let mut nullifiers = [[0u8; 32]; ZC_NUM_JS_INPUTS];
        nullifiers
            .iter_mut()
            .try_for_each(|nf| reader.read_exact(nf))?;

        let mut commitments = [[0u8; 32]; ZC_NUM_JS_OUTPUTS];
        commitments
            .iter_mut()
            .try_for_each(|cm| reader.read_exact(cm))?;

        let mut ephemeral_key = [0u8; 32];
        reader.read_exact(&mut ephemeral_key)?;

        let mut random_seed = [0u8; 32];
        reader.read_exact(&mut random_seed)?;

        let mut macs = [[0u8; 32]; ZC_NUM_JS_INPUTS];
        macs.iter_mut().try_for_each(|mac| reader.read_exact(mac))?;

        let proof = if use_groth {
            let mut proof = [0u8; GROTH_PROOF_SIZE];
            reader.read_exact(&mut proof)?;
            SproutProof::Groth(proof)
        } else {
            let mut proof = [0u8; PHGR_PROOF_SIZE];
            reader.read_exact(&mut proof)?;
            SproutProof::PHGR(proof)
        };

        let mut ciphertexts = [[0u8; JS_CIPHERTEXT_SIZE]; ZC_NUM_JS_OUTPUTS];
        ciphertexts
            .iter_mut()
            .try_for_each(|ct| reader.read_exact(ct))?;

        Ok(JsDescription {
            vpub_old,
            vpub_new,
            anchor,
            nullifiers,
            commitments,
            ephemeral_key,
            random_seed,
            macs,
            proof,
            ciphertexts,
        })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.vpub_old.to_i64_le_bytes())?;
        writer.write_all(&self.vpub_new.to_i64_le_bytes())?;
        writer.write_all(&self.anchor)?;
        writer.write_all(&self.nullifiers[0])?;
        writer.write_all(&self.nullifiers[1])?;
        writer.write_all(&self.commitments[0])?;
        writer.write_all(&self.commitments[1])?;
        writer.write_all(&self.ephemeral_key)?;
        writer.write_all(&self.random_seed)?;
        writer.write_all(&self.macs[0])?;
        writer.write_all(&self.macs[1])?;

        match &self.proof {
            SproutProof::Groth(p) => writer.write_all(p)?,
            SproutProof::PHGR(p) => writer.write_all(p)?,
        }

        writer.write_all(&self.ciphertexts[0])?;
        writer.write_all(&self.ciphertexts[1])
    }

    pub fn vpub_old(&self) -> Zatoshis {
        self.vpub_old
    }

    pub fn vpub_new(&self) -> Zatoshis {
        self.vpub_new
    }

    pub fn nullifiers(&self) -> &[[u8; 32]; ZC_NUM_JS_INPUTS] {
        &self.nullifiers
    }
}

#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use nonempty::NonEmpty;
    use zcash_protocol::value::testing::arb_zatoshis;

    use super::{Bundle, JsDescription, SproutProof, JS_CIPHERTEXT_SIZE};
    use crate::transaction::{
        components::{testing::arb_array, GROTH_PROOF_SIZE, PHGR_PROOF_SIZE},
        TxVersion,
    };

    prop_compose! {
        fn arb_proof(use_groth: bool)(
            groth in arb_array::<GROTH_PROOF_SIZE>(),
            phgr in arb_array::<PHGR_PROOF_SIZE>(),
        ) -> SproutProof {
            if use_groth { SproutProof::Groth(groth) } else { SproutProof::PHGR(phgr) }
        }
    }

    prop_compose! {
        pub fn arb_js_description(use_groth: bool)(
            vpub_old in arb_zatoshis(),
            vpub_new in arb_zatoshis(),
            anchor in prop::array::uniform32(any::<u8>()),
            nf0 in prop::array::uniform32(any::<u8>()),
            nf1 in prop::array::uniform32(any::<u8>()),
            cm0 in prop::array::uniform32(any::<u8>()),
            cm1 in prop::array::uniform32(any::<u8>()),
            ephemeral_key in prop::array::uniform32(any::<u8>()),
            random_seed in prop::array::uniform32(any::<u8>()),
            mac0 in prop::array::uniform32(any::<u8>()),
            mac1 in prop::array::uniform32(any::<u8>()),
            proof in arb_proof(use_groth),
            ct0 in arb_array::<JS_CIPHERTEXT_SIZE>(),
            ct1 in arb_array::<JS_CIPHERTEXT_SIZE>(),
        ) -> JsDescription {
            JsDescription {
                vpub_old,
                vpub_new,
                anchor,
                nullifiers: [nf0, nf1],
                commitments: [cm0, cm1],
                ephemeral_key,
                random_seed,
                macs: [mac0, mac1],
                proof,
                ciphertexts: [ct0, ct1],
            }
        }
    }

    prop_compose! {
        pub fn arb_bundle(use_groth: bool)(
            joinsplits in vec(arb_js_description(use_groth), 0..2),
            joinsplit_pubkey in prop::array::uniform32(any::<u8>()),
            joinsplit_sig in prop::array::uniform32(any::<u8>()),
        ) -> Option<Bundle> {
            NonEmpty::from_vec(joinsplits).map(|joinsplits| {
                let mut sig = [0u8; 64];
                sig[..32].copy_from_slice(&joinsplit_sig);
                sig[32..].copy_from_slice(&joinsplit_sig);
                Bundle { joinsplits, joinsplit_pubkey, joinsplit_sig: sig }
            })
        }
    }

    pub fn arb_bundle_for_version(v: TxVersion) -> impl Strategy<Value = Option<Bundle>> {
        if v.has_sprout() {
            Strategy::boxed(arb_bundle(v.uses_groth_proofs()))
        } else {
            Strategy::boxed(Just(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{testing::arb_js_description, Bundle, JsDescription, SproutProof};
    use crate::transaction::components::{GROTH_PROOF_SIZE, PHGR_PROOF_SIZE};

    #[test]
    fn descriptions_have_expected_sizes() {
        assert_eq!(GROTH_PROOF_SIZE, 192);
        assert_eq!(PHGR_PROOF_SIZE, 296);
    }

    proptest! {
        #[test]
        fn js_description_round_trip(js in arb_js_description(true)) {
            let mut buf = vec![];
            js.write(&mut buf).unwrap();
            prop_assert_eq!(buf.len(), 8 + 8 + 32 * 9 + GROTH_PROOF_SIZE + 2 * 601);
            prop_assert_eq!(JsDescription::read(&buf[..], true).unwrap(), js);
        }

        #[test]
        fn phgr_proofs_are_wider(js in arb_js_description(false)) {
            let mut buf = vec![];
            js.write(&mut buf).unwrap();
            prop_assert_eq!(buf.len(), 8 + 8 + 32 * 9 + PHGR_PROOF_SIZE + 2 * 601);
            let read = JsDescription::read(&buf[..], false).unwrap();
            prop_assert!(matches!(read.proof, SproutProof::PHGR(_)));
        }
    }

    #[test]
    fn empty_bundle_has_no_key_or_signature() {
        assert_eq!(Bundle::read(&[0x00][..], true).unwrap(), None);

        let mut buf = vec![];
        Bundle::write(None, &mut buf).unwrap();
        assert_eq!(buf, [0x00]);
    }
}
