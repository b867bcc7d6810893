//! Structs and functions for parsing and serializing the Sapling components of Zcash
//! transactions.

use std::io::{self, Read, Write};

use zcash_encoding::{Array, Vector};
use zcash_protocol::{
    constants::{ENC_CIPHERTEXT_SIZE, OUT_CIPHERTEXT_SIZE},
    value::ZatBalance,
};

use super::GROTH_PROOF_SIZE;
use crate::transaction::Transaction;

pub type GrothProofBytes = [u8; GROTH_PROOF_SIZE];

/// A Sapling shielded spend.
///
/// In v5 transactions the anchor is shared by every spend in the bundle; it is stored
/// per-spend here so that both encodings share one in-memory form.
#[derive(Clone, PartialEq, Eq)]
pub struct SpendDescription {
    pub cv: [u8; 32],
    pub anchor: [u8; 32],
    pub nullifier: [u8; 32],
    pub rk: [u8; 32],
    pub zkproof: GrothProofBytes,
    pub spend_auth_sig: [u8; 64],
}

impl std::fmt::Debug for SpendDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "SpendDescription(cv = {}, anchor = {}, nullifier = {}, rk = {}, spend_auth_sig = {})",
            hex::encode(self.cv),
            hex::encode(self.anchor),
            hex::encode(self.nullifier),
            hex::encode(self.rk),
            hex::encode(self.spend_auth_sig),
        )
    }
}

/// The parts of a spend that are encoded inline in a v5 transaction.
struct SpendDescriptionV5 {
    cv: [u8; 32],
    nullifier: [u8; 32],
    rk: [u8; 32],
}

impl SpendDescriptionV5 {
    fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let cv = read_32(&mut reader)?;
        let nullifier = read_32(&mut reader)?;
        let rk = read_32(&mut reader)?;
        Ok(SpendDescriptionV5 { cv, nullifier, rk })
    }

    fn into_spend_description(
        self,
        anchor: [u8; 32],
        zkproof: GrothProofBytes,
        spend_auth_sig: [u8; 64],
    ) -> SpendDescription {
        SpendDescription {
            cv: self.cv,
            anchor,
            nullifier: self.nullifier,
            rk: self.rk,
            zkproof,
            spend_auth_sig,
        }
    }
}

impl SpendDescription {
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let cv = read_32(&mut reader)?;
        let anchor = read_32(&mut reader)?;
        let nullifier = read_32(&mut reader)?;
        let rk = read_32(&mut reader)?;
        let zkproof = read_zkproof(&mut reader)?;
        let spend_auth_sig = read_signature(&mut reader)?;

        Ok(SpendDescription {
            cv,
            anchor,
            nullifier,
            rk,
            zkproof,
            spend_auth_sig,
        })
    }

    pub fn write_v4<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.cv)?;
        writer.write_all(&self.anchor)?;
        writer.write_all(&self.nullifier)?;
        writer.write_all(&self.rk)?;
        writer.write_all(&self.zkproof)?;
        writer.write_all(&self.spend_auth_sig)
    }

    pub fn write_v5_without_witness_data<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.cv)?;
        writer.write_all(&self.nullifier)?;
        writer.write_all(&self.rk)
    }
}

/// A Sapling shielded output.
#[derive(Clone, PartialEq, Eq)]
pub struct OutputDescription {
    pub cv: [u8; 32],
    pub cmu: [u8; 32],
    pub ephemeral_key: [u8; 32],
    pub enc_ciphertext: [u8; ENC_CIPHERTEXT_SIZE],
    pub out_ciphertext: [u8; OUT_CIPHERTEXT_SIZE],
    pub zkproof: GrothProofBytes,
}

impl std::fmt::Debug for OutputDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "OutputDescription(cv = {}, cmu = {}, ephemeral_key = {})",
            hex::encode(self.cv),
            hex::encode(self.cmu),
            hex::encode(self.ephemeral_key),
        )
    }
}

impl OutputDescription {
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let (cv, cmu, ephemeral_key, enc_ciphertext, out_ciphertext) =
            read_output_without_proof(&mut reader)?;
        let zkproof = read_zkproof(&mut reader)?;

        Ok(OutputDescription {
            cv,
            cmu,
            ephemeral_key,
            enc_ciphertext,
            out_ciphertext,
            zkproof,
        })
    }

    pub fn write_v4<W: Write>(&self, mut writer: W) -> io::Result<()> {
        self.write_v5_without_proof(&mut writer)?;
        writer.write_all(&self.zkproof)
    }

    pub fn write_v5_without_proof<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.cv)?;
        writer.write_all(&self.cmu)?;
        writer.write_all(&self.ephemeral_key)?;
        writer.write_all(&self.enc_ciphertext)?;
        writer.write_all(&self.out_ciphertext)
    }
}

type OutputDescriptionV5 = (
    [u8; 32],
    [u8; 32],
    [u8; 32],
    [u8; ENC_CIPHERTEXT_SIZE],
    [u8; OUT_CIPHERTEXT_SIZE],
);

fn read_output_without_proof<R: Read>(mut reader: R) -> io::Result<OutputDescriptionV5> {
    let cv = read_32(&mut reader)?;
    let cmu = read_32(&mut reader)?;
    let ephemeral_key = read_32(&mut reader)?;

    let mut enc_ciphertext = [0u8; ENC_CIPHERTEXT_SIZE];
    let mut out_ciphertext = [0u8; OUT_CIPHERTEXT_SIZE];
    reader.read_exact(&mut enc_ciphertext)?;
    reader.read_exact(&mut out_ciphertext)?;

    Ok((cv, cmu, ephemeral_key, enc_ciphertext, out_ciphertext))
}

fn read_32<R: Read>(mut reader: R) -> io::Result<[u8; 32]> {
    let mut bytes = [0u8; 32];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

pub fn read_zkproof<R: Read>(mut reader: R) -> io::Result<GrothProofBytes> {
    let mut zkproof = [0u8; GROTH_PROOF_SIZE];
    reader.read_exact(&mut zkproof)?;
    Ok(zkproof)
}

pub(crate) fn read_signature<R: Read>(mut reader: R) -> io::Result<[u8; 64]> {
    let mut sig = [0u8; 64];
    reader.read_exact(&mut sig)?;
    Ok(sig)
}

/// A Sapling bundle with at least one spend or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub shielded_spends: Vec<SpendDescription>,
    pub shielded_outputs: Vec<OutputDescription>,
    pub value_balance: ZatBalance,
    pub binding_sig: [u8; 64],
}

impl Bundle {
    pub fn is_empty(&self) -> bool {
        self.shielded_spends.is_empty() && self.shielded_outputs.is_empty()
    }

    /// Returns the anchor shared by every spend, or `None` if there are no spends or the
    /// spends disagree.
    pub fn shared_anchor(&self) -> Option<[u8; 32]> {
        let (first, rest) = self.shielded_spends.split_first()?;
        rest.iter()
            .all(|spend| spend.anchor == first.anchor)
            .then_some(first.anchor)
    }
}

/// Reads the Sapling fields of a v4 transaction that precede the joinsplits.
///
/// The binding signature follows the joinsplits and is read separately by the caller.
pub(crate) fn read_v4_components<R: Read>(
    mut reader: R,
) -> io::Result<(ZatBalance, Vec<SpendDescription>, Vec<OutputDescription>)> {
    let value_balance = Transaction::read_amount(&mut reader)?;
    #[allow(clippy::redundant_closure)]
    let shielded_spends = Vector::read(&mut reader, |r| SpendDescription::read(r))?;
    #[allow(clippy::redundant_closure)]
    let shielded_outputs = Vector::read(&mut reader, |r| OutputDescription::read(r))?;

    if shielded_spends.is_empty() && shielded_outputs.is_empty() && value_balance != ZatBalance::zero()
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "valueBalance must be zero when there are no Sapling spends or outputs",
        ));
    }

    Ok((value_balance, shielded_spends, shielded_outputs))
}

/// Writes the Sapling fields of a v4 transaction that precede the joinsplits.
///
/// The v4 layout always carries `valueBalance`, so a transaction without a Sapling bundle
/// still writes eight zero bytes ahead of the two empty vectors. Only the binding
/// signature is omitted.
pub(crate) fn write_v4_components<W: Write>(
    bundle: Option<&Bundle>,
    mut writer: W,
) -> io::Result<()> {
    writer.write_all(
        &bundle
            .map_or(ZatBalance::zero(), |b| b.value_balance)
            .to_i64_le_bytes(),
    )?;
    Vector::write(
        &mut writer,
        bundle.map_or(&[], |b| &b.shielded_spends[..]),
        |w, e| e.write_v4(w),
    )?;
    Vector::write(
        &mut writer,
        bundle.map_or(&[], |b| &b.shielded_outputs[..]),
        |w, e| e.write_v4(w),
    )
}

/// Reads a Sapling bundle from a v5 transaction.
pub fn read_v5_bundle<R: Read>(mut reader: R) -> io::Result<Option<Bundle>> {
    #[allow(clippy::redundant_closure)]
    let sd_v5s = Vector::read(&mut reader, |r| SpendDescriptionV5::read(r))?;
    #[allow(clippy::redundant_closure)]
    let od_v5s = Vector::read(&mut reader, |r| read_output_without_proof(r))?;
    let n_spends = sd_v5s.len();
    let n_outputs = od_v5s.len();

    if n_spends == 0 && n_outputs == 0 {
        return Ok(None);
    }

    let value_balance = Transaction::read_amount(&mut reader)?;
    let anchor = if n_spends > 0 {
        read_32(&mut reader)?
    } else {
        [0u8; 32]
    };

    #[allow(clippy::redundant_closure)]
    let v_spend_proofs = Array::read(&mut reader, n_spends, |r| read_zkproof(r))?;
    #[allow(clippy::redundant_closure)]
    let v_spend_auth_sigs = Array::read(&mut reader, n_spends, |r| read_signature(r))?;
    #[allow(clippy::redundant_closure)]
    let v_output_proofs = Array::read(&mut reader, n_outputs, |r| read_zkproof(r))?;
    let binding_sig = read_signature(&mut reader)?;

    let shielded_spends = sd_v5s
        .into_iter()
        .zip(v_spend_proofs.into_iter().zip(v_spend_auth_sigs))
        .map(|(sd_5, (zkproof, spend_auth_sig))| {
            sd_5.into_spend_description(anchor, zkproof, spend_auth_sig)
        })
        .collect();

    let shielded_outputs = od_v5s
        .into_iter()
        .zip(v_output_proofs)
        .map(
            |((cv, cmu, ephemeral_key, enc_ciphertext, out_ciphertext), zkproof)| {
                OutputDescription {
                    cv,
                    cmu,
                    ephemeral_key,
                    enc_ciphertext,
                    out_ciphertext,
                    zkproof,
                }
            },
        )
        .collect();

    Ok(Some(Bundle {
        shielded_spends,
        shielded_outputs,
        value_balance,
        binding_sig,
    }))
}

/// Writes a Sapling bundle in the v5 transaction format.
///
/// The spends of `bundle` must share a single anchor; this is checked when the
/// transaction is constructed.
pub fn write_v5_bundle<W: Write>(bundle: Option<&Bundle>, mut writer: W) -> io::Result<()> {
    if let Some(bundle) = bundle {
        Vector::write(&mut writer, &bundle.shielded_spends, |w, e| {
            e.write_v5_without_witness_data(w)
        })?;

        Vector::write(&mut writer, &bundle.shielded_outputs, |w, e| {
            e.write_v5_without_proof(w)
        })?;

        writer.write_all(&bundle.value_balance.to_i64_le_bytes())?;
        if let Some(spend) = bundle.shielded_spends.first() {
            writer.write_all(&spend.anchor)?;
        }

        Array::write(&mut writer, bundle.shielded_spends.iter(), |w, e| {
            w.write_all(&e.zkproof)
        })?;
        Array::write(&mut writer, bundle.shielded_spends.iter(), |w, e| {
            w.write_all(&e.spend_auth_sig)
        })?;
        Array::write(&mut writer, bundle.shielded_outputs.iter(), |w, e| {
            w.write_all(&e.zkproof)
        })?;

        writer.write_all(&bundle.binding_sig)?;
    } else {
        Vector::write(&mut writer, &[] as &[SpendDescription], |_, _| Ok(()))?;
        Vector::write(&mut writer, &[] as &[OutputDescription], |_, _| Ok(()))?;
    }

    Ok(())
}

#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use zcash_protocol::{
        constants::{ENC_CIPHERTEXT_SIZE, OUT_CIPHERTEXT_SIZE},
        value::testing::arb_zat_balance,
    };

    use super::{Bundle, OutputDescription, SpendDescription};
    use crate::transaction::{
        components::{testing::arb_array, GROTH_PROOF_SIZE},
        TxVersion,
    };

    prop_compose! {
        pub fn arb_spend_description()(
            cv in prop::array::uniform32(any::<u8>()),
            anchor in prop::array::uniform32(any::<u8>()),
            nullifier in prop::array::uniform32(any::<u8>()),
            rk in prop::array::uniform32(any::<u8>()),
            zkproof in arb_array::<GROTH_PROOF_SIZE>(),
            spend_auth_sig in arb_array::<64>(),
        ) -> SpendDescription {
            SpendDescription { cv, anchor, nullifier, rk, zkproof, spend_auth_sig }
        }
    }

    prop_compose! {
        pub fn arb_output_description()(
            cv in prop::array::uniform32(any::<u8>()),
            cmu in prop::array::uniform32(any::<u8>()),
            ephemeral_key in prop::array::uniform32(any::<u8>()),
            enc_ciphertext in arb_array::<ENC_CIPHERTEXT_SIZE>(),
            out_ciphertext in arb_array::<OUT_CIPHERTEXT_SIZE>(),
            zkproof in arb_array::<GROTH_PROOF_SIZE>(),
        ) -> OutputDescription {
            OutputDescription { cv, cmu, ephemeral_key, enc_ciphertext, out_ciphertext, zkproof }
        }
    }

    prop_compose! {
        /// Generates a bundle whose spends share one anchor, as required by v5.
        pub fn arb_bundle(shared_anchor: bool)(
            spends in vec(arb_spend_description(), 0..3),
            outputs in vec(arb_output_description(), 0..3),
            value_balance in arb_zat_balance(),
            anchor in prop::array::uniform32(any::<u8>()),
            binding_sig in arb_array::<64>(),
        ) -> Option<Bundle> {
            if spends.is_empty() && outputs.is_empty() {
                None
            } else {
                let shielded_spends = spends
                    .into_iter()
                    .map(|mut s| {
                        if shared_anchor {
                            s.anchor = anchor;
                        }
                        s
                    })
                    .collect();
                Some(Bundle {
                    shielded_spends,
                    shielded_outputs: outputs,
                    value_balance,
                    binding_sig,
                })
            }
        }
    }

    pub fn arb_bundle_for_version(v: TxVersion) -> impl Strategy<Value = Option<Bundle>> {
        match v {
            TxVersion::Sapling => Strategy::boxed(arb_bundle(false)),
            TxVersion::Zip225 => Strategy::boxed(arb_bundle(true)),
            _ => Strategy::boxed(Just(None)),
        }
    }
}
