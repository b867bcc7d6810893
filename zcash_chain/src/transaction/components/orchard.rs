//! Functions for parsing & serialization of Orchard transaction components.
use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};
use nonempty::NonEmpty;
use zcash_encoding::{Array, CompactSize, Vector};
use zcash_protocol::{
    constants::{ENC_CIPHERTEXT_SIZE, OUT_CIPHERTEXT_SIZE},
    value::ZatBalance,
};

use super::sapling::read_signature;
use crate::transaction::Transaction;

pub const FLAG_SPENDS_ENABLED: u8 = 0b0000_0001;
pub const FLAG_OUTPUTS_ENABLED: u8 = 0b0000_0010;
pub const FLAGS_EXPECTED_UNSET: u8 = !(FLAG_SPENDS_ENABLED | FLAG_OUTPUTS_ENABLED);

/// Orchard-specific flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flags {
    spends_enabled: bool,
    outputs_enabled: bool,
}

impl Flags {
    pub const fn from_parts(spends_enabled: bool, outputs_enabled: bool) -> Self {
        Flags {
            spends_enabled,
            outputs_enabled,
        }
    }

    pub fn spends_enabled(&self) -> bool {
        self.spends_enabled
    }

    pub fn outputs_enabled(&self) -> bool {
        self.outputs_enabled
    }

    /// Serialize flags to a byte as defined in [Zcash Protocol Spec § 7.1: Transaction
    /// Encoding And Consensus][txencoding].
    ///
    /// [txencoding]: https://zips.z.cash/protocol/protocol.pdf#txnencoding
    pub fn to_byte(&self) -> u8 {
        let mut value = 0u8;
        if self.spends_enabled {
            value |= FLAG_SPENDS_ENABLED;
        }
        if self.outputs_enabled {
            value |= FLAG_OUTPUTS_ENABLED;
        }
        value
    }

    /// Parses flags from a single byte, returning `None` if any reserved bit is set.
    pub fn from_byte(value: u8) -> Option<Self> {
        if value & FLAGS_EXPECTED_UNSET == 0 {
            Some(Self::from_parts(
                value & FLAG_SPENDS_ENABLED != 0,
                value & FLAG_OUTPUTS_ENABLED != 0,
            ))
        } else {
            None
        }
    }
}

/// An Orchard action: one spend and one output.
#[derive(Clone, PartialEq, Eq)]
pub struct Action {
    pub cv_net: [u8; 32],
    pub nullifier: [u8; 32],
    pub rk: [u8; 32],
    pub cmx: [u8; 32],
    pub ephemeral_key: [u8; 32],
    pub enc_ciphertext: [u8; ENC_CIPHERTEXT_SIZE],
    pub out_ciphertext: [u8; OUT_CIPHERTEXT_SIZE],
    pub spend_auth_sig: [u8; 64],
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "Action(cv_net = {}, nullifier = {}, rk = {}, cmx = {}, ephemeral_key = {})",
            hex::encode(self.cv_net),
            hex::encode(self.nullifier),
            hex::encode(self.rk),
            hex::encode(self.cmx),
            hex::encode(self.ephemeral_key),
        )
    }
}

/// An Orchard bundle containing at least one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub actions: NonEmpty<Action>,
    pub flags: Flags,
    pub value_balance: ZatBalance,
    pub anchor: [u8; 32],
    pub proof: Vec<u8>,
    pub binding_sig: [u8; 64],
}

/// Reads an Orchard bundle from a v5 transaction format.
pub fn read_v5_bundle<R: Read>(mut reader: R) -> io::Result<Option<Bundle>> {
    #[allow(clippy::redundant_closure)]
    let actions_without_auth = Vector::read(&mut reader, |r| read_action_without_auth(r))?;
    if actions_without_auth.is_empty() {
        Ok(None)
    } else {
        let flags = read_flags(&mut reader)?;
        let value_balance = Transaction::read_amount(&mut reader)?;
        let anchor = read_anchor(&mut reader)?;
        let proof = Vector::read(&mut reader, |r| r.read_u8())?;
        let sigs = Array::read(&mut reader, actions_without_auth.len(), |r| {
            read_signature(r)
        })?;
        let binding_sig = read_signature(&mut reader)?;

        let actions = actions_without_auth
            .into_iter()
            .zip(sigs)
            .map(|(mut action, sig)| {
                action.spend_auth_sig = sig;
                action
            })
            .collect::<Vec<_>>();

        Ok(NonEmpty::from_vec(actions).map(|actions| Bundle {
            actions,
            flags,
            value_balance,
            anchor,
            proof,
            binding_sig,
        }))
    }
}

fn read_32<R: Read>(mut reader: R) -> io::Result<[u8; 32]> {
    let mut bytes = [0u8; 32];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// Reads the fields of an action up to and including its note ciphertexts.
///
/// The spend authorization signature is encoded separately and is left zeroed here.
pub fn read_action_without_auth<R: Read>(mut reader: R) -> io::Result<Action> {
    let cv_net = read_32(&mut reader)?;
    let nullifier = read_32(&mut reader)?;
    let rk = read_32(&mut reader)?;
    let cmx = read_32(&mut reader)?;
    let ephemeral_key = read_32(&mut reader)?;
    let mut enc_ciphertext = [0u8; ENC_CIPHERTEXT_SIZE];
    reader.read_exact(&mut enc_ciphertext)?;
    let mut out_ciphertext = [0u8; OUT_CIPHERTEXT_SIZE];
    reader.read_exact(&mut out_ciphertext)?;

    Ok(Action {
        cv_net,
        nullifier,
        rk,
        cmx,
        ephemeral_key,
        enc_ciphertext,
        out_ciphertext,
        spend_auth_sig: [0u8; 64],
    })
}

pub fn read_flags<R: Read>(mut reader: R) -> io::Result<Flags> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Flags::from_byte(byte[0]).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid Orchard flags".to_owned(),
        )
    })
}

pub fn read_anchor<R: Read>(reader: R) -> io::Result<[u8; 32]> {
    read_32(reader)
}

/// Writes a [`Bundle`] in the v5 transaction format.
pub fn write_v5_bundle<W: Write>(bundle: Option<&Bundle>, mut writer: W) -> io::Result<()> {
    if let Some(bundle) = &bundle {
        Vector::write_nonempty(&mut writer, &bundle.actions, |w, a| {
            write_action_without_auth(w, a)
        })?;

        writer.write_all(&[bundle.flags.to_byte()])?;
        writer.write_all(&bundle.value_balance.to_i64_le_bytes())?;
        writer.write_all(&bundle.anchor)?;
        Vector::write(&mut writer, &bundle.proof, |w, b| w.write_u8(*b))?;
        Array::write(&mut writer, bundle.actions.iter(), |w, a| {
            w.write_all(&a.spend_auth_sig)
        })?;
        writer.write_all(&bundle.binding_sig)?;
    } else {
        CompactSize::write(&mut writer, 0)?;
    }

    Ok(())
}

pub fn write_action_without_auth<W: Write>(mut writer: W, act: &Action) -> io::Result<()> {
    writer.write_all(&act.cv_net)?;
    writer.write_all(&act.nullifier)?;
    writer.write_all(&act.rk)?;
    writer.write_all(&act.cmx)?;
    writer.write_all(&act.ephemeral_key)?;
    writer.write_all(&act.enc_ciphertext)?;
    writer.write_all(&act.out_ciphertext)?;
    Ok(())
}

#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use nonempty::NonEmpty;
    use zcash_protocol::{
        constants::{ENC_CIPHERTEXT_SIZE, OUT_CIPHERTEXT_SIZE},
        value::testing::arb_zat_balance,
    };

    use super::{Action, Bundle, Flags};
    use crate::transaction::{components::testing::arb_array, TxVersion};

    prop_compose! {
        pub fn arb_action()(
            cv_net in prop::array::uniform32(any::<u8>()),
            nullifier in prop::array::uniform32(any::<u8>()),
            rk in prop::array::uniform32(any::<u8>()),
            cmx in prop::array::uniform32(any::<u8>()),
            ephemeral_key in prop::array::uniform32(any::<u8>()),
            enc_ciphertext in arb_array::<ENC_CIPHERTEXT_SIZE>(),
            out_ciphertext in arb_array::<OUT_CIPHERTEXT_SIZE>(),
            spend_auth_sig in arb_array::<64>(),
        ) -> Action {
            Action {
                cv_net,
                nullifier,
                rk,
                cmx,
                ephemeral_key,
                enc_ciphertext,
                out_ciphertext,
                spend_auth_sig,
            }
        }
    }

    prop_compose! {
        pub fn arb_bundle()(
            actions in vec(arb_action(), 1..4),
            spends_enabled in any::<bool>(),
            outputs_enabled in any::<bool>(),
            value_balance in arb_zat_balance(),
            anchor in prop::array::uniform32(any::<u8>()),
            proof in vec(any::<u8>(), 0..300),
            binding_sig in arb_array::<64>(),
        ) -> Bundle {
            Bundle {
                actions: NonEmpty::from_vec(actions).expect("at least one action"),
                flags: Flags::from_parts(spends_enabled, outputs_enabled),
                value_balance,
                anchor,
                proof,
                binding_sig,
            }
        }
    }

    pub fn arb_bundle_for_version(v: TxVersion) -> impl Strategy<Value = Option<Bundle>> {
        if v == TxVersion::Zip225 {
            Strategy::boxed(proptest::option::of(arb_bundle()))
        } else {
            Strategy::boxed(Just(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::{read_flags, read_v5_bundle, testing::arb_bundle, write_v5_bundle, Flags};

    #[test]
    fn flags_round_trip() {
        for byte in 0u8..4 {
            assert_eq!(Flags::from_byte(byte).map(|f| f.to_byte()), Some(byte));
        }
        assert_eq!(Flags::from_byte(0b0000_0100), None);
        assert_eq!(Flags::from_byte(0b1000_0001), None);
    }

    #[test]
    fn reserved_flag_bits_are_rejected() {
        assert_matches!(read_flags(&[0x04][..]), Err(e) if e.to_string() == "invalid Orchard flags");
    }

    #[test]
    fn no_actions_is_no_bundle() {
        let mut buf = vec![];
        write_v5_bundle(None, &mut buf).unwrap();
        assert_eq!(buf, [0x00]);
        assert_eq!(read_v5_bundle(&buf[..]).unwrap(), None);
    }

    proptest! {
        #[test]
        fn bundle_round_trip(bundle in arb_bundle()) {
            let mut buf = vec![];
            write_v5_bundle(Some(&bundle), &mut buf).unwrap();
            prop_assert_eq!(read_v5_bundle(&buf[..]).unwrap(), Some(bundle));
        }
    }
}
