//! Transaction format constants.

/// The transaction version introduced by the Overwinter network upgrade.
pub const OVERWINTER_TX_VERSION: u32 = 3;
/// The version group id for Zcash Overwinter transactions.
pub const OVERWINTER_VERSION_GROUP_ID: u32 = 0x03C48270;

/// The transaction version introduced by the Sapling network upgrade.
pub const SAPLING_TX_VERSION: u32 = 4;
/// The version group id for Zcash Sapling transactions.
pub const SAPLING_VERSION_GROUP_ID: u32 = 0x892F2085;

/// The transaction version introduced by the NU5 network upgrade.
pub const V5_TX_VERSION: u32 = 5;
/// The version group id for Zcash Nu5 transactions.
pub const V5_VERSION_GROUP_ID: u32 = 0x26A7270A;

/// Bit 31 of the transaction header word, set for every transaction from Overwinter on.
pub const OVERWINTERED_FLAG: u32 = 1 << 31;

/// Size in bytes of a Sapling or Orchard note ciphertext.
pub const ENC_CIPHERTEXT_SIZE: usize = 580;
/// Size in bytes of a Sapling or Orchard outgoing ciphertext.
pub const OUT_CIPHERTEXT_SIZE: usize = 80;
/// End of the compact prefix of a note ciphertext (lead byte, diversifier, value, rseed).
pub const COMPACT_NOTE_SIZE: usize = 52;
/// End of the memo field of a note ciphertext.
pub const NOTE_PLAINTEXT_SIZE: usize = COMPACT_NOTE_SIZE + 512;
