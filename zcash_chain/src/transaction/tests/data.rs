//! Transactions with one transparent input and one transparent output, and the digests
//! that commit to them.
//!
//! The input spends `01..01:1` with `scriptSig = OP_1 OP_2` and `nSequence = 0xfffffffe`;
//! the output pays 50000 zatoshis to `76 a9 ac`. Both transactions have
//! `nLockTime = 0x11223344` and `nExpiryHeight = 1700000`. Signature hashes sign input 0
//! with `scriptCode = OP_CHECKSIG` and a spent value of 100000 zatoshis.

pub(super) const SCRIPT_CODE: [u8; 1] = [0xac];
pub(super) const SPENT_VALUE: u64 = 100_000;

pub(crate) mod v4 {
    pub(crate) const TX: &str = "0400008085202f8901010101010101010101010101010101010101010101010101010101010101010101000000025152feffffff0150c30000000000000376a9ac44332211a0f019000000000000000000000000";
    pub(crate) const TXID: &str =
        "456f3bbb7fadd3493be707e3cc65684c5e50953d9e8006cbb3364f658b14a400";
    pub(crate) const SIGHASH_ALL: &str =
        "f7d64cbba12380bf58d3677d17f94744c43804588c8aea1a823de8c475dbc1a3";
    pub(crate) const SIGHASH_SHIELDED: &str =
        "46f2e48a2a6324a9a890a2ba69d87b97c412d60db9fc74b1642cc7f712ced64a";
    pub(crate) const SIGHASH_SINGLE_ANYONECANPAY: &str =
        "1df43a87b6024144d72a955382840961dba422be1f5bed24d2159502632c9490";
}

pub(crate) mod v5 {
    pub(crate) const TX: &str = "050000800a27a726b4d0d6c244332211a0f0190001010101010101010101010101010101010101010101010101010101010101010101000000025152feffffff0150c30000000000000376a9ac000000";
    pub(crate) const TXID: &str =
        "6d0a3417d4b5cb847a25ffe08046f3a23f9be65828853be361d2b8d6142629cf";
    pub(crate) const SIGHASH_ALL: &str =
        "39bd4931f31ae5fc6fee6e9defa7e6f338b48acaf59dd3b8f773a67c0c1efe15";
    pub(crate) const AUTH_COMMITMENT: &str =
        "99eb3618e4dbbcf604ca7fdb382211e64afca945bd058d653df54ef8727ddac2";
}
