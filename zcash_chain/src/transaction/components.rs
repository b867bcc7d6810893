//! Structs representing the components within Zcash transactions.
pub mod orchard;
pub mod sapling;
pub mod sprout;
pub mod transparent;

pub use self::sapling::{OutputDescription, SpendDescription};
pub use self::sprout::JsDescription;
pub use self::transparent::{OutPoint, TxIn, TxOut};

// π_A + π_B + π_C
pub const GROTH_PROOF_SIZE: usize = 48 + 96 + 48;
// π_A + π_A' + π_B + π_B' + π_C + π_C' + π_K + π_H
pub const PHGR_PROOF_SIZE: usize = 33 + 33 + 65 + 33 + 33 + 33 + 33 + 33;

#[cfg(any(test, feature = "test-dependencies"))]
pub(crate) mod testing {
    use proptest::collection::vec;
    use proptest::prelude::*;

    /// Produces fixed-size byte arrays of arbitrary content.
    pub fn arb_array<const N: usize>() -> impl Strategy<Value = [u8; N]> {
        vec(any::<u8>(), N).prop_map(|v| v.try_into().expect("correct length"))
    }
}
