//! Consensus logic and parameters.

use std::convert::TryFrom;
use std::fmt;

/// A block height. Also the type of a transaction's `nExpiryHeight`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHeight(u32);

/// The height of the genesis block on a network.
pub const H0: BlockHeight = BlockHeight(0);

impl BlockHeight {
    /// Constructs a height from its `u32` representation.
    pub const fn from_u32(v: u32) -> BlockHeight {
        BlockHeight(v)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

impl From<u32> for BlockHeight {
    fn from(value: u32) -> Self {
        BlockHeight(value)
    }
}

impl From<BlockHeight> for u32 {
    fn from(value: BlockHeight) -> u32 {
        value.0
    }
}

impl From<BlockHeight> for u64 {
    fn from(value: BlockHeight) -> u64 {
        u64::from(value.0)
    }
}

/// Zcash consensus parameters.
pub trait Parameters: Clone {
    /// Returns the activation height for a particular network upgrade,
    /// if an activation height has been set.
    fn activation_height(&self, nu: NetworkUpgrade) -> Option<BlockHeight>;

    /// Determines whether the specified network upgrade is active as of the
    /// provided block height on the network to which this Parameters value applies.
    fn is_nu_active(&self, nu: NetworkUpgrade, height: BlockHeight) -> bool {
        self.activation_height(nu).is_some_and(|h| h <= height)
    }
}

/// The enumeration of known Zcash networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    /// Zcash Mainnet.
    MainNetwork,
    /// Zcash Testnet.
    TestNetwork,
}

/// Activation heights, indexed like [`UPGRADES_IN_ORDER`].
const MAINNET_ACTIVATIONS: [u32; 7] = [
    347_500, 419_200, 653_600, 903_000, 1_046_400, 1_687_104, 2_726_400,
];
const TESTNET_ACTIVATIONS: [u32; 7] = [
    207_500, 280_000, 584_000, 903_800, 1_028_500, 1_842_420, 2_976_000,
];

impl Parameters for Network {
    fn activation_height(&self, nu: NetworkUpgrade) -> Option<BlockHeight> {
        let table = match self {
            Network::MainNetwork => &MAINNET_ACTIVATIONS,
            Network::TestNetwork => &TESTNET_ACTIVATIONS,
        };
        UPGRADES_IN_ORDER
            .iter()
            .position(|u| *u == nu)
            .map(|i| BlockHeight(table[i]))
    }
}

/// A point on the chain at which the consensus rules change. See [ZIP 200].
///
/// Each upgrade activates the [`BranchId`] of the same name.
///
/// [ZIP 200]: https://zips.z.cash/zip-0200
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkUpgrade {
    Overwinter,
    Sapling,
    Blossom,
    Heartwood,
    Canopy,
    Nu5,
    Nu6,
}

impl fmt::Display for NetworkUpgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl NetworkUpgrade {
    fn branch_id(self) -> BranchId {
        match self {
            NetworkUpgrade::Overwinter => BranchId::Overwinter,
            NetworkUpgrade::Sapling => BranchId::Sapling,
            NetworkUpgrade::Blossom => BranchId::Blossom,
            NetworkUpgrade::Heartwood => BranchId::Heartwood,
            NetworkUpgrade::Canopy => BranchId::Canopy,
            NetworkUpgrade::Nu5 => BranchId::Nu5,
            NetworkUpgrade::Nu6 => BranchId::Nu6,
        }
    }
}

/// Network upgrades in activation order.
const UPGRADES_IN_ORDER: &[NetworkUpgrade] = &[
    NetworkUpgrade::Overwinter,
    NetworkUpgrade::Sapling,
    NetworkUpgrade::Blossom,
    NetworkUpgrade::Heartwood,
    NetworkUpgrade::Canopy,
    NetworkUpgrade::Nu5,
    NetworkUpgrade::Nu6,
];

/// Identifies the consensus rule set in force between two network upgrades.
///
/// Signature digests commit to the branch id, which gives two-way replay protection
/// across upgrades. The history tree also keys its node hashes with it. See [ZIP 200].
///
/// [ZIP 200]: https://zips.z.cash/zip-0200
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchId {
    /// Rules in force from genesis until Overwinter.
    Sprout,
    Overwinter,
    Sapling,
    Blossom,
    Heartwood,
    Canopy,
    Nu5,
    Nu6,
}

const BRANCH_IDS: [(BranchId, u32); 8] = [
    (BranchId::Sprout, 0),
    (BranchId::Overwinter, 0x5ba8_1b19),
    (BranchId::Sapling, 0x76b8_09bb),
    (BranchId::Blossom, 0x2bb4_0e60),
    (BranchId::Heartwood, 0xf5b9_230b),
    (BranchId::Canopy, 0xe9ff_75a6),
    (BranchId::Nu5, 0xc2d6_d0b4),
    (BranchId::Nu6, 0xc8e7_1055),
];

impl TryFrom<u32> for BranchId {
    type Error = &'static str;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        BRANCH_IDS
            .iter()
            .find(|(_, id)| *id == value)
            .map(|(branch, _)| *branch)
            .ok_or("Unknown consensus branch ID")
    }
}

impl From<BranchId> for u32 {
    fn from(consensus_branch_id: BranchId) -> u32 {
        BRANCH_IDS
            .iter()
            .find(|(branch, _)| *branch == consensus_branch_id)
            .map_or(0, |(_, id)| *id)
    }
}

impl BranchId {
    /// The branch whose rules are in force at `height`.
    pub fn for_height<P: Parameters>(parameters: &P, height: BlockHeight) -> Self {
        UPGRADES_IN_ORDER
            .iter()
            .rev()
            .find(|nu| parameters.is_nu_active(**nu, height))
            .map_or(BranchId::Sprout, |nu| nu.branch_id())
    }

    /// The half-open height range `start..end` over which this branch's rules apply, with
    /// `end == None` for the current epoch. Returns `None` if the branch never activates.
    pub fn height_bounds<P: Parameters>(
        &self,
        params: &P,
    ) -> Option<(BlockHeight, Option<BlockHeight>)> {
        let upgrade = UPGRADES_IN_ORDER
            .iter()
            .position(|nu| nu.branch_id() == *self);
        let lower = match upgrade {
            None => H0,
            Some(i) => params.activation_height(UPGRADES_IN_ORDER[i])?,
        };
        let next = upgrade.map_or(0, |i| i + 1);
        let upper = UPGRADES_IN_ORDER[next..]
            .iter()
            .find_map(|nu| params.activation_height(*nu));
        Some((lower, upper))
    }
}

#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing {
    use proptest::sample::select;
    use proptest::strategy::Strategy;

    use super::BranchId;

    /// Selects any known consensus branch id.
    pub fn arb_branch_id() -> impl Strategy<Value = BranchId> {
        select(vec![
            BranchId::Sprout,
            BranchId::Overwinter,
            BranchId::Sapling,
            BranchId::Blossom,
            BranchId::Heartwood,
            BranchId::Canopy,
            BranchId::Nu5,
            BranchId::Nu6,
        ])
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::{
        BlockHeight, BranchId, Network, NetworkUpgrade, Parameters, H0, UPGRADES_IN_ORDER,
    };

    #[test]
    fn nu_ordering() {
        for network in [Network::MainNetwork, Network::TestNetwork] {
            for i in 1..UPGRADES_IN_ORDER.len() {
                let nu_a = UPGRADES_IN_ORDER[i - 1];
                let nu_b = UPGRADES_IN_ORDER[i];
                match (
                    network.activation_height(nu_a),
                    network.activation_height(nu_b),
                ) {
                    (Some(a), Some(b)) if a < b => (),
                    (Some(_), None) => (),
                    (None, None) => (),
                    _ => panic!(
                        "{} should not be before {} in UPGRADES_IN_ORDER",
                        nu_a, nu_b
                    ),
                }
            }
        }
    }

    #[test]
    fn nu_is_active() {
        assert!(!Network::MainNetwork.is_nu_active(NetworkUpgrade::Overwinter, BlockHeight(0)));
        assert!(
            !Network::MainNetwork.is_nu_active(NetworkUpgrade::Overwinter, BlockHeight(347_499))
        );
        assert!(Network::MainNetwork.is_nu_active(NetworkUpgrade::Overwinter, BlockHeight(347_500)));
    }

    #[test]
    fn branch_id_from_u32() {
        assert_eq!(BranchId::try_from(0), Ok(BranchId::Sprout));
        assert_eq!(BranchId::try_from(0xc2d6_d0b4), Ok(BranchId::Nu5));
        assert!(BranchId::try_from(1).is_err());
    }

    #[test]
    fn branch_id_round_trip() {
        for nu in UPGRADES_IN_ORDER {
            let id = nu.branch_id();
            assert_eq!(BranchId::try_from(u32::from(id)), Ok(id));
        }
    }

    #[test]
    fn branch_id_for_height() {
        assert_eq!(
            BranchId::for_height(&Network::MainNetwork, BlockHeight(0)),
            BranchId::Sprout,
        );
        assert_eq!(
            BranchId::for_height(&Network::MainNetwork, BlockHeight(419_199)),
            BranchId::Overwinter,
        );
        assert_eq!(
            BranchId::for_height(&Network::MainNetwork, BlockHeight(419_200)),
            BranchId::Sapling,
        );
        assert_eq!(
            BranchId::for_height(&Network::MainNetwork, BlockHeight(903_000)),
            BranchId::Heartwood,
        );
        assert_eq!(
            BranchId::for_height(&Network::MainNetwork, BlockHeight(1_046_400)),
            BranchId::Canopy,
        );
        assert_eq!(
            BranchId::for_height(&Network::MainNetwork, BlockHeight(1_687_104)),
            BranchId::Nu5,
        );
        assert_eq!(
            BranchId::for_height(&Network::TestNetwork, BlockHeight(2_976_000)),
            BranchId::Nu6,
        );
    }

    #[test]
    fn branch_id_height_bounds() {
        assert_eq!(
            BranchId::Sprout.height_bounds(&Network::MainNetwork),
            Some((H0, Some(BlockHeight(347_500))))
        );
        assert_eq!(
            BranchId::Nu5.height_bounds(&Network::MainNetwork),
            Some((BlockHeight(1_687_104), Some(BlockHeight(2_726_400))))
        );
        assert_eq!(
            BranchId::Nu6.height_bounds(&Network::MainNetwork),
            Some((BlockHeight(2_726_400), None))
        );
    }
}
