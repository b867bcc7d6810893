//! *Zcash transactions, blocks, and the digests that commit to them.*
//!
//! `zcash_chain` contains the consensus encodings of Zcash transactions (versions 1 through
//! 5) and blocks, the [ZIP 244] transaction identifier, authorizing data commitment and
//! signature digests, the [ZIP 143]/[ZIP 243] signature digests for v3 and v4 transactions,
//! and the construction of [ZIP 221] chain history leaves from block headers.
//!
//! [ZIP 143]: https://zips.z.cash/zip-0143
//! [ZIP 221]: https://zips.z.cash/zip-0221
//! [ZIP 243]: https://zips.z.cash/zip-0243
//! [ZIP 244]: https://zips.z.cash/zip-0244
//!
#![cfg_attr(feature = "std", doc = "## Feature flags")]
#![cfg_attr(feature = "std", doc = document_features::document_features!())]
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// Catch documentation errors caused by code changes.
#![deny(rustdoc::broken_intra_doc_links)]
// Temporary until we have addressed all Result<T, ()> cases.
#![allow(clippy::result_unit_err)]

pub mod block;
mod error;
pub mod history;
pub mod transaction;

pub use error::Error;
pub use zcash_protocol::{consensus, constants};
