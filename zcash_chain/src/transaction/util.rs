//! Hashing adapters used while reading and writing transactions.
pub mod sha256d;
