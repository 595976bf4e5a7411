//! The snapshot-fetching collaborator (spec §6): a named external seam,
//! not an implementation. Fetching on-chain pool state means a reader
//! endpoint and network transport, both explicitly out of scope (spec §1).
//! This crate never calls into an implementation of this trait — it only
//! gives embedding applications a name to implement against.

use crate::crypto::CryptoSwapPool;
use crate::stable::StableSwapPool;

/// Given a pool address, returns a fully populated [`StableSwapPool`] or
/// [`CryptoSwapPool`] snapshot. Implementations own their own RPC client,
/// caching, and retry policy; none of that is this crate's concern.
///
/// Tests exercising a live collaborator should skip when one isn't
/// configured rather than fail the suite.
pub trait PoolSnapshotSource {
    type Address;
    type Error;

    fn fetch_stable_swap_pool(&self, pool: &Self::Address) -> Result<StableSwapPool, Self::Error>;
    fn fetch_crypto_swap_pool(&self, pool: &Self::Address) -> Result<CryptoSwapPool, Self::Error>;
}
