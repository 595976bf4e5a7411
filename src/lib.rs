//! Off-chain, gas-free reimplementation of Curve's StableSwap and
//! CryptoSwap (v2) AMM math.
//!
//! Every public function is a pure, re-entrant computation over an
//! immutable pool snapshot: no I/O, no global state, no logging side
//! effects. Embedding applications own their own `tracing` subscriber and
//! their own collaborator for fetching on-chain snapshots — this crate
//! only computes.
//!
//! - [`stable`] — the StableSwap invariant solver and exact-order swap math.
//! - [`crypto`] — the CryptoSwap (v2) two- and three-coin Newton solvers.
//! - [`analytics`] — liquidity math, prices, price impact, slippage helpers.
//! - [`ramp`] — `(A, gamma)` parameter interpolation.
//! - [`metapool`] — base-pool routing composed from existing primitives.
//! - [`snapshot`] — the named seam for the external snapshot-fetching
//!   collaborator (trait only, no implementation).

pub mod analytics;
pub mod crypto;
pub mod error;
pub mod metapool;
pub mod primitives;
pub mod ramp;
pub mod snapshot;
pub mod stable;

pub use crypto::CryptoSwapPool;
pub use error::{CurveMathError, Result};
pub use primitives::{U256, U512};
pub use snapshot::PoolSnapshotSource;
pub use stable::StableSwapPool;
