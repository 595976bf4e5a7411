//! Error taxonomy (spec §7).
//!
//! One flat, stable-identifier enum per the pack's `dexter::error::ContractError`
//! pattern: kernel primitives return these on malformed invocation; the
//! swap/quote helpers in [`crate::analytics`] instead return `U256::zero()`
//! for the cheap-to-detect "semantically invalid" cases spec §7 calls out,
//! and never construct this enum for those.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveMathError {
    #[error("index out of range or i == j")]
    InvalidIndex,

    #[error("amplification coefficient must be non-zero")]
    InvalidA,

    #[error("gamma must be non-zero")]
    InvalidGamma,

    #[error("ramp requires future_time > initial_time")]
    InvalidRamp,

    #[error("slippage bps must be in [0, 10000]")]
    InvalidSlippage,

    #[error("decimals out of range")]
    InvalidDecimals,

    #[error("a balance is zero in a non-empty pool")]
    ZeroBalance,

    #[error("stableswap denominator 2y + b - D <= 0")]
    BadDenom,

    #[error("insufficient liquidity: D^2 / PRECISION == 0")]
    InsufficientLiquidity,

    #[error("Newton or binary-search solve did not converge")]
    NoConverge,

    #[error("liquidity operation with total_supply == 0 but D > 0")]
    SupplyZero,
}

pub type Result<T> = core::result::Result<T, CurveMathError>;
