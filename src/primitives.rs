//! Fixed-point primitives (C1).
//!
//! Unsigned arbitrary-precision integers and the handful of constants every
//! kernel in this crate is built from. `U256` is the storage/return width;
//! `U512` supplies headroom for the chained multiplications inside the
//! Newton solvers (`D·D_P`, `mul1`/`mul2`, `D²`) that would otherwise
//! overflow 256 bits for extreme pool states. All division here, as
//! everywhere else in this crate, is integer division truncating toward
//! zero — there is no floating point in the core.

use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer (little-endian limbs).
    pub struct U256(4);
}

construct_uint! {
    /// 512-bit unsigned integer, used only for intermediate products.
    pub struct U512(8);
}

/// 1e18 — the base of the internal fixed-point representation.
pub const PRECISION: U256 = U256([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// 100 — denominator for the raw amplification coefficient `A`.
pub const A_PRECISION: U256 = U256([100, 0, 0, 0]);

/// 10000 — denominator for CryptoSwap's `A` parameter.
pub const A_MULTIPLIER: U256 = U256([10_000, 0, 0, 0]);

/// 1e10 — the unit every fee parameter (StableSwap `fee`, CryptoSwap
/// `mid_fee`/`out_fee`/dynamic fee) is expressed in.
pub const FEE_DENOMINATOR: U256 = U256([10_000_000_000, 0, 0, 0]);

/// 1e4 — one basis point is `1 / BPS_DENOMINATOR`.
pub const BPS_DENOMINATOR: U256 = U256([10_000, 0, 0, 0]);

/// Relative-tolerance convergence threshold shared by the CryptoSwap
/// Newton solvers (`|delta| * CONVERGENCE_THRESHOLD < value`).
pub const CONVERGENCE_THRESHOLD: U256 = U256([100_000_000_000_000, 0, 0, 0]);

/// Floor applied to the CryptoSwap convergence limit so tiny pools don't
/// demand impossible precision.
pub const MIN_CONVERGENCE: U256 = U256([100, 0, 0, 0]);

/// Upper bound on Newton-iteration rounds before a solve is declared
/// non-convergent.
pub const MAX_NEWTON_ITERATIONS: u32 = 255;

/// Upper bound on binary-search rounds for the inverse-problem solvers.
pub const MAX_BISECTION_ITERATIONS: u32 = 256;

/// Upper bound on exponential-expansion doublings used to seed a binary
/// search's upper bound.
pub const MAX_EXPANSIONS: u32 = 10;

/// Size, in a token's native units, of the probe trade `getSpotPrice` uses
/// to take a first derivative of the swap curve.
pub const DERIVATIVE_EPSILON: U256 = U256([1_000_000, 0, 0, 0]);

#[inline]
pub fn widen(x: U256) -> U512 {
    let U256(limbs) = x;
    U512([limbs[0], limbs[1], limbs[2], limbs[3], 0, 0, 0, 0])
}

#[inline]
pub fn narrow(x: U512) -> U256 {
    let U512(limbs) = x;
    debug_assert!(
        limbs[4] == 0 && limbs[5] == 0 && limbs[6] == 0 && limbs[7] == 0,
        "U512 value does not fit in U256"
    );
    U256([limbs[0], limbs[1], limbs[2], limbs[3]])
}

/// Absolute difference, well-defined for unsigned integers either side.
#[inline]
pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

#[inline]
pub fn abs_diff512(a: U512, b: U512) -> U512 {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

#[inline]
pub fn min(a: U256, b: U256) -> U256 {
    if a < b {
        a
    } else {
        b
    }
}

#[inline]
pub fn max(a: U256, b: U256) -> U256 {
    if a > b {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_narrow_roundtrip() {
        let x = U256::from(123456789u64) * PRECISION;
        assert_eq!(narrow(widen(x)), x);
    }

    #[test]
    fn abs_diff_is_symmetric() {
        let a = U256::from(10u8);
        let b = U256::from(3u8);
        assert_eq!(abs_diff(a, b), abs_diff(b, a));
        assert_eq!(abs_diff(a, b), U256::from(7u8));
    }
}
