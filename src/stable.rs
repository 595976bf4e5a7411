//! StableSwap kernel (C2): `getD`, `getY`, `getYD`, the dynamic fee curve,
//! and the exact-order swap wrappers `getDyExact`/`getDxExact`.
//!
//! Division order throughout this module is load-bearing (spec §4.2,
//! design note "Division order is load-bearing") — reassociating any of
//! the chained multiply/divide sequences below would lose last-unit
//! parity with the reference Vyper contracts, so every sequence mirrors
//! the spec's prose verbatim rather than being simplified algebraically.

use crate::error::{CurveMathError, Result};
use crate::primitives::{abs_diff, max, narrow, widen, A_PRECISION, FEE_DENOMINATOR, PRECISION, U256, U512};

/// Minimum number of coins a StableSwap pool supports.
pub const MIN_COINS: usize = 2;
/// Maximum number of coins a StableSwap pool supports.
pub const MAX_COINS: usize = 8;

/// A StableSwap pool snapshot. Every field is a plain value; constructing
/// one never touches the network or any global state.
#[derive(Debug, Clone)]
pub struct StableSwapPool {
    pub balances: Vec<U256>,
    /// Exact-mode per-token multiplier: `rates[i] = 10^(36 - decimals[i])`.
    pub rates: Vec<U256>,
    /// Normalized-mode per-token multiplier: `precisions[i] = 10^(18 - decimals[i])`.
    pub precisions: Vec<U256>,
    pub amp: U256,
    pub fee: U256,
    pub offpeg_fee_multiplier: U256,
    pub total_supply: U256,
}

impl StableSwapPool {
    /// Builds a pool snapshot from per-token decimals, deriving both
    /// `rates` and `precisions` as spec §3 defines them.
    pub fn from_decimals(
        balances: Vec<U256>,
        decimals: &[u8],
        amp: U256,
        fee: U256,
        offpeg_fee_multiplier: U256,
        total_supply: U256,
    ) -> Result<Self> {
        if balances.len() < MIN_COINS || balances.len() > MAX_COINS || balances.len() != decimals.len() {
            return Err(CurveMathError::InvalidIndex);
        }
        let mut rates = Vec::with_capacity(decimals.len());
        let mut precisions = Vec::with_capacity(decimals.len());
        for &d in decimals {
            if d > 36 {
                return Err(CurveMathError::InvalidDecimals);
            }
            rates.push(U256::from(10u8).pow(U256::from(36 - d)));
            if d > 18 {
                return Err(CurveMathError::InvalidDecimals);
            }
            precisions.push(U256::from(10u8).pow(U256::from(18 - d)));
        }
        Ok(Self {
            balances,
            rates,
            precisions,
            amp,
            fee,
            offpeg_fee_multiplier,
            total_supply,
        })
    }

    pub fn n(&self) -> usize {
        self.balances.len()
    }

    /// `Ann = A * A_PRECISION * N`.
    pub fn ann(&self) -> U256 {
        self.amp * A_PRECISION * U256::from(self.n() as u64)
    }

    /// Exact-mode normalized balances: `xp[i] = rates[i] * balances[i] / PRECISION`.
    pub fn xp_exact(&self) -> Vec<U256> {
        self.balances
            .iter()
            .zip(&self.rates)
            .map(|(&b, &r)| r * b / PRECISION)
            .collect()
    }

    /// Normalized-mode balances: `xp[i] = balances[i] * precisions[i]`.
    pub fn xp_normalized(&self) -> Vec<U256> {
        self.balances
            .iter()
            .zip(&self.precisions)
            .map(|(&b, &p)| b * p)
            .collect()
    }
}

/// Solves the StableSwap invariant for `D` (spec §4.2.1).
pub fn get_d(xp: &[U256], ann: U256) -> Result<U256> {
    let n = xp.len();
    let sum: U256 = xp.iter().fold(U256::zero(), |acc, &x| acc + x);
    if sum.is_zero() {
        return Ok(U256::zero());
    }
    if xp.iter().any(|x| x.is_zero()) {
        return Err(CurveMathError::ZeroBalance);
    }
    if ann.is_zero() {
        return Err(CurveMathError::InvalidA);
    }

    let n_u256 = U256::from(n as u64);
    let n_pow_n = n_u256.pow(n_u256);

    let mut d = sum;
    let s512 = widen(sum);
    let ann512 = widen(ann);
    let n512 = widen(n_u256);
    let n_pow_n512 = widen(n_pow_n);
    let a_precision512 = widen(A_PRECISION);

    for _ in 0..crate::primitives::MAX_NEWTON_ITERATIONS {
        let d512 = widen(d);

        // D_P <- D_P * D / x_i for each i, THEN D_P <- D_P / n^n (spec §4.2.1).
        let mut d_p = d512;
        for &x in xp {
            d_p = d_p * d512 / widen(x);
        }
        d_p /= n_pow_n512;

        let d_prev = d;

        let numerator = (ann512 * s512 / a_precision512 + d_p * n512) * d512;
        let denominator =
            (ann512 - a_precision512) * d512 / a_precision512 + (n512 + widen(U256::one())) * d_p;
        d = narrow(numerator / denominator);

        if abs_diff(d, d_prev) <= U256::one() {
            return Ok(d);
        }
    }

    Err(CurveMathError::NoConverge)
}

/// Shared Newton solver underlying both `getY` and `getYD` (spec §4.2.2):
/// solves the invariant for the balance at `unknown`, holding every other
/// `xp[k]` (k != unknown) fixed, given the target `D`.
fn solve_y(unknown: usize, xp: &[U256], ann: U256, d: U256) -> Result<U256> {
    let n = xp.len();
    if unknown >= n {
        return Err(CurveMathError::InvalidIndex);
    }
    if ann.is_zero() {
        return Err(CurveMathError::InvalidA);
    }

    let n_u256 = U256::from(n as u64);
    let d512 = widen(d);
    let ann512 = widen(ann);
    let n512 = widen(n_u256);
    let a_precision512 = widen(A_PRECISION);

    let mut s_prime = U512::zero();
    let mut c = d512;
    for (k, &xk) in xp.iter().enumerate() {
        if k == unknown {
            continue;
        }
        c = c * d512 / (widen(xk) * n512);
        s_prime += widen(xk);
    }
    c = c * d512 * a_precision512 / (ann512 * n512);
    let b = s_prime + d512 * a_precision512 / ann512;

    let mut y = d512;
    for _ in 0..crate::primitives::MAX_NEWTON_ITERATIONS {
        let denom_total = y + y + b;
        if denom_total <= d512 {
            return Err(CurveMathError::BadDenom);
        }
        let denom = denom_total - d512;
        let y_new = (y * y + c) / denom;

        let diff = if y_new >= y { y_new - y } else { y - y_new };
        y = y_new;
        if diff <= U512::one() {
            return Ok(narrow(y));
        }
    }

    Err(CurveMathError::NoConverge)
}

/// `getY(i, j, new_xi, xp, Ann, D)` — solves for `y = x_j` after
/// substituting `new_xi` into index `i`.
pub fn get_y(i: usize, j: usize, new_xi: U256, xp: &[U256], ann: U256, d: U256) -> Result<U256> {
    if i == j || i >= xp.len() || j >= xp.len() {
        return Err(CurveMathError::InvalidIndex);
    }
    let mut xp2 = xp.to_vec();
    xp2[i] = new_xi;
    solve_y(j, &xp2, ann, d)
}

/// `getYD(i, xp, Ann, D)` — solves for `y_i` against a new `D`, holding
/// every existing other balance fixed (no substitution).
pub fn get_yd(i: usize, xp: &[U256], ann: U256, d: U256) -> Result<U256> {
    if i >= xp.len() {
        return Err(CurveMathError::InvalidIndex);
    }
    solve_y(i, xp, ann, d)
}

/// Dynamic fee for a pair `(x_i, x_j)` (spec §4.2.3).
pub fn dynamic_fee(x_i: U256, x_j: U256, base_fee: U256, multiplier: U256) -> U256 {
    if multiplier <= FEE_DENOMINATOR {
        return base_fee;
    }
    let s = x_i + x_j;
    if s.is_zero() {
        return base_fee;
    }
    let s512 = widen(s);
    let four_xixj = widen(U256::from(4u8)) * widen(x_i) * widen(x_j);
    let scaled = (widen(multiplier) - widen(FEE_DENOMINATOR)) * four_xixj / (s512 * s512);
    let denom = scaled + widen(FEE_DENOMINATOR);
    narrow(widen(multiplier) * widen(base_fee) / denom)
}

/// Exact-mode swap output (spec §4.2.4). Returns `Ok(0)` on the
/// cheap-to-detect "semantically invalid" inputs spec §7 calls out
/// (`i == j`, out-of-range index, `dx == 0`) rather than an error, per the
/// swap-helper policy.
pub fn get_dy_exact(i: usize, j: usize, dx: U256, pool: &StableSwapPool) -> Result<U256> {
    let n = pool.n();
    if i == j || i >= n || j >= n || dx.is_zero() {
        return Ok(U256::zero());
    }

    let xp = pool.xp_exact();
    let ann = pool.ann();
    let d = get_d(&xp, ann)?;

    let x = xp[i] + dx * pool.rates[i] / PRECISION;
    let y = get_y(i, j, x, &xp, ann, d)?;

    if xp[j] <= y + U256::one() {
        return Ok(U256::zero());
    }
    let dy_raw = xp[j] - y - U256::one();

    let avg_x = (xp[i] + x) / U256::from(2u8);
    let avg_y = (xp[j] + y) / U256::from(2u8);
    let fee = dynamic_fee(avg_x, avg_y, pool.fee, pool.offpeg_fee_multiplier);

    let dy_after_fee = dy_raw - fee * dy_raw / FEE_DENOMINATOR;
    let dy = dy_after_fee * PRECISION / pool.rates[j];
    Ok(dy)
}

/// Normalized-mode swap output: same evaluation order as [`get_dy_exact`]
/// (spec §4.2.4) but driven by `precisions` rather than `rates`, per the
/// Open Question resolution recorded in `DESIGN.md` — the two paths share
/// the same `get_d`/`get_y` solver and differ only in which multiplier
/// array scales `balances` into `xp` and how the result is unscaled back.
pub fn get_dy_normalized(i: usize, j: usize, dx: U256, pool: &StableSwapPool) -> Result<U256> {
    let n = pool.n();
    if i == j || i >= n || j >= n || dx.is_zero() {
        return Ok(U256::zero());
    }

    let xp = pool.xp_normalized();
    let ann = pool.ann();
    let d = get_d(&xp, ann)?;

    let x = xp[i] + dx * pool.precisions[i];
    let y = get_y(i, j, x, &xp, ann, d)?;

    if xp[j] <= y + U256::one() {
        return Ok(U256::zero());
    }
    let dy_raw = xp[j] - y - U256::one();

    let avg_x = (xp[i] + x) / U256::from(2u8);
    let avg_y = (xp[j] + y) / U256::from(2u8);
    let fee = dynamic_fee(avg_x, avg_y, pool.fee, pool.offpeg_fee_multiplier);

    let dy_after_fee = dy_raw - fee * dy_raw / FEE_DENOMINATOR;
    Ok(dy_after_fee / pool.precisions[j])
}

/// Inverse of [`get_dy_normalized`] via binary search, mirroring
/// [`get_dx_exact`]'s shape.
pub fn get_dx_normalized(i: usize, j: usize, dy: U256, pool: &StableSwapPool) -> Result<U256> {
    let n = pool.n();
    if i == j || i >= n || j >= n || dy.is_zero() {
        return Ok(U256::zero());
    }

    let max_balance = pool.balances.iter().fold(U256::zero(), |a, &b| max(a, b));
    let mut hi = U256::from(10u8) * max_balance;

    let achievable = |dx: U256| -> Result<U256> { get_dy_normalized(i, j, dx, pool) };

    let mut out = achievable(hi)?;
    let mut expansions = 0u32;
    while out < dy && expansions < crate::primitives::MAX_EXPANSIONS {
        hi = hi * U256::from(2u8);
        out = achievable(hi)?;
        expansions += 1;
    }
    if out < dy {
        return Ok(U256::zero());
    }

    let mut lo = U256::zero();
    for _ in 0..crate::primitives::MAX_BISECTION_ITERATIONS {
        if hi <= lo + U256::one() {
            break;
        }
        let mid = (lo + hi) / U256::from(2u8);
        let mid_out = achievable(mid)?;
        if mid_out >= dy {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    Ok(hi)
}

/// Inverse of [`get_dy_exact`] via binary search (spec §4.2.5).
pub fn get_dx_exact(i: usize, j: usize, dy: U256, pool: &StableSwapPool) -> Result<U256> {
    let n = pool.n();
    if i == j || i >= n || j >= n || dy.is_zero() {
        return Ok(U256::zero());
    }

    let max_balance = pool.balances.iter().fold(U256::zero(), |a, &b| max(a, b));
    let mut hi = U256::from(10u8) * max_balance;

    let achievable = |dx: U256| -> Result<U256> { get_dy_exact(i, j, dx, pool) };

    let mut out = achievable(hi)?;
    let mut expansions = 0u32;
    while out < dy && expansions < crate::primitives::MAX_EXPANSIONS {
        hi = hi * U256::from(2u8);
        out = achievable(hi)?;
        expansions += 1;
    }
    if out < dy {
        return Ok(U256::zero());
    }

    let mut lo = U256::zero();
    for _ in 0..crate::primitives::MAX_BISECTION_ITERATIONS {
        if hi <= lo + U256::one() {
            break;
        }
        let mid = (lo + hi) / U256::from(2u8);
        let mid_out = achievable(mid)?;
        if mid_out >= dy {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    Ok(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_18_6(b0: u128, b1: u128, amp: u64, fee: u64) -> StableSwapPool {
        StableSwapPool::from_decimals(
            vec![U256::from(b0), U256::from(b1)],
            &[18, 6],
            U256::from(amp),
            U256::from(fee),
            U256::zero(),
            U256::zero(),
        )
        .unwrap()
    }

    #[test]
    fn d_is_zero_for_empty_pool() {
        let xp = vec![U256::zero(), U256::zero()];
        assert_eq!(get_d(&xp, U256::from(200u32)).unwrap(), U256::zero());
    }

    #[test]
    fn d_rejects_partial_zero_balance() {
        let xp = vec![U256::from(100u32), U256::zero()];
        assert_eq!(get_d(&xp, U256::from(200u32)), Err(CurveMathError::ZeroBalance));
    }

    #[test]
    fn d_rejects_zero_ann() {
        let xp = vec![U256::from(100u32), U256::from(100u32)];
        assert_eq!(get_d(&xp, U256::zero()), Err(CurveMathError::InvalidA));
    }

    #[test]
    fn d_doubles_roughly_when_balances_double() {
        let xp = vec![U256::from(1_000_000u64) * PRECISION, U256::from(1_000_000u64) * PRECISION];
        let d1 = get_d(&xp, U256::from(100u32) * A_PRECISION * U256::from(2u8)).unwrap();
        let xp2: Vec<U256> = xp.iter().map(|&x| x * U256::from(2u8)).collect();
        let d2 = get_d(&xp2, U256::from(100u32) * A_PRECISION * U256::from(2u8)).unwrap();
        let ratio = d2 / d1;
        assert_eq!(ratio, U256::from(2u8));
    }

    #[test]
    fn balanced_dai_usdc_swap() {
        let pool = pool_18_6(1_000_000u128 * 1_000_000_000_000_000_000u128, 1_000_000u128 * 1_000_000u128, 100, 4_000_000);
        let dx = U256::from(1000u64) * PRECISION;
        let dy = get_dy_exact(0, 1, dx, &pool).unwrap();
        let lo = U256::from(990_000_000u64);
        let hi = U256::from(1_000_000_000u64);
        assert!(dy > lo && dy < hi, "dy={dy}");
    }

    #[test]
    fn get_dy_same_index_returns_zero() {
        let pool = pool_18_6(1_000_000, 1_000_000, 100, 4_000_000);
        assert_eq!(get_dy_exact(0, 0, U256::from(10u8), &pool).unwrap(), U256::zero());
    }

    #[test]
    fn roundtrip_dx_dy() {
        let pool = pool_18_6(1_000_000u128 * 1_000_000_000_000_000_000u128, 1_000_000u128 * 1_000_000u128, 100, 4_000_000);
        let dx = U256::from(1000u64) * PRECISION;
        let dy = get_dy_exact(0, 1, dx, &pool).unwrap();
        let dx_back = get_dx_exact(0, 1, dy, &pool).unwrap();
        let tolerance = max(U256::one(), dx / U256::from(50u8));
        assert!(abs_diff(dx_back, dx) <= tolerance, "dx_back={dx_back} dx={dx}");
    }

    #[test]
    fn dynamic_fee_disabled_returns_base_fee() {
        let fee = dynamic_fee(U256::from(100u32), U256::from(100u32), U256::from(4_000_000u32), U256::zero());
        assert_eq!(fee, U256::from(4_000_000u32));
    }

    #[test]
    fn normalized_mode_agrees_with_exact_mode_within_10bps() {
        let pool = pool_18_6(1_000_000u128 * 1_000_000_000_000_000_000u128, 1_000_000u128 * 1_000_000u128, 100, 4_000_000);
        let dx = U256::from(1000u64) * PRECISION;
        let dy_exact = get_dy_exact(0, 1, dx, &pool).unwrap();
        let dy_norm = get_dy_normalized(0, 1, dx, &pool).unwrap();
        let tolerance = dy_exact * U256::from(10u8) / U256::from(10_000u32);
        assert!(abs_diff(dy_exact, dy_norm) <= tolerance, "exact={dy_exact} norm={dy_norm}");
    }

    #[test]
    fn normalized_mode_roundtrip_dx_dy() {
        let pool = pool_18_6(1_000_000u128 * 1_000_000_000_000_000_000u128, 1_000_000u128 * 1_000_000u128, 100, 4_000_000);
        let dx = U256::from(1000u64) * PRECISION;
        let dy = get_dy_normalized(0, 1, dx, &pool).unwrap();
        let dx_back = get_dx_normalized(0, 1, dy, &pool).unwrap();
        let tolerance = max(U256::one(), dx / U256::from(50u8));
        assert!(abs_diff(dx_back, dx) <= tolerance, "dx_back={dx_back} dx={dx}");
    }

    #[test]
    fn dynamic_fee_peaks_near_balance() {
        let base = U256::from(4_000_000u32);
        let mult = U256::from(20_000_000_000u64);
        let balanced = dynamic_fee(U256::from(1000u32) * PRECISION, U256::from(1000u32) * PRECISION, base, mult);
        let skewed = dynamic_fee(U256::from(1900u32) * PRECISION, U256::from(100u32) * PRECISION, base, mult);
        assert!(balanced >= skewed, "balanced={balanced} skewed={skewed}");
    }
}
