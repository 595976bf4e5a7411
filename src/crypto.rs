//! CryptoSwap (v2) kernel (C3): `calcD`, the shared Newton-`y` core behind
//! `newtonY`/`newtonY3`, the K-based dynamic fee, balance scaling, and the
//! swap/inverse-swap wrappers.
//!
//! Oscillation handling (halve the previous guess, floor at 1, keep
//! iterating) is ordinary control flow here, not an error path — only
//! exceeding the iteration cap or hitting a zero divisor is `NO_CONVERGE`.

use crate::error::{CurveMathError, Result};
use crate::primitives::{
    abs_diff, max, narrow, widen, A_MULTIPLIER, CONVERGENCE_THRESHOLD, DERIVATIVE_EPSILON,
    FEE_DENOMINATOR, MIN_CONVERGENCE, PRECISION, U256, U512,
};

/// A CryptoSwap pool snapshot, N = 2 or 3 coins.
#[derive(Debug, Clone)]
pub struct CryptoSwapPool {
    pub balances: Vec<U256>,
    pub precisions: Vec<U256>,
    /// Length `N - 1`: token 0 is always the numéraire.
    pub price_scales: Vec<U256>,
    pub a: U256,
    pub gamma: U256,
    /// The invariant, as a pool-supplied snapshot field (spec §3: unlike
    /// StableSwap's `D`, CryptoSwap's `D` is persistent on-chain state
    /// updated only by liquidity operations and ramps, not recomputed on
    /// every swap). `calc_d` remains available separately for callers
    /// that need to derive it — e.g. after constructing a pool snapshot
    /// from raw balances, or inside a liquidity operation.
    pub d: U256,
    pub mid_fee: U256,
    pub out_fee: U256,
    pub fee_gamma: U256,
}

impl CryptoSwapPool {
    pub fn new(
        balances: Vec<U256>,
        precisions: Vec<U256>,
        price_scales: Vec<U256>,
        a: U256,
        gamma: U256,
        d: U256,
        mid_fee: U256,
        out_fee: U256,
        fee_gamma: U256,
    ) -> Result<Self> {
        let n = balances.len();
        if n < 2 || n > 3 || precisions.len() != n || price_scales.len() != n - 1 {
            return Err(CurveMathError::InvalidIndex);
        }
        Ok(Self {
            balances,
            precisions,
            price_scales,
            a,
            gamma,
            d,
            mid_fee,
            out_fee,
            fee_gamma,
        })
    }

    /// Builds a snapshot the same way, deriving `d` from `balances` via
    /// [`calc_d`] rather than taking it as a given pool-supplied field.
    /// Convenience for callers (and tests) that only have raw balances on
    /// hand and have no persisted `D` to supply.
    pub fn new_deriving_d(
        balances: Vec<U256>,
        precisions: Vec<U256>,
        price_scales: Vec<U256>,
        a: U256,
        gamma: U256,
        mid_fee: U256,
        out_fee: U256,
        fee_gamma: U256,
    ) -> Result<Self> {
        let mut pool = Self::new(
            balances,
            precisions,
            price_scales,
            a,
            gamma,
            U256::zero(),
            mid_fee,
            out_fee,
            fee_gamma,
        )?;
        pool.d = calc_d(pool.a, pool.gamma, &pool.xp())?;
        Ok(pool)
    }

    pub fn n(&self) -> usize {
        self.balances.len()
    }

    /// Normalized balances (spec §4.3.1): token 0 by precision only, every
    /// other token additionally scaled by its `price_scale`.
    pub fn xp(&self) -> Vec<U256> {
        self.xp_from(&self.balances)
    }

    fn xp_from(&self, balances: &[U256]) -> Vec<U256> {
        let mut out = Vec::with_capacity(balances.len());
        out.push(balances[0] * self.precisions[0]);
        for k in 1..balances.len() {
            out.push(balances[k] * self.precisions[k] * self.price_scales[k - 1] / PRECISION);
        }
        out
    }

    fn unscale(&self, j: usize, xp_value: U256) -> U256 {
        if j == 0 {
            xp_value / self.precisions[0]
        } else {
            xp_value * PRECISION / (self.precisions[j] * self.price_scales[j - 1])
        }
    }
}

fn isqrt(n: U512) -> U512 {
    if n.is_zero() {
        return U512::zero();
    }
    let mut x = U512::one() << ((n.bits() + 1) / 2 + 1);
    loop {
        let y = (x + n / x) / U512::from(2u8);
        if y >= x {
            return x;
        }
        x = y;
    }
}

fn icbrt(n: U512) -> U512 {
    if n.is_zero() {
        return U512::zero();
    }
    let mut x = U512::one() << (n.bits() / 3 + 1);
    loop {
        let x2 = x * x;
        if x2.is_zero() {
            return U512::one();
        }
        let y = (U512::from(2u8) * x + n / x2) / U512::from(3u8);
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// `calcD(A, gamma, xp)` (spec §4.3.2): N-coin CryptoSwap invariant solver,
/// N = 2 or 3.
pub fn calc_d(a: U256, gamma: U256, xp: &[U256]) -> Result<U256> {
    let n = xp.len();
    if !(2..=3).contains(&n) {
        return Err(CurveMathError::InvalidIndex);
    }
    if a.is_zero() {
        return Err(CurveMathError::InvalidA);
    }
    if gamma.is_zero() {
        return Err(CurveMathError::InvalidGamma);
    }
    let sum: U256 = xp.iter().fold(U256::zero(), |acc, &x| acc + x);
    if sum.is_zero() {
        return Ok(U256::zero());
    }
    if xp.iter().any(|x| x.is_zero()) {
        return Err(CurveMathError::ZeroBalance);
    }

    let mut sorted = xp.to_vec();
    sorted.sort_by(|x, y| y.cmp(x));

    let n_u256 = U256::from(n as u64);
    let n512 = widen(n_u256);
    let product512 = sorted.iter().fold(U512::from(1u8), |acc, &x| acc * widen(x));
    let gm = match n {
        2 => narrow(isqrt(product512)),
        3 => narrow(icbrt(product512)),
        _ => unreachable!(),
    };
    if gm.is_zero() {
        return Err(CurveMathError::InsufficientLiquidity);
    }

    let mut d = n_u256 * gm;
    let s512 = widen(sum);
    let ann512 = widen(a);
    let gamma512 = widen(gamma);
    let a_mult512 = widen(A_MULTIPLIER);
    let precision512 = widen(PRECISION);

    for _ in 0..crate::primitives::MAX_NEWTON_ITERATIONS {
        let d_prev = d;
        let d512 = widen(d);

        let mut k0 = precision512;
        for &x in &sorted {
            k0 = k0 * widen(x) * n512 / d512;
        }

        let g1k0 = if gamma512 + precision512 > k0 {
            gamma512 + precision512 - k0 + U512::one()
        } else {
            k0 - gamma512 - precision512 + U512::one()
        };

        let mul1 = precision512 * d512 / gamma512 * g1k0 / gamma512 * g1k0 * a_mult512 / ann512;
        let mul2 = (U512::from(2u8) * precision512) * n512 * k0 / g1k0;

        if mul1.is_zero() && mul2.is_zero() {
            return Err(CurveMathError::NoConverge);
        }

        let neg_fprime = (s512 + s512 * mul2 / precision512) + mul1 * n512 / k0 - mul2 * d512 / precision512;
        if neg_fprime.is_zero() {
            return Err(CurveMathError::NoConverge);
        }

        let d_plus = d512 * (neg_fprime + s512) / neg_fprime;
        let mut d_minus = d512 * d512 / neg_fprime;
        if precision512 > k0 {
            d_minus += d512 * (mul1 / neg_fprime) / precision512 * (precision512 - k0) / k0;
        } else {
            d_minus -= d512 * (mul1 / neg_fprime) / precision512 * (k0 - precision512) / k0;
        }

        let d512_next = if d_plus > d_minus {
            d_plus - d_minus
        } else {
            (d_minus - d_plus) / U512::from(2u8)
        };
        d = narrow(d512_next);

        let diff = abs_diff(d, d_prev);
        if diff * CONVERGENCE_THRESHOLD < d {
            return Ok(d);
        }
    }

    Err(CurveMathError::NoConverge)
}

/// Shared Newton-`y` core behind `newtonY` (N=2) and `newtonY3` (N=3):
/// solves for the balance at index `i` given every other balance and the
/// target `D` (spec §4.3.3/§4.3.4).
fn newton_y_core(a: U256, gamma: U256, other: &[U256], d: U256, y_init: U256) -> Result<U256> {
    if a.is_zero() {
        return Err(CurveMathError::InvalidA);
    }
    if gamma.is_zero() {
        return Err(CurveMathError::InvalidGamma);
    }
    if other.iter().any(|x| x.is_zero()) {
        return Err(CurveMathError::ZeroBalance);
    }

    let n = other.len() + 1;
    let n512 = widen(U256::from(n as u64));
    let d512 = widen(d);
    let ann512 = widen(a);
    let gamma512 = widen(gamma);
    let a_mult512 = widen(A_MULTIPLIER);
    let precision512 = widen(PRECISION);

    let other_max = other.iter().fold(U256::zero(), |acc, &x| max(acc, x));
    let convergence_limit = max(
        max(other_max, d) / CONVERGENCE_THRESHOLD,
        MIN_CONVERGENCE,
    );

    let mut y = y_init;
    if y.is_zero() {
        y = U256::one();
    }

    for _ in 0..crate::primitives::MAX_NEWTON_ITERATIONS {
        if y.is_zero() {
            return Err(CurveMathError::NoConverge);
        }
        let y512 = widen(y);

        let mut k0 = precision512;
        for &x in other {
            k0 = k0 * widen(x) * n512 / d512;
        }
        k0 = k0 * y512 * n512 / d512;
        if k0.is_zero() {
            return Err(CurveMathError::NoConverge);
        }

        let s512: U512 = other.iter().fold(y512, |acc, &x| acc + widen(x));

        let g1k0 = if gamma512 + precision512 > k0 {
            gamma512 + precision512 - k0 + U512::one()
        } else {
            k0 - gamma512 - precision512 + U512::one()
        };

        let mul1 = precision512 * d512 / gamma512 * g1k0 / gamma512 * g1k0 * a_mult512 / ann512;
        let mul2 = precision512 + U512::from(2u8) * precision512 * k0 / g1k0;

        if precision512 * y512 + s512 * mul2 + mul1 < d512 * mul2 {
            y = max(y / U256::from(2u8), U256::one());
            continue;
        }

        let yfprime = precision512 * y512 + s512 * mul2 + mul1 - d512 * mul2;
        if yfprime.is_zero() {
            return Err(CurveMathError::NoConverge);
        }
        let fprime = yfprime / y512;
        if fprime.is_zero() {
            return Err(CurveMathError::NoConverge);
        }

        let y_plus = (yfprime + precision512 * d512) / fprime + (mul1 / fprime * precision512) / k0;
        let y_minus = mul1 / fprime + precision512 * s512 / fprime;

        if y_plus < y_minus {
            y = max(y / U256::from(2u8), U256::one());
            continue;
        }

        let y_new = narrow(y_plus - y_minus);
        let diff = abs_diff(y_new, y);
        let limit = max(convergence_limit, y_new / CONVERGENCE_THRESHOLD);
        y = y_new;
        if diff < limit {
            return Ok(y);
        }
    }

    Err(CurveMathError::NoConverge)
}

/// Two-coin solver (spec §4.3.3).
pub fn newton_y(a: U256, gamma: U256, xp: [U256; 2], d: U256, i: usize) -> Result<U256> {
    if i > 1 {
        return Err(CurveMathError::InvalidIndex);
    }
    let x_j = xp[1 - i];
    if x_j.is_zero() {
        return Err(CurveMathError::ZeroBalance);
    }
    let y_init = narrow(widen(d) * widen(d) / (widen(x_j) * widen(U256::from(4u8))));
    newton_y_core(a, gamma, &[x_j], d, y_init)
}

/// Three-coin (tricrypto) solver (spec §4.3.4).
pub fn newton_y3(a: U256, gamma: U256, xp: [U256; 3], d: U256, i: usize) -> Result<U256> {
    if i > 2 {
        return Err(CurveMathError::InvalidIndex);
    }
    if narrow(widen(d) * widen(d) / widen(PRECISION)).is_zero() {
        return Err(CurveMathError::InsufficientLiquidity);
    }

    let other: Vec<U256> = (0..3).filter(|&k| k != i).map(|k| xp[k]).collect();
    if other.iter().any(|x| x.is_zero()) {
        return Err(CurveMathError::ZeroBalance);
    }

    let precision512 = widen(PRECISION);
    let mut prod512 = precision512;
    for &x in &other {
        prod512 = prod512 * widen(x) / precision512;
    }
    if prod512.is_zero() {
        return Err(CurveMathError::InsufficientLiquidity);
    }

    let d512 = widen(d);
    let denom = U512::from(27u8) * precision512 * prod512;
    let y_init = narrow(d512 * d512 * d512 / denom);

    newton_y_core(a, gamma, &other, d, y_init)
}

/// K-based dynamic fee (spec §4.3.5).
pub fn dynamic_fee(xp: &[U256], mid_fee: U256, out_fee: U256, fee_gamma: U256) -> U256 {
    let n = xp.len();
    let s: U256 = xp.iter().fold(U256::zero(), |acc, &x| acc + x);
    if s.is_zero() {
        return out_fee;
    }

    let n_u256 = U256::from(n as u64);
    let n_pow_n = n_u256.pow(n_u256);

    let mut k512 = widen(PRECISION) * widen(n_pow_n);
    let s512 = widen(s);
    for &x in xp {
        k512 = k512 * widen(x) / s512;
    }
    let k = narrow(k512);

    let denom = fee_gamma + PRECISION;
    if denom <= k {
        return out_fee;
    }
    let denom = denom - k;
    let f = fee_gamma * PRECISION / denom;

    (mid_fee * f + out_fee * (PRECISION - f)) / PRECISION
}

/// Two-coin swap (spec §4.3.6).
pub fn get_dy(i: usize, j: usize, dx: U256, pool: &CryptoSwapPool) -> Result<U256> {
    if pool.n() != 2 {
        return Err(CurveMathError::InvalidIndex);
    }
    if i == j || i > 1 || j > 1 || dx.is_zero() {
        return Ok(U256::zero());
    }

    let mut balances = pool.balances.clone();
    balances[i] += dx;
    let xp = pool.xp_from(&balances);
    let d = pool.d;

    let xp_arr = [xp[0], xp[1]];
    let y = newton_y(pool.a, pool.gamma, xp_arr, d, j)?;

    if xp[j] <= y + U256::one() {
        return Ok(U256::zero());
    }
    let dy_raw = xp[j] - y - U256::one();

    let mut xp_after = xp.clone();
    xp_after[j] = y;
    let fee = dynamic_fee(&xp_after, pool.mid_fee, pool.out_fee, pool.fee_gamma);
    let dy_raw = dy_raw - fee * dy_raw / FEE_DENOMINATOR;

    Ok(pool.unscale(j, dy_raw))
}

/// Three-coin swap (spec §4.3.6).
pub fn get_dy3(i: usize, j: usize, dx: U256, pool: &CryptoSwapPool) -> Result<U256> {
    if pool.n() != 3 {
        return Err(CurveMathError::InvalidIndex);
    }
    if i == j || i > 2 || j > 2 || dx.is_zero() {
        return Ok(U256::zero());
    }

    let mut balances = pool.balances.clone();
    balances[i] += dx;
    let xp = pool.xp_from(&balances);
    let d = pool.d;

    let xp_arr = [xp[0], xp[1], xp[2]];
    let y = newton_y3(pool.a, pool.gamma, xp_arr, d, j)?;

    if xp[j] <= y + U256::one() {
        return Ok(U256::zero());
    }
    let dy_raw = xp[j] - y - U256::one();

    let mut xp_after = xp.clone();
    xp_after[j] = y;
    let fee = dynamic_fee(&xp_after, pool.mid_fee, pool.out_fee, pool.fee_gamma);
    let dy_raw = dy_raw - fee * dy_raw / FEE_DENOMINATOR;

    Ok(pool.unscale(j, dy_raw))
}

fn spot_price_raw(i: usize, j: usize, pool: &CryptoSwapPool) -> Result<U256> {
    let dx = max(U256::one(), DERIVATIVE_EPSILON / pool.precisions[i]);
    let dy = if pool.n() == 3 {
        get_dy3(i, j, dx, pool)?
    } else {
        get_dy(i, j, dx, pool)?
    };
    Ok(dy * PRECISION / dx)
}

/// Spot-price-seeded binary search inverse (spec §4.3.7), two-coin pools.
pub fn get_dx(i: usize, j: usize, dy: U256, pool: &CryptoSwapPool) -> Result<U256> {
    get_dx_generic(i, j, dy, pool, false)
}

/// Spot-price-seeded binary search inverse (spec §4.3.7), three-coin pools.
pub fn get_dx3(i: usize, j: usize, dy: U256, pool: &CryptoSwapPool) -> Result<U256> {
    get_dx_generic(i, j, dy, pool, true)
}

fn get_dx_generic(i: usize, j: usize, dy: U256, pool: &CryptoSwapPool, tricrypto: bool) -> Result<U256> {
    let n = pool.n();
    if i == j || i >= n || j >= n || dy.is_zero() {
        return Ok(U256::zero());
    }
    if dy >= pool.balances[j] {
        return Ok(U256::zero());
    }

    let spot = spot_price_raw(i, j, pool).unwrap_or(U256::zero());
    let mut hi = if spot.is_zero() {
        U256::from(10u8) * pool.balances[i]
    } else {
        U256::from(2u8) * dy * PRECISION / spot
    };

    let achievable = |dx: U256| -> Result<U256> {
        if tricrypto {
            get_dy3(i, j, dx, pool)
        } else {
            get_dy(i, j, dx, pool)
        }
    };

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

    let tolerance = max(U256::one(), dy / U256::from(10_000u32));
    let mut lo = U256::zero();
    for _ in 0..crate::primitives::MAX_BISECTION_ITERATIONS {
        if hi <= lo + tolerance {
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
