//! Derived analytics (C4): liquidity math, prices, price impact, and the
//! slippage/quote wrappers built on top of the StableSwap and CryptoSwap
//! kernels.

use crate::crypto::{self, CryptoSwapPool};
use crate::error::{CurveMathError, Result};
use crate::primitives::{max, BPS_DENOMINATOR, DERIVATIVE_EPSILON, PRECISION, U256};
use crate::stable::{self, StableSwapPool};

/// `calcTokenAmount` (spec §4.4): LP tokens minted/burned for a balanced or
/// imbalanced deposit/withdrawal described by `amounts` (signed via the
/// caller adding or subtracting from `balances` before calling in).
pub fn calc_token_amount(pool: &StableSwapPool, amounts: &[U256], total_supply: U256) -> Result<U256> {
    if amounts.len() != pool.n() {
        return Err(CurveMathError::InvalidIndex);
    }
    let ann = pool.ann();
    let xp0 = pool.xp_exact();
    let d0 = stable::get_d(&xp0, ann)?;

    let mut deposited = pool.clone();
    for (b, &a) in deposited.balances.iter_mut().zip(amounts) {
        *b += a;
    }
    let xp1 = deposited.xp_exact();
    let d1 = stable::get_d(&xp1, ann)?;

    if total_supply.is_zero() {
        if !d0.is_zero() {
            return Err(CurveMathError::ZeroBalance);
        }
        return Ok(d1);
    }
    if d0.is_zero() {
        return Err(CurveMathError::ZeroBalance);
    }
    Ok(total_supply * (d1 - d0) / d0)
}

/// `calcWithdrawOneCoin` (spec §4.4). Full withdrawal (`lp == total_supply`)
/// short-circuits to the coin's raw balance.
pub fn calc_withdraw_one_coin(pool: &StableSwapPool, lp: U256, i: usize, total_supply: U256) -> Result<U256> {
    if i >= pool.n() {
        return Err(CurveMathError::InvalidIndex);
    }
    if total_supply.is_zero() {
        return Err(CurveMathError::SupplyZero);
    }
    if lp == total_supply {
        return Ok(pool.balances[i]);
    }

    let ann = pool.ann();
    let xp = pool.xp_exact();
    let d0 = stable::get_d(&xp, ann)?;
    let d1 = d0 - d0 * lp / total_supply;

    let y = stable::get_yd(i, &xp, ann, d1)?;
    if xp[i] <= y {
        return Ok(U256::zero());
    }
    let dy_raw = xp[i] - y;

    let n = U256::from(pool.n() as u64);
    let fee = pool.fee * n / (U256::from(4u8) * (n - U256::one()));
    let dy_after_fee = dy_raw - dy_raw * fee / crate::primitives::FEE_DENOMINATOR;

    Ok(dy_after_fee * PRECISION / pool.rates[i])
}

/// `calcRemoveLiquidity` (spec §4.4) — strictly proportional.
pub fn calc_remove_liquidity(pool: &StableSwapPool, lp: U256, total_supply: U256) -> Result<Vec<U256>> {
    if total_supply.is_zero() {
        return Err(CurveMathError::SupplyZero);
    }
    Ok(pool.balances.iter().map(|&b| b * lp / total_supply).collect())
}

/// `getVirtualPrice` (spec §4.4). Returns `PRECISION` for an empty pool.
pub fn get_virtual_price(pool: &StableSwapPool, total_supply: U256) -> Result<U256> {
    if total_supply.is_zero() {
        return Ok(PRECISION);
    }
    let xp = pool.xp_exact();
    let d = stable::get_d(&xp, pool.ann())?;
    Ok(d * PRECISION / total_supply)
}

/// `lpPrice` for a CryptoSwap pool (spec §4.4) — scaled-balance value in
/// token-0 terms, divided by supply.
pub fn lp_price(pool: &CryptoSwapPool, total_supply: U256) -> Result<U256> {
    if total_supply.is_zero() {
        return Ok(PRECISION);
    }
    let sum: U256 = pool.xp().iter().fold(U256::zero(), |acc, &x| acc + x);
    Ok(sum * PRECISION / total_supply)
}

/// `getSpotPrice` for a StableSwap pool (spec §4.4): the curve's first
/// derivative at the current balances, taken by probing with an epsilon
/// trade rather than a closed-form derivative. The probe is taken directly
/// in `xp` (normalized, decimal-invariant) space rather than by routing a
/// native-unit `dx` through [`stable::get_dy_exact`] — for a pair of coins
/// with different decimals, unscaling a tiny xp-space delta back into the
/// lower-decimal coin's native units truncates to zero before the ratio is
/// ever taken. Working in `xp` space throughout sidesteps that entirely
/// and gives the decimal-invariant rate the spec's "spot price" means.
pub fn get_spot_price_stable(i: usize, j: usize, pool: &StableSwapPool) -> Result<U256> {
    let n = pool.n();
    if i == j || i >= n || j >= n {
        return Ok(U256::zero());
    }

    let xp = pool.xp_exact();
    let ann = pool.ann();
    let d = stable::get_d(&xp, ann)?;

    let dx = max(U256::one(), DERIVATIVE_EPSILON);
    let x = xp[i] + dx;
    let y = stable::get_y(i, j, x, &xp, ann, d)?;
    if xp[j] <= y {
        return Ok(U256::zero());
    }
    let dy = xp[j] - y;
    Ok(get_effective_price(dy, dx))
}

/// `getSpotPrice` for a CryptoSwap pool (`tricrypto` selects the 3-coin
/// kernel), same probe-trade construction as the StableSwap sibling.
pub fn get_spot_price_crypto(i: usize, j: usize, pool: &CryptoSwapPool, tricrypto: bool) -> Result<U256> {
    let dx = max(U256::one(), DERIVATIVE_EPSILON / pool.precisions[i]);
    let dy = if tricrypto {
        crypto::get_dy3(i, j, dx, pool)?
    } else {
        crypto::get_dy(i, j, dx, pool)?
    };
    Ok(get_effective_price(dy, dx))
}

/// `getEffectivePrice` (spec §4.4).
pub fn get_effective_price(dy: U256, dx: U256) -> U256 {
    if dx.is_zero() {
        return U256::zero();
    }
    dy * PRECISION / dx
}

/// `getPriceImpact` (spec §4.4): clamped to 0 when the swap would improve
/// on the spot rate (peg-crossing swaps), per the spec's resolved Open
/// Question #3.
pub fn get_price_impact(spot: U256, effective: U256) -> U256 {
    if spot.is_zero() || effective >= spot {
        return U256::zero();
    }
    (spot - effective) * BPS_DENOMINATOR / spot
}

/// `minAmountOut`/`maxAmountIn` slippage helpers (spec §4.4).
pub fn min_amount_out(amount: U256, bps: U256) -> Result<U256> {
    if bps > BPS_DENOMINATOR {
        return Err(CurveMathError::InvalidSlippage);
    }
    Ok(amount * (BPS_DENOMINATOR - bps) / BPS_DENOMINATOR)
}

pub fn max_amount_in(amount: U256, bps: U256) -> Result<U256> {
    if bps > BPS_DENOMINATOR {
        return Err(CurveMathError::InvalidSlippage);
    }
    Ok(amount * (BPS_DENOMINATOR + bps) / BPS_DENOMINATOR)
}

/// Result of [`quote_swap_stable`]/[`quote_swap_crypto`]. `amount_out` is in
/// the output token's native units; `spot_price` and `effective_price` are
/// both rate-scaled (decimal-invariant) ratios taken in the same space, so
/// they remain comparable for pools whose coins have different decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub amount_out: U256,
    pub spot_price: U256,
    pub effective_price: U256,
    pub price_impact_bps: U256,
}

/// `quoteSwap` for a StableSwap pool.
pub fn quote_swap_stable(i: usize, j: usize, dx: U256, pool: &StableSwapPool) -> Result<SwapQuote> {
    let amount_out = stable::get_dy_exact(i, j, dx, pool)?;

    // `get_spot_price_stable` computes its ratio in `xp` (rate-scaled,
    // decimal-invariant) space, so `effective_price` must be taken in the
    // same space or the two are incomparable for coins with different
    // decimals. Rescale `dx`/`amount_out` through the same `rates` array
    // `xp_exact` uses before taking the ratio.
    let dx_xp = dx * pool.rates[i] / PRECISION;
    let amount_out_xp = amount_out * pool.rates[j] / PRECISION;

    let spot_price = get_spot_price_stable(i, j, pool)?;
    let effective_price = get_effective_price(amount_out_xp, dx_xp);
    let price_impact_bps = get_price_impact(spot_price, effective_price);

    Ok(SwapQuote {
        amount_out,
        spot_price,
        effective_price,
        price_impact_bps,
    })
}

/// `quoteSwap` for a CryptoSwap pool (`tricrypto` selects the 3-coin kernel).
pub fn quote_swap_crypto(i: usize, j: usize, dx: U256, pool: &CryptoSwapPool, tricrypto: bool) -> Result<SwapQuote> {
    let amount_out = if tricrypto {
        crypto::get_dy3(i, j, dx, pool)?
    } else {
        crypto::get_dy(i, j, dx, pool)?
    };

    let spot_price = get_spot_price_crypto(i, j, pool, tricrypto)?;
    let effective_price = get_effective_price(amount_out, dx);
    let price_impact_bps = get_price_impact(spot_price, effective_price);

    Ok(SwapQuote {
        amount_out,
        spot_price,
        effective_price,
        price_impact_bps,
    })
}

fn _assert_send_sync() {
    fn check<T: Send + Sync>() {}
    check::<StableSwapPool>();
    check::<CryptoSwapPool>();
    check::<SwapQuote>();
}
