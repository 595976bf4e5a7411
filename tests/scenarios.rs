//! Literal concrete scenarios (seeded pool states with known expected
//! ranges/values).

use curve_amm_math::crypto::CryptoSwapPool;
use curve_amm_math::primitives::{PRECISION, U256};
use curve_amm_math::stable::StableSwapPool;
use curve_amm_math::{analytics, crypto, ramp, stable};

fn dai_usdc_pool() -> StableSwapPool {
    StableSwapPool::from_decimals(
        vec![
            U256::from(1_000_000u64) * PRECISION,
            U256::from(1_000_000u64) * U256::from(1_000_000u64),
        ],
        &[18, 6],
        U256::from(100u32),
        U256::from(4_000_000u32),
        U256::zero(),
        U256::zero(),
    )
    .unwrap()
}

#[test]
fn stableswap_balanced_dai_usdc() {
    let pool = dai_usdc_pool();
    let dx = U256::from(1000u64) * PRECISION;
    let dy = stable::get_dy_exact(0, 1, dx, &pool).unwrap();

    let lo = U256::from(990u64) * U256::from(1_000_000u64);
    let hi = U256::from(1000u64) * U256::from(1_000_000u64);
    assert!(dy > lo && dy < hi, "dy={dy} expected in ({lo}, {hi})");
}

#[test]
fn stableswap_exact_mode_is_stable_across_repeat_calls() {
    let pool = dai_usdc_pool();
    let dx = U256::from(1000u64) * PRECISION;
    let dy_a = stable::get_dy_exact(0, 1, dx, &pool).unwrap();
    let dy_b = stable::get_dy_exact(0, 1, dx, &pool).unwrap();
    assert_eq!(dy_a, dy_b);
}

#[test]
fn twocrypto_balanced() {
    let pool = CryptoSwapPool::new(
        vec![U256::from(1_000_000u64) * PRECISION, U256::from(1_000_000u64) * PRECISION],
        vec![U256::one(), U256::one()],
        vec![PRECISION],
        U256::from(400_000u32),
        U256::from(145_000_000_000_000u64),
        U256::from(2_000_000u64) * PRECISION,
        U256::from(3_000_000u32),
        U256::from(30_000_000u32),
        U256::from(230_000_000_000_000u64),
    )
    .unwrap();

    let dx = U256::from(100u64) * PRECISION;
    let dy = crypto::get_dy(0, 1, dx, &pool).unwrap();
    assert!(dy > U256::zero());
    assert!(dy < dx);
}

#[test]
fn tricrypto_usdc_wbtc_weth() {
    let pool = CryptoSwapPool::new_deriving_d(
        vec![
            U256::from(1_000_000u64) * U256::from(1_000_000u64),
            U256::from(1_000_000u64) * U256::from(100_000_000u64),
            U256::from(1_000_000u64) * PRECISION,
        ],
        vec![U256::from(1_000_000_000_000u64), U256::from(10_000_000_000u64), U256::one()],
        vec![U256::from(30_000u64) * PRECISION, U256::from(2_000u64) * PRECISION],
        U256::from(1_707_629u64),
        U256::from(11_809_167_828_997u64),
        U256::from(3_000_000u32),
        U256::from(30_000_000u32),
        U256::from(230_000_000_000_000u64),
    )
    .unwrap();

    let dx = U256::from(1000u64) * U256::from(1_000_000u64);
    let dy = crypto::get_dy3(0, 1, dx, &pool).unwrap();
    assert!(dy > U256::zero());
}

#[test]
fn ramp_halfway_point() {
    let (a, gamma) = ramp::get_a_gamma_at_time(
        U256::from(100u32),
        U256::from(200u32),
        U256::from(1000u32),
        U256::from(2000u32),
        1000,
        2000,
        1500,
    )
    .unwrap();
    assert_eq!(a, U256::from(150u32));
    assert_eq!(gamma, U256::from(1500u32));
}

#[test]
fn normalized_mode_swap_agrees_with_exact_mode() {
    let pool = dai_usdc_pool();
    let dx = U256::from(1000u64) * PRECISION;
    let dy_exact = stable::get_dy_exact(0, 1, dx, &pool).unwrap();
    let dy_norm = stable::get_dy_normalized(0, 1, dx, &pool).unwrap();
    let tolerance = dy_exact * U256::from(10u8) / U256::from(10_000u32);
    let diff = if dy_exact >= dy_norm { dy_exact - dy_norm } else { dy_norm - dy_exact };
    assert!(diff <= tolerance, "exact={dy_exact} norm={dy_norm}");
}

#[test]
fn quote_swap_reports_price_impact_and_spot_price() {
    let pool = dai_usdc_pool();
    let dx = U256::from(1000u64) * PRECISION;
    let quote = analytics::quote_swap_stable(0, 1, dx, &pool).unwrap();
    assert!(quote.amount_out > U256::zero());
    assert!(quote.spot_price > U256::zero());
}

#[test]
fn slippage_helpers_literal() {
    let amount = U256::from(1000u64) * PRECISION;
    let min_dy = analytics::min_amount_out(amount, U256::from(100u32)).unwrap();
    let max_dx = analytics::max_amount_in(amount, U256::from(100u32)).unwrap();
    assert_eq!(min_dy, U256::from(990u64) * PRECISION);
    assert_eq!(max_dx, U256::from(1010u64) * PRECISION);
}
