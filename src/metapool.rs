//! Metapool composition (spec §9, "Metapool composition"): swapping a
//! metapool's own token into one specific coin of its underlying base pool
//! is the composition of a single-sided deposit into the base pool
//! followed by a single-coin withdrawal — no new primitive is needed.

use crate::analytics;
use crate::error::Result;
use crate::primitives::U256;
use crate::stable::StableSwapPool;

/// Routes `amount` of the base pool's coin `deposit_index` through the base
/// pool, landing as coin `withdraw_index`.
pub fn swap_through_base(
    base: &StableSwapPool,
    base_total_supply: U256,
    deposit_index: usize,
    withdraw_index: usize,
    amount: U256,
) -> Result<U256> {
    let mut deposit_amounts = vec![U256::zero(); base.n()];
    deposit_amounts[deposit_index] = amount;

    let lp_minted = analytics::calc_token_amount(base, &deposit_amounts, base_total_supply)?;

    let mut after_deposit = base.clone();
    after_deposit.balances[deposit_index] += amount;

    analytics::calc_withdraw_one_coin(
        &after_deposit,
        lp_minted,
        withdraw_index,
        base_total_supply + lp_minted,
    )
}
