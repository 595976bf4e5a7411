//! Parameter ramping (spec §4.4, `getAGammaAtTime`).
//!
//! The interpolation formula only; the timer that decides when to call it
//! is an external collaborator's concern.

use crate::error::{CurveMathError, Result};
use crate::primitives::U256;

fn interpolate(v0: U256, v1: U256, t0: u64, t1: u64, t_now: u64) -> U256 {
    let elapsed = U256::from(t_now - t0);
    let span = U256::from(t1 - t0);
    if v1 >= v0 {
        v0 + (v1 - v0) * elapsed / span
    } else {
        v0 - (v0 - v1) * elapsed / span
    }
}

/// StableSwap-only ramp: interpolates `A` alone.
pub fn get_a_at_time(a0: U256, a1: U256, t0: u64, t1: u64, t_now: u64) -> Result<U256> {
    if t1 <= t0 {
        return Err(CurveMathError::InvalidRamp);
    }
    if t_now <= t0 {
        return Ok(a0);
    }
    if t_now >= t1 {
        return Ok(a1);
    }
    Ok(interpolate(a0, a1, t0, t1, t_now))
}

/// CryptoSwap ramp: interpolates `(A, gamma)` together on the same clock.
pub fn get_a_gamma_at_time(
    a0: U256,
    a1: U256,
    gamma0: U256,
    gamma1: U256,
    t0: u64,
    t1: u64,
    t_now: u64,
) -> Result<(U256, U256)> {
    if t1 <= t0 {
        return Err(CurveMathError::InvalidRamp);
    }
    if t_now <= t0 {
        return Ok((a0, gamma0));
    }
    if t_now >= t1 {
        return Ok((a1, gamma1));
    }
    Ok((
        interpolate(a0, a1, t0, t1, t_now),
        interpolate(gamma0, gamma1, t0, t1, t_now),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_halfway() {
        let (a, gamma) = get_a_gamma_at_time(
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
    fn ramp_before_start_returns_initial() {
        let (a, gamma) = get_a_gamma_at_time(
            U256::from(100u32),
            U256::from(200u32),
            U256::from(1000u32),
            U256::from(2000u32),
            1000,
            2000,
            500,
        )
        .unwrap();
        assert_eq!(a, U256::from(100u32));
        assert_eq!(gamma, U256::from(1000u32));
    }

    #[test]
    fn ramp_after_end_returns_final() {
        let (a, gamma) = get_a_gamma_at_time(
            U256::from(100u32),
            U256::from(200u32),
            U256::from(1000u32),
            U256::from(2000u32),
            1000,
            2000,
            9000,
        )
        .unwrap();
        assert_eq!(a, U256::from(200u32));
        assert_eq!(gamma, U256::from(2000u32));
    }

    #[test]
    fn ramp_rejects_non_increasing_window() {
        assert_eq!(
            get_a_at_time(U256::from(100u32), U256::from(200u32), 2000, 1000, 1500),
            Err(CurveMathError::InvalidRamp)
        );
    }

    #[test]
    fn ramp_handles_decreasing_parameter() {
        let a = get_a_at_time(U256::from(200u32), U256::from(100u32), 1000, 2000, 1500).unwrap();
        assert_eq!(a, U256::from(150u32));
    }
}
