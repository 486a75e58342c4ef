//! Arbitrary precision arithmetic for gas prices and limits.
//!
//! Multipliers are configured as `Decimal` and applied to `U256` values through their
//! integer mantissa and scale, so no intermediate value ever goes through `f64`.
//! Results are truncated toward zero.

use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::utils::constants::WEI_PER_GWEI;

/// Multiplies `value` by `multiplier`, truncating the result
///
/// Zero or negative multipliers yield zero. Only a result that does not fit in 256 bits
/// saturates at `U256::MAX`.
pub fn multiply_by_decimal(value: U256, multiplier: Decimal) -> U256 {
	if multiplier.is_zero() || multiplier.is_sign_negative() {
		return U256::ZERO;
	}

	let mantissa = U256::from(multiplier.mantissa().unsigned_abs());
	let divisor = U256::from(10u128.pow(multiplier.scale()));

	// value * m / d == (value / d) * m + (value % d) * m / d, exactly
	let quotient = value / divisor;
	let remainder = value % divisor;
	quotient
		.saturating_mul(mantissa)
		.saturating_add(remainder * mantissa / divisor)
}

/// Multiplies a gas amount by `multiplier`, truncating and saturating at `u64::MAX`
pub fn multiply_gas(gas: u64, multiplier: Decimal) -> u64 {
	multiply_by_decimal(U256::from(gas), multiplier).saturating_to::<u64>()
}

/// Converts a gwei amount to wei
pub fn gwei_to_wei(gwei: u64) -> U256 {
	U256::from(gwei) * U256::from(WEI_PER_GWEI)
}

/// Scales a gas limit by `multiplier`, capped at the latest block gas limit
///
/// A zero gas limit or a non-positive multiplier leaves the gas limit unchanged.
pub fn increase_gas_limit_value(
	gas_limit: u64,
	multiplier: Decimal,
	latest_block_gas_limit: u64,
) -> u64 {
	if gas_limit == 0 || multiplier <= Decimal::ZERO {
		return gas_limit;
	}

	multiply_gas(gas_limit, multiplier).min(latest_block_gas_limit)
}
