use crate::properties::strategies::multiplier_strategy;

use alloy::primitives::U256;
use oracle_staker::utils::math::{increase_gas_limit_value, multiply_by_decimal, multiply_gas};
use proptest::{prelude::*, test_runner::Config};
use rust_decimal::Decimal;

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_increased_gas_limit_never_exceeds_block_limit(
		gas_limit in 1u64..100_000_000,
		multiplier in multiplier_strategy(),
		block_gas_limit in 1u64..100_000_000,
	) {
		let increased = increase_gas_limit_value(gas_limit, multiplier, block_gas_limit);
		prop_assert!(increased <= block_gas_limit);
	}

	#[test]
	fn test_increased_gas_limit_grows_with_multiplier_above_one(
		gas_limit in 1u64..100_000_000,
		multiplier in multiplier_strategy(),
		block_gas_limit in 1u64..100_000_000,
	) {
		prop_assume!(multiplier >= Decimal::ONE);
		let increased = increase_gas_limit_value(gas_limit, multiplier, block_gas_limit);
		prop_assert!(increased >= gas_limit.min(block_gas_limit));
	}

	#[test]
	fn test_zero_gas_limit_is_unchanged(
		multiplier in multiplier_strategy(),
		block_gas_limit in 1u64..100_000_000,
	) {
		prop_assert_eq!(increase_gas_limit_value(0, multiplier, block_gas_limit), 0);
	}

	#[test]
	fn test_unit_multiplier_is_identity(gas in any::<u64>()) {
		prop_assert_eq!(multiply_gas(gas, Decimal::ONE), gas);
	}

	#[test]
	fn test_multiplication_truncates(value in any::<u128>(), multiplier in multiplier_strategy()) {
		let value = U256::from(value);
		let product = multiply_by_decimal(value, multiplier);

		let mantissa = U256::from(multiplier.mantissa() as u64);
		let divisor = U256::from(10u64.pow(multiplier.scale()));
		prop_assert_eq!(product, value * mantissa / divisor);
	}

	#[test]
	fn test_multiplication_is_monotonic(
		a in any::<u64>(),
		b in any::<u64>(),
		multiplier in multiplier_strategy(),
	) {
		let (low, high) = if a <= b { (a, b) } else { (b, a) };
		prop_assert!(multiply_gas(low, multiplier) <= multiply_gas(high, multiplier));
	}
}

#[test]
fn test_increase_gas_limit_value_examples() {
	assert_eq!(increase_gas_limit_value(1, Decimal::from(2), 3), 2);
	assert_eq!(increase_gas_limit_value(1, Decimal::from(3), 1), 1);
}
