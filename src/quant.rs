// Share/asset conversion helpers
// Sizes partial withdrawals from a holder's own share balance and its value
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use primitive_types::U256;

fn narrow(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.low_u128())
    }
}

/// Shares out of a `balance` worth `value` needed to redeem at least
/// `amount` of asset. Rounds up, so with `value` itself rounded down the
/// redemption never falls short.
pub fn shares_for_amount(amount: u128, balance: u128, value: u128) -> Result<u128, RouterError> {
    if value == 0 {
        return Err(RouterError::Arithmetic);
    }
    let scaled = U256::from(amount) * U256::from(balance);
    let value = U256::from(value);
    let mut shares = scaled / value;
    if !(scaled % value).is_zero() {
        shares += U256::one();
    }
    narrow(shares).ok_or(RouterError::Arithmetic)
}

/// `value * numerator / denominator`, rounded down. The product is taken at
/// 256 bits; `None` when the denominator is zero or the quotient overflows.
pub fn mul_div(value: u128, numerator: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    narrow(U256::from(value) * U256::from(numerator) / U256::from(denominator))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn shares_round_up() {
        // 1:1 is exact
        assert_eq!(shares_for_amount(5_000, 10_000, 10_000).unwrap(), 5_000);
        // 100 shares worth 150 => 1000 asset needs 666.66.. of 1000 shares, rounded to 667
        assert_eq!(shares_for_amount(1_000, 1_000, 1_500).unwrap(), 667);
        // 100 shares worth 190 => 10 asset needs 5.26.. shares, rounded to 6
        assert_eq!(shares_for_amount(10, 100, 190).unwrap(), 6);
    }

    #[test]
    fn zero_value_is_rejected() {
        assert!(matches!(
            shares_for_amount(1, 1, 0),
            Err(RouterError::Arithmetic)
        ));
    }

    #[test]
    fn mul_div_floors_and_guards() {
        assert_eq!(mul_div(10, 2, 3), Some(6));
        assert_eq!(mul_div(10, 2, 0), None);
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
        assert_eq!(mul_div(u128::MAX, 2, 2), Some(u128::MAX));
    }

    #[test]
    fn wide_intermediate_products() {
        // 200 shares of a vault holding 300 asset over 200 supply, at 18 decimals
        assert_eq!(mul_div(200 * UNIT, 300 * UNIT, 200 * UNIT), Some(300 * UNIT));
        assert_eq!(shares_for_amount(30 * UNIT, 100 * UNIT, 150 * UNIT).unwrap(), 20 * UNIT);
    }
}
