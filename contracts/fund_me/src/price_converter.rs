//! Native-to-reference currency conversion at a feed rate.

use primitive_types::U256;

/// Value of `amount` native units in reference currency, given a feed `rate`
/// that carries `scale` decimals.
///
/// The product is formed in 256 bits and divided once, so nothing is
/// truncated before the final scaling step. Returns `None` when the result
/// does not fit a `u128` or `10^scale` does not fit a `U256`.
pub fn conversion_rate(amount: u128, rate: u128, scale: u8) -> Option<u128> {
    let divisor = U256::from(10u8).checked_pow(U256::from(scale))?;
    let value = U256::from(amount).checked_mul(U256::from(rate))? / divisor;

    if value > U256::from(u128::MAX) {
        return None;
    }
    Some(value.low_u128())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn one_unit_at_eighteen_decimals() {
        // 2000 reference units per native unit, feed reports 18 decimals
        let value = conversion_rate(ONE, 2_000 * ONE, 18).unwrap();
        assert_eq!(value, 2_000 * ONE);
    }

    #[test]
    fn one_unit_at_eight_decimals() {
        // Same price from a feed with 8 decimals: result keeps the native 18
        let value = conversion_rate(ONE, 2_000 * 100_000_000, 8).unwrap();
        assert_eq!(value, 2_000 * ONE);
    }

    #[test]
    fn product_wider_than_u128_still_converts() {
        // ONE * 2000 * ONE overflows u128, the scaled result does not
        assert!(ONE.checked_mul(2_000 * ONE).is_none());
        assert_eq!(conversion_rate(ONE, 2_000 * ONE, 18), Some(2_000 * ONE));
    }

    #[test]
    fn fractional_result_truncates_toward_zero() {
        assert_eq!(conversion_rate(1, 1, 1), Some(0));
        assert_eq!(conversion_rate(15, 1, 1), Some(1));
    }

    #[test]
    fn zero_scale_is_plain_multiplication() {
        assert_eq!(conversion_rate(7, 6, 0), Some(42));
    }

    #[test]
    fn result_beyond_u128_is_rejected() {
        assert_eq!(conversion_rate(u128::MAX, u128::MAX, 0), None);
    }

    #[test]
    fn unrepresentable_scale_is_rejected() {
        assert_eq!(conversion_rate(ONE, ONE, 200), None);
    }
}
