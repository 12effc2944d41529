//! Loyalty points arithmetic.
//!
//! One point is earned per 10 rupees of the final order total, and points can
//! fund at most half of an order's subtotal. Balances are unsigned, so a debit
//! larger than the balance clamps to zero.

/// Rupees spent per point earned.
pub const RUPEES_PER_POINT: u64 = 10;

/// Points earned on an order with the given final total.
pub fn earned_points(order_total: u64) -> u64 {
    order_total / RUPEES_PER_POINT
}

/// Most points a customer with `balance` may spend on an order of `subtotal`.
pub fn max_redeemable(balance: u64, subtotal: u64) -> u64 {
    balance.min(subtotal / 2)
}

/// Balance after spending `amount`, never below zero.
pub fn debit(balance: u64, amount: u64) -> u64 {
    balance.saturating_sub(amount)
}

pub fn credit(balance: u64, amount: u64) -> u64 {
    balance.saturating_add(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earned_points_is_floor_of_tenth() {
        assert_eq!(earned_points(0), 0);
        assert_eq!(earned_points(9), 0);
        assert_eq!(earned_points(10), 1);
        assert_eq!(earned_points(199), 19);
        assert_eq!(earned_points(200), 20);
    }

    #[test]
    fn max_redeemable_respects_both_caps() {
        for balance in [0, 1, 49, 50, 100, 151, 1_000] {
            for subtotal in [0, 1, 99, 100, 101, 300, 2_000] {
                let max = max_redeemable(balance, subtotal);
                assert!(max <= balance, "balance={balance} subtotal={subtotal}");
                assert!(max <= subtotal / 2, "balance={balance} subtotal={subtotal}");
                assert!(max == balance || max == subtotal / 2);
            }
        }
    }

    #[test]
    fn redemption_scenario() {
        let balance = 100;
        let subtotal = 300;
        let redeemed = max_redeemable(balance, subtotal);
        assert_eq!(redeemed, 100);

        let total = subtotal - redeemed;
        assert_eq!(total, 200);
        assert_eq!(earned_points(total), 20);
        assert_eq!(credit(debit(balance, redeemed), earned_points(total)), 20);
    }

    #[test]
    fn over_debit_clamps_to_zero() {
        assert_eq!(debit(30, 31), 0);
        assert_eq!(debit(0, 5), 0);
        assert_eq!(debit(30, 30), 0);
        assert_eq!(debit(30, 10), 20);
    }
}
