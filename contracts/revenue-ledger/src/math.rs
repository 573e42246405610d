//! Pro-rata entitlement arithmetic, free of storage and token effects.

use crate::types::Error;

/// Everything a `percent` share has earned out of `total_inflow`, rounded down.
pub fn entitlement(total_inflow: i128, percent: u32) -> Result<i128, Error> {
    total_inflow
        .checked_mul(percent as i128)
        .map(|product| product / 100)
        .ok_or(Error::ArithmeticOverflow)
}

/// What is still owed once `claimed` has been paid. Never negative.
pub fn outstanding(entitlement: i128, claimed: i128) -> i128 {
    (entitlement - claimed).max(0)
}
