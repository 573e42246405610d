//! Reserve-ratio pricing.
//!
//! Every quote uses the reserves as they stand before the trade. There is no
//! curve: the price moves only because the trade itself changes the ratio.

use crate::types::Error;

/// `10^decimals` for the asset's precision.
pub fn scale_for(decimals: u32) -> Result<i128, Error> {
    10i128.checked_pow(decimals).ok_or(Error::ArithmeticOverflow)
}

/// Spot price of one whole asset unit, expressed in currency base units.
pub fn spot_price(asset_reserve: i128, currency_reserve: i128, scale: i128) -> Result<i128, Error> {
    if asset_reserve == 0 {
        return Err(Error::DivisionByZero);
    }
    currency_reserve
        .checked_mul(scale)
        .map(|scaled| scaled / asset_reserve)
        .ok_or(Error::ArithmeticOverflow)
}

/// Asset units paid out for `currency_in`, at the pre-trade ratio.
pub fn asset_out(currency_in: i128, asset_reserve: i128, currency_reserve: i128) -> Result<i128, Error> {
    if currency_reserve == 0 {
        return Err(Error::DivisionByZero);
    }
    currency_in
        .checked_mul(asset_reserve)
        .map(|product| product / currency_reserve)
        .ok_or(Error::ArithmeticOverflow)
}

/// Currency units paid out for `asset_in`, at the pre-trade ratio.
pub fn currency_out(asset_in: i128, asset_reserve: i128, currency_reserve: i128) -> Result<i128, Error> {
    if asset_reserve == 0 {
        return Err(Error::DivisionByZero);
    }
    asset_in
        .checked_mul(currency_reserve)
        .map(|product| product / asset_reserve)
        .ok_or(Error::ArithmeticOverflow)
}
