//! The slice of the exchange pool's interface the market reads.
//!
//! The market only ever queries the pool; it never moves pool reserves.

use soroban_sdk::{contractclient, Address, Env};

#[allow(dead_code)]
#[contractclient(name = "ExchangePoolClient")]
pub trait ExchangePoolInterface {
    /// Currency base units per whole asset unit. Fails with the pool's own error on an empty pool.
    fn get_token_price(env: Env) -> i128;

    /// `10^decimals` of the asset.
    fn get_scale(env: Env) -> i128;

    fn get_asset(env: Env) -> Address;

    fn get_currency(env: Env) -> Address;
}
