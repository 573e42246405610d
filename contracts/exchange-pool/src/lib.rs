/*!
 * Exchange Pool Smart Contract
 *
 * A single-sided liquidity pool that pairs one fungible asset against the
 * native currency. Key features:
 * - Admin-funded reserves (initialize once, refill afterwards)
 * - Spot price derived from the reserve ratio, scaled by the asset's decimals
 * - Two-way swaps executed at the pre-trade ratio
 * - Admin withdrawal of asset liquidity
 *
 * Pricing model:
 * Each trade is quoted from the reserves as they stand before it, then the
 * reserves are updated. The price drifts after every trade and there is no
 * minimum-output guard, so a quote is not protected until execution.
 *
 * Reserve invariant:
 * asset_reserve == 0 iff currency_reserve == 0. Both are zero only before
 * the pool is funded; operations that would empty one side are rejected.
 */

#![no_std]

mod math;
mod types;

#[cfg(test)]
extern crate std;


use soroban_sdk::{contract, contractimpl, log, token, Address, Env};

pub use types::Error;
use types::{
    ADMIN_KEY, ADMIN_UPDATED, ASSET_KEY, ASSET_RESERVE, ASSET_WITHDRAWN, BOUGHT_ASSET,
    CURRENCY_KEY, CURRENCY_RESERVE, LIQUIDITY_ADDED, POOL_INITIALIZED, POOL_INITIALIZED_EVT,
    SCALE_KEY, SOLD_ASSET,
};

#[contract]
pub struct ExchangePoolContract;

#[contractimpl]
impl ExchangePoolContract {
    /// Configures the pool. Can only be called once.
    ///
    /// # Arguments
    /// * `admin` - The only identity allowed to fund, refill and withdraw
    /// * `asset` - Token contract of the traded asset
    /// * `currency` - Token contract of the native currency
    ///
    /// The asset's `decimals()` is read here and fixed as the price scale.
    pub fn initialize(env: Env, admin: Address, asset: Address, currency: Address) -> Result<(), Error> {
        if env.storage().persistent().has(&ADMIN_KEY) {
            return Err(Error::ContractAlreadyInitialized);
        }

        let decimals = token::Client::new(&env, &asset).decimals();
        let scale = math::scale_for(decimals)?;

        env.storage().persistent().set(&ADMIN_KEY, &admin);
        env.storage().persistent().set(&ASSET_KEY, &asset);
        env.storage().persistent().set(&CURRENCY_KEY, &currency);
        env.storage().persistent().set(&SCALE_KEY, &scale);

        env.storage().instance().set(&ASSET_RESERVE, &0i128);
        env.storage().instance().set(&CURRENCY_RESERVE, &0i128);
        env.storage().instance().set(&POOL_INITIALIZED, &false);

        Ok(())
    }

    fn _require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
        caller.require_auth();
        let admin: Address = env.storage().persistent().get(&ADMIN_KEY).ok_or(Error::NotInitialized)?;
        if *caller != admin {
            return Err(Error::AccessDenied);
        }
        Ok(())
    }

    fn _reserves(env: &Env) -> (i128, i128) {
        (
            env.storage().instance().get(&ASSET_RESERVE).unwrap_or(0),
            env.storage().instance().get(&CURRENCY_RESERVE).unwrap_or(0),
        )
    }

    fn _set_reserves(env: &Env, asset_reserve: i128, currency_reserve: i128) {
        env.storage().instance().set(&ASSET_RESERVE, &asset_reserve);
        env.storage().instance().set(&CURRENCY_RESERVE, &currency_reserve);
    }

    fn _require_funded(env: &Env) -> Result<(), Error> {
        if !Self::is_initialized(env.clone()) {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    fn _token(env: &Env, key: &soroban_sdk::Symbol) -> Result<token::Client<'static>, Error> {
        let id: Address = env.storage().persistent().get(key).ok_or(Error::NotInitialized)?;
        Ok(token::Client::new(env, &id))
    }

    /// Pulls `amount` asset units from `from` using the allowance granted to
    /// this contract. Balance and allowance are checked up front so the
    /// caller gets a pool error instead of a host trap.
    fn _pull_asset(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
        let asset = Self::_token(env, &ASSET_KEY)?;
        let pool = env.current_contract_address();

        let allowance = asset.allowance(from, &pool);
        if allowance < amount {
            log!(env, "Insufficient allowance. Required: {}, Available: {}", amount, allowance);
            return Err(Error::InsufficientAllowance);
        }
        let balance = asset.balance(from);
        if balance < amount {
            log!(env, "Insufficient balance. Required: {}, Available: {}", amount, balance);
            return Err(Error::InsufficientBalance);
        }

        match asset.try_transfer_from(&pool, from, &pool, &amount) {
            Ok(_) => Ok(()),
            Err(_) => {
                log!(env, "Asset pull failed for amount: {}", amount);
                Err(Error::TokenTransferFailed)
            }
        }
    }

    /// Receives the currency sent along with a call.
    fn _receive_currency(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let currency = Self::_token(env, &CURRENCY_KEY)?;

        let balance = currency.balance(from);
        if balance < amount {
            log!(env, "Insufficient currency. Required: {}, Available: {}", amount, balance);
            return Err(Error::InsufficientBalance);
        }

        match currency.try_transfer(from, &env.current_contract_address(), &amount) {
            Ok(_) => Ok(()),
            Err(_) => {
                log!(env, "Currency transfer failed for amount: {}", amount);
                Err(Error::TokenTransferFailed)
            }
        }
    }

    fn _pay(env: &Env, key: &soroban_sdk::Symbol, to: &Address, amount: i128) -> Result<(), Error> {
        let client = Self::_token(env, key)?;
        match client.try_transfer(&env.current_contract_address(), to, &amount) {
            Ok(_) => Ok(()),
            Err(_) => {
                log!(env, "Payout of {} failed", amount);
                Err(Error::TokenTransferFailed)
            }
        }
    }

    /// Funds the pool for the first time.
    ///
    /// # Business Flow
    /// 1. Admin check and one-shot guard
    /// 2. Records both reserves and marks the pool initialized
    /// 3. Pulls `asset_amount` via allowance and receives `currency_amount`
    ///
    /// # Errors
    /// - AccessDenied: caller is not the admin
    /// - AlreadyInitialized: the pool was funded before
    /// - InvalidAmount: either amount is not positive
    /// - InsufficientAllowance / InsufficientBalance: asset or currency shortfall
    pub fn initialize_pool(env: Env, caller: Address, asset_amount: i128, currency_amount: i128) -> Result<(), Error> {
        Self::_require_admin(&env, &caller)?;

        if Self::is_initialized(env.clone()) {
            return Err(Error::AlreadyInitialized);
        }
        if asset_amount <= 0 || currency_amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        Self::_set_reserves(&env, asset_amount, currency_amount);
        env.storage().instance().set(&POOL_INITIALIZED, &true);

        Self::_pull_asset(&env, &caller, asset_amount)?;
        Self::_receive_currency(&env, &caller, currency_amount)?;

        env.events().publish((POOL_INITIALIZED_EVT, caller), (asset_amount, currency_amount));

        Ok(())
    }

    /// Adds liquidity to an already funded pool. Either side may be zero,
    /// but not both; the new price is simply the new reserve ratio.
    pub fn refill_liquidity(env: Env, caller: Address, asset_amount: i128, currency_amount: i128) -> Result<(), Error> {
        Self::_require_admin(&env, &caller)?;
        Self::_require_funded(&env)?;

        if asset_amount < 0 || currency_amount < 0 || (asset_amount == 0 && currency_amount == 0) {
            return Err(Error::InvalidAmount);
        }

        let (asset_reserve, currency_reserve) = Self::_reserves(&env);
        let new_asset = asset_reserve.checked_add(asset_amount).ok_or(Error::ArithmeticOverflow)?;
        let new_currency = currency_reserve.checked_add(currency_amount).ok_or(Error::ArithmeticOverflow)?;
        Self::_set_reserves(&env, new_asset, new_currency);

        if asset_amount > 0 {
            Self::_pull_asset(&env, &caller, asset_amount)?;
        }
        Self::_receive_currency(&env, &caller, currency_amount)?;

        env.events().publish((LIQUIDITY_ADDED, caller), (asset_amount, currency_amount));

        Ok(())
    }

    /// Buys asset with currency at the pre-trade ratio.
    ///
    /// `asset_out = currency_in * asset_reserve / currency_reserve`
    ///
    /// # Errors
    /// - NotInitialized: pool not funded
    /// - InvalidAmount: non-positive input, or an input too small to buy one unit
    /// - InsufficientLiquidity: the purchase would empty the asset reserve
    /// - InsufficientBalance: trader lacks the currency
    ///
    /// # Returns
    /// The asset units paid to the trader
    pub fn swap_currency_for_asset(env: Env, trader: Address, currency_in: i128) -> Result<i128, Error> {
        trader.require_auth();
        Self::_require_funded(&env)?;

        if currency_in <= 0 {
            return Err(Error::InvalidAmount);
        }

        let (asset_reserve, currency_reserve) = Self::_reserves(&env);
        let asset_out = math::asset_out(currency_in, asset_reserve, currency_reserve)?;
        if asset_out == 0 {
            return Err(Error::InvalidAmount);
        }
        if asset_out >= asset_reserve {
            log!(&env, "Swap would drain the asset reserve. Out: {}, Reserve: {}", asset_out, asset_reserve);
            return Err(Error::InsufficientLiquidity);
        }

        let new_currency = currency_reserve.checked_add(currency_in).ok_or(Error::ArithmeticOverflow)?;
        Self::_set_reserves(&env, asset_reserve - asset_out, new_currency);

        Self::_receive_currency(&env, &trader, currency_in)?;
        Self::_pay(&env, &ASSET_KEY, &trader, asset_out)?;

        env.events().publish((BOUGHT_ASSET, trader), (currency_in, asset_out));

        Ok(asset_out)
    }

    /// Sells asset for currency at the pre-trade ratio.
    ///
    /// `currency_out = asset_in * currency_reserve / asset_reserve`
    ///
    /// The trader must have approved the pool for `asset_in` beforehand.
    pub fn swap_asset_for_currency(env: Env, trader: Address, asset_in: i128) -> Result<i128, Error> {
        trader.require_auth();
        Self::_require_funded(&env)?;

        if asset_in <= 0 {
            return Err(Error::InvalidAmount);
        }

        let (asset_reserve, currency_reserve) = Self::_reserves(&env);
        let currency_out = math::currency_out(asset_in, asset_reserve, currency_reserve)?;
        if currency_out == 0 {
            return Err(Error::InvalidAmount);
        }
        if currency_out >= currency_reserve {
            log!(&env, "Swap would drain the currency reserve. Out: {}, Reserve: {}", currency_out, currency_reserve);
            return Err(Error::InsufficientLiquidity);
        }

        let new_asset = asset_reserve.checked_add(asset_in).ok_or(Error::ArithmeticOverflow)?;
        Self::_set_reserves(&env, new_asset, currency_reserve - currency_out);

        Self::_pull_asset(&env, &trader, asset_in)?;
        Self::_pay(&env, &CURRENCY_KEY, &trader, currency_out)?;

        env.events().publish((SOLD_ASSET, trader), (asset_in, currency_out));

        Ok(currency_out)
    }

    /// Withdraws asset liquidity to the admin. The reserve may not be
    /// emptied, otherwise the pool would hold currency with no price.
    pub fn withdraw_asset(env: Env, caller: Address, amount: i128) -> Result<(), Error> {
        Self::_require_admin(&env, &caller)?;
        Self::_require_funded(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let (asset_reserve, currency_reserve) = Self::_reserves(&env);
        if amount >= asset_reserve {
            log!(&env, "Withdrawal exceeds reserve. Requested: {}, Reserve: {}", amount, asset_reserve);
            return Err(Error::InsufficientLiquidity);
        }
        Self::_set_reserves(&env, asset_reserve - amount, currency_reserve);

        Self::_pay(&env, &ASSET_KEY, &caller, amount)?;

        env.events().publish((ASSET_WITHDRAWN, caller), (amount,));

        Ok(())
    }

    /// Transfers admin rights. Both the current and the new admin must sign.
    pub fn update_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), Error> {
        Self::_require_admin(&env, &caller)?;
        new_admin.require_auth();

        env.storage().persistent().set(&ADMIN_KEY, &new_admin);
        env.events().publish((ADMIN_UPDATED, env.current_contract_address()), new_admin);

        Ok(())
    }

    // ================================================================================================
    // QUERY FUNCTIONS (GETTERS)
    // ================================================================================================

    /// Returns `(asset_reserve, currency_reserve)`.
    pub fn get_pool_balance(env: Env) -> (i128, i128) {
        Self::_reserves(&env)
    }

    /// Returns `currency_reserve * scale / asset_reserve`: the currency base
    /// units one whole asset unit is worth.
    ///
    /// # Errors
    /// - DivisionByZero: the asset reserve is empty
    pub fn get_token_price(env: Env) -> Result<i128, Error> {
        let (asset_reserve, currency_reserve) = Self::_reserves(&env);
        math::spot_price(asset_reserve, currency_reserve, Self::get_scale(env)?)
    }

    pub fn get_scale(env: Env) -> Result<i128, Error> {
        env.storage().persistent().get(&SCALE_KEY).ok_or(Error::NotInitialized)
    }

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        env.storage().persistent().get(&ADMIN_KEY).ok_or(Error::NotInitialized)
    }

    pub fn get_asset(env: Env) -> Result<Address, Error> {
        env.storage().persistent().get(&ASSET_KEY).ok_or(Error::NotInitialized)
    }

    pub fn get_currency(env: Env) -> Result<Address, Error> {
        env.storage().persistent().get(&CURRENCY_KEY).ok_or(Error::NotInitialized)
    }

    /// Whether `initialize_pool` has run.
    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().get(&POOL_INITIALIZED).unwrap_or(false)
    }
}
