/*!
 * Type Definitions for the Exchange Pool Contract
 *
 * Error codes, storage keys and event topics shared by the pool entry points
 * and its pricing math.
 */

use soroban_sdk::{contracterror, symbol_short, Symbol};

// ================================================================================================
// ERROR DEFINITIONS
// ================================================================================================

/// Every failure the pool can report to a caller.
///
/// # Error Code Ranges
/// - 1-4: Access control and lifecycle errors
/// - 5-9: Liquidity and pricing errors
/// - 10-14: Token and arithmetic errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ========== Access Control and Lifecycle (1-4) ==========

    /// Caller is not the pool admin
    AccessDenied = 1,

    /// `initialize_pool` was already called; use `refill_liquidity`
    AlreadyInitialized = 2,

    /// The pool has not been funded yet
    NotInitialized = 3,

    /// `initialize` (configuration) was already called
    ContractAlreadyInitialized = 4,

    // ========== Liquidity and Pricing (5-9) ==========

    /// Price requested while the asset reserve is empty
    DivisionByZero = 5,

    /// The operation would empty one side of the pool
    InsufficientLiquidity = 6,

    /// Amount is negative, zero where a positive value is required, or rounds to nothing
    InvalidAmount = 7,

    // ========== Token and Arithmetic (10-14) ==========

    /// Caller has not approved the pool for enough asset units
    InsufficientAllowance = 10,

    /// Caller holds fewer units than the operation needs
    InsufficientBalance = 11,

    /// A token transfer failed for reasons other than balance or allowance
    TokenTransferFailed = 12,

    /// Intermediate product does not fit in an i128
    ArithmeticOverflow = 13,
}

// ================================================================================================
// STORAGE KEYS
// ================================================================================================

// Persistent: configuration fixed at `initialize`
pub const ADMIN_KEY: Symbol = symbol_short!("ADMIN");
pub const ASSET_KEY: Symbol = symbol_short!("ASSET");
pub const CURRENCY_KEY: Symbol = symbol_short!("CURRENCY");
pub const SCALE_KEY: Symbol = symbol_short!("SCALE");

// Instance: pool runtime state
pub const ASSET_RESERVE: Symbol = symbol_short!("ASSET_RES");
pub const CURRENCY_RESERVE: Symbol = symbol_short!("CURR_RES");
pub const POOL_INITIALIZED: Symbol = symbol_short!("POOL_INIT");

// ================================================================================================
// EVENT CONSTANTS
// ================================================================================================

/// Pool funded for the first time.
/// Contains: (asset_amount, currency_amount)
pub const POOL_INITIALIZED_EVT: Symbol = symbol_short!("pool_init");

/// Admin added liquidity.
/// Contains: (asset_amount, currency_amount)
pub const LIQUIDITY_ADDED: Symbol = symbol_short!("liq_add");

/// Trader bought asset with currency.
/// Contains: (currency_in, asset_out)
pub const BOUGHT_ASSET: Symbol = symbol_short!("buy_asst");

/// Trader sold asset for currency.
/// Contains: (asset_in, currency_out)
pub const SOLD_ASSET: Symbol = symbol_short!("sell_asst");

/// Admin withdrew asset from the reserve.
/// Contains: (amount,)
pub const ASSET_WITHDRAWN: Symbol = symbol_short!("asst_wdr");

/// Admin handed over control.
pub const ADMIN_UPDATED: Symbol = symbol_short!("adm_upd");
