/*!
 * Type Definitions for the Escrow Market Smart Contract
 *
 * Offer records, their lifecycle status, error codes, storage keys and event
 * topics. Sell offers and buy offers share the `Offer` layout and live in two
 * separate, append-only collections.
 */

use soroban_sdk::{contracterror, contracttype, symbol_short, Address, Symbol};

// ================================================================================================
// CORE DATA STRUCTURES
// ================================================================================================

/// An escrowed proposal to trade asset for currency (sell offer) or currency
/// for asset (buy offer).
///
/// # Design Decisions
/// - Both amounts are sized from the pool's spot price when the offer is created
///   and never re-evaluated; settlement uses the frozen pair
/// - The creator's side is held by the market from creation until the offer
///   is confirmed or cancelled
/// - No partial fills and no expiry
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offer {
    /// The address that created the offer and owns the escrowed side
    pub creator: Address,

    /// Asset units exchanged when the offer settles
    pub asset_amount: i128,

    /// Currency base units exchanged when the offer settles
    pub currency_amount: i128,

    /// Current lifecycle state
    pub status: OfferStatus,
}

// ================================================================================================
// ENUMERATIONS
// ================================================================================================

/// Lifecycle of an offer.
///
/// # State Transition Rules
/// - Active → Confirmed (complete)
/// - Active → Cancelled (cancel, creator only)
///
/// Confirmed and Cancelled are terminal.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum OfferStatus {
    /// Escrow returned to the creator
    Cancelled = 0,

    /// Escrow held, waiting for a counterparty
    Active = 1,

    /// Settled with a counterparty
    Confirmed = 2,
}

// ================================================================================================
// ERROR DEFINITIONS
// ================================================================================================

/// Every failure the market can report to a caller.
///
/// # Error Code Ranges
/// - 1-9: Offer lookup and lifecycle errors
/// - 10-14: Token and payment errors
/// - 15-19: Configuration and pricing errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ========== Offer Lookup and Lifecycle (1-9) ==========

    /// No offer with this id exists in the collection
    InvalidOfferId = 1,

    /// The offer is already Confirmed or Cancelled
    OfferNotActive = 2,

    /// Only the creator may cancel an offer
    NotOfferOwner = 3,

    /// The creator tried to fill their own buy offer
    SelfTrade = 4,

    /// Offer amount is zero or negative, or sizes to zero at the current price
    InvalidOfferAmount = 5,

    // ========== Token and Payment (10-14) ==========

    /// Caller has not approved the market for enough asset units
    InsufficientAllowance = 10,

    /// Caller holds fewer units than the operation needs
    InsufficientBalance = 11,

    /// Settlement amount differs from the offer's frozen amount
    IncorrectPayment = 12,

    /// A token transfer failed for reasons other than balance or allowance
    TokenTransferFailed = 13,

    // ========== Configuration and Pricing (15-19) ==========

    /// `initialize` was already called
    ContractAlreadyInitialized = 15,

    /// The market is not bound to a pool yet, or the pool itself is unconfigured
    NotInitialized = 16,

    /// The pool has no price (unfunded) or quotes zero, so offers cannot be sized
    PriceUnavailable = 17,

    /// Intermediate product does not fit in an i128
    ArithmeticOverflow = 18,
}

// ================================================================================================
// STORAGE KEYS
// ================================================================================================

// Persistent: binding fixed at `initialize`
pub const POOL_KEY: Symbol = symbol_short!("POOL");
pub const ASSET_KEY: Symbol = symbol_short!("ASSET");
pub const CURRENCY_KEY: Symbol = symbol_short!("CURRENCY");

// Instance: offer collections, indexed by offer id
pub const SELL_OFFERS: Symbol = symbol_short!("SELL_OFRS");
pub const BUY_OFFERS: Symbol = symbol_short!("BUY_OFRS");

// ================================================================================================
// EVENT CONSTANTS
// ================================================================================================

/// Sell offer created.
/// Contains: (offer_id, asset_amount, currency_amount)
pub const SELL_CREATED: Symbol = symbol_short!("sell_crt");

/// Sell offer filled by a buyer.
/// Contains: (offer_id,)
pub const SELL_COMPLETED: Symbol = symbol_short!("sell_comp");

/// Sell offer withdrawn by its creator.
/// Contains: (offer_id,)
pub const SELL_CANCELLED: Symbol = symbol_short!("sell_canc");

/// Buy offer created.
/// Contains: (offer_id, asset_amount, currency_amount)
pub const BUY_CREATED: Symbol = symbol_short!("buy_crt");

/// Buy offer filled by a seller.
/// Contains: (offer_id,)
pub const BUY_COMPLETED: Symbol = symbol_short!("buy_comp");

/// Buy offer withdrawn by its creator.
/// Contains: (offer_id,)
pub const BUY_CANCELLED: Symbol = symbol_short!("buy_canc");
