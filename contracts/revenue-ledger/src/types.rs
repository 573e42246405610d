/*!
 * Type Definitions for the Revenue Ledger Smart Contract
 *
 * Error codes, storage keys and event topics. The ledger's state is three
 * values: a cumulative inflow counter, the share table and the per-identity
 * claimed totals.
 */

use soroban_sdk::{contracterror, symbol_short, Symbol};

// ================================================================================================
// ERROR DEFINITIONS
// ================================================================================================

/// Every failure the ledger can report to a caller.
///
/// # Error Code Ranges
/// - 1-4: Access control and lifecycle errors
/// - 5-9: Share table configuration errors
/// - 10-14: Token and amount errors
/// - 15: Arithmetic errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ========== Access Control and Lifecycle (1-4) ==========

    /// Caller is not the admin, or the disbursement recipient is not allow-listed
    AccessDenied = 1,

    /// `initialize` was already called
    ContractAlreadyInitialized = 2,

    /// The ledger has not been configured yet
    NotInitialized = 3,

    // ========== Share Table (5-9) ==========

    /// Identity and percentage lists have different lengths
    LengthMismatch = 5,

    /// Percentages do not add up to exactly 100
    InvalidTotalPercentage = 6,

    /// A single percentage exceeds 100
    InvalidPercentage = 7,

    /// An identity appears more than once in the table
    DuplicateParticipant = 8,

    // ========== Token and Amount (10-14) ==========

    /// Caller has no outstanding entitlement
    NothingToClaim = 10,

    /// Depositor has not approved the ledger for the amount
    InsufficientAllowance = 11,

    /// The payer (or the ledger itself) holds fewer units than needed
    InsufficientBalance = 12,

    /// Amount is zero or negative
    InvalidAmount = 13,

    /// A token transfer failed for reasons other than balance or allowance
    TokenTransferFailed = 14,

    // ========== Arithmetic (15) ==========

    /// Inflow counter or entitlement product does not fit in an i128
    ArithmeticOverflow = 15,
}

// ================================================================================================
// STORAGE KEYS
// ================================================================================================

// Persistent: configuration
pub const ADMIN_KEY: Symbol = symbol_short!("ADMIN");
pub const ASSET_KEY: Symbol = symbol_short!("ASSET");
pub const ALLOW_LIST_KEY: Symbol = symbol_short!("ALLOWLIST");

// Instance: accounting
pub const TOTAL_INFLOW: Symbol = symbol_short!("INFLOW");
pub const SHARES: Symbol = symbol_short!("SHARES");
pub const CLAIMED: Symbol = symbol_short!("CLAIMED");

// ================================================================================================
// EVENT CONSTANTS
// ================================================================================================

/// Share table replaced.
/// Contains: (participant_count,)
pub const SHARES_SET: Symbol = symbol_short!("shares");

/// Tokens deposited into the pot.
/// Contains: (amount, total_inflow)
pub const DEPOSITED: Symbol = symbol_short!("deposit");

/// Outstanding entitlement paid to a participant.
/// Contains: (paid, claimed_total)
pub const CLAIMED_EVT: Symbol = symbol_short!("claim");

/// Admin disbursement to an allow-listed recipient.
/// Contains: (amount, project_id)
pub const DISBURSED: Symbol = symbol_short!("disburse");

pub const ADMIN_UPDATED: Symbol = symbol_short!("adm_upd");
