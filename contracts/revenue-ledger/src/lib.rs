/*!
 * Revenue Ledger Smart Contract
 *
 * Pools incoming revenue in one token and lets each participant pull their
 * percentage of everything ever deposited. Key features:
 * - Admin-managed share table that must add up to 100%
 * - Deposits from any caller, tracked as a cumulative inflow counter
 * - Claims pay the difference between entitlement and what was already paid
 * - Admin disbursements to recipients on a per-project allow-list
 *
 * Accounting model:
 * entitlement(id) = total_inflow * share(id) / 100, and claimed(id) only
 * grows to meet it. Deposits made before a claim are all counted, so one
 * claim after three deposits pays the same as three interleaved claims.
 *
 * Disbursements bypass this accounting: they reduce the held balance but
 * leave total_inflow and claimed untouched, so a large disbursement can
 * leave later claims without funds.
 */

#![no_std]

mod allow_list;
mod math;
mod types;

#[cfg(test)]
extern crate std;


use soroban_sdk::{contract, contractimpl, log, token, Address, Env, Map, Vec};

use allow_list::AllowListClient;
pub use types::Error;
use types::{
    ADMIN_KEY, ADMIN_UPDATED, ALLOW_LIST_KEY, ASSET_KEY, CLAIMED, CLAIMED_EVT, DEPOSITED, DISBURSED,
    SHARES, SHARES_SET, TOTAL_INFLOW,
};

#[contract]
pub struct RevenueLedgerContract;

#[contractimpl]
impl RevenueLedgerContract {
    /// Configures the ledger. Can only be called once.
    ///
    /// # Arguments
    /// * `admin` - Manages the share table and directs disbursements
    /// * `asset` - Token contract of the revenue being distributed
    /// * `allow_list` - Registry consulted before every disbursement
    pub fn initialize(env: Env, admin: Address, asset: Address, allow_list: Address) -> Result<(), Error> {
        if env.storage().persistent().has(&ADMIN_KEY) {
            return Err(Error::ContractAlreadyInitialized);
        }

        env.storage().persistent().set(&ADMIN_KEY, &admin);
        env.storage().persistent().set(&ASSET_KEY, &asset);
        env.storage().persistent().set(&ALLOW_LIST_KEY, &allow_list);

        env.storage().instance().set(&TOTAL_INFLOW, &0i128);
        env.storage().instance().set(&SHARES, &Map::<Address, u32>::new(&env));
        env.storage().instance().set(&CLAIMED, &Map::<Address, i128>::new(&env));

        Ok(())
    }

    // ================================================================================================
    // INTERNAL HELPERS
    // ================================================================================================

    fn _require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
        caller.require_auth();
        let admin: Address = env.storage().persistent().get(&ADMIN_KEY).ok_or(Error::NotInitialized)?;
        if *caller != admin {
            log!(env, "Admin operation rejected for: {}", caller.clone());
            return Err(Error::AccessDenied);
        }
        Ok(())
    }

    fn _asset(env: &Env) -> Result<token::Client<'static>, Error> {
        let id: Address = env.storage().persistent().get(&ASSET_KEY).ok_or(Error::NotInitialized)?;
        Ok(token::Client::new(env, &id))
    }

    fn _shares(env: &Env) -> Result<Map<Address, u32>, Error> {
        env.storage().instance().get(&SHARES).ok_or(Error::NotInitialized)
    }

    fn _claimed(env: &Env) -> Result<Map<Address, i128>, Error> {
        env.storage().instance().get(&CLAIMED).ok_or(Error::NotInitialized)
    }

    fn _total_inflow(env: &Env) -> Result<i128, Error> {
        env.storage().instance().get(&TOTAL_INFLOW).ok_or(Error::NotInitialized)
    }

    /// `(entitlement, claimed)` for one identity. Unknown identities hold a 0% share.
    fn _position(env: &Env, identity: &Address) -> Result<(i128, i128), Error> {
        let percent = Self::_shares(env)?.get(identity.clone()).unwrap_or(0);
        let claimed = Self::_claimed(env)?.get(identity.clone()).unwrap_or(0);
        let entitlement = math::entitlement(Self::_total_inflow(env)?, percent)?;
        Ok((entitlement, claimed))
    }

    /// Pays `amount` out of the ledger's own holdings.
    fn _pay_out(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
        let asset = Self::_asset(env)?;
        let ledger = env.current_contract_address();

        let held = asset.balance(&ledger);
        if held < amount {
            log!(env, "Ledger balance too low. Required: {}, Held: {}", amount, held);
            return Err(Error::InsufficientBalance);
        }

        match asset.try_transfer(&ledger, to, &amount) {
            Ok(_) => Ok(()),
            Err(_) => {
                log!(env, "Payout of {} failed", amount);
                Err(Error::TokenTransferFailed)
            }
        }
    }

    // ================================================================================================
    // SHARE TABLE
    // ================================================================================================

    /// Replaces the whole share table.
    ///
    /// # Arguments
    /// * `identities` - Participants, each listed once
    /// * `percentages` - Matching whole percentages, summing to exactly 100
    ///
    /// Identities missing from the new table drop to a 0% share. Amounts they
    /// already claimed stay recorded.
    ///
    /// # Errors
    /// - AccessDenied: caller is not the admin
    /// - LengthMismatch: the two lists differ in length
    /// - InvalidPercentage: an entry is above 100
    /// - DuplicateParticipant: an identity is listed twice
    /// - InvalidTotalPercentage: entries do not sum to 100
    pub fn set_shares(env: Env, caller: Address, identities: Vec<Address>, percentages: Vec<u32>) -> Result<(), Error> {
        Self::_require_admin(&env, &caller)?;

        if identities.len() != percentages.len() {
            return Err(Error::LengthMismatch);
        }

        let mut table = Map::<Address, u32>::new(&env);
        let mut total: u32 = 0;
        for (identity, percent) in identities.iter().zip(percentages.iter()) {
            if percent > 100 {
                return Err(Error::InvalidPercentage);
            }
            if table.contains_key(identity.clone()) {
                return Err(Error::DuplicateParticipant);
            }
            total = total.saturating_add(percent);
            table.set(identity, percent);
        }
        if total != 100 {
            log!(&env, "Share table sums to {}", total);
            return Err(Error::InvalidTotalPercentage);
        }

        env.storage().instance().set(&SHARES, &table);

        env.events().publish((SHARES_SET, caller), (table.len(),));

        Ok(())
    }

    // ================================================================================================
    // DEPOSITS AND CLAIMS
    // ================================================================================================

    /// Adds `amount` to the pot. Open to any caller; the depositor must
    /// approve the ledger for `amount` first.
    ///
    /// # Errors
    /// - InvalidAmount: amount is not positive
    /// - InsufficientAllowance / InsufficientBalance: the tokens cannot be pulled
    pub fn deposit(env: Env, depositor: Address, amount: i128) -> Result<(), Error> {
        depositor.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let asset = Self::_asset(&env)?;
        let ledger = env.current_contract_address();

        let allowance = asset.allowance(&depositor, &ledger);
        if allowance < amount {
            log!(&env, "Insufficient allowance. Required: {}, Available: {}", amount, allowance);
            return Err(Error::InsufficientAllowance);
        }
        let balance = asset.balance(&depositor);
        if balance < amount {
            log!(&env, "Insufficient balance. Required: {}, Available: {}", amount, balance);
            return Err(Error::InsufficientBalance);
        }

        let total_inflow = Self::_total_inflow(&env)?
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        env.storage().instance().set(&TOTAL_INFLOW, &total_inflow);

        if asset.try_transfer_from(&ledger, &depositor, &ledger, &amount).is_err() {
            log!(&env, "Deposit transfer failed for amount: {}", amount);
            return Err(Error::TokenTransferFailed);
        }

        env.events().publish((DEPOSITED, depositor), (amount, total_inflow));

        Ok(())
    }

    /// Tokens the ledger actually holds right now.
    pub fn check_full_balance(env: Env) -> Result<i128, Error> {
        let asset = Self::_asset(&env)?;
        Ok(asset.balance(&env.current_contract_address()))
    }

    /// Pays the claimant everything their share has earned since their last claim.
    ///
    /// # Business Flow
    /// 1. entitlement = total_inflow * share / 100
    /// 2. payable = entitlement - claimed
    /// 3. claimed is raised to entitlement, then payable is transferred
    ///
    /// # Errors
    /// - NothingToClaim: payable is zero
    /// - InsufficientBalance: disbursements left the ledger unable to cover it
    ///
    /// # Returns
    /// The amount paid
    pub fn claim_tokens(env: Env, claimant: Address) -> Result<i128, Error> {
        claimant.require_auth();

        let (entitlement, claimed) = Self::_position(&env, &claimant)?;
        let payable = math::outstanding(entitlement, claimed);
        if payable <= 0 {
            return Err(Error::NothingToClaim);
        }

        let mut claims = Self::_claimed(&env)?;
        claims.set(claimant.clone(), entitlement);
        env.storage().instance().set(&CLAIMED, &claims);

        Self::_pay_out(&env, &claimant, payable)?;

        env.events().publish((CLAIMED_EVT, claimant), (payable, entitlement));

        Ok(payable)
    }

    // ================================================================================================
    // ADMIN FUNCTIONS
    // ================================================================================================

    /// Sends `amount` from the ledger's holdings to an allow-listed recipient.
    /// Does not touch total_inflow or claimed.
    ///
    /// # Errors
    /// - AccessDenied: caller is not the admin, or `recipient` is not a member of `project_id`
    /// - InvalidAmount: amount is not positive
    /// - InsufficientBalance: the ledger holds less than `amount`
    pub fn transfer(env: Env, caller: Address, recipient: Address, amount: i128, project_id: u64) -> Result<(), Error> {
        Self::_require_admin(&env, &caller)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let registry: Address = env.storage().persistent().get(&ALLOW_LIST_KEY).ok_or(Error::NotInitialized)?;
        if !AllowListClient::new(&env, &registry).is_member(&project_id, &recipient) {
            log!(&env, "Recipient not allow-listed for project {}", project_id);
            return Err(Error::AccessDenied);
        }

        Self::_pay_out(&env, &recipient, amount)?;

        env.events().publish((DISBURSED, recipient), (amount, project_id));

        Ok(())
    }

    pub fn update_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), Error> {
        Self::_require_admin(&env, &caller)?;

        env.storage().persistent().set(&ADMIN_KEY, &new_admin);

        env.events().publish((ADMIN_UPDATED, caller), (new_admin,));

        Ok(())
    }

    // ================================================================================================
    // QUERY FUNCTIONS (GETTERS)
    // ================================================================================================

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        env.storage().persistent().get(&ADMIN_KEY).ok_or(Error::NotInitialized)
    }

    pub fn get_asset(env: Env) -> Result<Address, Error> {
        env.storage().persistent().get(&ASSET_KEY).ok_or(Error::NotInitialized)
    }

    /// Sum of every deposit ever made.
    pub fn get_total_inflow(env: Env) -> Result<i128, Error> {
        Self::_total_inflow(&env)
    }

    /// Percentage held by `identity`; 0 when it is not in the table.
    pub fn get_share(env: Env, identity: Address) -> Result<u32, Error> {
        Ok(Self::_shares(&env)?.get(identity).unwrap_or(0))
    }

    pub fn get_shares(env: Env) -> Result<Map<Address, u32>, Error> {
        Self::_shares(&env)
    }

    pub fn get_claimed(env: Env, identity: Address) -> Result<i128, Error> {
        Ok(Self::_claimed(&env)?.get(identity).unwrap_or(0))
    }

    /// What `claim_tokens` would pay `identity` right now, ignoring the held balance.
    pub fn pending_claim(env: Env, identity: Address) -> Result<i128, Error> {
        let (entitlement, claimed) = Self::_position(&env, &identity)?;
        Ok(math::outstanding(entitlement, claimed))
    }
}
