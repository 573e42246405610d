/*!
 * Escrow Market Smart Contract
 *
 * Peer-to-peer trading of one asset against the native currency, priced off
 * an exchange pool. Key features:
 * - Sell offers: the creator escrows asset, a buyer pays the quoted currency
 * - Buy offers: the creator escrows currency, a seller delivers the quoted asset
 * - Amounts frozen at creation from the pool's spot price
 * - Creator-only cancellation with full refund of the escrowed side
 * - Event logging for every lifecycle step
 *
 * Business Logic:
 * 1. Creator opens an offer; their side moves into the market's custody
 * 2. Any other party completes it by supplying the exact counter amount
 * 3. Both sides are released and the offer becomes Confirmed
 * 4. Alternatively the creator cancels and the offer becomes Cancelled
 *
 * The market reads the pool's price but never touches its reserves.
 */

#![no_std]

mod pool;
mod types;

#[cfg(test)]
mod test;

use soroban_sdk::{contract, contractimpl, log, token, Address, Env, Symbol, Vec};

use pool::ExchangePoolClient;
pub use types::{Error, Offer, OfferStatus};
use types::{
    ASSET_KEY, BUY_CANCELLED, BUY_COMPLETED, BUY_CREATED, BUY_OFFERS, CURRENCY_KEY, POOL_KEY,
    SELL_CANCELLED, SELL_COMPLETED, SELL_CREATED, SELL_OFFERS,
};

#[contract]
pub struct EscrowMarketContract;

#[contractimpl]
impl EscrowMarketContract {
    /// Binds the market to one exchange pool. Can only be called once, by
    /// anyone: the market holds no admin, and the binding is the whole
    /// configuration.
    ///
    /// # Errors
    /// - ContractAlreadyInitialized: already bound
    /// - NotInitialized: `pool` does not answer with its token addresses
    ///
    /// The pool's asset and currency token addresses are cached here so that
    /// settlement never has to call back into the pool.
    pub fn initialize(env: Env, pool: Address) -> Result<(), Error> {
        if env.storage().persistent().has(&POOL_KEY) {
            return Err(Error::ContractAlreadyInitialized);
        }

        let pool_client = ExchangePoolClient::new(&env, &pool);
        let (asset, currency) = match (pool_client.try_get_asset(), pool_client.try_get_currency()) {
            (Ok(Ok(asset)), Ok(Ok(currency))) => (asset, currency),
            _ => {
                log!(&env, "Pool is not configured");
                return Err(Error::NotInitialized);
            }
        };

        env.storage().persistent().set(&POOL_KEY, &pool);
        env.storage().persistent().set(&ASSET_KEY, &asset);
        env.storage().persistent().set(&CURRENCY_KEY, &currency);

        env.storage().instance().set(&SELL_OFFERS, &Vec::<Offer>::new(&env));
        env.storage().instance().set(&BUY_OFFERS, &Vec::<Offer>::new(&env));

        Ok(())
    }

    // ================================================================================================
    // INTERNAL HELPERS
    // ================================================================================================

    fn _address(env: &Env, key: &Symbol) -> Result<Address, Error> {
        env.storage().persistent().get(key).ok_or(Error::NotInitialized)
    }

    fn _offers(env: &Env, key: &Symbol) -> Result<Vec<Offer>, Error> {
        env.storage().instance().get(key).ok_or(Error::NotInitialized)
    }

    fn _index(offers: &Vec<Offer>, offer_id: u64) -> Result<(u32, Offer), Error> {
        let index = u32::try_from(offer_id).map_err(|_| Error::InvalidOfferId)?;
        let offer = offers.get(index).ok_or(Error::InvalidOfferId)?;
        Ok((index, offer))
    }

    /// Current pool price and scale. Pool failures are reported as market
    /// errors, never passed through with the pool's own codes.
    fn _quote(env: &Env) -> Result<(i128, i128), Error> {
        let pool = ExchangePoolClient::new(env, &Self::_address(env, &POOL_KEY)?);
        let scale = match pool.try_get_scale() {
            Ok(Ok(scale)) => scale,
            _ => return Err(Error::NotInitialized),
        };
        match pool.try_get_token_price() {
            Ok(Ok(price)) => Ok((price, scale)),
            _ => {
                log!(env, "Pool has no price");
                Err(Error::PriceUnavailable)
            }
        }
    }

    /// Moves `amount` asset units from `from` to `to` using the allowance
    /// `from` granted to the market.
    fn _pull_asset(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
        let asset = token::Client::new(env, &Self::_address(env, &ASSET_KEY)?);
        let market = env.current_contract_address();

        let allowance = asset.allowance(from, &market);
        if allowance < amount {
            log!(env, "Insufficient allowance. Required: {}, Available: {}", amount, allowance);
            return Err(Error::InsufficientAllowance);
        }
        let balance = asset.balance(from);
        if balance < amount {
            log!(env, "Insufficient balance. Required: {}, Available: {}", amount, balance);
            return Err(Error::InsufficientBalance);
        }

        match asset.try_transfer_from(&market, from, to, &amount) {
            Ok(_) => Ok(()),
            Err(_) => {
                log!(env, "Asset transfer failed for amount: {}", amount);
                Err(Error::TokenTransferFailed)
            }
        }
    }

    /// Direct transfer signed by `from` (the market itself when releasing escrow).
    fn _send(env: &Env, key: &Symbol, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
        let client = token::Client::new(env, &Self::_address(env, key)?);

        if *from != env.current_contract_address() {
            let balance = client.balance(from);
            if balance < amount {
                log!(env, "Insufficient balance. Required: {}, Available: {}", amount, balance);
                return Err(Error::InsufficientBalance);
            }
        }

        match client.try_transfer(from, to, &amount) {
            Ok(_) => Ok(()),
            Err(_) => {
                log!(env, "Transfer of {} failed", amount);
                Err(Error::TokenTransferFailed)
            }
        }
    }

    // ================================================================================================
    // SELL OFFERS (asset escrowed, currency wanted)
    // ================================================================================================

    /// Opens a sell offer and escrows `asset_amount` from the seller.
    /// The seller must approve the market for `asset_amount` first.
    ///
    /// `currency_amount = asset_amount * price / scale`, frozen at this point.
    ///
    /// # Errors
    /// - InvalidOfferAmount: non-positive amount, or one worth nothing at the current price
    /// - PriceUnavailable: the pool has no price (unfunded)
    /// - InsufficientAllowance / InsufficientBalance: the asset cannot be escrowed
    ///
    /// # Returns
    /// The new offer's id
    pub fn create_sell_offer(env: Env, seller: Address, asset_amount: i128) -> Result<u64, Error> {
        seller.require_auth();

        if asset_amount <= 0 {
            return Err(Error::InvalidOfferAmount);
        }

        let (price, scale) = Self::_quote(&env)?;
        let currency_amount = asset_amount.checked_mul(price).ok_or(Error::ArithmeticOverflow)? / scale;
        if currency_amount <= 0 {
            log!(&env, "Offer too small at price {}: {}", price, asset_amount);
            return Err(Error::InvalidOfferAmount);
        }

        let mut offers = Self::_offers(&env, &SELL_OFFERS)?;
        let offer_id = offers.len() as u64;
        offers.push_back(Offer {
            creator: seller.clone(),
            asset_amount,
            currency_amount,
            status: OfferStatus::Active,
        });
        env.storage().instance().set(&SELL_OFFERS, &offers);

        Self::_pull_asset(&env, &seller, &env.current_contract_address(), asset_amount)?;

        env.events().publish((SELL_CREATED, seller), (offer_id, asset_amount, currency_amount));

        Ok(offer_id)
    }

    /// Fills a sell offer: the buyer pays exactly the frozen currency amount,
    /// which goes straight to the creator, and receives the escrowed asset.
    ///
    /// # Errors
    /// - InvalidOfferId: no such offer
    /// - OfferNotActive: already confirmed or cancelled
    /// - IncorrectPayment: `currency_paid` differs from the offer's currency amount
    /// - InsufficientBalance: buyer cannot pay
    pub fn complete_sell_offer(env: Env, buyer: Address, offer_id: u64, currency_paid: i128) -> Result<(), Error> {
        buyer.require_auth();

        let mut offers = Self::_offers(&env, &SELL_OFFERS)?;
        let (index, mut offer) = Self::_index(&offers, offer_id)?;

        if offer.status != OfferStatus::Active {
            return Err(Error::OfferNotActive);
        }
        if currency_paid != offer.currency_amount {
            log!(&env, "Payment mismatch. Expected: {}, Paid: {}", offer.currency_amount, currency_paid);
            return Err(Error::IncorrectPayment);
        }

        // State first, transfers after
        offer.status = OfferStatus::Confirmed;
        offers.set(index, offer.clone());
        env.storage().instance().set(&SELL_OFFERS, &offers);

        Self::_send(&env, &CURRENCY_KEY, &buyer, &offer.creator, currency_paid)?;
        Self::_send(&env, &ASSET_KEY, &env.current_contract_address(), &buyer, offer.asset_amount)?;

        env.events().publish((SELL_COMPLETED, buyer), (offer_id,));

        Ok(())
    }

    /// Withdraws a sell offer and returns the escrowed asset. Creator only.
    pub fn cancel_sell_offer(env: Env, seller: Address, offer_id: u64) -> Result<(), Error> {
        seller.require_auth();

        let mut offers = Self::_offers(&env, &SELL_OFFERS)?;
        let (index, mut offer) = Self::_index(&offers, offer_id)?;

        if offer.creator != seller {
            return Err(Error::NotOfferOwner);
        }
        if offer.status != OfferStatus::Active {
            return Err(Error::OfferNotActive);
        }

        offer.status = OfferStatus::Cancelled;
        offers.set(index, offer.clone());
        env.storage().instance().set(&SELL_OFFERS, &offers);

        Self::_send(&env, &ASSET_KEY, &env.current_contract_address(), &seller, offer.asset_amount)?;

        env.events().publish((SELL_CANCELLED, seller), (offer_id,));

        Ok(())
    }

    // ================================================================================================
    // BUY OFFERS (currency escrowed, asset wanted)
    // ================================================================================================

    /// Opens a buy offer and escrows `currency_amount` from the buyer.
    ///
    /// `asset_amount = currency_amount * scale / price`, frozen at this point.
    ///
    /// # Errors
    /// - InvalidOfferAmount: non-positive amount, or too little to buy one asset unit
    /// - PriceUnavailable: the pool has no price, or quotes zero
    /// - InsufficientBalance: buyer cannot fund the escrow
    pub fn create_buy_offer(env: Env, buyer: Address, currency_amount: i128) -> Result<u64, Error> {
        buyer.require_auth();

        if currency_amount <= 0 {
            return Err(Error::InvalidOfferAmount);
        }

        let (price, scale) = Self::_quote(&env)?;
        if price <= 0 {
            return Err(Error::PriceUnavailable);
        }
        let asset_amount = currency_amount.checked_mul(scale).ok_or(Error::ArithmeticOverflow)? / price;
        if asset_amount <= 0 {
            log!(&env, "Offer too small at price {}: {}", price, currency_amount);
            return Err(Error::InvalidOfferAmount);
        }

        let mut offers = Self::_offers(&env, &BUY_OFFERS)?;
        let offer_id = offers.len() as u64;
        offers.push_back(Offer {
            creator: buyer.clone(),
            asset_amount,
            currency_amount,
            status: OfferStatus::Active,
        });
        env.storage().instance().set(&BUY_OFFERS, &offers);

        Self::_send(&env, &CURRENCY_KEY, &buyer, &env.current_contract_address(), currency_amount)?;

        env.events().publish((BUY_CREATED, buyer), (offer_id, asset_amount, currency_amount));

        Ok(offer_id)
    }

    /// Fills a buy offer: the seller delivers exactly the frozen asset amount
    /// to the creator and receives the escrowed currency. The seller must
    /// approve the market for `asset_amount` first.
    ///
    /// # Errors
    /// - InvalidOfferId: no such offer
    /// - OfferNotActive: already confirmed or cancelled
    /// - SelfTrade: the creator cannot fill their own offer
    /// - IncorrectPayment: `asset_amount` differs from the offer's asset amount
    /// - InsufficientAllowance / InsufficientBalance: the asset cannot be pulled
    pub fn complete_buy_offer(env: Env, seller: Address, offer_id: u64, asset_amount: i128) -> Result<(), Error> {
        seller.require_auth();

        let mut offers = Self::_offers(&env, &BUY_OFFERS)?;
        let (index, mut offer) = Self::_index(&offers, offer_id)?;

        if offer.status != OfferStatus::Active {
            return Err(Error::OfferNotActive);
        }
        if seller == offer.creator {
            return Err(Error::SelfTrade);
        }
        if asset_amount != offer.asset_amount {
            log!(&env, "Delivery mismatch. Expected: {}, Delivered: {}", offer.asset_amount, asset_amount);
            return Err(Error::IncorrectPayment);
        }

        offer.status = OfferStatus::Confirmed;
        offers.set(index, offer.clone());
        env.storage().instance().set(&BUY_OFFERS, &offers);

        Self::_pull_asset(&env, &seller, &offer.creator, asset_amount)?;
        Self::_send(&env, &CURRENCY_KEY, &env.current_contract_address(), &seller, offer.currency_amount)?;

        env.events().publish((BUY_COMPLETED, seller), (offer_id,));

        Ok(())
    }

    /// Withdraws a buy offer and refunds the escrowed currency. Creator only.
    pub fn cancel_buy_offer(env: Env, buyer: Address, offer_id: u64) -> Result<(), Error> {
        buyer.require_auth();

        let mut offers = Self::_offers(&env, &BUY_OFFERS)?;
        let (index, mut offer) = Self::_index(&offers, offer_id)?;

        if offer.creator != buyer {
            return Err(Error::NotOfferOwner);
        }
        if offer.status != OfferStatus::Active {
            return Err(Error::OfferNotActive);
        }

        offer.status = OfferStatus::Cancelled;
        offers.set(index, offer.clone());
        env.storage().instance().set(&BUY_OFFERS, &offers);

        Self::_send(&env, &CURRENCY_KEY, &env.current_contract_address(), &buyer, offer.currency_amount)?;

        env.events().publish((BUY_CANCELLED, buyer), (offer_id,));

        Ok(())
    }

    // ================================================================================================
    // QUERY FUNCTIONS (GETTERS)
    // ================================================================================================

    /// Token contract of the traded asset, for discovery.
    pub fn get_asset_address(env: Env) -> Result<Address, Error> {
        Self::_address(&env, &ASSET_KEY)
    }

    pub fn get_currency_address(env: Env) -> Result<Address, Error> {
        Self::_address(&env, &CURRENCY_KEY)
    }

    pub fn get_pool(env: Env) -> Result<Address, Error> {
        Self::_address(&env, &POOL_KEY)
    }

    pub fn get_offer_by_id(env: Env, offer_id: u64) -> Result<Offer, Error> {
        let offers = Self::_offers(&env, &SELL_OFFERS)?;
        Self::_index(&offers, offer_id).map(|(_, offer)| offer)
    }

    /// All sell offers in creation order, whatever their status.
    pub fn get_offers(env: Env) -> Result<Vec<Offer>, Error> {
        Self::_offers(&env, &SELL_OFFERS)
    }

    pub fn get_buy_offer_by_id(env: Env, offer_id: u64) -> Result<Offer, Error> {
        let offers = Self::_offers(&env, &BUY_OFFERS)?;
        Self::_index(&offers, offer_id).map(|(_, offer)| offer)
    }

    /// All buy offers in creation order, whatever their status.
    pub fn get_buy_offers(env: Env) -> Result<Vec<Offer>, Error> {
        Self::_offers(&env, &BUY_OFFERS)
    }
}
