#![cfg(test)]

use super::*;
use exchange_pool::{ExchangePoolContract, ExchangePoolContractClient};
use soroban_sdk::{
    testutils::Address as _,
    token::{StellarAssetClient, TokenClient},
    Address, Env,
};

const SCALE: i128 = 10_000_000;
const APPROVAL_LEDGER: u32 = 200;

// Pool seeded with 10_000 assets against 10 currency units:
// one whole asset costs 10_000 currency base units.
const POOL_ASSET: i128 = 10_000 * SCALE;
const POOL_CURRENCY: i128 = 10 * SCALE;
const PRICE: i128 = 10_000;

struct Setup<'a> {
    env: Env,
    pool_admin: Address,
    pool_id: Address,
    pool: ExchangePoolContractClient<'a>,
    market_id: Address,
    market: EscrowMarketContractClient<'a>,
    asset: TokenClient<'a>,
    asset_sac: StellarAssetClient<'a>,
    currency: TokenClient<'a>,
    currency_sac: StellarAssetClient<'a>,
}

fn setup_test_env() -> Setup<'static> {
    let env = Env::default();
    env.mock_all_auths();

    let issuer = Address::generate(&env);
    let pool_admin = Address::generate(&env);

    let asset_id = env.register_stellar_asset_contract_v2(issuer.clone()).address();
    let currency_id = env.register_stellar_asset_contract_v2(issuer).address();
    let asset = TokenClient::new(&env, &asset_id);
    let asset_sac = StellarAssetClient::new(&env, &asset_id);
    let currency = TokenClient::new(&env, &currency_id);
    let currency_sac = StellarAssetClient::new(&env, &currency_id);

    let pool_id = env.register(ExchangePoolContract, ());
    let pool = ExchangePoolContractClient::new(&env, &pool_id);
    pool.initialize(&pool_admin, &asset_id, &currency_id);

    asset_sac.mint(&pool_admin, &POOL_ASSET);
    asset.approve(&pool_admin, &pool_id, &POOL_ASSET, &APPROVAL_LEDGER);
    currency_sac.mint(&pool_admin, &POOL_CURRENCY);
    pool.initialize_pool(&pool_admin, &POOL_ASSET, &POOL_CURRENCY);

    let market_id = env.register(EscrowMarketContract, ());
    let market = EscrowMarketContractClient::new(&env, &market_id);
    market.initialize(&pool_id);

    Setup {
        env,
        pool_admin,
        pool_id,
        pool,
        market_id,
        market,
        asset,
        asset_sac,
        currency,
        currency_sac,
    }
}

impl Setup<'_> {
    /// Mints asset to `who` and approves the market to move it.
    fn give_asset(&self, who: &Address, amount: i128) {
        self.asset_sac.mint(who, &amount);
        self.asset.approve(who, &self.market_id, &amount, &APPROVAL_LEDGER);
    }

    fn give_currency(&self, who: &Address, amount: i128) {
        self.currency_sac.mint(who, &amount);
    }

    fn open_sell_offer(&self, seller: &Address, asset_amount: i128) -> u64 {
        self.give_asset(seller, asset_amount);
        self.market.create_sell_offer(seller, &asset_amount)
    }

    fn open_buy_offer(&self, buyer: &Address, currency_amount: i128) -> u64 {
        self.give_currency(buyer, currency_amount);
        self.market.create_buy_offer(buyer, &currency_amount)
    }
}

#[test]
fn test_initialize() {
    let s = setup_test_env();

    assert_eq!(s.pool.get_token_price(), PRICE);
    assert_eq!(s.market.get_asset_address(), s.asset.address);
    assert_eq!(s.market.get_currency_address(), s.currency.address);
    assert_eq!(s.market.get_pool(), s.pool_id);
    assert_eq!(s.market.get_offers().len(), 0);
    assert_eq!(s.market.get_buy_offers().len(), 0);
}

#[test]
fn test_initialize_twice() {
    let s = setup_test_env();
    assert_eq!(s.market.try_initialize(&s.pool_id), Err(Ok(Error::ContractAlreadyInitialized)));
}

/// A pool registered next to its two tokens but never funded, plus a
/// market that has not been bound yet.
fn setup_unfunded_pool(
    configure: bool,
) -> (
    Env,
    Address,
    EscrowMarketContractClient<'static>,
    StellarAssetClient<'static>,
    StellarAssetClient<'static>,
) {
    let env = Env::default();
    env.mock_all_auths();

    let issuer = Address::generate(&env);
    let pool_admin = Address::generate(&env);
    let asset_id = env.register_stellar_asset_contract_v2(issuer.clone()).address();
    let currency_id = env.register_stellar_asset_contract_v2(issuer).address();

    let pool_id = env.register(ExchangePoolContract, ());
    if configure {
        ExchangePoolContractClient::new(&env, &pool_id).initialize(&pool_admin, &asset_id, &currency_id);
    }

    let market_id = env.register(EscrowMarketContract, ());
    let market = EscrowMarketContractClient::new(&env, &market_id);
    let asset_sac = StellarAssetClient::new(&env, &asset_id);
    let currency_sac = StellarAssetClient::new(&env, &currency_id);

    (env, pool_id, market, asset_sac, currency_sac)
}

#[test]
fn test_initialize_against_unconfigured_pool() {
    let (_env, pool_id, market, _, _) = setup_unfunded_pool(false);

    assert_eq!(market.try_initialize(&pool_id), Err(Ok(Error::NotInitialized)));
    assert_eq!(market.try_get_pool(), Err(Ok(Error::NotInitialized)));
}

#[test]
fn test_initialize_needs_no_signature() {
    let (env, pool_id, market, _, _) = setup_unfunded_pool(true);
    env.set_auths(&[]);

    market.initialize(&pool_id);
    assert_eq!(market.get_pool(), pool_id);
}

#[test]
fn test_offers_against_unfunded_pool() {
    let (env, pool_id, market, asset_sac, currency_sac) = setup_unfunded_pool(true);
    market.initialize(&pool_id);

    let buyer = Address::generate(&env);
    currency_sac.mint(&buyer, &1_000);
    assert_eq!(market.try_create_buy_offer(&buyer, &1_000), Err(Ok(Error::PriceUnavailable)));

    let seller = Address::generate(&env);
    asset_sac.mint(&seller, &SCALE);
    TokenClient::new(&env, &asset_sac.address).approve(&seller, &market.address, &SCALE, &APPROVAL_LEDGER);
    assert_eq!(market.try_create_sell_offer(&seller, &SCALE), Err(Ok(Error::PriceUnavailable)));

    assert_eq!(market.get_offers().len(), 0);
    assert_eq!(market.get_buy_offers().len(), 0);
}

// ================================================================================================
// SELL OFFERS
// ================================================================================================

#[test]
fn test_create_sell_offer() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let asset_amount = 10 * SCALE;

    let offer_id = s.open_sell_offer(&seller, asset_amount);

    assert_eq!(offer_id, 0);
    assert_eq!(s.market.get_offers().len(), 1);
    assert_eq!(
        s.market.get_offer_by_id(&offer_id),
        Offer {
            creator: seller.clone(),
            asset_amount,
            currency_amount: asset_amount * PRICE / SCALE,
            status: OfferStatus::Active,
        }
    );
    assert_eq!(s.asset.balance(&seller), 0);
    assert_eq!(s.asset.balance(&s.market_id), asset_amount);
}

#[test]
fn test_create_sell_offer_without_allowance() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    s.asset_sac.mint(&seller, &(10 * SCALE));

    let result = s.market.try_create_sell_offer(&seller, &(10 * SCALE));
    assert_eq!(result, Err(Ok(Error::InsufficientAllowance)));
    assert_eq!(s.market.get_offers().len(), 0);
    assert_eq!(s.asset.balance(&seller), 10 * SCALE);
}

#[test]
fn test_create_sell_offer_zero_amount() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    assert_eq!(s.market.try_create_sell_offer(&seller, &0), Err(Ok(Error::InvalidOfferAmount)));
}

#[test]
fn test_create_sell_offer_worth_nothing() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    // 999 base units * 10_000 / 10^7 rounds down to zero currency
    s.give_asset(&seller, 999);
    assert_eq!(s.market.try_create_sell_offer(&seller, &999), Err(Ok(Error::InvalidOfferAmount)));
}

#[test]
fn test_complete_sell_offer() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let buyer = Address::generate(&s.env);

    let offer_id = s.open_sell_offer(&seller, 10 * SCALE);
    let offer = s.market.get_offer_by_id(&offer_id);
    s.give_currency(&buyer, offer.currency_amount);

    s.market.complete_sell_offer(&buyer, &offer_id, &offer.currency_amount);

    assert_eq!(s.market.get_offer_by_id(&offer_id).status, OfferStatus::Confirmed);
    assert_eq!(s.asset.balance(&buyer), offer.asset_amount);
    assert_eq!(s.currency.balance(&buyer), 0);
    assert_eq!(s.currency.balance(&seller), offer.currency_amount);
    assert_eq!(s.asset.balance(&s.market_id), 0);
}

#[test]
fn test_complete_sell_offer_twice() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let buyer = Address::generate(&s.env);

    let offer_id = s.open_sell_offer(&seller, 10 * SCALE);
    let offer = s.market.get_offer_by_id(&offer_id);
    s.give_currency(&buyer, 2 * offer.currency_amount);

    s.market.complete_sell_offer(&buyer, &offer_id, &offer.currency_amount);

    let result = s.market.try_complete_sell_offer(&buyer, &offer_id, &offer.currency_amount);
    assert_eq!(result, Err(Ok(Error::OfferNotActive)));
    let result = s.market.try_cancel_sell_offer(&seller, &offer_id);
    assert_eq!(result, Err(Ok(Error::OfferNotActive)));
    assert_eq!(s.currency.balance(&buyer), offer.currency_amount);
}

#[test]
fn test_complete_sell_offer_invalid_id() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let buyer = Address::generate(&s.env);
    s.open_sell_offer(&seller, 10 * SCALE);
    s.give_currency(&buyer, SCALE);

    assert_eq!(s.market.try_complete_sell_offer(&buyer, &1, &SCALE), Err(Ok(Error::InvalidOfferId)));
    assert_eq!(s.market.try_get_offer_by_id(&1), Err(Ok(Error::InvalidOfferId)));
}

#[test]
fn test_complete_sell_offer_wrong_payment() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let buyer = Address::generate(&s.env);

    let offer_id = s.open_sell_offer(&seller, 10 * SCALE);
    let offer = s.market.get_offer_by_id(&offer_id);
    s.give_currency(&buyer, offer.currency_amount);

    let result = s.market.try_complete_sell_offer(&buyer, &offer_id, &(offer.currency_amount - 1));
    assert_eq!(result, Err(Ok(Error::IncorrectPayment)));

    // Nothing moved
    assert_eq!(s.market.get_offer_by_id(&offer_id).status, OfferStatus::Active);
    assert_eq!(s.currency.balance(&buyer), offer.currency_amount);
    assert_eq!(s.currency.balance(&seller), 0);
    assert_eq!(s.asset.balance(&buyer), 0);
    assert_eq!(s.asset.balance(&s.market_id), offer.asset_amount);
}

#[test]
fn test_complete_sell_offer_unfunded_buyer() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let buyer = Address::generate(&s.env);

    let offer_id = s.open_sell_offer(&seller, 10 * SCALE);
    let offer = s.market.get_offer_by_id(&offer_id);

    let result = s.market.try_complete_sell_offer(&buyer, &offer_id, &offer.currency_amount);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));
    assert_eq!(s.market.get_offer_by_id(&offer_id).status, OfferStatus::Active);
}

#[test]
fn test_sell_offer_price_is_frozen() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let buyer = Address::generate(&s.env);
    let trader = Address::generate(&s.env);

    let offer_id = s.open_sell_offer(&seller, 10 * SCALE);
    let quoted = s.market.get_offer_by_id(&offer_id).currency_amount;

    // Move the pool price after the offer was created
    s.give_currency(&trader, SCALE);
    s.pool.swap_currency_for_asset(&trader, &SCALE);
    assert!(s.pool.get_token_price() > PRICE);

    s.give_currency(&buyer, quoted);
    s.market.complete_sell_offer(&buyer, &offer_id, &quoted);
    assert_eq!(s.currency.balance(&seller), quoted);
}

#[test]
fn test_cancel_sell_offer() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let asset_amount = 10 * SCALE;

    let offer_id = s.open_sell_offer(&seller, asset_amount);
    s.market.cancel_sell_offer(&seller, &offer_id);

    assert_eq!(s.market.get_offer_by_id(&offer_id).status, OfferStatus::Cancelled);
    assert_eq!(s.asset.balance(&seller), asset_amount);
    assert_eq!(s.asset.balance(&s.market_id), 0);

    let result = s.market.try_cancel_sell_offer(&seller, &offer_id);
    assert_eq!(result, Err(Ok(Error::OfferNotActive)));
}

#[test]
fn test_cancel_sell_offer_not_owner() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let other = Address::generate(&s.env);

    let offer_id = s.open_sell_offer(&seller, 10 * SCALE);

    let result = s.market.try_cancel_sell_offer(&other, &offer_id);
    assert_eq!(result, Err(Ok(Error::NotOfferOwner)));
    assert_eq!(s.market.get_offer_by_id(&offer_id).status, OfferStatus::Active);
}

#[test]
fn test_cancel_sell_offer_invalid_id() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    s.open_sell_offer(&seller, 10 * SCALE);

    assert_eq!(s.market.try_cancel_sell_offer(&seller, &1), Err(Ok(Error::InvalidOfferId)));
}

#[test]
fn test_market_leaves_pool_reserves_alone() {
    let s = setup_test_env();
    let seller = Address::generate(&s.env);
    let buyer = Address::generate(&s.env);

    let offer_id = s.open_sell_offer(&seller, 10 * SCALE);
    let offer = s.market.get_offer_by_id(&offer_id);
    s.give_currency(&buyer, offer.currency_amount);
    s.market.complete_sell_offer(&buyer, &offer_id, &offer.currency_amount);

    assert_eq!(s.pool.get_pool_balance(), (POOL_ASSET, POOL_CURRENCY));
    assert_eq!(s.asset.balance(&s.pool_admin), 0);
}

// ================================================================================================
// BUY OFFERS
// ================================================================================================

#[test]
fn test_create_buy_offer() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let currency_amount = SCALE / 10;

    let offer_id = s.open_buy_offer(&buyer, currency_amount);

    assert_eq!(offer_id, 0);
    assert_eq!(
        s.market.get_buy_offer_by_id(&offer_id),
        Offer {
            creator: buyer.clone(),
            asset_amount: currency_amount * SCALE / PRICE,
            currency_amount,
            status: OfferStatus::Active,
        }
    );
    assert_eq!(s.currency.balance(&buyer), 0);
    assert_eq!(s.currency.balance(&s.market_id), currency_amount);
}

#[test]
fn test_create_buy_offer_zero_amount() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    assert_eq!(s.market.try_create_buy_offer(&buyer, &0), Err(Ok(Error::InvalidOfferAmount)));
    assert_eq!(s.market.get_buy_offers().len(), 0);
}

#[test]
fn test_create_buy_offer_unfunded() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let result = s.market.try_create_buy_offer(&buyer, &SCALE);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));
    assert_eq!(s.market.get_buy_offers().len(), 0);
}

#[test]
fn test_complete_buy_offer() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let seller = Address::generate(&s.env);

    let offer_id = s.open_buy_offer(&buyer, SCALE / 10);
    let offer = s.market.get_buy_offer_by_id(&offer_id);
    s.give_asset(&seller, offer.asset_amount);

    s.market.complete_buy_offer(&seller, &offer_id, &offer.asset_amount);

    assert_eq!(s.market.get_buy_offer_by_id(&offer_id).status, OfferStatus::Confirmed);
    assert_eq!(s.asset.balance(&buyer), offer.asset_amount);
    assert_eq!(s.asset.balance(&seller), 0);
    assert_eq!(s.currency.balance(&seller), offer.currency_amount);
    assert_eq!(s.currency.balance(&s.market_id), 0);
}

#[test]
fn test_complete_buy_offer_self_trade() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);

    let offer_id = s.open_buy_offer(&buyer, SCALE / 10);
    let offer = s.market.get_buy_offer_by_id(&offer_id);
    s.give_asset(&buyer, offer.asset_amount);

    let result = s.market.try_complete_buy_offer(&buyer, &offer_id, &offer.asset_amount);
    assert_eq!(result, Err(Ok(Error::SelfTrade)));

    assert_eq!(s.market.get_buy_offer_by_id(&offer_id).status, OfferStatus::Active);
    assert_eq!(s.asset.balance(&buyer), offer.asset_amount);
    assert_eq!(s.currency.balance(&buyer), 0);
    assert_eq!(s.currency.balance(&s.market_id), offer.currency_amount);
}

#[test]
fn test_complete_buy_offer_without_allowance() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let seller = Address::generate(&s.env);

    let offer_id = s.open_buy_offer(&buyer, SCALE / 10);
    let offer = s.market.get_buy_offer_by_id(&offer_id);
    s.asset_sac.mint(&seller, &offer.asset_amount);

    let result = s.market.try_complete_buy_offer(&seller, &offer_id, &offer.asset_amount);
    assert_eq!(result, Err(Ok(Error::InsufficientAllowance)));
    assert_eq!(s.market.get_buy_offer_by_id(&offer_id).status, OfferStatus::Active);
}

#[test]
fn test_complete_buy_offer_insufficient_balance() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let seller = Address::generate(&s.env);

    let offer_id = s.open_buy_offer(&buyer, SCALE / 10);
    let offer = s.market.get_buy_offer_by_id(&offer_id);
    s.asset.approve(&seller, &s.market_id, &offer.asset_amount, &APPROVAL_LEDGER);

    let result = s.market.try_complete_buy_offer(&seller, &offer_id, &offer.asset_amount);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));
    assert_eq!(s.currency.balance(&seller), 0);
}

#[test]
fn test_complete_buy_offer_wrong_amount() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let seller = Address::generate(&s.env);

    let offer_id = s.open_buy_offer(&buyer, SCALE / 10);
    let offer = s.market.get_buy_offer_by_id(&offer_id);
    s.give_asset(&seller, offer.asset_amount);

    let result = s.market.try_complete_buy_offer(&seller, &offer_id, &(offer.asset_amount / 2));
    assert_eq!(result, Err(Ok(Error::IncorrectPayment)));
}

#[test]
fn test_complete_buy_offer_twice() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let seller = Address::generate(&s.env);

    let offer_id = s.open_buy_offer(&buyer, SCALE / 10);
    let offer = s.market.get_buy_offer_by_id(&offer_id);
    s.give_asset(&seller, offer.asset_amount);
    s.market.complete_buy_offer(&seller, &offer_id, &offer.asset_amount);

    s.give_asset(&seller, offer.asset_amount);
    let result = s.market.try_complete_buy_offer(&seller, &offer_id, &offer.asset_amount);
    assert_eq!(result, Err(Ok(Error::OfferNotActive)));
}

#[test]
fn test_complete_buy_offer_invalid_id() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let seller = Address::generate(&s.env);
    s.open_buy_offer(&buyer, SCALE / 10);

    assert_eq!(s.market.try_complete_buy_offer(&seller, &1, &SCALE), Err(Ok(Error::InvalidOfferId)));
    assert_eq!(s.market.try_get_buy_offer_by_id(&1), Err(Ok(Error::InvalidOfferId)));
}

#[test]
fn test_cancel_one_buy_offer() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);

    let first = s.open_buy_offer(&buyer, SCALE / 10);
    let second = s.open_buy_offer(&buyer, SCALE / 20);
    assert_eq!((first, second), (0, 1));

    s.market.cancel_buy_offer(&buyer, &first);

    assert_eq!(s.market.get_buy_offer_by_id(&first).status, OfferStatus::Cancelled);
    assert_eq!(s.market.get_buy_offer_by_id(&second).status, OfferStatus::Active);
    assert_eq!(s.currency.balance(&buyer), SCALE / 10);
    assert_eq!(s.currency.balance(&s.market_id), SCALE / 20);
}

#[test]
fn test_cancel_buy_offer_not_owner() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let other = Address::generate(&s.env);

    let offer_id = s.open_buy_offer(&buyer, SCALE / 10);

    let result = s.market.try_cancel_buy_offer(&other, &offer_id);
    assert_eq!(result, Err(Ok(Error::NotOfferOwner)));
    assert_eq!(s.currency.balance(&s.market_id), SCALE / 10);
}

#[test]
fn test_cancel_buy_offer_twice() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);

    let offer_id = s.open_buy_offer(&buyer, SCALE / 10);
    s.market.cancel_buy_offer(&buyer, &offer_id);

    let result = s.market.try_cancel_buy_offer(&buyer, &offer_id);
    assert_eq!(result, Err(Ok(Error::OfferNotActive)));
    assert_eq!(s.currency.balance(&buyer), SCALE / 10);
    assert_eq!(s.currency.balance(&s.market_id), 0);
}

#[test]
fn test_cancel_buy_offer_after_completion() {
    let s = setup_test_env();
    let buyer = Address::generate(&s.env);
    let seller = Address::generate(&s.env);

    let offer_id = s.open_buy_offer(&buyer, SCALE / 10);
    let offer = s.market.get_buy_offer_by_id(&offer_id);
    s.give_asset(&seller, offer.asset_amount);
    s.market.complete_buy_offer(&seller, &offer_id, &offer.asset_amount);

    let result = s.market.try_cancel_buy_offer(&buyer, &offer_id);
    assert_eq!(result, Err(Ok(Error::OfferNotActive)));
    assert_eq!(s.currency.balance(&buyer), 0);
    assert_eq!(s.market.get_buy_offer_by_id(&offer_id).status, OfferStatus::Confirmed);
}

#[test]
fn test_offer_ids_are_per_collection() {
    let s = setup_test_env();
    let trader = Address::generate(&s.env);

    assert_eq!(s.open_sell_offer(&trader, 10 * SCALE), 0);
    assert_eq!(s.open_buy_offer(&trader, SCALE / 10), 0);
    assert_eq!(s.open_sell_offer(&trader, 5 * SCALE), 1);

    s.market.cancel_sell_offer(&trader, &0);
    assert_eq!(s.open_sell_offer(&trader, 5 * SCALE), 2);

    assert_eq!(s.market.get_offers().len(), 3);
    assert_eq!(s.market.get_buy_offers().len(), 1);
}
