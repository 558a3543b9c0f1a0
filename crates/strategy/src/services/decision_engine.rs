use std::sync::Arc;

use common::models::{OrderRequest, round_to_cents, round_to_whole};
use market_data::{BrokerageGateway, GatewayError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::rejection::{Decision, Rejection};

/// Share of buying power committed to a single buy.
pub const BUY_ALLOCATION: Decimal = dec!(0.30);

/// Turns a buy/sell intent into an order or a rejection.
///
/// Every call re-reads account, quote and position through the gateway.
/// Nothing is kept between decisions.
pub struct DecisionEngine<G> {
    gateway: Arc<G>,
}

impl<G: BrokerageGateway> DecisionEngine<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn decide_buy(&self, symbol: &str) -> Result<Decision, GatewayError> {
        let account = self.gateway.fetch_account().await?;
        let cash_for_buy = account
            .buying_power
            .checked_mul(BUY_ALLOCATION)
            .map(round_to_cents)
            .ok_or_else(|| {
                GatewayError::malformed(
                    "accounts",
                    format!("buying power {} out of range", account.buying_power),
                )
            })?;

        let quote = self.gateway.fetch_quote(symbol).await?;
        let price = quote.last_trade_price;
        debug!(
            "{}: buying power {}, allocation {}, last trade {}",
            symbol, account.buying_power, cash_for_buy, price
        );

        if price > cash_for_buy {
            return Ok(Rejection::InsufficientBuyingPower {
                price,
                cash_for_buy,
            }
            .into());
        }

        let instrument_id = self.gateway.resolve_instrument_id(symbol).await?;
        let position = self
            .gateway
            .fetch_position(&account.account_number, &instrument_id)
            .await?;

        if position.is_held() {
            return Ok(Rejection::AlreadyHoldingPosition {
                quantity: position.owned_quantity,
            }
            .into());
        }

        // Quotes that round to 0.00 cannot be priced into an order.
        let quantity = if round_to_cents(price) > Decimal::ZERO {
            cash_for_buy
                .checked_div(price)
                .map(|q| q.floor())
                .ok_or_else(|| {
                    GatewayError::malformed(
                        "quotes",
                        format!("cannot size {} at last trade {}", cash_for_buy, price),
                    )
                })?
        } else {
            Decimal::ZERO
        };

        if quantity <= Decimal::ZERO {
            return Ok(Rejection::ZeroQuantityOrder {
                price,
                cash_for_buy,
            }
            .into());
        }

        let order = OrderRequest::market_buy(
            account.account_url,
            position.instrument_url,
            symbol,
            quantity,
            price,
        );
        info!("{}", order);

        Ok(Decision::Approved(order))
    }

    pub async fn decide_sell(&self, symbol: &str) -> Result<Decision, GatewayError> {
        let account = self.gateway.fetch_account().await?;
        let quote = self.gateway.fetch_quote(symbol).await?;

        let instrument_id = self.gateway.resolve_instrument_id(symbol).await?;
        let position = self
            .gateway
            .fetch_position(&account.account_number, &instrument_id)
            .await?;

        if !position.is_held() {
            return Ok(Rejection::NoPositionHeld.into());
        }

        let quantity = round_to_whole(position.owned_quantity);
        if quantity <= Decimal::ZERO {
            return Ok(Rejection::FractionalPositionOnly {
                quantity: position.owned_quantity,
            }
            .into());
        }

        let order = OrderRequest::market_sell(
            account.account_url,
            position.instrument_url,
            symbol,
            quantity,
        );
        info!("{} @ {}", order, round_to_cents(quote.last_trade_price));

        Ok(Decision::Approved(order))
    }
}
