use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Gtc,
}

/// Body of the order POST. Decimals serialize as JSON strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    #[serde(rename = "account")]
    pub account_ref: String,
    #[serde(rename = "instrument")]
    pub instrument_ref: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub trigger: Trigger,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub side: Side,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    /// Market buy; `price` is rounded to cents.
    pub fn market_buy(
        account_ref: impl Into<String>,
        instrument_ref: impl Into<String>,
        symbol: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::market(
            account_ref.into(),
            instrument_ref.into(),
            symbol.into(),
            Side::Buy,
            quantity,
            Some(round_to_cents(price)),
        )
    }

    /// Market sell. Never carries a price.
    pub fn market_sell(
        account_ref: impl Into<String>,
        instrument_ref: impl Into<String>,
        symbol: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self::market(
            account_ref.into(),
            instrument_ref.into(),
            symbol.into(),
            Side::Sell,
            quantity,
            None,
        )
    }

    fn market(
        account_ref: String,
        instrument_ref: String,
        symbol: String,
        side: Side,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        Self {
            account_ref,
            instrument_ref,
            symbol,
            order_type: OrderType::Market,
            trigger: Trigger::Immediate,
            quantity,
            price,
            side,
            time_in_force: TimeInForce::Gtc,
        }
    }
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} x {}", self.side, self.quantity, self.symbol)?;
        if let Some(price) = self.price {
            write!(f, " @ {}", price)?;
        }
        Ok(())
    }
}

/// Whatever the brokerage tells us about an accepted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderConfirmation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Half-away-from-zero to exactly two decimal places.
pub fn round_to_cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Half-away-from-zero to a whole number of shares.
pub fn round_to_whole(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(0);
    rounded
}
