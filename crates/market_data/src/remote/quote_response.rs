use common::models::Quote;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{error::GatewayError, traits::RemoteResponse};

#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub last_trade_price: Option<String>,
}

impl RemoteResponse<Quote> for QuoteResponse {
    fn to_model(&self) -> Result<Quote, GatewayError> {
        let no_quote = || GatewayError::NoTradableQuote {
            symbol: self.symbol.clone(),
        };

        let raw = self.last_trade_price.as_deref().ok_or_else(no_quote)?;
        let last_trade_price = self.parse_decimal("quotes", "last_trade_price", raw)?;

        if last_trade_price <= Decimal::ZERO {
            return Err(no_quote());
        }

        Ok(Quote { last_trade_price })
    }
}
