use std::str::FromStr;

use async_trait::async_trait;
use common::models::{AccountSnapshot, OrderConfirmation, OrderRequest, PositionSnapshot, Quote};
use rust_decimal::Decimal;

use crate::error::{GatewayError, SubmissionError};

pub trait RemoteResponse<T> {
    fn to_model(&self) -> Result<T, GatewayError>;

    /// Brokerage numbers arrive as strings; parse them without going through floats.
    fn parse_decimal(&self, endpoint: &'static str, field: &str, raw: &str) -> Result<Decimal, GatewayError> {
        Decimal::from_str(raw.trim()).map_err(|e| {
            GatewayError::malformed(endpoint, format!("field {} = {:?}: {}", field, raw, e))
        })
    }
}

/// Read side of the brokerage. Every call goes to the remote; nothing is cached.
#[async_trait]
pub trait BrokerageGateway: Send + Sync {
    async fn fetch_account(&self) -> Result<AccountSnapshot, GatewayError>;

    async fn resolve_instrument_id(&self, symbol: &str) -> Result<String, GatewayError>;

    /// A position that was never opened comes back with zero quantity.
    async fn fetch_position(
        &self,
        account_number: &str,
        instrument_id: &str,
    ) -> Result<PositionSnapshot, GatewayError>;

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, GatewayError>;
}

#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    async fn submit(&self, order: &OrderRequest) -> Result<OrderConfirmation, SubmissionError>;
}
