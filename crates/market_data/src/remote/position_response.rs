use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{error::GatewayError, traits::RemoteResponse};

#[derive(Debug, Deserialize)]
pub struct PositionResponse {
    #[serde(rename(deserialize = "instrument"))]
    pub instrument_url: String,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRecord {
    pub instrument_url: String,
    pub quantity: Decimal,
}

impl RemoteResponse<PositionRecord> for PositionResponse {
    fn to_model(&self) -> Result<PositionRecord, GatewayError> {
        Ok(PositionRecord {
            instrument_url: self.instrument_url.clone(),
            quantity: self.parse_decimal("positions", "quantity", &self.quantity)?,
        })
    }
}
