use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{error::GatewayError, traits::RemoteResponse};

#[derive(Debug, Deserialize)]
pub struct AccountsResponse {
    #[serde(default)]
    pub results: Vec<AccountEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AccountEntry {
    pub account_number: String,
    pub buying_power: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub account_number: String,
    pub buying_power: Decimal,
}

impl RemoteResponse<AccountRecord> for AccountEntry {
    fn to_model(&self) -> Result<AccountRecord, GatewayError> {
        Ok(AccountRecord {
            account_number: self.account_number.clone(),
            buying_power: self.parse_decimal("accounts", "buying_power", &self.buying_power)?,
        })
    }
}
