use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub account_number: String,
    /// Account resource URL, as order bodies reference it.
    pub account_url: String,
    pub buying_power: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSnapshot {
    pub instrument_id: String,
    pub instrument_url: String,
    pub owned_quantity: Decimal,
}

impl PositionSnapshot {
    pub fn is_held(&self) -> bool {
        self.owned_quantity > Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub last_trade_price: Decimal,
}
