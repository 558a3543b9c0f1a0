use common::models::OrderRequest;
use rust_decimal::Decimal;
use thiserror::Error;

/// Expected, policy-driven reasons for not placing an order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("not enough buying power: last trade {price} exceeds allocation {cash_for_buy}")]
    InsufficientBuyingPower {
        price: Decimal,
        cash_for_buy: Decimal,
    },

    #[error("already holding {quantity} shares")]
    AlreadyHoldingPosition { quantity: Decimal },

    #[error("no position held")]
    NoPositionHeld,

    #[error("position of {quantity} shares rounds to zero whole shares")]
    FractionalPositionOnly { quantity: Decimal },

    #[error("sizing yields zero shares at {price} with allocation {cash_for_buy}")]
    ZeroQuantityOrder {
        price: Decimal,
        cash_for_buy: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approved(OrderRequest),
    Rejected(Rejection),
}

impl Decision {
    pub fn order(&self) -> Option<&OrderRequest> {
        match self {
            Self::Approved(order) => Some(order),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Approved(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

impl From<Rejection> for Decision {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}
