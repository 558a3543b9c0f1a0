pub mod account_response;
pub mod instrument_response;
pub mod position_response;
pub mod quote_response;
pub mod robinhood_client;

pub use account_response::{AccountEntry, AccountRecord, AccountsResponse};
pub use instrument_response::{InstrumentEntry, InstrumentsResponse};
pub use position_response::{PositionRecord, PositionResponse};
pub use quote_response::QuoteResponse;
pub use robinhood_client::RobinhoodClient;
