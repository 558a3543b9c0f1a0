pub mod account;
pub mod message;
pub mod order;
pub mod signal;

pub use account::{AccountSnapshot, PositionSnapshot, Quote};
pub use message::StreamMessage;
pub use order::{OrderConfirmation, OrderRequest, Side, round_to_cents, round_to_whole};
pub use signal::{Intent, ParseError, Signal};
