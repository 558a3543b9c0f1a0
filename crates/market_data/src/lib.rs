pub mod error;
pub mod remote;
pub mod traits;

pub use error::{GatewayError, SubmissionError};
pub use remote::RobinhoodClient;
pub use traits::{BrokerageGateway, OrderSubmitter};
