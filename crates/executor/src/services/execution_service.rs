use std::sync::Arc;

use common::models::{OrderConfirmation, OrderRequest};
use market_data::{OrderSubmitter, SubmissionError};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    Submitted(OrderConfirmation),
    /// Dry-run mode: the order was approved but never sent.
    Skipped(OrderRequest),
}

pub struct ExecutionService<O> {
    submitter: Arc<O>,
    dry_run: bool,
}

impl<O: OrderSubmitter> ExecutionService<O> {
    pub fn new(submitter: Arc<O>, dry_run: bool) -> Self {
        Self { submitter, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Sends the order exactly once. A failed submission is returned, never retried.
    pub async fn execute(&self, order: OrderRequest) -> Result<Execution, SubmissionError> {
        if self.dry_run {
            warn!("DRY RUN, not placing order: {}", order);
            return Ok(Execution::Skipped(order));
        }

        match self.submitter.submit(&order).await {
            Ok(confirmation) => {
                info!(
                    "ORDER PLACED: {} ID={} State={}",
                    order,
                    confirmation.id.as_deref().unwrap_or("-"),
                    confirmation.state.as_deref().unwrap_or("-")
                );
                Ok(Execution::Submitted(confirmation))
            }
            Err(e) => {
                error!("ORDER FAILED: {}: {}", order, e);
                Err(e)
            }
        }
    }
}
