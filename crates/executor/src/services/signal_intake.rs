use anyhow::bail;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    actors::{Actor, ActorType, ControlMessage},
    models::{Intent, OrderConfirmation, OrderRequest, ParseError, Signal, StreamMessage},
};
use market_data::{BrokerageGateway, OrderSubmitter};
use strategy::{Decision, DecisionEngine, Rejection};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::services::execution_service::{Execution, ExecutionService};
use crate::stream::SignalSource;

/// What became of a single stream message.
#[derive(Debug)]
pub enum Outcome {
    Invalid(ParseError),
    Expired,
    Ignored,
    Rejected(Rejection),
    Submitted(OrderConfirmation),
    DryRun(OrderRequest),
    Failed(String),
}

/// Parse, freshness check, decision and execution for one message at a time.
pub struct SignalHandler<G, O> {
    engine: DecisionEngine<G>,
    execution: ExecutionService<O>,
}

pub struct SignalIntakeService<S, G, O> {
    id: Uuid,
    source: S,
    handler: SignalHandler<G, O>,
}

#[async_trait]
impl<S, G, O> Actor for SignalIntakeService<S, G, O>
where
    S: SignalSource,
    G: BrokerageGateway + 'static,
    O: OrderSubmitter + 'static,
{
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::SignalIntakeActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());

        info!(
            "Starting Signal Intake Service (dry run: {})",
            self.handler.execution.is_dry_run()
        );
        self.handler.log_account().await;

        loop {
            match self.source.next_message().await {
                Ok(Some(message)) => {
                    let outcome = self.handler.handle(&message, Utc::now()).await;
                    debug!("Message outcome: {:?}", outcome);
                }
                Ok(None) => {
                    info!("Signal stream closed. Stopping service.");
                    heartbeat_handle.abort();
                    supervisor_tx.send(ControlMessage::Shutdown(self.id)).await?;
                    return Ok(());
                }
                Err(e) if e.is_fatal() => {
                    heartbeat_handle.abort();
                    supervisor_tx
                        .send(ControlMessage::Fatal(self.id, e.to_string()))
                        .await?;
                    bail!(e);
                }
                Err(e) => {
                    heartbeat_handle.abort();
                    supervisor_tx
                        .send(ControlMessage::Error(
                            self.id,
                            format!("{:?}: {}", self.name(), e),
                        ))
                        .await?;
                    bail!(e);
                }
            }
        }
    }
}

impl<S, G, O> SignalIntakeService<S, G, O>
where
    S: SignalSource,
    G: BrokerageGateway,
    O: OrderSubmitter,
{
    pub fn new(source: S, engine: DecisionEngine<G>, execution: ExecutionService<O>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            handler: SignalHandler::new(engine, execution),
        }
    }

    pub fn handler(&self) -> &SignalHandler<G, O> {
        &self.handler
    }
}

impl<G, O> SignalHandler<G, O>
where
    G: BrokerageGateway,
    O: OrderSubmitter,
{
    pub fn new(engine: DecisionEngine<G>, execution: ExecutionService<O>) -> Self {
        Self { engine, execution }
    }

    async fn log_account(&self) {
        match self.engine.gateway().fetch_account().await {
            Ok(account) => info!(
                "Brokerage account {} connected. Buying power: {}",
                account.account_number, account.buying_power
            ),
            Err(e) => warn!("Failed to fetch account info: {}", e),
        }
    }

    /// Runs one message through parse, freshness, decision and submission.
    /// Nothing that goes wrong here leaves this function.
    pub async fn handle(&self, message: &StreamMessage, now: DateTime<Utc>) -> Outcome {
        let key = message.key_lossy();
        info!("Received: {} -> {}", key, message.value_lossy());

        let signal = match Signal::parse(message) {
            Ok(signal) => signal,
            Err(e) => {
                warn!("{}: dropping unparsable signal: {}", key, e);
                return Outcome::Invalid(e);
            }
        };

        if !signal.is_fresh(now) {
            warn!(
                "{}: signal from {} has expired, ignoring.",
                signal.symbol, signal.signaled_at
            );
            return Outcome::Expired;
        }

        let decision = match signal.intent {
            Intent::Buy => self.engine.decide_buy(&signal.symbol).await,
            Intent::Sell => self.engine.decide_sell(&signal.symbol).await,
            Intent::Unknown => {
                debug!("{}: no action for signal", signal.symbol);
                return Outcome::Ignored;
            }
        };

        let order = match decision {
            Ok(Decision::Approved(order)) => order,
            Ok(Decision::Rejected(rejection)) => {
                info!("{}: skipping order, {}", signal.symbol, rejection);
                return Outcome::Rejected(rejection);
            }
            Err(e) => {
                error!("{}: decision abandoned: {}", signal.symbol, e);
                return Outcome::Failed(e.to_string());
            }
        };

        match self.execution.execute(order).await {
            Ok(Execution::Submitted(confirmation)) => Outcome::Submitted(confirmation),
            Ok(Execution::Skipped(order)) => Outcome::DryRun(order),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::TransportError;
    use chrono::{Duration, TimeZone};
    use common::models::{AccountSnapshot, PositionSnapshot, Quote, Side};
    use market_data::{GatewayError, SubmissionError};
    use mockall::mock;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::Arc;

    mock! {
        pub Gateway {}

        #[async_trait]
        impl BrokerageGateway for Gateway {
            async fn fetch_account(&self) -> Result<AccountSnapshot, GatewayError>;
            async fn resolve_instrument_id(&self, symbol: &str) -> Result<String, GatewayError>;
            async fn fetch_position(
                &self,
                account_number: &str,
                instrument_id: &str,
            ) -> Result<PositionSnapshot, GatewayError>;
            async fn fetch_quote(&self, symbol: &str) -> Result<Quote, GatewayError>;
        }
    }

    mock! {
        pub Submitter {}

        #[async_trait]
        impl OrderSubmitter for Submitter {
            async fn submit(&self, order: &OrderRequest) -> Result<OrderConfirmation, SubmissionError>;
        }
    }

    struct ScriptedSource(VecDeque<Result<Option<StreamMessage>, TransportError>>);

    #[async_trait]
    impl SignalSource for ScriptedSource {
        async fn next_message(&mut self) -> Result<Option<StreamMessage>, TransportError> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    type Service = SignalIntakeService<ScriptedSource, MockGateway, MockSubmitter>;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()
    }

    fn message(symbol: &str, signal: &str, at: DateTime<Utc>) -> StreamMessage {
        let value = format!(
            r#"{{"signal":"{}","at":"{}"}}"#,
            signal,
            at.format("%Y-%m-%d %H:%M:%S %z")
        );
        StreamMessage::new(symbol.as_bytes().to_vec(), value.into_bytes())
    }

    fn gateway(buying_power: Decimal, price: Decimal, owned: Decimal) -> MockGateway {
        let mut gw = MockGateway::new();
        gw.expect_fetch_account().returning(move || {
            Ok(AccountSnapshot {
                account_number: "5RY82436".to_string(),
                account_url: "https://api.robinhood.com/accounts/5RY82436/".to_string(),
                buying_power,
            })
        });
        gw.expect_fetch_quote().returning(move |_| {
            Ok(Quote {
                last_trade_price: price,
            })
        });
        gw.expect_resolve_instrument_id()
            .returning(|symbol| Ok(format!("inst-{}", symbol.to_lowercase())));
        gw.expect_fetch_position().returning(move |_, instrument| {
            Ok(PositionSnapshot {
                instrument_id: instrument.to_string(),
                instrument_url: format!("https://api.robinhood.com/instruments/{}/", instrument),
                owned_quantity: owned,
            })
        });
        gw
    }

    fn untouched_gateway() -> MockGateway {
        MockGateway::new()
    }

    fn accepting_submitter(times: usize) -> MockSubmitter {
        let mut submitter = MockSubmitter::new();
        submitter.expect_submit().times(times).returning(|_| {
            Ok(OrderConfirmation {
                id: Some("ord-1".to_string()),
                state: Some("unconfirmed".to_string()),
            })
        });
        submitter
    }

    fn service(
        source: Vec<Result<Option<StreamMessage>, TransportError>>,
        gw: MockGateway,
        submitter: MockSubmitter,
        dry_run: bool,
    ) -> Service {
        SignalIntakeService::new(
            ScriptedSource(source.into()),
            DecisionEngine::new(Arc::new(gw)),
            ExecutionService::new(Arc::new(submitter), dry_run),
        )
    }

    #[tokio::test]
    async fn test_fresh_buy_places_one_order() {
        let mut submitter = MockSubmitter::new();
        submitter
            .expect_submit()
            .withf(|order| {
                order.side == Side::Buy
                    && order.symbol == "XYZ"
                    && order.quantity == dec!(6)
                    && order.price.map(|p| p.to_string()) == Some("50.00".to_string())
                    && order.instrument_ref == "https://api.robinhood.com/instruments/inst-xyz/"
            })
            .times(1)
            .returning(|_| Ok(OrderConfirmation::default()));

        let svc = service(
            vec![],
            gateway(dec!(1000.00), dec!(50.00), dec!(0)),
            submitter,
            false,
        );
        let outcome = svc
            .handler()
            .handle(&message("XYZ", "buy", now() - Duration::hours(2)), now())
            .await;

        assert!(matches!(outcome, Outcome::Submitted(_)));
    }

    #[tokio::test]
    async fn test_sell_places_whole_position() {
        let mut submitter = MockSubmitter::new();
        submitter
            .expect_submit()
            .withf(|order| order.side == Side::Sell && order.quantity == dec!(4) && order.price.is_none())
            .times(1)
            .returning(|_| Ok(OrderConfirmation::default()));

        let svc = service(vec![], gateway(dec!(0), dec!(50), dec!(4)), submitter, false);
        let outcome = svc
            .handler()
            .handle(&message("XYZ", "SELL", now() - Duration::minutes(5)), now())
            .await;

        assert!(matches!(outcome, Outcome::Submitted(_)));
    }

    #[tokio::test]
    async fn test_expired_signal_touches_nothing() {
        let svc = service(vec![], untouched_gateway(), accepting_submitter(0), false);

        let outcome = svc
            .handler()
            .handle(&message("XYZ", "buy", now() - Duration::hours(24)), now())
            .await;
        assert!(matches!(outcome, Outcome::Expired));
    }

    #[tokio::test]
    async fn test_signal_just_inside_window_is_processed() {
        let svc = service(
            vec![],
            gateway(dec!(1000), dec!(50), dec!(0)),
            accepting_submitter(1),
            false,
        );

        let at = now() - Duration::hours(24) + Duration::seconds(1);
        let outcome = svc.handler().handle(&message("XYZ", "buy", at), now()).await;
        assert!(matches!(outcome, Outcome::Submitted(_)));
    }

    #[tokio::test]
    async fn test_unknown_intent_is_ignored() {
        let svc = service(vec![], untouched_gateway(), accepting_submitter(0), false);

        let outcome = svc
            .handler()
            .handle(&message("XYZ", "hold", now() - Duration::hours(1)), now())
            .await;
        assert!(matches!(outcome, Outcome::Ignored));
    }

    #[tokio::test]
    async fn test_malformed_message_is_invalid() {
        let svc = service(vec![], untouched_gateway(), accepting_submitter(0), false);
        let bad = StreamMessage::new(b"XYZ".to_vec(), b"{not json".to_vec());

        let outcome = svc.handler().handle(&bad, now()).await;
        assert!(matches!(outcome, Outcome::Invalid(ParseError::Payload(_))));
    }

    #[tokio::test]
    async fn test_rejection_is_not_a_failure() {
        let svc = service(
            vec![],
            gateway(dec!(1000), dec!(50), dec!(2)),
            accepting_submitter(0),
            false,
        );

        let outcome = svc
            .handler()
            .handle(&message("XYZ", "buy", now() - Duration::hours(1)), now())
            .await;
        assert!(matches!(
            outcome,
            Outcome::Rejected(Rejection::AlreadyHoldingPosition { .. })
        ));
    }

    #[tokio::test]
    async fn test_gateway_error_is_contained() {
        let mut gw = MockGateway::new();
        gw.expect_fetch_account().returning(|| {
            Err(GatewayError::Status {
                endpoint: "accounts",
                status: 502,
            })
        });

        let svc = service(vec![], gw, accepting_submitter(0), false);
        let outcome = svc
            .handler()
            .handle(&message("XYZ", "sell", now() - Duration::hours(1)), now())
            .await;
        assert!(matches!(outcome, Outcome::Failed(ref reason) if reason.contains("502")));
    }

    #[tokio::test]
    async fn test_submission_error_is_contained() {
        let mut submitter = MockSubmitter::new();
        submitter.expect_submit().times(1).returning(|_| {
            Err(SubmissionError::Status {
                status: 422,
                body: "market closed".to_string(),
            })
        });

        let svc = service(vec![], gateway(dec!(1000), dec!(50), dec!(0)), submitter, false);
        let outcome = svc
            .handler()
            .handle(&message("XYZ", "buy", now() - Duration::hours(1)), now())
            .await;
        assert!(matches!(outcome, Outcome::Failed(ref reason) if reason.contains("422")));
    }

    #[tokio::test]
    async fn test_dry_run_decides_without_submitting() {
        let svc = service(
            vec![],
            gateway(dec!(1000), dec!(50), dec!(0)),
            accepting_submitter(0),
            true,
        );

        let outcome = svc
            .handler()
            .handle(&message("XYZ", "buy", now() - Duration::hours(1)), now())
            .await;
        assert!(matches!(outcome, Outcome::DryRun(ref order) if order.quantity == dec!(6)));
    }

    #[tokio::test]
    async fn test_run_survives_bad_message_and_stops_on_close() {
        let fresh = Utc::now() - Duration::hours(1);
        let source = vec![
            Ok(Some(StreamMessage::new(b"XYZ".to_vec(), b"garbage".to_vec()))),
            Ok(Some(message("XYZ", "buy", fresh))),
        ];

        let mut svc = service(
            source,
            gateway(dec!(1000), dec!(50), dec!(0)),
            accepting_submitter(1),
            false,
        );
        let (tx, mut rx) = mpsc::channel(64);

        svc.run(tx).await.unwrap();

        let mut saw_shutdown = false;
        while let Ok(msg) = rx.try_recv() {
            if msg == ControlMessage::Shutdown(svc.id()) {
                saw_shutdown = true;
            }
        }
        assert!(saw_shutdown);
    }

    #[tokio::test]
    async fn test_run_reports_fatal_stream_error() {
        let source = vec![Err(TransportError::Spawn {
            program: "kafka-console-consumer".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })];

        let mut svc = service(
            source,
            gateway(dec!(1000), dec!(50), dec!(0)),
            accepting_submitter(0),
            false,
        );
        let (tx, mut rx) = mpsc::channel(64);

        assert!(svc.run(tx).await.is_err());

        let mut saw_fatal = false;
        while let Ok(msg) = rx.try_recv() {
            if matches!(msg, ControlMessage::Fatal(id, _) if id == svc.id()) {
                saw_fatal = true;
            }
        }
        assert!(saw_fatal);
    }

    #[tokio::test]
    async fn test_run_reports_read_error_for_restart() {
        let source = vec![Err(TransportError::Read(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe,
        )))];

        let mut svc = service(
            source,
            gateway(dec!(1000), dec!(50), dec!(0)),
            accepting_submitter(0),
            false,
        );
        let (tx, mut rx) = mpsc::channel(64);

        assert!(svc.run(tx).await.is_err());

        let mut saw_error = false;
        while let Ok(msg) = rx.try_recv() {
            if matches!(msg, ControlMessage::Error(id, _) if id == svc.id()) {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }
}
