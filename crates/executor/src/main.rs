use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{debug, info};

use common::config::BotConfig;
use common::logger;
use market_data::RobinhoodClient;
use strategy::DecisionEngine;

use crate::actors::{Actor, ActorType, supervisor::Supervisor};
use crate::services::execution_service::ExecutionService;
use crate::services::signal_intake::SignalIntakeService;
use crate::stream::KafkaConsoleSource;

mod actors;
mod services;
mod stream;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let config = Arc::new(BotConfig::from_env()?);
    info!("Loaded configuration: {:?}", config);

    let client = Arc::new(RobinhoodClient::new(&config)?);

    let mut supervisor = Supervisor::new();

    let config_for_intake = config.clone();
    supervisor.register_actor(
        ActorType::SignalIntakeActor,
        Box::new(move || -> Box<dyn Actor> {
            Box::new(SignalIntakeService::new(
                KafkaConsoleSource::new(&config_for_intake),
                DecisionEngine::new(client.clone()),
                ExecutionService::new(client.clone(), config_for_intake.dry_run),
            ))
        }),
    );

    supervisor.start().await?;
    info!("System shut down.");
    Ok(())
}
