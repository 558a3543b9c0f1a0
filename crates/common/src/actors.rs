use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorType {
    SignalIntakeActor,
}

/// Messages sent from Actors to the Supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    Heartbeat(Uuid),
    Shutdown(Uuid),
    Error(Uuid, String),
    /// Unrecoverable; the supervisor stops everything.
    Fatal(Uuid, String),
}

/// Owns the heartbeat task; dropping it stops the pulse, including when `run` unwinds.
pub struct HeartbeatGuard(JoinHandle<()>);

impl HeartbeatGuard {
    pub fn abort(&self) {
        self.0.abort();
    }
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// The trait that all restartable services must implement
#[async_trait]
pub trait Actor: Send {
    /// The unique name of the actor (e.g., "SignalIntake")
    fn name(&self) -> ActorType;

    fn id(&self) -> Uuid;

    /// The main loop of the actor.
    /// It must periodically send `ControlMessage::Heartbeat` to the supervisor.
    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()>;

    fn spawn_heartbeat(&self, supervisor_tx: mpsc::Sender<ControlMessage>) -> HeartbeatGuard {
        let id = self.id();
        HeartbeatGuard(tokio::spawn(async move {
            loop {
                if supervisor_tx
                    .send(ControlMessage::Heartbeat(id))
                    .await
                    .is_err()
                {
                    break;
                }
                tokio::time::sleep(HEARTBEAT_INTERVAL).await;
            }
        }))
    }
}
