use std::{collections::HashMap, time::Duration};
use tracing::{error, info, warn};

use anyhow::bail;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};
use uuid::Uuid;

use crate::actors::{Actor, ActorType, ControlMessage};

pub type ActorFactory = Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

pub struct Supervisor {
    actor_factories: HashMap<ActorType, ActorFactory>,
    live_ids: HashMap<Uuid, ActorType>,
    pulses: HashMap<ActorType, Instant>,
    handles: HashMap<ActorType, JoinHandle<()>>,
    check_interval: Duration,
    dead_timeout: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(1), Duration::from_secs(3))
    }

    pub fn with_timeouts(check_interval: Duration, dead_timeout: Duration) -> Self {
        Self {
            actor_factories: HashMap::new(),
            live_ids: HashMap::new(),
            pulses: HashMap::new(),
            handles: HashMap::new(),
            check_interval,
            dead_timeout,
        }
    }

    pub fn register_actor(&mut self, actor_type: ActorType, factory: ActorFactory) {
        self.actor_factories.insert(actor_type, factory);
    }

    /// Runs until every actor has shut down, or until one reports a fatal error.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let mut check_interval = time::interval(self.check_interval);

        let (supervisor_tx, mut supervisor_rx) = mpsc::channel::<ControlMessage>(512);

        let actors: Vec<ActorType> = self.actor_factories.keys().copied().collect();
        if actors.is_empty() {
            warn!("No actors registered, nothing to supervise.");
            return Ok(());
        }

        actors.into_iter().for_each(|actor| {
            self.spawn_actor(actor, supervisor_tx.clone());
        });

        loop {
            tokio::select! {
                biased;

                Some(msg) = supervisor_rx.recv() => {
                    match msg {
                        ControlMessage::Heartbeat(id) => {
                            if let Some(actor_type) = self.live_ids.get(&id) {
                                self.pulses.insert(*actor_type, Instant::now());
                            }
                        }
                        ControlMessage::Shutdown(id) => {
                            let Some(actor_type) = self.live_ids.remove(&id) else {
                                continue;
                            };
                            info!("{:?} is shutting down gracefully.", actor_type);
                            self.pulses.remove(&actor_type);
                            self.handles.remove(&actor_type);

                            if self.handles.is_empty() {
                                info!("All actors stopped.");
                                return Ok(());
                            }
                        }
                        ControlMessage::Error(id, error_msg) => {
                            let actor_type = self.live_ids.get(&id).copied();
                            error!("Actor {:?} reported error: {}", actor_type, error_msg);
                        }
                        ControlMessage::Fatal(id, error_msg) => {
                            let actor_type = self.live_ids.get(&id).copied();
                            error!("Actor {:?} hit a fatal error: {}", actor_type, error_msg);
                            self.abort_all();
                            bail!("{:?} failed: {}", actor_type, error_msg);
                        }
                    }
                }

                _ = check_interval.tick() => {
                    let dead_timeout = Instant::now() - self.dead_timeout;

                    let dead_actors: Vec<ActorType> = self
                        .pulses
                        .iter()
                        .filter(|(actor_type, pulse)| {
                            **pulse < dead_timeout
                                || self
                                    .handles
                                    .get(actor_type)
                                    .is_none_or(|handle| handle.is_finished())
                        })
                        .map(|(actor_type, _)| *actor_type)
                        .collect();

                    for actor_type in dead_actors {
                        warn!("{:?} is unresponsive or exited! Restarting.", actor_type);
                        if let Some(handle) = self.handles.remove(&actor_type) {
                            handle.abort();
                        }
                        self.live_ids.retain(|_, t| *t != actor_type);
                        self.spawn_actor(actor_type, supervisor_tx.clone());
                    }
                }
            }
        }
    }

    fn abort_all(&mut self) {
        self.handles.drain().for_each(|(_, handle)| handle.abort());
        self.pulses.clear();
        self.live_ids.clear();
    }

    fn spawn_actor(&mut self, actor_type: ActorType, tx: mpsc::Sender<ControlMessage>) {
        let Some(factory) = self.actor_factories.get(&actor_type) else {
            return;
        };
        let mut new_actor = factory();
        self.live_ids.insert(new_actor.id(), actor_type);

        let new_actor_handle = tokio::spawn(async move {
            if let Err(e) = new_actor.run(tx).await {
                error!("Actor {:?} crashed: {}", actor_type, e);
            }
        });
        self.handles.insert(actor_type, new_actor_handle);
        self.pulses.insert(actor_type, Instant::now());
    }
}
