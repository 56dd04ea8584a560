// state module: AppState, initialization, request dispatch, and re-exports of
// the per-entity mutation handlers.

use anyhow::{Result, bail};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, broadcast};
use tracing::{debug, error, info, warn};

use crate::{
    config::AppConfig,
    error::BillingResult,
    events::{Dispatch, Request, ServerMessage, ERROR_EVENT},
};

mod blob;
mod clients;
mod consumption;
mod groups;
mod periods;
mod prorations;
mod recalc;
mod settings;
mod store;

pub use blob::*;
pub use clients::*;
pub use consumption::*;
pub use groups::*;
pub use periods::*;
pub use prorations::*;
pub use recalc::*;
pub use settings::*;
pub use store::*;

/// Billing options that are not part of any single request.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillingPolicy {
    pub round_to_tens_default: bool,
}

/// Outcome of a successful mutation: which collections to broadcast and which
/// signals go back to the requester only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    pub broadcast: Vec<Collection>,
    pub replies: Vec<ServerMessage>,
}

impl Effects {
    pub fn broadcast(collections: &[Collection]) -> Self {
        Self {
            broadcast: collections.to_vec(),
            replies: Vec::new(),
        }
    }

    pub fn replies(replies: Vec<ServerMessage>) -> Self {
        Self {
            broadcast: Vec::new(),
            replies,
        }
    }

    pub fn with_reply(mut self, reply: ServerMessage) -> Self {
        self.replies.push(reply);
        self
    }
}

/// Shared application state. The store mutex serializes every request, so a
/// mutation runs to completion (validate, compute, recalculate, persist,
/// broadcast) before the next one starts.
pub struct AppState {
    store: Arc<Mutex<EntityStore>>,
    events: broadcast::Sender<ServerMessage>,
    policy: BillingPolicy,
}

pub fn init_state(config: &AppConfig) -> Result<AppState> {
    if config.data_dir.exists() && !config.data_dir.is_dir() {
        bail!("DATA_DIR {} is not a directory", config.data_dir.display());
    }
    info!(data_dir = %config.data_dir.display(), "loading collections");
    let blobs = JsonFileStore::new(config.data_dir.clone());
    let state = AppState::from_blobs(
        Box::new(blobs),
        config.broadcast_capacity,
        BillingPolicy {
            round_to_tens_default: config.round_to_tens_default,
        },
    );
    Ok(state)
}

impl AppState {
    /// Loads every collection and repairs derived fields before serving.
    pub fn from_blobs(
        blobs: Box<dyn BlobStore>,
        broadcast_capacity: usize,
        policy: BillingPolicy,
    ) -> Self {
        let mut store = EntityStore::load(blobs);
        recalculate(&mut store);
        info!(
            clients = store.clients.len(),
            periods = store.periods.len(),
            consumption = store.consumption.len(),
            prorations = store.prorations.len(),
            groups = store.groups.len(),
            "collections loaded"
        );
        Self::new(store, broadcast_capacity, policy)
    }

    pub fn new(store: EntityStore, broadcast_capacity: usize, policy: BillingPolicy) -> Self {
        let (events, _) = broadcast::channel(broadcast_capacity.max(1));
        Self {
            store: Arc::new(Mutex::new(store)),
            events,
            policy,
        }
    }

    pub async fn store(&self) -> MutexGuard<'_, EntityStore> {
        self.store.lock().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }

    /// Current contents of the given collections as outgoing frames.
    pub async fn snapshot(&self, collections: &[Collection]) -> Vec<ServerMessage> {
        let store = self.store.lock().await;
        snapshot_messages(&store, collections)
    }

    /// Decodes a raw frame and handles it. Undecodable frames produce an error reply.
    pub async fn handle_text(&self, text: &str) -> Dispatch {
        match serde_json::from_str::<Request>(text) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                warn!(error = %err, "rejected undecodable frame");
                Dispatch::reply(ServerMessage::error(
                    ERROR_EVENT,
                    format!("Solicitud inválida: {err}"),
                ))
            }
        }
    }

    /// Applies a request and publishes its broadcasts to every socket before the
    /// store lock is released. The returned dispatch still lists the broadcasts;
    /// only its replies are left for the caller to deliver.
    pub async fn handle(&self, request: Request) -> Dispatch {
        let name = request.name();
        let error_event = request.error_event();
        let mut store = self.store.clone().lock_owned().await;
        let events = self.events.clone();
        let policy = self.policy;

        // Blob writes are blocking file I/O. The guard moves into the blocking
        // task so no other request observes the store until the broadcast is out.
        let handled = tokio::task::spawn_blocking(move || {
            let dispatch = match apply(&mut store, request, policy) {
                Ok(effects) => {
                    debug!(request = name, broadcast = effects.broadcast.len(), "request handled");
                    Dispatch {
                        broadcasts: snapshot_messages(&store, &effects.broadcast),
                        replies: effects.replies,
                    }
                }
                Err(err) => {
                    warn!(request = name, kind = err.kind(), error = %err, "request rejected");
                    Dispatch::reply(ServerMessage::error(error_event, err.to_string()))
                }
            };
            publish(&events, &dispatch);
            dispatch
        })
        .await;

        handled.unwrap_or_else(|err| {
            error!(request = name, error = %err, "request handler aborted");
            Dispatch::reply(ServerMessage::error(error_event, "Error interno del servidor"))
        })
    }
}

/// Sends broadcast frames to every connected socket.
fn publish(events: &broadcast::Sender<ServerMessage>, dispatch: &Dispatch) {
    for message in &dispatch.broadcasts {
        // No receivers simply means nobody is connected.
        let _ = events.send(message.clone());
    }
}

fn snapshot_messages(store: &EntityStore, collections: &[Collection]) -> Vec<ServerMessage> {
    collections
        .iter()
        .map(|collection| ServerMessage::new(collection.key(), store.snapshot(*collection)))
        .collect()
}

/// Routes a request to its mutation handler.
pub fn apply(store: &mut EntityStore, request: Request, policy: BillingPolicy) -> BillingResult<Effects> {
    match request {
        Request::GetInitialData => Ok(Effects::replies(snapshot_messages(
            store,
            &Collection::SNAPSHOT,
        ))),
        Request::SaveClient(client) => save_client(store, client),
        Request::DeleteClient(id) => delete_client(store, &id),
        Request::SavePeriod(period) => save_period(store, period),
        Request::DeletePeriod(id) => delete_period(store, &id),
        Request::SaveConsumption(input) => save_consumption(store, input, policy),
        Request::DeleteConsumption(id) => delete_consumption(store, &id),
        Request::SaveProRation(input) => save_proration(store, input),
        Request::DeleteProRation(id) => delete_proration(store, &id),
        Request::SaveGroup(group) => save_group(store, group),
        Request::DeleteGroup(id) => delete_group(store, &id),
        Request::GetDefaultValues => Ok(get_default_values(store)),
        Request::SaveDefaultValues(values) => Ok(save_default_values(store, values)),
        Request::ApplyDefaultValues(values) => Ok(apply_default_values(values)),
        Request::Login(login) => verify_login(store, &login),
        Request::ChangeCredentials(change) => change_credentials(store, change),
    }
}
