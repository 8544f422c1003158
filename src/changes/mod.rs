use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Arc, RwLock},
};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{auth::services::AuthUser, state::AppState};

/// Which table a row-level change touched. Event names on the wire match the
/// notifications clients already listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Products,
    Entries,
    Goals,
}

impl ChangeKind {
    pub fn event_name(self) -> &'static str {
        match self {
            ChangeKind::Products => "products-updated",
            ChangeKind::Entries => "entries-updated",
            ChangeKind::Goals => "goals-updated",
        }
    }
}

/// Per-user fan-out of change notifications. Every successful write publishes
/// here; subscribers hold a broadcast receiver whose drop releases the
/// subscription.
#[derive(Clone, Default)]
pub struct ChangeHub {
    inner: Arc<RwLock<HashMap<Uuid, broadcast::Sender<ChangeKind>>>>,
}

const CHANNEL_CAPACITY: usize = 32;

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<ChangeKind> {
        let mut map = self.inner.write().expect("change hub lock poisoned");
        map.entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub fn publish(&self, user_id: Uuid, kind: ChangeKind) {
        let mut map = self.inner.write().expect("change hub lock poisoned");
        if let Some(tx) = map.get(&user_id) {
            if tx.send(kind).is_err() {
                // Last receiver is gone; forget the channel.
                map.remove(&user_id);
            } else {
                debug!(%user_id, event = kind.event_name(), "change published");
            }
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/changes", get(change_stream))
}

/// GET /changes: SSE stream of this user's change notifications.
#[instrument(skip(state))]
async fn change_stream(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.changes.subscribe(user_id);
    let stream = BroadcastStream::new(rx).filter_map(|item| async move {
        match item {
            Ok(kind) => Some(Ok(Event::default()
                .event(kind.event_name())
                .data(kind.event_name()))),
            // A lagged receiver skipped messages; clients reload on the next
            // event anyway, so drop the error rather than closing the stream.
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_change() {
        let hub = ChangeHub::new();
        let user = Uuid::new_v4();
        let mut rx = hub.subscribe(user);

        hub.publish(user, ChangeKind::Entries);
        assert_eq!(rx.recv().await.unwrap(), ChangeKind::Entries);
    }

    #[tokio::test]
    async fn publish_is_scoped_to_the_owning_user() {
        let hub = ChangeHub::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut alice_rx = hub.subscribe(alice);
        let mut bob_rx = hub.subscribe(bob);

        hub.publish(alice, ChangeKind::Products);
        assert_eq!(alice_rx.recv().await.unwrap(), ChangeKind::Products);
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropped_receiver_releases_the_channel() {
        let hub = ChangeHub::new();
        let user = Uuid::new_v4();
        let rx = hub.subscribe(user);
        drop(rx);

        // First publish after the drop notices there are no receivers left.
        hub.publish(user, ChangeKind::Goals);
        assert!(hub.inner.read().unwrap().get(&user).is_none());
    }

    #[test]
    fn event_names_match_the_documented_contract() {
        assert_eq!(ChangeKind::Products.event_name(), "products-updated");
        assert_eq!(ChangeKind::Entries.event_name(), "entries-updated");
        assert_eq!(ChangeKind::Goals.event_name(), "goals-updated");
    }
}
