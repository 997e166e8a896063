//! Demo composition root for the hybrid sync service.
//!
//! Wires a file-backed local store, an in-process fake remote, and the
//! connectivity monitor, then walks through the save / delete / status
//! flows. Run with:
//!
//! ```text
//! SATCHEL_STORAGE_DIR=/tmp/satchel-demo cargo run -p satchel-client --example demo
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use satchel_client::{
    Collection, Config, ConnectivityMonitor, FileBackend, HybridSync, RemoteDatabase, RemoteError,
    SyncRecord,
};
use satchel_engine::{RecordId, RemoteId};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Chat {
    id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_id: Option<RemoteId>,
    title: String,
    #[serde(with = "satchel_engine::timestamp")]
    created_at: DateTime<Utc>,
}

impl SyncRecord for Chat {
    fn id(&self) -> &RecordId {
        &self.id
    }
    fn remote_id(&self) -> Option<&RemoteId> {
        self.remote_id.as_ref()
    }
    fn set_remote_id(&mut self, remote_id: RemoteId) {
        self.remote_id = Some(remote_id);
    }
}

/// Stand-in for the application's remote data-access layer.
#[derive(Debug, Default)]
struct DemoRemote {
    counter: AtomicUsize,
}

impl RemoteDatabase for DemoRemote {
    async fn upsert(
        &self,
        collection: &str,
        payload: serde_json::Value,
    ) -> Result<RemoteId, RemoteError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        tracing::info!(collection, %payload, "demo remote accepted record");
        Ok(format!("srv-{n}"))
    }

    async fn delete_by_id(&self, remote_id: &RemoteId) -> Result<bool, RemoteError> {
        tracing::info!(%remote_id, "demo remote deleted record");
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "satchel_client=debug,demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(storage_dir = %config.storage_dir.display(), context_id = %config.context_id, "starting demo");

    let monitor = ConnectivityMonitor::new(true);
    let sync = HybridSync::builder(FileBackend::new(&config.storage_dir)?)
        .remote(Arc::new(DemoRemote::default()))
        .monitor(monitor.clone())
        .collections(config.collections.clone())
        .build();

    // Feature code registers before the initial load completes.
    sync.on_ready(|| tracing::info!("collections are readable now"));
    sync.load();

    // Save two chats; both are pushed in the background.
    let chats: Collection<Chat> = vec![
        Chat {
            id: "chat_1".into(),
            remote_id: None,
            title: "Photosynthesis questions".into(),
            created_at: Utc::now(),
        },
        Chat {
            id: "chat_2".into(),
            remote_id: None,
            title: "French vocab drill".into(),
            created_at: Utc::now(),
        },
    ]
    .into();
    sync.save_data("chats", &chats);
    sync.flush_remote().await;

    let stored: Collection<Chat> = sync.read_data("chats");
    for chat in &stored {
        tracing::info!(id = %chat.id, remote_id = ?chat.remote_id, title = %chat.title, "stored chat");
    }

    // Go offline and delete: local removal is immediate, remote untouched.
    monitor.set_online(false);
    let outcome = sync.delete_record::<Chat>("chats", "chat_2");
    tracing::info!(?outcome, "offline delete");

    let status = sync.get_sync_status();
    tracing::info!(
        is_online = status.is_online,
        last_synced_at = ?status.last_synced_at,
        pending = status.pending_count,
        "sync status"
    );

    sync.flush_remote().await;
    Ok(())
}
