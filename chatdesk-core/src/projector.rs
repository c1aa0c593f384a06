//! src/projector.rs
//!
//! Spawns a task that subscribes to the EventBus and mirrors session state
//! transitions into the persisted account row. Pure translation: no
//! business logic lives here.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use chatdesk_common::models::AccountStatus;
use chatdesk_common::traits::repository_traits::AccountRepo;

use crate::eventbus::{DeskEvent, EventBus};

/// Subscribes to the bus and persists `ConnectionChanged` / `QrCodeIssued`
/// into the account's status/qrcode/retries columns. Returns a
/// `JoinHandle<()>` so shutdown logic (and tests) can await its exit.
pub async fn spawn_status_projector(
    event_bus: &EventBus,
    account_repo: Arc<dyn AccountRepo>,
) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe(None).await;
    let mut shutdown_rx = event_bus.shutdown_rx.clone();

    tokio::spawn(async move {
        info!("Status projector task started");
        loop {
            tokio::select! {
                biased;
                Ok(_) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Status projector shutting down");
                        break;
                    }
                },
                maybe_event = rx.recv() => {
                    match maybe_event {
                        Some(event) => project(account_repo.as_ref(), &event).await,
                        None => {
                            info!("Status projector channel closed");
                            break;
                        }
                    }
                },
            }
        }
    })
}

async fn project(repo: &dyn AccountRepo, event: &DeskEvent) {
    let result = match event {
        DeskEvent::ConnectionChanged {
            account_id,
            status,
            retries,
            ..
        } => {
            repo.update_connection(*account_id, *status, None, *retries as i32)
                .await
        }
        DeskEvent::QrCodeIssued {
            account_id,
            payload,
        } => {
            repo.update_connection(*account_id, AccountStatus::QrCode, Some(payload), 0)
                .await
        }
        _ => Ok(()),
    };

    if let Err(e) = result {
        error!("Status projector failed to persist {}: {:?}", event.event_type(), e);
    }
}
