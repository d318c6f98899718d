// service/poller.rs
use std::sync::Arc;

use tokio::time::{sleep, Duration};

use crate::{handler::router::UpdateRouter, telegram::client::TelegramClient};

/// Long-polls the Bot API forever. Each event runs on its own task so one
/// slow conversation does not hold up the others.
pub async fn start_update_poller(client: Arc<TelegramClient>, router: Arc<UpdateRouter>) {
    let mut offset = 0;
    tracing::info!("Update poller started");

    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::error!("Polling for updates failed: {}", e);
                sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let update_id = update.update_id;

            match update.into_event() {
                Some(event) => {
                    let router = router.clone();
                    tokio::spawn(async move {
                        router.dispatch(event).await;
                    });
                }
                None => tracing::debug!("Ignoring update {}", update_id),
            }
        }
    }
}
