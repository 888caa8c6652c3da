use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
#[serde(tag = "event")]
pub enum Event {
    KnockoutCreated {
        tournament_id: u32,
        players: Vec<u32>,
    },
    TournamentCompleted {
        tournament_id: u32,
    },
    StatsRecalculated {
        players: usize,
    },
}

/// Posts events to an optional webhook. Delivery is best effort: failures are
/// logged and never reach the caller.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    url: Option<Arc<str>>,
}

impl Notifier {
    pub fn new(client: Client, url: Option<String>) -> Self {
        Self {
            client,
            url: url.map(Arc::from),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Client::new(), None)
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    pub fn notify(&self, event: Event) {
        let Some(url) = self.url.clone() else {
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            let sent = client
                .post(&*url)
                .json(&event)
                .send()
                .await
                .and_then(|response| response.error_for_status());
            match sent {
                Ok(_) => tracing::debug!("notified {:?}", event),
                Err(e) => tracing::warn!("notification to {} failed: {:?}", url, e),
            }
        });
    }
}
