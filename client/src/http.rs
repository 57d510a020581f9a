//! Provider backed by the journal server.
//!
//! One-shot operations go over REST; live subscriptions are WebSocket
//! connections to the collection's `/live` endpoint, each pushing full
//! snapshots.

use crate::error::{ProviderError, Result};
use crate::provider::{CollectionProvider, DeliverySink, SettingsProvider, Subscription};
use futures::future::{BoxFuture, FutureExt};
use futures::{SinkExt, StreamExt};
use journal_engine::{
    collection_path, document_path, settings_path, CreateEntryRequest, CreatedEntry, EntryId,
    EntryPatch, EntryQuery, ErrorBody, JournalEntry, LiveClientMessage, LiveServerMessage,
    NewEntry, SortDirection, StoredTimeSettings, Timestamp,
};
use reqwest::StatusCode;
use std::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message;

/// Interval between keep-alive pings on live connections.
const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpProvider {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpProvider {
    /// Create a provider for the server at `base_url`.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// WebSocket URL of an owner's live collection.
    pub fn live_url(&self, owner: &str, query: EntryQuery) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!(
            "{}/{}/live?direction={}",
            base,
            collection_path(owner),
            direction_param(query.direction)
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn create_entry(
        &self,
        owner: String,
        entry: NewEntry,
        timestamp: Timestamp,
    ) -> Result<EntryId> {
        let body = CreateEntryRequest {
            entry,
            timestamp: Some(timestamp),
        };
        let response = self
            .request(reqwest::Method::POST, &collection_path(&owner))
            .json(&body)
            .send()
            .await?;
        let created: CreatedEntry = check(response).await?.json().await?;
        Ok(created.id)
    }

    async fn read_entries(&self, owner: String, query: EntryQuery) -> Result<Vec<JournalEntry>> {
        let response = self
            .request(reqwest::Method::GET, &collection_path(&owner))
            .query(&[("direction", direction_param(query.direction))])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn update_entry(&self, owner: String, id: String, patch: EntryPatch) -> Result<()> {
        let response = self
            .request(reqwest::Method::PATCH, &document_path(&owner, &id))
            .json(&patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_entry(&self, owner: String, id: String) -> Result<()> {
        let response = self
            .request(reqwest::Method::DELETE, &document_path(&owner, &id))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn fetch_settings(&self, owner: String) -> Result<Option<StoredTimeSettings>> {
        let response = self
            .request(reqwest::Method::GET, &settings_path(&owner))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.json().await?))
    }

    async fn put_settings(&self, owner: String, settings: StoredTimeSettings) -> Result<()> {
        let response = self
            .request(reqwest::Method::PUT, &settings_path(&owner))
            .json(&settings)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

fn direction_param(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "asc",
        SortDirection::Desc => "desc",
    }
}

/// Turn a non-success response into [`ProviderError::Rejected`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.error,
        Err(_) if text.is_empty() => status.to_string(),
        Err(_) => text,
    };
    Err(ProviderError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Run one live connection until the server closes it or the sink is dropped.
async fn run_live(url: String, token: Option<String>, sink: DeliverySink) -> Result<()> {
    let mut request = url.into_client_request()?;
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ProviderError::backend(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    let (stream, _) = tokio_tungstenite::connect_async(request).await?;
    let (mut writer, mut reader) = stream.split();
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            frame = reader.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => return Err(ProviderError::Closed),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                };

                let delivered = match serde_json::from_str::<LiveServerMessage>(&text)? {
                    LiveServerMessage::Snapshot { entries } => sink.deliver(entries),
                    LiveServerMessage::Error { message } => sink.fail(message),
                    LiveServerMessage::Pong => true,
                };
                if !delivered {
                    return Ok(());
                }
            }
            _ = ping.tick() => {
                let json = serde_json::to_string(&LiveClientMessage::Ping)?;
                writer.send(Message::Text(json.into())).await?;
            }
        }
    }
}

impl CollectionProvider for HttpProvider {
    fn open_subscription(
        &self,
        owner: &str,
        query: EntryQuery,
        sink: DeliverySink,
    ) -> Subscription {
        let url = self.live_url(owner, query);
        let token = self.token.clone();
        let generation = sink.generation();
        tracing::debug!(%url, generation, "opening live subscription");

        let task = tokio::spawn(async move {
            if let Err(e) = run_live(url, token, sink.clone()).await {
                tracing::warn!(generation, error = %e, "live subscription ended");
                sink.fail(e);
            }
        });
        Subscription::from_task(task)
    }

    fn create(
        &self,
        owner: &str,
        entry: NewEntry,
        timestamp: Timestamp,
    ) -> BoxFuture<'_, Result<EntryId>> {
        self.create_entry(owner.to_string(), entry, timestamp).boxed()
    }

    fn read(&self, owner: &str, query: EntryQuery) -> BoxFuture<'_, Result<Vec<JournalEntry>>> {
        self.read_entries(owner.to_string(), query).boxed()
    }

    fn update(&self, owner: &str, id: &str, patch: EntryPatch) -> BoxFuture<'_, Result<()>> {
        self.update_entry(owner.to_string(), id.to_string(), patch).boxed()
    }

    fn delete(&self, owner: &str, id: &str) -> BoxFuture<'_, Result<()>> {
        self.delete_entry(owner.to_string(), id.to_string()).boxed()
    }
}

impl SettingsProvider for HttpProvider {
    fn load_settings(&self, owner: &str) -> BoxFuture<'_, Result<Option<StoredTimeSettings>>> {
        self.fetch_settings(owner.to_string()).boxed()
    }

    fn save_settings(
        &self,
        owner: &str,
        settings: StoredTimeSettings,
    ) -> BoxFuture<'_, Result<()>> {
        self.put_settings(owner.to_string(), settings).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_url_scheme() {
        let provider = HttpProvider::new("http://localhost:3000/", None);
        assert_eq!(provider.base_url(), "http://localhost:3000");
        assert_eq!(
            provider.live_url("u1", EntryQuery::newest_first()),
            "ws://localhost:3000/users/u1/journal-entries/live?direction=desc"
        );

        let secure = HttpProvider::new("https://journal.example", Some("t".into()));
        assert_eq!(
            secure.live_url("u1", EntryQuery::oldest_first()),
            "wss://journal.example/users/u1/journal-entries/live?direction=asc"
        );
    }

    #[tokio::test]
    async fn unreachable_server_reports_error() {
        // Nothing listens on port 9 locally.
        let provider = HttpProvider::new("http://127.0.0.1:9", None);
        let result = provider.read("u1", EntryQuery::default()).await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
    }

    #[tokio::test]
    async fn failed_live_connection_is_delivered_as_error() {
        let provider = HttpProvider::new("http://127.0.0.1:9", None);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = DeliverySink::new(4, tx);
        let _sub = provider.open_subscription("u1", EntryQuery::default(), sink);

        let (generation, delivery) = rx.recv().await.unwrap();
        assert_eq!(generation, 4);
        assert!(delivery.is_err());
    }
}
