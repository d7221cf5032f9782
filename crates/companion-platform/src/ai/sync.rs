//! Client for the background analysis service.
//!
//! Saved conversations are posted as `[{role, text}]`; the service may
//! answer with a suggested session title.

use async_trait::async_trait;
use gloo_net::http::Request;
use serde::Serialize;

use companion_core::ports::SyncPort;
use companion_types::{
    CompanionError, Result,
    config::SyncConfig,
    message::{Message, Role},
    turn::SyncOutcome,
};

#[derive(Serialize)]
struct SyncLine<'a> {
    role: Role,
    text: &'a str,
}

pub struct AnalysisSyncClient {
    base_url: String,
}

impl AnalysisSyncClient {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/sync-chat", self.base_url)
    }
}

/// The request body: one `{role, text}` object per message.
pub fn sync_payload(history: &[Message]) -> Result<String> {
    let lines: Vec<SyncLine<'_>> = history
        .iter()
        .map(|m| SyncLine {
            role: m.role,
            text: &m.text,
        })
        .collect();
    Ok(serde_json::to_string(&lines)?)
}

/// Parse the service's answer. Blank titles count as no suggestion.
pub fn parse_sync_outcome(raw: &str) -> Result<SyncOutcome> {
    let mut outcome: SyncOutcome = serde_json::from_str(raw)?;
    outcome.suggested_title = outcome
        .suggested_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    Ok(outcome)
}

#[async_trait(?Send)]
impl SyncPort for AnalysisSyncClient {
    async fn background_sync(&self, user_id: &str, history: &[Message]) -> Result<SyncOutcome> {
        let response = Request::post(&self.endpoint())
            .query([("user_id", user_id)])
            .header("Content-Type", "application/json")
            .body(sync_payload(history)?)
            .map_err(|e| CompanionError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| CompanionError::Network(e.to_string()))?;

        if !response.ok() {
            return Err(CompanionError::Network(format!(
                "Sync failed: HTTP {} {}",
                response.status(),
                response.status_text()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CompanionError::Network(e.to_string()))?;
        parse_sync_outcome(&text)
    }
}
