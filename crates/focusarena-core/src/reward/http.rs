//! Reward service over HTTP.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST focus/sessions` records an outcome
//! - `PUT  user/hp` persists HP after a penalty
//! - `GET  focus/stats` returns the display counters

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::{FocusStats, Reconciler};
use crate::error::ReconcileError;
use crate::session::{FocusMode, OutcomeStatus, SessionOutcome};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeRequest {
    session_id: Uuid,
    mode: FocusMode,
    duration_seconds: u64,
    xp_earned: u32,
    hp_remaining: u8,
    penalty_count: u32,
    status: OutcomeStatus,
    forced: bool,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
}

impl From<&SessionOutcome> for OutcomeRequest {
    fn from(o: &SessionOutcome) -> Self {
        Self {
            session_id: o.session_id,
            mode: o.mode,
            duration_seconds: o.elapsed_secs,
            xp_earned: o.xp_earned,
            hp_remaining: o.hp_remaining,
            penalty_count: o.penalty_count,
            status: o.status,
            forced: o.forced,
            started_at: o.started_at,
            ended_at: o.ended_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct HpRequest {
    hp: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StatsResponse {
    sessions_completed: u64,
    /// Seconds.
    total_focus_time: u64,
    current_streak: u32,
}

pub struct HttpReconciler {
    client: Client,
    base: Url,
    token: Option<String>,
    timeout: Duration,
}

impl HttpReconciler {
    pub fn new(endpoint: &str, token: Option<String>) -> Result<Self, ReconcileError> {
        Self::with_timeout(endpoint, token, DEFAULT_TIMEOUT)
    }

    /// Like [`HttpReconciler::new`] with an explicit per-request timeout.
    pub fn with_timeout(
        endpoint: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ReconcileError> {
        let base = parse_base(endpoint)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            token,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ReconcileError> {
        self.base
            .join(path)
            .map_err(|e| ReconcileError::InvalidEndpoint {
                endpoint: self.base.to_string(),
                message: e.to_string(),
            })
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ReconcileError> {
        let resp = self.authorize(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReconcileError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

/// Parse the base URL, making sure relative joins append rather than replace
/// the last path segment.
fn parse_base(endpoint: &str) -> Result<Url, ReconcileError> {
    let trimmed = endpoint.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| ReconcileError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ReconcileError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: "not a base URL".into(),
        });
    }
    Ok(url)
}

#[async_trait]
impl Reconciler for HttpReconciler {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn record_outcome(&self, outcome: &SessionOutcome) -> Result<(), ReconcileError> {
        let url = self.url("focus/sessions")?;
        let body = OutcomeRequest::from(outcome);
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn persist_hp(&self, hp: u8) -> Result<(), ReconcileError> {
        let url = self.url("user/hp")?;
        self.send(self.client.put(url).json(&HpRequest { hp })).await?;
        Ok(())
    }

    async fn load_stats(&self) -> Result<FocusStats, ReconcileError> {
        let url = self.url("focus/stats")?;
        let stats: StatsResponse = self.send(self.client.get(url)).await?.json().await?;
        Ok(FocusStats {
            sessions_completed: stats.sessions_completed,
            total_focus_secs: stats.total_focus_time,
            current_streak: stats.current_streak,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_gets_trailing_slash() {
        let r = HttpReconciler::new("https://arena.example/api", None).unwrap();
        assert_eq!(r.base_url().as_str(), "https://arena.example/api/");
        assert_eq!(
            r.url("focus/stats").unwrap().as_str(),
            "https://arena.example/api/focus/stats"
        );
    }

    #[test]
    fn timeout_is_set_at_construction() {
        let default = HttpReconciler::new("https://arena.example", None).unwrap();
        assert_eq!(default.timeout(), DEFAULT_TIMEOUT);

        let custom = HttpReconciler::with_timeout(
            "https://arena.example",
            Some("t".into()),
            Duration::from_secs(3),
        )
        .unwrap();
        assert_eq!(custom.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn rejects_garbage_endpoint() {
        assert!(matches!(
            HttpReconciler::new("not a url", None),
            Err(ReconcileError::InvalidEndpoint { .. })
        ));
        assert!(HttpReconciler::new("mailto:arena@example.com", None).is_err());
    }

    #[test]
    fn outcome_request_uses_camel_case() {
        let now = Utc::now();
        let outcome = SessionOutcome {
            session_id: Uuid::new_v4(),
            mode: FocusMode::DeepWork,
            status: OutcomeStatus::GaveUp,
            elapsed_secs: 812,
            xp_earned: 0,
            hp_remaining: 35,
            penalty_count: 13,
            forced: false,
            started_at: now,
            ended_at: now,
        };
        let json = serde_json::to_value(OutcomeRequest::from(&outcome)).unwrap();
        assert_eq!(json["mode"], "deep-work");
        assert_eq!(json["durationSeconds"], 812);
        assert_eq!(json["xpEarned"], 0);
        assert_eq!(json["hpRemaining"], 35);
        assert_eq!(json["status"], "gave-up");
    }
}
