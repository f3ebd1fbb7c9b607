//! HTTP+JSON backend -- talks to the task server's endpoints.
//!
//! The server owns normalization and overdue computation; this client
//! just posts the raw values and hands the receipt back verbatim. All
//! calls are synchronous from the caller's point of view: the backend
//! owns a small tokio runtime and blocks on each request.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::runtime::Runtime;
use url::Url;

use super::{FocusTimeReceipt, TaskBackend};
use crate::error::BackendError;

/// Client for the task persistence server.
pub struct HttpBackend {
    base_url: Url,
    client: Client,
    runtime: Runtime,
}

#[derive(Debug, Deserialize)]
struct UpdateFocusResponse {
    focused_time: u64,
    #[serde(default)]
    was_overdue: u8,
    #[serde(default)]
    overdue_time: u64,
}

#[derive(Debug, Deserialize)]
struct ResultResponse {
    result: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url).map_err(|e| BackendError::RequestFailed {
            endpoint: base_url.to_string(),
            message: format!("invalid base URL: {e}"),
        })?;
        let runtime = Runtime::new().map_err(|e| BackendError::RequestFailed {
            endpoint: base_url.to_string(),
            message: format!("failed to start runtime: {e}"),
        })?;
        Ok(Self {
            base_url,
            client: Client::new(),
            runtime,
        })
    }

    fn post(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| BackendError::RequestFailed {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;
        let response = self
            .runtime
            .block_on(self.client.post(url).json(&body).send())?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::ServerStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        self.runtime
            .block_on(response.json::<serde_json::Value>())
            .map_err(|e| BackendError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })
    }

    fn post_result(&self, endpoint: &str, task_id: &str) -> Result<bool, BackendError> {
        let value = self.post(endpoint, json!({ "id": task_id }))?;
        let parsed: ResultResponse =
            serde_json::from_value(value).map_err(|e| BackendError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;
        Ok(parsed.result == "success")
    }
}

impl TaskBackend for HttpBackend {
    fn add_task(
        &self,
        text: &str,
        duration_hours: u64,
        duration_minutes: u64,
    ) -> Result<String, BackendError> {
        let endpoint = "/add";
        let value = self.post(
            endpoint,
            json!({
                "text": text,
                "duration_hours": duration_hours,
                "duration_minutes": duration_minutes,
            }),
        )?;
        // The server assigns numeric row ids; accept strings too.
        match value.get("id") {
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            _ => Err(BackendError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: "missing id field".into(),
            }),
        }
    }

    fn persist_focus_time(
        &self,
        task_id: &str,
        focused_seconds: u64,
    ) -> Result<FocusTimeReceipt, BackendError> {
        let endpoint = "/update_focus_time";
        let value = self.post(
            endpoint,
            json!({ "id": task_id, "focused_time": focused_seconds }),
        )?;
        let parsed: UpdateFocusResponse =
            serde_json::from_value(value).map_err(|e| BackendError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;
        Ok(FocusTimeReceipt {
            focused_seconds: parsed.focused_time,
            was_overdue: parsed.was_overdue != 0,
            overdue_seconds: parsed.overdue_time,
        })
    }

    // The server exposes a single toggle endpoint; complete and
    // un-complete both route through it.
    fn mark_complete(&self, task_id: &str) -> Result<bool, BackendError> {
        self.post_result("/toggle", task_id)
    }

    fn mark_incomplete(&self, task_id: &str) -> Result<bool, BackendError> {
        self.post_result("/toggle", task_id)
    }

    fn delete_task(&self, task_id: &str) -> Result<bool, BackendError> {
        self.post_result("/delete", task_id)
    }
}
