use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::{
    config,
    error::{Error, Result},
    types::InvokeRequest,
    warning,
};

/// External facility that calls the invocation entrypoint at a given instant.
#[async_trait]
pub trait TimerFacility: Send + Sync {
    /// Arms (or replaces) the timer of `schedule_id`. `payload` is sent back to
    /// `POST /invoke` when it fires.
    async fn arm(&self, schedule_id: &str, cron: &str, payload: &InvokeRequest) -> Result<()>;

    /// Removes the timer of `schedule_id`. Removing an absent timer succeeds.
    async fn disarm(&self, schedule_id: &str) -> Result<()>;
}

/// Timer facility reached over HTTP, one job per schedule under `/jobs/{schedule_id}`.
#[derive(Debug, Clone)]
pub struct HttpTimer {
    client: Client,
    base_url: String,
    callback_url: String,
    secret: String,
}

impl HttpTimer {
    pub fn new(
        base_url: impl Into<String>,
        callback_url: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            callback_url: callback_url.into(),
            secret: secret.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            config::timer_url()?,
            config::callback_url()?,
            config::invoke_secret()?,
        ))
    }

    fn job_url(&self, schedule_id: &str) -> String {
        format!("{}/jobs/{}", self.base_url, schedule_id)
    }
}

#[async_trait]
impl TimerFacility for HttpTimer {
    async fn arm(&self, schedule_id: &str, cron: &str, payload: &InvokeRequest) -> Result<()> {
        let body = json!({
            "schedule": cron,
            "callback": {
                "url": self.callback_url,
                "method": "POST",
                "headers": { "Authorization": format!("Bearer {}", self.secret) },
                "body": payload,
            },
        });

        let res = self
            .client
            .put(self.job_url(schedule_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::SchedulingBackend(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::SchedulingBackend(format!(
                "arming {} failed with {}: {}",
                schedule_id, status, text
            )));
        }

        Ok(())
    }

    async fn disarm(&self, schedule_id: &str) -> Result<()> {
        let res = self
            .client
            .delete(self.job_url(schedule_id))
            .send()
            .await
            .map_err(|e| Error::SchedulingBackend(e.to_string()))?;

        match res.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                warning!("No timer armed for schedule {}, nothing to disarm", schedule_id);
                Ok(())
            }
            status => {
                let text = res.text().await.unwrap_or_default();
                Err(Error::SchedulingBackend(format!(
                    "disarming {} failed with {}: {}",
                    schedule_id, status, text
                )))
            }
        }
    }
}
