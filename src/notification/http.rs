use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};
use super::{NotificationSink, NotifyError, OrderNotice};

/// An endpoint containing this marker has not been set up yet.
pub const PLACEHOLDER_MARKER: &str = "YOUR_FORM_ID";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts each alert as JSON to a form/webhook endpoint.
pub struct HttpNotificationSink {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl HttpNotificationSink {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// The endpoint to post to, if one has really been configured.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && !url.contains(PLACEHOLDER_MARKER))
    }
}

#[async_trait]
impl NotificationSink for HttpNotificationSink {
    #[instrument(skip(self, notice), fields(order_code = %notice.order_code))]
    async fn dispatch(&self, notice: &OrderNotice) -> Result<(), NotifyError> {
        let Some(url) = self.endpoint() else {
            return Err(NotifyError::Unconfigured);
        };
        debug!(url, "Posting order notification");

        let response = self
            .client
            .post(url)
            .json(&notice.payload())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}
