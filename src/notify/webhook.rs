//! Robot webhook notifier (DingTalk text message format).

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;

use super::{compose_message, Notifier};
use crate::aggregate::AggregationMap;
use crate::error_handling::NotifyError;

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    text: TextContent,
    at: Mentions<'a>,
    #[serde(rename = "isAtAll")]
    is_at_all: bool,
}

#[derive(Debug, Serialize)]
struct TextContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Mentions<'a> {
    #[serde(rename = "atMobiles")]
    at_mobiles: &'a [String],
}

impl<'a> TextMessage<'a> {
    fn new(content: String, at_mobiles: &'a [String]) -> Self {
        Self {
            msgtype: "text",
            text: TextContent { content },
            at: Mentions { at_mobiles },
            is_at_all: false,
        }
    }
}

/// Posts one text message per subject to a robot webhook.
///
/// The endpoint is the configured base URL with the access token appended,
/// e.g. `https://oapi.dingtalk.com/robot/send?access_token=<token>`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
    at_mobiles: Vec<String>,
}

impl WebhookNotifier {
    /// Creates a notifier posting to `webhook_url` followed by `token`.
    ///
    /// The client's own timeout bounds every request.
    pub fn new(client: reqwest::Client, webhook_url: &str, token: &str) -> Self {
        Self {
            client,
            endpoint: format!("{webhook_url}{token}"),
            at_mobiles: Vec::new(),
        }
    }

    /// Phone numbers mentioned in every message.
    pub fn with_mentions(mut self, at_mobiles: Vec<String>) -> Self {
        self.at_mobiles = at_mobiles;
        self
    }

    async fn send(&self, content: String) -> Result<(), NotifyError> {
        let message = TextMessage::new(content, &self.at_mobiles);
        let response = self.client.post(&self.endpoint).json(&message).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!("Webhook response: {body}");
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, map: &AggregationMap) -> Result<(), NotifyError> {
        let total = map.len();
        let mut failed = 0;

        for (subject, messages) in map {
            if let Err(e) = self.send(compose_message(messages)).await {
                warn!("Failed to deliver notification for '{subject}': {e}");
                failed += 1;
            }
        }

        if total > 0 {
            info!("Delivered {} of {} notification(s)", total - failed, total);
        }
        if failed > 0 {
            return Err(NotifyError::Partial { failed, total });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_shape() {
        let message = TextMessage::new("\nhello\n".to_string(), &[]);
        let value = serde_json::to_value(&message).expect("serializable");
        assert_eq!(
            value,
            serde_json::json!({
                "msgtype": "text",
                "text": {"content": "\nhello\n"},
                "at": {"atMobiles": []},
                "isAtAll": false
            })
        );
    }

    #[test]
    fn test_endpoint_appends_token() {
        let notifier = WebhookNotifier::new(
            reqwest::Client::new(),
            "https://oapi.dingtalk.com/robot/send?access_token=",
            "abc",
        );
        assert_eq!(
            notifier.endpoint,
            "https://oapi.dingtalk.com/robot/send?access_token=abc"
        );
    }
}
