//! Outbound request dispatch.
//!
//! The event loop hands a [`RequestDispatcher`] the parameters for one
//! exchange; the dispatcher spawns the round trip on a Tokio task and
//! reports the outcome over an unbounded channel, tagged with the request id
//! that was in flight. The app drops events whose id is no longer current,
//! so a completion arriving after the session moved on is a no-op.

use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ChatRequest, ChatResponse, GATEWAY_MODEL_HEADER, GATEWAY_PROVIDER_HEADER};
use crate::auth::add_access_headers;

/// Outcome of one request, delivered back to the event loop.
#[derive(Clone, Debug)]
pub enum GatewayEvent {
    /// The worker answered. `reply` is `None` when the body parsed but
    /// carried no usable reply text.
    Completed {
        reply: Option<String>,
        model: Option<String>,
        provider: Option<String>,
    },
    /// Transport or decoding failure; `detail` is for diagnostics only, the
    /// transcript records a fixed error entry.
    Failed { detail: String },
}

#[derive(Debug)]
pub struct RequestParams {
    pub client: reqwest::Client,
    pub endpoint: String,
    pub access_token: Option<String>,
    pub prompt: String,
    pub username: String,
    pub request_id: u64,
}

#[derive(Clone)]
pub struct RequestDispatcher {
    tx: mpsc::UnboundedSender<(GatewayEvent, u64)>,
}

impl RequestDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(GatewayEvent, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Issue exactly one request for the given exchange. The receiver gets
    /// exactly one event per spawn, success or failure.
    pub fn spawn(&self, params: RequestParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let request_id = params.request_id;
            let event = perform_request(params).await;
            let _ = tx_clone.send((event, request_id));
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, event: GatewayEvent, request_id: u64) {
        let _ = self.tx.send((event, request_id));
    }
}

async fn perform_request(params: RequestParams) -> GatewayEvent {
    let RequestParams {
        client,
        endpoint,
        access_token,
        prompt,
        username,
        request_id,
    } = params;

    let payload = ChatRequest {
        prompt,
        username: Some(username),
    };

    debug!(request_id, %endpoint, "issuing chat request");

    let http_request = client
        .post(&endpoint)
        .header(CONTENT_TYPE, "application/json");
    let http_request = add_access_headers(http_request, access_token.as_deref());

    let response = match http_request.json(&payload).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(request_id, error = %e, "chat request failed in transit");
            return GatewayEvent::Failed {
                detail: e.to_string(),
            };
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_else(|_| "<no body>".into());
        warn!(request_id, %status, "chat request rejected");
        return GatewayEvent::Failed {
            detail: format!("{status}: {body}"),
        };
    }

    // Gateway metadata rides on the response headers, not the body.
    let model = header_value(&response, GATEWAY_MODEL_HEADER);
    let provider = header_value(&response, GATEWAY_PROVIDER_HEADER);

    match response.json::<ChatResponse>().await {
        Ok(body) => {
            debug!(request_id, model = ?model, provider = ?provider, "chat request completed");
            GatewayEvent::Completed {
                reply: body.reply_text().map(str::to_string),
                model,
                provider,
            }
        }
        Err(e) => {
            warn!(request_id, error = %e, "chat response body was not valid JSON");
            GatewayEvent::Failed {
                detail: e.to_string(),
            }
        }
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}
