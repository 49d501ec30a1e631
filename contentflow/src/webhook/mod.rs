//! Outbound webhook calls with validation and retry.
//!
//! - [`WebhookConfig`]: target, method, timeout, retry count, headers, auth
//! - [`WebhookDispatcher`]: performs the request, retrying transport failures
//! - [`RetryPolicy`]: backoff schedule between retries

mod config;
mod dispatcher;
mod retry;

pub use config::{HttpMethod, WebhookAuth, WebhookConfig};
pub use dispatcher::WebhookDispatcher;
pub use retry::{JitterStrategy, RetryPolicy};
