//! Contact form relay.
//!
//! Forwards visitor messages to a third-party form webhook as URL-encoded form
//! data. Every delivery has a timeout and its outcome is reported to the caller.

use std::time::Duration;

use crate::errors::AppError;
use crate::models::ContactForm;

pub struct ContactRelay {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl ContactRelay {
    /// Create a relay with a pre-configured HTTP client.
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// Validate and deliver a submission.
    ///
    /// Without a webhook the submission is only logged.
    pub async fn submit(&self, form: &ContactForm) -> Result<(), AppError> {
        form.validate()?;

        let Some(url) = self.webhook_url.as_deref() else {
            tracing::info!(
                name = %form.name,
                email = %form.email,
                "Contact message received (no webhook configured)"
            );
            return Ok(());
        };

        let response = self.client.post(url).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Contact webhook rejected submission");
            return Err(AppError::Upstream(format!(
                "Contact webhook returned HTTP {}",
                status.as_u16()
            )));
        }

        tracing::info!(email = %form.email, "Contact message delivered");
        Ok(())
    }
}
