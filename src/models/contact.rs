//! Contact form model.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Banner text shown after a successful submission.
pub const CONTACT_THANK_YOU: &str =
    "Thank you for your message! I'll get back to you as soon as possible.";

/// Message shown when any field is left empty.
pub const CONTACT_INCOMPLETE: &str = "Please fill out all fields before submitting.";

/// A visitor's message from the contact section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), AppError> {
        if [&self.name, &self.email, &self.message]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(AppError::Validation(CONTACT_INCOMPLETE.to_string()));
        }
        Ok(())
    }
}

/// Result of a delivered submission: the banner and the reset form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub message: String,
    pub form: ContactForm,
}

impl ContactReceipt {
    pub fn delivered() -> Self {
        Self {
            message: CONTACT_THANK_YOU.to_string(),
            form: ContactForm::default(),
        }
    }
}
