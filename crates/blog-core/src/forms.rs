//! Reader-submitted forms and their validation.
//!
//! Every field defaults to empty so that a missing field surfaces as a
//! validation error rather than a decoding failure. Text fields are trimmed
//! before validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Field name to error messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self(fields)
    }
}

/// A form that can be cleaned into validated data.
pub trait Form: Validate + Sized {
    fn trimmed(self) -> Self;

    fn clean(self) -> Result<Self, FormErrors> {
        let form = self.trimmed();
        form.validate()?;
        Ok(form)
    }
}

/// Comment on a post.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, max = 80, message = "Name must be 1 to 80 characters."))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub body: String,
}

impl Form for CommentForm {
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            body: self.body.trim().to_owned(),
        }
    }
}

/// Recommend a post to someone by email.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct EmailPostForm {
    #[validate(length(min = 1, max = 25, message = "Name must be 1 to 25 characters."))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub to: String,
    pub comment: String,
}

impl Form for EmailPostForm {
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            to: self.to.trim().to_owned(),
            comment: self.comment.trim().to_owned(),
        }
    }
}

/// Free-text search.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SearchForm {
    #[validate(length(min = 1, max = 200, message = "Query must be 1 to 200 characters."))]
    pub query: String,
}

impl Form for SearchForm {
    fn trimmed(self) -> Self {
        Self {
            query: self.query.trim().to_owned(),
        }
    }
}
