use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Flattens validator output into one violation per field, ordered by field name.
///
/// When a field fails several rules, the first declared rule's message wins.
pub fn violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut out: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let message = field_errors
                .first()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .unwrap_or_else(|| "is invalid".to_string());
            FieldViolation::new(field.to_string(), message)
        })
        .collect();

    out.sort_by(|left, right| left.field.cmp(&right.field));
    out
}
