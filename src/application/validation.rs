//! Field-level validation messages shared by the public forms.

use std::collections::BTreeMap;

use serde::Serialize;
use validator::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field_name: String,
    pub field_id: String,
    pub messages: Vec<String>,
}

/// Errors keyed by form field, serialized as
/// `{field: {field_name, field_id, messages}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, FieldError>);

impl FieldErrors {
    /// Convert `validator` output; `labels` maps field names to display labels.
    pub fn from_validation(errors: &ValidationErrors, labels: &[(&str, &str)]) -> Self {
        let mut collected = Self::default();
        for (field, failures) in errors.field_errors() {
            for failure in failures {
                let message = failure
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("Valor inválido ({})", failure.code));
                collected.add(field.as_ref(), label_for(field.as_ref(), labels), message);
            }
        }
        collected
    }

    pub fn add(&mut self, field: &str, label: impl Into<String>, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| FieldError {
                field_name: label.into(),
                field_id: format!("id_{field}"),
                messages: Vec::new(),
            })
            .messages
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.get(field)
    }

    /// First message for `field`, for inline rendering in templates.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|error| error.messages.first())
            .map(String::as_str)
    }

    /// `Label: message; message` lines, used for flash messages.
    pub fn summary(&self) -> Vec<String> {
        self.0
            .values()
            .map(|error| format!("{}: {}", error.field_name, error.messages.join("; ")))
            .collect()
    }
}

fn label_for(field: &str, labels: &[(&str, &str)]) -> String {
    labels
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| title_case(field))
}

fn title_case(field: &str) -> String {
    field
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Este campo es obligatorio."))]
        name: String,
        #[validate(email)]
        contact_email: String,
    }

    #[test]
    fn labels_and_ids_follow_field_names() {
        let sample = Sample {
            name: String::new(),
            contact_email: "nope".to_string(),
        };
        let errors = sample.validate().expect_err("invalid sample");
        let fields = FieldErrors::from_validation(&errors, &[("name", "Nombre completo")]);

        let name = fields.get("name").expect("name error");
        assert_eq!(name.field_name, "Nombre completo");
        assert_eq!(name.field_id, "id_name");
        assert_eq!(name.messages, vec!["Este campo es obligatorio."]);

        let email = fields.get("contact_email").expect("email error");
        assert_eq!(email.field_name, "Contact Email");
        assert_eq!(email.messages, vec!["Valor inválido (email)"]);
    }

    #[test]
    fn summary_joins_messages_per_field() {
        let mut fields = FieldErrors::default();
        fields.add("captcha", "Captcha", "Código incorrecto.");
        fields.add("captcha", "Captcha", "Expirado.");
        assert_eq!(fields.summary(), vec!["Captcha: Código incorrecto.; Expirado."]);
    }
}
