//! Contact form submissions.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use validator::Validate;

use crate::application::captcha::CaptchaStore;
use crate::application::repos::{ContactRepo, NewContactMessage, RepoError};
use crate::application::validation::FieldErrors;
use crate::domain::entities::ContactMessageRecord;
use crate::domain::types::ContactSubject;

pub const MESSAGE_MIN_CHARS: usize = 10;

const LABELS: &[(&str, &str)] = &[
    ("name", "Nombre completo"),
    ("email", "Correo electrónico"),
    ("phone", "Teléfono"),
    ("company", "Empresa"),
    ("subject", "Asunto"),
    ("message", "Mensaje"),
    ("captcha", "Captcha"),
];

#[derive(Debug, Error)]
pub enum ContactError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "Ingresa tu nombre."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Por favor ingrese un correo electrónico válido."))]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "El nombre de la empresa es demasiado largo."))]
    pub company: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub captcha_key: String,
    #[serde(default)]
    pub captcha_value: String,
}

#[derive(Debug, Clone)]
pub enum ContactOutcome {
    Sent(ContactMessageRecord),
    Invalid {
        form: ContactForm,
        errors: FieldErrors,
    },
}

/// Strip spaces, dashes and `+`; the rest must be 8 to 12 digits.
pub fn normalize_phone(raw: &str) -> Result<String, &'static str> {
    let phone: String = raw
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '+'))
        .collect();
    if !phone.chars().all(|ch| ch.is_ascii_digit()) {
        return Err("El número de teléfono solo debe contener dígitos.");
    }
    if !(8..=12).contains(&phone.len()) {
        return Err("El número de teléfono debe tener entre 8 y 12 dígitos.");
    }
    Ok(phone)
}

#[derive(Clone)]
pub struct ContactService {
    messages: Arc<dyn ContactRepo>,
    captcha: Arc<CaptchaStore>,
}

impl ContactService {
    pub fn new(messages: Arc<dyn ContactRepo>, captcha: Arc<CaptchaStore>) -> Self {
        Self { messages, captcha }
    }

    pub async fn submit(&self, form: ContactForm) -> Result<ContactOutcome, ContactError> {
        let mut errors = match form.validate() {
            Ok(()) => FieldErrors::default(),
            Err(report) => FieldErrors::from_validation(&report, LABELS),
        };

        let phone = match form.phone.trim() {
            "" => None,
            raw => match normalize_phone(raw) {
                Ok(phone) => Some(phone),
                Err(message) => {
                    errors.add("phone", "Teléfono", message);
                    None
                }
            },
        };
        let subject = ContactSubject::try_from(form.subject.as_str()).ok();
        if subject.is_none() {
            errors.add("subject", "Asunto", "Selecciona un tema.");
        }
        let message = form.message.trim().to_string();
        if message.chars().count() < MESSAGE_MIN_CHARS {
            errors.add(
                "message",
                "Mensaje",
                "Por favor proporcione más detalles en su mensaje.",
            );
        }
        if !self.captcha.verify(&form.captcha_key, &form.captcha_value) {
            errors.add("captcha", "Captcha", "El código de verificación es incorrecto.");
        }

        let Some(subject) = subject.filter(|_| errors.is_empty()) else {
            return Ok(ContactOutcome::Invalid { form, errors });
        };

        let company = Some(form.company.trim().to_string()).filter(|company| !company.is_empty());
        let stored = self
            .messages
            .create_message(NewContactMessage {
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
                phone,
                company,
                subject,
                message,
            })
            .await?;
        info!(
            target = "landing_news::application::contact",
            message_id = stored.id,
            subject = subject.as_str(),
            "Contact message stored"
        );
        Ok(ContactOutcome::Sent(stored))
    }
}
