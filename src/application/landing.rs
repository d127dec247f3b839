//! Lead capture on the landing page: reservations, feedback and the
//! numbers shown on the home page.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use validator::Validate;

use crate::application::repos::{
    FeedbackRepo, NewFeedback, NewReservation, RepoError, ReservationsRepo,
};
use crate::application::validation::FieldErrors;
use crate::domain::entities::{FeedbackRecord, ReservationRecord};
use crate::domain::pricing::{self, format_clp};
use crate::domain::types::PurchaseType;

pub const TESTIMONIAL_MIN_RATING: i16 = 4;
pub const TESTIMONIAL_LIMIT: usize = 6;

const RESERVATION_LABELS: &[(&str, &str)] = &[
    ("name", "Nombre"),
    ("email", "Email"),
    ("phone", "Teléfono"),
    ("tipo", "Tipo de compra"),
];

#[derive(Debug, Error)]
pub enum LandingError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReservationForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "Ingresa tu nombre (máximo 120 caracteres)."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Ingresa un correo electrónico válido."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 30, message = "El teléfono admite hasta 30 caracteres."))]
    pub phone: String,
    #[serde(default)]
    pub tipo: String,
    /// Ignored; the deposit always comes from the pricing policy.
    #[serde(default)]
    pub deposit: Option<String>,
}

impl ReservationForm {
    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.tipo = self.tipo.trim().to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub enum ReservationOutcome {
    Created(ReservationRecord),
    Invalid {
        form: ReservationForm,
        errors: FieldErrors,
    },
}

/// `GET /reservar/` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationPrefillQuery {
    pub email: Option<String>,
    pub tipo: Option<String>,
}

/// Initial values of the reservation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationPrefill {
    pub email: String,
    pub tipo: String,
    pub price_label: String,
    pub deposit_label: String,
}

impl ReservationPrefill {
    pub fn from_query(query: &ReservationPrefillQuery) -> Self {
        let tipo = query
            .tipo
            .as_deref()
            .map(str::trim)
            .filter(|tipo| !tipo.is_empty())
            .unwrap_or(PurchaseType::default().code())
            .to_string();
        Self::for_code(query.email.clone().unwrap_or_default(), tipo)
    }

    pub fn for_code(email: String, tipo: String) -> Self {
        let quote = pricing::quote_for_code(&tipo);
        Self {
            email,
            price_label: format_clp(quote.price),
            deposit_label: format_clp(quote.deposit),
            tipo,
        }
    }
}

/// `POST /feedback/` fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackOutcome {
    Stored(FeedbackRecord),
    /// Name is required; the page shows an error banner.
    MissingName,
    /// Rating outside 1..=5; silently dropped.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct HomeMetrics {
    pub reservations: u64,
    pub pilot_companies: u64,
    /// Average rating scaled to 0..=100.
    pub satisfaction: u32,
    pub testimonials: Vec<FeedbackRecord>,
}

#[derive(Clone)]
pub struct LandingService {
    reservations: Arc<dyn ReservationsRepo>,
    feedback: Arc<dyn FeedbackRepo>,
}

impl LandingService {
    pub fn new(reservations: Arc<dyn ReservationsRepo>, feedback: Arc<dyn FeedbackRepo>) -> Self {
        Self {
            reservations,
            feedback,
        }
    }

    pub async fn home_metrics(&self) -> Result<HomeMetrics, LandingError> {
        let reservations = self.reservations.count_reservations().await?;
        let pilot_companies = self
            .reservations
            .count_by_type(PurchaseType::PilotProgram)
            .await?;
        let satisfaction = self
            .feedback
            .average_rating()
            .await?
            .map(satisfaction_percent)
            .unwrap_or(0);
        let testimonials = self
            .feedback
            .list_testimonials(TESTIMONIAL_MIN_RATING, TESTIMONIAL_LIMIT)
            .await?;

        Ok(HomeMetrics {
            reservations,
            pilot_companies,
            satisfaction,
            testimonials,
        })
    }

    pub async fn reserve(&self, form: ReservationForm) -> Result<ReservationOutcome, LandingError> {
        let form = form.normalized();
        let mut errors = match form.validate() {
            Ok(()) => FieldErrors::default(),
            Err(report) => FieldErrors::from_validation(&report, RESERVATION_LABELS),
        };
        let purchase_type = PurchaseType::from_code(&form.tipo);
        if purchase_type.is_none() {
            errors.add("tipo", "Tipo de compra", "Selecciona una opción válida.");
        }
        let Some(purchase_type) = purchase_type.filter(|_| errors.is_empty()) else {
            return Ok(ReservationOutcome::Invalid { form, errors });
        };

        let reservation = self
            .reservations
            .create_reservation(NewReservation {
                name: form.name,
                email: form.email,
                phone: form.phone,
                purchase_type,
                deposit: pricing::deposit_for(purchase_type),
            })
            .await?;
        info!(
            target = "landing_news::application::landing",
            reservation_id = reservation.id,
            purchase_type = purchase_type.code(),
            deposit = reservation.deposit,
            "Reservation stored"
        );
        Ok(ReservationOutcome::Created(reservation))
    }

    pub async fn submit_feedback(&self, form: FeedbackForm) -> Result<FeedbackOutcome, LandingError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Ok(FeedbackOutcome::MissingName);
        }
        let Some(rating) = form
            .rating
            .trim()
            .parse::<i16>()
            .ok()
            .filter(|rating| (1..=5).contains(rating))
        else {
            return Ok(FeedbackOutcome::Ignored);
        };

        let stored = self
            .feedback
            .create_feedback(NewFeedback {
                name: name.to_string(),
                email: form.email.trim().to_string(),
                rating,
                comment: form.comment.trim().to_string(),
            })
            .await?;
        Ok(FeedbackOutcome::Stored(stored))
    }
}

/// `round(avg * 20)`: a 1..=5 average mapped onto 20..=100.
pub fn satisfaction_percent(average: f64) -> u32 {
    (average * 20.0).round().clamp(0.0, 100.0) as u32
}
