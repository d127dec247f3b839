use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    application::repos::{
        FeedbackRepo, NewFeedback, NewReservation, RepoError, ReservationsRepo,
    },
    domain::entities::{FeedbackRecord, ReservationRecord},
    domain::pricing,
    domain::types::PurchaseType,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    name: String,
    email: String,
    phone: String,
    purchase_type: PurchaseType,
    deposit: i64,
    created_at: OffsetDateTime,
}

impl From<ReservationRow> for ReservationRecord {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            purchase_type: row.purchase_type,
            deposit: row.deposit,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    id: i64,
    name: String,
    email: String,
    rating: i16,
    comment: String,
    created_at: OffsetDateTime,
}

impl From<FeedbackRow> for FeedbackRecord {
    fn from(row: FeedbackRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ReservationsRepo for PostgresRepositories {
    async fn create_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<ReservationRecord, RepoError> {
        // The stored deposit always comes from the pricing policy.
        let deposit = pricing::deposit_for(reservation.purchase_type);
        if deposit != reservation.deposit {
            warn!(
                target = "landing_news::infra::db::landing",
                submitted = reservation.deposit,
                deposit,
                purchase_type = reservation.purchase_type.code(),
                "Overriding reservation deposit with the pricing policy"
            );
        }

        let row = sqlx::query_as::<_, ReservationRow>(
            "INSERT INTO landing_reservations (name, email, phone, purchase_type, deposit) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, email, phone, purchase_type, deposit, created_at",
        )
        .bind(&reservation.name)
        .bind(&reservation.email)
        .bind(&reservation.phone)
        .bind(reservation.purchase_type)
        .bind(deposit)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn count_reservations(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM landing_reservations")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn count_by_type(&self, purchase_type: PurchaseType) -> Result<u64, RepoError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM landing_reservations WHERE purchase_type = $1")
                .bind(purchase_type)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }
}

#[async_trait]
impl FeedbackRepo for PostgresRepositories {
    async fn create_feedback(&self, feedback: NewFeedback) -> Result<FeedbackRecord, RepoError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            "INSERT INTO landing_feedback (name, email, rating, comment) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, email, rating, comment, created_at",
        )
        .bind(&feedback.name)
        .bind(&feedback.email)
        .bind(feedback.rating)
        .bind(&feedback.comment)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn average_rating(&self) -> Result<Option<f64>, RepoError> {
        sqlx::query_scalar("SELECT AVG(rating)::DOUBLE PRECISION FROM landing_feedback")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_testimonials(
        &self,
        min_rating: i16,
        limit: usize,
    ) -> Result<Vec<FeedbackRecord>, RepoError> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            "SELECT id, name, email, rating, comment, created_at \
             FROM landing_feedback \
             WHERE rating >= $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2",
        )
        .bind(min_rating)
        .bind(Self::convert_limit(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FeedbackRecord::from).collect())
    }
}
