use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{ContactRepo, NewContactMessage, RepoError},
    domain::entities::ContactMessageRecord,
    domain::types::ContactSubject,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ContactMessageRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    company: Option<String>,
    subject: ContactSubject,
    message: String,
    created_at: OffsetDateTime,
}

#[async_trait]
impl ContactRepo for PostgresRepositories {
    async fn create_message(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessageRecord, RepoError> {
        let row = sqlx::query_as::<_, ContactMessageRow>(
            "INSERT INTO contact_messages (name, email, phone, company, subject, message) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, name, email, phone, company, subject, message, created_at",
        )
        .bind(&message.name)
        .bind(&message.email)
        .bind(message.phone.as_deref())
        .bind(message.company.as_deref())
        .bind(message.subject)
        .bind(&message.message)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContactMessageRecord {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            subject: row.subject,
            message: row.message,
            created_at: row.created_at,
        })
    }
}
