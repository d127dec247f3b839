use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        comments::CommentError, contact::ContactError, landing::LandingError, news::NewsError,
        repos::RepoError, shop::ShopError,
    },
    cache::CacheError,
    domain::error::DomainError,
    infra::error::InfraError,
};

const NOT_FOUND_MESSAGE: &str = "Página no encontrada";
const INTERNAL_MESSAGE: &str = "Ha ocurrido un error inesperado";

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Client-facing text of an error response; the HTML error page renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicErrorMessage(pub &'static str);

/// Error returned by public handlers. Only `public_message` reaches the
/// client; the full chain travels in the attached [`ErrorReport`].
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn not_found(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE, detail)
    }

    pub fn internal(source: &'static str, error: &dyn StdError) -> Self {
        Self::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_MESSAGE,
            error,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn public_message(&self) -> &'static str {
        self.public_message
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        response
            .extensions_mut()
            .insert(PublicErrorMessage(self.public_message));
        self.report.attach(&mut response);
        response
    }
}

impl From<RepoError> for HttpError {
    fn from(error: RepoError) -> Self {
        const SOURCE: &str = "application::error::repo_error";
        match error {
            RepoError::NotFound => HttpError::not_found(SOURCE, "resource not found"),
            RepoError::Timeout => HttpError::from_error(
                SOURCE,
                StatusCode::SERVICE_UNAVAILABLE,
                "Servicio temporalmente no disponible",
                &error,
            ),
            other => HttpError::internal(SOURCE, &other),
        }
    }
}

impl From<NewsError> for HttpError {
    fn from(error: NewsError) -> Self {
        const SOURCE: &str = "application::error::news_error";
        match error {
            NewsError::UnknownTag(tag) => {
                HttpError::not_found(SOURCE, format!("Tag `{tag}` does not exist"))
            }
            NewsError::UnknownCategory(category) => {
                HttpError::not_found(SOURCE, format!("Category `{category}` does not exist"))
            }
            NewsError::NotFound => HttpError::not_found(SOURCE, "No published post at this address"),
            NewsError::Repo(err) => err.into(),
        }
    }
}

impl From<CommentError> for HttpError {
    fn from(error: CommentError) -> Self {
        match error {
            CommentError::NotFound(id) => HttpError::not_found(
                "application::error::comment_error",
                format!("Comment {id} does not exist"),
            ),
            CommentError::Repo(err) => err.into(),
        }
    }
}

impl From<LandingError> for HttpError {
    fn from(error: LandingError) -> Self {
        match error {
            LandingError::Repo(err) => err.into(),
        }
    }
}

impl From<ContactError> for HttpError {
    fn from(error: ContactError) -> Self {
        match error {
            ContactError::Repo(err) => err.into(),
        }
    }
}

impl From<ShopError> for HttpError {
    fn from(error: ShopError) -> Self {
        match error {
            ShopError::NotFound(slug) => HttpError::not_found(
                "application::error::shop_error",
                format!("Product `{slug}` is not available"),
            ),
            ShopError::Repo(err) => err.into(),
        }
    }
}

/// Start-up and command-line failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
