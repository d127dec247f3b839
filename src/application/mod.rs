//! Application services: everything between the HTTP handlers and the
//! repositories.

pub mod admin;
pub mod captcha;
pub mod comments;
pub mod contact;
pub mod error;
pub mod landing;
pub mod localization;
pub mod news;
pub mod pagination;
pub mod repos;
pub mod shop;
pub mod urls;
pub mod validation;
