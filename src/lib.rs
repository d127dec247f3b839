//! Product landing site with a multi-lingual news section, comment
//! moderation and a small shop catalog.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
