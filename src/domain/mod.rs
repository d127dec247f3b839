//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod posts;
pub mod pricing;
pub mod slug;
pub mod text;
pub mod types;
