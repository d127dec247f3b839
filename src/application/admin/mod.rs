//! Write services behind the token-protected admin API.

pub mod posts;
pub mod taxonomy;

pub use posts::AdminPostService;
pub use taxonomy::AdminTaxonomyService;
