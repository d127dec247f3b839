use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::application::admin::{AdminPostService, AdminTaxonomyService};
use crate::application::comments::CommentService;

#[derive(Clone)]
pub struct ApiState {
    pub posts: Arc<AdminPostService>,
    pub taxonomy: Arc<AdminTaxonomyService>,
    pub comments: Arc<CommentService>,
    /// `None` keeps the admin API unmounted.
    pub token: Option<Arc<str>>,
}

impl ApiState {
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Constant-time comparison against the configured token.
    pub fn authorizes(&self, presented: &str) -> bool {
        match self.token.as_deref() {
            Some(expected) => bool::from(expected.as_bytes().ct_eq(presented.as_bytes())),
            None => false,
        }
    }
}
