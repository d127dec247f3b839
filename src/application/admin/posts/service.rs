use std::sync::Arc;

use crate::application::localization::Localization;
use crate::application::repos::PostsRepo;
use crate::cache::InvalidationCoordinator;

#[derive(Clone)]
pub struct AdminPostService {
    pub(crate) posts: Arc<dyn PostsRepo>,
    pub(crate) localization: Arc<Localization>,
    pub(crate) invalidation: InvalidationCoordinator,
}

impl AdminPostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        localization: Arc<Localization>,
        invalidation: InvalidationCoordinator,
    ) -> Self {
        Self {
            posts,
            localization,
            invalidation,
        }
    }
}
