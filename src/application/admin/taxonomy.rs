use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::application::repos::{RepoError, TaxonomyRepo};
use crate::domain::entities::{CategoryRecord, TagRecord};
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug_async};

#[derive(Debug, Error)]
pub enum AdminTaxonomyError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyCommand {
    pub name: String,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Category,
    Tag,
}

#[derive(Clone)]
pub struct AdminTaxonomyService {
    taxonomy: Arc<dyn TaxonomyRepo>,
}

impl AdminTaxonomyService {
    pub fn new(taxonomy: Arc<dyn TaxonomyRepo>) -> Self {
        Self { taxonomy }
    }

    pub async fn create_category(
        &self,
        command: TaxonomyCommand,
    ) -> Result<CategoryRecord, AdminTaxonomyError> {
        let name = command.name.trim();
        let slug = self.unique_slug(Kind::Category, name).await?;
        let category = self.taxonomy.create_category(name, &slug).await?;
        info!(
            target = "landing_news::application::admin::taxonomy",
            category_id = category.id,
            slug = %category.slug,
            "Created category"
        );
        Ok(category)
    }

    pub async fn create_tag(&self, command: TaxonomyCommand) -> Result<TagRecord, AdminTaxonomyError> {
        let name = command.name.trim();
        let slug = self.unique_slug(Kind::Tag, name).await?;
        let tag = self.taxonomy.create_tag(name, &slug).await?;
        info!(
            target = "landing_news::application::admin::taxonomy",
            tag_id = tag.id,
            slug = %tag.slug,
            "Created tag"
        );
        Ok(tag)
    }

    async fn unique_slug(&self, kind: Kind, name: &str) -> Result<String, AdminTaxonomyError> {
        if name.is_empty() {
            return Err(AdminTaxonomyError::ConstraintViolation("name"));
        }
        let taxonomy = self.taxonomy.clone();
        let result = generate_unique_slug_async(name, move |candidate| {
            let taxonomy = taxonomy.clone();
            let candidate = candidate.to_string();
            async move {
                let taken = match kind {
                    Kind::Category => taxonomy.category_slug_taken(&candidate).await?,
                    Kind::Tag => taxonomy.tag_slug_taken(&candidate).await?,
                };
                Ok::<bool, RepoError>(!taken)
            }
        })
        .await;

        match result {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(SlugError::Exhausted { .. })) => {
                Err(AdminTaxonomyError::ConstraintViolation("slug"))
            }
            Err(SlugAsyncError::Slug(_)) => Err(AdminTaxonomyError::ConstraintViolation("name")),
            Err(SlugAsyncError::Predicate(err)) => Err(AdminTaxonomyError::Repo(err)),
        }
    }
}
