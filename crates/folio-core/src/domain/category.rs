use serde::{Deserialize, Serialize};

use super::slug::is_valid_slug;
use crate::error::DomainError;

pub type CategoryId = i64;

/// Category - groups posts; every post belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// Fields required to create a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() || self.name.chars().count() > 100 {
            return Err(DomainError::Validation(
                "Category name must be 1-100 characters".to_string(),
            ));
        }
        if !is_valid_slug(&self.slug) {
            return Err(DomainError::Validation(format!(
                "Invalid category slug: {}",
                self.slug
            )));
        }
        Ok(())
    }
}
