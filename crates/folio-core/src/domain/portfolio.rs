use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slug::{is_valid_slug, slugify};
use crate::error::DomainError;

pub type ProjectId = i64;
pub type SkillId = i64;

/// Portfolio project. Listed newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub body: String,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    /// Left empty to derive the slug from the title.
    pub slug: String,
    pub short_description: String,
    pub body: String,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
}

impl NewProject {
    pub fn new(
        title: impl Into<String>,
        short_description: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            slug: String::new(),
            short_description: short_description.into(),
            body: body.into(),
            github_url: None,
            demo_url: None,
        }
    }

    /// Slug to persist: the explicit one, or the slugified title.
    pub fn effective_slug(&self) -> String {
        if self.slug.is_empty() {
            slugify(&self.title)
        } else {
            self.slug.clone()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() || self.title.chars().count() > 200 {
            return Err(DomainError::Validation(
                "Project title must be 1-200 characters".to_string(),
            ));
        }
        if self.short_description.chars().count() > 300 {
            return Err(DomainError::Validation(
                "Short description must be at most 300 characters".to_string(),
            ));
        }
        let slug = self.effective_slug();
        if !is_valid_slug(&slug) {
            return Err(DomainError::Validation(format!(
                "Invalid project slug: {}",
                slug
            )));
        }
        for url in [&self.github_url, &self.demo_url].into_iter().flatten() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(DomainError::Validation(format!("Invalid URL: {}", url)));
            }
        }
        Ok(())
    }
}

/// A skill shown on the portfolio, ordered by `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    /// Proficiency level from 1 to 100.
    pub proficiency: i32,
    pub order: i32,
}

#[derive(Debug, Clone)]
pub struct NewSkill {
    pub name: String,
    pub proficiency: i32,
    pub order: i32,
}

impl NewSkill {
    pub fn new(name: impl Into<String>, proficiency: i32, order: i32) -> Self {
        Self {
            name: name.into(),
            proficiency,
            order,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("Skill name is required".to_string()));
        }
        if !(1..=100).contains(&self.proficiency) {
            return Err(DomainError::Validation(
                "Proficiency must be between 1 and 100".to_string(),
            ));
        }
        if self.order < 0 {
            return Err(DomainError::Validation(
                "Order must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
