use actix_web::{HttpResponse, web};

use folio_core::DomainError;

use super::present;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/portfolio/projects/
pub async fn list_projects(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let projects = state.portfolio.list_projects().await?;

    Ok(HttpResponse::Ok().json(projects.iter().map(present::project).collect::<Vec<_>>()))
}

/// GET /api/portfolio/projects/{slug}/
pub async fn get_project(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let project = state
        .portfolio
        .find_project_by_slug(&path)
        .await?
        .ok_or_else(|| DomainError::not_found("Project", path.as_str()))?;

    Ok(HttpResponse::Ok().json(present::project(&project)))
}

/// GET /api/portfolio/skills/
pub async fn list_skills(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let skills = state.portfolio.list_skills().await?;

    Ok(HttpResponse::Ok().json(skills.iter().map(present::skill).collect::<Vec<_>>()))
}
