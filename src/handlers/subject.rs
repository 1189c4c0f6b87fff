use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_i18n::t;
use serde::Deserialize;

use crate::{
    db::{filter::SubjectFilter, Subject},
    extractors::{ContentLanguage, Locale},
    models::SubjectInput,
    names,
    rejections::{AppError, ResultExt},
    AppState,
};

use super::created;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/surveys/{id}/subjects", get(list_subjects).post(create_subject))
        .route(
            "/subjects/{id}",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
}

#[derive(Deserialize)]
struct SubjectQuery {
    parent_id: Option<i64>,
    /// Only subjects without a parent.
    #[serde(default)]
    top_level: bool,
}

async fn list_subjects(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(survey_id): Path<i64>,
    Query(query): Query<SubjectQuery>,
) -> Result<impl IntoResponse, AppError> {
    let survey = state
        .db
        .survey(survey_id)
        .await
        .reject(t!("errors.load_survey", locale = locale))?;
    if !survey.use_subjects {
        return Ok(Json(Vec::<Subject>::new()));
    }

    let mut filters = vec![SubjectFilter::SurveyId(survey_id)];
    if let Some(parent_id) = query.parent_id {
        filters.push(SubjectFilter::ParentId(Some(parent_id)));
    } else if query.top_level {
        filters.push(SubjectFilter::ParentId(None));
    }

    let subjects = state
        .db
        .subjects(&filters, language)
        .await
        .reject(t!("errors.load_content", locale = locale))?;
    Ok(Json(subjects))
}

async fn create_subject(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(survey_id): Path<i64>,
    Json(input): Json<SubjectInput>,
) -> Result<impl IntoResponse, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Input(t!("errors.empty_title", locale = locale).into()));
    }

    let id = state
        .db
        .create_subject(survey_id, language, &input)
        .await
        .reject(t!("errors.save_subject", locale = locale))?;
    Ok(created(id, names::subject_url(id)))
}

async fn get_subject(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = state
        .db
        .subject(id, language)
        .await
        .reject(t!("errors.load_content", locale = locale))?;
    Ok(Json(subject))
}

async fn update_subject(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(id): Path<i64>,
    Json(input): Json<SubjectInput>,
) -> Result<impl IntoResponse, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Input(t!("errors.empty_title", locale = locale).into()));
    }

    state
        .db
        .update_subject(id, language, &input)
        .await
        .reject(t!("errors.save_subject", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_subject(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .delete_subject(id)
        .await
        .reject(t!("errors.delete_subject", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}
