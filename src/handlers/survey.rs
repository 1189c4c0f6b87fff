use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_i18n::t;

use crate::{
    extractors::Locale,
    models::{Submission, SurveyInput},
    names,
    rejections::{AppError, ResultExt},
    AppState,
};

use super::created;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/surveys", get(list_surveys).post(create_survey))
        .route(
            "/surveys/{id}",
            get(get_survey).put(update_survey).delete(delete_survey),
        )
        .route("/surveys/{id}/submit", post(submit_survey))
}

async fn list_surveys(
    State(state): State<AppState>,
    Locale(locale): Locale,
) -> Result<impl IntoResponse, AppError> {
    let surveys = state
        .db
        .surveys()
        .await
        .reject(t!("errors.load_survey", locale = locale))?;
    Ok(Json(surveys))
}

async fn create_survey(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Json(input): Json<SurveyInput>,
) -> Result<impl IntoResponse, AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::Input(t!("errors.empty_title", locale = locale).into()));
    }

    let id = state
        .db
        .create_survey(&input)
        .await
        .reject(t!("errors.save_survey", locale = locale))?;
    Ok(created(id, names::survey_url(id)))
}

async fn get_survey(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let survey = state
        .db
        .survey(id)
        .await
        .reject(t!("errors.load_survey", locale = locale))?;
    Ok(Json(survey))
}

async fn update_survey(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
    Json(input): Json<SurveyInput>,
) -> Result<impl IntoResponse, AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::Input(t!("errors.empty_title", locale = locale).into()));
    }

    state
        .db
        .update_survey(id, &input)
        .await
        .reject(t!("errors.save_survey", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_survey(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .delete_survey(id)
        .await
        .reject(t!("errors.delete_survey", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_survey(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
    Json(submission): Json<Submission>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .submit_survey(id, &submission)
        .await
        .reject(t!("errors.submit_survey", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}
