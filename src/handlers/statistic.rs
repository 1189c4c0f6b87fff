use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rust_i18n::t;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{ContentLanguage, Locale},
    rejections::{AppError, ResultExt},
    statistic::{OrderBy, StatisticReport},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/surveys/{id}/statistic", get(statistic))
        .route("/surveys/{id}/statistic/structure", get(structure))
        .route("/surveys/{id}/statistic.csv", get(export_csv))
}

#[derive(Deserialize)]
struct StatisticQuery {
    #[serde(default)]
    order_by: OrderBy,
}

#[derive(Serialize)]
struct StatisticPage {
    answered: bool,
    message: Option<String>,
    /// How to read the `g.q.a` column labels.
    column_hint: String,
    report: Option<StatisticReport>,
}

async fn statistic(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(survey_id): Path<i64>,
    Query(query): Query<StatisticQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .statistics
        .report(survey_id, language, query.order_by)
        .await
        .reject(t!("errors.load_statistic", locale = locale))?;

    let message: Option<String> = report
        .is_none()
        .then(|| t!("statistic.not_answered", locale = locale).into());

    Ok(Json(StatisticPage {
        answered: report.is_some(),
        message,
        column_hint: t!("statistic.column_hint", locale = locale).into(),
        report,
    }))
}

async fn structure(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(survey_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let structure = state
        .statistics
        .structure(survey_id, language)
        .await
        .reject(t!("errors.load_statistic", locale = locale))?;
    Ok(Json(structure))
}

async fn export_csv(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(survey_id): Path<i64>,
) -> Result<Response, AppError> {
    let today = chrono::Local::now().date_naive();
    let export = state
        .statistics
        .export_csv(survey_id, language, today)
        .await
        .reject(t!("errors.export_statistic", locale = locale))?;

    let Some(export) = export else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.file_name),
            ),
        ],
        export.content,
    )
        .into_response())
}
