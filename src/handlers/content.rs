//! Question groups, questions and answers. All three are ordered inside their
//! parent and share the move endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_i18n::t;
use serde::Deserialize;

use crate::{
    db::{
        filter::{AnswerFilter, GroupFilter, QuestionFilter},
        Answer, OrderedTable, QuestionType,
    },
    extractors::{ContentLanguage, Locale},
    models::{ContentInput, QuestionInput},
    names,
    rejections::{AppError, ResultExt},
    AppState,
};

use super::{created, moved};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/surveys/{id}/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/groups/{id}/move-up", post(move_group_up))
        .route("/groups/{id}/move-down", post(move_group_down))
        .route("/groups/{id}/questions", get(list_questions).post(create_question))
        .route(
            "/questions/{id}",
            get(get_question).put(update_question).delete(delete_question),
        )
        .route("/questions/{id}/move-up", post(move_question_up))
        .route("/questions/{id}/move-down", post(move_question_down))
        .route("/questions/{id}/answers", get(list_answers).post(create_answer))
        .route(
            "/answers/{id}",
            get(get_answer).put(update_answer).delete(delete_answer),
        )
        .route("/answers/{id}/move-up", post(move_answer_up))
        .route("/answers/{id}/move-down", post(move_answer_down))
}

fn require_title(title: &str, locale: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Input(t!("errors.empty_title", locale = locale).into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Question groups
// ---------------------------------------------------------------------------

async fn list_groups(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(survey_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .survey(survey_id)
        .await
        .reject(t!("errors.load_survey", locale = locale))?;

    let groups = state
        .db
        .question_groups(&[GroupFilter::SurveyId(survey_id)], language)
        .await
        .reject(t!("errors.load_content", locale = locale))?;
    Ok(Json(groups))
}

async fn create_group(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(survey_id): Path<i64>,
    Json(input): Json<ContentInput>,
) -> Result<impl IntoResponse, AppError> {
    require_title(&input.title, &locale)?;

    let id = state
        .db
        .create_question_group(survey_id, language, &input)
        .await
        .reject(t!("errors.save_question_group", locale = locale))?;
    Ok(created(id, names::question_group_url(id)))
}

async fn get_group(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let group = state
        .db
        .question_group(id, language)
        .await
        .reject(t!("errors.load_content", locale = locale))?;
    Ok(Json(group))
}

async fn update_group(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(id): Path<i64>,
    Json(input): Json<ContentInput>,
) -> Result<impl IntoResponse, AppError> {
    require_title(&input.title, &locale)?;

    state
        .db
        .update_question_group(id, language, &input)
        .await
        .reject(t!("errors.save_question_group", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_group(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .delete_question_group(id)
        .await
        .reject(t!("errors.delete_question_group", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct QuestionQuery {
    #[serde(rename = "type")]
    question_type: Option<QuestionType>,
}

async fn list_questions(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(group_id): Path<i64>,
    Query(query): Query<QuestionQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .question_group(group_id, language)
        .await
        .reject(t!("errors.load_content", locale = locale))?;

    let mut filters = vec![QuestionFilter::GroupId(group_id)];
    if let Some(question_type) = query.question_type {
        filters.push(QuestionFilter::Type(question_type));
    }

    let questions = state
        .db
        .questions(&filters, language)
        .await
        .reject(t!("errors.load_content", locale = locale))?;
    Ok(Json(questions))
}

async fn create_question(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(group_id): Path<i64>,
    Json(input): Json<QuestionInput>,
) -> Result<impl IntoResponse, AppError> {
    require_title(&input.title, &locale)?;

    let id = state
        .db
        .create_question(group_id, language, &input)
        .await
        .reject(t!("errors.save_question", locale = locale))?;
    Ok(created(id, names::question_url(id)))
}

async fn get_question(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .db
        .question(id, language)
        .await
        .reject(t!("errors.load_content", locale = locale))?;
    Ok(Json(question))
}

async fn update_question(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(id): Path<i64>,
    Json(input): Json<QuestionInput>,
) -> Result<impl IntoResponse, AppError> {
    require_title(&input.title, &locale)?;

    state
        .db
        .update_question(id, language, &input)
        .await
        .reject(t!("errors.save_question", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_question(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .delete_question(id)
        .await
        .reject(t!("errors.delete_question", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

async fn list_answers(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(question_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let survey = state
        .db
        .survey_of_question(question_id)
        .await
        .reject(t!("errors.load_content", locale = locale))?;
    if !survey.use_answers {
        return Ok(Json(Vec::<Answer>::new()));
    }

    let answers = state
        .db
        .answers(&[AnswerFilter::QuestionId(question_id)], language)
        .await
        .reject(t!("errors.load_content", locale = locale))?;
    Ok(Json(answers))
}

async fn create_answer(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(question_id): Path<i64>,
    Json(input): Json<ContentInput>,
) -> Result<impl IntoResponse, AppError> {
    require_title(&input.title, &locale)?;

    let id = state
        .db
        .create_answer(question_id, language, &input)
        .await
        .reject(t!("errors.save_answer", locale = locale))?;
    Ok(created(id, names::answer_url(id)))
}

async fn get_answer(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let answer = state
        .db
        .answer(id, language)
        .await
        .reject(t!("errors.load_content", locale = locale))?;
    Ok(Json(answer))
}

async fn update_answer(
    State(state): State<AppState>,
    Locale(locale): Locale,
    ContentLanguage(language): ContentLanguage,
    Path(id): Path<i64>,
    Json(input): Json<ContentInput>,
) -> Result<impl IntoResponse, AppError> {
    require_title(&input.title, &locale)?;

    state
        .db
        .update_answer(id, language, &input)
        .await
        .reject(t!("errors.save_answer", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_answer(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .delete_answer(id)
        .await
        .reject(t!("errors.delete_answer", locale = locale))?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

async fn move_item(
    state: AppState,
    locale: String,
    table: OrderedTable,
    id: i64,
    direction: Direction,
) -> Result<impl IntoResponse, AppError> {
    let result = match direction {
        Direction::Up => state.db.move_up(table, id).await,
        Direction::Down => state.db.move_down(table, id).await,
    };
    let order = result.reject(t!("errors.move_item", locale = locale))?;
    Ok(moved(id, order))
}

async fn move_group_up(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    move_item(state, locale, OrderedTable::QuestionGroup, id, Direction::Up).await
}

async fn move_group_down(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    move_item(state, locale, OrderedTable::QuestionGroup, id, Direction::Down).await
}

async fn move_question_up(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    move_item(state, locale, OrderedTable::Question, id, Direction::Up).await
}

async fn move_question_down(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    move_item(state, locale, OrderedTable::Question, id, Direction::Down).await
}

async fn move_answer_up(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    move_item(state, locale, OrderedTable::Answer, id, Direction::Up).await
}

async fn move_answer_down(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    move_item(state, locale, OrderedTable::Answer, id, Direction::Down).await
}
