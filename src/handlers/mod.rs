pub mod content;
pub mod statistic;
pub mod subject;
pub mod survey;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
struct Created {
    id: i64,
}

/// `201 Created` with the new id and its URL in `Location`.
fn created(id: i64, location: String) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(Created { id }),
    )
}

#[derive(Serialize)]
struct Moved {
    id: i64,
    order: i64,
}

fn moved(id: i64, order: i64) -> impl IntoResponse {
    Json(Moved { id, order })
}
