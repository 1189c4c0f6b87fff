rust_i18n::i18n!("locales", fallback = "en");

pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod names;
pub mod rejections;
pub mod services;
pub mod statistic;

use axum::Router;

use crate::db::{Db, LanguageId};
use crate::services::statistic::StatisticService;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub statistics: StatisticService,
    /// Content language when a request names none.
    pub default_language: LanguageId,
}

impl AppState {
    pub fn new(db: Db, default_language: LanguageId) -> Self {
        Self {
            statistics: StatisticService::new(db.clone()),
            db,
            default_language,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::survey::routes())
        .merge(handlers::content::routes())
        .merge(handlers::subject::routes())
        .merge(handlers::statistic::routes())
        .with_state(state)
}
