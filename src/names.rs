// i18n
pub const LOCALE_COOKIE_NAME: &str = "lang";
pub const DEFAULT_LOCALE: &str = "en";
pub const SUPPORTED_LOCALES: &[&str] = &["en", "de"];

/// Integer language id used for translated survey content.
pub const CONTENT_LANGUAGE_HEADER: &str = "x-content-language";

pub fn survey_url(id: i64) -> String {
    format!("/surveys/{id}")
}

pub fn question_group_url(id: i64) -> String {
    format!("/groups/{id}")
}

pub fn question_url(id: i64) -> String {
    format!("/questions/{id}")
}

pub fn answer_url(id: i64) -> String {
    format!("/answers/{id}")
}

pub fn subject_url(id: i64) -> String {
    format!("/subjects/{id}")
}
