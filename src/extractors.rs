use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use rust_i18n::t;

use crate::{db::LanguageId, names, rejections::AppError, AppState};

/// Extracts the locale from the `lang` cookie, falling back to the browser's
/// `Accept-Language` header, then to `"en"`.
pub struct Locale(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Locale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(parts))
    }
}

impl Locale {
    fn from_headers(parts: &Parts) -> Self {
        let jar = CookieJar::from_headers(&parts.headers);
        let locale = jar
            .get(names::LOCALE_COOKIE_NAME)
            .and_then(|c| match_supported_locale(c.value()))
            .or_else(|| {
                parts
                    .headers
                    .get(header::ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(locale_from_accept_language)
            })
            .unwrap_or(names::DEFAULT_LOCALE);
        Locale(locale.to_string())
    }
}

/// Match a language tag such as `de-CH` against the supported locales.
fn match_supported_locale(lang: &str) -> Option<&'static str> {
    let primary = lang.split('-').next().unwrap_or(lang).trim();
    names::SUPPORTED_LOCALES
        .iter()
        .find(|supported| supported.eq_ignore_ascii_case(primary))
        .copied()
}

/// Supported locale with the highest quality in an `Accept-Language` header.
/// Entries with `q=0` are refused; on equal quality the earlier entry wins.
fn locale_from_accept_language(header: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, f32)> = None;

    for entry in header.split(',') {
        let mut params = entry.split(';').map(str::trim);
        let Some(locale) = params.next().and_then(match_supported_locale) else {
            continue;
        };
        let quality = params
            .find_map(|p| p.strip_prefix("q="))
            .and_then(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);

        if quality > 0.0 && best.map_or(true, |(_, q)| quality > q) {
            best = Some((locale, quality));
        }
    }

    best.map(|(locale, _)| locale)
}

/// Language of survey content, from the `X-Content-Language` header or the
/// configured default.
pub struct ContentLanguage(pub LanguageId);

impl FromRequestParts<AppState> for ContentLanguage {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(names::CONTENT_LANGUAGE_HEADER) else {
            return Ok(ContentLanguage(state.default_language));
        };

        match value.to_str().ok().and_then(|v| v.trim().parse::<i64>().ok()) {
            Some(id) => Ok(ContentLanguage(LanguageId(id))),
            None => {
                tracing::warn!("invalid content language header: {value:?}");
                let Locale(locale) = Locale::from_headers(parts);
                Err(AppError::Input(
                    t!("errors.content_language", locale = locale).into(),
                ))
            }
        }
    }
}
