// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use crate::common::i18n::DEFAULT_LANG;

// Nosso extrator de idioma
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    /// Lê o primeiro idioma do Accept-Language ("ar-EG" -> "ar").
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let lang = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn picks_primary_subtag_of_preferred_language() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ar-EG,ar;q=0.9,en;q=0.8"));
        assert_eq!(Locale::from_headers(&headers).0, "ar");
    }

    #[test]
    fn defaults_to_english() {
        assert_eq!(Locale::from_headers(&HeaderMap::new()).0, "en");
    }
}
