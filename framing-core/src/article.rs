//! # Registro de artigo e campos derivados
//!
//! Cada linha do CSV vira um [`Article`]. Os campos derivados (`text_all`, `tokens`,
//! `date`) são calculados uma vez em [`Article::from_raw`]; as pontuações de
//! sentimento são anexadas depois da inferência.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sentiment::SentimentScores;
use crate::tokenizer::{combine_title_text, tokenize};

/// Normaliza o código de bloco: remove espaços nas pontas e converte para minúsculas.
///
/// As duas tabelas (artigos e vocabulário) precisam concordar neste código para que
/// o dashboard consiga cruzá-las.
pub fn normalize_bloc(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Formatos com data e hora, sem fuso (interpretados como UTC).
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Formatos com deslocamento numérico explícito.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S %z",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%B %d, %Y", "%b %d, %Y"];

/// Converte `published_at` em timestamp UTC.
///
/// Valores que não casam com nenhum formato conhecido viram `None`: uma data ruim
/// nunca derruba a execução.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Linha crua do CSV, já com os campos opcionais resolvidos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub text: Option<String>,
    pub published_at: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub lang: Option<String>,
}

/// Artigo enriquecido, pronto para ser persistido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: Option<String>,
    pub text: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub url: Option<String>,
    /// Código do bloco, já normalizado.
    pub lang: String,
    /// Título e corpo separados por um espaço.
    pub text_all: String,
    pub tokens: Vec<String>,
    /// Data de calendário (UTC) de `published_at`.
    pub date: Option<NaiveDate>,
    pub sentiment: SentimentScores,
}

impl Article {
    /// Normaliza o bloco, converte a data e calcula `text_all`/`tokens`/`date`.
    ///
    /// O sentimento começa zerado e é preenchido por [`Article::with_sentiment`].
    pub fn from_raw(raw: RawArticle) -> Self {
        let text_all = combine_title_text(raw.title.as_deref(), raw.text.as_deref());
        let tokens = tokenize(&text_all);
        let published_at = raw.published_at.as_deref().and_then(parse_published_at);
        // pandas converte NaN em "nan" ao fazer astype(str)
        let lang = normalize_bloc(raw.lang.as_deref().unwrap_or("nan"));

        Self {
            title: raw.title,
            text: raw.text,
            published_at,
            source: raw.source,
            url: raw.url,
            lang,
            text_all,
            tokens,
            date: published_at.map(|dt| dt.date_naive()),
            sentiment: SentimentScores::default(),
        }
    }

    pub fn with_sentiment(mut self, scores: SentimentScores) -> Self {
        self.sentiment = scores;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_normalize_bloc() {
        assert_eq!(normalize_bloc(" JP "), "jp");
        assert_eq!(normalize_bloc("West\t"), "west");
        assert_eq!(normalize_bloc("ru"), "ru");
    }

    #[test]
    fn test_parse_common_formats() {
        let dt = parse_published_at("2024-03-01T12:30:00Z").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2024, 3, 1, 12));

        let with_offset = parse_published_at("2024-03-01T01:00:00+09:00").unwrap();
        assert_eq!(with_offset.day(), 29);
        assert_eq!(with_offset.month(), 2);

        assert!(parse_published_at("2024-03-01 08:15:00").is_some());
        assert!(parse_published_at("2024-03-01").is_some());
        assert!(parse_published_at("2024/03/01").is_some());
        assert!(parse_published_at("Fri, 01 Mar 2024 10:00:00 +0000").is_some());
    }

    #[test]
    fn test_unparseable_dates_become_none() {
        assert_eq!(parse_published_at(""), None);
        assert_eq!(parse_published_at("yesterday"), None);
        assert_eq!(parse_published_at("2024-13-45"), None);
    }

    #[test]
    fn test_from_raw_derives_fields() {
        let article = Article::from_raw(RawArticle {
            title: Some("Troops advance".into()),
            text: Some("Soldiers report troops advance near border".into()),
            published_at: Some("2024-03-01 23:59:00".into()),
            source: Some("NHK".into()),
            url: Some("https://example.org/a".into()),
            lang: Some(" JP ".into()),
        });
        assert_eq!(article.lang, "jp");
        assert_eq!(article.text_all, "Troops advance Soldiers report troops advance near border");
        assert!(article.tokens.contains(&"soldiers".to_string()));
        assert!(!article.tokens.contains(&"report".to_string()));
        assert_eq!(article.date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_from_raw_tolerates_missing_fields() {
        let article = Article::from_raw(RawArticle::default());
        assert_eq!(article.text_all, " ");
        assert!(article.tokens.is_empty());
        assert_eq!(article.published_at, None);
        assert_eq!(article.date, None);
        assert_eq!(article.lang, "nan");
    }
}
