//! # Leitura do CSV de artigos
//!
//! Colunas exigidas: `title`, `text`, `published_at`, `source`, `url`, `lang`.
//! Colunas extras são ignoradas. Linhas curtas, campos vazios e marcadores como
//! `NA`/`null` viram `None`;
//! a ausência de qualquer coluna exigida (ou do próprio arquivo) aborta a execução.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::article::{Article, RawArticle};
use crate::error::{FramingError, Result};

/// Colunas obrigatórias do CSV de entrada, na ordem documentada.
pub const REQUIRED_COLUMNS: [&str; 6] = ["title", "text", "published_at", "source", "url", "lang"];

/// Posição de cada coluna obrigatória no cabeçalho.
struct ColumnIndex {
    title: usize,
    text: usize,
    published_at: usize,
    source: usize,
    url: usize,
    lang: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| find(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(FramingError::MissingColumns(missing));
        }
        // as posições existem: checadas logo acima
        let at = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            title: at("title"),
            text: at("text"),
            published_at: at("published_at"),
            source: at("source"),
            url: at("url"),
            lang: at("lang"),
        })
    }
}

/// Marcadores tratados como valor ausente (os mesmos que o pandas reconhece por padrão).
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Campo da linha; bytes fora de UTF-8 são substituídos por `U+FFFD`.
fn field(record: &ByteRecord, idx: usize) -> Option<String> {
    let value = String::from_utf8_lossy(record.get(idx)?);
    if NA_VALUES.contains(&&*value) {
        return None;
    }
    Some(value.into_owned())
}

/// Lê linhas cruas de qualquer fonte CSV.
///
/// Cada registro do arquivo vira exatamente uma linha: campos ilegíveis são
/// recuperados com substituição e campos faltando viram `None`.
pub fn read_raw_articles<R: Read>(reader: R) -> Result<Vec<RawArticle>> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = StringRecord::from_byte_record_lossy(csv.byte_headers()?.clone());
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut rows = Vec::new();
    let mut lossy = 0usize;
    for record in csv.byte_records() {
        let record = record?;
        if std::str::from_utf8(record.as_slice()).is_err() {
            lossy += 1;
        }
        rows.push(RawArticle {
            title: field(&record, columns.title),
            text: field(&record, columns.text),
            published_at: field(&record, columns.published_at),
            source: field(&record, columns.source),
            url: field(&record, columns.url),
            lang: field(&record, columns.lang),
        });
    }
    if lossy > 0 {
        warn!(rows = lossy, "linhas com bytes fora de UTF-8 recuperadas com substituição");
    }
    debug!(rows = rows.len(), "CSV lido");
    Ok(rows)
}

/// Carrega e enriquece os artigos do arquivo em `path`.
pub fn load_articles(path: &Path) -> Result<Vec<Article>> {
    if !path.exists() {
        return Err(FramingError::MissingFile(path.to_path_buf()));
    }
    let raw = read_raw_articles(File::open(path)?)?;
    Ok(raw.into_iter().map(Article::from_raw).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
title,text,published_at,source,url,lang,extra
Troops advance,Soldiers report troops advance near border,2024-03-01,NHK,https://a,\" JP \",x
,Only body here,not a date,TASS,https://b,RU,y
Short row,,2024-03-02
";

    #[test]
    fn test_reads_and_tolerates_bad_rows() {
        let rows = read_raw_articles(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].lang.as_deref(), Some(" JP "));
        assert_eq!(rows[1].title, None);
        assert_eq!(rows[1].published_at.as_deref(), Some("not a date"));
        assert_eq!(rows[2].text, None);
        assert_eq!(rows[2].lang, None);
    }

    #[test]
    fn test_invalid_utf8_row_kept() {
        let mut csv = b"title,text,published_at,source,url,lang\n".to_vec();
        csv.extend_from_slice(b"Troops advance,Soldiers near border,2024-03-01,NHK,https://a,jp\n");
        csv.extend_from_slice(b"Sanctions,Kremlin \xff rejects,2024-03-01,TASS,https://b,ru\n");
        csv.extend_from_slice(b"Drone strike,Air defense,2024-03-02,Ukrinform,https://c,ua\n");

        let rows = read_raw_articles(csv.as_slice()).unwrap();
        let langs: Vec<_> = rows.iter().map(|r| r.lang.as_deref()).collect();
        assert_eq!(langs, vec![Some("jp"), Some("ru"), Some("ua")]);
        assert_eq!(rows[1].text.as_deref(), Some("Kremlin \u{FFFD} rejects"));
        assert_eq!(rows[1].source.as_deref(), Some("TASS"));
    }

    #[test]
    fn test_na_markers_are_missing() {
        let csv = "title,text,published_at,source,url,lang\nnull,Body text,NaN,N/A,None,NA\n";
        let rows = read_raw_articles(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].title, None);
        assert_eq!(rows[0].text.as_deref(), Some("Body text"));
        assert_eq!(rows[0].published_at, None);
        assert_eq!(rows[0].source, None);
        assert_eq!(rows[0].url, None);
        assert_eq!(rows[0].lang, None);

        let article = Article::from_raw(rows[0].clone());
        assert_eq!(article.lang, "nan");
        assert!(!article.tokens.iter().any(|t| t == "null"));
    }

    #[test]
    fn test_missing_columns_is_fatal() {
        let err = read_raw_articles("title,text,lang\na,b,c\n".as_bytes()).unwrap_err();
        match err {
            FramingError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["published_at", "source", "url"]);
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn test_load_articles_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let articles = load_articles(file.path()).unwrap();
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].lang, "jp");
        assert_eq!(articles[1].lang, "ru");
        assert_eq!(articles[1].published_at, None);
        assert!(articles[0].date.is_some());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_articles(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, FramingError::MissingFile(_)));
    }
}
