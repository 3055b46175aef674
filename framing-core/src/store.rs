//! # Persistência Colunar (Parquet)
//!
//! A análise grava duas tabelas, o único ponto de troca entre os dois executáveis:
//!
//! | Arquivo                           | Colunas                                                        |
//! |-----------------------------------|----------------------------------------------------------------|
//! | `articles_with_sentiment.parquet` | title, text, published_at, source, url, lang, text_all, tokens, negative, neutral, positive, date |
//! | `vocab.parquet`                   | lang, word, freq                                               |
//!
//! A gravação é tudo-ou-nada: as duas tabelas vão primeiro para arquivos temporários
//! e só são renomeadas quando ambas foram escritas.
//!
//! A leitura é tolerante a tabelas produzidas por outras ferramentas: timestamps em
//! qualquer unidade, floats de 32 ou 64 bits, strings normais ou "large", e a coluna
//! `date` pode faltar (é derivada de `published_at`).

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Date32Type, Float32Type, Float64Type, Int32Type, Int64Type, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use arrow_array::{
    Array, ArrayRef, Date32Array, Int64Array, RecordBatch, StringArray,
    TimestampMillisecondArray,
};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use chrono::{DateTime, NaiveDate, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::article::{normalize_bloc, Article};
use crate::error::{FramingError, Result};
use crate::sentiment::SentimentTable;
use crate::vocab::VocabEntry;

const ARTICLES_TABLE: &str = "articles_with_sentiment";
const VOCAB_TABLE: &str = "vocab";

/// Schema da tabela de artigos enriquecidos.
pub fn articles_schema() -> Schema {
    Schema::new(vec![
        Field::new("title", DataType::Utf8, true),
        Field::new("text", DataType::Utf8, true),
        Field::new(
            "published_at",
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            true,
        ),
        Field::new("source", DataType::Utf8, true),
        Field::new("url", DataType::Utf8, true),
        Field::new("lang", DataType::Utf8, false),
        Field::new("text_all", DataType::Utf8, false),
        Field::new(
            "tokens",
            DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
            false,
        ),
        Field::new("negative", DataType::Float64, false),
        Field::new("neutral", DataType::Float64, false),
        Field::new("positive", DataType::Float64, false),
        Field::new("date", DataType::Date32, true),
    ])
}

/// Schema da tabela de vocabulário.
pub fn vocab_schema() -> Schema {
    Schema::new(vec![
        Field::new("lang", DataType::Utf8, false),
        Field::new("word", DataType::Utf8, false),
        Field::new("freq", DataType::Int64, false),
    ])
}

/// Converte os artigos em um `RecordBatch`.
pub fn articles_batch(articles: &[Article]) -> Result<RecordBatch> {
    let opt_str = |f: fn(&Article) -> Option<&str>| -> ArrayRef {
        Arc::new(articles.iter().map(f).collect::<StringArray>())
    };
    // negative, neutral, positive: mesmas colunas da tabela de sentimento
    let sentiment = SentimentTable {
        rows: articles.iter().map(|a| a.sentiment).collect(),
    }
    .to_record_batch()?;

    let published_at = TimestampMillisecondArray::from(
        articles
            .iter()
            .map(|a| a.published_at.map(|dt| dt.timestamp_millis()))
            .collect::<Vec<_>>(),
    )
    .with_timezone("UTC");

    let mut tokens = ListBuilder::new(StringBuilder::new());
    for article in articles {
        for token in &article.tokens {
            tokens.values().append_value(token);
        }
        tokens.append(true);
    }

    let dates: Date32Array = articles
        .iter()
        .map(|a| a.date.map(Date32Type::from_naive_date))
        .collect();

    let batch = RecordBatch::try_new(
        Arc::new(articles_schema()),
        vec![
            opt_str(|a| a.title.as_deref()),
            opt_str(|a| a.text.as_deref()),
            Arc::new(published_at),
            opt_str(|a| a.source.as_deref()),
            opt_str(|a| a.url.as_deref()),
            opt_str(|a| Some(a.lang.as_str())),
            opt_str(|a| Some(a.text_all.as_str())),
            Arc::new(tokens.finish()),
            Arc::clone(sentiment.column(0)),
            Arc::clone(sentiment.column(1)),
            Arc::clone(sentiment.column(2)),
            Arc::new(dates),
        ],
    )?;
    Ok(batch)
}

/// Converte o vocabulário em um `RecordBatch`.
pub fn vocab_batch(vocab: &[VocabEntry]) -> Result<RecordBatch> {
    let langs: StringArray = vocab.iter().map(|e| Some(e.lang.as_str())).collect();
    let words: StringArray = vocab.iter().map(|e| Some(e.word.as_str())).collect();
    let freqs = Int64Array::from_iter_values(vocab.iter().map(|e| e.freq));
    let batch = RecordBatch::try_new(
        Arc::new(vocab_schema()),
        vec![Arc::new(langs), Arc::new(words), Arc::new(freqs)],
    )?;
    Ok(batch)
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

fn tmp_path(path: &Path) -> PathBuf {
    sibling_path(path, ".tmp")
}

fn backup_path(path: &Path) -> PathBuf {
    sibling_path(path, ".bak")
}

/// Devolve `path` ao estado anterior: o backup volta ao lugar, ou o arquivo novo some.
fn restore(path: &Path, backup: &Path, had_previous: bool) {
    if had_previous {
        if let Err(err) = fs::rename(backup, path) {
            warn!(path = %path.display(), %err, "falha ao restaurar a tabela anterior");
        }
    } else {
        let _ = fs::remove_file(path);
    }
}

/// Troca os dois arquivos temporários pelos definitivos.
///
/// A tabela de artigos anterior é movida para um backup antes da troca; se a
/// tabela de vocabulário não puder ser colocada no lugar, o backup é restaurado.
fn commit_outputs(
    articles_tmp: &Path,
    articles_path: &Path,
    vocab_tmp: &Path,
    vocab_path: &Path,
) -> Result<()> {
    let backup = backup_path(articles_path);
    let had_previous = articles_path.exists();
    if had_previous {
        fs::rename(articles_path, &backup)?;
    }

    if let Err(err) = fs::rename(articles_tmp, articles_path) {
        restore(articles_path, &backup, had_previous);
        return Err(err.into());
    }
    if let Err(err) = fs::rename(vocab_tmp, vocab_path) {
        restore(articles_path, &backup, had_previous);
        return Err(err.into());
    }

    if had_previous {
        let _ = fs::remove_file(&backup);
    }
    Ok(())
}

/// Grava as duas tabelas; nenhuma é substituída se qualquer escrita falhar.
pub fn write_outputs(
    articles: &[Article],
    vocab: &[VocabEntry],
    articles_path: &Path,
    vocab_path: &Path,
) -> Result<()> {
    for dir in [articles_path.parent(), vocab_path.parent()].into_iter().flatten() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let articles_tmp = tmp_path(articles_path);
    let vocab_tmp = tmp_path(vocab_path);

    let written = articles_batch(articles)
        .and_then(|batch| write_parquet(&articles_tmp, &batch))
        .and_then(|_| vocab_batch(vocab))
        .and_then(|batch| write_parquet(&vocab_tmp, &batch))
        .and_then(|_| commit_outputs(&articles_tmp, articles_path, &vocab_tmp, vocab_path));
    if let Err(err) = written {
        let _ = fs::remove_file(&articles_tmp);
        let _ = fs::remove_file(&vocab_tmp);
        return Err(err);
    }

    info!(path = %articles_path.display(), rows = articles.len(), "tabela de artigos salva");
    info!(path = %vocab_path.display(), rows = vocab.len(), "tabela de vocabulário salva");
    Ok(())
}

/// Linha da tabela de artigos, como o dashboard a consome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRow {
    pub lang: String,
    pub published_at: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
    pub source: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl From<&Article> for ArticleRow {
    fn from(a: &Article) -> Self {
        Self {
            lang: a.lang.clone(),
            published_at: a.published_at,
            date: a.date,
            source: a.source.clone(),
            title: a.title.clone(),
            url: a.url.clone(),
            negative: a.sentiment.negative,
            neutral: a.sentiment.neutral,
            positive: a.sentiment.positive,
        }
    }
}

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    if !path.exists() {
        return Err(FramingError::MissingFile(path.to_path_buf()));
    }
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(batches)
}

fn bad_column(table: &'static str, column: &str) -> FramingError {
    FramingError::BadColumn {
        table,
        column: column.to_string(),
    }
}

fn column<'b>(batch: &'b RecordBatch, table: &'static str, name: &str) -> Result<&'b ArrayRef> {
    batch.column_by_name(name).ok_or_else(|| bad_column(table, name))
}

fn strings(batch: &RecordBatch, table: &'static str, name: &str) -> Result<Vec<Option<String>>> {
    let array = column(batch, table, name)?;
    let values = match array.data_type() {
        DataType::Utf8 => array
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect(),
        DataType::LargeUtf8 => array
            .as_string::<i64>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect(),
        DataType::Null => vec![None; array.len()],
        _ => return Err(bad_column(table, name)),
    };
    Ok(values)
}

fn floats(batch: &RecordBatch, table: &'static str, name: &str) -> Result<Vec<f64>> {
    let array = column(batch, table, name)?;
    let values = match array.data_type() {
        DataType::Float64 => array
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect(),
        DataType::Float32 => array
            .as_primitive::<Float32Type>()
            .iter()
            .map(|v| v.map(f64::from).unwrap_or(f64::NAN))
            .collect(),
        _ => return Err(bad_column(table, name)),
    };
    Ok(values)
}

fn integers(batch: &RecordBatch, table: &'static str, name: &str) -> Result<Vec<i64>> {
    let array = column(batch, table, name)?;
    let values = match array.data_type() {
        DataType::Int64 => array
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.unwrap_or(0))
            .collect(),
        DataType::Int32 => array
            .as_primitive::<Int32Type>()
            .iter()
            .map(|v| v.map(i64::from).unwrap_or(0))
            .collect(),
        _ => return Err(bad_column(table, name)),
    };
    Ok(values)
}

fn timestamps(batch: &RecordBatch, name: &str) -> Result<Vec<Option<DateTime<Utc>>>> {
    let Some(array) = batch.column_by_name(name) else {
        return Ok(vec![None; batch.num_rows()]);
    };
    let naive: Vec<_> = match array.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => {
            let a = array.as_primitive::<TimestampSecondType>();
            (0..a.len()).map(|i| a.value_as_datetime(i).filter(|_| a.is_valid(i))).collect()
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let a = array.as_primitive::<TimestampMillisecondType>();
            (0..a.len()).map(|i| a.value_as_datetime(i).filter(|_| a.is_valid(i))).collect()
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let a = array.as_primitive::<TimestampMicrosecondType>();
            (0..a.len()).map(|i| a.value_as_datetime(i).filter(|_| a.is_valid(i))).collect()
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let a = array.as_primitive::<TimestampNanosecondType>();
            (0..a.len()).map(|i| a.value_as_datetime(i).filter(|_| a.is_valid(i))).collect()
        }
        DataType::Null => vec![None; array.len()],
        _ => return Err(bad_column(ARTICLES_TABLE, name)),
    };
    Ok(naive.into_iter().map(|n| n.map(|n| n.and_utc())).collect())
}

fn dates(batch: &RecordBatch, name: &str) -> Result<Option<Vec<Option<NaiveDate>>>> {
    let Some(array) = batch.column_by_name(name) else {
        return Ok(None);
    };
    match array.data_type() {
        DataType::Date32 => {
            let a = array.as_primitive::<Date32Type>();
            Ok(Some(
                (0..a.len())
                    .map(|i| a.value_as_date(i).filter(|_| a.is_valid(i)))
                    .collect(),
            ))
        }
        DataType::Null => Ok(None),
        _ => Err(bad_column(ARTICLES_TABLE, name)),
    }
}

/// Lê a tabela de artigos, renormalizando o código de bloco.
pub fn read_article_rows(path: &Path) -> Result<Vec<ArticleRow>> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let langs = strings(&batch, ARTICLES_TABLE, "lang")?;
        let published = timestamps(&batch, "published_at")?;
        let stored_dates = dates(&batch, "date")?;
        let sources = strings(&batch, ARTICLES_TABLE, "source")?;
        let titles = strings(&batch, ARTICLES_TABLE, "title")?;
        let urls = strings(&batch, ARTICLES_TABLE, "url")?;
        let negative = floats(&batch, ARTICLES_TABLE, "negative")?;
        let neutral = floats(&batch, ARTICLES_TABLE, "neutral")?;
        let positive = floats(&batch, ARTICLES_TABLE, "positive")?;

        for i in 0..batch.num_rows() {
            let date = match &stored_dates {
                Some(d) => d[i],
                None => published[i].map(|dt| dt.date_naive()),
            };
            rows.push(ArticleRow {
                lang: normalize_bloc(langs[i].as_deref().unwrap_or("None")),
                published_at: published[i],
                date,
                source: sources[i].clone(),
                title: titles[i].clone(),
                url: urls[i].clone(),
                negative: negative[i],
                neutral: neutral[i],
                positive: positive[i],
            });
        }
    }
    Ok(rows)
}

/// Lê a tabela de vocabulário, renormalizando o código de bloco.
pub fn read_vocab(path: &Path) -> Result<Vec<VocabEntry>> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let langs = strings(&batch, VOCAB_TABLE, "lang")?;
        let words = strings(&batch, VOCAB_TABLE, "word")?;
        let freqs = integers(&batch, VOCAB_TABLE, "freq")?;
        for ((lang, word), freq) in langs.into_iter().zip(words).zip(freqs) {
            rows.push(VocabEntry {
                lang: normalize_bloc(lang.as_deref().unwrap_or("None")),
                word: word.unwrap_or_default(),
                freq,
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::RawArticle;
    use crate::sentiment::SentimentScores;

    fn sample_articles() -> Vec<Article> {
        vec![
            Article::from_raw(RawArticle {
                title: Some("Troops advance".into()),
                text: Some("Soldiers report troops advance near border".into()),
                published_at: Some("2024-03-01T10:00:00Z".into()),
                source: Some("NHK".into()),
                url: Some("https://a".into()),
                lang: Some("jp".into()),
            })
            .with_sentiment(SentimentScores { negative: 0.2, neutral: 0.5, positive: 0.3 }),
            Article::from_raw(RawArticle {
                title: None,
                text: Some("Kremlin statement".into()),
                published_at: Some("garbage".into()),
                source: None,
                url: None,
                lang: Some("ru".into()),
            })
            .with_sentiment(SentimentScores { negative: 0.7, neutral: 0.2, positive: 0.1 }),
        ]
    }

    #[test]
    fn test_batches_match_schemas() {
        let batch = articles_batch(&sample_articles()).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 12);
        assert!(batch.column_by_name("lang_display").is_none());

        let vocab = vocab_batch(&[]).unwrap();
        assert_eq!(vocab.num_rows(), 0);
        assert_eq!(vocab.num_columns(), 3);
    }

    #[test]
    fn test_write_then_read_for_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let articles_path = dir.path().join("out").join("articles_with_sentiment.parquet");
        let vocab_path = dir.path().join("out").join("vocab.parquet");
        let vocab = vec![
            VocabEntry { lang: "jp".into(), word: "troops".into(), freq: 2 },
            VocabEntry { lang: "ru".into(), word: "kremlin".into(), freq: 1 },
        ];

        write_outputs(&sample_articles(), &vocab, &articles_path, &vocab_path).unwrap();
        assert!(!tmp_path(&articles_path).exists());

        let rows = read_article_rows(&articles_path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].lang, "jp");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(rows[0].published_at, sample_articles()[0].published_at);
        assert_eq!(rows[1].published_at, None);
        assert_eq!(rows[1].date, None);
        assert_eq!(rows[1].title, None);
        assert!((rows[1].negative - 0.7).abs() < 1e-12);

        assert_eq!(read_vocab(&vocab_path).unwrap(), vocab);
    }

    #[test]
    fn test_failed_vocab_replace_keeps_previous_articles() {
        let dir = tempfile::tempdir().unwrap();
        let articles_path = dir.path().join("articles_with_sentiment.parquet");
        let vocab_path = dir.path().join("vocab.parquet");
        write_outputs(&sample_articles(), &[], &articles_path, &vocab_path).unwrap();
        let before = fs::read(&articles_path).unwrap();

        // um diretório não vazio no lugar do vocabulário impede o rename final
        fs::remove_file(&vocab_path).unwrap();
        fs::create_dir(&vocab_path).unwrap();
        fs::write(vocab_path.join("keep"), b"x").unwrap();

        let result = write_outputs(&sample_articles()[..1], &[], &articles_path, &vocab_path);
        assert!(result.is_err());
        assert_eq!(fs::read(&articles_path).unwrap(), before);
        assert_eq!(read_article_rows(&articles_path).unwrap().len(), 2);
        assert!(!tmp_path(&articles_path).exists());
        assert!(!tmp_path(&vocab_path).exists());
        assert!(!backup_path(&articles_path).exists());
    }

    #[test]
    fn test_failed_first_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let articles_path = dir.path().join("articles_with_sentiment.parquet");
        let vocab_path = dir.path().join("vocab.parquet");
        fs::create_dir(&vocab_path).unwrap();
        fs::write(vocab_path.join("keep"), b"x").unwrap();

        assert!(write_outputs(&sample_articles(), &[], &articles_path, &vocab_path).is_err());
        assert!(!articles_path.exists());
        assert!(!tmp_path(&articles_path).exists());
        assert!(!tmp_path(&vocab_path).exists());
    }

    #[test]
    fn test_reader_renormalizes_bloc_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.parquet");
        let batch = vocab_batch(&[VocabEntry { lang: " West ".into(), word: "nato".into(), freq: 3 }]).unwrap();
        write_parquet(&path, &batch).unwrap();
        assert_eq!(read_vocab(&path).unwrap()[0].lang, "west");
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let err = read_vocab(Path::new("/nope/vocab.parquet")).unwrap_err();
        assert!(matches!(err, FramingError::MissingFile(_)));
    }
}
