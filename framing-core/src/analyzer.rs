//! # Análise em Lote: Orquestrador
//!
//! Executa o fluxo completo, de forma linear e síncrona:
//!
//! 1. **Carga**: lê o CSV, normaliza o bloco e converte `published_at`.
//! 2. **Tokenização**: extrai os tokens de `text_all` (todo texto tratado como inglês).
//! 3. **Sentimento**: pontua todos os artigos com o classificador.
//! 4. **Vocabulário**: contagens por bloco sem as palavras comuns demais.
//! 5. **Persistência**: grava as duas tabelas Parquet (tudo-ou-nada).
//!
//! Cada execução recalcula tudo e substitui as saídas anteriores.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::article::Article;
use crate::config::AnalyzerConfig;
use crate::dataset::load_articles;
use crate::error::{FramingError, Result};
use crate::sentiment::{score_texts, SentimentClassifier};
use crate::store::write_outputs;
use crate::vocab::{build_vocab, VocabEntry};

/// Resumo de uma execução.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub articles: usize,
    /// Artigos por código de bloco.
    pub per_bloc: BTreeMap<String, usize>,
    /// Artigos cuja data não pôde ser interpretada.
    pub unparsed_dates: usize,
    pub vocab_entries: usize,
    pub articles_path: PathBuf,
    pub vocab_path: PathBuf,
}

/// Contagem de artigos por bloco (ordenada pelo código).
pub fn bloc_counts(articles: &[Article]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for article in articles {
        *counts.entry(article.lang.clone()).or_insert(0) += 1;
    }
    counts
}

/// Enriquece os artigos com sentimento e calcula o vocabulário, sem tocar no disco.
pub fn enrich<C: SentimentClassifier + ?Sized>(
    articles: Vec<Article>,
    classifier: &C,
    config: &AnalyzerConfig,
) -> Result<(Vec<Article>, Vec<VocabEntry>)> {
    let texts: Vec<String> = articles.iter().map(|a| a.text_all.clone()).collect();
    let scores = score_texts(classifier, &texts, config.model.batch_size)?;
    if scores.len() != articles.len() {
        return Err(FramingError::Inference(format!(
            "{} pontuações para {} artigos",
            scores.len(),
            articles.len()
        )));
    }

    let articles: Vec<Article> = articles
        .into_iter()
        .zip(scores.rows)
        .map(|(article, s)| article.with_sentiment(s))
        .collect();
    let vocab = build_vocab(&articles, config.high_df_threshold);
    Ok((articles, vocab))
}

/// Executa a análise completa e grava as saídas em `config.out_dir`.
pub fn run_analysis<C: SentimentClassifier + ?Sized>(
    config: &AnalyzerConfig,
    classifier: &C,
) -> Result<AnalysisSummary> {
    config.validate()?;

    // === Passo 1: Carga e normalização ===
    let articles = load_articles(&config.input)?;
    let per_bloc = bloc_counts(&articles);
    info!(langs = ?per_bloc.keys().collect::<Vec<_>>(), "blocos no CSV");
    for (lang, count) in &per_bloc {
        info!(lang = %lang, count, "artigos por bloco");
    }

    let unparsed_dates = articles.iter().filter(|a| a.published_at.is_none()).count();
    if unparsed_dates > 0 {
        warn!(unparsed_dates, "datas de publicação inválidas convertidas em nulo");
    }

    // === Passos 2-4: tokens (já em Article), sentimento, vocabulário ===
    info!(articles = articles.len(), model = classifier.name(), "pontuando sentimento");
    let (articles, vocab) = enrich(articles, classifier, config)?;

    // === Passo 5: Persistência ===
    let articles_path = config.articles_path();
    let vocab_path = config.vocab_path();
    write_outputs(&articles, &vocab, &articles_path, &vocab_path)?;

    Ok(AnalysisSummary {
        articles: articles.len(),
        per_bloc,
        unparsed_dates,
        vocab_entries: vocab.len(),
        articles_path,
        vocab_path,
    })
}
