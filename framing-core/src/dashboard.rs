//! # Visões do Dashboard
//!
//! Toda interação (troca de blocos, movimento do "Top N") recalcula as quatro visões
//! a partir das tabelas já carregadas em memória, que nunca são alteradas:
//!
//! 1. **Série temporal**: média diária das pontuações por bloco.
//! 2. **Distribuição**: estatísticas de box plot do score `positive` por bloco.
//! 3. **Palavras mais frequentes**: top N do vocabulário de cada bloco.
//! 4. **Tabela**: artigos filtrados, por bloco ↑ e data de publicação ↓.
//!
//! Seleção vazia (ou que não casa com nenhum artigo) produz
//! [`RenderOutcome::Warning`] e nenhuma visão é calculada.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::blocs::BlocRegistry;
use crate::config::DashboardConfig;
use crate::error::{FramingError, Result};
use crate::store::{read_article_rows, read_vocab, ArticleRow};
use crate::vocab::{sort_vocab, VocabEntry};

/// Mensagem exibida quando o filtro não deixa nenhum artigo.
pub const EMPTY_SELECTION_WARNING: &str = "No articles in the selected blocs.";

/// Blocos escolhidos pelo usuário.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Estado inicial: todos os blocos.
    All,
    /// Nomes de exibição escolhidos (possivelmente nenhum).
    Displays(Vec<String>),
}

/// Tabelas carregadas, imutáveis durante toda a sessão.
#[derive(Debug, Clone)]
pub struct DashboardData {
    articles: Vec<ArticleRow>,
    vocab: Vec<VocabEntry>,
    registry: BlocRegistry,
}

impl DashboardData {
    /// Monta os dados a partir das linhas já lidas.
    ///
    /// Falha com [`FramingError::NoBlocs`] se não há nenhum rótulo de bloco.
    pub fn new(articles: Vec<ArticleRow>, mut vocab: Vec<VocabEntry>) -> Result<Self> {
        let registry = BlocRegistry::from_codes(articles.iter().map(|a| a.lang.as_str()));
        if registry.is_empty() {
            return Err(FramingError::NoBlocs);
        }
        sort_vocab(&mut vocab);
        Ok(Self {
            articles,
            vocab,
            registry,
        })
    }

    /// Lê as duas tabelas do diretório de saída da análise.
    pub fn load(config: &DashboardConfig) -> Result<Self> {
        let articles = read_article_rows(&config.articles_path())?;
        let vocab = read_vocab(&config.vocab_path())?;
        info!(articles = articles.len(), vocab = vocab.len(), "tabelas carregadas");
        Self::new(articles, vocab)
    }

    pub fn registry(&self) -> &BlocRegistry {
        &self.registry
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    /// Converte a seleção em códigos internos; nomes desconhecidos são ignorados.
    pub fn resolve_selection(&self, selection: &Selection) -> Vec<String> {
        match selection {
            Selection::All => self.registry.blocs().iter().map(|b| b.code.clone()).collect(),
            Selection::Displays(names) => {
                let mut codes: Vec<String> = names
                    .iter()
                    .filter_map(|name| {
                        let code = self.registry.code_for_display(name);
                        if code.is_none() {
                            debug!(display = %name, "bloco desconhecido na seleção");
                        }
                        code.map(str::to_string)
                    })
                    .collect();
                codes.sort();
                codes.dedup();
                codes
            }
        }
    }

    /// Recalcula todas as visões para a seleção e o top N informados.
    pub fn render(&self, selection: &Selection, top_n: usize) -> RenderOutcome {
        let codes = self.resolve_selection(selection);
        let wanted: HashSet<&str> = codes.iter().map(String::as_str).collect();

        let articles: Vec<&ArticleRow> = self
            .articles
            .iter()
            .filter(|a| wanted.contains(a.lang.as_str()))
            .collect();
        if articles.is_empty() {
            return RenderOutcome::Warning {
                message: EMPTY_SELECTION_WARNING.to_string(),
            };
        }
        let vocab: Vec<&VocabEntry> = self
            .vocab
            .iter()
            .filter(|v| wanted.contains(v.lang.as_str()))
            .collect();

        let selected = codes.iter().map(|c| self.registry.display(c)).collect();
        RenderOutcome::Views(DashboardView {
            selected,
            article_count: articles.len(),
            top_n,
            colors: self.registry.color_map(),
            time_series: time_series(&articles, &self.registry),
            distribution: distribution(&articles, &self.registry),
            top_words: top_words(&vocab, top_n, &self.registry),
            table: article_table(&articles, &self.registry),
        })
    }
}

/// Resultado de uma interação.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Nada a desenhar: a seleção está vazia.
    Warning { message: String },
    Views(DashboardView),
}

/// As quatro visões, já filtradas.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    /// Nomes de exibição efetivamente selecionados.
    pub selected: Vec<String>,
    pub article_count: usize,
    pub top_n: usize,
    /// Nome de exibição → cor.
    pub colors: BTreeMap<String, String>,
    pub time_series: Vec<DailyMean>,
    pub distribution: Vec<BoxStats>,
    pub top_words: Vec<TopWord>,
    pub table: Vec<TableRow>,
}

/// Média diária das pontuações de um bloco.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMean {
    pub bloc: String,
    pub date: NaiveDate,
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
    pub count: usize,
}

/// Média de (bloco, data); artigos sem data ficam de fora.
pub fn time_series(articles: &[&ArticleRow], registry: &BlocRegistry) -> Vec<DailyMean> {
    let mut groups: BTreeMap<(String, NaiveDate), (f64, f64, f64, usize)> = BTreeMap::new();
    for article in articles {
        let Some(date) = article.date else { continue };
        let acc = groups
            .entry((registry.display(&article.lang), date))
            .or_insert((0.0, 0.0, 0.0, 0));
        acc.0 += article.negative;
        acc.1 += article.neutral;
        acc.2 += article.positive;
        acc.3 += 1;
    }
    groups
        .into_iter()
        .map(|((bloc, date), (neg, neu, pos, n))| {
            let n_f = n as f64;
            DailyMean {
                bloc,
                date,
                negative: neg / n_f,
                neutral: neu / n_f,
                positive: pos / n_f,
                count: n,
            }
        })
        .collect()
}

/// Estatísticas de box plot (quartis por interpolação linear, bigodes de Tukey).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub bloc: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
}

/// Quantil `p` de uma amostra ordenada, interpolando linearmente.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

impl BoxStats {
    /// Calcula as estatísticas; valores NaN são ignorados.
    pub fn from_values(bloc: String, values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let (low_limit, high_limit) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
        let lower_fence = sorted.iter().copied().find(|&v| v >= low_limit).unwrap_or(q1);
        let upper_fence = sorted.iter().rev().copied().find(|&v| v <= high_limit).unwrap_or(q3);
        Some(Self {
            bloc,
            count: sorted.len(),
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            lower_fence,
            upper_fence,
        })
    }
}

/// Distribuição do score `positive`, um box por bloco (ordem do nome de exibição).
pub fn distribution(articles: &[&ArticleRow], registry: &BlocRegistry) -> Vec<BoxStats> {
    let mut per_bloc: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for article in articles {
        per_bloc
            .entry(registry.display(&article.lang))
            .or_default()
            .push(article.positive);
    }
    per_bloc
        .into_iter()
        .filter_map(|(bloc, values)| BoxStats::from_values(bloc, &values))
        .collect()
}

/// Uma barra do gráfico de palavras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopWord {
    pub bloc: String,
    pub word: String,
    pub freq: i64,
}

/// As `top_n` palavras de cada bloco. O vocabulário deve estar ordenado por
/// bloco ↑ e frequência ↓ (garantido por [`DashboardData::new`]).
pub fn top_words(vocab: &[&VocabEntry], top_n: usize, registry: &BlocRegistry) -> Vec<TopWord> {
    let mut taken: BTreeMap<&str, usize> = BTreeMap::new();
    let mut out = Vec::new();
    for entry in vocab {
        let n = taken.entry(entry.lang.as_str()).or_insert(0);
        if *n < top_n {
            *n += 1;
            out.push(TopWord {
                bloc: registry.display(&entry.lang),
                word: entry.word.clone(),
                freq: entry.freq,
            });
        }
    }
    out
}

/// Linha da tabela de artigos.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub bloc: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

/// Artigos filtrados, por bloco ↑ e `published_at` ↓ (sem data por último).
pub fn article_table(articles: &[&ArticleRow], registry: &BlocRegistry) -> Vec<TableRow> {
    let mut rows: Vec<TableRow> = articles
        .iter()
        .map(|a| TableRow {
            bloc: registry.display(&a.lang),
            published_at: a.published_at,
            source: a.source.clone(),
            title: a.title.clone(),
            url: a.url.clone(),
            negative: a.negative,
            neutral: a.neutral,
            positive: a.positive,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.bloc.cmp(&b.bloc).then_with(|| match (a.published_at, b.published_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    });
    rows
}
