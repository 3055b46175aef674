//! # Vocabulário por Bloco
//!
//! Conta as palavras de cada bloco depois de remover as palavras "comuns demais"
//! no corpus inteiro.
//!
//! ## Algoritmo
//!
//! 1. **Frequência de documento (DF)**: para cada token, em quantos artigos ele
//!    aparece pelo menos uma vez. O denominador tem piso 1 (corpus vazio).
//! 2. **Supressão**: tokens com `DF / N >= limiar` (0.8 por padrão) são excluídos de
//!    todos os blocos. É uma camada de stop-words derivada do próprio corpus, por
//!    cima da lista estática.
//! 3. **Contagem**: por bloco, soma as *ocorrências* dos tokens restantes (não o
//!    número de documentos).
//!
//! A saída é ordenada por bloco crescente, frequência decrescente e, em caso de
//! empate, palavra crescente, de modo que a mesma entrada sempre gera a mesma tabela.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::article::Article;

/// Uma linha da tabela `vocab`: (bloco, palavra, ocorrências).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub lang: String,
    pub word: String,
    pub freq: i64,
}

/// Número de documentos em que cada token aparece pelo menos uma vez.
pub fn document_frequencies<'a, I>(docs: I) -> HashMap<&'a str, usize>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut dfreq: HashMap<&str, usize> = HashMap::new();
    for doc in docs {
        let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for word in unique {
            *dfreq.entry(word).or_insert(0) += 1;
        }
    }
    dfreq
}

/// Tokens presentes em pelo menos `threshold` dos `n_docs` documentos.
pub fn high_frequency_words<'a>(
    dfreq: &HashMap<&'a str, usize>,
    n_docs: usize,
    threshold: f64,
) -> HashSet<&'a str> {
    let n_docs = n_docs.max(1) as f64;
    dfreq
        .iter()
        .filter(|&(_, &d)| d as f64 / n_docs >= threshold)
        .map(|(w, _)| *w)
        .collect()
}

/// Constrói a tabela de vocabulário a partir dos artigos já tokenizados.
pub fn build_vocab(articles: &[Article], threshold: f64) -> Vec<VocabEntry> {
    let dfreq = document_frequencies(articles.iter().map(|a| a.tokens.as_slice()));
    let high_df = high_frequency_words(&dfreq, articles.len(), threshold);

    let mut per_bloc: BTreeMap<&str, HashMap<&str, i64>> = BTreeMap::new();
    for article in articles {
        let counter = per_bloc.entry(article.lang.as_str()).or_default();
        for token in &article.tokens {
            if !high_df.contains(token.as_str()) {
                *counter.entry(token.as_str()).or_insert(0) += 1;
            }
        }
    }

    let mut rows: Vec<VocabEntry> = per_bloc
        .into_iter()
        .flat_map(|(lang, counter)| {
            counter.into_iter().map(move |(word, freq)| VocabEntry {
                lang: lang.to_string(),
                word: word.to_string(),
                freq,
            })
        })
        .collect();
    sort_vocab(&mut rows);
    rows
}

/// Ordena por bloco ↑, frequência ↓, palavra ↑.
pub fn sort_vocab(rows: &mut [VocabEntry]) {
    rows.sort_by(|a, b| {
        a.lang
            .cmp(&b.lang)
            .then(b.freq.cmp(&a.freq))
            .then_with(|| a.word.cmp(&b.word))
    });
}
