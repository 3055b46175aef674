//! # Pontuação de Sentimento
//!
//! O classificador é um colaborador externo opaco: recebe um lote de textos e devolve
//! um vetor de logits por texto, na ordem `[negative, neutral, positive]`. Este módulo
//! cuida do que é independente do modelo:
//!
//! 1. **Lotes**: divide a lista de textos em lotes de tamanho fixo.
//! 2. **Softmax**: converte logits em probabilidades que somam 1.
//! 3. **Tabela**: expõe o resultado como três colunas (`negative`, `neutral`, `positive`),
//!    inclusive quando a entrada é vazia.
//!
//! A implementação real (XLM-RoBERTa via candle) vive em [`crate::model`].

use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FramingError, Result};

/// Rótulos do classificador, na ordem dos logits.
pub const LABELS: [&str; 3] = ["negative", "neutral", "positive"];

/// Probabilidades de sentimento de um artigo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl SentimentScores {
    /// Constrói a partir de probabilidades já normalizadas.
    pub fn from_probs(probs: &[f64]) -> Result<Self> {
        match probs {
            [negative, neutral, positive] => Ok(Self {
                negative: *negative,
                neutral: *neutral,
                positive: *positive,
            }),
            other => Err(FramingError::Inference(format!(
                "esperados {} rótulos, recebidos {}",
                LABELS.len(),
                other.len()
            ))),
        }
    }

    pub fn sum(&self) -> f64 {
        self.negative + self.neutral + self.positive
    }
}

/// Softmax numericamente estável (subtrai o máximo antes de exponenciar).
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    if logits.is_empty() {
        return vec![];
    }
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / logits.len() as f64; logits.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}

/// Classificador de sequência de três classes.
///
/// Implementações recebem um lote já limitado por `batch_size` e devolvem exatamente
/// um vetor de logits por texto.
pub trait SentimentClassifier {
    /// Nome do modelo (para logs).
    fn name(&self) -> &str;

    /// Logits `[negative, neutral, positive]` para cada texto do lote.
    fn logits(&self, batch: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Pontua todos os textos, em lotes de `batch_size`.
///
/// Entrada vazia devolve uma tabela vazia (com as três colunas) sem chamar o modelo.
pub fn score_texts<C: SentimentClassifier + ?Sized>(
    classifier: &C,
    texts: &[String],
    batch_size: usize,
) -> Result<SentimentTable> {
    if texts.is_empty() {
        return Ok(SentimentTable::default());
    }
    let batch_size = batch_size.max(1);
    let total_batches = texts.len().div_ceil(batch_size);
    let mut rows = Vec::with_capacity(texts.len());

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        let logits = classifier.logits(batch)?;
        if logits.len() != batch.len() {
            return Err(FramingError::Inference(format!(
                "o modelo devolveu {} linhas para um lote de {}",
                logits.len(),
                batch.len()
            )));
        }
        for row in logits {
            let row: Vec<f64> = row.into_iter().map(f64::from).collect();
            rows.push(SentimentScores::from_probs(&softmax(&row))?);
        }
        debug!(batch = i + 1, total_batches, model = classifier.name(), "lote pontuado");
    }
    Ok(SentimentTable { rows })
}

/// Resultado da inferência: uma linha de probabilidades por texto, na ordem de entrada.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentimentTable {
    pub rows: Vec<SentimentScores>,
}

impl SentimentTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Schema fixo: três colunas `Float64` não nulas.
    pub fn schema() -> Schema {
        Schema::new(
            LABELS
                .iter()
                .map(|l| Field::new(*l, DataType::Float64, false))
                .collect::<Vec<_>>(),
        )
    }

    /// Visão colunar da tabela (sempre com as três colunas).
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let column = |f: fn(&SentimentScores) -> f64| -> ArrayRef {
            Arc::new(Float64Array::from_iter_values(self.rows.iter().map(f)))
        };
        let batch = RecordBatch::try_new(
            Arc::new(Self::schema()),
            vec![
                column(|s| s.negative),
                column(|s| s.neutral),
                column(|s| s.positive),
            ],
        )?;
        Ok(batch)
    }
}
