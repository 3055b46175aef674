//! # Configuração
//!
//! Constantes ajustáveis do pipeline. Os binários preenchem estas structs a partir da
//! linha de comando (com fallback para variáveis `FRAMING_*`); os testes usam os
//! valores padrão.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FramingError, Result};

/// Nome do arquivo com os artigos enriquecidos.
pub const ARTICLES_FILE: &str = "articles_with_sentiment.parquet";
/// Nome do arquivo com o vocabulário por bloco.
pub const VOCAB_FILE: &str = "vocab.parquet";

/// Modelo multilíngue de sentimento usado por padrão.
pub const DEFAULT_MODEL: &str = "cardiffnlp/twitter-xlm-roberta-base-sentiment";
/// Repositório alternativo para `tokenizer.json` (mesmo vocabulário SentencePiece).
pub const DEFAULT_TOKENIZER_REPO: &str = "FacebookAI/xlm-roberta-base";

/// Parâmetros do classificador de sentimento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Identificador do modelo no Hugging Face Hub.
    pub name: String,
    /// Repositório de onde buscar `tokenizer.json` se o modelo não trouxer um.
    pub tokenizer_repo: String,
    /// Orçamento de tokens por texto (o excedente é truncado).
    pub max_length: usize,
    /// Textos por chamada ao modelo.
    pub batch_size: usize,
    /// Usa GPU (CUDA) quando disponível.
    pub prefer_gpu: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            tokenizer_repo: DEFAULT_TOKENIZER_REPO.to_string(),
            max_length: 256,
            batch_size: 32,
            prefer_gpu: false,
        }
    }
}

/// Configuração da análise em lote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    /// Fração de documentos a partir da qual uma palavra é considerada comum demais.
    pub high_df_threshold: f64,
    pub model: ModelConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/news.csv"),
            out_dir: PathBuf::from("out"),
            high_df_threshold: 0.8,
            model: ModelConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.high_df_threshold > 0.0 && self.high_df_threshold <= 1.0) {
            return Err(FramingError::Config(format!(
                "high_df_threshold deve estar em (0, 1], recebido {}",
                self.high_df_threshold
            )));
        }
        if self.model.max_length == 0 {
            return Err(FramingError::Config("max_length deve ser > 0".into()));
        }
        if self.model.batch_size == 0 {
            return Err(FramingError::Config("batch_size deve ser > 0".into()));
        }
        Ok(())
    }

    pub fn articles_path(&self) -> PathBuf {
        self.out_dir.join(ARTICLES_FILE)
    }

    pub fn vocab_path(&self) -> PathBuf {
        self.out_dir.join(VOCAB_FILE)
    }
}

/// Limites do controle "Top N" do dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopNBounds {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

impl Default for TopNBounds {
    fn default() -> Self {
        Self { min: 5, max: 40, default: 20 }
    }
}

impl TopNBounds {
    pub fn validate(&self) -> Result<()> {
        if self.min > self.max || self.default < self.min || self.default > self.max {
            return Err(FramingError::Config(format!(
                "limites de top N inconsistentes: min={} max={} padrão={}",
                self.min, self.max, self.default
            )));
        }
        Ok(())
    }

    /// Valor efetivo: ausente → padrão; fora do intervalo → limitado.
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default).clamp(self.min, self.max)
    }
}

/// Configuração do dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub out_dir: PathBuf,
    pub bind: String,
    pub top_n: TopNBounds,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
            bind: "127.0.0.1:3000".to_string(),
            top_n: TopNBounds::default(),
        }
    }
}

impl DashboardConfig {
    pub fn articles_path(&self) -> PathBuf {
        self.out_dir.join(ARTICLES_FILE)
    }

    pub fn vocab_path(&self) -> PathBuf {
        self.out_dir.join(VOCAB_FILE)
    }
}
