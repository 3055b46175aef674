//! # Erros do pipeline de enquadramento
//!
//! Apenas falhas fatais viram `FramingError`: arquivo ausente, colunas obrigatórias
//! faltando, falha ao carregar o modelo ou ao gravar o Parquet. Problemas de qualidade
//! de dado (datas inválidas, texto vazio) são convertidos em `None` e nunca chegam aqui.

use std::path::PathBuf;

use thiserror::Error;

/// Resultado padrão do crate.
pub type Result<T> = std::result::Result<T, FramingError>;

/// Erros fatais da análise e do dashboard.
#[derive(Debug, Error)]
pub enum FramingError {
    /// O arquivo de entrada não existe.
    #[error("arquivo não encontrado: {}", .0.display())]
    MissingFile(PathBuf),

    /// O CSV não contém todas as colunas exigidas.
    #[error("colunas obrigatórias ausentes no CSV: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Uma tabela Parquet não contém a coluna esperada (ou o tipo não confere).
    #[error("coluna `{column}` ausente ou com tipo inesperado em {table}")]
    BadColumn { table: &'static str, column: String },

    /// Nenhum rótulo de bloco foi encontrado nas tabelas carregadas.
    #[error("nenhum rótulo `lang` encontrado; verifique o CSV e a análise")]
    NoBlocs,

    /// Configuração inválida (limites, limiar, etc.).
    #[error("configuração inválida: {0}")]
    Config(String),

    /// Falha ao baixar ou inicializar o classificador de sentimento.
    #[error("falha ao carregar o modelo `{model}`: {message}")]
    ModelLoad { model: String, message: String },

    /// Falha durante a inferência.
    #[error("falha na inferência de sentimento: {0}")]
    Inference(String),

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("erro de CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("erro de Arrow: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("erro de Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("erro do candle: {0}")]
    Candle(#[from] candle_core::Error),
}

impl FramingError {
    pub(crate) fn model_load(model: &str, err: impl std::fmt::Display) -> Self {
        FramingError::ModelLoad {
            model: model.to_string(),
            message: err.to_string(),
        }
    }
}
