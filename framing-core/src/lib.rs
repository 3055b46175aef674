//! # framing-core: Comparação de Enquadramento entre Blocos de Mídia
//!
//! Este crate implementa o núcleo de um pipeline de análise de notícias sobre a guerra,
//! rotuladas pelo bloco de mídia de origem (`jp`, `west`, `ru`, `cn`, `ua`, ...).
//!
//! ## Arquitetura do Sistema
//!
//! Dois executáveis independentes compartilham apenas arquivos Parquet:
//!
//! 1.  **Análise** ([`analyzer`]): CSV → normalização ([`article`], [`dataset`]) →
//!     tokenização ([`tokenizer`]) → sentimento ([`sentiment`], [`model`]) →
//!     vocabulário ([`vocab`]) → Parquet ([`store`]).
//! 2.  **Dashboard** ([`dashboard`]): Parquet → filtro por bloco → série temporal,
//!     distribuição, palavras mais frequentes e tabela, com cores e nomes de
//!     exibição consistentes ([`blocs`]).
//!
//! O fluxo é de mão única; nenhum registro é alterado depois de gravado.
//!
//! ## Exemplo de Uso
//!
//! ```no_run
//! use framing_core::{run_analysis, AnalyzerConfig, XlmRobertaSentiment};
//!
//! let config = AnalyzerConfig::default();
//! let model = XlmRobertaSentiment::load(&config.model)?;
//! let summary = run_analysis(&config, &model)?;
//! println!("{} artigos, {} entradas de vocabulário", summary.articles, summary.vocab_entries);
//! # Ok::<(), framing_core::FramingError>(())
//! ```

pub mod analyzer;
pub mod article;
pub mod blocs;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod model;
pub mod sentiment;
pub mod stopwords;
pub mod store;
pub mod tokenizer;
pub mod vocab;

pub use analyzer::{run_analysis, AnalysisSummary};
pub use article::{normalize_bloc, Article};
pub use blocs::{Bloc, BlocRegistry};
pub use config::{AnalyzerConfig, DashboardConfig, ModelConfig, TopNBounds};
pub use dashboard::{DashboardData, DashboardView, RenderOutcome, Selection};
pub use error::{FramingError, Result};
pub use model::XlmRobertaSentiment;
pub use sentiment::{SentimentClassifier, SentimentScores};
pub use vocab::VocabEntry;
