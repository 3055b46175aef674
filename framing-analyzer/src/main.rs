//! Análise em lote: lê o CSV de artigos, pontua sentimento e grava as tabelas Parquet.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use framing_core::config::{DEFAULT_MODEL, DEFAULT_TOKENIZER_REPO};
use framing_core::{run_analysis, AnalyzerConfig, ModelConfig, XlmRobertaSentiment};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "framing-analyze",
    about = "Tokeniza, conta vocabulário e pontua sentimento de artigos por bloco de mídia"
)]
struct Cli {
    /// CSV com as colunas title, text, published_at, source, url, lang.
    #[arg(long, env = "FRAMING_INPUT", default_value = "data/news.csv")]
    input: PathBuf,

    /// Diretório de saída das tabelas Parquet.
    #[arg(long, env = "FRAMING_OUT_DIR", default_value = "out")]
    out_dir: PathBuf,

    /// Modelo de sentimento no Hugging Face Hub.
    #[arg(long, env = "FRAMING_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Repositório de onde buscar tokenizer.json se o modelo não tiver um.
    #[arg(long, env = "FRAMING_TOKENIZER_REPO", default_value = DEFAULT_TOKENIZER_REPO)]
    tokenizer_repo: String,

    /// Máximo de tokens por texto (o restante é truncado).
    #[arg(long, env = "FRAMING_MAX_LENGTH", default_value_t = 256)]
    max_length: usize,

    /// Textos por chamada ao modelo.
    #[arg(long, env = "FRAMING_BATCH_SIZE", default_value_t = 32)]
    batch_size: usize,

    /// Fração de documentos a partir da qual uma palavra é removida do vocabulário.
    #[arg(long, env = "FRAMING_HIGH_DF", default_value_t = 0.8)]
    high_df_threshold: f64,

    /// Usa CUDA quando disponível.
    #[arg(long, env = "FRAMING_GPU")]
    gpu: bool,
}

impl Cli {
    fn into_config(self) -> AnalyzerConfig {
        AnalyzerConfig {
            input: self.input,
            out_dir: self.out_dir,
            high_df_threshold: self.high_df_threshold,
            model: ModelConfig {
                name: self.model,
                tokenizer_repo: self.tokenizer_repo,
                max_length: self.max_length,
                batch_size: self.batch_size,
                prefer_gpu: self.gpu,
            },
        }
    }
}

fn run(config: &AnalyzerConfig) -> Result<()> {
    config.validate().context("configuração inválida")?;
    let model = XlmRobertaSentiment::load(&config.model)
        .with_context(|| format!("carregando o modelo {}", config.model.name))?;
    let summary = run_analysis(config, &model)
        .with_context(|| format!("analisando {}", config.input.display()))?;

    info!(
        articles = summary.articles,
        vocab = summary.vocab_entries,
        unparsed_dates = summary.unparsed_dates,
        "análise concluída"
    );
    println!("Saved -> {}", summary.articles_path.display());
    println!("Saved -> {}", summary.vocab_path.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Cli::parse().into_config();
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_match_core_defaults() {
        let cli = Cli::try_parse_from(["framing-analyze"]).unwrap();
        assert_eq!(cli.into_config(), AnalyzerConfig::default());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "framing-analyze",
            "--input",
            "x.csv",
            "--batch-size",
            "4",
            "--high-df-threshold",
            "0.5",
        ])
        .unwrap();
        let config = cli.into_config();
        assert_eq!(config.input, PathBuf::from("x.csv"));
        assert_eq!(config.model.batch_size, 4);
        assert_eq!(config.high_df_threshold, 0.5);
    }
}
