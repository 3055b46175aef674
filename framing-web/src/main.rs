//! Servidor web Axum do dashboard de enquadramento por bloco de mídia.
//!
//! Lê as tabelas Parquet geradas por `framing-analyze` uma única vez na partida e
//! serve a página interativa. Se os dados não têm nenhum bloco, o servidor sobe
//! mesmo assim e exibe o erro na página.

mod page;
mod routes;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use framing_core::{DashboardConfig, DashboardData, FramingError, TopNBounds};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::routes::{router, AppState, Loaded};

#[derive(Parser, Debug)]
#[command(
    name = "framing-web",
    about = "Dashboard de sentimento e vocabulário por bloco de mídia"
)]
struct Cli {
    /// Diretório com articles_with_sentiment.parquet e vocab.parquet.
    #[arg(long, env = "FRAMING_OUT_DIR", default_value = "out")]
    out_dir: PathBuf,

    /// Endereço de escuta.
    #[arg(long, env = "FRAMING_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    #[arg(long, env = "FRAMING_TOP_N_MIN", default_value_t = 5)]
    top_n_min: usize,

    #[arg(long, env = "FRAMING_TOP_N_MAX", default_value_t = 40)]
    top_n_max: usize,

    /// Valor inicial do controle "Top N".
    #[arg(long, env = "FRAMING_TOP_N", default_value_t = 20)]
    top_n: usize,
}

impl Cli {
    fn into_config(self) -> DashboardConfig {
        DashboardConfig {
            out_dir: self.out_dir,
            bind: self.bind,
            top_n: TopNBounds {
                min: self.top_n_min,
                max: self.top_n_max,
                default: self.top_n,
            },
        }
    }
}

/// Carrega os dados; a ausência de blocos vira página de erro, o resto é fatal.
fn load_state(config: &DashboardConfig) -> Result<AppState> {
    let data = match DashboardData::load(config) {
        Ok(data) => {
            info!(
                articles = data.article_count(),
                blocs = data.registry().len(),
                "dados do dashboard prontos"
            );
            Loaded::Ready(data)
        }
        Err(FramingError::NoBlocs) => {
            warn!("tabela de artigos sem rótulos de bloco");
            Loaded::Unavailable(FramingError::NoBlocs.to_string())
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("falha ao carregar as tabelas de {}", config.out_dir.display())
            })
        }
    };
    Ok(AppState {
        data,
        bounds: config.top_n,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Cli::parse().into_config();
    config.top_n.validate()?;
    let state = load_state(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("não foi possível escutar em {}", config.bind))?;
    info!("🚀 Dashboard iniciado em http://{}", config.bind);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = Cli::try_parse_from(["framing-web"]).unwrap().into_config();
        assert_eq!(config.out_dir, PathBuf::from("out"));
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.top_n, TopNBounds::default());
    }

    #[test]
    fn test_cli_overrides() {
        let config = Cli::try_parse_from([
            "framing-web",
            "--out-dir",
            "/tmp/x",
            "--bind",
            "0.0.0.0:8080",
            "--top-n",
            "10",
        ])
        .unwrap()
        .into_config();
        assert_eq!(config.out_dir, PathBuf::from("/tmp/x"));
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.top_n.default, 10);
    }

    #[test]
    fn test_missing_tables_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            out_dir: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        assert!(load_state(&config).is_err());
    }

    #[test]
    fn test_empty_tables_serve_error_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            out_dir: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        framing_core::store::write_outputs(&[], &[], &config.articles_path(), &config.vocab_path())
            .unwrap();
        let state = load_state(&config).unwrap();
        assert!(matches!(state.data, Loaded::Unavailable(_)));
    }
}
