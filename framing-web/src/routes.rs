//! Rotas HTTP do dashboard.
//!
//! - `GET /`: página HTML com seletor de blocos, "Top N" e as quatro visões.
//! - `GET /api/views`: as mesmas visões em JSON.
//! - `GET /healthz`: estado dos dados carregados.
//!
//! Parâmetros de consulta (todas as rotas de visão):
//! `bloc` (repetível, nome de exibição), `top_n` e `submitted`. Sem `bloc` e sem
//! `submitted` a seleção é "todos os blocos"; com `submitted` e nenhum `bloc` a
//! seleção está vazia.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use framing_core::{DashboardData, RenderOutcome, Selection, TopNBounds};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::page::DashboardPage;

/// Dados do dashboard, ou o motivo de não estarem disponíveis.
pub enum Loaded {
    Ready(DashboardData),
    Unavailable(String),
}

/// Estado compartilhado da aplicação (somente leitura).
pub struct AppState {
    pub data: Loaded,
    pub bounds: TopNBounds,
}

/// Parâmetros de uma interação.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardQuery {
    pub selection: Selection,
    pub top_n: Option<usize>,
}

impl DashboardQuery {
    /// Interpreta os pares `chave=valor` da URL. `top_n` inválido é ignorado.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut blocs = Vec::new();
        let mut submitted = false;
        let mut top_n = None;
        for (key, value) in pairs {
            match key.as_str() {
                "bloc" => blocs.push(value.clone()),
                "submitted" => submitted = true,
                "top_n" => top_n = value.trim().parse().ok(),
                other => debug!(param = other, "parâmetro ignorado"),
            }
        }
        let selection = if blocs.is_empty() && !submitted {
            Selection::All
        } else {
            Selection::Displays(blocs)
        };
        Self { selection, top_n }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/views", get(views_handler))
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = DashboardQuery::from_pairs(&pairs);
    let top_n = state.bounds.resolve(query.top_n);

    let page = match &state.data {
        Loaded::Unavailable(message) => Ok(DashboardPage::unavailable(message, &state.bounds)),
        Loaded::Ready(data) => {
            let registry = data.registry();
            // Marca no seletor apenas os nomes conhecidos
            let selected: Vec<String> = match &query.selection {
                Selection::All => registry.display_options(),
                Selection::Displays(names) => names
                    .iter()
                    .filter(|n| registry.code_for_display(n).is_some())
                    .cloned()
                    .collect(),
            };
            let page = DashboardPage::with_controls(registry, &selected, &state.bounds, top_n);
            match data.render(&query.selection, top_n) {
                RenderOutcome::Warning { message } => Ok(page.with_warning(message)),
                RenderOutcome::Views(view) => page.with_view(&view),
            }
        }
    };

    match page.map_err(|e| e.to_string()).and_then(|p| p.render().map_err(|e| e.to_string())) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "falha ao renderizar a página");
            (StatusCode::INTERNAL_SERVER_ERROR, "erro ao renderizar a página").into_response()
        }
    }
}

async fn views_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = DashboardQuery::from_pairs(&pairs);
    match &state.data {
        Loaded::Unavailable(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response(),
        Loaded::Ready(data) => {
            let top_n = state.bounds.resolve(query.top_n);
            Json(data.render(&query.selection, top_n)).into_response()
        }
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.data {
        Loaded::Ready(data) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "articles": data.article_count(),
                "blocs": data.registry().len(),
            })),
        ),
        Loaded::Unavailable(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unavailable", "error": message })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use framing_core::store::ArticleRow;
    use framing_core::VocabEntry;
    use tower::ServiceExt;

    fn row(lang: &str, positive: f64) -> ArticleRow {
        let published_at = framing_core::article::parse_published_at("2024-03-01T10:00:00Z");
        ArticleRow {
            lang: lang.to_string(),
            published_at,
            date: published_at.map(|d| d.date_naive()),
            source: Some("src".into()),
            title: Some(format!("title {lang}")),
            url: Some(format!("https://example.com/{lang}")),
            negative: 0.2,
            neutral: 1.0 - 0.2 - positive,
            positive,
        }
    }

    fn vocab(lang: &str, word: &str, freq: i64) -> VocabEntry {
        VocabEntry {
            lang: lang.into(),
            word: word.into(),
            freq,
        }
    }

    fn state() -> AppState {
        let data = DashboardData::new(
            vec![row("jp", 0.5), row("ru", 0.1), row("ru", 0.3), row("xx", 0.4)],
            vec![vocab("jp", "tokyo", 3), vocab("ru", "moscow", 2), vocab("xx", "other", 1)],
        )
        .unwrap();
        AppState {
            data: Loaded::Ready(data),
            bounds: TopNBounds::default(),
        }
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_query_without_params_selects_all() {
        let q = DashboardQuery::from_pairs(&[]);
        assert_eq!(q.selection, Selection::All);
        assert_eq!(q.top_n, None);
    }

    #[test]
    fn test_query_submitted_without_blocs_is_empty() {
        let q = DashboardQuery::from_pairs(&pairs(&[("submitted", "1"), ("top_n", "12")]));
        assert_eq!(q.selection, Selection::Displays(vec![]));
        assert_eq!(q.top_n, Some(12));
    }

    #[test]
    fn test_query_repeated_blocs() {
        let q = DashboardQuery::from_pairs(&pairs(&[("bloc", "XX"), ("bloc", "🇯🇵 Japan"), ("top_n", "abc")]));
        assert_eq!(q.selection, Selection::Displays(vec!["XX".into(), "🇯🇵 Japan".into()]));
        assert_eq!(q.top_n, None);
    }

    #[tokio::test]
    async fn test_index_renders_all_blocs() {
        let (status, body) = get_body(router(state()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("War Framing"));
        assert!(body.contains("Articles: 4"));
        assert!(body.contains("XX"));
        assert!(body.contains("Sample articles"));
    }

    #[tokio::test]
    async fn test_index_empty_selection_shows_warning() {
        let (status, body) = get_body(router(state()), "/?submitted=1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(framing_core::dashboard::EMPTY_SELECTION_WARNING));
        assert!(!body.contains("Sample articles"));
    }

    #[tokio::test]
    async fn test_api_views_filters_by_display_name() {
        let (status, body) = get_body(router(state()), "/api/views?bloc=XX&top_n=100").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "views");
        assert_eq!(json["article_count"], 1);
        assert_eq!(json["top_n"], 40);
        assert_eq!(json["selected"][0], "XX");
    }

    #[tokio::test]
    async fn test_api_views_empty_selection() {
        let (_, body) = get_body(router(state()), "/api/views?submitted=1").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "warning");
    }

    #[tokio::test]
    async fn test_unavailable_data() {
        let app = router(AppState {
            data: Loaded::Unavailable("nenhum bloco".into()),
            bounds: TopNBounds::default(),
        });
        let (status, body) = get_body(app.clone(), "/healthz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("unavailable"));

        let (status, body) = get_body(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("nenhum bloco"));
    }

    #[tokio::test]
    async fn test_healthz_reports_counts() {
        let (status, body) = get_body(router(state()), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["articles"], 4);
        assert_eq!(json["blocs"], 3);
    }
}
