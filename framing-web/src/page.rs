//! Template HTML do dashboard (askama) e a conversão das visões para ele.

use askama::Template;
use framing_core::dashboard::{DashboardView, TableRow};
use framing_core::{BlocRegistry, TopNBounds};

pub const PAGE_TITLE: &str = "📰 War Framing — Media Comparison (All English articles)";
pub const PAGE_CAPTION: &str =
    "Pick blocs → see sentiment & top words. Legend shows full English names with flags.";

/// Uma opção do seletor de blocos.
pub struct BlocOption {
    pub name: String,
    pub color: String,
    pub selected: bool,
}

/// Linha da tabela já formatada para exibição.
pub struct TableLine {
    pub bloc: String,
    pub published_at: String,
    pub source: String,
    pub title: String,
    pub url: String,
    /// Só URLs http(s) viram link; o resto é exibido como texto.
    pub linkable: bool,
    pub negative: String,
    pub neutral: String,
    pub positive: String,
}

fn is_http_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl From<&TableRow> for TableLine {
    fn from(row: &TableRow) -> Self {
        let url = row.url.clone().unwrap_or_default();
        Self {
            linkable: is_http_url(&url),
            bloc: row.bloc.clone(),
            published_at: row
                .published_at
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            source: row.source.clone().unwrap_or_default(),
            title: row.title.clone().unwrap_or_default(),
            url,
            negative: format!("{:.3}", row.negative),
            neutral: format!("{:.3}", row.neutral),
            positive: format!("{:.3}", row.positive),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub title: &'static str,
    pub caption: &'static str,
    /// Erro fatal dos dados (nenhum bloco): nada mais é desenhado.
    pub error: Option<String>,
    /// Aviso de seleção vazia: controles aparecem, gráficos não.
    pub warning: Option<String>,
    pub options: Vec<BlocOption>,
    pub top_n: usize,
    pub top_n_min: usize,
    pub top_n_max: usize,
    pub article_count: usize,
    /// JSON das visões para o Plotly; vazio quando não há gráficos.
    pub charts_json: String,
    pub rows: Vec<TableLine>,
}

impl DashboardPage {
    fn base(bounds: &TopNBounds, top_n: usize) -> Self {
        Self {
            title: PAGE_TITLE,
            caption: PAGE_CAPTION,
            error: None,
            warning: None,
            options: vec![],
            top_n,
            top_n_min: bounds.min,
            top_n_max: bounds.max,
            article_count: 0,
            charts_json: String::new(),
            rows: vec![],
        }
    }

    /// Página de erro: os dados não têm nenhum rótulo de bloco.
    pub fn unavailable(message: &str, bounds: &TopNBounds) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::base(bounds, bounds.default)
        }
    }

    /// Página com o seletor; `selected` são os nomes de exibição marcados.
    pub fn with_controls(
        registry: &BlocRegistry,
        selected: &[String],
        bounds: &TopNBounds,
        top_n: usize,
    ) -> Self {
        let colors = registry.color_map();
        let options = registry
            .display_options()
            .into_iter()
            .map(|name| BlocOption {
                color: colors.get(&name).cloned().unwrap_or_default(),
                selected: selected.contains(&name),
                name,
            })
            .collect();
        Self {
            options,
            ..Self::base(bounds, top_n)
        }
    }

    pub fn with_warning(mut self, message: String) -> Self {
        self.warning = Some(message);
        self
    }

    pub fn with_view(mut self, view: &DashboardView) -> serde_json::Result<Self> {
        self.article_count = view.article_count;
        self.charts_json = script_safe_json(view)?;
        self.rows = view.table.iter().map(TableLine::from).collect();
        Ok(self)
    }
}

/// Serializa para embutir em `<script>`: `<` vira `\u003c` (impede fechar a tag).
pub fn script_safe_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_safe_json() {
        let json = script_safe_json(&serde_json::json!({"title": "</script><b>"})).unwrap();
        assert!(!json.contains('<'));
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["title"], "</script><b>");
    }

    #[test]
    fn test_controls_mark_selected_options() {
        let registry = BlocRegistry::from_codes(["jp", "ru", "xx"]);
        let page = DashboardPage::with_controls(&registry, &["XX".to_string()], &TopNBounds::default(), 20);
        let selected: Vec<&str> = page
            .options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(selected, vec!["XX"]);
        let html = page.render().unwrap();
        assert!(html.contains("War Framing"));
    }

    fn table_row(url: &str) -> TableRow {
        TableRow {
            bloc: "XX".into(),
            published_at: None,
            source: None,
            title: Some("t".into()),
            url: Some(url.into()),
            negative: 0.1,
            neutral: 0.2,
            positive: 0.7,
        }
    }

    #[test]
    fn test_only_http_urls_become_links() {
        assert!(TableLine::from(&table_row("https://example.com/a")).linkable);
        assert!(TableLine::from(&table_row("HTTP://example.com")).linkable);
        assert!(!TableLine::from(&table_row("javascript:alert(1)")).linkable);
        assert!(!TableLine::from(&table_row(" data:text/html,x")).linkable);

        let mut page = DashboardPage::unavailable("x", &TopNBounds::default());
        page.error = None;
        page.charts_json = "{}".into();
        page.rows = vec![TableLine::from(&table_row("javascript:alert(1)"))];
        let html = page.render().unwrap();
        assert!(!html.contains("href=\"javascript:"));
        assert!(html.contains("javascript:alert(1)"));
    }
}
