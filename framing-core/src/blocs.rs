//! # Blocos de Mídia: cores e nomes de exibição
//!
//! Cada bloco (`jp`, `west`, `ru`, ...) tem uma cor fixa e um nome em inglês com
//! bandeira. Códigos desconhecidos recebem:
//!
//! - **cor**: da paleta de fallback (Set2 + Set3), indexada pela posição do código
//!   na lista ordenada de códigos observados;
//! - **nome**: o próprio código em maiúsculas (`"xx"` → `"XX"`).
//!
//! O [`BlocRegistry`] é montado uma vez por carga de dados e nunca muda.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::warn;

/// Cores fixas dos blocos conhecidos.
const FIXED_COLORS: &[(&str, &str)] = &[
    ("jp", "#6E9BC5"),
    ("west", "#4CAF50"),
    ("ru", "#E53935"),
    ("cn", "#F4B400"),
    ("ua", "#1E88E5"),
    ("cee", "#8E24AA"),
    ("eu", "#3949AB"),
    ("tr", "#00897B"),
    ("me", "#6D4C41"),
    ("in", "#EF6C00"),
    ("by", "#5D4037"),
    ("ir", "#B71C1C"),
    ("wire", "#607D8B"),
];

/// Nomes de exibição (inglês + emoji de bandeira).
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("jp", "🇯🇵 Japan"),
    ("west", "🌎 West (US/UK/EU)"),
    ("ru", "🇷🇺 Russia"),
    ("cn", "🇨🇳 China"),
    ("ua", "🇺🇦 Ukraine"),
    ("cee", "🇵🇱 Central & Eastern Europe"),
    ("eu", "🇪🇺 European Union"),
    ("tr", "🇹🇷 Turkey"),
    ("me", "🇶🇦 Middle East"),
    ("in", "🇮🇳 India"),
    ("by", "🇧🇾 Belarus"),
    ("ir", "🇮🇷 Iran"),
    ("wire", "📰 News Wires (Reuters/AP)"),
];

/// Paleta qualitativa Set2 seguida de Set3.
pub const FALLBACK_PALETTE: &[&str] = &[
    // Set2
    "#66C2A5", "#FC8D62", "#8DA0CB", "#E78AC3", "#A6D854", "#FFD92F", "#E5C494", "#B3B3B3",
    // Set3
    "#8DD3C7", "#FFFFB3", "#BEBADA", "#FB8072", "#80B1D3", "#FDB462", "#B3DE69", "#FCCDE5",
    "#D9D9D9", "#BC80BD", "#CCEBC5", "#FFED6F",
];

fn lookup(table: &[(&str, &'static str)], code: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == code).map(|(_, v)| *v)
}

/// Nome de exibição de um código (conhecido ou não).
pub fn display_name(code: &str) -> String {
    lookup(DISPLAY_NAMES, code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_uppercase())
}

/// Cor fixa de um código conhecido.
pub fn fixed_color(code: &str) -> Option<&'static str> {
    lookup(FIXED_COLORS, code)
}

/// Um bloco observado nos dados.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bloc {
    pub code: String,
    pub display: String,
    pub color: String,
}

/// Mapeamentos código ↔ nome de exibição ↔ cor para os blocos de uma carga.
#[derive(Debug, Clone, Default)]
pub struct BlocRegistry {
    /// Ordenados pelo código.
    blocs: Vec<Bloc>,
    by_code: HashMap<String, usize>,
    by_display: HashMap<String, usize>,
}

impl BlocRegistry {
    /// Constrói o registro a partir dos códigos observados (duplicados são ignorados).
    pub fn from_codes<'a, I>(codes: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sorted: BTreeSet<&str> = codes.into_iter().collect();
        let mut registry = Self::default();
        for (i, code) in sorted.into_iter().enumerate() {
            let color = fixed_color(code)
                .unwrap_or(FALLBACK_PALETTE[i % FALLBACK_PALETTE.len()])
                .to_string();
            let bloc = Bloc {
                code: code.to_string(),
                display: display_name(code),
                color,
            };
            if registry.by_display.contains_key(&bloc.display) {
                warn!(code = %bloc.code, display = %bloc.display, "nome de exibição repetido; o último código prevalece");
            }
            registry.by_code.insert(bloc.code.clone(), i);
            registry.by_display.insert(bloc.display.clone(), i);
            registry.blocs.push(bloc);
        }
        registry
    }

    pub fn is_empty(&self) -> bool {
        self.blocs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocs.len()
    }

    /// Blocos em ordem de código.
    pub fn blocs(&self) -> &[Bloc] {
        &self.blocs
    }

    pub fn get(&self, code: &str) -> Option<&Bloc> {
        self.by_code.get(code).map(|&i| &self.blocs[i])
    }

    /// Código interno correspondente a um nome de exibição.
    pub fn code_for_display(&self, display: &str) -> Option<&str> {
        self.by_display.get(display).map(|&i| self.blocs[i].code.as_str())
    }

    /// Nome de exibição (funciona também para códigos fora do registro).
    pub fn display(&self, code: &str) -> String {
        self.get(code)
            .map(|b| b.display.clone())
            .unwrap_or_else(|| display_name(code))
    }

    /// Nomes de exibição em ordem alfabética (opções do seletor).
    pub fn display_options(&self) -> Vec<String> {
        let mut options: Vec<String> = self.blocs.iter().map(|b| b.display.clone()).collect();
        options.sort();
        options.dedup();
        options
    }

    /// Mapa nome de exibição → cor, usado pelos gráficos.
    pub fn color_map(&self) -> BTreeMap<String, String> {
        self.blocs
            .iter()
            .map(|b| (b.display.clone(), b.color.clone()))
            .collect()
    }
}
