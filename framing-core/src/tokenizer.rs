//! # Tokenizador de inglês para notícias
//!
//! Única etapa linguística do pipeline. O texto combinado (título + corpo) é
//! convertido para minúsculas e dele extraímos as sequências máximas que casam com
//! "uma letra seguida de letras, hífens ou apóstrofos".
//!
//! ## Regras de filtragem
//!
//! - comprimento > 2 (descarta "us", "un", ...)
//! - fora do conjunto de stop-words ([`crate::stopwords`])
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use framing_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("Soldiers report troops advance near border");
//! assert_eq!(tokens, vec!["soldiers", "troops", "advance", "near", "border"]);
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::stopwords::is_stop_word;

/// Comprimento mínimo (exclusivo) de um token aceito.
pub const MIN_TOKEN_LEN: usize = 2;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z\-']+").expect("regex de token válida"));

/// Junta título e corpo com um único espaço; campos nulos viram string vazia.
pub fn combine_title_text(title: Option<&str>, text: Option<&str>) -> String {
    format!("{} {}", title.unwrap_or(""), text.unwrap_or(""))
}

/// Tokeniza o texto, preservando a ordem de ocorrência (inclusive repetições).
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| t.chars().count() > MIN_TOKEN_LEN && !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid_token(token: &str) -> bool {
        let mut chars = token.chars();
        let first_is_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
        first_is_letter
            && chars.all(|c| c.is_ascii_lowercase() || c == '-' || c == '\'')
            && token.chars().count() > MIN_TOKEN_LEN
            && !is_stop_word(token)
    }

    #[test]
    fn test_tokenize_headline_and_body() {
        let text_all = combine_title_text(
            Some("Troops advance"),
            Some("Soldiers report troops advance near border"),
        );
        let tokens = tokenize(&text_all);
        for expected in ["troops", "advance", "soldiers", "border"] {
            assert!(tokens.contains(&expected.to_string()), "faltou {expected}");
        }
        assert!(!tokens.contains(&"report".to_string()));
        // "troops" aparece no título e no corpo
        assert_eq!(tokens.iter().filter(|t| *t == "troops").count(), 2);
    }

    #[test]
    fn test_combine_nulls_as_empty() {
        assert_eq!(combine_title_text(None, None), " ");
        assert_eq!(combine_title_text(Some("a"), None), "a ");
        assert_eq!(combine_title_text(None, Some("b")), " b");
    }

    #[test]
    fn test_hyphens_and_apostrophes_kept_inside() {
        let tokens = tokenize("Kyiv's cease-fire talks -- 'quiet' x-ray");
        assert_eq!(tokens, vec!["kyiv's", "cease-fire", "talks", "quiet'", "x-ray"]);
    }

    #[test]
    fn test_digits_and_short_words_dropped() {
        let tokens = tokenize("G7 and EU at 10am: US, UK go");
        assert!(tokens.is_empty(), "tokens inesperados: {tokens:?}");
    }

    #[test]
    fn test_every_token_is_valid() {
        let samples = [
            "BREAKING: Missile strikes hit Kharkiv overnight, officials say.",
            "Peace talks resume in Istanbul; delegations meet for the first time!",
            "Über-fast drones' range — 1,200km — worries NATO's eastern flank",
            "",
            "   \n\t ",
        ];
        for text in samples {
            for token in tokenize(text) {
                assert!(is_valid_token(&token), "token inválido: {token:?}");
            }
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("").is_empty());
    }
}
