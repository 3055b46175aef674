//! # Stop-words em inglês para notícias
//!
//! Todo artigo é tratado como inglês, independentemente do bloco (`lang`): o rótulo
//! identifica a *origem* da mídia, não o idioma do texto. O conjunto final é a união
//! de três listas:
//!
//! - **Base**: artigos, preposições, auxiliares e verbos de atribuição ("said", "report").
//! - **Notícias**: jargão editorial ("breaking", "exclusive", "update").
//! - **Custom**: ajustes manuais para o corpus de guerra.
//!
//! O conjunto é montado uma única vez e nunca muda durante o processo.

use std::collections::HashSet;
use std::sync::LazyLock;

const STOP_EN_BASE: &[&str] = &[
    "the", "of", "to", "and", "a", "in", "is", "it", "for", "on", "that", "with", "as", "at",
    "by", "from", "this", "be", "are", "was", "were", "been", "being",
    "or", "an", "into", "amid", "among", "over", "under", "against", "during", "after", "before",
    "while", "through", "between", "within",
    "will", "would", "can", "could", "should", "may", "might", "must", "do", "does", "did",
    "doing", "done", "not", "no", "nor", "than", "then",
    "very", "more", "most", "much", "many", "few", "several", "any", "some", "other", "such",
    "new", "one", "two", "three", "four", "five",
    "say", "says", "said", "people", "person", "group", "groups", "officials", "sources",
    "report", "reports", "according",
];

const STOP_EN_NEWS: &[&str] = &[
    "amidst", "amid", "crisis", "conflict", "situation", "issue", "issues", "update", "live",
    "latest", "video", "photo", "photos",
    "breaking", "exclusive", "analysis", "opinion", "editorial", "comment", "comments", "view",
    "views", "world", "news",
    "government", "authorities", "media", "social", "online", "reported", "reporting",
];

const STOP_EN_CUSTOM: &[&str] = &[
    "with", "people", "video", "live", "update", "officials", "say", "says", "first", "all",
];

static STOP_EN: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    STOP_EN_BASE
        .iter()
        .chain(STOP_EN_NEWS)
        .chain(STOP_EN_CUSTOM)
        .copied()
        .collect()
});

/// `true` se a palavra (já em minúsculas) deve ser descartada.
pub fn is_stop_word(word: &str) -> bool {
    STOP_EN.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_of_all_lists() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("breaking"));
        assert!(is_stop_word("first"));
        assert!(!is_stop_word("troops"));
    }

    #[test]
    fn test_duplicates_collapse() {
        // "amid", "with", "people"... aparecem em mais de uma lista
        let total = STOP_EN_BASE.len() + STOP_EN_NEWS.len() + STOP_EN_CUSTOM.len();
        assert!(STOP_EN.len() < total);
    }
}
