//! Word tokenizer shared by vectorizer fit and transform.
//!
//! A token is a maximal run of word characters (alphanumeric or `_`) of at
//! least `min_token_chars` characters. The tokenizer is stored inside the
//! vectorizer, and therefore inside the model artifact, so the serving process
//! always splits text exactly the way the training run did.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenizer {
    pub lowercase: bool,
    pub min_token_chars: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            lowercase: true,
            min_token_chars: 2,
        }
    }
}

impl Tokenizer {
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        text.split(|c: char| !is_word_char(c))
            .filter(|token| token.chars().count() >= self.min_token_chars)
            .map(str::to_string)
            .collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = Tokenizer::default().tokenize("WINNER! Claim your prize, now...");
        assert_eq!(tokens, vec!["winner", "claim", "your", "prize", "now"]);
    }

    #[test]
    fn test_single_chars_and_punctuation_dropped() {
        let tokens = Tokenizer::default().tokenize("Let's meet at 5 o'clock: a_b!");
        assert_eq!(tokens, vec!["let", "meet", "at", "clock", "a_b"]);
    }

    #[test]
    fn test_unicode_words() {
        let tokens = Tokenizer::default().tokenize("Gratuit: CAFÉ crème über");
        assert_eq!(tokens, vec!["gratuit", "café", "crème", "über"]);
    }

    #[test]
    fn test_whitespace_only_yields_nothing() {
        assert!(Tokenizer::default().tokenize(" \t\n").is_empty());
    }

    #[test]
    fn test_case_preserved_when_configured() {
        let tokenizer = Tokenizer {
            lowercase: false,
            min_token_chars: 3,
        };
        assert_eq!(tokenizer.tokenize("FREE to go"), vec!["FREE"]);
    }
}
