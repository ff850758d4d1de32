//! BPE token counting over the tiktoken encodings.

use thiserror::Error;
use tiktoken_rs::{get_bpe_from_tokenizer, tokenizer::Tokenizer};

pub const DEFAULT_ENCODING: &str = "gpt2";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("unknown encoding: {0} (expected gpt2, r50k_base, p50k_base, cl100k_base or o200k_base)")]
    UnknownEncoding(String),
    #[error("failed to load encoding {0}: {1}")]
    Load(String, String),
}

/// Token ids for one text and their count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenCount {
    pub ids: Vec<usize>,
    pub count: usize,
}

fn tokenizer_for(encoding: &str) -> Option<Tokenizer> {
    match encoding.to_ascii_lowercase().as_str() {
        "gpt2" => Some(Tokenizer::Gpt2),
        "r50k_base" => Some(Tokenizer::R50kBase),
        "p50k_base" => Some(Tokenizer::P50kBase),
        "cl100k_base" => Some(Tokenizer::Cl100kBase),
        "o200k_base" => Some(Tokenizer::O200kBase),
        _ => None,
    }
}

/// Encodes `text` without special tokens.
pub fn count_tokens(text: &str, encoding: &str) -> Result<TokenCount, TokenError> {
    let tokenizer =
        tokenizer_for(encoding).ok_or_else(|| TokenError::UnknownEncoding(encoding.to_string()))?;
    let bpe = get_bpe_from_tokenizer(tokenizer)
        .map_err(|e| TokenError::Load(encoding.to_string(), e.to_string()))?;
    let ids = bpe.encode_ordinary(text);
    let count = ids.len();
    tracing::debug!(encoding, count, "counted tokens");
    Ok(TokenCount { ids, count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt2_hello_world() {
        let out = count_tokens("hello world", "gpt2").unwrap();
        assert_eq!(out.ids, vec![31373, 995]);
        assert_eq!(out.count, 2);
    }

    #[test]
    fn cl100k_hello_world() {
        let out = count_tokens("hello world", "cl100k_base").unwrap();
        assert_eq!(out.ids, vec![15339, 1917]);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert_eq!(count_tokens("", "p50k_base").unwrap().count, 0);
    }

    #[test]
    fn special_token_text_is_encoded_as_plain_text() {
        let out = count_tokens("<|endoftext|>", "gpt2").unwrap();
        assert!(out.count > 1);
        assert!(!out.ids.contains(&50256));
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(matches!(
            count_tokens("x", "llama3"),
            Err(TokenError::UnknownEncoding(_))
        ));
    }
}
