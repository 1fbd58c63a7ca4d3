//! Reversal of the `eval(function(p,a,c,k,e,d){...})` JavaScript packer
//!
//! A packed script ships a payload in which every dictionary word was
//! replaced by its index rendered in base `a`, plus the `|`-joined
//! dictionary `k`. Unpacking substitutes the words back, highest index
//! first, only where the token forms a whole word.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{Filmi2kError, Result};

static PACKED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\}\('(.+)',(\d+),(\d+),'(.+?)'\.split\('\|'\)").unwrap()
});

/// ASCII word runs, matching JavaScript's `\b` semantics
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9A-Za-z_]+").unwrap());

/// Digits of the packer's encoding; bases up to 36 only use `0-9a-z`
const DIGITS: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const MIN_BASE: u32 = 2;
pub const MAX_BASE: u32 = 62;

/// The four arguments of a packed call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedScript {
    pub payload: String,
    pub base: u32,
    pub count: usize,
    pub dictionary: Vec<String>,
}

/// Finds a packed call site in a page or script
///
/// # Returns
/// `Some(PackedScript)` when the `}('payload',base,count,'k|e|y'.split('|')`
/// shape is present, `None` otherwise.
pub fn detect_packed(text: &str) -> Option<PackedScript> {
    let caps = PACKED_RE.captures(text)?;
    Some(PackedScript {
        payload: caps.get(1)?.as_str().to_string(),
        base: caps.get(2)?.as_str().parse().ok()?,
        count: caps.get(3)?.as_str().parse().ok()?,
        dictionary: caps.get(4)?.as_str().split('|').map(str::to_string).collect(),
    })
}

/// Renders `n` in `base`, composing digits recursively for `n >= base`
///
/// # Panics
/// If `base` is outside `MIN_BASE..=MAX_BASE`; [`unpack_parts`] checks this.
///
/// # Example
/// ```
/// use filmi2k_core::parser::packer::encode_base;
/// assert_eq!(encode_base(35, 36), "z");
/// assert_eq!(encode_base(36, 36), "10");
/// assert_eq!(encode_base(61, 62), "Z");
/// ```
pub fn encode_base(n: usize, base: u32) -> String {
    let base = base as usize;
    let digit = DIGITS[n % base] as char;
    if n < base {
        digit.to_string()
    } else {
        let mut prefix = encode_base(n / base, base as u32);
        prefix.push(digit);
        prefix
    }
}

/// Reverses the packing of a detected call site
///
/// # Errors
/// Returns `ParseError` if the base is outside 2..=62
pub fn unpack(packed: &PackedScript) -> Result<String> {
    unpack_parts(&packed.payload, packed.base, packed.count, &packed.dictionary)
}

/// Reverses the packing from its raw parts
///
/// Pure: the same input always yields the same output.
///
/// # Errors
/// Returns `ParseError` if the base is outside 2..=62
pub fn unpack_parts(payload: &str, base: u32, count: usize, dictionary: &[String]) -> Result<String> {
    if !(MIN_BASE..=MAX_BASE).contains(&base) {
        return Err(Filmi2kError::ParseError(format!(
            "unsupported packer base {}",
            base
        )));
    }

    // Indices past the dictionary have nothing to substitute
    let mut text = payload.to_string();
    for index in (0..count.min(dictionary.len())).rev() {
        let Some(word) = dictionary.get(index).filter(|w| !w.is_empty()) else {
            continue;
        };
        let token = encode_base(index, base);
        if text.contains(&token) {
            text = replace_whole_word(&text, &token, word);
        }
    }

    Ok(text)
}

/// Replaces `token` with `word` wherever it forms a complete word
fn replace_whole_word(text: &str, token: &str, word: &str) -> String {
    WORD_RE
        .replace_all(text, |caps: &Captures| {
            let run = &caps[0];
            if run == token {
                word.to_string()
            } else {
                run.to_string()
            }
        })
        .into_owned()
}
