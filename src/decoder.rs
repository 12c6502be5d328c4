use std::ops::Range;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::path::Path;

/// `%(` + word characters, `.`, `:`, `[`, `]`, `=`, `&` + `)`.
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"%\([A-Za-z0-9_.:\[\]=&]+\)").unwrap());

/// Maps each distinct accessor token of a text to its decoded [`Path`].
///
/// Entries keep first-appearance order. Every occurrence span is kept as well so
/// a renderer can rebuild the text in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoder {
    entries: Vec<(String, Path)>,
    occurrences: Vec<(Range<usize>, usize)>,
}

/// Scan `text` for accessor tokens. No tokens is not an error: the decoder is empty.
pub fn decode(text: &str) -> Decoder {
    let matches: Vec<_> = TOKEN.find_iter(text).collect();

    let entries: Vec<(String, Path)> = matches
        .iter()
        .map(|m| m.as_str())
        .unique()
        .map(|token| (token.to_string(), Path::parse(inner(token))))
        .collect();

    let occurrences = matches
        .iter()
        .filter_map(|m| {
            entries
                .iter()
                .position(|(token, _)| token == m.as_str())
                .map(|idx| (m.range(), idx))
        })
        .collect();

    let decoder = Decoder {
        entries,
        occurrences,
    };
    tracing::trace!(tokens = ?decoder.keys().collect::<Vec<_>>(), "decoded accessor definitions");
    decoder
}

/// Strip the `%(` `)` delimiters.
fn inner(token: &str) -> &str {
    &token[2..token.len() - 1]
}

impl Decoder {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct token texts, `%(` `)` included, in first-appearance order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(token, _)| token.as_str())
    }

    pub fn get(&self, token: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, path)| path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(token, path)| (token.as_str(), path))
    }

    pub fn first(&self) -> Option<(&str, &Path)> {
        self.iter().next()
    }

    /// Every token occurrence as (byte span in the source text, entry index),
    /// in source order.
    pub fn occurrences(&self) -> &[(Range<usize>, usize)] {
        &self.occurrences
    }
}
