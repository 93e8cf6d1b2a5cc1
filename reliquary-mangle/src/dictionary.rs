//! Dictionary-attack demangling.
//!
//! Mangling is one-way, so recovering the display name behind an on-disk
//! mangled string is a search: expand a user-supplied word list into
//! candidate phrases up to some depth, mangle each, and keep the ones that
//! land on a wanted target. This is exposed as a cancellable scan using the
//! same shared-flag shape the filter scheduler uses for its jobs, so a long
//! bruteforce can be abandoned the moment a newer request supersedes it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::mangle::mangle_segment;

/// How candidate phrases are joined when concatenating dictionary words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStyle {
    /// Words are concatenated with no separator: `"Fire" + "Sword"` → `"FireSword"`.
    Concatenated,
    /// Words are joined with a single space: `"Fire Sword"`.
    Spaced,
}

/// Options controlling how far and how the dictionary is expanded.
#[derive(Debug, Clone)]
pub struct DictionaryOptions {
    /// Maximum number of dictionary words combined into one candidate.
    pub max_depth: usize,
    /// Which join styles to try between words.
    pub join_styles: Vec<JoinStyle>,
    /// Whether to also try each candidate with a trailing `s` appended.
    pub try_trailing_s: bool,
    /// Number of candidates to check between cancellation-flag polls.
    pub poll_interval: usize,
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        DictionaryOptions {
            max_depth: 2,
            join_styles: vec![JoinStyle::Concatenated, JoinStyle::Spaced],
            try_trailing_s: true,
            poll_interval: 1000,
        }
    }
}

/// One accepted dictionary-attack hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemangleHit {
    /// The candidate phrase that mangled to a wanted target.
    pub candidate: String,
    /// The mangled value it matched.
    pub mangled: String,
}

fn expand(words: &[String], opts: &DictionaryOptions) -> Vec<String> {
    let mut candidates: Vec<String> = words.to_vec();
    let mut frontier = words.to_vec();

    for _ in 1..opts.max_depth {
        let mut next = Vec::new();
        for prefix in &frontier {
            for word in words {
                for style in &opts.join_styles {
                    let joined = match style {
                        JoinStyle::Concatenated => format!("{prefix}{word}"),
                        JoinStyle::Spaced => format!("{prefix} {word}"),
                    };
                    next.push(joined);
                }
            }
        }
        candidates.extend(next.iter().cloned());
        frontier = next;
    }

    if opts.try_trailing_s {
        let with_s: Vec<String> = candidates.iter().map(|c| format!("{c}s")).collect();
        candidates.extend(with_s);
    }

    candidates
}

/// Scans dictionary-derived candidates for ones that mangle to a value in
/// `targets`, stopping early if `cancelled` is observed set.
///
/// Matches every generated candidate whose mangled form equals a wanted
/// segment hash; duplicate candidates (e.g. `"a"` generated at depth 1 and
/// again trivially at depth 2) are naturally deduplicated by the caller
/// consuming `targets` as a set.
pub fn bruteforce_demangle(
    words: &[String],
    targets: &HashSet<String>,
    opts: &DictionaryOptions,
    cancelled: &AtomicBool,
) -> Vec<DemangleHit> {
    let candidates = expand(words, opts);
    let mut hits = Vec::new();

    for (checked, candidate) in candidates.iter().enumerate() {
        if checked % opts.poll_interval.max(1) == 0 && cancelled.load(Ordering::Relaxed) {
            break;
        }
        let mangled = mangle_segment(candidate);
        if targets.contains(&mangled) {
            hits.push(DemangleHit {
                candidate: candidate.clone(),
                mangled,
            });
        }
    }

    hits
}
