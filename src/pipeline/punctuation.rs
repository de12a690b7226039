/*!
 * Punctuation lookup tables.
 *
 * All sets are built once on first use and never mutated afterwards.
 */

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Strength of a boundary character when deciding where a sentence may end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Sentence terminators
    High,
    /// Clause and bracket closers
    Medium,
    /// Commas, openers, dash, ellipsis
    Low,
    /// Not a boundary character
    None,
}

static HIGH_PRIORITY: Lazy<HashSet<char>> = Lazy::new(|| {
    ['.', '!', '?', '。', '！', '？'].into_iter().collect()
});

static MEDIUM_PRIORITY: Lazy<HashSet<char>> = Lazy::new(|| {
    [';', ':', ')', ']', '}', '；', '：', '》', '」', '】', '）']
        .into_iter()
        .collect()
});

static LOW_PRIORITY: Lazy<HashSet<char>> = Lazy::new(|| {
    [',', '(', '[', '{', '-', '…', '，', '、', '《', '「', '【', '（']
        .into_iter()
        .collect()
});

// Suppress the space separator when merging two subtitle texts
static JOIN_PUNCTUATION: Lazy<HashSet<char>> = Lazy::new(|| {
    [
        '。', '？', '！', '、', '，', '；', '：', '“', '”', '‘', '’', '（', '）', '《', '》', '「',
        '」', '.', '?', '!', ',', ';', ':', '(', ')', '"', '\'', '-',
    ]
    .into_iter()
    .collect()
});

// Standalone tokens fused onto the preceding word during preprocessing
static CJK_FUSION: Lazy<HashSet<char>> = Lazy::new(|| {
    ['。', '？', '！', '」', '「', '、', '・', '，'].into_iter().collect()
});

/// Boundary priority of a single character
pub fn priority(c: char) -> Priority {
    if HIGH_PRIORITY.contains(&c) {
        Priority::High
    } else if MEDIUM_PRIORITY.contains(&c) {
        Priority::Medium
    } else if LOW_PRIORITY.contains(&c) {
        Priority::Low
    } else {
        Priority::None
    }
}

/// True for any character with a boundary priority
pub fn is_punctuation(c: char) -> bool {
    priority(c) != Priority::None
}

/// Priority of the last character of `text` after trimming, if it is punctuation
pub fn trailing_priority(text: &str) -> Priority {
    text.trim().chars().last().map_or(Priority::None, priority)
}

pub fn ends_with_join_punctuation(text: &str) -> bool {
    text.chars().last().is_some_and(|c| JOIN_PUNCTUATION.contains(&c))
}

pub fn is_cjk_fusion_char(c: char) -> bool {
    CJK_FUSION.contains(&c)
}
