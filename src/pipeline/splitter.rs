/*!
 * Sentence splitting: groups normalized word tokens into sentence-level entries.
 */

use crate::language_utils;
use crate::subtitle_processor::{SubtitleEntry, Token};

use super::punctuation::{Priority, trailing_priority};

/// Accumulated words needed before a medium-priority boundary splits
const MEDIUM_MIN_WORDS: usize = 3;
/// Accumulated words needed before a low-priority boundary splits
const LOW_MIN_WORDS: usize = 5;
/// Accumulated characters needed before a low-priority boundary splits
const LOW_MIN_CHARS: usize = 15;

/// Splits a normalized token stream into sentence entries
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    /// Normalized language code
    pub language: String,
    /// Whether the language is Chinese, Japanese or Korean
    pub is_cjk: bool,
}

impl SentenceSplitter {
    pub fn new(language_code: &str) -> Self {
        Self {
            language: language_utils::normalize_language_code(language_code),
            is_cjk: language_utils::is_cjk(language_code),
        }
    }

    /// Decide whether a group should end after `word`.
    ///
    /// `accumulated` holds the tokens already in the current group, excluding `word`.
    pub fn should_split_after(&self, word: &Token, accumulated: &[Token]) -> bool {
        match trailing_priority(&word.text) {
            Priority::High => true,
            Priority::Medium => accumulated.len() >= MEDIUM_MIN_WORDS,
            Priority::Low => {
                accumulated.len() >= LOW_MIN_WORDS
                    && accumulated.iter().map(|t| t.text.chars().count()).sum::<usize>()
                        >= LOW_MIN_CHARS
            }
            Priority::None => false,
        }
    }

    /// Group tokens at qualifying boundaries; the last token always closes a group
    pub fn split_into_groups(&self, words: &[Token]) -> Vec<Vec<Token>> {
        let mut groups = Vec::new();
        let mut current: Vec<Token> = Vec::new();

        for (i, word) in words.iter().enumerate() {
            let split = self.should_split_after(word, &current);
            current.push(word.clone());

            if split || i == words.len() - 1 {
                groups.push(std::mem::take(&mut current));
            }
        }

        groups
    }

    /// Turn groups into entries, dropping groups without any word-kind token
    pub fn create_entries(&self, groups: Vec<Vec<Token>>) -> Vec<SubtitleEntry> {
        groups
            .into_iter()
            .filter_map(|group| {
                let first = group.iter().find(|t| t.is_word())?;
                let last = group.iter().rev().find(|t| t.is_word())?;
                let (start, end) = (first.start, last.end);

                let text: String = group.iter().map(|t| t.text.as_str()).collect();
                let text = text.trim().to_string();
                if text.is_empty() {
                    return None;
                }

                Some(SubtitleEntry::new(text, start, end, group))
            })
            .collect()
    }

    /// Split `words` into sentence entries
    pub fn split(&self, words: &[Token]) -> Vec<SubtitleEntry> {
        self.create_entries(self.split_into_groups(words))
    }
}
