/*!
 * Intelligent merging of sentence entries and timing optimization.
 *
 * Short, choppy entries are greedily coalesced with their neighbours while the
 * result stays readable, then every entry is clamped to duration, reading-speed
 * and gap constraints.
 */

use crate::app_config::{MergeTuning, SubtitleSettings};
use crate::language_utils;
use crate::subtitle_processor::{SubtitleEntry, visible_char_count};

use super::line_breaker::display_line_count;
use super::punctuation::ends_with_join_punctuation;

/// Reason two adjacent entries cannot be merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeBlocker {
    AudioEvent,
    GapTooSmall,
    GapTooLarge,
    DurationTooLong,
    CpsTooHigh,
    TooManyLines,
    LineTooLong,
}

/// Merges and optimizes subtitle entries for one language
#[derive(Debug, Clone)]
pub struct IntelligentMerger {
    /// Normalized language code
    pub language: String,
    pub is_cjk: bool,
    pub min_duration: f64,
    pub max_duration: f64,
    pub min_gap: f64,
    /// Base characters-per-second ceiling for the language
    pub max_cps: f64,
    /// Characters-per-line budget for the language
    pub max_chars_per_line: usize,
    pub tuning: MergeTuning,
}

impl IntelligentMerger {
    /// Create a merger with default tuning
    pub fn new(language_code: &str, settings: &SubtitleSettings) -> Self {
        Self::with_tuning(language_code, settings, MergeTuning::default())
    }

    pub fn with_tuning(language_code: &str, settings: &SubtitleSettings, tuning: MergeTuning) -> Self {
        let is_cjk = language_utils::is_cjk(language_code);
        let (max_cps, max_chars_per_line) = if is_cjk {
            (settings.cjk_cps, settings.cjk_chars_per_line)
        } else {
            (settings.latin_cps, settings.latin_chars_per_line)
        };

        Self {
            language: language_utils::normalize_language_code(language_code),
            is_cjk,
            min_duration: settings.min_duration,
            max_duration: settings.max_duration,
            min_gap: settings.min_gap,
            max_cps,
            max_chars_per_line,
            tuning,
        }
    }

    /// Characters per second of `text` shown for `duration`; infinite for non-positive durations
    pub fn calculate_cps(&self, text: &str, duration: f64) -> f64 {
        if duration <= 0.0 {
            return f64::INFINITY;
        }
        visible_char_count(text) as f64 / duration
    }

    /// Reading-speed ceiling for `text`, relaxed for very short fragments
    pub fn dynamic_cps_limit(&self, text: &str) -> f64 {
        let len = visible_char_count(text);
        let t = &self.tuning;

        let multiplier = if len <= t.tiny_text_chars {
            t.tiny_text_multiplier
        } else if len <= t.short_text_chars {
            t.short_text_multiplier
        } else if len <= t.medium_text_chars {
            t.medium_text_multiplier
        } else {
            1.0
        };

        self.max_cps * multiplier
    }

    /// Lines needed to display `text` at this merger's line budget
    pub fn display_line_count(&self, text: &str) -> usize {
        display_line_count(text, self.max_chars_per_line)
    }

    /// First constraint that forbids merging `a` with the following entry `b`
    pub fn merge_blocker(&self, a: &SubtitleEntry, b: &SubtitleEntry) -> Option<MergeBlocker> {
        if a.is_audio_event || b.is_audio_event {
            return Some(MergeBlocker::AudioEvent);
        }

        let gap = b.start - a.end;
        if gap < self.min_gap {
            return Some(MergeBlocker::GapTooSmall);
        }
        if gap > self.tuning.max_merge_gap {
            return Some(MergeBlocker::GapTooLarge);
        }

        let merged_duration = b.end - a.start;
        if merged_duration > self.max_duration.min(self.tuning.max_merged_duration) {
            return Some(MergeBlocker::DurationTooLong);
        }

        // Constraints are evaluated on a space-joined candidate
        let merged_text = format!("{} {}", a.text, b.text);
        if self.calculate_cps(&merged_text, merged_duration) > self.dynamic_cps_limit(&merged_text) {
            return Some(MergeBlocker::CpsTooHigh);
        }

        let lines = self.display_line_count(&merged_text);
        if lines > self.tuning.max_merged_lines {
            return Some(MergeBlocker::TooManyLines);
        }
        if lines == 1 && visible_char_count(&merged_text) > self.max_chars_per_line {
            return Some(MergeBlocker::LineTooLong);
        }

        None
    }

    pub fn can_merge(&self, a: &SubtitleEntry, b: &SubtitleEntry) -> bool {
        self.merge_blocker(a, b).is_none()
    }

    /// Heuristic score of how much readability improves by merging `a` and `b`
    pub fn merge_benefit(&self, a: &SubtitleEntry, b: &SubtitleEntry) -> f64 {
        let mut benefit = 0.0;

        for entry in [a, b] {
            let duration = entry.duration();
            if duration < self.min_duration {
                benefit += (self.min_duration - duration) * 20.0;
            }
        }

        let gap = b.start - a.end;
        if gap < 0.3 {
            benefit += (0.3 - gap) * 10.0;
        } else if gap < 0.5 {
            benefit += (0.5 - gap) * 5.0;
        }

        for entry in [a, b] {
            let chars = entry.char_count as f64;
            if chars < 3.0 {
                benefit += (3.0 - chars) * 5.0;
            } else if chars < 8.0 {
                benefit += (8.0 - chars) * 2.0;
            }
        }

        benefit
    }

    /// Combine two adjacent entries into a new one
    pub fn merge_two(&self, a: &SubtitleEntry, b: &SubtitleEntry) -> SubtitleEntry {
        let first = a.text.trim();
        let second = b.text.trim();

        let text = if self.is_cjk || (!first.is_empty() && ends_with_join_punctuation(first)) {
            format!("{}{}", first, second)
        } else {
            format!("{} {}", first, second)
        };

        let mut tokens = Vec::with_capacity(a.tokens.len() + b.tokens.len());
        tokens.extend_from_slice(&a.tokens);
        tokens.extend_from_slice(&b.tokens);

        SubtitleEntry {
            char_count: visible_char_count(&text),
            text,
            start: a.start,
            end: b.end,
            tokens,
            is_audio_event: a.is_audio_event || b.is_audio_event,
            word_count: a.word_count + b.word_count,
        }
    }

    /// Single greedy left-to-right pass absorbing following entries while it pays off
    pub fn merge_entries(&self, entries: &[SubtitleEntry]) -> Vec<SubtitleEntry> {
        let mut merged = Vec::with_capacity(entries.len());
        let mut iter = entries.iter().peekable();

        while let Some(entry) = iter.next() {
            let mut current = entry.clone();

            while let Some(next) = iter.peek() {
                if !self.can_merge(&current, next)
                    || self.merge_benefit(&current, next) <= self.tuning.benefit_threshold
                {
                    break;
                }
                current = self.merge_two(&current, next);
                iter.next();
            }

            merged.push(current);
        }

        merged
    }

    /// Clamp one entry's end to the duration and reading-speed constraints
    pub fn optimize_single(&self, entry: &SubtitleEntry) -> SubtitleEntry {
        let mut optimized = entry.clone();
        let mut duration = optimized.duration();

        if duration > self.max_duration {
            duration = self.max_duration;
        }
        if duration < self.min_duration {
            duration = self.min_duration;
        }
        optimized.end = optimized.start + duration;

        let limit = self.dynamic_cps_limit(&optimized.text);
        if self.calculate_cps(&optimized.text, duration) > limit {
            let required = visible_char_count(&optimized.text) as f64 / limit;
            optimized.end = optimized.start + required.min(self.max_duration);
        }

        optimized
    }

    /// Optimize every entry, then keep at least `min_gap` before the next entry's original start
    pub fn optimize_all(&self, entries: &[SubtitleEntry]) -> Vec<SubtitleEntry> {
        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let mut optimized = self.optimize_single(entry);

                if let Some(next) = entries.get(i + 1) {
                    if next.start - optimized.end < self.min_gap {
                        let min_end = optimized.start + self.min_duration;
                        optimized.end = (next.start - self.min_gap).max(min_end);
                    }
                }

                optimized
            })
            .collect()
    }
}
