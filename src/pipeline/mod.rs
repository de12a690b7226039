/*!
 * Subtitle synthesis pipeline.
 *
 * Turns a transcript's token stream into finished subtitle text in two stages:
 *
 * 1. `preprocess` normalizes spacing and punctuation, then `splitter` groups
 *    words into sentence entries at punctuation boundaries.
 * 2. `merger` greedily merges short neighbours and optimizes timing, after which
 *    audio-event entries are added back and everything is rendered in start order.
 *
 * The whole pipeline is pure and deterministic: the same transcript and settings
 * always produce byte-identical output.
 */

pub mod line_breaker;
pub mod merger;
pub mod preprocess;
pub mod punctuation;
pub mod splitter;

use log::debug;

use crate::app_config::{MergeTuning, SubtitleSettings};
use crate::subtitle_processor::{self, SubtitleEntry, Token, Transcript};

use merger::IntelligentMerger;
use splitter::SentenceSplitter;

/// Subtitle pipeline bound to a set of layout settings
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    settings: SubtitleSettings,
    tuning: MergeTuning,
}

impl Pipeline {
    pub fn new(settings: SubtitleSettings) -> Self {
        Self::with_tuning(settings, MergeTuning::default())
    }

    pub fn with_tuning(settings: SubtitleSettings, tuning: MergeTuning) -> Self {
        Self { settings, tuning }
    }

    /// Run both stages and render the result; empty when the transcript has no usable tokens
    pub fn process(&self, transcript: &Transcript) -> String {
        let entries = self.build_entries(transcript);
        if entries.is_empty() {
            return String::new();
        }

        let chars_per_line = self.settings.chars_per_line(&transcript.language_code);
        subtitle_processor::render(&entries, chars_per_line)
    }

    /// Final entries in start order, before rendering
    pub fn build_entries(&self, transcript: &Transcript) -> Vec<SubtitleEntry> {
        let language = &transcript.language_code;
        let preprocessed = preprocess::normalize(&transcript.tokens);

        if preprocessed.words.is_empty() && preprocessed.audio_events.is_empty() {
            return Vec::new();
        }

        let mut entries = if preprocessed.words.is_empty() {
            Vec::new()
        } else {
            let basic = SentenceSplitter::new(language).split(&preprocessed.words);
            let merger = IntelligentMerger::with_tuning(language, &self.settings, self.tuning.clone());
            let merged = merger.merge_entries(&basic);
            debug!(
                "Pipeline: {} sentence entries merged into {}",
                basic.len(),
                merged.len()
            );
            merger.optimize_all(&merged)
        };

        entries.extend(audio_event_entries(preprocessed.audio_events));
        entries.sort_by(|a, b| a.start.total_cmp(&b.start));
        entries
    }
}

/// One standalone entry per audio event, timestamps untouched
pub fn audio_event_entries(events: Vec<Token>) -> Vec<SubtitleEntry> {
    events.into_iter().map(SubtitleEntry::from_audio_event).collect()
}

/// Convenience wrapper running the pipeline with default tuning
pub fn process(transcript: &Transcript, settings: &SubtitleSettings) -> String {
    Pipeline::new(settings.clone()).process(transcript)
}
