use serde::{Deserialize, Serialize};

use crate::pipeline::line_breaker;

// @module: Transcript data model and subtitle rendering

// @enum: Kind of a transcript token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Spoken word (may carry attached punctuation)
    Word,
    /// Inter-word spacing marker
    Spacing,
    /// Non-speech annotation such as "(laughter)"
    AudioEvent,
}

// @struct: Single timestamped transcript token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    // @field: Token text
    pub text: String,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Token kind
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl Token {
    /// Creates a new token
    pub fn new(text: impl Into<String>, start: f64, end: f64, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            kind,
        }
    }

    /// Creates a word token
    pub fn word(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self::new(text, start, end, TokenKind::Word)
    }

    /// Creates a spacing token
    pub fn spacing(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self::new(text, start, end, TokenKind::Spacing)
    }

    /// Creates an audio event token
    pub fn audio_event(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self::new(text, start, end, TokenKind::AudioEvent)
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }
}

/// Transcript of one chunk, or of the whole input once chunks are combined.
///
/// Field names follow the transcription service's JSON response, so the same type
/// is used to decode responses and to save the combined transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Detected or requested language code (e.g. "eng", "jpn")
    #[serde(default)]
    pub language_code: String,

    /// Plain transcript text
    #[serde(default)]
    pub text: String,

    /// Ordered token stream
    #[serde(default, rename = "words")]
    pub tokens: Vec<Token>,
}

impl Transcript {
    pub fn new(language_code: impl Into<String>, text: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            language_code: language_code.into(),
            text: text.into(),
            tokens,
        }
    }

    /// True when there is nothing to build subtitles from
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.text.is_empty()
    }

    /// Shift every token by `offset_secs`, rounding to millisecond precision
    pub fn apply_time_offset(&mut self, offset_secs: f64) {
        for token in &mut self.tokens {
            token.start = round_to_millis(token.start + offset_secs);
            token.end = round_to_millis(token.end + offset_secs);
        }
    }
}

fn round_to_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Number of non-whitespace characters in `text`
pub fn visible_char_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Display text
    pub text: String,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Tokens the entry was built from
    pub tokens: Vec<Token>,

    // @field: Non-speech entry flag
    pub is_audio_event: bool,

    // @field: Number of word-kind tokens
    pub word_count: usize,

    // @field: Non-whitespace character count of `text`
    pub char_count: usize,
}

impl SubtitleEntry {
    /// Creates a speech entry; counts are derived from the inputs
    pub fn new(text: impl Into<String>, start: f64, end: f64, tokens: Vec<Token>) -> Self {
        let text = text.into();
        let word_count = tokens.iter().filter(|t| t.is_word()).count();
        let char_count = visible_char_count(&text);
        Self {
            text,
            start,
            end,
            tokens,
            is_audio_event: false,
            word_count,
            char_count,
        }
    }

    /// Creates a standalone entry from an audio event token, keeping its timestamps verbatim
    pub fn from_audio_event(token: Token) -> Self {
        Self {
            text: token.text.clone(),
            start: token.start,
            end: token.end,
            char_count: visible_char_count(&token.text),
            tokens: vec![token],
            is_audio_event: true,
            word_count: 0,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Format start time as a subtitle time code
    pub fn format_start_time(&self) -> String {
        format_time_code(self.start)
    }

    /// Format end time as a subtitle time code
    pub fn format_end_time(&self) -> String {
        format_time_code(self.end)
    }
}

/// Format seconds as `HH:MM:SS,mmm`.
///
/// Works on the absolute value. Milliseconds come from the fractional part of the
/// seconds field so the three fields always agree with each other.
pub fn format_time_code(seconds: f64) -> String {
    let total = seconds.abs();
    let hours = (total / 3600.0) as u64;
    let remainder = total % 3600.0;
    let minutes = (remainder / 60.0) as u64;
    let secs = remainder % 60.0;
    let millis = ((secs % 1.0) * 1000.0) as u64;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs as u64, millis)
}

/// Render entries as numbered subtitle blocks.
///
/// Entries are emitted in the order given; callers sort by start time first.
/// Blocks are separated by one blank line with none after the last block.
pub fn render(entries: &[SubtitleEntry], chars_per_line: usize) -> String {
    let mut output = String::new();

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n",
            i + 1,
            entry.format_start_time(),
            entry.format_end_time(),
            line_breaker::optimize_text_display(&entry.text, chars_per_line)
        ));
    }

    output
}
