/*!
 * Token stream normalization ahead of sentence splitting.
 */

use crate::subtitle_processor::{Token, TokenKind};

use super::punctuation::is_cjk_fusion_char;

/// Output of [`normalize`]: speech tokens and non-speech events, each in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preprocessed {
    pub words: Vec<Token>,
    pub audio_events: Vec<Token>,
}

/// Normalize a raw token stream.
///
/// - audio events are moved to a side list
/// - blank spacing tokens become a single trailing space on the previous word
/// - a standalone CJK punctuation token is fused onto the previous word, extending its end
pub fn normalize(tokens: &[Token]) -> Preprocessed {
    let mut words: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut audio_events = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::AudioEvent => audio_events.push(token.clone()),
            TokenKind::Spacing => {
                if !token.text.trim().is_empty() {
                    continue;
                }
                if let Some(prev) = words.last_mut() {
                    if prev.is_word() && !prev.text.ends_with(' ') {
                        prev.text.push(' ');
                    }
                }
            }
            TokenKind::Word => {
                if let Some(c) = single_char(&token.text) {
                    if is_cjk_fusion_char(c) && try_fuse(&mut words, token) {
                        continue;
                    }
                }
                words.push(token.clone());
            }
        }
    }

    Preprocessed { words, audio_events }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

// Fuse `punct` onto the last word unless that word already ends in fusion punctuation
fn try_fuse(words: &mut [Token], punct: &Token) -> bool {
    let Some(prev) = words.last_mut() else {
        return false;
    };
    if !prev.is_word() {
        return false;
    }
    match prev.text.chars().last() {
        Some(last) if !is_cjk_fusion_char(last) => {
            prev.text.push_str(&punct.text);
            prev.end = punct.end;
            true
        }
        _ => false,
    }
}
