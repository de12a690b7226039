/*!
 * Tests for the subtitle synthesis pipeline as a whole
 */

use regex::Regex;

use scribe2srt::app_config::SubtitleSettings;
use scribe2srt::pipeline::{self, Pipeline};
use scribe2srt::subtitle_processor::Token;
use scribe2srt::transcription::{ChunkResult, merge_results};

use crate::common::{spoken, transcript};

fn blocks(srt: &str) -> Vec<Vec<&str>> {
    srt.split("\n\n")
        .filter(|b| !b.trim().is_empty())
        .map(|b| b.lines().collect())
        .collect()
}

#[test]
fn test_process_with_spacing_tokens_should_join_words_with_single_space() {
    let tokens = vec![
        Token::word("Hello", 0.0, 0.5),
        Token::spacing(" ", 0.5, 0.6),
        Token::spacing(" ", 0.6, 0.6),
        Token::word("world.", 0.6, 1.5),
    ];

    let srt = pipeline::process(&transcript("en", tokens), &SubtitleSettings::default());

    assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,500\nHello world.\n");
}

#[test]
fn test_process_with_literal_dash_spacing_should_drop_it() {
    let tokens = vec![
        Token::word("Well", 0.0, 0.5),
        Token::spacing("-", 0.5, 0.6),
        Token::word("done.", 0.6, 1.5),
    ];

    let srt = pipeline::process(&transcript("en", tokens), &SubtitleSettings::default());

    assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,500\nWelldone.\n");
}

#[test]
fn test_process_should_number_blocks_consecutively_with_valid_timecodes() {
    let words = [
        "We", "went", "to", "the", "market.", "It", "was", "closed,", "so", "we", "walked", "home.",
        "Later", "that", "evening", "it", "started", "to", "rain.", "Nobody", "minded.",
    ];
    let tokens = spoken(&words, 0.0, 0.6);
    let timecode = Regex::new(r"^\d{2}:\d{2}:\d{2},\d{3} --> \d{2}:\d{2}:\d{2},\d{3}$").unwrap();

    let srt = pipeline::process(&transcript("en", tokens), &SubtitleSettings::default());

    let blocks = blocks(&srt);
    assert!(!blocks.is_empty());
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block[0], (i + 1).to_string());
        assert!(timecode.is_match(block[1]), "bad timecode line: {}", block[1]);
        assert!(block.len() >= 3, "block without text: {:?}", block);
    }
    assert!(srt.ends_with('\n'));
}

#[test]
fn test_build_entries_should_cover_every_spoken_word_in_order() {
    let words = ["One.", "Two", "three", "four.", "Five", "six,", "seven", "eight", "nine."];
    let tokens = spoken(&words, 0.0, 0.8);

    let entries = Pipeline::default().build_entries(&transcript("en", tokens));

    let rendered: String = entries
        .iter()
        .flat_map(|e| e.text.chars().filter(|c| !c.is_whitespace()))
        .collect();
    assert_eq!(rendered, words.concat());
    for pair in entries.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }
}

#[test]
fn test_process_with_audio_events_should_render_them_verbatim() {
    let mut tokens = spoken(&["Welcome", "back."], 0.0, 0.7);
    tokens.push(Token::audio_event("(applause)", 1.5, 3.0));
    tokens.extend(spoken(&["Thank", "you."], 4.0, 0.7));

    let srt = pipeline::process(&transcript("en", tokens), &SubtitleSettings::default());

    let blocks = blocks(&srt);
    let texts: Vec<&str> = blocks.iter().map(|b| b[2]).collect();
    assert_eq!(texts, vec!["Welcome back.", "(applause)", "Thank you."]);
    assert_eq!(blocks[1][1], "00:00:01,500 --> 00:00:03,000");
}

#[test]
fn test_process_with_reassembled_chunks_should_use_global_timestamps() {
    let mut second = transcript("en", vec![Token::word("Goodbye.", 0.0, 1.0)]);
    second.apply_time_offset(5400.0);
    let combined = merge_results(vec![
        ChunkResult {
            index: 1,
            transcript: second,
        },
        ChunkResult {
            index: 0,
            transcript: transcript("en", vec![Token::word("Hello.", 0.0, 1.0)]),
        },
    ]);

    let srt = pipeline::process(&combined, &SubtitleSettings::default());

    assert_eq!(
        srt,
        "1\n00:00:00,000 --> 00:00:01,000\nHello.\n\n2\n01:30:00,000 --> 01:30:01,000\nGoodbye.\n"
    );
}

#[test]
fn test_process_with_japanese_should_not_insert_spaces() {
    let tokens = vec![
        Token::word("今日", 0.0, 0.4),
        Token::word("は", 0.4, 0.6),
        Token::word("晴れ", 0.6, 1.0),
        Token::word("です", 1.0, 1.3),
        Token::word("。", 1.3, 1.5),
    ];

    let srt = pipeline::process(&transcript("ja", tokens), &SubtitleSettings::default());

    assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,500\n今日は晴れです。\n");
}

#[test]
fn test_process_with_custom_settings_should_respect_min_duration() {
    let settings = SubtitleSettings {
        min_duration: 2.0,
        ..SubtitleSettings::default()
    };
    let tokens = vec![Token::word("Yes.", 10.0, 10.25)];

    let entries = Pipeline::new(settings).build_entries(&transcript("en", tokens));

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].start, 10.0);
    assert_eq!(entries[0].end, 12.0);
}
