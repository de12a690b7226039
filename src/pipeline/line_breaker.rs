/*!
 * Line breaking for subtitle display.
 *
 * Positions and lengths are counted in characters (code points), never bytes.
 */

use super::punctuation::is_punctuation;

/// Find a character index at which to break `text` so the first part fits `max_len`.
///
/// Returns the full length when no break is needed. Otherwise scans backwards from
/// `max_len`: a space splits at the space, a punctuation character splits right
/// after it. Without a candidate the text is cut hard at `max_len`.
pub fn find_split_position(text: &str, max_len: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return chars.len();
    }

    let search_end = (max_len + 1).min(chars.len());
    for i in (1..search_end).rev() {
        if chars[i] == ' ' {
            return i;
        }
        if is_punctuation(chars[i]) {
            return i + 1;
        }
    }

    // A zero budget still has to make progress
    max_len.max(1)
}

/// Split `text` into at most two trimmed lines joined by a newline
pub fn split_into_lines(text: &str, max_len: usize) -> String {
    let text = text.trim();
    let split = find_split_position(text, max_len);
    let (first, rest) = split_at_char(text, split);

    let first = first.trim();
    let rest = rest.trim();
    if rest.is_empty() {
        first.to_string()
    } else {
        format!("{}\n{}", first, rest)
    }
}

/// Single line when the text fits `chars_per_line`, otherwise one break
pub fn optimize_text_display(text: &str, chars_per_line: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= chars_per_line {
        return text.to_string();
    }
    split_into_lines(text, chars_per_line)
}

/// Number of display lines `text` needs when wrapped at `max_len`, without a cap
pub fn display_line_count(text: &str, max_len: usize) -> usize {
    let mut remaining = text.trim();
    let mut lines = 0;

    while !remaining.is_empty() {
        lines += 1;
        if remaining.chars().count() <= max_len {
            break;
        }
        let split = find_split_position(remaining, max_len);
        remaining = split_at_char(remaining, split).1.trim();
    }

    lines
}

fn split_at_char(text: &str, char_index: usize) -> (&str, &str) {
    let byte_index = text
        .char_indices()
        .nth(char_index)
        .map_or(text.len(), |(i, _)| i);
    text.split_at(byte_index)
}
