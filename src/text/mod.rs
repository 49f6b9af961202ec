//! # Text Measurement
//!
//! Flowed text is measured by a black-box service: given a width it returns
//! line spans, and it answers min-content and max-content width queries.
//! Layout never looks at glyphs.
//!
//! [`FixedAdvanceMeasurer`] is the built-in service: every character advances
//! by a fixed fraction of the font size, and lines break greedily at UAX#14
//! opportunities.

use std::fmt;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// One line of a broken paragraph, as a byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSpan {
    pub start: usize,
    /// Exclusive; trailing whitespace and line terminators are not included.
    pub end: usize,
    pub width: f64,
}

/// Measurement service consumed by paragraph layout and column sizing.
pub trait TextMeasurer: fmt::Debug {
    /// Break `text` into lines no wider than `max_width`. Every line holds at
    /// least one character, so a word wider than the line is broken. Empty
    /// text has no lines.
    fn break_lines(&self, text: &str, max_width: f64, font_size: f64) -> Vec<LineSpan>;

    /// Width of the widest line when only mandatory breaks are taken.
    fn max_content_width(&self, text: &str, font_size: f64) -> f64;

    /// Width of the widest unbreakable word.
    fn min_content_width(&self, text: &str, font_size: f64) -> f64;
}

/// Monospaced measurement: each character advances `advance * font_size`.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvanceMeasurer {
    advance: f64,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self { advance: 0.5 }
    }
}

impl FixedAdvanceMeasurer {
    /// `advance` is the character width as a fraction of the font size.
    pub fn new(advance: f64) -> Self {
        Self { advance }
    }

    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        if is_line_terminator(ch) {
            0.0
        } else {
            self.advance * font_size
        }
    }

    fn measure(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|c| self.char_width(c, font_size)).sum()
    }
}

/// Rounding slack when a line is exactly as wide as the space offered.
const FIT_TOLERANCE: f64 = 1e-6;

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        // a break at the very end of the text is implied
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

struct LineBuilder<'a> {
    chars: &'a [(usize, char)],
    widths: &'a [f64],
    text_len: usize,
    lines: Vec<LineSpan>,
}

impl LineBuilder<'_> {
    /// Close the line made of chars `[from, to)`.
    fn push(&mut self, from: usize, to: usize) {
        let mut end = to;
        while end > from && (self.chars[end - 1].1.is_whitespace()) {
            end -= 1;
        }
        let start_byte = self.chars.get(from).map(|c| c.0).unwrap_or(self.text_len);
        let end_byte = self.chars.get(end).map(|c| c.0).unwrap_or(self.text_len);
        let width = self.widths[from..end].iter().sum();
        self.lines.push(LineSpan {
            start: start_byte,
            end: end_byte,
            width,
        });
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn break_lines(&self, text: &str, max_width: f64, font_size: f64) -> Vec<LineSpan> {
        if text.is_empty() {
            return vec![];
        }

        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let widths: Vec<f64> = chars
            .iter()
            .map(|(_, c)| self.char_width(*c, font_size))
            .collect();
        let break_opps = compute_break_opportunities(text);
        let mut out = LineBuilder {
            chars: &chars,
            widths: &widths,
            text_len: text.len(),
            lines: Vec::new(),
        };

        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break: Option<usize> = None;

        for i in 0..chars.len() {
            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        out.push(line_start, i);
                        line_start = i;
                        line_width = 0.0;
                        last_break = None;
                    }
                    // a line may end before char i
                    Some(BreakOpportunity::Allowed) => last_break = Some(i),
                    None => {}
                }
            }

            let ch = chars[i].1;
            if is_line_terminator(ch) {
                continue;
            }
            let w = widths[i];

            // Spaces may hang past the edge; they are trimmed from the line.
            if line_width + w > max_width + FIT_TOLERANCE && line_start < i && !ch.is_whitespace() {
                match last_break {
                    Some(bp) if bp > line_start => {
                        out.push(line_start, bp);
                        line_start = bp;
                        line_width = widths[bp..i].iter().sum();
                    }
                    // No break point: force a break before this character
                    _ => {
                        out.push(line_start, i);
                        line_start = i;
                        line_width = 0.0;
                    }
                }
                last_break = None;
            }

            line_width += w;
        }

        if line_start < chars.len() {
            out.push(line_start, chars.len());
        }

        out.lines
    }

    fn max_content_width(&self, text: &str, font_size: f64) -> f64 {
        text.split(is_line_terminator)
            .map(|line| self.measure(line.trim_end(), font_size))
            .fold(0.0, f64::max)
    }

    fn min_content_width(&self, text: &str, font_size: f64) -> f64 {
        text.split_whitespace()
            .map(|word| self.measure(word, font_size))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str, max_width: f64) -> Vec<String> {
        FixedAdvanceMeasurer::default()
            .break_lines(text, max_width, 10.0)
            .iter()
            .map(|l| text[l.start..l.end].to_string())
            .collect()
    }

    #[test]
    fn single_line() {
        let m = FixedAdvanceMeasurer::default();
        let spans = m.break_lines("Hello", 1000.0, 10.0);
        assert_eq!(spans.len(), 1);
        assert!((spans[0].width - 25.0).abs() < 0.001);
    }

    #[test]
    fn breaks_at_space() {
        // 5pt per char, 40pt fits 8 chars
        assert_eq!(lines("aaaa bbbb cccc", 40.0), vec!["aaaa", "bbbb", "cccc"]);
        assert_eq!(lines("aaa bbb ccc", 40.0), vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn explicit_newline() {
        assert_eq!(lines("ab\ncd", 1000.0), vec!["ab", "cd"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(lines("", 100.0).is_empty());
    }

    #[test]
    fn long_word_is_broken_by_character() {
        assert_eq!(lines("abcdefghij", 20.0), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn at_least_one_char_per_line() {
        let l = lines("abc", 1.0);
        assert_eq!(l, vec!["a", "b", "c"]);
    }

    #[test]
    fn spans_partition_the_text() {
        let text = "one two three four five six";
        let spans = FixedAdvanceMeasurer::default().break_lines(text, 30.0, 10.0);
        let rejoined: Vec<&str> = spans.iter().map(|s| &text[s.start..s.end]).collect();
        assert_eq!(rejoined.join(" "), text);
        for s in &spans {
            assert!(s.width <= 30.0 + 0.001);
        }
    }

    #[test]
    fn content_widths() {
        let m = FixedAdvanceMeasurer::default();
        assert!((m.max_content_width("ab cd\nabcdefg", 10.0) - 35.0).abs() < 0.001);
        assert!((m.min_content_width("ab abcde x", 10.0) - 25.0).abs() < 0.001);
    }

    #[test]
    fn multibyte_offsets_are_char_boundaries() {
        let text = "héllo wörld";
        let spans = FixedAdvanceMeasurer::default().break_lines(text, 30.0, 10.0);
        for s in spans {
            assert!(text.is_char_boundary(s.start));
            assert!(text.is_char_boundary(s.end));
        }
    }
}
