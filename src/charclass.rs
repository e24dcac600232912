//! Character classes and character tests
//!
//! Parses the content of grammar character classes such as `[a-z_\-]` into
//! sorted range sets, and provides the Unicode letter/digit and whitespace
//! predicates used by the scanner's word-boundary logic and the normalizer.

use unicode_general_category::{get_general_category, GeneralCategory};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeSet {
    /// Sorted, non-overlapping ranges stored as (start, end) inclusive
    ranges: Vec<(char, char)>,
}

impl Default for RangeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeSet {
    /// Create an empty RangeSet
    pub fn new() -> Self {
        RangeSet { ranges: Vec::new() }
    }

    pub fn from_range(start: char, end: char) -> Self {
        let mut set = RangeSet::new();
        set.add_range(start, end);
        set
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn add_char(&mut self, ch: char) {
        self.add_range(ch, ch);
    }

    /// Add an inclusive range; a reversed range adds nothing
    pub fn add_range(&mut self, start: char, end: char) {
        if start > end {
            return;
        }
        self.ranges.push((start, end));
        self.normalize();
    }

    /// Sort and merge overlapping or adjacent ranges
    fn normalize(&mut self) {
        if self.ranges.len() <= 1 {
            return;
        }
        self.ranges.sort_by_key(|r| r.0);
        let mut merged = Vec::with_capacity(self.ranges.len());
        let mut current = self.ranges[0];

        for &(start, end) in &self.ranges[1..] {
            if start as u32 <= current.1 as u32 + 1 {
                current.1 = current.1.max(end);
            } else {
                merged.push(current);
                current = (start, end);
            }
        }
        merged.push(current);
        self.ranges = merged;
    }

    /// Binary search over the sorted ranges
    pub fn contains(&self, ch: char) -> bool {
        let idx = self.ranges.partition_point(|&(_, end)| end < ch);
        self.ranges
            .get(idx)
            .is_some_and(|&(start, end)| start <= ch && ch <= end)
    }

    pub fn num_ranges(&self) -> usize {
        self.ranges.len()
    }
}

/// Parse the content between `[` and `]` of a character class.
///
/// Items are single characters or `a-z` ranges. A `-` that cannot form a
/// range (first or last position) is literal. Recognized escapes are
/// `\n \r \t \\ \[ \] \- \' \"` and `\u{HEX}`.
pub fn parse_class(content: &str) -> Result<RangeSet, String> {
    let chars = unescape_items(content)?;
    let mut set = RangeSet::new();
    let mut i = 0;

    while i < chars.len() {
        let (ch, _) = chars[i];
        let is_range = i + 2 < chars.len() && chars[i + 1] == ('-', false);
        if is_range {
            let (end, _) = chars[i + 2];
            if end < ch {
                return Err(format!(
                    "Invalid character range {:?}-{:?} in class [{}]",
                    ch, end, content
                ));
            }
            set.add_range(ch, end);
            i += 3;
        } else {
            set.add_char(ch);
            i += 1;
        }
    }

    Ok(set)
}

/// Decode escapes, remembering whether each character was escaped
/// (an escaped `-` never acts as a range separator).
fn unescape_items(content: &str) -> Result<Vec<(char, bool)>, String> {
    let mut out = Vec::new();
    let mut iter = content.chars().peekable();

    while let Some(ch) = iter.next() {
        if ch != '\\' {
            out.push((ch, false));
            continue;
        }
        let escaped = match iter.next() {
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                if iter.next() != Some('{') {
                    return Err("Expected '{' after \\u in character class".to_string());
                }
                let mut hex = String::new();
                loop {
                    match iter.next() {
                        Some('}') => break,
                        Some(h) => hex.push(h),
                        None => return Err("Unterminated \\u{...} escape".to_string()),
                    }
                }
                hex_to_char(&hex)?
            }
            Some(other @ ('\\' | '[' | ']' | '-' | '\'' | '"')) => other,
            Some(other) => return Err(format!("Unknown escape \\{} in character class", other)),
            None => return Err("Dangling escape at end of character class".to_string()),
        };
        out.push((escaped, true));
    }

    Ok(out)
}

pub(crate) fn hex_to_char(hex: &str) -> Result<char, String> {
    let code_point =
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))?;
    char::from_u32(code_point).ok_or_else(|| format!("Invalid Unicode code point: {}", hex))
}

/// Letters of any case or kind, and decimal digits.
pub fn is_letter_or_digit(ch: char) -> bool {
    matches!(
        get_general_category(ch),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::DecimalNumber
    )
}

/// Separator characters except the no-break spaces, plus the ASCII control
/// whitespace (tab, line feed, vertical tab, form feed, carriage return and
/// the four information separators).
pub fn is_whitespace(ch: char) -> bool {
    match ch {
        '\t' | '\n' | '\u{000B}' | '\u{000C}' | '\r' | '\u{001C}'..='\u{001F}' => true,
        '\u{00A0}' | '\u{2007}' | '\u{202F}' => false,
        _ => matches!(
            get_general_category(ch),
            GeneralCategory::SpaceSeparator
                | GeneralCategory::LineSeparator
                | GeneralCategory::ParagraphSeparator
        ),
    }
}
