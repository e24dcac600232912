//! Position-preserving text normalization
//!
//! Folds text to printable low ASCII one character at a time, so a grammar
//! written in plain ASCII can match text containing diacritics, typographic
//! punctuation and exotic spaces. The output always has exactly as many
//! characters as the input: offsets found in normalized text are valid in
//! the original text and in the document.
//!
//! Per character, the first applicable rule wins:
//! 1. whitespace of any kind becomes a plain space;
//! 2. a letter with a diacritic becomes its base letter;
//! 3. typographic quotes, dashes and spaces become their ASCII form;
//! 4. the fraction slash becomes `/`;
//! 5. `0x20..=0x7F` is kept;
//! 6. anything else becomes [`SENTINEL`].

use crate::charclass::is_whitespace;

/// Substitute for characters without a low ASCII equivalent.
///
/// No grammar literal contains it, so it never matches.
pub const SENTINEL: char = '\u{0080}';

/// Letters with diacritics, paired with their base letter.
const DIACRITICS: &[(&str, &str)] = &[
    // grave
    ("\u{C0}\u{E0}\u{C8}\u{E8}\u{CC}\u{EC}\u{D2}\u{F2}\u{D9}\u{F9}", "AaEeIiOoUu"),
    // acute
    (
        "\u{C1}\u{E1}\u{C9}\u{E9}\u{CD}\u{ED}\u{D3}\u{F3}\u{DA}\u{FA}\u{DD}\u{FD}",
        "AaEeIiOoUuYy",
    ),
    // circumflex
    (
        "\u{C2}\u{E2}\u{CA}\u{EA}\u{CE}\u{EE}\u{D4}\u{F4}\u{DB}\u{FB}\u{176}\u{177}",
        "AaEeIiOoUuYy",
    ),
    // tilde
    ("\u{C3}\u{E3}\u{D5}\u{F5}\u{D1}\u{F1}", "AaOoNn"),
    // umlaut
    (
        "\u{C4}\u{E4}\u{CB}\u{EB}\u{CF}\u{EF}\u{D6}\u{F6}\u{DC}\u{FC}\u{178}\u{FF}",
        "AaEeIiOoUuYy",
    ),
    // ring
    ("\u{C5}\u{E5}", "Aa"),
    // cedilla
    (
        "\u{C7}\u{E7}\u{122}\u{123}\u{136}\u{137}\u{13B}\u{13C}\u{145}\u{146}\u{156}\u{157}\
         \u{15E}\u{15F}\u{162}\u{163}\u{228}\u{229}\u{1E10}\u{1E11}\u{1E28}\u{1E29}",
        "CcGgKkLlNnRrSsTtEeDdHh",
    ),
    // double acute
    ("\u{150}\u{151}\u{170}\u{171}", "OoUu"),
    // breve, including the Cyrillic A and IE with breve
    (
        "\u{102}\u{103}\u{114}\u{115}\u{11E}\u{11F}\u{12C}\u{12D}\u{14E}\u{14F}\u{16C}\u{16D}\
         \u{4D0}\u{4D1}\u{4D6}\u{4D7}\u{1E1C}\u{1E1D}\u{1EB6}\u{1EB7}",
        "AaEeGgIiOoUuAaIiEeAa",
    ),
    // Scandinavian
    ("\u{D8}\u{F8}", "Oo"),
    // C1 controls used as letters by windows-1252 text decoded as latin-1
    ("\u{8A}\u{8E}\u{9A}\u{9E}\u{9F}", "SZszY"),
];

/// Typographic punctuation, paired with its ASCII form.
const PUNCTUATION: &[(&str, char)] = &[
    ("\u{60}\u{91}\u{92}\u{2018}\u{2032}\u{B4}\u{2019}", '\''),
    ("\u{93}\u{94}\u{201C}\u{201D}", '"'),
    (
        "\u{96}\u{97}\u{2010}\u{2011}\u{2012}\u{2013}\u{2014}\u{2015}\u{2212}",
        '-',
    ),
    (
        "\u{A0}\u{1680}\u{180E}\u{2000}\u{2001}\u{2002}\u{2003}\u{2004}\u{2005}\u{2006}\
         \u{2007}\u{2008}\u{2009}\u{200A}\u{200B}\u{202F}\u{205F}\u{3000}\u{FEFF}",
        ' ',
    ),
];

/// Characters that a compatibility decomposition would turn into ASCII.
const POST_DECOMPOSITION: &[(char, char)] = &[('\u{2044}', '/')];

fn fold_diacritic(ch: char) -> Option<char> {
    DIACRITICS.iter().find_map(|(accented, plain)| {
        accented
            .chars()
            .position(|c| c == ch)
            .and_then(|idx| plain.chars().nth(idx))
    })
}

fn fold_punctuation(ch: char) -> Option<char> {
    PUNCTUATION
        .iter()
        .find(|(variants, _)| variants.contains(ch))
        .map(|&(_, plain)| plain)
}

/// Normalize one character.
pub fn normalize_char(ch: char) -> char {
    if is_whitespace(ch) {
        return ' ';
    }
    if let Some(plain) = fold_diacritic(ch) {
        return plain;
    }
    if let Some(plain) = fold_punctuation(ch) {
        return plain;
    }
    if let Some(&(_, plain)) = POST_DECOMPOSITION.iter().find(|(c, _)| *c == ch) {
        return plain;
    }
    if ('\u{20}'..'\u{80}').contains(&ch) {
        ch
    } else {
        SENTINEL
    }
}

/// Normalize a character slice; the result has the same length.
pub fn normalize_chars(chars: &[char]) -> Vec<char> {
    chars.iter().map(|&ch| normalize_char(ch)).collect()
}

pub fn normalize_str(text: &str) -> String {
    text.chars().map(normalize_char).collect()
}
