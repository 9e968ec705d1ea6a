//! Unicode classification service
//!
//! The engine needs a few facts about code points: whether a character is
//! a word character or a letter or digit, which characters share a simple
//! case-folding orbit, and the members of a named Unicode class. The
//! tables come from `regex-syntax`; this module only adapts them.

use lazy_static::lazy_static;
use regex_syntax::hir::{Class, ClassUnicode, ClassUnicodeRange, HirKind};

use crate::class;

/// Smallest code point that takes part in simple case folding.
const MIN_FOLD: char = '\u{0041}';
/// Largest code point that takes part in simple case folding.
const MAX_FOLD: char = '\u{1E943}';

/// Reports whether `c` is an ASCII word character `[0-9A-Za-z_]`.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// General categories accepted in `\p{..}`.
const CATEGORIES: &[&str] = &[
    "C", "Cc", "Cf", "Co", "Cs", "L", "Ll", "Lm", "Lo", "Lt", "Lu", "M", "Mc", "Me", "Mn", "N",
    "Nd", "Nl", "No", "P", "Pc", "Pd", "Pe", "Pf", "Pi", "Po", "Ps", "S", "Sc", "Sk", "Sm", "So",
    "Z", "Zl", "Zp", "Zs",
];

/// Scripts accepted in `\p{..}`, spelled exactly as written there.
const SCRIPTS: &[&str] = &[
    "Adlam", "Ahom", "Anatolian_Hieroglyphs", "Arabic", "Armenian", "Avestan", "Balinese",
    "Bamum", "Bassa_Vah", "Batak", "Bengali", "Bhaiksuki", "Bopomofo", "Brahmi", "Braille",
    "Buginese", "Buhid", "Canadian_Aboriginal", "Carian", "Caucasian_Albanian", "Chakma", "Cham",
    "Cherokee", "Chorasmian", "Common", "Coptic", "Cuneiform", "Cypriot", "Cypro_Minoan",
    "Cyrillic", "Deseret", "Devanagari", "Dives_Akuru", "Dogra", "Duployan",
    "Egyptian_Hieroglyphs", "Elbasan", "Elymaic", "Ethiopic", "Georgian", "Glagolitic", "Gothic",
    "Grantha", "Greek", "Gujarati", "Gunjala_Gondi", "Gurmukhi", "Han", "Hangul",
    "Hanifi_Rohingya", "Hanunoo", "Hatran", "Hebrew", "Hiragana", "Imperial_Aramaic",
    "Inherited", "Inscriptional_Pahlavi", "Inscriptional_Parthian", "Javanese", "Kaithi",
    "Kannada", "Katakana", "Kawi", "Kayah_Li", "Kharoshthi", "Khitan_Small_Script", "Khmer",
    "Khojki", "Khudawadi", "Lao", "Latin", "Lepcha", "Limbu", "Linear_A", "Linear_B", "Lisu",
    "Lycian", "Lydian", "Mahajani", "Makasar", "Malayalam", "Mandaic", "Manichaean", "Marchen",
    "Masaram_Gondi", "Medefaidrin", "Meetei_Mayek", "Mende_Kikakui", "Meroitic_Cursive",
    "Meroitic_Hieroglyphs", "Miao", "Modi", "Mongolian", "Mro", "Multani", "Myanmar",
    "Nabataean", "Nag_Mundari", "Nandinagari", "New_Tai_Lue", "Newa", "Nko", "Nushu",
    "Nyiakeng_Puachue_Hmong", "Ogham", "Ol_Chiki", "Old_Hungarian", "Old_Italic",
    "Old_North_Arabian", "Old_Permic", "Old_Persian", "Old_Sogdian", "Old_South_Arabian",
    "Old_Turkic", "Old_Uyghur", "Oriya", "Osage", "Osmanya", "Pahawh_Hmong", "Palmyrene",
    "Pau_Cin_Hau", "Phags_Pa", "Phoenician", "Psalter_Pahlavi", "Rejang", "Runic", "Samaritan",
    "Saurashtra", "Sharada", "Shavian", "Siddham", "SignWriting", "Sinhala", "Sogdian",
    "Sora_Sompeng", "Soyombo", "Sundanese", "Syloti_Nagri", "Syriac", "Tagalog", "Tagbanwa",
    "Tai_Le", "Tai_Tham", "Tai_Viet", "Takri", "Tamil", "Tangsa", "Tangut", "Telugu", "Thaana",
    "Thai", "Tibetan", "Tifinagh", "Tirhuta", "Toto", "Ugaritic", "Vai", "Vithkuqi", "Wancho",
    "Warang_Citi", "Yezidi", "Yi", "Zanabazar_Square",
];

lazy_static! {
    /// Letters (`L`) and decimal digits (`Nd`), sorted.
    static ref LETTERS_AND_DIGITS: Vec<(char, char)> = {
        let mut ranges = lookup("L").unwrap_or_default();
        ranges.extend(lookup("Nd").unwrap_or_default());
        ranges.sort_unstable();
        ranges
    };
}

/// Reports whether `c` is a Unicode letter or decimal digit.
pub fn is_letter_or_digit(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphanumeric();
    }
    class::contains(&LETTERS_AND_DIGITS, c)
}

/// Returns the ranges plus every character that folds to a member of them.
///
/// The result is not sorted or merged.
pub fn fold_ranges(ranges: &[(char, char)]) -> Vec<(char, char)> {
    let mut class = ClassUnicode::new(
        ranges
            .iter()
            .map(|&(lo, hi)| ClassUnicodeRange::new(lo, hi)),
    );
    if class.try_case_fold_simple().is_err() {
        // Tables unavailable: folding degrades to exact matching.
        return ranges.to_vec();
    }
    class.iter().map(|r| (r.start(), r.end())).collect()
}

/// Returns the simple case-folding orbit of `c` in ascending order.
///
/// The orbit always contains `c` itself.
pub fn fold_orbit(c: char) -> Vec<char> {
    if !(MIN_FOLD..=MAX_FOLD).contains(&c) {
        return vec![c];
    }
    let mut orbit: Vec<char> = fold_ranges(&[(c, c)])
        .into_iter()
        .flat_map(|(lo, hi)| lo..=hi)
        .collect();
    orbit.sort_unstable();
    orbit.dedup();
    orbit
}

/// Returns the next character after `c` in its folding orbit, wrapping
/// around to the smallest member. Characters without case return themselves.
pub fn simple_fold(c: char) -> char {
    let orbit = fold_orbit(c);
    orbit
        .iter()
        .copied()
        .find(|&r| r > c)
        .unwrap_or(orbit[0])
}

/// Returns the smallest character fold-equivalent to `c`.
pub fn min_fold(c: char) -> char {
    fold_orbit(c)[0]
}

/// Looks up a named Unicode class such as `L`, `Lu` or `Greek`.
///
/// Names must be spelled exactly; `greek` or `Gr_eek` are unknown.
/// Returns `None` when the name is unknown.
pub fn table(name: &str) -> Option<Vec<(char, char)>> {
    if name == "Any" {
        return Some(vec![('\0', char::MAX)]);
    }
    if name == "C" {
        // Other, without the unassigned code points.
        let ranges = ["Cc", "Cf", "Co", "Cs"]
            .into_iter()
            .filter_map(lookup)
            .flatten()
            .collect();
        return Some(ranges);
    }
    if !CATEGORIES.contains(&name) && !SCRIPTS.contains(&name) {
        return None;
    }
    Some(lookup(name).unwrap_or_default())
}

/// Fetches a class from the `regex-syntax` tables.
fn lookup(name: &str) -> Option<Vec<(char, char)>> {
    let hir = regex_syntax::Parser::new()
        .parse(&format!(r"\p{{{name}}}"))
        .ok()?;
    match hir.kind() {
        HirKind::Class(Class::Unicode(class)) => {
            Some(class.iter().map(|r| (r.start(), r.end())).collect())
        }
        HirKind::Literal(lit) => {
            let text = std::str::from_utf8(&lit.0).ok()?;
            Some(text.chars().map(|c| (c, c)).collect())
        }
        _ => None,
    }
}
