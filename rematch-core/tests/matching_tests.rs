//! Table-driven matching tests
//!
//! Every case runs through the public API and through each executor that
//! can take it, so all executors are held to the same answers.

use rematch_core::{ErrorCode, Flags, Regex, Strategy};

/// Capture slots written with -1 for groups that did not participate.
fn slots(raw: &[i64]) -> Vec<Option<usize>> {
    raw.iter()
        .map(|&v| if v < 0 { None } else { Some(v as usize) })
        .collect()
}

const STRATEGIES: [Strategy; 3] = [Strategy::OnePass, Strategy::Backtrack, Strategy::Nfa];

/// (pattern, input, leftmost-first match with all capture slots)
const FIRST_MATCH: &[(&str, &str, Option<&[i64]>)] = &[
    ("", "", Some(&[0, 0])),
    ("^abcdefg", "abcdefg", Some(&[0, 7])),
    ("a+", "baaab", Some(&[1, 4])),
    ("abcd..", "abcdef", Some(&[0, 6])),
    ("x", "y", None),
    ("b", "abc", Some(&[1, 2])),
    (".*", "abcdef", Some(&[0, 6])),
    ("^", "abcde", Some(&[0, 0])),
    ("$", "abcde", Some(&[5, 5])),
    ("^abcd$", "abcd", Some(&[0, 4])),
    ("^abcd$", "abcde", None),
    ("a*", "baaab", Some(&[0, 0])),
    ("[a-z]+", "abcd", Some(&[0, 4])),
    ("[^a-z]+", "ab1234cd", Some(&[2, 6])),
    (r"[a\-\]z]+", "az]-bcz", Some(&[0, 4])),
    (r"[^\n]+", "abcd\n", Some(&[0, 4])),
    ("[日本語]+", "日本語日本語", Some(&[0, 18])),
    ("日本語+", "日本語語語語", Some(&[0, 18])),
    ("()", "", Some(&[0, 0, 0, 0])),
    ("(a)", "a", Some(&[0, 1, 0, 1])),
    ("(.)(.)", "日a", Some(&[0, 4, 0, 3, 3, 4])),
    ("(.*)", "", Some(&[0, 0, 0, 0])),
    ("(.*)", "abcd", Some(&[0, 4, 0, 4])),
    ("(..)(..)", "abcd", Some(&[0, 4, 0, 2, 2, 4])),
    ("(([^xyz]*)(d))", "abcd", Some(&[0, 4, 0, 4, 0, 3, 3, 4])),
    ("((a|b|c)*(d))", "abcd", Some(&[0, 4, 0, 4, 2, 3, 3, 4])),
    ("(((a|b|c)*)(d))", "abcd", Some(&[0, 4, 0, 4, 0, 3, 2, 3, 3, 4])),
    (r"\a\f\n\r\t\v", "\x07\x0C\n\r\t\x0B", Some(&[0, 6])),
    (r"[\a\f\n\r\t\v]+", "\x07\x0C\n\r\t\x0B", Some(&[0, 6])),
    ("a*(|(b))c*", "abc", Some(&[0, 3, 1, 1, -1, -1])),
    ("(.*).*", "ab", Some(&[0, 2, 0, 2])),
    ("[.]", ".", Some(&[0, 1])),
    ("/$", "/abc/", Some(&[4, 5])),
    ("/$", "/abc", None),
    ("ab$", "cab", Some(&[1, 3])),
    ("axxb$", "axxcb", None),
    ("data", "daXY data", Some(&[5, 9])),
    ("da(.)a$", "daXY data", Some(&[5, 9, 7, 8])),
    ("zx+", "zzx", Some(&[1, 3])),
    ("ab$", "abcab", Some(&[3, 5])),
    ("(aa)*$", "a", Some(&[1, 1, -1, -1])),
    ("(?:.|(?:.a))", "", None),
    ("(?:A(?:A|a))", "Aa", Some(&[0, 2])),
    ("(?:A|(?:A|a))", "a", Some(&[0, 1])),
    ("(a){0}", "", Some(&[0, 0, -1, -1])),
    ("(?-s)(?:(?:^).)", "\n", None),
    ("(?s)(?:(?:^).)", "\n", Some(&[0, 1])),
    ("(?:(?:^).)", "\n", None),
    (r"[^\S\s]", "abcd", None),
    (r"[^\S[:space:]]", "abcd", None),
    (r"[^\D\d]", "abcd", None),
    (r"(?i)\W", "k", None),
    // Leftmost-first, not leftmost-longest.
    ("a|ab", "ab", Some(&[0, 1])),
    ("(a|ab)(c|bcd)", "abcd", Some(&[0, 4, 0, 1, 1, 4])),
    // Greedy and lazy repetition.
    ("(a+)(a*)", "aaa", Some(&[0, 3, 0, 3, 3, 3])),
    ("(a+?)(a*)", "aaa", Some(&[0, 3, 0, 1, 1, 3])),
    ("(?U)(a+)(a*)", "aaa", Some(&[0, 1, 0, 1, 1, 1])),
    ("(a{2,3}?)", "aaaa", Some(&[0, 2, 0, 2])),
    // A group reports its last iteration.
    ("(a|b)*", "ab", Some(&[0, 2, 1, 2])),
    ("(?:(a)|b)+", "ab", Some(&[0, 2, 0, 1])),
    // Case folding.
    ("(?i)straße", "STRAßE", Some(&[0, 7])),
    ("(?i)k", "\u{212A}", Some(&[0, 3])),
    // Multi-line anchors.
    ("(?m)^b$", "a\nb\nc", Some(&[2, 3])),
    ("^b$", "a\nb\nc", None),
];

/// (pattern, input, every non-overlapping match)
const ALL_MATCHES: &[(&str, &str, &[&[i64]])] = &[
    (".", "abc", &[&[0, 1], &[1, 2], &[2, 3]]),
    ("(.)", "abc", &[&[0, 1, 0, 1], &[1, 2, 1, 2], &[2, 3, 2, 3]]),
    (".(.)", "abcd", &[&[0, 2, 1, 2], &[2, 4, 3, 4]]),
    ("ab*", "abbaab", &[&[0, 3], &[3, 4], &[4, 6]]),
    ("a(b*)", "abbaab", &[&[0, 3, 1, 3], &[3, 4, 4, 4], &[4, 6, 5, 6]]),
    (r"\b", "x", &[&[0, 0], &[1, 1]]),
    (r"\b", "xx", &[&[0, 0], &[2, 2]]),
    (r"\b", "x y", &[&[0, 0], &[1, 1], &[2, 2], &[3, 3]]),
    (r"\b", "xx yy", &[&[0, 0], &[2, 2], &[3, 3], &[5, 5]]),
    (r"\B", "x", &[]),
    (r"\B", "xx", &[&[1, 1]]),
    (r"\B", "x y", &[]),
    (r"\B", "xx yy", &[&[1, 1], &[4, 4]]),
    ("(|a)*", "aa", &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[2, 2, 2, 2]]),
    ("(|a)+", "aa", &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[2, 2, 2, 2]]),
    ("a*", "baaab", &[&[0, 0], &[1, 4], &[5, 5]]),
];

#[test]
fn test_first_match() {
    for &(pattern, input, expected) in FIRST_MATCH {
        let re = Regex::new(pattern).unwrap();
        let expected = expected.map(slots);
        assert_eq!(
            re.find_submatch_index(input),
            expected,
            "pattern {pattern:?} on {input:?}"
        );
        for strategy in STRATEGIES {
            assert_eq!(
                re.search_with(strategy, input, 0),
                expected,
                "pattern {pattern:?} on {input:?} with {strategy}"
            );
        }
        let span = expected.map(|s| (s[0], s[1]));
        assert_eq!(
            re.find(input).map(|m| (Some(m.start), Some(m.end))),
            span,
            "pattern {pattern:?} on {input:?}"
        );
        assert_eq!(re.is_match(input), span.is_some(), "pattern {pattern:?}");
    }
}

#[test]
fn test_all_matches() {
    for &(pattern, input, expected) in ALL_MATCHES {
        let re = Regex::new(pattern).unwrap();
        let expected: Vec<_> = expected.iter().map(|m| slots(m)).collect();
        assert_eq!(
            re.find_all_submatch_index(input, None),
            expected,
            "pattern {pattern:?} on {input:?}"
        );
        let spans: Vec<_> = re
            .find_all(input, None)
            .iter()
            .map(|m| vec![Some(m.start), Some(m.end)])
            .collect();
        let expected_spans: Vec<_> = expected.iter().map(|m| m[..2].to_vec()).collect();
        assert_eq!(spans, expected_spans, "pattern {pattern:?} on {input:?}");
    }
}

#[test]
fn test_all_matches_limit() {
    let re = Regex::new("a").unwrap();
    assert_eq!(re.find_all("aaaa", Some(3)).len(), 3);
    assert_eq!(re.find_all("aaaa", Some(9)).len(), 4);
    assert!(re.find_all("aaaa", Some(0)).is_empty());
    assert!(re.find_all_submatch_index("bbb", None).is_empty());
}

#[test]
fn test_dot_newline_flag() {
    let plain = Regex::new("a.b").unwrap();
    assert!(!plain.is_match("a\nb"));
    let dot_nl = Regex::with_flags("a.b", Flags::PERL | Flags::DOT_NL).unwrap();
    assert!(dot_nl.is_match("a\nb"));
    // Negated classes match newline regardless.
    assert!(Regex::new("a[^x]b").unwrap().is_match("a\nb"));
}

#[test]
fn test_literal_flag() {
    let re = Regex::with_flags("a.b*", Flags::PERL | Flags::LITERAL).unwrap();
    assert_eq!(re.find("xxa.b*").map(|m| m.range()), Some(2..6));
    assert!(!re.is_match("aXbbb"));
}

#[test]
fn test_no_match_is_consistent() {
    for (pattern, input) in [("x+", "abc"), ("^b", "ab"), ("a$", "ab"), ("[^\\x00-\\x{10FFFF}]", "abc")] {
        let re = Regex::new(pattern).unwrap();
        assert_eq!(re.find(input), None);
        assert_eq!(re.find_submatch_index(input), None);
        assert!(re.captures(input).is_none());
        assert!(re.find_all(input, None).is_empty());
        assert!(re.find_all_submatch_index(input, None).is_empty());
        assert_eq!(re.replace_all(input, "X"), input);
    }

    // Anchored at both ends, so the one-pass executor is the default.
    let re = Regex::new("^(a)(b)$").unwrap();
    assert!(re.is_onepass());
    for input in ["ax", "", "abb", "xab"] {
        for strategy in [Strategy::OnePass, Strategy::Backtrack, Strategy::Nfa] {
            assert!(re.supports(strategy, input.len()));
            assert_eq!(re.search_with(strategy, input, 0), None, "{input:?} with {strategy}");
        }
        assert_eq!(re.find_submatch_index(input), None);
        assert!(re.find_all_submatch_index(input, None).is_empty());
        assert!(re.find_all(input, None).is_empty());
    }
}

#[test]
fn test_replace_all() {
    let cases = [
        ("a(x*)b", "-ab-axxb-", "T", "-T-T-"),
        ("a(x*)b", "-ab-axxb-", "$1", "--xx-"),
        ("a(x*)b", "-ab-axxb-", "$1W", "---"),
        ("a(x*)b", "-ab-axxb-", "${1}W", "-W-xxW-"),
        ("a(?P<x>x*)b", "-ab-axxb-", "${x}W", "-W-xxW-"),
        ("a(x*)b", "-ab-axxb-", "$$", "-$-$-"),
        ("a(x*)b", "-ab-axxb-", "$", "-$-$-"),
        ("a*", "baaab", "X", "XbXbX"),
        ("", "abc", "-", "-a-b-c-"),
        ("b*", "abc", "X", "XaXcX"),
        ("(a)|b", "ab", "[$1]", "[a][]"),
    ];
    for (pattern, input, template, expected) in cases {
        let re = Regex::new(pattern).unwrap();
        assert_eq!(
            re.replace_all(input, template),
            expected,
            "{pattern:?} on {input:?} with {template:?}"
        );
    }
}

#[test]
fn test_adversarial_patterns() {
    let deep = format!("{}a{}", "(".repeat(2000), ")".repeat(2000));
    assert_eq!(Regex::new(&deep).unwrap_err().code, ErrorCode::NestingDepth);

    let big = "x{1000}".repeat(3400);
    assert_eq!(Regex::new(&big).unwrap_err().code, ErrorCode::Large);

    let nested = "((((((((((a{2}){2}){2}){2}){2}){2}){2}){2}){2}){2}){2}";
    assert_eq!(Regex::new(nested).unwrap_err().code, ErrorCode::InvalidRepeatSize);
}

/// Compile and run `pattern` on a thread with a small stack.
fn compile_on_small_stack(pattern: String, input: &'static str) -> Option<(usize, usize)> {
    std::thread::Builder::new()
        .stack_size(2 << 20)
        .spawn(move || {
            let re = Regex::new(&pattern).unwrap();
            re.find(input).map(|m| (m.start, m.end))
        })
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn test_long_repeat_chains() {
    assert_eq!(compile_on_small_stack("a{0,1000}".to_string(), "aaab"), Some((0, 3)));
    assert_eq!(compile_on_small_stack("x{2,1000}?".to_string(), "xxxx"), Some((0, 2)));

    let nested = format!("{}a{{0,1000}}{}", "(".repeat(998), ")".repeat(998));
    assert_eq!(compile_on_small_stack(nested, "baa"), Some((0, 0)));

    let nested = format!("{}(?:ab){{1,1000}}{}", "(?:".repeat(990), ")".repeat(990));
    assert_eq!(compile_on_small_stack(nested, "xabab"), Some((1, 5)));
}

#[test]
fn test_folded_literal_text() {
    let flags = Flags::PERL | Flags::LITERAL | Flags::FOLD_CASE;
    for (pattern, input, expected) in [
        ("ſ", "s", Some((0, 1))),
        ("S", "ſ", Some((0, 2))),
        ("\u{212A}", "k", Some((0, 1))),
        ("K", "x\u{212A}", Some((1, 4))),
        ("a.ſ", "A.s", Some((0, 3))),
        ("a.ſ", "Axs", None),
    ] {
        let re = Regex::with_flags(pattern, flags).unwrap();
        assert_eq!(re.is_match(input), expected.is_some(), "{pattern:?} in {input:?}");
        assert_eq!(re.find(input).map(|m| (m.start, m.end)), expected, "{pattern:?} in {input:?}");
        for strategy in [Strategy::Backtrack, Strategy::Nfa] {
            assert_eq!(
                re.search_with(strategy, input, 0),
                expected.map(|(s, e)| vec![Some(s), Some(e)]),
                "{pattern:?} in {input:?} with {strategy}"
            );
        }
    }
}

#[test]
fn test_adversarial_inputs() {
    let text = "a".repeat(20_000);
    for pattern in ["(a*)*b", "(a|aa)*c", "(x+x+)+y", "(?:a?){30}a{30}b"] {
        let re = Regex::new(pattern).unwrap();
        assert!(!re.is_match(&text), "pattern {pattern}");
    }
    let re = Regex::new("(a+)+$").unwrap();
    assert_eq!(re.find(&text).map(|m| m.len()), Some(20_000));
}

#[test]
fn test_errors() {
    let cases = [
        ("a**", ErrorCode::InvalidRepeatOp),
        ("(abc", ErrorCode::MissingParen),
        ("abc)", ErrorCode::UnexpectedParen),
        ("[a", ErrorCode::MissingBracket),
        ("[z-a]", ErrorCode::InvalidCharRange),
        (r"a\", ErrorCode::TrailingBackslash),
        (r"\q", ErrorCode::InvalidEscape),
        ("*", ErrorCode::MissingRepeatArgument),
        ("a{1001}", ErrorCode::InvalidRepeatSize),
        ("(?P<n!>a)", ErrorCode::InvalidNamedCapture),
        ("(?z)", ErrorCode::InvalidPerlOp),
        ("[[:foo:]]", ErrorCode::InvalidCharRange),
    ];
    for (pattern, code) in cases {
        let err = Regex::new(pattern).unwrap_err();
        assert_eq!(err.code, code, "pattern {pattern:?}");
        assert!(err.to_string().starts_with("error parsing regexp: "));
    }
}
