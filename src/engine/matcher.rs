//! Filename pattern matching: full-string regex match against a bare file name.

use regex::Regex;
use regex_syntax::ast::ErrorKind as AstErrorKind;
use regex_syntax::hir::ErrorKind as HirErrorKind;

use crate::error::{BridgeError, BridgeResult, PatternErrorKind};

/// Compiled `filename_rgx`. Matches whole names only (`a.txt` does not match `a`).
#[derive(Clone, Debug)]
pub struct PathMatcher {
    pattern: String,
    regex: Regex,
}

impl PathMatcher {
    /// Compile `pattern`. The raw pattern is parsed on its own first so that anchoring it
    /// cannot balance a stray `)` and hide a syntax error.
    pub fn compile(pattern: &str) -> BridgeResult<Self> {
        if let Err(err) = regex_syntax::Parser::new().parse(pattern) {
            return Err(pattern_error(pattern, classify_syntax_error(&err), &err));
        }
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored)
            .map_err(|err| pattern_error(pattern, classify_compile_error(&err), &err))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

fn pattern_error(
    pattern: &str,
    kind: PatternErrorKind,
    err: &dyn std::fmt::Display,
) -> BridgeError {
    // regex-syntax messages span several lines (pattern, caret, message); keep the last one.
    let rendered = err.to_string();
    let detail = rendered
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or(&rendered)
        .trim()
        .to_string();
    BridgeError::PatternCompile {
        pattern: pattern.to_string(),
        kind,
        detail,
    }
}

fn classify_syntax_error(err: &regex_syntax::Error) -> PatternErrorKind {
    match err {
        regex_syntax::Error::Parse(e) => classify_ast(e.kind()),
        regex_syntax::Error::Translate(e) => classify_hir(e.kind()),
        _ => PatternErrorKind::Other,
    }
}

fn classify_ast(kind: &AstErrorKind) -> PatternErrorKind {
    match kind {
        AstErrorKind::ClassUnclosed | AstErrorKind::ClassEscapeInvalid => PatternErrorKind::Bracket,
        AstErrorKind::ClassRangeInvalid | AstErrorKind::ClassRangeLiteral => PatternErrorKind::Range,
        AstErrorKind::UnicodeClassInvalid => PatternErrorKind::CharacterType,
        AstErrorKind::GroupUnclosed | AstErrorKind::GroupUnopened => PatternErrorKind::Paren,
        AstErrorKind::RepetitionCountUnclosed => PatternErrorKind::Brace,
        AstErrorKind::RepetitionCountInvalid
        | AstErrorKind::RepetitionCountDecimalEmpty
        | AstErrorKind::DecimalEmpty
        | AstErrorKind::DecimalInvalid => PatternErrorKind::BadBrace,
        AstErrorKind::RepetitionMissing => PatternErrorKind::BadRepeat,
        AstErrorKind::EscapeUnrecognized
        | AstErrorKind::EscapeUnexpectedEof
        | AstErrorKind::EscapeHexEmpty
        | AstErrorKind::EscapeHexInvalid
        | AstErrorKind::EscapeHexInvalidDigit => PatternErrorKind::Escape,
        AstErrorKind::UnsupportedBackreference => PatternErrorKind::Backreference,
        AstErrorKind::NestLimitExceeded(_) | AstErrorKind::CaptureLimitExceeded => {
            PatternErrorKind::Complexity
        }
        _ => PatternErrorKind::Other,
    }
}

fn classify_hir(kind: &HirErrorKind) -> PatternErrorKind {
    match kind {
        HirErrorKind::UnicodePropertyNotFound
        | HirErrorKind::UnicodePropertyValueNotFound
        | HirErrorKind::UnicodePerlClassNotFound => PatternErrorKind::CharacterType,
        HirErrorKind::UnicodeCaseUnavailable => PatternErrorKind::Collate,
        _ => PatternErrorKind::Other,
    }
}

fn classify_compile_error(err: &regex::Error) -> PatternErrorKind {
    match err {
        regex::Error::CompiledTooBig(_) => PatternErrorKind::Complexity,
        _ => PatternErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(pattern: &str) -> PatternErrorKind {
        match PathMatcher::compile(pattern) {
            Err(BridgeError::PatternCompile { kind, .. }) => kind,
            other => panic!("expected pattern error for {pattern:?}, got {other:?}"),
        }
    }

    #[test]
    fn full_match_only() {
        let m = PathMatcher::compile(r".*\.txt").unwrap();
        assert!(m.matches("a.txt"));
        assert!(!m.matches("a.txt.bak"));
        assert!(!m.matches("c.log"));

        let m = PathMatcher::compile("a").unwrap();
        assert!(m.matches("a"));
        assert!(!m.matches("ab"));
    }

    #[test]
    fn alternation_stays_anchored() {
        let m = PathMatcher::compile("a|b").unwrap();
        assert!(m.matches("a"));
        assert!(m.matches("b"));
        assert!(!m.matches("ab"));
    }

    #[test]
    fn error_classes() {
        assert_eq!(kind_of("[abc"), PatternErrorKind::Bracket);
        assert_eq!(kind_of("[z-a]"), PatternErrorKind::Range);
        assert_eq!(kind_of("(abc"), PatternErrorKind::Paren);
        assert_eq!(kind_of("abc)"), PatternErrorKind::Paren);
        assert_eq!(kind_of("a{3,1}"), PatternErrorKind::BadBrace);
        assert_eq!(kind_of("*abc"), PatternErrorKind::BadRepeat);
        assert_eq!(kind_of(r"(a)\1"), PatternErrorKind::Backreference);
        assert_eq!(kind_of(r"\p{NotAProperty}"), PatternErrorKind::CharacterType);
    }

    #[test]
    fn deep_nesting_is_complexity() {
        let pattern = format!("{}a{}", "(".repeat(300), ")".repeat(300));
        assert_eq!(kind_of(&pattern), PatternErrorKind::Complexity);
    }

    #[test]
    fn unbalanced_close_is_not_repaired_by_anchoring() {
        // "^(?:a)(b)$" would compile; the raw pattern must still be rejected.
        assert_eq!(kind_of("a)(b"), PatternErrorKind::Paren);
    }

    #[test]
    fn error_detail_is_single_line() {
        match PathMatcher::compile("[abc") {
            Err(BridgeError::PatternCompile { detail, .. }) => assert!(!detail.contains('\n')),
            other => panic!("unexpected {other:?}"),
        }
    }
}
