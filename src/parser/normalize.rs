//! Source normalizer
//!
//! Best-effort textual cleanup run before function extraction: comments are
//! removed, and so are cast-like `(UPPERCASE)` groups, except `(TRUE)` which
//! is the loop-condition literal. Never fails; when nothing matches the input
//! is returned borrowed and unchanged.
//!
//! Block comments are replaced by the newlines they contained so that line
//! numbers in later diagnostics still point into the user's text. Neither
//! pass knows about character literals.

use crate::interpreter::constants::TRUE_LITERAL;
use std::borrow::Cow;

/// Strip comments and upper-case casts from raw source text.
pub fn normalize(source: &str) -> Cow<'_, str> {
    let without_comments = strip_comments(source);
    let without_casts = match strip_casts(&without_comments) {
        Cow::Owned(text) => Some(text),
        Cow::Borrowed(_) => None,
    };

    match without_casts {
        Some(text) => Cow::Owned(text),
        None => without_comments,
    }
}

/// Remove `// ...` (up to, not including, the newline) and `/* ... */`.
/// An unterminated block comment is left in place.
pub fn strip_comments(source: &str) -> Cow<'_, str> {
    if !source.contains("//") && !source.contains("/*") {
        return Cow::Borrowed(source);
    }

    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find('/') {
        let (before, from_slash) = rest.split_at(start);
        out.push_str(before);

        if from_slash.starts_with("//") {
            let end = from_slash.find('\n').unwrap_or(from_slash.len());
            rest = &from_slash[end..];
        } else if from_slash.starts_with("/*") {
            match from_slash[2..].find("*/") {
                Some(close) => {
                    let comment = &from_slash[..close + 4];
                    out.extend(comment.chars().filter(|c| *c == '\n'));
                    rest = &from_slash[close + 4..];
                }
                None => {
                    out.push_str(from_slash);
                    rest = "";
                }
            }
        } else {
            out.push('/');
            rest = &from_slash[1..];
        }
    }
    out.push_str(rest);

    if out == source {
        Cow::Borrowed(source)
    } else {
        Cow::Owned(out)
    }
}

/// Remove every `(` + one or more `A`-`Z` + `)` group other than `(TRUE)`.
pub fn strip_casts(source: &str) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut copied_to = 0;
    let bytes = source.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'(' {
            let word_len = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_uppercase())
                .count();
            let close = i + 1 + word_len;
            if word_len > 0 && bytes.get(close) == Some(&b')') {
                let word = &source[i + 1..close];
                if word != TRUE_LITERAL {
                    let buf = out.get_or_insert_with(|| String::with_capacity(source.len()));
                    buf.push_str(&source[copied_to..i]);
                    copied_to = close + 1;
                    i = close + 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&source[copied_to..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_source_is_borrowed() {
        let source = "void user_main(void) { motor(1, 2); }";
        assert!(matches!(normalize(source), Cow::Borrowed(s) if s == source));
    }

    #[test]
    fn test_line_comment_keeps_newline() {
        assert_eq!(normalize("a = 1; // set a\nb = 2;"), "a = 1; \nb = 2;");
    }

    #[test]
    fn test_block_comment_keeps_line_count() {
        let out = normalize("a /* one\ntwo\n*/ b");
        assert_eq!(out, "a \n\n b");
    }

    #[test]
    fn test_division_is_not_a_comment() {
        assert_eq!(normalize("x = a / b;"), "x = a / b;");
    }

    #[test]
    fn test_uppercase_cast_removed() {
        assert_eq!(normalize("x = (BYTE)y + (WORD)z;"), "x = y + z;");
    }

    #[test]
    fn test_true_literal_survives() {
        let source = "while (TRUE) { x = (INT)y; }";
        assert_eq!(normalize(source), "while (TRUE) { x = y; }");
    }

    #[test]
    fn test_mixed_case_and_digits_are_not_casts() {
        let source = "x = (Foo) + (CN2) + (VAR_A);";
        assert_eq!(normalize(source), source);
    }

    #[test]
    fn test_unterminated_block_comment_left_in_place() {
        assert_eq!(normalize("a; /* open"), "a; /* open");
    }
}
