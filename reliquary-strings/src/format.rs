//! Placeholder substitution and fix-up application for decoded strings.
//!
//! Ground rule (from the source format this crate reinterprets): fix-ups are
//! applied to the fully substituted text, after the `%%` → `%` escape has
//! already run — never the other way around.

/// One parameter bound to a `%numN%`/`%strN%` placeholder in a call to
/// [`apply_params`].
#[derive(Debug, Clone)]
pub enum TextParam {
    /// Binds `%numN%` to an integer value.
    Num(u8, i64),
    /// Binds `%strN%` to a literal replacement string.
    StrLiteral(u8, String),
    /// Binds `%strN%` to another string, already resolved by the caller
    /// (the coded form recurses through [`crate::TextManager::get_string`]).
    StrCoded(u8, String),
}

/// A span of fixed-up text, as recorded alongside a decoded string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixupKind {
    /// Select between singular/plural forms based on a bound numeric param.
    Plural,
    /// Select a grammatical article appropriate to the following word.
    Article,
    /// An escape sequence; only the auto digit-group separator is modeled.
    Escape,
}

/// The fixup escape code for inserting digit-group separators automatically.
pub const FIXUP_ESCAPE_AUTO_DIGIT_SEPARATOR: u32 = 0x782D_2CF2;

/// A fix-up: a byte range of the literal text plus the kind of rewrite to apply.
#[derive(Debug, Clone)]
pub struct Fixup {
    /// Start offset into the literal text, in UTF-16 code units.
    pub start: usize,
    /// End offset (exclusive), in UTF-16 code units.
    pub end: usize,
    /// The kind of rewrite.
    pub kind: FixupKind,
    /// For [`FixupKind::Escape`], the escape code (see [`FIXUP_ESCAPE_AUTO_DIGIT_SEPARATOR`]).
    pub escape_code: u32,
}

/// Substitutes `%numN%`/`%strN%` placeholders in `template` with `params`,
/// then unescapes `%%` to `%`.
///
/// Coded `%strN%` substitutions are expected to already be resolved into
/// plain text by the caller (recursive string lookups happen outside this
/// pure function).
pub fn apply_params(template: &str, params: &[TextParam]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        // Find the closing '%' and the token in between.
        let rest = &template[chars.peek().map(|(i, _)| *i).unwrap_or(template.len())..];
        if let Some(end) = rest.find('%') {
            let token = &rest[..end];
            if token.is_empty() {
                // "%%" escape.
                out.push('%');
                for _ in 0..end + 1 {
                    chars.next();
                }
                continue;
            }
            if let Some(replacement) = resolve_token(token, params) {
                out.push_str(&replacement);
                for _ in 0..end + 1 {
                    chars.next();
                }
                continue;
            }
        }

        // Not a recognized placeholder; keep the literal '%'.
        out.push('%');
    }

    out
}

fn resolve_token(token: &str, params: &[TextParam]) -> Option<String> {
    let (prefix, index) = split_trailing_digit(token)?;
    match prefix {
        "num" => params.iter().find_map(|p| match p {
            TextParam::Num(n, value) if *n == index => Some(value.to_string()),
            _ => None,
        }),
        "str" => params.iter().find_map(|p| match p {
            TextParam::StrLiteral(n, value) if *n == index => Some(value.clone()),
            TextParam::StrCoded(n, value) if *n == index => Some(value.clone()),
            _ => None,
        }),
        _ => None,
    }
}

fn split_trailing_digit(token: &str) -> Option<(&str, u8)> {
    let digit_start = token.find(|c: char| c.is_ascii_digit())?;
    let (prefix, digits) = token.split_at(digit_start);
    digits.parse::<u8>().ok().map(|n| (prefix, n))
}

/// Applies fix-up spans to already-substituted text.
///
/// Unrecognized fixups (an article/plural fixup with no matching bound
/// parameter) pass the span through unchanged rather than erroring — a
/// missing grammatical hint should never make a string unrenderable.
pub fn apply_fixups(text: &str, fixups: &[Fixup], plural_count: Option<i64>) -> String {
    if fixups.is_empty() {
        return text.to_owned();
    }

    let units: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut fixups = fixups.to_vec();
    fixups.sort_by_key(|f| f.start);

    for fixup in &fixups {
        if fixup.start > units.len() || fixup.start < i {
            continue;
        }
        out.extend(&units[i..fixup.start.min(units.len())]);
        let end = fixup.end.min(units.len()).max(fixup.start);
        let span: String = units[fixup.start..end].iter().collect();

        match fixup.kind {
            FixupKind::Escape if fixup.escape_code == FIXUP_ESCAPE_AUTO_DIGIT_SEPARATOR => {
                out.push_str(&insert_digit_separators(&span));
            }
            FixupKind::Plural => {
                // Naive heuristic: a trailing 's' form is used unless count == 1.
                if plural_count == Some(1) {
                    out.push_str(span.trim_end_matches('s'));
                } else {
                    out.push_str(&span);
                }
            }
            FixupKind::Article | FixupKind::Escape => {
                out.push_str(&span);
            }
        }
        i = end;
    }
    out.extend(&units[i..]);
    out
}

fn insert_digit_separators(digits: &str) -> String {
    let bytes: Vec<char> = digits.chars().collect();
    let mut out = String::new();
    for (idx, c) in bytes.iter().enumerate() {
        if idx > 0 && (bytes.len() - idx) % 3 == 0 && c.is_ascii_digit() {
            out.push(',');
        }
        out.push(*c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_params_num_and_str() {
        let out = apply_params(
            "You have %num1% of %str1%.",
            &[
                TextParam::Num(1, 3),
                TextParam::StrCoded(1, "coins".to_owned()),
            ],
        );
        assert_eq!(out, "You have 3 of coins.");
    }

    #[test]
    fn test_apply_params_missing_leaves_placeholder() {
        let out = apply_params("%str1%", &[]);
        assert_eq!(out, "%str1%");
    }

    #[test]
    fn test_escape_percent() {
        let out = apply_params("100%% done", &[]);
        assert_eq!(out, "100% done");
    }

    #[test]
    fn test_digit_separator_fixup() {
        let fixup = Fixup {
            start: 0,
            end: 7,
            kind: FixupKind::Escape,
            escape_code: FIXUP_ESCAPE_AUTO_DIGIT_SEPARATOR,
        };
        let out = apply_fixups("1234567", &[fixup], None);
        assert_eq!(out, "1,234,567");
    }
}
