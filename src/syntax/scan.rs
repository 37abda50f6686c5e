//! Quote-aware line tokenizer
//!
//! Scans a task line's content left to right in a single pass, splitting
//! on whitespace and commas outside quotes. Three quote dialects (double
//! quote, single quote, backtick) open a region in which splitting is
//! suspended. A backslash suppresses any special meaning of the following
//! character, inside or outside quotes. The scan never backtracks.

/// Quote dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    Double,
    Single,
    Backtick,
}

impl QuoteKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '"' => Some(QuoteKind::Double),
            '\'' => Some(QuoteKind::Single),
            '`' => Some(QuoteKind::Backtick),
            _ => None,
        }
    }

    pub fn char(self) -> char {
        match self {
            QuoteKind::Double => '"',
            QuoteKind::Single => '\'',
            QuoteKind::Backtick => '`',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuoteKind::Double => "double quote",
            QuoteKind::Single => "single quote",
            QuoteKind::Backtick => "backtick",
        }
    }
}

/// One scanned token with its decoded text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Decoded text: quote characters removed, escapes resolved
    pub text: String,
    /// Set when the token began with a quote character
    pub quoted: Option<QuoteKind>,
    /// Byte offset of the token's first character in the scanned text
    pub offset: usize,
}

impl Token {
    /// True for a plain word token (no quoting involved)
    pub fn is_bare(&self) -> bool {
        self.quoted.is_none()
    }
}

/// A quote region still open at end of content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnclosedQuote {
    pub kind: QuoteKind,
    /// Byte offset of the opening quote character
    pub offset: usize,
}

/// True for tokens legal in the leading prefix run: completion and skip
/// markers, priority letters, `@stakeholder` and `#tag`
pub(crate) fn is_prefix_token(tok: &Token) -> bool {
    if !tok.is_bare() {
        return false;
    }
    let t = tok.text.as_str();
    matches!(t, "x" | "[x]" | "-" | "[-]" | "[_]")
        || crate::domain::PRIORITIES.contains(&t)
        || (t.len() > 1 && (t.starts_with('@') || t.starts_with('#')))
}

/// Splits a bare token of the form `key:` or `key:value`
pub(crate) fn split_pair(text: &str) -> Option<(&str, Option<&str>)> {
    let colon = text.find(':')?;
    let key = &text[..colon];
    if !super::is_key(key) {
        return None;
    }
    let rest = &text[colon + 1..];
    Some((key, if rest.is_empty() { None } else { Some(rest) }))
}

/// Splits content into tokens. Returns the tokens and, when a quote
/// region was still open at end of content, its opening position. The
/// tokens are complete either way: a lenient caller can treat the end of
/// the line as an implicit close.
pub fn scan_tokens(content: &str) -> (Vec<Token>, Option<UnclosedQuote>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut text = String::new();
    let mut token_start = 0usize;
    let mut in_token = false;
    let mut token_quote: Option<QuoteKind> = None;
    let mut open: Option<(QuoteKind, usize)> = None;
    let mut escape = false;

    for (i, c) in content.char_indices() {
        if escape {
            escape = false;
            if !in_token {
                in_token = true;
                token_start = i.saturating_sub(1);
            }
            text.push(c);
            continue;
        }
        if c == '\\' {
            escape = true;
            continue;
        }
        if let Some((kind, _)) = open {
            if c == kind.char() {
                open = None;
            } else {
                text.push(c);
            }
            continue;
        }
        if let Some(kind) = QuoteKind::from_char(c) {
            if !in_token {
                in_token = true;
                token_start = i;
                token_quote = Some(kind);
            }
            open = Some((kind, i));
            continue;
        }
        if c == ' ' || c == '\t' || c == ',' {
            if in_token {
                tokens.push(Token {
                    text: std::mem::take(&mut text),
                    quoted: token_quote,
                    offset: token_start,
                });
                in_token = false;
                token_quote = None;
            }
            continue;
        }
        if !in_token {
            in_token = true;
            token_start = i;
        }
        text.push(c);
    }

    if in_token {
        tokens.push(Token {
            text,
            quoted: token_quote,
            offset: token_start,
        });
    }

    let unclosed = open.map(|(kind, offset)| UnclosedQuote { kind, offset });
    (tokens, unclosed)
}
