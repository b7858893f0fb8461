//! A small SQL lexer, just enough to tell keywords from literals, quoted
//! identifiers and comments.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// Bare identifier or keyword.
    Word,
    /// `"name"`, `` `name` `` or `[name]`.
    QuotedIdent,
    /// `'text'`, with `''` as the escaped quote.
    StringLit,
    Number,
    Semicolon,
    /// Any other single character: operators, parens, commas, parameters.
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub(crate) kind: TokenKind,
    pub(crate) text: &'a str,
    /// Byte offsets into the source statement.
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Token<'_> {
    pub(crate) fn is_word(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    pub(crate) fn is_symbol(&self, symbol: char) -> bool {
        self.kind == TokenKind::Symbol && self.text.len() == symbol.len_utf8() && self.text.starts_with(symbol)
    }

    /// Identifier text with any quoting removed.
    pub(crate) fn identifier(&self) -> Option<String> {
        match self.kind {
            TokenKind::Word => Some(self.text.to_string()),
            TokenKind::QuotedIdent => {
                let inner = &self.text[1..self.text.len() - 1];
                Some(match self.text.as_bytes()[0] {
                    b'"' => inner.replace("\"\"", "\""),
                    b'`' => inner.replace("``", "`"),
                    _ => inner.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Why lexing stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexError {
    pub(crate) message: String,
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

pub(crate) fn lex(sql: &str) -> Result<Vec<Token<'_>>, LexError> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut chars = sql.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        // Comments.
        if c == '-' && bytes.get(start + 1) == Some(&b'-') {
            for (_, c) in chars.by_ref() {
                if c == '\n' {
                    break;
                }
            }
            continue;
        }
        if c == '/' && bytes.get(start + 1) == Some(&b'*') {
            chars.next();
            let mut closed = false;
            while let Some((i, c)) = chars.next() {
                if c == '*' && bytes.get(i + 1) == Some(&b'/') {
                    chars.next();
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(LexError {
                    message: format!("unterminated block comment starting at offset {start}"),
                });
            }
            continue;
        }

        let (kind, end) = match c {
            '\'' | '"' | '`' => {
                let end = scan_quoted(&mut chars, c).ok_or_else(|| LexError {
                    message: format!("unterminated quoted text starting at offset {start}"),
                })?;
                let kind = if c == '\'' {
                    TokenKind::StringLit
                } else {
                    TokenKind::QuotedIdent
                };
                (kind, end)
            }
            '[' => {
                let end = chars
                    .by_ref()
                    .find(|&(_, c)| c == ']')
                    .map(|(i, _)| i + 1)
                    .ok_or_else(|| LexError {
                        message: format!("unterminated identifier starting at offset {start}"),
                    })?;
                (TokenKind::QuotedIdent, end)
            }
            ';' => (TokenKind::Semicolon, start + 1),
            c if is_word_start(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, c)) = chars.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                (TokenKind::Word, end)
            }
            c if c.is_ascii_digit()
                || (c == '.' && bytes.get(start + 1).is_some_and(u8::is_ascii_digit)) =>
            {
                let mut end = start + 1;
                while let Some(&(i, c)) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '.') {
                        break;
                    }
                    end = i + 1;
                    chars.next();
                }
                (TokenKind::Number, end)
            }
            c => (TokenKind::Symbol, start + c.len_utf8()),
        };

        tokens.push(Token {
            kind,
            text: &sql[start..end],
            start,
            end,
        });
    }

    Ok(tokens)
}

/// Consume up to the closing `quote`, treating a doubled quote as an escape.
/// Returns the end offset (exclusive) or `None` if the input runs out.
fn scan_quoted(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
) -> Option<usize> {
    while let Some((i, c)) = chars.next() {
        if c == quote {
            if chars.peek().is_some_and(|&(_, next)| next == quote) {
                chars.next();
                continue;
            }
            return Some(i + c.len_utf8());
        }
    }
    None
}
