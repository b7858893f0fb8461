/// Section header as written after the leading `!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Header {
    /// `!Account`: the following records declare accounts.
    Account,
    /// `!Type:<name>`, e.g. `Bank`, `CCard`, `Cat`.
    Type(String),
    /// `!Option:<name>`, e.g. `AutoSwitch`.
    SetOption(String),
    /// `!Clear:<name>`.
    ClearOption(String),
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldTag {
    Date,
    Amount,
    Payee,
    Memo,
    Category,
    Cleared,
    Number,
    SplitCategory,
    SplitMemo,
    SplitAmount,
    Address,
    Unknown(char),
}

impl FieldTag {
    fn from_char(c: char) -> Self {
        match c {
            'D' => Self::Date,
            'T' => Self::Amount,
            'P' => Self::Payee,
            'M' => Self::Memo,
            'L' => Self::Category,
            'C' => Self::Cleared,
            'N' => Self::Number,
            'S' => Self::SplitCategory,
            'E' => Self::SplitMemo,
            '$' => Self::SplitAmount,
            'A' => Self::Address,
            other => Self::Unknown(other),
        }
    }

    /// The raw tag character. Account and category records reuse the same
    /// letters with different meanings, so their readers match on this.
    pub(crate) fn code(&self) -> char {
        match self {
            Self::Date => 'D',
            Self::Amount => 'T',
            Self::Payee => 'P',
            Self::Memo => 'M',
            Self::Category => 'L',
            Self::Cleared => 'C',
            Self::Number => 'N',
            Self::SplitCategory => 'S',
            Self::SplitMemo => 'E',
            Self::SplitAmount => '$',
            Self::Address => 'A',
            Self::Unknown(c) => *c,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Field {
    pub(crate) tag: FieldTag,
    pub(crate) value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Header(Header),
    Field(Field),
    Terminator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    /// 1-based line number in the source text.
    pub(crate) number: usize,
    pub(crate) token: Token,
}

/// Tag every non-blank line. Nothing is validated here.
pub(crate) fn tokenize(content: &str) -> Vec<Line> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let line = raw.trim_start_matches('\u{feff}').trim();
            if line.is_empty() {
                return None;
            }
            Some(Line {
                number: i + 1,
                token: classify(line),
            })
        })
        .collect()
}

fn classify(line: &str) -> Token {
    if line == "^" {
        return Token::Terminator;
    }
    if let Some(rest) = line.strip_prefix('!') {
        return Token::Header(parse_header(rest));
    }

    let mut chars = line.chars();
    // `line` is non-empty, so there is always a first char.
    let tag = chars.next().map(FieldTag::from_char).unwrap_or(FieldTag::Unknown(' '));
    Token::Field(Field {
        tag,
        value: chars.as_str().trim().to_string(),
    })
}

fn parse_header(rest: &str) -> Header {
    let (kind, name) = match rest.split_once(':') {
        Some((k, n)) => (k.trim(), n.trim()),
        None => (rest.trim(), ""),
    };

    match kind.to_lowercase().as_str() {
        "account" => Header::Account,
        "type" => Header::Type(name.to_string()),
        "option" => Header::SetOption(name.to_string()),
        "clear" => Header::ClearOption(name.to_string()),
        _ => Header::Unknown(rest.trim().to_string()),
    }
}

#[cfg(test)]
#[path = "tokenizer_tests.rs"]
mod tests;
