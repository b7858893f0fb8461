use log::{debug, warn};

use super::tokenizer::{Field, FieldTag, Header, Line, Token};
use crate::models::AccountType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Section {
    AccountList,
    Transactions(AccountType),
    Categories,
    /// `Class`, `Memorized`, `Security`, `Prices` and anything unrecognised.
    Other(String),
}

impl Section {
    fn from_type_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("cat") {
            return Self::Categories;
        }
        match AccountType::from_qif(name) {
            Some(t) => Self::Transactions(t),
            None => Self::Other(name.to_string()),
        }
    }
}

/// One split line group (`S`/`E`/`$`) as raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RawSplit {
    pub(crate) category: Option<String>,
    pub(crate) memo: Option<String>,
    pub(crate) amount: Option<String>,
}

/// A terminated record, tagged with the context it was assembled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub(crate) section: Section,
    pub(crate) account: Option<String>,
    pub(crate) fields: Vec<Field>,
    pub(crate) splits: Vec<RawSplit>,
    pub(crate) line: usize,
}

impl Record {
    /// Last value for a tag; QIF writers occasionally repeat a field.
    pub(crate) fn value(&self, code: char) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.tag.code() == code)
            .map(|f| f.value.as_str())
    }

    pub(crate) fn has(&self, code: char) -> bool {
        self.fields.iter().any(|f| f.tag.code() == code)
    }
}

#[derive(Debug)]
enum State {
    AwaitingSection,
    InSection(Section),
    Accumulating {
        section: Section,
        fields: Vec<Field>,
        splits: Vec<RawSplit>,
        first_line: usize,
    },
}

#[derive(Debug, Default)]
pub(crate) struct Assembled {
    pub(crate) records: Vec<Record>,
    /// Lines that could not belong to any record.
    pub(crate) skipped_lines: usize,
}

pub(crate) struct Assembler {
    state: State,
    account_context: Option<String>,
    auto_switch: bool,
    out: Assembled,
}

impl Assembler {
    pub(crate) fn new() -> Self {
        Self {
            state: State::AwaitingSection,
            account_context: None,
            auto_switch: false,
            out: Assembled::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn account_context(&self) -> Option<&str> {
        self.account_context.as_deref()
    }

    pub(crate) fn feed(&mut self, line: Line) {
        match line.token {
            Token::Header(header) => self.on_header(header, line.number),
            Token::Field(field) => self.on_field(field, line.number),
            Token::Terminator => self.on_terminator(line.number),
        }
    }

    /// Flush a trailing record that was never terminated.
    pub(crate) fn finish(mut self) -> Assembled {
        if let State::Accumulating {
            section,
            fields,
            splits,
            first_line,
        } = std::mem::replace(&mut self.state, State::AwaitingSection)
        {
            debug!("Closing unterminated record that starts at line {first_line}");
            self.emit(section, fields, splits, first_line);
        }
        self.out
    }

    fn on_header(&mut self, header: Header, number: usize) {
        let current = match std::mem::replace(&mut self.state, State::AwaitingSection) {
            State::AwaitingSection => None,
            State::InSection(section) => Some(section),
            State::Accumulating {
                section, first_line, ..
            } => {
                warn!("Line {number}: section header inside the record at line {first_line}; record dropped");
                self.out.skipped_lines += 1;
                Some(section)
            }
        };

        let next = match header {
            Header::Account => Some(Section::AccountList),
            Header::Type(name) => Some(Section::from_type_name(&name)),
            Header::SetOption(name) => {
                if name.eq_ignore_ascii_case("autoswitch") {
                    self.auto_switch = true;
                }
                current
            }
            Header::ClearOption(name) => {
                if name.eq_ignore_ascii_case("autoswitch") {
                    self.auto_switch = false;
                }
                current
            }
            Header::Unknown(text) => Some(Section::Other(text)),
        };

        self.state = match next {
            Some(section) => State::InSection(section),
            None => State::AwaitingSection,
        };
    }

    fn on_field(&mut self, field: Field, number: usize) {
        match &mut self.state {
            State::AwaitingSection => {
                debug!("Line {number}: field outside of any section");
                self.out.skipped_lines += 1;
            }
            State::InSection(section) => {
                let section = section.clone();
                let mut fields = Vec::new();
                let mut splits = Vec::new();
                push_field(&section, &mut fields, &mut splits, field);
                self.state = State::Accumulating {
                    section,
                    fields,
                    splits,
                    first_line: number,
                };
            }
            State::Accumulating {
                section,
                fields,
                splits,
                ..
            } => push_field(section, fields, splits, field),
        }
    }

    fn on_terminator(&mut self, number: usize) {
        match std::mem::replace(&mut self.state, State::AwaitingSection) {
            State::AwaitingSection => {
                debug!("Line {number}: terminator outside of any section");
                self.out.skipped_lines += 1;
            }
            State::InSection(section) => {
                debug!("Line {number}: empty record");
                self.out.skipped_lines += 1;
                self.state = State::InSection(section);
            }
            State::Accumulating {
                section,
                fields,
                splits,
                first_line,
            } => {
                self.state = State::InSection(section.clone());
                self.emit(section, fields, splits, first_line);
            }
        }
    }

    fn emit(&mut self, section: Section, fields: Vec<Field>, splits: Vec<RawSplit>, line: usize) {
        let record = Record {
            section,
            account: self.account_context.clone(),
            fields,
            splits,
            line,
        };

        if record.section == Section::AccountList && !self.auto_switch {
            if let Some(name) = record.value('N').filter(|n| !n.is_empty()) {
                self.account_context = Some(name.to_string());
            }
        }

        self.out.records.push(record);
    }
}

/// Split lines are only grouped inside transaction sections; category
/// records use `E` for the expense flag.
fn push_field(section: &Section, fields: &mut Vec<Field>, splits: &mut Vec<RawSplit>, field: Field) {
    if !matches!(section, Section::Transactions(_)) {
        fields.push(field);
        return;
    }

    match field.tag {
        FieldTag::SplitCategory => splits.push(RawSplit {
            category: Some(field.value),
            ..RawSplit::default()
        }),
        FieldTag::SplitMemo => match splits.last_mut() {
            Some(open) if open.memo.is_none() && open.amount.is_none() => {
                open.memo = Some(field.value);
            }
            _ => splits.push(RawSplit {
                memo: Some(field.value),
                ..RawSplit::default()
            }),
        },
        FieldTag::SplitAmount => match splits.last_mut() {
            Some(open) if open.amount.is_none() => open.amount = Some(field.value),
            _ => splits.push(RawSplit {
                amount: Some(field.value),
                ..RawSplit::default()
            }),
        },
        _ => fields.push(field),
    }
}

#[cfg(test)]
#[path = "assembler_tests.rs"]
mod tests;
