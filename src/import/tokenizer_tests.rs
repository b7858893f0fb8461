#![allow(clippy::unwrap_used)]

use super::*;

fn tokens(content: &str) -> Vec<Token> {
    tokenize(content).into_iter().map(|l| l.token).collect()
}

fn field(tag: FieldTag, value: &str) -> Token {
    Token::Field(Field {
        tag,
        value: value.into(),
    })
}

#[test]
fn test_headers() {
    let t = tokens("!Account\n!Type:Bank\n!Type:CCard\n!Option:AutoSwitch\n!Clear:AutoSwitch\n!Whatever");
    assert_eq!(
        t,
        vec![
            Token::Header(Header::Account),
            Token::Header(Header::Type("Bank".into())),
            Token::Header(Header::Type("CCard".into())),
            Token::Header(Header::SetOption("AutoSwitch".into())),
            Token::Header(Header::ClearOption("AutoSwitch".into())),
            Token::Header(Header::Unknown("Whatever".into())),
        ]
    );
}

#[test]
fn test_header_type_with_space() {
    assert_eq!(
        tokens("!Type:Oth A"),
        vec![Token::Header(Header::Type("Oth A".into()))]
    );
}

#[test]
fn test_transaction_fields() {
    let t = tokens("D1/15/24\nT-12.50\nPCorner Store\nMmilk\nLFood\nCX\nN104\n^");
    assert_eq!(
        t,
        vec![
            field(FieldTag::Date, "1/15/24"),
            field(FieldTag::Amount, "-12.50"),
            field(FieldTag::Payee, "Corner Store"),
            field(FieldTag::Memo, "milk"),
            field(FieldTag::Category, "Food"),
            field(FieldTag::Cleared, "X"),
            field(FieldTag::Number, "104"),
            Token::Terminator,
        ]
    );
}

#[test]
fn test_split_fields() {
    let t = tokens("SFood\nEbread\n$-4.00");
    assert_eq!(
        t,
        vec![
            field(FieldTag::SplitCategory, "Food"),
            field(FieldTag::SplitMemo, "bread"),
            field(FieldTag::SplitAmount, "-4.00"),
        ]
    );
}

#[test]
fn test_unknown_tag_passed_through() {
    assert_eq!(
        tokens("Ysome security\nQ10"),
        vec![
            field(FieldTag::Unknown('Y'), "some security"),
            field(FieldTag::Unknown('Q'), "10"),
        ]
    );
}

#[test]
fn test_tag_only_line_has_empty_value() {
    assert_eq!(tokens("E"), vec![field(FieldTag::SplitMemo, "")]);
}

#[test]
fn test_blank_lines_skipped_and_numbers_kept() {
    let lines = tokenize("\n!Type:Bank\r\n\n   \nD1/1/24\r\n^\n");
    let numbers: Vec<usize> = lines.iter().map(|l| l.number).collect();
    assert_eq!(numbers, vec![2, 5, 6]);
    assert_eq!(lines[2].token, Token::Terminator);
}

#[test]
fn test_byte_order_mark_ignored() {
    assert_eq!(
        tokens("\u{feff}!Type:Bank"),
        vec![Token::Header(Header::Type("Bank".into()))]
    );
}

#[test]
fn test_caret_with_text_is_a_field() {
    // Only a bare `^` ends a record.
    assert_eq!(tokens("^x"), vec![field(FieldTag::Unknown('^'), "x")]);
}

#[test]
fn test_field_tag_code_round_trip() {
    for c in ['D', 'T', 'P', 'M', 'L', 'C', 'N', 'S', 'E', '$', 'A', 'Z'] {
        assert_eq!(FieldTag::from_char(c).code(), c);
    }
}
