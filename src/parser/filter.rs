// Filter expression parser
//
// expr       := and_expr ( "or" and_expr )*
// and_expr   := term ( "and" term )*
// term       := "not" term | "(" expr ")" | comparison
// comparison := column op literal

use super::ast::{CompareOp, Comparison, Filter, Literal};
use super::lexer::{identifier, keyword, number_literal, quoted_identifier, string_literal, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{eof, map, value},
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult,
};

/// Parse a complete filter expression; the whole input must be consumed
pub fn parse_filter(input: &str) -> IResult<&str, Filter> {
    let (input, filter) = ws(parse_or)(input)?;
    let (input, _) = eof(input)?;
    Ok((input, filter))
}

fn parse_or(input: &str) -> IResult<&str, Filter> {
    let (input, mut terms) = separated_list1(ws(keyword("or")), parse_and)(input)?;
    if terms.len() == 1 {
        Ok((input, terms.remove(0)))
    } else {
        Ok((input, Filter::Or(terms)))
    }
}

fn parse_and(input: &str) -> IResult<&str, Filter> {
    let (input, mut terms) = separated_list1(ws(keyword("and")), parse_term)(input)?;
    if terms.len() == 1 {
        Ok((input, terms.remove(0)))
    } else {
        Ok((input, Filter::And(terms)))
    }
}

fn parse_term(input: &str) -> IResult<&str, Filter> {
    alt((
        map(preceded(ws(keyword("not")), parse_term), |f| {
            Filter::Not(Box::new(f))
        }),
        delimited(ws(char('(')), parse_or, ws(char(')'))),
        map(parse_comparison, Filter::Compare),
    ))(input)
}

fn parse_comparison(input: &str) -> IResult<&str, Comparison> {
    let (input, column) = ws(alt((quoted_identifier, identifier)))(input)?;
    let (input, op) = ws(parse_op)(input)?;
    let (input, value) = ws(parse_literal)(input)?;
    Ok((input, Comparison { column, op, value }))
}

fn parse_op(input: &str) -> IResult<&str, CompareOp> {
    // Longest operators first
    alt((
        value(CompareOp::Eq, tag("==")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Ge, tag(">=")),
        value(CompareOp::Le, tag("<=")),
        value(CompareOp::Eq, tag("=")),
        value(CompareOp::Gt, tag(">")),
        value(CompareOp::Lt, tag("<")),
        value(CompareOp::Contains, tag("~")),
    ))(input)
}

fn parse_literal(input: &str) -> IResult<&str, Literal> {
    alt((
        map(string_literal, Literal::Text),
        map(identifier, Literal::Text),
        map(number_literal, Literal::Number),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(column: &str, op: CompareOp, value: Literal) -> Filter {
        Filter::Compare(Comparison {
            column: column.to_string(),
            op,
            value,
        })
    }

    #[test]
    fn test_parse_simple_comparison() {
        let (_, f) = parse_filter("Credit > 1000").unwrap();
        assert_eq!(f, cmp("Credit", CompareOp::Gt, Literal::Number(1000.0)));
    }

    #[test]
    fn test_parse_quoted_column_and_string() {
        let (_, f) = parse_filter("`Account Type` == \"Savings\"").unwrap();
        assert_eq!(
            f,
            cmp("Account Type", CompareOp::Eq, Literal::Text("Savings".to_string()))
        );
    }

    #[test]
    fn test_parse_bare_word_literal() {
        let (_, f) = parse_filter("Region != North").unwrap();
        assert_eq!(f, cmp("Region", CompareOp::Ne, Literal::Text("North".to_string())));
    }

    #[test]
    fn test_parse_and_binds_tighter_than_or() {
        let (_, f) = parse_filter("a > 1 and b < 2 or c == 3").unwrap();
        assert_eq!(
            f,
            Filter::Or(vec![
                Filter::And(vec![
                    cmp("a", CompareOp::Gt, Literal::Number(1.0)),
                    cmp("b", CompareOp::Lt, Literal::Number(2.0)),
                ]),
                cmp("c", CompareOp::Eq, Literal::Number(3.0)),
            ])
        );
    }

    #[test]
    fn test_parse_parentheses_and_not() {
        let (_, f) = parse_filter("not (Region == \"North\" OR Region == \"South\")").unwrap();
        match f {
            Filter::Not(inner) => assert!(matches!(*inner, Filter::Or(ref v) if v.len() == 2)),
            other => panic!("expected Not, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_contains_and_ge() {
        let (_, f) = parse_filter("`Transaction To` ~ \"bank\" and Debit >= 0.5").unwrap();
        assert_eq!(
            f,
            Filter::And(vec![
                cmp("Transaction To", CompareOp::Contains, Literal::Text("bank".to_string())),
                cmp("Debit", CompareOp::Ge, Literal::Number(0.5)),
            ])
        );
    }

    #[test]
    fn test_parse_column_starting_with_keyword() {
        let (_, f) = parse_filter("notes == \"x\"").unwrap();
        assert_eq!(f, cmp("notes", CompareOp::Eq, Literal::Text("x".to_string())));
    }

    #[test]
    fn test_parse_rejects_trailing_garbage() {
        assert!(parse_filter("Credit > 10 Debit").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_operator() {
        assert!(parse_filter("Credit 10").is_err());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(parse_filter("   ").is_err());
    }
}
