// Filter stage: resolve a parsed filter against a dataset and test rows

use crate::data::{parse_amount, Dataset};
use crate::error::DatasetError;
use crate::parser::{self, CompareOp, Filter, Literal};
use anyhow::Result;
use std::cmp::Ordering;

/// Parse a filter expression, reporting where parsing stopped
pub fn parse_expression(expr: &str) -> Result<Filter> {
    match parser::parse_filter(expr) {
        Ok((_, filter)) => Ok(filter),
        Err(e) => anyhow::bail!("Parse error in filter '{}': {:?}", expr, e),
    }
}

/// A filter whose column names are resolved to indices of one dataset
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    root: Node,
}

#[derive(Debug, Clone)]
enum Node {
    Compare {
        index: usize,
        op: CompareOp,
        value: Literal,
    },
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
}

impl CompiledFilter {
    pub fn compile(filter: &Filter, dataset: &Dataset) -> Result<Self, DatasetError> {
        Ok(Self {
            root: compile_node(filter, dataset)?,
        })
    }

    pub fn matches(&self, row: &[String]) -> bool {
        eval(&self.root, row)
    }
}

fn compile_node(filter: &Filter, dataset: &Dataset) -> Result<Node, DatasetError> {
    Ok(match filter {
        Filter::Compare(c) => Node::Compare {
            index: dataset.column_index(&c.column)?,
            op: c.op,
            value: c.value.clone(),
        },
        Filter::And(terms) => Node::And(
            terms
                .iter()
                .map(|t| compile_node(t, dataset))
                .collect::<Result<_, _>>()?,
        ),
        Filter::Or(terms) => Node::Or(
            terms
                .iter()
                .map(|t| compile_node(t, dataset))
                .collect::<Result<_, _>>()?,
        ),
        Filter::Not(inner) => Node::Not(Box::new(compile_node(inner, dataset)?)),
    })
}

fn eval(node: &Node, row: &[String]) -> bool {
    match node {
        Node::Compare { index, op, value } => {
            let cell = row.get(*index).map(|s| s.trim()).unwrap_or("");
            compare(cell, *op, value)
        }
        Node::And(terms) => terms.iter().all(|t| eval(t, row)),
        Node::Or(terms) => terms.iter().any(|t| eval(t, row)),
        Node::Not(inner) => !eval(inner, row),
    }
}

fn compare(cell: &str, op: CompareOp, value: &Literal) -> bool {
    match value {
        Literal::Number(n) => {
            if op == CompareOp::Contains {
                return cell.contains(&n.to_string());
            }
            match parse_amount(cell) {
                Some(v) => match v.partial_cmp(n) {
                    Some(ord) => holds(op, ord),
                    None => false,
                },
                None => false,
            }
        }
        Literal::Text(t) => {
            let lhs = cell.to_lowercase();
            let rhs = t.trim().to_lowercase();
            if op == CompareOp::Contains {
                return lhs.contains(&rhs);
            }
            holds(op, lhs.cmp(&rhs))
        }
    }
}

fn holds(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Ge => ord != Ordering::Less,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Le => ord != Ordering::Greater,
        CompareOp::Contains => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset() -> Dataset {
        let rows = [
            ["North", "Savings", "100", "HBL"],
            ["South", "Current", "2,500", "Meezan Bank"],
            ["North", "Current", "", "UBL"],
            ["East", "Savings", "abc", "Bank Alfalah"],
        ];
        Dataset::new(
            vec![
                "Region".to_string(),
                "Account Type".to_string(),
                "Credit".to_string(),
                "Transaction To".to_string(),
            ],
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn apply(expr: &str) -> Vec<usize> {
        let ds = make_dataset();
        let filter = parse_expression(expr).unwrap();
        let compiled = CompiledFilter::compile(&filter, &ds).unwrap();
        ds.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| compiled.matches(r))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_text_equality_is_case_insensitive() {
        assert_eq!(apply("Region == \"north\""), vec![0, 2]);
    }

    #[test]
    fn test_numeric_comparison_skips_unparseable() {
        assert_eq!(apply("Credit > 50"), vec![0, 1]);
        // blank is a zero amount, "abc" never matches
        assert_eq!(apply("Credit <= 0"), vec![2]);
    }

    #[test]
    fn test_contains() {
        assert_eq!(apply("`Transaction To` ~ \"bank\""), vec![1, 3]);
    }

    #[test]
    fn test_boolean_combinators() {
        assert_eq!(apply("Region == North and `Account Type` == Current"), vec![2]);
        assert_eq!(apply("Region == East or Credit >= 2500"), vec![1, 3]);
        assert_eq!(apply("not Region == North"), vec![1, 3]);
    }

    #[test]
    fn test_compile_missing_column() {
        let ds = make_dataset();
        let filter = parse_expression("Branch == \"Lahore\"").unwrap();
        let err = CompiledFilter::compile(&filter, &ds).unwrap_err();
        assert_eq!(err, DatasetError::MissingColumn("Branch".to_string()));
    }

    #[test]
    fn test_dataset_filter_preserves_order() {
        let ds = make_dataset();
        let filter = parse_expression("`Account Type` == Current").unwrap();
        let compiled = CompiledFilter::compile(&filter, &ds).unwrap();
        let filtered = ds.filter(&compiled);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.rows[0][0], "South");
        assert_eq!(filtered.rows[1][0], "North");
        assert_eq!(filtered.row_numbers, vec![1, 2]);
    }

    #[test]
    fn test_parse_expression_error() {
        let err = parse_expression("Credit >").unwrap_err();
        assert!(err.to_string().contains("Parse error"));
    }
}
