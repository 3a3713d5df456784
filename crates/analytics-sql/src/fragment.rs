//! Structured query fragments.
//!
//! Query text is still emitted with inlined literals, but all quoting goes
//! through [`quote_ident`] and [`Literal`], and clauses are collected in a
//! [`SelectQuery`] instead of being concatenated by the callers.

use analytics_model::{AnalyticsError, Result, ValueType};

pub fn quote_ident(value: &str) -> String {
    let escaped = value.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

pub fn quote_literal(value: &str) -> String {
    let escaped = value.replace('\'', "''");
    format!("'{escaped}'")
}

/// `alias."column"`.
pub fn qualified(alias: &str, column: &str) -> String {
    format!("{alias}.{}", quote_ident(column))
}

/// A literal value inlined into query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Number(String),
    Text(String),
}

impl Literal {
    /// Numeric value types are emitted unquoted and must parse as numbers.
    pub fn for_value(raw: &str, value_type: ValueType, item: &str) -> Result<Literal> {
        if value_type.is_numeric() {
            let trimmed = raw.trim();
            if trimmed.parse::<f64>().is_err() {
                return Err(AnalyticsError::illegal(format!(
                    "filter value `{raw}` of `{item}` is not numeric"
                )));
            }
            Ok(Literal::Number(trimmed.to_string()))
        } else {
            Ok(Literal::Text(raw.to_string()))
        }
    }

    pub fn render(&self) -> String {
        match self {
            Literal::Number(value) => value.clone(),
            Literal::Text(value) => quote_literal(value),
        }
    }
}

/// Whether the next condition opens the `where` clause or extends it.
#[derive(Debug, Default)]
pub struct ClauseState {
    has_condition: bool,
}

impl ClauseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `where` for the first condition, `and` afterwards.
    pub fn keyword(&mut self) -> &'static str {
        if self.has_condition {
            "and"
        } else {
            self.has_condition = true;
            "where"
        }
    }

    pub fn has_condition(&self) -> bool {
        self.has_condition
    }
}

/// Named sub-query rendered in the `with` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonTableExpression {
    pub name: String,
    pub body: String,
}

/// Ordered clause fragments of one select statement.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub ctes: Vec<CommonTableExpression>,
    pub columns: Vec<String>,
    pub from: String,
    pub joins: Vec<String>,
    pub conditions: Vec<String>,
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectQuery {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Self::default()
        }
    }

    /// Row-fetch query text.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        self.push_with(&mut lines);
        lines.push(format!("select {}", self.columns.join(", ")));
        self.push_body(&mut lines);
        if !self.order_by.is_empty() {
            lines.push(format!("order by {}", self.order_by.join(", ")));
        }
        if let Some(limit) = self.limit {
            lines.push(format!("limit {limit} offset {}", self.offset.unwrap_or(0)));
        }
        lines.join("\n")
    }

    /// `select count(*)` over the same ctes, joins and conditions.
    pub fn render_count(&self) -> String {
        let mut lines = Vec::new();
        self.push_with(&mut lines);
        lines.push("select count(*)".to_string());
        self.push_body(&mut lines);
        lines.join("\n")
    }

    fn push_with(&self, lines: &mut Vec<String>) {
        if self.ctes.is_empty() {
            return;
        }
        let ctes: Vec<String> = self
            .ctes
            .iter()
            .map(|cte| format!("{} as ({})", quote_ident(&cte.name), cte.body))
            .collect();
        lines.push(format!("with {}", ctes.join(",\n")));
    }

    fn push_body(&self, lines: &mut Vec<String>) {
        lines.push(format!("from {}", self.from));
        lines.extend(self.joins.iter().cloned());
        let mut state = ClauseState::new();
        for condition in &self.conditions {
            lines.push(format!("{} {condition}", state.keyword()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(qualified("ax", "ou"), "ax.\"ou\"");
    }

    #[test]
    fn numeric_literals_are_unquoted_and_validated() {
        let literal = Literal::for_value(" 10.5 ", ValueType::Number, "de").expect("numeric");
        assert_eq!(literal.render(), "10.5");
        let literal = Literal::for_value("10", ValueType::Text, "de").expect("text");
        assert_eq!(literal.render(), "'10'");
        assert!(Literal::for_value("ten", ValueType::Integer, "de").is_err());
    }

    #[test]
    fn clause_state_opens_where_once() {
        let mut state = ClauseState::new();
        assert!(!state.has_condition());
        assert_eq!(state.keyword(), "where");
        assert_eq!(state.keyword(), "and");
        assert!(state.has_condition());
    }

    #[test]
    fn renders_query_and_count() {
        let mut query = SelectQuery::new("analytics_enrollment_prg as ax");
        query.columns = vec!["ax.\"enrollment\" as \"enrollment\"".to_string()];
        query.conditions = vec!["a = 1".to_string(), "b = 2".to_string()];
        query.order_by = vec!["\"enrollment\" asc".to_string()];
        query.limit = Some(11);
        query.offset = Some(20);
        assert_eq!(
            query.render(),
            "select ax.\"enrollment\" as \"enrollment\"\n\
             from analytics_enrollment_prg as ax\n\
             where a = 1\n\
             and b = 2\n\
             order by \"enrollment\" asc\n\
             limit 11 offset 20"
        );
        assert_eq!(
            query.render_count(),
            "select count(*)\nfrom analytics_enrollment_prg as ax\nwhere a = 1\nand b = 2"
        );
    }
}
