//! Item filters and date-range restrictions.

use analytics_model::{
    AnalyticsError, DateRange, FilterOperator, NULL_VALUE, QueryFilter, Result, ValueType,
};

use crate::fragment::{Literal, qualified, quote_literal};

/// One predicate per filter; the caller ANDs them.
pub fn item_conditions(
    expression: &str,
    filters: &[QueryFilter],
    value_type: ValueType,
    item: &str,
) -> Result<Vec<String>> {
    filters
        .iter()
        .map(|filter| filter_condition(expression, filter, value_type, item))
        .collect()
}

/// Predicate for a single filter over `expression`.
///
/// `NV` stands for "no value": it maps to `is null`, `is not null` for `NE`,
/// and adds an `or .. is null` branch to `IN` lists.
pub fn filter_condition(
    expression: &str,
    filter: &QueryFilter,
    value_type: ValueType,
    item: &str,
) -> Result<String> {
    match filter.operator {
        FilterOperator::In => in_condition(expression, filter, value_type, item),
        FilterOperator::Like | FilterOperator::NotLike => {
            let keyword = if filter.operator == FilterOperator::Like {
                "like"
            } else {
                "not like"
            };
            let pattern = format!("%{}%", filter.value.to_lowercase());
            Ok(format!("lower({expression}) {keyword} {}", quote_literal(&pattern)))
        }
        FilterOperator::Eq if filter.value == NULL_VALUE => Ok(format!("{expression} is null")),
        FilterOperator::Ne if filter.value == NULL_VALUE => {
            Ok(format!("{expression} is not null"))
        }
        FilterOperator::Ne => {
            let literal = Literal::for_value(&filter.value, value_type, item)?;
            Ok(format!(
                "({expression} is null or {expression} != {})",
                literal.render()
            ))
        }
        operator => {
            if filter.value == NULL_VALUE {
                return Err(AnalyticsError::illegal(format!(
                    "`{NULL_VALUE}` cannot be compared with {operator:?} on `{item}`"
                )));
            }
            let comparison = operator.comparison_sql().ok_or_else(|| {
                AnalyticsError::illegal(format!("unsupported operator {operator:?} on `{item}`"))
            })?;
            let literal = Literal::for_value(&filter.value, value_type, item)?;
            Ok(format!("{expression} {comparison} {}", literal.render()))
        }
    }
}

fn in_condition(
    expression: &str,
    filter: &QueryFilter,
    value_type: ValueType,
    item: &str,
) -> Result<String> {
    let values = filter.values();
    let has_null = values.iter().any(|value| *value == NULL_VALUE);
    let literals = values
        .iter()
        .filter(|value| **value != NULL_VALUE)
        .map(|value| Literal::for_value(value, value_type, item).map(|literal| literal.render()))
        .collect::<Result<Vec<_>>>()?;
    let condition = match (literals.is_empty(), has_null) {
        (true, _) => format!("{expression} is null"),
        (false, false) => format!("{expression} in ({})", literals.join(", ")),
        (false, true) => format!(
            "({expression} in ({}) or {expression} is null)",
            literals.join(", ")
        ),
    };
    Ok(condition)
}

/// Restrict `alias.column` to any of the inclusive date ranges.
pub fn time_condition(alias: &str, column: &str, ranges: &[DateRange]) -> Option<String> {
    let column = qualified(alias, column);
    let parts: Vec<String> = ranges
        .iter()
        .map(|range| match range.end.succ_opt() {
            Some(next) => format!(
                "({column} >= '{}' and {column} < '{next}')",
                range.start
            ),
            None => format!(
                "({column} >= '{}' and {column} <= '{}')",
                range.start, range.end
            ),
        })
        .collect();
    match parts.len() {
        0 => None,
        1 => parts.into_iter().next(),
        _ => Some(format!("({})", parts.join(" or "))),
    }
}
