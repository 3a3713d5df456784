//! Cell presentation: legends, option sets and value-type conversion.

use analytics_model::{AnalyticsError, DimensionParam, IdScheme, Result, Value};

/// Present a raw cell value the way the grid reports it.
///
/// A legend set replaces the number with the matching legend's display name,
/// or null when no legend covers it; a non-numeric value is a data-integrity
/// error. Option sets render the stored code by the dimension's id scheme.
/// Anything else is converted to the dimension's value type.
pub fn present(dimension: &DimensionParam, value: Value, key: &str) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if let Some(legend_set) = dimension.legend_set() {
        let number = value.as_f64().ok_or_else(|| AnalyticsError::LegendValue {
            dimension: key.to_string(),
            value: value.to_string(),
        })?;
        return Ok(legend_set
            .legend_for(number)
            .map_or(Value::Null, |legend| Value::text(legend.display_name.clone())));
    }
    if let Some(option_set) = dimension.option_set() {
        let code = value.to_string();
        let scheme = dimension.effective_id_scheme().unwrap_or(IdScheme::Code);
        return Ok(Value::text(option_set.render(&code, scheme)));
    }
    Ok(value.conform(dimension.value_type()))
}

#[cfg(test)]
mod tests {
    use analytics_model::{
        DimensionalItem, DynamicDimension, Legend, LegendSet, OptionItem, OptionSet, ValueType,
    };

    use super::*;

    fn with_legends() -> DimensionParam {
        DimensionParam::Dynamic(
            DynamicDimension::new(DimensionalItem::DataElement {
                uid: "weight".to_string(),
                value_type: ValueType::Number,
            })
            .with_legend_set(LegendSet::new(
                "ls",
                vec![Legend::new(0.0, 10.0, "Low"), Legend::new(10.0, 20.0, "High")],
            )),
        )
    }

    #[test]
    fn legend_boundaries_are_half_open() {
        let dimension = with_legends();
        let at = |value: f64| present(&dimension, Value::Number(value), "weight").expect("legend");
        assert_eq!(at(0.0), Value::text("Low"));
        assert_eq!(at(9.99), Value::text("Low"));
        assert_eq!(at(10.0), Value::text("High"));
        assert_eq!(at(20.0), Value::Null);
        assert_eq!(
            present(&dimension, Value::text("15"), "weight").expect("text number"),
            Value::text("High")
        );
    }

    #[test]
    fn non_numeric_legend_value_is_a_data_error() {
        let error = present(&with_legends(), Value::text("heavy"), "weight").expect_err("not numeric");
        assert!(matches!(error, AnalyticsError::LegendValue { ref value, .. } if value == "heavy"));
    }

    #[test]
    fn option_codes_render_by_scheme() {
        let option_set = OptionSet {
            uid: "os".to_string(),
            options: vec![OptionItem {
                uid: "opt1".to_string(),
                code: "MALE".to_string(),
                name: "Male".to_string(),
            }],
        };
        let dimension = |scheme: Option<IdScheme>| {
            let mut dimension = DynamicDimension::new(DimensionalItem::DataElement {
                uid: "sex".to_string(),
                value_type: ValueType::Text,
            })
            .with_option_set(option_set.clone());
            dimension.id_scheme = scheme;
            DimensionParam::Dynamic(dimension)
        };
        let render = |scheme| present(&dimension(scheme), Value::text("MALE"), "sex").expect("option");
        assert_eq!(render(None), Value::text("MALE"));
        assert_eq!(render(Some(IdScheme::Name)), Value::text("Male"));
        assert_eq!(render(Some(IdScheme::Uid)), Value::text("opt1"));
    }

    #[test]
    fn plain_values_follow_value_type() {
        let dimension = DimensionParam::data_element("age", ValueType::Integer);
        assert_eq!(
            present(&dimension, Value::text("42"), "age").expect("integer"),
            Value::Integer(42)
        );
        assert_eq!(present(&dimension, Value::Null, "age").expect("null"), Value::Null);
    }
}
