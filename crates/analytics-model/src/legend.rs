//! Legend sets and option sets used to render raw values.

use serde::{Deserialize, Serialize};

use crate::dimension::IdScheme;

/// A numeric range mapped to a display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub start_value: f64,
    pub end_value: f64,
    pub display_name: String,
}

impl Legend {
    pub fn new(start_value: f64, end_value: f64, display_name: impl Into<String>) -> Self {
        Self {
            start_value,
            end_value,
            display_name: display_name.into(),
        }
    }

    /// Half-open interval: `start_value <= value < end_value`.
    pub fn contains(&self, value: f64) -> bool {
        self.start_value <= value && value < self.end_value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendSet {
    pub uid: String,
    pub legends: Vec<Legend>,
}

impl LegendSet {
    pub fn new(uid: impl Into<String>, legends: Vec<Legend>) -> Self {
        Self {
            uid: uid.into(),
            legends,
        }
    }

    /// First legend containing `value`, in declaration order.
    pub fn legend_for(&self, value: f64) -> Option<&Legend> {
        self.legends.iter().find(|legend| legend.contains(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub uid: String,
    pub code: String,
    pub name: String,
}

/// Options whose codes are the stored values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub uid: String,
    pub options: Vec<OptionItem>,
}

impl OptionSet {
    /// Render a stored option code in the requested id scheme.
    ///
    /// Codes that are not part of the set are returned unchanged.
    pub fn render<'a>(&'a self, code: &'a str, scheme: IdScheme) -> &'a str {
        let Some(option) = self.options.iter().find(|option| option.code == code) else {
            return code;
        };
        match scheme {
            IdScheme::Code => &option.code,
            IdScheme::Name => &option.name,
            IdScheme::Uid => &option.uid,
        }
    }
}
