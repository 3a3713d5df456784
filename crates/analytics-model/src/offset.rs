//! Offset rule shared by the query-text path and the payload path.
//!
//! The rule table lives here once:
//!
//! | offset | direction | rows skipped  |
//! |--------|-----------|---------------|
//! | `0`    | desc      | 0             |
//! | `< 0`  | desc      | `-offset`     |
//! | `> 0`  | asc       | `offset - 1`  |
//!
//! Ties on the primary date are broken by the creation timestamp in the same
//! direction. Missing keys sort first ascending and last descending, which is
//! what the generated `nulls first` / `nulls last` clauses request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sort direction derived from an [`Offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Null placement matching `Option` ordering in [`resolve`].
    pub fn nulls_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "nulls first",
            SortDirection::Desc => "nulls last",
        }
    }
}

/// Signed index selecting the Nth enrollment or event relative to "most recent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Offset(i32);

impl Offset {
    /// The most recent item.
    pub const LATEST: Offset = Offset(0);

    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(self) -> i32 {
        self.0
    }

    pub fn direction(self) -> SortDirection {
        if self.0 > 0 {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    /// Rows skipped after sorting.
    pub fn skip(self) -> usize {
        if self.0 > 0 {
            (self.0 - 1).unsigned_abs() as usize
        } else {
            self.0.unsigned_abs() as usize
        }
    }

    /// 1-based `row_number()` of the selected row within its partition.
    pub fn row_number(self) -> usize {
        self.skip() + 1
    }
}

impl From<i32> for Offset {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Select the item addressed by `offset` from `items`.
///
/// Items are ordered by `(date_key, tie_break_key)` in the offset's direction;
/// the sort is stable so fully tied items keep their input order.
pub fn resolve<T, D, C>(
    items: impl IntoIterator<Item = T>,
    date_key: impl Fn(&T) -> D,
    tie_break_key: impl Fn(&T) -> C,
    offset: Offset,
) -> Option<T>
where
    D: Ord,
    C: Ord,
{
    let mut items: Vec<T> = items.into_iter().collect();
    let direction = offset.direction();
    items.sort_by(|a, b| {
        let ordering = date_key(a)
            .cmp(&date_key(b))
            .then_with(|| tie_break_key(a).cmp(&tie_break_key(b)));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    items.into_iter().nth(offset.skip())
}
