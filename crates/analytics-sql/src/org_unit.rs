//! Organisation-unit restriction of the analytics rows.

use analytics_model::{OrgUnitScope, OuMode};

use crate::fragment::{qualified, quote_literal};
use crate::tables::{COL_OU, COL_OU_LEVEL, uid_level_column};

/// Predicate restricting `alias` rows to the selected units, or `None` when
/// no unit is selected.
///
/// Descendant scopes compare the per-level ancestor column of each unit and
/// OR the comparisons; units sit at different levels, so they never collapse
/// into a single `in` list.
pub fn org_unit_condition(alias: &str, scope: &OrgUnitScope) -> Option<String> {
    if scope.units.is_empty() {
        return None;
    }
    let condition = match scope.mode {
        OuMode::Selected => {
            let uids: Vec<String> = scope.units.iter().map(|unit| quote_literal(&unit.uid)).collect();
            format!("{} in ({})", qualified(alias, COL_OU), uids.join(", "))
        }
        OuMode::Children => or_chain(
            scope
                .units
                .iter()
                .map(|unit| {
                    format!(
                        "({} = {} and {} = {})",
                        qualified(alias, &uid_level_column(unit.level)),
                        quote_literal(&unit.uid),
                        qualified(alias, COL_OU_LEVEL),
                        unit.level + 1
                    )
                })
                .collect(),
        ),
        OuMode::Descendants => or_chain(
            scope
                .units
                .iter()
                .map(|unit| {
                    format!(
                        "{} = {}",
                        qualified(alias, &uid_level_column(unit.level)),
                        quote_literal(&unit.uid)
                    )
                })
                .collect(),
        ),
    };
    Some(condition)
}

fn or_chain(mut parts: Vec<String>) -> String {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        format!("({})", parts.join(" or "))
    }
}
