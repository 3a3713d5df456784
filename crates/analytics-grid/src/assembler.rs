//! Reads a cursor into a [`Grid`].

use analytics_extract::present;
use analytics_model::{
    CursorGuard, Grid, Result, RowCursor, ValueStatus, exists_label, is_scheduled_status,
    status_label,
};
use analytics_sql::OutputColumn;

/// Assemble the grid for `columns` from `cursor`.
///
/// With a page size the cursor is expected to hold one probe row beyond the
/// page; if it does, the probe is dropped and `last_data_row` is cleared.
///
/// Headers are matched to physical columns through a running offset: a
/// header the cursor does not materialize is read by label and shifts later
/// headers left by one, while side-car columns that are materialized shift
/// them right by two. The cursor is closed on every exit path.
pub fn assemble<C: RowCursor + ?Sized>(
    cursor: &mut C,
    columns: &[OutputColumn],
    page_size: Option<u32>,
) -> Result<Grid> {
    let mut cursor = CursorGuard::new(cursor);
    let physical: Vec<String> = cursor.columns().to_vec();
    let mut grid = Grid::new(columns.iter().map(|column| column.header.clone()).collect());
    let limit = page_size.map(|size| size as usize);

    while cursor.next_row()? {
        if limit.is_some_and(|limit| grid.height() >= limit) {
            grid.last_data_row = false;
            break;
        }
        let row_index = grid.height();
        let mut row = Vec::with_capacity(columns.len());
        let mut statuses = Vec::new();
        let mut offset: isize = 0;

        for (index, column) in columns.iter().enumerate() {
            let name = column.header.name.as_str();
            let position = index as isize + offset;
            let at = |position: isize, label: &str| {
                usize::try_from(position)
                    .ok()
                    .filter(|&position| physical.get(position).is_some_and(|column| column == label))
            };

            // Whether a value was captured is judged before presentation, so a
            // value outside every legend still counts as set.
            let (value, is_set) = match at(position, name) {
                Some(position) => {
                    let raw = cursor.get_at(position)?;
                    let is_set = !raw.is_null();
                    let value = match &column.dimension {
                        Some(dimension) => present(dimension, raw, name)?,
                        None => raw.conform(column.header.value_type),
                    };
                    (value, is_set)
                }
                None => {
                    offset -= 1;
                    let value = cursor.get(name)?;
                    let is_set = if column.header.row_context {
                        !cursor.get_raw(name)?.is_null()
                    } else {
                        !value.is_null()
                    };
                    (value, is_set)
                }
            };

            if column.header.row_context {
                let exists_name = exists_label(name);
                let status_name = status_label(name);
                let (exists, status) = match (
                    at(position + 1, &exists_name),
                    at(position + 2, &status_name),
                ) {
                    (Some(exists), Some(status)) => {
                        offset += 2;
                        (cursor.get_at(exists)?, cursor.get_at(status)?)
                    }
                    _ => (cursor.get(&exists_name)?, cursor.get(&status_name)?),
                };
                let scheduled = status
                    .as_text()
                    .is_some_and(|status| is_scheduled_status(&status));
                if let Some(status) = ValueStatus::of(exists.is_truthy(), is_set, scheduled) {
                    statuses.push((name, status));
                }
            }
            row.push(value);
        }

        grid.add_row(row);
        for (name, status) in statuses {
            grid.add_row_context(row_index, name, status);
        }
    }
    Ok(grid)
}
