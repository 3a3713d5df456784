use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use analytics_grid::MultipleQueryResult;
use analytics_model::{ExecutionPlan, Grid, Value, ValueStatus};

pub fn print_grid(grid: &Grid) {
    if let Some(plan) = &grid.explain {
        print_plan(plan);
        return;
    }
    let mut table = Table::new();
    table.set_header(grid.headers.iter().map(|header| header_cell(&header.name)));
    apply_table_style(&mut table);
    for (index, header) in grid.headers.iter().enumerate() {
        if header.value_type.is_numeric() {
            align_column(&mut table, index, CellAlignment::Right);
        }
    }
    for (row_index, row) in grid.rows.iter().enumerate() {
        table.add_row(grid.headers.iter().zip(row).map(|(header, value)| {
            value_cell(value, grid.cell_status(row_index, &header.name))
        }));
    }
    println!("{table}");

    let mut footer = format!("{} row(s)", grid.height());
    if let Some(pager) = &grid.pager {
        footer.push_str(&format!(", page {} of size {}", pager.page, pager.page_size));
        if let Some(total) = pager.total {
            footer.push_str(&format!(", {total} total"));
        }
        if !pager.is_last_page {
            footer.push_str(", more available");
        }
    }
    println!("{footer}");
}

pub fn print_multiple(result: &MultipleQueryResult) {
    for grid in &result.grids {
        print_grid(grid);
    }
    if result.failures.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Query"),
        header_cell("Attempts"),
        header_cell("Error"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    for failure in &result.failures {
        table.add_row(vec![
            Cell::new(failure.index),
            Cell::new(failure.attempts),
            Cell::new(&failure.error).fg(Color::Red),
        ]);
    }
    eprintln!("Failed sub-queries:");
    eprintln!("{table}");
}

fn print_plan(plan: &ExecutionPlan) {
    println!("{}", plan.sql);
    println!();
    match &plan.error {
        Some(error) => eprintln!("plan unavailable: {error}"),
        None => {
            for line in &plan.plan {
                println!("{line}");
            }
        }
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Empty cells show why they are empty when row context says so.
fn value_cell(value: &Value, status: Option<ValueStatus>) -> Cell {
    match (value, status) {
        (Value::Null, Some(ValueStatus::Scheduled)) => dim_cell("scheduled"),
        (Value::Null, Some(ValueStatus::Skipped)) => dim_cell("skipped"),
        (Value::Null, _) => dim_cell("-"),
        (value, _) => Cell::new(value),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
