//! Console run summary.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::RunResult;

pub fn print_summary(result: &RunResult) {
    println!("Client: {}", result.client);
    println!("Output: {}", result.output_dir.display());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Records"),
        header_cell("Artifacts"),
        header_cell("Findings"),
        header_cell("Duration (ms)"),
    ]);
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);

    let mut total_records = 0usize;
    let mut total_artifacts = 0usize;
    for stage in &result.stages {
        total_records += stage.records;
        total_artifacts += stage.output_files.len();
        table.add_row(vec![
            Cell::new(&stage.stage)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(stage.records),
            Cell::new(stage.output_files.len()),
            count_cell(stage.findings.len(), Color::Yellow),
            Cell::new(stage.duration_ms),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_records).add_attribute(Attribute::Bold),
        Cell::new(total_artifacts).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");

    print_artifacts(result);
    print_findings(result);
    if !result.errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
}

fn print_artifacts(result: &RunResult) {
    let paths: Vec<_> = result
        .stages
        .iter()
        .flat_map(|stage| stage.output_files.iter())
        .collect();
    if paths.is_empty() {
        return;
    }
    println!("Artifacts:");
    for path in paths {
        println!("- {}", path.display());
    }
}

fn print_findings(result: &RunResult) {
    let findings: Vec<_> = result
        .stages
        .iter()
        .flat_map(|stage| {
            stage
                .findings
                .iter()
                .map(move |finding| (stage.stage.as_str(), finding))
        })
        .collect();
    if findings.is_empty() {
        return;
    }
    println!("Findings:");
    for (stage, finding) in findings {
        println!("- [{stage}] {finding}");
    }
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

fn count_cell(value: usize, color: Color) -> Cell {
    if value > 0 {
        Cell::new(value).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(value)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
