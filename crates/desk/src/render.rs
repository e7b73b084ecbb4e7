use crossterm::style::Stylize;
use serde_json::Value;
use switchboard_shared::{RecordSet, Rendered};

const MAX_CELL_WIDTH: usize = 40;

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn clip(text: &str) -> String {
    let text = text.replace('\n', " ");
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text;
    }
    let mut clipped: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
    clipped.push('…');
    clipped
}

/// Plain-text grid: a header row, a rule, then one line per record. Missing
/// cells are blank.
pub fn format_table(records: &RecordSet) -> String {
    let columns = records.columns();
    if columns.is_empty() {
        return format!("({} rows)", records.len());
    }

    let rows: Vec<Vec<String>> = records
        .rows()
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| clip(&cell_text(RecordSet::cell(row, c))))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(clip(column).chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(columns.iter().map(|c| clip(c)).collect()));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.extend(rows.into_iter().map(line));
    out.join("\n")
}

pub fn print_rendered(rendered: &Rendered) {
    match rendered {
        Rendered::Table(records) => println!("{}", format_table(records)),
        Rendered::Json(value) => match serde_json::to_string_pretty(value) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", value),
        },
        Rendered::Text(text) => println!("{}", text),
    }
}

pub fn heading(text: &str) {
    println!("{}", text.bold().cyan());
}

pub fn warning(text: &str) {
    println!("{}", text.yellow());
}

pub fn error(err: &anyhow::Error) {
    eprintln!("{}", format!("Error: {:#}", err).red());
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn table_aligns_columns_and_blanks_missing_cells() {
        let records = RecordSet::from_value(&json!([
            {"name": "Ann", "age": 31},
            {"name": "Bartholomew", "city": "Porto"}
        ]))
        .unwrap();

        let table = format_table(&records);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "name        | age | city");
        assert_eq!(lines[1], "------------+-----+------");
        assert_eq!(lines[2], "Ann         | 31  |");
        assert_eq!(lines[3], "Bartholomew |     | Porto");
    }

    #[test]
    fn long_cells_are_clipped() {
        let records = RecordSet::from_value(&json!([{"note": "x".repeat(100)}])).unwrap();
        let table = format_table(&records);
        let last = table.lines().last().unwrap();
        assert_eq!(last.chars().count(), MAX_CELL_WIDTH);
        assert!(last.ends_with('…'));
    }

    #[test]
    fn empty_table() {
        assert_eq!(format_table(&RecordSet::default()), "(0 rows)");
    }
}
