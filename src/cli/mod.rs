//! Terminal rendering for record listings.

use serde::Serialize;
use serde_json::Value;

const MAX_COL_WIDTH: usize = 40;

/// True when `GHCS_OUTPUT=json` asks for raw JSON instead of tables.
pub fn json_output() -> bool {
    std::env::var("GHCS_OUTPUT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false)
}

/// Print records as a table over `columns` (camelCase field names), or as JSON.
pub fn print_records<T: Serialize>(records: &[T], columns: &[&str]) -> serde_json::Result<()> {
    let val = serde_json::to_value(records)?;
    if json_output() {
        println!("{}", serde_json::to_string_pretty(&val)?);
        return Ok(());
    }
    let rows: Vec<Vec<String>> = val
        .as_array()
        .map(|arr| arr.iter().map(|rec| columns.iter().map(|c| cell_text(rec.get(*c))).collect()).collect())
        .unwrap_or_default();
    if rows.is_empty() {
        println!("(no records)");
    } else {
        print!("{}", render_table(columns, &rows));
        println!("rows: {}", rows.len());
    }
    Ok(())
}

/// Print a single record as `field: value` lines.
pub fn print_record<T: Serialize>(record: &T) -> serde_json::Result<()> {
    let val = serde_json::to_value(record)?;
    if json_output() {
        println!("{}", serde_json::to_string_pretty(&val)?);
        return Ok(());
    }
    if let Value::Object(map) = &val {
        let width = map.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        for (k, v) in map {
            println!("{:width$}  {}", k, cell_text(Some(v)), width = width);
        }
    }
    Ok(())
}

pub fn render_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count().min(MAX_COL_WIDTH)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(columns.len()) {
            widths[i] = widths[i].max(cell.chars().count().min(MAX_COL_WIDTH));
        }
    }
    let header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let sep = separator(&widths);
    let mut out = String::new();
    for line in [&sep, &row_line(&header, &widths), &sep] {
        out.push_str(line);
        out.push('\n');
    }
    for r in rows {
        out.push_str(&row_line(r, &widths));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn cell_text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => if *b { "yes".into() } else { "no".into() },
        Some(other) => other.to_string(),
    }
}

fn separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(w + 2));
        s.push('+');
    }
    s
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = truncate(cells.get(i).map(String::as_str).unwrap_or(""), *w);
        let pad = " ".repeat(w.saturating_sub(cell.chars().count()));
        if is_numeric_like(&cell) {
            s.push_str(&format!(" {}{} |", pad, cell));
        } else {
            s.push_str(&format!(" {}{} |", cell, pad));
        }
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

// crude: right-align anything that looks like a number
fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty() && st.chars().any(|c| c.is_ascii_digit()) && st.chars().all(|c| c.is_ascii_digit() || ".-+".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_aligned_table() {
        let rows = vec![
            vec!["Rosa Vidal".to_string(), "83".to_string()],
            vec!["Li".to_string(), "7".to_string()],
        ];
        let out = render_table(&["fullName", "age"], &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "+------------+-----+");
        assert_eq!(lines[1], "| fullName   | age |");
        assert_eq!(lines[3], "| Rosa Vidal |  83 |");
        assert_eq!(lines[4], "| Li         |   7 |");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn long_cells_are_truncated() {
        let long = "x".repeat(60);
        assert_eq!(truncate(&long, MAX_COL_WIDTH).chars().count(), MAX_COL_WIDTH);
        assert_eq!(cell_text(Some(&Value::Bool(true))), "yes");
        assert_eq!(cell_text(None), "-");
    }
}
