use super::{Delimiter, Table};

/// Header used when no delimiter is found.
pub const SINGLE_COLUMN_HEADER: &str = "Extracted Text";

/// Reshape recognized text into a [`Table`].
///
/// Lines are trimmed and blank lines dropped. The delimiter is chosen from
/// the first line alone, by [`Delimiter::PRIORITY`]: the first candidate that
/// splits that line into more than one non-empty segment wins. Without a
/// delimiter every line becomes a one-cell row under a single
/// `"Extracted Text"` header.
///
/// Never fails; text without any non-blank line yields an empty table.
pub fn infer_table(text: &str) -> Table {
    let lines: Vec<&str> = text.split('\n').map(str::trim).filter(|line| !line.is_empty()).collect();

    let Some(first) = lines.first() else {
        return Table::default();
    };

    let Some(delimiter) = detect_delimiter(first) else {
        tracing::debug!(lines = lines.len(), "No delimiter detected, using single-column mode");
        return Table::new(
            vec![SINGLE_COLUMN_HEADER.to_string()],
            lines.iter().map(|line| vec![line.to_string()]).collect(),
        );
    };

    let headers = split_cells(first, delimiter);
    let data_lines = if headers.len() > 1 { &lines[1..] } else { &lines[..] };
    let rows: Vec<Vec<String>> = data_lines
        .iter()
        .map(|line| split_cells(line, delimiter))
        .filter(|cells| !cells.is_empty())
        .collect();

    tracing::debug!(
        delimiter = %delimiter,
        columns = headers.len(),
        rows = rows.len(),
        "Inferred table"
    );

    Table {
        headers,
        rows,
        delimiter: Some(delimiter),
    }
}

fn detect_delimiter(line: &str) -> Option<Delimiter> {
    Delimiter::PRIORITY.into_iter().find(|delimiter| {
        let pattern = delimiter.as_str();
        line.contains(pattern) && line.split(pattern).filter(|segment| !segment.trim().is_empty()).count() > 1
    })
}

fn split_cells(line: &str, delimiter: Delimiter) -> Vec<String> {
    line.split(delimiter.as_str())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}
