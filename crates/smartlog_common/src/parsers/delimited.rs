//! Parser for delimited text exports (`;`-separated by default).
//!
//! ```text
//! Kanban No;Part No;Part Name;Supplier / Exporter Name;Stock Overall
//! 105D;17801-0Y040;AIR CLEANER;SUGITY;248
//! ```
//!
//! Fields may be wrapped in double quotes to carry the delimiter; a doubled
//! quote inside a quoted field is a literal quote. Short rows are padded with
//! empty values, surplus values are dropped.

use crate::error::DatasetError;

/// One data row as `(header, value)` pairs in header order
pub type DelimitedRow = Vec<(String, String)>;

/// Parse a header-driven delimited document.
///
/// Blank lines are skipped. A UTF-8 BOM on the header is ignored.
pub fn parse_delimited(text: &str, delimiter: char) -> Result<Vec<DelimitedRow>, DatasetError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or(DatasetError::Empty)?;
    let headers: Vec<String> = split_line(header_line.trim_start_matches('\u{feff}'), delimiter)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DatasetError::MalformedRow {
            line: 1,
            reason: "header row has no column names".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (line_idx, line) in lines {
        let mut values = split_line(line, delimiter).into_iter();
        let row: DelimitedRow = headers
            .iter()
            .map(|header| {
                let value = values.next().unwrap_or_default();
                (header.clone(), value.trim().to_string())
            })
            .filter(|(header, _)| !header.is_empty())
            .collect();

        if row.iter().all(|(_, v)| v.is_empty()) {
            tracing::debug!("Skipping empty row at line {}", line_idx + 1);
            continue;
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Split one line on `delimiter`, honouring double-quoted fields
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}Kanban No;Part No;Supplier / Exporter Name;Stock Overall\n\
                          105D;17801-0Y040;SUGITY;248\n\
                          \n\
                          106E;\"A;B\";\"PT \"\"X\"\"\";12\n";

    #[test]
    fn test_parse_header_and_rows() {
        let rows = parse_delimited(SAMPLE, ';').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], ("Kanban No".to_string(), "105D".to_string()));
        assert_eq!(rows[0][3].1, "248");
        assert_eq!(rows[1][1].1, "A;B");
        assert_eq!(rows[1][2].1, "PT \"X\"");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let rows = parse_delimited("a;b;c\n1;2\n", ';').unwrap();
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0][2], ("c".to_string(), String::new()));
    }

    #[test]
    fn test_other_delimiter() {
        let rows = parse_delimited("a,b\n1,2\n", ',').unwrap();
        assert_eq!(rows[0][1].1, "2");
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(parse_delimited("\n  \n", ';'), Err(DatasetError::Empty)));
    }

    #[test]
    fn test_blank_header_is_malformed() {
        assert!(matches!(
            parse_delimited(";;\n1;2;3\n", ';'),
            Err(DatasetError::MalformedRow { line: 1, .. })
        ));
    }

    #[test]
    fn test_split_line_plain() {
        assert_eq!(split_line("x;;y", ';'), vec!["x", "", "y"]);
    }
}
