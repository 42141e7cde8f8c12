//! Comma-separated tables with a header row.
//!
//! Snapshot cells are account logins, integers and booleans, none of which
//! can contain a comma, so no quoting is ever written. Surrounding double
//! quotes are stripped on read for files produced by other tools.

/// One data row with its 1-based line number in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Row<'a> {
    pub(crate) line: usize,
    pub(crate) cells: Vec<&'a str>,
}

/// Why a table could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableError {
    pub(crate) line: usize,
    pub(crate) message: String,
}

/// Splits `contents` into data rows after checking that the header's first
/// column is `first_column`. Blank lines are ignored.
pub(crate) fn parse<'a>(contents: &'a str, first_column: &str) -> Result<Vec<Row<'a>>, TableError> {
    let mut lines = contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_start_matches('\u{feff}')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) =
        lines.next().ok_or_else(|| TableError { line: 1, message: "missing header row".into() })?;
    let header_cells = split(header);
    if header_cells.first() != Some(&first_column) {
        return Err(TableError {
            line: header_line,
            message: format!("expected header starting with {first_column:?}, found {header:?}"),
        });
    }

    Ok(lines.map(|(line, text)| Row { line, cells: split(text) }).collect())
}

/// Renders a header and rows, one record per line, with a trailing newline.
pub(crate) fn render<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = header.join(",");
    out.push('\n');
    for row in rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn split(line: &str) -> Vec<&str> {
    line.split(',').map(|cell| strip_quotes(cell.trim())).collect()
}

fn strip_quotes(cell: &str) -> &str {
    cell.strip_prefix('"').and_then(|c| c.strip_suffix('"')).unwrap_or(cell)
}
