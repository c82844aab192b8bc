use crate::model::ColumnGroup;

/// Only the first few rows of a table can hold headers.
const MAX_HEADER_SCAN: usize = 3;

/// How many rows below an empty header cell are checked for data.
const LOOKAHEAD_ROWS: usize = 2;

/// Find header cells that span several columns.
///
/// A filled cell spans the empty cells to its right as long as each of them
/// has data in one of the next two rows. Row 0 is always scanned; a later
/// row is scanned only when the row above it held a group, so grouped
/// headers stack and plain data rows are left alone.
pub fn detect_column_groups(grid: &[Vec<String>]) -> Vec<ColumnGroup> {
    let mut groups = Vec::new();
    if grid.len() < 2 {
        return groups;
    }

    for (r, row) in grid.iter().enumerate().take(MAX_HEADER_SCAN) {
        if r > 0 && !groups.iter().any(|g: &ColumnGroup| g.row == r - 1) {
            break;
        }

        let mut c = 0;
        while c < row.len() {
            let label = row[c].trim();
            if label.is_empty() {
                c += 1;
                continue;
            }

            let mut next = c + 1;
            while next < row.len() && row[next].trim().is_empty() && has_data_below(grid, r, next)
            {
                next += 1;
            }

            if next - c > 1 {
                groups.push(ColumnGroup {
                    row: r,
                    first_col: c,
                    last_col: next - 1,
                    label: label.to_string(),
                });
            }
            c = next;
        }
    }

    if !groups.is_empty() {
        log::debug!("detected {} grouped header cell(s)", groups.len());
    }
    groups
}

fn has_data_below(grid: &[Vec<String>], row: usize, col: usize) -> bool {
    grid.iter()
        .skip(row + 1)
        .take(LOOKAHEAD_ROWS)
        .any(|r| r.get(col).is_some_and(|v| !v.trim().is_empty()))
}
