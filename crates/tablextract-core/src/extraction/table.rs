//! Reconstruct tables from `pdftotext -layout` output.
//!
//! Layout text keeps columns apart with runs of spaces. A table is a block
//! of consecutive lines that each split into at least two fields. Column
//! left edges come from clustering the start offsets of the fields in the
//! data rows, and every field is then placed in the last column that starts
//! at or before it.

use crate::extraction::PageContent;

/// Start offsets closer than this (in characters) belong to the same column.
const COLUMN_TOLERANCE: usize = 4;

/// Below this many data-row fields, header rows also vote on columns.
const MIN_DATA_FIELDS: usize = 5;

/// A table found on a page, as a grid of cell text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTable {
    pub page_number: usize,
    pub index_on_page: usize,
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

/// A piece of text on a layout line and the column it starts at.
#[derive(Debug, Clone, PartialEq)]
struct Field {
    start: usize,
    text: String,
}

/// Split a layout line into fields separated by two or more spaces.
fn split_fields(line: &str) -> Vec<Field> {
    let chars: Vec<char> = line.chars().collect();
    let mut fields = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        while end < chars.len() {
            let gap = chars[end..]
                .iter()
                .take_while(|c| c.is_whitespace())
                .count();
            if gap >= 2 || end + gap >= chars.len() {
                break;
            }
            end += gap.max(1);
        }
        let text: String = chars[start..end].iter().collect();
        fields.push(Field {
            start,
            text: text.trim_end().to_string(),
        });
        i = end;
    }

    fields
}

/// Find every table on every page.
pub fn find_tables(pages: &[PageContent]) -> Vec<ExtractedTable> {
    let mut tables = Vec::new();

    for page in pages {
        let mut block: Vec<Vec<Field>> = Vec::new();
        let mut index_on_page = 0;

        for line in page.lines.iter().map(String::as_str).chain(std::iter::once("")) {
            let fields = split_fields(line);
            if fields.len() >= 2 {
                block.push(fields);
                continue;
            }
            if let Some(rows) = build_table(&block) {
                index_on_page += 1;
                tables.push(ExtractedTable {
                    page_number: page.page_number,
                    index_on_page,
                    rows,
                });
            }
            block.clear();
        }
    }

    log::debug!("found {} table(s) across {} page(s)", tables.len(), pages.len());
    tables
}

/// Lay a block of split lines onto a common set of columns.
fn build_table(block: &[Vec<Field>]) -> Option<Vec<Vec<String>>> {
    if block.len() < 2 {
        return None;
    }

    let data_starts: Vec<usize> = block[1..].iter().flatten().map(|f| f.start).collect();
    let mut starts = if data_starts.len() >= MIN_DATA_FIELDS {
        data_starts
    } else {
        block.iter().flatten().map(|f| f.start).collect()
    };
    starts.sort_unstable();

    let columns = cluster(&starts);
    if columns.len() < 2 {
        return None;
    }

    let rows = block
        .iter()
        .map(|fields| {
            let mut row = vec![String::new(); columns.len()];
            for field in fields {
                let col = column_for(&columns, field.start);
                if row[col].is_empty() {
                    row[col] = field.text.clone();
                } else {
                    row[col].push(' ');
                    row[col].push_str(&field.text);
                }
            }
            row
        })
        .collect();

    Some(rows)
}

/// Group sorted start offsets into column left edges.
fn cluster(sorted: &[usize]) -> Vec<usize> {
    let mut columns = Vec::new();
    let mut last: Option<usize> = None;

    for &x in sorted {
        match last {
            Some(prev) if x - prev <= COLUMN_TOLERANCE => {}
            _ => columns.push(x),
        }
        last = Some(x);
    }

    columns
}

/// The last column whose left edge is at or before `start`, allowing for
/// the clustering tolerance.
fn column_for(columns: &[usize], start: usize) -> usize {
    columns
        .iter()
        .rposition(|&left| left <= start + COLUMN_TOLERANCE)
        .unwrap_or(0)
}
