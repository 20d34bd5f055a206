//! Paginated table over borrowed records.
//!
//! A [`Table`] owns no data: it borrows a slice, a list of [`Column`]s and a
//! page size, and keeps only the current page index. Page requests outside
//! the valid range are clamped; nothing here returns an error.

use std::fmt;

use serde::Serialize;

/// A header label paired with a cell renderer.
pub struct Column<'a, T> {
    header: String,
    cell: Box<dyn Fn(&T) -> String + 'a>,
}

impl<'a, T> Column<'a, T> {
    pub fn new<R, F>(header: impl Into<String>, cell: F) -> Self
    where
        R: fmt::Display,
        F: Fn(&T) -> R + 'a,
    {
        Self {
            header: header.into(),
            cell: Box::new(move |row: &T| cell(row).to_string()),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn render(&self, row: &T) -> String {
        (self.cell)(row)
    }
}

impl<T> fmt::Debug for Column<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column").field("header", &self.header).finish_non_exhaustive()
    }
}

pub struct Table<'a, T> {
    data: &'a [T],
    columns: Vec<Column<'a, T>>,
    rows_per_page: usize,
    page: usize,
}

impl<'a, T> Table<'a, T> {
    /// A `rows_per_page` of zero is treated as one.
    pub fn new(data: &'a [T], columns: Vec<Column<'a, T>>, rows_per_page: usize) -> Self {
        Self {
            data,
            columns,
            rows_per_page: rows_per_page.max(1),
            page: 0,
        }
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// ceil(len / rows_per_page); zero for empty data.
    pub fn page_count(&self) -> usize {
        self.data.len().div_ceil(self.rows_per_page)
    }

    /// Zero-based index of the current page.
    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Jumps to `page`, clamped to `[0, page_count)`; returns the page
    /// actually selected.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        let last = self.page_count().saturating_sub(1);
        self.page = page.min(last);
        self.page
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to_page(self.page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> usize {
        self.go_to_page(self.page.saturating_sub(1))
    }

    /// Swap in a new record list, re-clamping the current page.
    pub fn set_data(&mut self, data: &'a [T]) {
        self.data = data;
        self.go_to_page(self.page);
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(Column::header).collect()
    }

    /// Records on the current page.
    pub fn page_rows(&self) -> &'a [T] {
        self.pages().nth(self.page).unwrap_or(&[])
    }

    /// Every page in order; concatenated they are exactly the input data.
    pub fn pages(&self) -> std::slice::Chunks<'a, T> {
        self.data.chunks(self.rows_per_page)
    }

    /// Run the current page through each column's cell renderer.
    pub fn render(&self) -> RenderedPage {
        let rows = self
            .page_rows()
            .iter()
            .map(|row| self.columns.iter().map(|col| col.render(row)).collect())
            .collect();

        RenderedPage {
            headers: self.columns.iter().map(|c| c.header.clone()).collect(),
            rows,
            page: self.page,
            page_count: self.page_count(),
            total_rows: self.data.len(),
        }
    }
}

/// One rendered page. `Display` lays it out as an aligned text table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub page: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

impl RenderedPage {
    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }
}

impl fmt::Display for RenderedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.column_widths();

        let write_row = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| format!("{cell:<w$}"))
                .collect();
            writeln!(f, "{}", line.join(" | ").trim_end())
        };

        write_row(f, self.headers.as_slice())?;
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;
        for row in &self.rows {
            write_row(f, row.as_slice())?;
        }

        if self.page_count == 0 {
            write!(f, "(no rows)")
        } else {
            write!(
                f,
                "page {} of {} ({} rows)",
                self.page + 1,
                self.page_count,
                self.total_rows
            )
        }
    }
}
