//! Result table assembly
//!
//! Normalized rows are appended page by page, in page-index order, and
//! sealed into an immutable [`ResultTable`].

use crate::error::{Error, Progress, Result};
use crate::schema::{CellValue, NormalizedRow, RecordSchema};

/// Sealed table of normalized rows
///
/// Rows appear in page order, then in-page order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    schema: RecordSchema,
    rows: Vec<NormalizedRow>,
    page_row_counts: Vec<usize>,
}

impl ResultTable {
    pub(crate) fn from_parts(
        schema: RecordSchema,
        rows: Vec<NormalizedRow>,
        page_row_counts: Vec<usize>,
    ) -> Self {
        Self {
            schema,
            rows,
            page_row_counts,
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_pages(&self) -> usize {
        self.page_row_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows contributed by each page, indexed by page
    pub fn page_row_counts(&self) -> &[usize] {
        &self.page_row_counts
    }

    /// All values of one column, by output name
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let index = self.schema.index_of(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }
}

/// Accumulates pages into a [`ResultTable`]
#[derive(Debug)]
pub struct TableAssembler {
    schema: RecordSchema,
    rows: Vec<NormalizedRow>,
    page_row_counts: Vec<usize>,
    sealed: bool,
}

impl TableAssembler {
    pub fn new(schema: RecordSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            page_row_counts: Vec::new(),
            sealed: false,
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Index the next appended page must carry
    pub fn next_index(&self) -> usize {
        self.page_row_counts.len()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Pages and rows appended so far
    pub fn progress(&self) -> Progress {
        Progress::new(self.page_row_counts.len(), self.rows.len())
    }

    /// Append the rows of page `index`
    ///
    /// Pages must arrive in consecutive index order starting at 0. Rows must
    /// match the schema's width. Nothing is appended when validation fails.
    pub fn append_page(&mut self, index: usize, rows: Vec<NormalizedRow>) -> Result<()> {
        if self.sealed {
            return Err(Error::table(format!(
                "cannot append page {index}: table is sealed"
            )));
        }
        let expected = self.next_index();
        if index != expected {
            return Err(Error::table(format!(
                "page {index} appended out of order; expected page {expected}"
            )));
        }
        let width = self.schema.len();
        if let Some((pos, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(Error::table(format!(
                "page {index} row {pos} has {} cells; schema has {width} columns",
                row.len()
            )));
        }

        self.page_row_counts.push(rows.len());
        self.rows.extend(rows);
        Ok(())
    }

    /// Seal the assembler and hand out the table
    ///
    /// Later appends, and a second finalize, fail.
    pub fn finalize(&mut self) -> Result<ResultTable> {
        if self.sealed {
            return Err(Error::table("table is already finalized"));
        }
        self.sealed = true;
        Ok(ResultTable::from_parts(
            self.schema.clone(),
            std::mem::take(&mut self.rows),
            std::mem::take(&mut self.page_row_counts),
        ))
    }
}
