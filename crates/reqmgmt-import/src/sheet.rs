//! # Worksheet Reading
//!
//! Decodes an uploaded workbook (xlsx, xls, xlsb or ods, detected from the
//! bytes) and reads the first worksheet. The first non-empty row is the
//! header row; every later row is a data row. Row numbers in log lines are
//! 1-based worksheet row numbers, so the header row of a sheet starting at
//! A1 is row 1.
//!
//! Data rows are parsed lazily into [`RowBatch`]es of bounded size, so a
//! large sheet never holds more than one batch of typed records at once.

use std::io::Cursor;
use std::marker::PhantomData;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use reqmgmt_core::FieldRecord;
use thiserror::Error;

use crate::cell::{self, CellError};
use crate::columns::ColumnLayout;
use crate::error::ImportError;

/// A data row that could not be turned into a record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("row {row}, column '{column}': {source}")]
    Cell {
        row: u32,
        column: &'static str,
        #[source]
        source: CellError,
    },

    #[error("row {row}: required value missing in {}", .columns.join(", "))]
    BlankKey {
        row: u32,
        columns: Vec<&'static str>,
    },
}

/// The first worksheet of an uploaded workbook.
#[derive(Debug, Clone)]
pub struct Worksheet {
    range: Range<Data>,
}

impl Worksheet {
    /// Decode workbook bytes and take the first worksheet.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImportError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ImportError::NoWorksheet)??;
        Ok(Self::from_range(range))
    }

    pub fn from_range(range: Range<Data>) -> Self {
        Self { range }
    }

    /// Worksheet row number of the first row of the used range.
    fn first_row_number(&self) -> u32 {
        self.range.start().map_or(1, |(row, _)| row + 1)
    }

    /// Number of rows in the used range, header included.
    pub fn height(&self) -> usize {
        self.range.height()
    }

    /// Position (within the used range) and cells of the header row.
    pub fn header_row(&self) -> Result<(usize, &[Data]), ImportError> {
        self.range
            .rows()
            .enumerate()
            .find(|(_, cells)| !is_empty_row(cells))
            .ok_or(ImportError::MissingHeaderRow)
    }

    /// Lazily parse the data rows below the header row.
    pub fn batches<'a, T: FieldRecord>(
        &'a self,
        layout: &'a ColumnLayout,
        batch_size: usize,
    ) -> Result<RowBatches<'a, T>, ImportError> {
        let (header_index, _) = self.header_row()?;
        let first = self.first_row_number();
        let rows = self
            .range
            .rows()
            .enumerate()
            .skip(header_index + 1)
            .map(move |(index, cells)| (first + index as u32, cells));

        Ok(RowBatches {
            rows: Box::new(rows),
            layout,
            batch_size: batch_size.max(1),
            _kind: PhantomData,
        })
    }
}

/// Whether every cell of the row is empty.
pub fn is_empty_row(cells: &[Data]) -> bool {
    cells.iter().all(cell::is_empty)
}

/// Parse one data row. Empty rows yield `Ok(None)`.
pub fn parse_row<T: FieldRecord>(
    layout: &ColumnLayout,
    cells: &[Data],
    row: u32,
) -> Result<Option<T>, RowError> {
    if is_empty_row(cells) {
        return Ok(None);
    }

    let mut record = T::default();
    {
        let slots = record.slots_mut();
        for (index, (spec, slot)) in T::FIELDS.iter().zip(slots).enumerate() {
            let data = cell::coerce(layout.cell(cells, index), spec.kind).map_err(|source| {
                RowError::Cell {
                    row,
                    column: spec.title,
                    source,
                }
            })?;
            slot.store(data);
        }
    }

    let blank = record.blank_keys();
    if !blank.is_empty() {
        return Err(RowError::BlankKey { row, columns: blank });
    }
    Ok(Some(record))
}

/// Up to `batch_size` parsed records plus the number of rows rejected while
/// filling them.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

/// Iterator over the [`RowBatch`]es of a worksheet.
pub struct RowBatches<'a, T> {
    rows: Box<dyn Iterator<Item = (u32, &'a [Data])> + Send + 'a>,
    layout: &'a ColumnLayout,
    batch_size: usize,
    _kind: PhantomData<fn() -> T>,
}

impl<T: FieldRecord> Iterator for RowBatches<'_, T> {
    type Item = RowBatch<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = RowBatch {
            records: Vec::with_capacity(self.batch_size),
            skipped: 0,
        };
        let mut consumed = false;

        while batch.records.len() < self.batch_size {
            let Some((row, cells)) = self.rows.next() else {
                break;
            };
            consumed = true;
            match parse_row::<T>(self.layout, cells, row) {
                Ok(Some(record)) => batch.records.push(record),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(kind = T::KIND, error = %err, "skipping spreadsheet row");
                    batch.skipped += 1;
                }
            }
        }

        consumed.then_some(batch)
    }
}
