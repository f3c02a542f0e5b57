//! A1 range and cell references

use std::fmt;
use std::str::FromStr;

use crate::cursor::column_number;
use crate::error::PipelineError;
use crate::types::RowIndex;

/// Reference to a single cell, optionally on a named sheet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Sheet title; `None` targets the first sheet
    pub sheet: Option<String>,
    /// Column letters
    pub column: String,
    /// Row number
    pub row: RowIndex,
}

impl CellRef {
    /// Create cell reference
    #[inline]
    #[must_use]
    pub fn new(sheet: Option<String>, column: impl Into<String>, row: RowIndex) -> Self {
        Self {
            sheet,
            column: column.into(),
            row,
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write_sheet_prefix(f, sheet)?;
        }
        write!(f, "{}{}", self.column, self.row)
    }
}

fn write_sheet_prefix(f: &mut fmt::Formatter<'_>, sheet: &str) -> fmt::Result {
    if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        write!(f, "{sheet}!")
    } else {
        write!(f, "'{}'!", sheet.replace('\'', "''"))
    }
}

/// Two-column range holding wallet addresses and statuses, e.g. `Sheet1!O2:P`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    /// Sheet title
    pub sheet: Option<String>,
    /// Wallet column
    pub start_column: String,
    /// First data row
    pub first_row: RowIndex,
    /// Last column of the range
    pub end_column: String,
    /// Last row, open-ended when absent
    pub last_row: Option<RowIndex>,
}

impl RangeSpec {
    /// Parse an A1 range
    pub fn parse(input: &str) -> Result<Self, PipelineError> {
        let invalid = || PipelineError::InvalidRange(input.to_string());
        let input = input.trim();

        let (sheet, cells) = match input.rfind('!') {
            Some(pos) => {
                let raw = &input[..pos];
                let title = raw
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .map_or_else(|| raw.to_string(), |s| s.replace("''", "'"));
                if title.is_empty() {
                    return Err(invalid());
                }
                (Some(title), &input[pos + 1..])
            }
            None => (None, input),
        };

        let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
        let (start_column, first_row) = split_cell(start).ok_or_else(invalid)?;
        let (end_column, last_row) = split_cell(end).ok_or_else(invalid)?;

        if column_number(&start_column) > column_number(&end_column) {
            return Err(invalid());
        }

        Ok(Self {
            sheet,
            start_column,
            first_row: first_row.unwrap_or(1),
            end_column,
            last_row,
        })
    }

    /// Cell reference on the same sheet as this range
    #[inline]
    #[must_use]
    pub fn cell(&self, column: impl Into<String>, row: RowIndex) -> CellRef {
        CellRef::new(self.sheet.clone(), column, row)
    }

    /// Sheet row of the `offset`-th value row returned for this range
    #[inline]
    #[must_use]
    pub fn row_at(&self, offset: usize) -> RowIndex {
        self.first_row
            .saturating_add(RowIndex::try_from(offset).unwrap_or(RowIndex::MAX))
    }
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self {
            sheet: None,
            start_column: "O".to_string(),
            first_row: 2,
            end_column: "P".to_string(),
            last_row: None,
        }
    }
}

impl FromStr for RangeSpec {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write_sheet_prefix(f, sheet)?;
        }
        write!(f, "{}{}:{}", self.start_column, self.first_row, self.end_column)?;
        if let Some(last) = self.last_row {
            write!(f, "{last}")?;
        }
        Ok(())
    }
}

/// Split `O2` into (`O`, Some(2)); `O` alone has no row
fn split_cell(cell: &str) -> Option<(String, Option<RowIndex>)> {
    let split = cell
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    column_number(letters)?;
    let row = if digits.is_empty() {
        None
    } else {
        let row: RowIndex = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(row)
    };
    Some((letters.to_ascii_uppercase(), row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_range() {
        let range = RangeSpec::parse("O2:P").unwrap();
        assert_eq!(range, RangeSpec::default());
        assert_eq!(range.row_at(0), 2);
        assert_eq!(range.row_at(5), 7);
        assert_eq!(range.to_string(), "O2:P");
    }

    #[test]
    fn parse_sheet_qualified_range() {
        let range = RangeSpec::parse("Form Responses 1!O2:P200").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Form Responses 1"));
        assert_eq!(range.last_row, Some(200));
        assert_eq!(range.to_string(), "'Form Responses 1'!O2:P200");

        let quoted = RangeSpec::parse("'Bob''s sheet'!a3:b").unwrap();
        assert_eq!(quoted.sheet.as_deref(), Some("Bob's sheet"));
        assert_eq!(quoted.start_column, "A");
        assert_eq!(quoted.first_row, 3);
    }

    #[test]
    fn range_without_row_starts_at_one() {
        let range = RangeSpec::parse("L:L").unwrap();
        assert_eq!(range.first_row, 1);
        assert_eq!(range.end_column, "L");
    }

    #[test]
    fn reject_malformed_ranges() {
        for bad in ["", "!O2:P", "2:3", "P2:O", "O0:P", "O2:P-1"] {
            assert!(RangeSpec::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn cell_display() {
        let range = RangeSpec::parse("Sheet1!O2:P").unwrap();
        assert_eq!(range.cell("P", 9).to_string(), "Sheet1!P9");
        assert_eq!(CellRef::new(None, "Q", 3).to_string(), "Q3");
    }
}
