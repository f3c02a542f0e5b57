//! Column cursor for laying out result URLs across a row
//!
//! Columns use A1 letters in bijective base 26: `A` is 1, `Z` is 26,
//! `AA` is 27. The cursor is owned by whoever writes a row's batch and is
//! reset by that caller before each row.

use std::fmt;

use crate::error::PipelineError;
use crate::range::CellRef;
use crate::types::RowIndex;

/// Column number (1-based) of A1 letters, `None` when not pure ASCII letters
#[must_use]
pub fn column_number(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(c.to_ascii_uppercase()) - u32::from('A') + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// A1 letters of a 1-based column number; zero yields an empty string
#[must_use]
pub fn column_letters(mut number: u32) -> String {
    let mut out = Vec::new();
    while number > 0 {
        let rem = (number - 1) % 26;
        // rem < 26, so the cast cannot truncate
        out.push(char::from(b'A' + rem as u8));
        number = (number - 1) / 26;
    }
    out.iter().rev().collect()
}

/// Next column to write within the current row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnCursor {
    start: u32,
    current: u32,
}

impl ColumnCursor {
    /// Create cursor positioned at `start`
    pub fn new(start: &str) -> Result<Self, PipelineError> {
        let start = column_number(start)
            .ok_or_else(|| PipelineError::InvalidRange(format!("bad column letters: {start:?}")))?;
        Ok(Self {
            start,
            current: start,
        })
    }

    /// Current column letters
    #[inline]
    #[must_use]
    pub fn column(&self) -> String {
        column_letters(self.current)
    }

    /// Cell at the current column of `row`
    #[inline]
    #[must_use]
    pub fn cell(&self, sheet: Option<&str>, row: RowIndex) -> CellRef {
        CellRef::new(sheet.map(str::to_string), self.column(), row)
    }

    /// Move one column right
    #[inline]
    pub fn advance(&mut self) {
        self.current += 1;
    }

    /// Return to the starting column
    #[inline]
    pub fn reset(&mut self) {
        self.current = self.start;
    }

    /// Columns advanced since the last reset
    #[inline]
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.current - self.start
    }
}

impl fmt::Display for ColumnCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn letters_and_numbers() {
        assert_eq!(column_number("A"), Some(1));
        assert_eq!(column_number("q"), Some(17));
        assert_eq!(column_number("Z"), Some(26));
        assert_eq!(column_number("AA"), Some(27));
        assert_eq!(column_number("AZ"), Some(52));
        assert_eq!(column_number(""), None);
        assert_eq!(column_number("Q1"), None);

        assert_eq!(column_letters(17), "Q");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(702), "ZZ");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn cursor_advances_and_resets() {
        let mut cursor = ColumnCursor::new("Q").unwrap();
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(cursor.column());
            cursor.advance();
        }
        assert_eq!(seen, vec!["Q", "R", "S"]);
        assert_eq!(cursor.offset(), 3);

        cursor.reset();
        assert_eq!(cursor.column(), "Q");
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn cursor_rolls_past_z() {
        let mut cursor = ColumnCursor::new("Y").unwrap();
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.column(), "AA");
        assert_eq!(cursor.cell(Some("Form Responses 1"), 4).to_string(), "'Form Responses 1'!AA4");
    }

    #[test]
    fn invalid_start_rejected() {
        assert!(ColumnCursor::new("").is_err());
        assert!(ColumnCursor::new("1").is_err());
    }

    proptest! {
        #[test]
        fn advancing_n_columns_lands_on_start_plus_n(start in 1u32..2000, steps in 0u32..500) {
            let mut cursor = ColumnCursor::new(&column_letters(start)).unwrap();
            for _ in 0..steps {
                cursor.advance();
            }
            prop_assert_eq!(column_number(&cursor.column()), Some(start + steps));
        }
    }
}
