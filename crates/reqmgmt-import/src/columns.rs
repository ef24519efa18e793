//! # Column Layout
//!
//! Maps worksheet columns to declared fields. Two strategies exist:
//!
//! - [`ColumnMapping::ByHeader`] (default): each field is located by its
//!   title in the header row. Titles are compared after normalization
//!   (whitespace removed, full-width parentheses folded to ASCII), so
//!   `总评估用时 (小时)` finds `总评估用时（小时）`. A missing key column is
//!   fatal; any other missing column is read as absent.
//! - [`ColumnMapping::Positional`]: field `i` is column `i`, whatever the
//!   header row says. The sheet still needs a header row: the first
//!   non-empty row is consumed as titles in both modes.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use calamine::Data;
use reqmgmt_core::FieldRecord;
use serde::{Deserialize, Serialize};

use crate::cell;
use crate::error::ImportError;

static EMPTY_CELL: Data = Data::Empty;

/// Strategy for matching worksheet columns to declared fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnMapping {
    /// Locate each field by its normalized title in the header row.
    #[default]
    ByHeader,
    /// Field `i` reads column `i`. The first non-empty row is still taken as
    /// the header row and never imported.
    Positional,
}

impl fmt::Display for ColumnMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ByHeader => "by-header",
            Self::Positional => "positional",
        })
    }
}

impl FromStr for ColumnMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "by-header" | "header" => Ok(Self::ByHeader),
            "positional" | "position" => Ok(Self::Positional),
            other => Err(format!(
                "unknown column mapping '{other}' (expected 'by-header' or 'positional')"
            )),
        }
    }
}

/// Canonical form of a column title.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '（' => '(',
            '）' => ')',
            other => other,
        })
        .collect()
}

/// Resolved worksheet column for each declared field of a record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Column offset within the row per field, in `FIELDS` order.
    columns: Vec<Option<usize>>,
}

impl ColumnLayout {
    /// Resolve the layout of `T` against a header row.
    pub fn resolve<T: FieldRecord>(
        header_row: &[Data],
        mapping: ColumnMapping,
    ) -> Result<Self, ImportError> {
        match mapping {
            ColumnMapping::Positional => Ok(Self {
                columns: (0..T::FIELDS.len()).map(Some).collect(),
            }),
            ColumnMapping::ByHeader => Self::by_header::<T>(header_row),
        }
    }

    fn by_header<T: FieldRecord>(header_row: &[Data]) -> Result<Self, ImportError> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (index, title) in header_row.iter().enumerate() {
            if let Some(text) = cell::text(title) {
                positions.entry(normalize_title(&text)).or_insert(index);
            }
        }

        let mut columns = Vec::with_capacity(T::FIELDS.len());
        for spec in T::FIELDS {
            let found = positions.get(&normalize_title(spec.title)).copied();
            if found.is_none() {
                if T::is_key(spec) {
                    return Err(ImportError::MissingColumn(spec.title));
                }
                tracing::warn!(
                    kind = T::KIND,
                    column = spec.title,
                    "column not present in header row, values will be empty"
                );
            }
            columns.push(found);
        }
        Ok(Self { columns })
    }

    /// The cell of the field at `index` in `row`. Unresolved columns and
    /// columns past the end of the row read as empty.
    pub fn cell<'r>(&self, row: &'r [Data], index: usize) -> &'r Data {
        self.column(index)
            .and_then(|c| row.get(c))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Column offset resolved for the field at `index`.
    pub fn column(&self, index: usize) -> Option<usize> {
        self.columns.get(index).copied().flatten()
    }

    /// Number of declared fields that were located.
    pub fn resolved(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqmgmt_core::{RequirementDetail, RequirementHeader};

    fn titles(names: &[&str]) -> Vec<Data> {
        names.iter().map(|n| Data::String((*n).to_string())).collect()
    }

    #[test]
    fn normalization_folds_parentheses_and_whitespace() {
        assert_eq!(normalize_title(" 总评估用时 （小时） "), "总评估用时(小时)");
        assert_eq!(normalize_title("评估用时(h)"), "评估用时(h)");
    }

    #[test]
    fn mapping_parses_from_str() {
        assert_eq!("by-header".parse::<ColumnMapping>(), Ok(ColumnMapping::ByHeader));
        assert_eq!("Positional".parse::<ColumnMapping>(), Ok(ColumnMapping::Positional));
        assert!("columns".parse::<ColumnMapping>().is_err());
        assert_eq!(ColumnMapping::default().to_string(), "by-header");
    }

    #[test]
    fn header_titles_resolve_in_any_order() {
        let row = titles(&["项目名称", "需求评估单号", "总评估用时(小时)"]);
        let layout = ColumnLayout::resolve::<RequirementHeader>(&row, ColumnMapping::ByHeader)
            .unwrap();
        assert_eq!(layout.column(0), Some(1));
        assert_eq!(layout.column(1), Some(0));
        let hours = RequirementHeader::FIELDS
            .iter()
            .position(|f| f.name == "total_eval_hours")
            .unwrap();
        assert_eq!(layout.column(hours), Some(2));
        assert_eq!(layout.resolved(), 3);

        let data = titles(&["Apollo", "REQ-1"]);
        assert_eq!(layout.cell(&data, 0), &Data::String("REQ-1".into()));
        assert_eq!(layout.cell(&data, hours), &Data::Empty);
        assert_eq!(layout.cell(&data, 5), &Data::Empty);
    }

    #[test]
    fn missing_key_column_is_fatal() {
        let row = titles(&["需求评估单号", "项目名称"]);
        let err = ColumnLayout::resolve::<RequirementDetail>(&row, ColumnMapping::ByHeader)
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("需求名称")));
    }

    #[test]
    fn positional_ignores_titles() {
        let layout =
            ColumnLayout::resolve::<RequirementDetail>(&[], ColumnMapping::Positional).unwrap();
        assert_eq!(layout.resolved(), RequirementDetail::FIELDS.len());
        assert_eq!(layout.column(12), Some(12));
    }
}
