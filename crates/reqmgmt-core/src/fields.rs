//! # Declared Field Tables
//!
//! Each record kind declares its business attributes once, in a fixed order,
//! with a machine name (the SQL column), a display title (the spreadsheet
//! header text and the markdown label) and a value kind. The importer, the
//! exporter and the SQL engine all walk the same table through
//! [`FieldRecord`].
//!
//! Bookkeeping columns (`id`, `remark`, `created_at`, `updated_at`) are not
//! part of the table: they never come from a spreadsheet.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Rendering and parsing format for timestamps (`yyyy-MM-dd HH:mm:ss`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Value kind of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Decimal amount (hours, person-days).
    Decimal,
    /// Zone-less local date-time.
    Timestamp,
}

/// One entry of a declared field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Machine name, identical to the SQL column name.
    pub name: &'static str,
    /// Display title used as spreadsheet header text and markdown label.
    pub title: &'static str,
    /// Value kind.
    pub kind: FieldKind,
}

/// Borrowed view of one field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Decimal(Option<Decimal>),
    Timestamp(Option<NaiveDateTime>),
}

impl FieldValue<'_> {
    /// Absent, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(v) => v.map_or(true, |s| s.trim().is_empty()),
            Self::Decimal(v) => v.is_none(),
            Self::Timestamp(v) => v.is_none(),
        }
    }
}

/// Renders the value for human consumption. Absent values render as the
/// empty string; decimals in plain notation without trailing zeros.
impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(Some(s)) => f.write_str(s),
            Self::Decimal(Some(d)) => write!(f, "{}", d.normalize()),
            Self::Timestamp(Some(t)) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            Self::Text(None) | Self::Decimal(None) | Self::Timestamp(None) => Ok(()),
        }
    }
}

/// Owned field value, produced by the importer and assigned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldData {
    Text(Option<String>),
    Decimal(Option<Decimal>),
    Timestamp(Option<NaiveDateTime>),
}

impl FieldData {
    /// The absent value of the given kind.
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => Self::Text(None),
            FieldKind::Decimal => Self::Decimal(None),
            FieldKind::Timestamp => Self::Timestamp(None),
        }
    }
}

/// A struct field that can hold a declared value.
///
/// Assigning data of a different kind leaves the slot untouched.
pub trait FieldSlot {
    fn view(&self) -> FieldValue<'_>;
    fn store(&mut self, data: FieldData);
}

impl FieldSlot for String {
    fn view(&self) -> FieldValue<'_> {
        FieldValue::Text(Some(self.as_str()))
    }

    fn store(&mut self, data: FieldData) {
        if let FieldData::Text(v) = data {
            *self = v.unwrap_or_default();
        }
    }
}

impl FieldSlot for Option<String> {
    fn view(&self) -> FieldValue<'_> {
        FieldValue::Text(self.as_deref())
    }

    fn store(&mut self, data: FieldData) {
        if let FieldData::Text(v) = data {
            *self = v;
        }
    }
}

impl FieldSlot for Option<Decimal> {
    fn view(&self) -> FieldValue<'_> {
        FieldValue::Decimal(*self)
    }

    fn store(&mut self, data: FieldData) {
        if let FieldData::Decimal(v) = data {
            *self = v;
        }
    }
}

impl FieldSlot for Option<NaiveDateTime> {
    fn view(&self) -> FieldValue<'_> {
        FieldValue::Timestamp(*self)
    }

    fn store(&mut self, data: FieldData) {
        if let FieldData::Timestamp(v) = data {
            *self = v;
        }
    }
}

/// A record kind with a declared field table.
pub trait FieldRecord: Default + Clone + Send + Sync + 'static {
    /// Human-readable name of the record kind, for log lines.
    const KIND: &'static str;

    /// Declared fields, in canonical order.
    const FIELDS: &'static [FieldSpec];

    /// Names of the mandatory key fields.
    const KEYS: &'static [&'static str];

    /// Field values in [`Self::FIELDS`] order.
    fn values(&self) -> Vec<FieldValue<'_>>;

    /// Mutable slots in [`Self::FIELDS`] order.
    fn slots_mut(&mut self) -> Vec<&mut dyn FieldSlot>;

    /// Free-form remark, rendered after the declared fields.
    fn remark(&self) -> Option<&str>;

    /// Whether `spec` is one of the mandatory key fields.
    fn is_key(spec: &FieldSpec) -> bool {
        Self::KEYS.contains(&spec.name)
    }

    /// Titles of the key fields that are blank on this record.
    fn blank_keys(&self) -> Vec<&'static str> {
        Self::FIELDS
            .iter()
            .zip(self.values())
            .filter(|(spec, value)| Self::is_key(spec) && value.is_blank())
            .map(|(spec, _)| spec.title)
            .collect()
    }
}
