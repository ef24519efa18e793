//! Statement fragments shared by the header and detail tables.

use chrono::{Local, NaiveDateTime};
use reqmgmt_core::{FieldRecord, FieldValue};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder};

/// Rows per multi-row INSERT statement.
pub const INSERT_CHUNK: usize = 500;

/// Bookkeeping columns stored after the declared fields.
pub const TRAILING_COLUMNS: [&str; 3] = ["remark", "created_at", "updated_at"];

/// Comma-separated column list: `leading`, the declared fields, then the
/// bookkeeping columns.
pub fn column_list<T: FieldRecord>(leading: &[&str]) -> String {
    leading
        .iter()
        .copied()
        .chain(T::FIELDS.iter().map(|f| f.name))
        .chain(TRAILING_COLUMNS)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Write timestamp for `created_at` / `updated_at`.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Bind one declared field value as the next tuple element.
pub fn push_field(sep: &mut Separated<'_, 'static, Postgres, &'static str>, value: FieldValue<'_>) {
    match value {
        FieldValue::Text(v) => sep.push_bind(v.map(str::to_string)),
        FieldValue::Decimal(v) => sep.push_bind(v),
        FieldValue::Timestamp(v) => sep.push_bind(v),
    };
}

/// Append `col = $n, ...` for every declared field plus remark and
/// `updated_at`. `created_at` is never touched by an update.
pub fn push_assignments<T: FieldRecord>(
    qb: &mut QueryBuilder<'static, Postgres>,
    record: &T,
    stamp: NaiveDateTime,
) {
    let mut set = qb.separated(", ");
    for (spec, value) in T::FIELDS.iter().zip(record.values()) {
        set.push(spec.name);
        set.push_unseparated(" = ");
        match value {
            FieldValue::Text(v) => set.push_bind_unseparated(v.map(str::to_string)),
            FieldValue::Decimal(v) => set.push_bind_unseparated(v),
            FieldValue::Timestamp(v) => set.push_bind_unseparated(v),
        };
    }
    set.push("remark = ");
    set.push_bind_unseparated(record.remark().map(str::to_string));
    set.push("updated_at = ");
    set.push_bind_unseparated(stamp);
}
