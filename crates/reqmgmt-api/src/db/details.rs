//! Requirement detail persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `req_detail` table.
//! Surrogate ids come from the `BIGSERIAL` column; the natural key
//! `(req_no, req_name)` is enforced by a unique constraint.

use reqmgmt_core::{FieldRecord, RequirementDetail};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::sql::{column_list, now, push_assignments, push_field, INSERT_CHUNK};

fn select_sql() -> String {
    format!(
        "SELECT {} FROM req_detail",
        column_list::<RequirementDetail>(&["id"])
    )
}

/// Every detail of one ticket number, ordered by id.
pub async fn list_by_req_no(
    pool: &PgPool,
    req_no: &str,
) -> Result<Vec<RequirementDetail>, sqlx::Error> {
    let sql = format!("{} WHERE req_no = $1 ORDER BY id", select_sql());
    sqlx::query_as::<_, RequirementDetail>(&sql)
        .bind(req_no)
        .fetch_all(pool)
        .await
}

/// Every detail whose ticket number is in `req_nos`, ordered by id.
pub async fn list_by_req_nos(
    pool: &PgPool,
    req_nos: &[String],
) -> Result<Vec<RequirementDetail>, sqlx::Error> {
    if req_nos.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("{} WHERE req_no = ANY($1) ORDER BY id", select_sql());
    sqlx::query_as::<_, RequirementDetail>(&sql)
        .bind(req_nos)
        .fetch_all(pool)
        .await
}

/// Insert new details and update existing ones (by id) in one transaction.
pub async fn apply_batch(
    pool: &PgPool,
    inserts: &[RequirementDetail],
    updates: &[RequirementDetail],
) -> Result<(), sqlx::Error> {
    let stamp = now();
    let mut tx = pool.begin().await?;

    for chunk in inserts.chunks(INSERT_CHUNK) {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO req_detail ({}) ",
            column_list::<RequirementDetail>(&[])
        ));
        qb.push_values(chunk, |mut row, detail| {
            for value in detail.values() {
                push_field(&mut row, value);
            }
            row.push_bind(detail.remark.clone())
                .push_bind(stamp)
                .push_bind(stamp);
        });
        qb.build().execute(&mut *tx).await?;
    }

    for detail in updates {
        let Some(id) = detail.id else {
            return Err(sqlx::Error::RowNotFound);
        };
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE req_detail SET ");
        push_assignments(&mut qb, detail, stamp);
        qb.push(" WHERE id = ").push_bind(id);
        let result = qb.build().execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
    }

    tx.commit().await?;
    tracing::debug!(
        inserted = inserts.len(),
        updated = updates.len(),
        "req_detail batch committed"
    );
    Ok(())
}
