//! Requirement header persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `req_list` table.

use reqmgmt_core::{FieldRecord, HeaderFilter, MatchMode, Page, PageRequest, RequirementHeader};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::sql::{column_list, now, push_assignments, push_field, INSERT_CHUNK};

fn select_sql() -> String {
    format!(
        "SELECT {} FROM req_list",
        column_list::<RequirementHeader>(&[])
    )
}

/// Fetch a header by ticket number.
pub async fn get_by_req_no(
    pool: &PgPool,
    req_no: &str,
) -> Result<Option<RequirementHeader>, sqlx::Error> {
    let sql = format!("{} WHERE req_no = $1", select_sql());
    sqlx::query_as::<_, RequirementHeader>(&sql)
        .bind(req_no)
        .fetch_optional(pool)
        .await
}

/// Fetch every header whose ticket number is in `req_nos`.
pub async fn list_by_req_nos(
    pool: &PgPool,
    req_nos: &[String],
) -> Result<Vec<RequirementHeader>, sqlx::Error> {
    if req_nos.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("{} WHERE req_no = ANY($1)", select_sql());
    sqlx::query_as::<_, RequirementHeader>(&sql)
        .bind(req_nos)
        .fetch_all(pool)
        .await
}

/// Every ticket number, ascending.
pub async fn list_req_nos(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT req_no FROM req_list ORDER BY req_no")
        .fetch_all(pool)
        .await
}

/// Append ` WHERE ...` for the active filter terms. Column names come from
/// the declared field table, values are always bound.
fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &HeaderFilter) {
    for (i, term) in filter.terms().iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match term.mode {
            MatchMode::Contains => {
                qb.push("strpos(")
                    .push(term.column)
                    .push(", ")
                    .push_bind(term.value.clone())
                    .push(") > 0");
            }
            MatchMode::Exact => {
                qb.push(term.column).push(" = ").push_bind(term.value.clone());
            }
        }
    }
}

/// Filtered, paginated search, newest submission first.
pub async fn search(
    pool: &PgPool,
    filter: &HeaderFilter,
    page: PageRequest,
) -> Result<Page<RequirementHeader>, sqlx::Error> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM req_list");
    push_filter(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(select_sql());
    push_filter(&mut select, filter);
    select
        .push(" ORDER BY submit_time DESC NULLS LAST LIMIT ")
        .push_bind(i64::try_from(page.size).unwrap_or(i64::MAX))
        .push(" OFFSET ")
        .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
    let records = select
        .build_query_as::<RequirementHeader>()
        .fetch_all(pool)
        .await?;

    Ok(Page::new(records, u64::try_from(total).unwrap_or(0), page))
}

/// Insert and update headers in one transaction.
///
/// Inserts go out as multi-row statements of up to [`INSERT_CHUNK`] rows.
/// An update that matches no row fails the batch with
/// [`sqlx::Error::RowNotFound`].
pub async fn apply_batch(
    pool: &PgPool,
    inserts: &[RequirementHeader],
    updates: &[RequirementHeader],
) -> Result<(), sqlx::Error> {
    let stamp = now();
    let mut tx = pool.begin().await?;

    for chunk in inserts.chunks(INSERT_CHUNK) {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO req_list ({}) ",
            column_list::<RequirementHeader>(&[])
        ));
        qb.push_values(chunk, |mut row, header| {
            for value in header.values() {
                push_field(&mut row, value);
            }
            row.push_bind(header.remark.clone())
                .push_bind(stamp)
                .push_bind(stamp);
        });
        qb.build().execute(&mut *tx).await?;
    }

    for header in updates {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE req_list SET ");
        push_assignments(&mut qb, header, stamp);
        qb.push(" WHERE req_no = ").push_bind(header.req_no.clone());
        let result = qb.build().execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
    }

    tx.commit().await?;
    tracing::debug!(
        inserted = inserts.len(),
        updated = updates.len(),
        "req_list batch committed"
    );
    Ok(())
}
