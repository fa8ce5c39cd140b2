//! Sales storage: idempotent batch ingestion and report queries.
//!
//! The two operations the service exists for:
//!
//! - [`SalesStore::sync`]: upsert a batch of sales in one transaction,
//!   marking every row synced
//! - [`SalesStore::report`]: aggregate and paginate sales for a day, month,
//!   or year

use chrono::NaiveDate;
use serde::Serialize;

use crate::storage::db::Db;
use crate::storage::types::{Granularity, Period, Sale, ValidationError};
use crate::storage::StorageError;

// =============================================================================
// Types
// =============================================================================

/// Result of a sync call.
#[derive(Debug, Default, Serialize)]
pub struct SyncReceipt {
    /// Number of sales upserted (the whole batch, or nothing).
    pub synced_count: usize,
}

/// A validated report request.
///
/// Construction via [`ReportQuery::new`] is the only way to get one, so the
/// store can assume the period key matches the granularity and the window
/// parameters are positive.
#[derive(Debug, Clone)]
pub struct ReportQuery {
    period: Period,
    page: u32,
    page_size: u32,
}

impl ReportQuery {
    /// Validate raw request parameters into a query.
    ///
    /// Fails without touching storage if the report type is unknown, the
    /// period key doesn't match the granularity's calendar shape, or either
    /// window parameter is non-positive.
    pub fn new(
        report_type: &str,
        period_key: &str,
        page: i64,
        page_size: i64,
    ) -> Result<Self, ValidationError> {
        let granularity = report_type
            .parse::<Granularity>()
            .map_err(|_| ValidationError::InvalidReportType(report_type.to_string()))?;
        let period = Period::parse(granularity, period_key)?;

        if page < 1 {
            return Err(ValidationError::InvalidPage);
        }
        let page = u32::try_from(page).map_err(|_| ValidationError::InvalidPage)?;
        if page_size < 1 {
            return Err(ValidationError::InvalidPageSize);
        }
        let page_size = u32::try_from(page_size).map_err(|_| ValidationError::InvalidPageSize)?;

        Ok(Self {
            period,
            page,
            page_size,
        })
    }

    pub fn granularity(&self) -> Granularity {
        self.period.granularity()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

/// One row of a report page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub cashier: String,
    pub product: String,
    pub amount: f64,
}

/// One page of a report, plus aggregates over the whole matching set.
#[derive(Debug, Serialize)]
pub struct ReportPage {
    /// The requested window of matching rows, ordered by date then id.
    pub rows: Vec<ReportRow>,
    /// Sum of `amount` over every matching row, not just this page.
    pub total_amount: f64,
    /// Count of matching rows, not just this page.
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    /// `ceil(total_count / page_size)`; zero when nothing matches.
    pub total_pages: u32,
}

// =============================================================================
// Store
// =============================================================================

/// Storage facade for the sales table.
#[derive(Clone)]
pub struct SalesStore {
    db: Db,
}

impl std::fmt::Debug for SalesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesStore").finish_non_exhaustive()
    }
}

impl SalesStore {
    /// Create a new sales store.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Upsert a batch of sales as a single all-or-nothing transaction.
    ///
    /// A new `id` inserts a row; an existing `id` overwrites `date`,
    /// `cashier`, `product`, `amount` and re-asserts `synced`. If any upsert
    /// fails the transaction rolls back and no partial writes are visible.
    pub async fn sync(&self, sales: &[Sale]) -> Result<SyncReceipt, StorageError> {
        if sales.is_empty() {
            return Ok(SyncReceipt::default());
        }

        let mut tx = self.db.inner().begin().await?;

        for sale in sales {
            sqlx::query(
                "INSERT INTO sales (id, date, cashier, product, amount, synced)
                 VALUES (?, ?, ?, ?, ?, 1)
                 ON CONFLICT (id) DO UPDATE SET
                     date = excluded.date,
                     cashier = excluded.cashier,
                     product = excluded.product,
                     amount = excluded.amount,
                     synced = 1",
            )
            .bind(sale.id)
            .bind(sale.date)
            .bind(sale.cashier.as_str())
            .bind(sale.product.as_str())
            .bind(sale.amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(count = sales.len(), "Sales batch synced");
        Ok(SyncReceipt {
            synced_count: sales.len(),
        })
    }

    /// Cheap connectivity probe, used by the readiness endpoint.
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(self.db.inner()).await?;
        Ok(())
    }

    /// Run a report query: aggregates over the full matching set plus one
    /// page of rows.
    ///
    /// Both queries run inside one read transaction so the aggregates and
    /// the page always describe the same snapshot. Ordering is by `date`
    /// ascending with `id` as tie-break (for this table `id` aliases the
    /// rowid, so ties resolve in insertion order for monotonically assigned
    /// ids).
    pub async fn report(&self, query: &ReportQuery) -> Result<ReportPage, StorageError> {
        let (clause, param) = period_filter(&query.period);

        let mut tx = self.db.inner().begin().await?;

        let aggregate_sql =
            format!("SELECT COALESCE(SUM(amount), 0.0), COUNT(*) FROM sales WHERE {clause}");
        let (total_amount, total_count): (f64, i64) = sqlx::query_as(&aggregate_sql)
            .bind(param.as_str())
            .fetch_one(&mut *tx)
            .await?;

        let offset = (i64::from(query.page) - 1) * i64::from(query.page_size);
        let rows_sql = format!(
            "SELECT date, cashier, product, amount FROM sales
             WHERE {clause}
             ORDER BY date ASC, id ASC
             LIMIT ? OFFSET ?"
        );
        let rows: Vec<ReportRow> = sqlx::query_as(&rows_sql)
            .bind(param.as_str())
            .bind(i64::from(query.page_size))
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let total_count = total_count.max(0) as u64;
        let page_size = u64::from(query.page_size);
        let total_pages = u32::try_from(total_count.div_ceil(page_size)).unwrap_or(u32::MAX);

        Ok(ReportPage {
            rows,
            total_amount,
            total_count,
            page: query.page,
            page_size: query.page_size,
            total_pages,
        })
    }
}

/// WHERE fragment and bind parameter matching a period against the canonical
/// `YYYY-MM-DD` date column.
fn period_filter(period: &Period) -> (&'static str, String) {
    match period {
        Period::Day(date) => ("date = ?", date.format("%Y-%m-%d").to_string()),
        Period::Month { year, month } => (
            "strftime('%Y-%m', date) = ?",
            format!("{year:04}-{month:02}"),
        ),
        Period::Year(year) => ("strftime('%Y', date) = ?", format!("{year:04}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::init_schema;
    use tempfile::{tempdir, TempDir};

    async fn create_test_store(name: &str) -> (SalesStore, TempDir) {
        let dir = tempdir().unwrap();
        let db = Db::open(dir.path().join(name), 2).await.unwrap();
        init_schema(&db).await.unwrap();
        (SalesStore::new(db), dir)
    }

    fn sale(id: i64, date: &str, cashier: &str, product: &str, amount: f64) -> Sale {
        Sale {
            id,
            date: date.parse().unwrap(),
            cashier: cashier.to_string(),
            product: product.to_string(),
            amount,
            synced: true,
        }
    }

    fn query(report_type: &str, key: &str, page: i64, page_size: i64) -> ReportQuery {
        ReportQuery::new(report_type, key, page, page_size).unwrap()
    }

    // =========================================================================
    // Sync tests
    // =========================================================================

    #[tokio::test]
    async fn test_sync_empty_batch() {
        let (store, _dir) = create_test_store("empty.db").await;
        let receipt = store.sync(&[]).await.unwrap();
        assert_eq!(receipt.synced_count, 0);
    }

    #[tokio::test]
    async fn test_sync_inserts_batch() {
        let (store, _dir) = create_test_store("insert.db").await;

        let batch = vec![
            sale(1, "2024-03-01", "A", "X", 10.0),
            sale(2, "2024-03-01", "B", "Y", 5.0),
        ];
        let receipt = store.sync(&batch).await.unwrap();
        assert_eq!(receipt.synced_count, 2);

        let page = store.report(&query("DAILY", "2024-03-01", 1, 10)).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.total_amount, 15.0);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (store, _dir) = create_test_store("idem.db").await;
        let batch = vec![sale(1, "2024-03-01", "A", "X", 10.0)];

        let first = store.sync(&batch).await.unwrap();
        let second = store.sync(&batch).await.unwrap();
        assert_eq!(first.synced_count, 1);
        assert_eq!(second.synced_count, 1);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sales")
            .fetch_one(store.db.inner())
            .await
            .unwrap();
        assert_eq!(count.0, 1);

        let synced: (bool,) = sqlx::query_as("SELECT synced FROM sales WHERE id = 1")
            .fetch_one(store.db.inner())
            .await
            .unwrap();
        assert!(synced.0);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_all_fields() {
        let (store, _dir) = create_test_store("overwrite.db").await;

        store
            .sync(&[sale(1, "2024-03-01", "A", "X", 10.0)])
            .await
            .unwrap();
        store
            .sync(&[sale(1, "2024-04-02", "B", "Y", 20.0)])
            .await
            .unwrap();

        let (date, cashier, product, amount): (String, String, String, f64) =
            sqlx::query_as("SELECT date, cashier, product, amount FROM sales WHERE id = 1")
                .fetch_one(store.db.inner())
                .await
                .unwrap();
        assert_eq!(date, "2024-04-02");
        assert_eq!(cashier, "B");
        assert_eq!(product, "Y");
        assert_eq!(amount, 20.0);
    }

    // =========================================================================
    // Report tests
    // =========================================================================

    #[tokio::test]
    async fn test_daily_report_with_pagination() {
        let (store, _dir) = create_test_store("daily.db").await;
        store
            .sync(&[
                sale(1, "2024-03-01", "A", "X", 10.0),
                sale(2, "2024-03-01", "B", "Y", 5.0),
            ])
            .await
            .unwrap();

        let page = store.report(&query("DAILY", "2024-03-01", 1, 1)).await.unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].cashier, "A");
        assert_eq!(page.total_amount, 15.0);
        assert_eq!(page.total_count, 2);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_monthly_report_matches_whole_month() {
        let (store, _dir) = create_test_store("monthly.db").await;
        store
            .sync(&[
                sale(1, "2024-03-01", "A", "X", 10.0),
                sale(2, "2024-03-15", "B", "Y", 5.0),
                sale(3, "2024-04-01", "C", "Z", 99.0),
            ])
            .await
            .unwrap();

        let page = store.report(&query("MONTHLY", "2024-03", 1, 10)).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.total_amount, 15.0);
    }

    #[tokio::test]
    async fn test_yearly_report() {
        let (store, _dir) = create_test_store("yearly.db").await;
        store
            .sync(&[
                sale(1, "2024-01-01", "A", "X", 1.0),
                sale(2, "2024-12-31", "B", "Y", 2.0),
                sale(3, "2023-12-31", "C", "Z", 4.0),
            ])
            .await
            .unwrap();

        let page = store.report(&query("YEARLY", "2024", 1, 10)).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.total_amount, 3.0);
    }

    #[tokio::test]
    async fn test_empty_result_contract() {
        let (store, _dir) = create_test_store("none.db").await;
        store
            .sync(&[sale(1, "2024-03-01", "A", "X", 10.0)])
            .await
            .unwrap();

        let page = store.report(&query("DAILY", "2020-01-01", 1, 10)).await.unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total_amount, 0.0);
        assert_eq!(page.total_count, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_aggregates_independent_of_page() {
        let (store, _dir) = create_test_store("agg.db").await;
        let batch: Vec<Sale> = (1..=7)
            .map(|i| sale(i, "2024-03-01", "A", "X", i as f64))
            .collect();
        store.sync(&batch).await.unwrap();

        for page_no in 1..=4 {
            let page = store
                .report(&query("DAILY", "2024-03-01", page_no, 2))
                .await
                .unwrap();
            assert_eq!(page.total_amount, 28.0);
            assert_eq!(page.total_count, 7);
            assert_eq!(page.total_pages, 4);
        }
    }

    #[tokio::test]
    async fn test_pagination_is_complete_and_ordered() {
        let (store, _dir) = create_test_store("pages.db").await;
        // Inserted out of date order on purpose.
        store
            .sync(&[
                sale(5, "2024-03-03", "A", "X", 1.0),
                sale(3, "2024-03-01", "B", "Y", 2.0),
                sale(4, "2024-03-02", "C", "Z", 3.0),
                sale(1, "2024-03-02", "D", "W", 4.0),
                sale(2, "2024-03-01", "E", "V", 5.0),
            ])
            .await
            .unwrap();

        let mut seen = Vec::new();
        let first = store.report(&query("MONTHLY", "2024-03", 1, 2)).await.unwrap();
        assert_eq!(first.total_pages, 3);
        seen.extend(first.rows);
        for page_no in 2..=first.total_pages {
            let page = store
                .report(&query("MONTHLY", "2024-03", i64::from(page_no), 2))
                .await
                .unwrap();
            seen.extend(page.rows);
        }

        // Every matching row exactly once, ordered by date then id.
        let order: Vec<(String, String)> = seen
            .iter()
            .map(|r| (r.date.to_string(), r.cashier.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2024-03-01".to_string(), "E".to_string()),
                ("2024-03-01".to_string(), "B".to_string()),
                ("2024-03-02".to_string(), "D".to_string()),
                ("2024-03-02".to_string(), "C".to_string()),
                ("2024-03-03".to_string(), "A".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let (store, _dir) = create_test_store("past.db").await;
        store
            .sync(&[sale(1, "2024-03-01", "A", "X", 10.0)])
            .await
            .unwrap();

        let page = store.report(&query("DAILY", "2024-03-01", 5, 10)).await.unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total_count, 1);
        assert_eq!(page.total_pages, 1);
    }

    // =========================================================================
    // Query validation tests
    // =========================================================================

    #[test]
    fn test_report_query_validation() {
        assert!(matches!(
            ReportQuery::new("WEEKLY", "2024-03-01", 1, 10),
            Err(ValidationError::InvalidReportType(_))
        ));
        assert!(matches!(
            ReportQuery::new("DAILY", "2024-03", 1, 10),
            Err(ValidationError::InvalidPeriodKey { .. })
        ));
        assert!(matches!(
            ReportQuery::new("DAILY", "2024-03-01", 0, 10),
            Err(ValidationError::InvalidPage)
        ));
        assert!(matches!(
            ReportQuery::new("DAILY", "2024-03-01", 1, 0),
            Err(ValidationError::InvalidPageSize)
        ));
        assert!(matches!(
            ReportQuery::new("DAILY", "2024-03-01", 1, -3),
            Err(ValidationError::InvalidPageSize)
        ));

        let q = ReportQuery::new("daily", "2024-03-01", 2, 12).unwrap();
        assert_eq!(q.granularity(), Granularity::Daily);
        assert_eq!(q.page(), 2);
        assert_eq!(q.page_size(), 12);
    }
}
