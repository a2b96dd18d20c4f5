//! Read models for the dashboard and the site map

use super::core::{db_error, ErpDatabase};
use super::mappers::{map_contract_row, map_quote_row, map_site_marker_row, map_work_order_row};
use crate::billing::BillingAmounts;
use crate::error::Result;
use crate::models::{
    ClientStatus, ContractStatus, DashboardSummary, EmployeeStatus, QuoteStatus, SiteMarker,
    StatusCount, WorkOrderStatus,
};
use chrono::{NaiveDate, Utc};
use sqlx::Row;
use tracing::{debug, instrument};

impl ErpDatabase {
    /// Dashboard figures as of today (UTC)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying queries fail
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        self.dashboard_summary_as_of(Utc::now().date_naive()).await
    }

    /// Dashboard figures, treating work orders due before `today` as overdue
    ///
    /// Contract revenue is the sum of each active contract's billing
    /// breakdown, so it always agrees with the per-contract figures.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying queries fail
    #[instrument(skip(self))]
    pub async fn dashboard_summary_as_of(&self, today: NaiveDate) -> Result<DashboardSummary> {
        let stats = self.get_stats().await?;

        let contract_rows = sqlx::query("SELECT * FROM contracts WHERE status = ?")
            .bind(ContractStatus::Active.as_str())
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to load active contracts"))?;
        let contracts = contract_rows
            .iter()
            .map(map_contract_row)
            .collect::<Result<Vec<_>>>()?;
        let contract_revenue: BillingAmounts =
            contracts.iter().map(|c| c.billing_breakdown()).sum();

        let order_rows = sqlx::query("SELECT * FROM work_orders WHERE status NOT IN (?, ?)")
            .bind(WorkOrderStatus::Completed.as_str())
            .bind(WorkOrderStatus::Cancelled.as_str())
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to load open work orders"))?;
        let open_orders = order_rows
            .iter()
            .map(map_work_order_row)
            .collect::<Result<Vec<_>>>()?;
        let overdue = open_orders.iter().filter(|w| w.is_overdue(today)).count();

        let quote_rows = sqlx::query("SELECT * FROM quotes WHERE status IN (?, ?)")
            .bind(QuoteStatus::Draft.as_str())
            .bind(QuoteStatus::Sent.as_str())
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to load open quotes"))?;
        let quote_pipeline: BillingAmounts = quote_rows
            .iter()
            .map(map_quote_row)
            .collect::<Result<Vec<_>>>()?
            .iter()
            .map(|q| q.billing_breakdown())
            .sum();

        let summary = DashboardSummary {
            stats,
            active_clients: self.count_with_status("clients", ClientStatus::Active.as_str()).await?,
            sites_by_status: self.status_counts("sites").await?,
            active_contracts: contracts.len() as u64,
            contract_revenue,
            open_work_orders: open_orders.len() as u64,
            overdue_work_orders: overdue as u64,
            active_employees: self.count_with_status("employees", EmployeeStatus::Active.as_str()).await?,
            leads_by_status: self.status_counts("leads").await?,
            quote_pipeline,
            generated_at: Utc::now(),
        };

        debug!(
            "Dashboard: {} active contracts, {} open work orders ({} overdue)",
            summary.active_contracts, summary.open_work_orders, summary.overdue_work_orders
        );
        Ok(summary)
    }

    /// Sites that have both coordinates, with their client's name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn site_map_markers(&self) -> Result<Vec<SiteMarker>> {
        let rows = sqlx::query(
            r"
            SELECT s.id, s.client_id, s.site_name, c.company_name, s.address,
                   s.status, s.latitude, s.longitude
            FROM sites s
            JOIN clients c ON c.id = s.client_id
            WHERE s.latitude IS NOT NULL AND s.longitude IS NOT NULL
            ORDER BY c.company_name, s.site_name, s.id
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to load site markers"))?;
        rows.iter().map(map_site_marker_row).collect()
    }

    async fn count_with_status(&self, table: &'static str, status: &str) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE status = ?"))
                .bind(status)
                .fetch_one(self.pool())
                .await
                .map_err(db_error("Failed to count by status"))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn status_counts(&self, table: &'static str) -> Result<Vec<StatusCount>> {
        let rows = sqlx::query(&format!(
            "SELECT status, COUNT(*) AS count FROM {table} GROUP BY status ORDER BY status"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to group by status"))?;

        rows.iter()
            .map(|row| -> Result<StatusCount> {
                let count: i64 = row.try_get("count")?;
                Ok(StatusCount {
                    status: row.try_get("status")?,
                    count: u64::try_from(count).unwrap_or(0),
                })
            })
            .collect()
    }
}
