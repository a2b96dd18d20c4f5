//! Work order operations and employee assignments

use super::core::{db_error, ErpDatabase};
use super::date_utils::{format_iso_date, format_iso_timestamp, validate_date_range};
use super::mappers::{map_assignment_row, map_employee_row, map_work_order_row};
use super::query_builders::{bind_value, stored_code, TableSpec, UpdateBuilder};
use super::validators::{
    validate_contract_exists, validate_employee_exists, validate_site_exists,
    validate_work_order_exists,
};
use crate::error::{CleanErpError, Result};
use crate::models::{
    CreateWorkOrderRequest, Employee, UpdateWorkOrderRequest, WorkOrder, WorkOrderAssignment,
    WorkOrderPriority, WorkOrderStatus,
};
use crate::query::{ListQuery, Page, SortDirection};
use crate::validation::validate_request;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const WORK_ORDERS: TableSpec = TableSpec {
    table: "work_orders",
    entity: "Work order",
    sortable: &[
        "title",
        "priority",
        "status",
        "scheduled_date",
        "due_date",
        "completed_date",
        "estimated_hours",
        "estimated_cost",
        "created_at",
        "updated_at",
    ],
    searchable: &["title", "description"],
    filterable: &["site_id", "contract_id", "status", "priority"],
    coded: &[
        ("status", stored_code::<WorkOrderStatus>),
        ("priority", stored_code::<WorkOrderPriority>),
    ],
    default_sort: ("created_at", SortDirection::Desc),
};

impl ErpDatabase {
    /// List work orders
    ///
    /// # Errors
    ///
    /// Returns an error if the query names an unknown column or the database query fails
    #[instrument(skip(self))]
    pub async fn list_work_orders(&self, query: &ListQuery) -> Result<Page<WorkOrder>> {
        self.fetch_page(&WORK_ORDERS, query, map_work_order_row).await
    }

    /// Get a work order by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn get_work_order(&self, id: &Uuid) -> Result<Option<WorkOrder>> {
        self.fetch_by_id(WORK_ORDERS.table, id, map_work_order_row)
            .await
    }

    /// Create a work order at a site, optionally under a contract
    ///
    /// Validates that the site, the contract and every listed assignee exist.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the database insert fails
    #[instrument(skip(self))]
    pub async fn create_work_order(&self, request: CreateWorkOrderRequest) -> Result<WorkOrder> {
        validate_request(&request)?;
        validate_site_exists(self.pool(), &request.site_id).await?;
        if let Some(contract_id) = &request.contract_id {
            validate_contract_exists(self.pool(), contract_id).await?;
        }
        for employee_id in &request.assignee_ids {
            validate_employee_exists(self.pool(), employee_id).await?;
        }

        let id = Uuid::new_v4();
        let now = format_iso_timestamp(Utc::now());

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        sqlx::query(
            r"
            INSERT INTO work_orders (
                id, site_id, contract_id, title, description, priority, status,
                scheduled_date, due_date, completed_date,
                estimated_hours, actual_hours, estimated_cost, actual_cost,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, NULL, ?, NULL, ?, ?)
            ",
        )
        .bind(id.to_string())
        .bind(request.site_id.to_string())
        .bind(request.contract_id.map(|u| u.to_string()))
        .bind(&request.title)
        .bind(request.description.as_ref())
        .bind(request.priority.unwrap_or_default().as_str())
        .bind(request.status.unwrap_or_default().as_str())
        .bind(request.scheduled_date.map(format_iso_date))
        .bind(request.due_date.map(format_iso_date))
        .bind(request.estimated_hours)
        .bind(request.estimated_cost)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to create work order"))?;

        for employee_id in &request.assignee_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO work_order_assignments (work_order_id, employee_id, assigned_at) VALUES (?, ?, ?)",
            )
            .bind(id.to_string())
            .bind(employee_id.to_string())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to assign employee"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit work order"))?;

        info!("Created work order with id: {}", id);
        self.fetch_existing(WORK_ORDERS.table, WORK_ORDERS.entity, &id, map_work_order_row)
            .await
    }

    /// Update a work order; only fields that are present change
    ///
    /// Moving the status to completed without a completion date stamps today.
    ///
    /// # Errors
    ///
    /// Returns an error if the work order doesn't exist, validation fails, or the database update fails
    #[instrument(skip(self))]
    pub async fn update_work_order(&self, request: UpdateWorkOrderRequest) -> Result<WorkOrder> {
        validate_request(&request)?;
        let current = self
            .fetch_existing(
                WORK_ORDERS.table,
                WORK_ORDERS.entity,
                &request.id,
                map_work_order_row,
            )
            .await?;

        validate_date_range(
            "scheduledDate",
            request.scheduled_date.or(current.scheduled_date),
            "dueDate",
            request.due_date.or(current.due_date),
        )?;
        if let Some(contract_id) = &request.contract_id {
            validate_contract_exists(self.pool(), contract_id).await?;
        }

        let completed_date = match (request.status, request.completed_date) {
            (_, Some(date)) => Some(date),
            (Some(WorkOrderStatus::Completed), None) if current.completed_date.is_none() => {
                Some(Utc::now().date_naive())
            }
            _ => None,
        };

        let builder = UpdateBuilder::new(WORK_ORDERS.table)
            .set_if("contract_id", request.contract_id.map(|u| u.to_string()))
            .set_if("title", request.title)
            .set_if("description", request.description)
            .set_if("priority", request.priority.map(|p| p.as_str()))
            .set_if("status", request.status.map(|s| s.as_str()))
            .set_if("scheduled_date", request.scheduled_date.map(format_iso_date))
            .set_if("due_date", request.due_date.map(format_iso_date))
            .set_if("completed_date", completed_date.map(format_iso_date))
            .set_if("estimated_hours", request.estimated_hours)
            .set_if("actual_hours", request.actual_hours)
            .set_if("estimated_cost", request.estimated_cost)
            .set_if("actual_cost", request.actual_cost);

        let sql = builder.build_query_string();
        let mut q = sqlx::query(&sql);
        for value in builder.into_values() {
            q = bind_value(q, value);
        }
        q.bind(format_iso_timestamp(Utc::now()))
            .bind(request.id.to_string())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to update work order"))?;

        info!("Updated work order with id: {}", request.id);
        self.fetch_existing(
            WORK_ORDERS.table,
            WORK_ORDERS.entity,
            &request.id,
            map_work_order_row,
        )
        .await
    }

    /// Delete a work order and its assignments
    ///
    /// # Errors
    ///
    /// Returns an error if the work order doesn't exist or the database delete fails
    #[instrument(skip(self))]
    pub async fn delete_work_order(&self, id: &Uuid) -> Result<()> {
        self.delete_by_id(WORK_ORDERS.table, WORK_ORDERS.entity, id)
            .await
    }

    /// Assign an employee to a work order; assigning twice is a no-op
    ///
    /// # Errors
    ///
    /// Returns an error if either row doesn't exist or the database insert fails
    #[instrument(skip(self))]
    pub async fn assign_employee_to_work_order(
        &self,
        work_order_id: &Uuid,
        employee_id: &Uuid,
    ) -> Result<WorkOrderAssignment> {
        validate_work_order_exists(self.pool(), work_order_id).await?;
        validate_employee_exists(self.pool(), employee_id).await?;

        sqlx::query(
            "INSERT OR IGNORE INTO work_order_assignments (work_order_id, employee_id, assigned_at) VALUES (?, ?, ?)",
        )
        .bind(work_order_id.to_string())
        .bind(employee_id.to_string())
        .bind(format_iso_timestamp(Utc::now()))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to assign employee"))?;

        let row = sqlx::query(
            "SELECT * FROM work_order_assignments WHERE work_order_id = ? AND employee_id = ?",
        )
        .bind(work_order_id.to_string())
        .bind(employee_id.to_string())
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to read assignment"))?;

        info!(
            "Assigned employee {} to work order {}",
            employee_id, work_order_id
        );
        map_assignment_row(&row)
    }

    /// Remove an employee from a work order
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the employee is not assigned to the work order
    #[instrument(skip(self))]
    pub async fn unassign_employee_from_work_order(
        &self,
        work_order_id: &Uuid,
        employee_id: &Uuid,
    ) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM work_order_assignments WHERE work_order_id = ? AND employee_id = ?",
        )
        .bind(work_order_id.to_string())
        .bind(employee_id.to_string())
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to unassign employee"))?;

        if result.rows_affected() == 0 {
            return Err(CleanErpError::not_found(
                "Assignment",
                format!("{work_order_id}/{employee_id}"),
            ));
        }
        info!(
            "Unassigned employee {} from work order {}",
            employee_id, work_order_id
        );
        Ok(())
    }

    /// Employees assigned to a work order, by last name
    ///
    /// # Errors
    ///
    /// Returns an error if the work order doesn't exist or the database query fails
    #[instrument(skip(self))]
    pub async fn list_work_order_assignees(&self, work_order_id: &Uuid) -> Result<Vec<Employee>> {
        validate_work_order_exists(self.pool(), work_order_id).await?;
        let rows = sqlx::query(
            r"
            SELECT e.* FROM employees e
            JOIN work_order_assignments a ON a.employee_id = e.id
            WHERE a.work_order_id = ?
            ORDER BY e.last_name, e.first_name, e.id
            ",
        )
        .bind(work_order_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list assignees"))?;
        rows.iter().map(map_employee_row).collect()
    }

    /// Work orders an employee is assigned to, soonest due first
    ///
    /// # Errors
    ///
    /// Returns an error if the employee doesn't exist or the database query fails
    #[instrument(skip(self))]
    pub async fn list_work_orders_for_employee(&self, employee_id: &Uuid) -> Result<Vec<WorkOrder>> {
        validate_employee_exists(self.pool(), employee_id).await?;
        let rows = sqlx::query(
            r"
            SELECT w.* FROM work_orders w
            JOIN work_order_assignments a ON a.work_order_id = w.id
            WHERE a.employee_id = ?
            ORDER BY w.due_date IS NULL, w.due_date, w.id
            ",
        )
        .bind(employee_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list employee work orders"))?;
        rows.iter().map(map_work_order_row).collect()
    }
}
