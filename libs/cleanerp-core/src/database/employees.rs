//! Employee operations

use super::core::{db_error, ErpDatabase};
use super::date_utils::{format_iso_date, format_iso_timestamp};
use super::mappers::map_employee_row;
use super::query_builders::{bind_value, stored_code, TableSpec, UpdateBuilder};
use crate::error::Result;
use crate::models::{
    CreateEmployeeRequest, Employee, EmployeeStatus, EmploymentType, UpdateEmployeeRequest,
};
use crate::query::{ListQuery, Page, SortDirection};
use crate::validation::validate_request;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const EMPLOYEES: TableSpec = TableSpec {
    table: "employees",
    entity: "Employee",
    sortable: &[
        "first_name",
        "last_name",
        "job_title",
        "department",
        "employment_type",
        "status",
        "start_date",
        "hourly_rate",
        "created_at",
    ],
    searchable: &["first_name", "last_name", "email", "job_title", "department"],
    filterable: &["status", "employment_type", "department"],
    coded: &[
        ("status", stored_code::<EmployeeStatus>),
        ("employment_type", stored_code::<EmploymentType>),
    ],
    default_sort: ("last_name", SortDirection::Asc),
};

impl ErpDatabase {
    /// List employees
    ///
    /// # Errors
    ///
    /// Returns an error if the query names an unknown column or the database query fails
    #[instrument(skip(self))]
    pub async fn list_employees(&self, query: &ListQuery) -> Result<Page<Employee>> {
        self.fetch_page(&EMPLOYEES, query, map_employee_row).await
    }

    /// Get an employee by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn get_employee(&self, id: &Uuid) -> Result<Option<Employee>> {
        self.fetch_by_id(EMPLOYEES.table, id, map_employee_row).await
    }

    /// Create an employee record
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the database insert fails
    #[instrument(skip(self))]
    pub async fn create_employee(&self, request: CreateEmployeeRequest) -> Result<Employee> {
        validate_request(&request)?;

        let id = Uuid::new_v4();
        let now = format_iso_timestamp(Utc::now());

        sqlx::query(
            r"
            INSERT INTO employees (
                id, first_name, last_name, email, phone, job_title, department,
                employment_type, status, start_date, hourly_rate,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id.to_string())
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(request.email.as_ref())
        .bind(request.phone.as_ref())
        .bind(request.job_title.as_ref())
        .bind(request.department.as_ref())
        .bind(request.employment_type.unwrap_or_default().as_str())
        .bind(request.status.unwrap_or_default().as_str())
        .bind(request.start_date.map(format_iso_date))
        .bind(request.hourly_rate)
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to create employee"))?;

        info!("Created employee with id: {}", id);
        self.fetch_existing(EMPLOYEES.table, EMPLOYEES.entity, &id, map_employee_row)
            .await
    }

    /// Update an employee; only fields that are present change
    ///
    /// # Errors
    ///
    /// Returns an error if the employee doesn't exist, validation fails, or the database update fails
    #[instrument(skip(self))]
    pub async fn update_employee(&self, request: UpdateEmployeeRequest) -> Result<Employee> {
        validate_request(&request)?;
        self.fetch_existing(EMPLOYEES.table, EMPLOYEES.entity, &request.id, map_employee_row)
            .await?;

        let builder = UpdateBuilder::new(EMPLOYEES.table)
            .set_if("first_name", request.first_name)
            .set_if("last_name", request.last_name)
            .set_if("email", request.email)
            .set_if("phone", request.phone)
            .set_if("job_title", request.job_title)
            .set_if("department", request.department)
            .set_if(
                "employment_type",
                request.employment_type.map(|t| t.as_str()),
            )
            .set_if("status", request.status.map(|s| s.as_str()))
            .set_if("start_date", request.start_date.map(format_iso_date))
            .set_if("hourly_rate", request.hourly_rate);

        let sql = builder.build_query_string();
        let mut q = sqlx::query(&sql);
        for value in builder.into_values() {
            q = bind_value(q, value);
        }
        q.bind(format_iso_timestamp(Utc::now()))
            .bind(request.id.to_string())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to update employee"))?;

        info!("Updated employee with id: {}", request.id);
        self.fetch_existing(EMPLOYEES.table, EMPLOYEES.entity, &request.id, map_employee_row)
            .await
    }

    /// Delete an employee and their work order assignments
    ///
    /// # Errors
    ///
    /// Returns an error if the employee doesn't exist or the database delete fails
    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: &Uuid) -> Result<()> {
        self.delete_by_id(EMPLOYEES.table, EMPLOYEES.entity, id).await
    }
}
