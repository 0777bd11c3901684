//! Employee lookup backends.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use crate::employees::model::Employee;
use crate::observability::metrics::record_db_request;

const GET_EMPLOYEE: &str = "getemployee";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("employee store is unavailable")]
    Unavailable,

    #[error("failed to load employees from {path}: {reason}")]
    Seed { path: String, reason: String },
}

/// Read access to employee records.
#[async_trait]
pub trait EmployeeStore: Send + Sync + 'static {
    /// `Ok(None)` when no employee has this id.
    async fn get_employee(&self, id: i64) -> Result<Option<Employee>, StoreError>;

    /// Whether the store can serve lookups.
    async fn health(&self) -> bool;

    /// Release the store. Later lookups fail with `Unavailable`.
    async fn close(&self);
}

/// In-memory store, optionally seeded from a JSON array of employees.
#[derive(Debug, Default)]
pub struct MemoryStore {
    employees: DashMap<i64, Employee>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = Employee>) -> Self {
        let store = Self::new();
        for employee in records {
            store.insert(employee);
        }
        store
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let seed_error = |reason: String| StoreError::Seed {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| seed_error(e.to_string()))?;
        let records: Vec<Employee> =
            serde_json::from_str(&content).map_err(|e| seed_error(e.to_string()))?;

        tracing::info!(
            path = %path.display(),
            count = records.len(),
            "DataAccess: Loaded employees"
        );
        Ok(Self::from_records(records))
    }

    pub fn insert(&self, employee: Employee) {
        self.employees.insert(employee.id, employee);
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn get_employee(&self, id: i64) -> Result<Option<Employee>, StoreError> {
        let start = Instant::now();
        if self.closed.load(Ordering::Acquire) {
            record_db_request(GET_EMPLOYEE, false, start);
            return Err(StoreError::Unavailable);
        }

        tracing::debug!(emp_id = id, "EmployeeDB: Fetching employee details");
        let employee = self.employees.get(&id).map(|entry| entry.value().clone());
        record_db_request(GET_EMPLOYEE, true, start);
        Ok(employee)
    }

    async fn health(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!("EmployeeDB: Closing store");
        }
    }
}
