//! HTTP employee directory: `GET /employees/{id}`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::employees::store::EmployeeStore;
use crate::http::HttpHandler;
use crate::service::ServiceError;

pub struct DirectoryRoutes {
    store: Arc<dyn EmployeeStore>,
}

impl DirectoryRoutes {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HttpHandler for DirectoryRoutes {
    fn name(&self) -> &str {
        "directory"
    }

    async fn init(&mut self) -> Result<(), ServiceError> {
        if !self.store.health().await {
            return Err(ServiceError::initialization(self.name(), "backing store unreachable"));
        }
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/employees/{id}", get(get_employee))
            .with_state(self.store.clone())
    }
}

async fn get_employee(
    State(store): State<Arc<dyn EmployeeStore>>,
    Path(id): Path<i64>,
) -> Response {
    match store.get_employee(id).await {
        Ok(Some(employee)) => Json(employee).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("employee {id} not found")).into_response(),
        Err(e) => {
            tracing::warn!(emp_id = id, error = %e, "Directory: Lookup failed");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}
