//! Implementation-specific services hosted by [`RpcServer`](super::RpcServer).

use std::sync::Arc;

use async_trait::async_trait;
use tonic::service::Routes;
use tonic::{Request, Response, Status};

use crate::employees::{Employee, EmployeeId, EmployeeStore};
use crate::rpc::proto::hrapp_server::{Hrapp, HrappServer};
use crate::service::ServiceError;

/// The gRPC services an [`RpcServer`](super::RpcServer) exposes, plus their setup and teardown.
#[async_trait]
pub trait RpcHandler: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Called from the server's `init`, after credentials are loaded.
    async fn init(&mut self) -> Result<(), ServiceError>;

    /// Add this handler's services to the server's routes.
    fn register(&self, routes: Routes) -> Routes;

    /// Called when `SHUTDOWN` is handled, before the transport stops.
    async fn shutdown(&self);
}

/// Serves `hrapp.Hrapp` from an [`EmployeeStore`].
pub struct EmployeeHandler {
    store: Arc<dyn EmployeeStore>,
}

impl EmployeeHandler {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RpcHandler for EmployeeHandler {
    fn name(&self) -> &str {
        "hrapp"
    }

    async fn init(&mut self) -> Result<(), ServiceError> {
        tracing::info!("DataAccess: Checking employee store");
        if !self.store.health().await {
            tracing::error!("DataAccess: Employee store healthcheck failed");
            return Err(ServiceError::initialization(self.name(), "backing store unreachable"));
        }
        Ok(())
    }

    fn register(&self, routes: Routes) -> Routes {
        routes.add_service(HrappServer::new(EmployeeService {
            store: self.store.clone(),
        }))
    }

    async fn shutdown(&self) {
        self.store.close().await;
    }
}

struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
}

#[tonic::async_trait]
impl Hrapp for EmployeeService {
    async fn get_employee(
        &self,
        request: Request<EmployeeId>,
    ) -> Result<Response<Employee>, Status> {
        let id = request.into_inner().id;
        match self.store.get_employee(id).await {
            // Unknown ids answer with an empty record, not NOT_FOUND.
            Ok(employee) => Ok(Response::new(employee.unwrap_or_default())),
            Err(e) => {
                tracing::warn!(emp_id = id, error = %e, "Hrapp: GetEmployee failed");
                Err(Status::unavailable(e.to_string()))
            }
        }
    }
}
