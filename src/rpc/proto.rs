//! Server and client for the `hrapp.Hrapp` gRPC service.
//!
//! ```proto
//! package hrapp;
//!
//! service Hrapp {
//!   rpc GetEmployee(EmployeeId) returns (Employee);
//! }
//! ```
//!
//! Written in the shape tonic's code generator emits, over the hand-derived
//! prost messages in [`crate::employees::model`].

pub mod hrapp_server {
    use std::sync::Arc;
    use std::task::{Context, Poll};

    use tonic::codegen::{empty_body, http, Body, BoxFuture, Service, StdError};

    use crate::employees::{Employee, EmployeeId};

    #[tonic::async_trait]
    pub trait Hrapp: Send + Sync + 'static {
        async fn get_employee(
            &self,
            request: tonic::Request<EmployeeId>,
        ) -> Result<tonic::Response<Employee>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct HrappServer<T> {
        inner: Arc<T>,
    }

    impl<T> HrappServer<T> {
        pub fn new(inner: T) -> Self {
            Self::from_arc(Arc::new(inner))
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T> Clone for HrappServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<T, B> Service<http::Request<B>> for HrappServer<T>
    where
        T: Hrapp,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/hrapp.Hrapp/GetEmployee" => {
                    struct GetEmployeeSvc<T: Hrapp>(Arc<T>);

                    impl<T: Hrapp> tonic::server::UnaryService<EmployeeId> for GetEmployeeSvc<T> {
                        type Response = Employee;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

                        fn call(&mut self, request: tonic::Request<EmployeeId>) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.get_employee(request).await })
                        }
                    }

                    let inner = Arc::clone(&self.inner);
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(GetEmployeeSvc(inner), req).await)
                    })
                }
                _ => Box::pin(async move {
                    let mut response = http::Response::new(empty_body());
                    let headers = response.headers_mut();
                    headers.insert(
                        tonic::Status::GRPC_STATUS,
                        (tonic::Code::Unimplemented as i32).into(),
                    );
                    headers.insert(
                        http::header::CONTENT_TYPE,
                        tonic::metadata::GRPC_CONTENT_TYPE,
                    );
                    Ok(response)
                }),
            }
        }
    }

    impl<T> tonic::server::NamedService for HrappServer<T> {
        const NAME: &'static str = "hrapp.Hrapp";
    }
}

pub mod hrapp_client {
    use tonic::codegen::{http, StdError};
    use tonic::transport::{Channel, Endpoint};

    use crate::employees::{Employee, EmployeeId};

    #[derive(Debug, Clone)]
    pub struct HrappClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl HrappClient {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<Endpoint>,
            D::Error: Into<StdError>,
        {
            let channel = Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(channel))
        }

        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        pub async fn get_employee(
            &mut self,
            request: impl tonic::IntoRequest<EmployeeId>,
        ) -> Result<tonic::Response<Employee>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {e}"))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/hrapp.Hrapp/GetEmployee");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}
