use async_trait::async_trait;
use axum::Router;

use crate::service::ServiceError;

/// A route table hosted by [`HttpServer`](super::HttpServer).
#[async_trait]
pub trait HttpHandler: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Called from the server's `init`, before the listener is bound.
    async fn init(&mut self) -> Result<(), ServiceError>;

    /// The routes to serve. Called once, after `init`.
    fn routes(&self) -> Router;
}
