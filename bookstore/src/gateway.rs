//! # HTTP Gateway Routes
//!
//! The route mapping exposed over HTTP. Only `bookstore.Echo/Echo` is mapped;
//! `bookstore.Inventory/GetBooks` is reachable over gRPC only.
use bookstore_gateway::prost_reflect::DescriptorError;
use bookstore_gateway::{GatewayMux, GrpcClient, RegisterError, RouteMapping, axum::Router};
use bookstore_proto::FILE_DESCRIPTOR_SET;

pub const ECHO_RPC: &str = "bookstore.Echo/Echo";

#[derive(Debug, thiserror::Error)]
pub enum GatewaySetupError {
    #[error("Failed to decode file descriptor set: '{0}'")]
    Descriptor(#[from] DescriptorError),
    #[error("Failed to register route: '{0}'")]
    Register(#[from] RegisterError),
}

pub fn echo_routes() -> Vec<RouteMapping> {
    vec![
        RouteMapping::post("/v1/echo", ECHO_RPC),
        RouteMapping::get("/v1/echo/{value}", ECHO_RPC),
    ]
}

/// Builds the gateway router, proxying every [`echo_routes`] mapping through `client`.
pub fn router<S>(client: GrpcClient<S>) -> Result<Router, GatewaySetupError>
where
    S: tonic::client::GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    S::Future: Send,
    S::ResponseBody: http_body::Body<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as http_body::Body>::Error:
        Into<Box<dyn std::error::Error + Send + Sync>> + Send,
{
    let mut mux = GatewayMux::from_file_descriptor_set(FILE_DESCRIPTOR_SET, client)?;

    for route in echo_routes() {
        mux.register(route)?;
    }

    Ok(mux.into_router())
}
