//! # Bookstore Gateway
//!
//! `bookstore-gateway` exposes unary gRPC methods over HTTP/JSON. It has no compile-time
//! knowledge of the Protobuf schema: routes are resolved against a `prost_reflect::DescriptorPool`
//! and messages are transcoded between JSON and Protobuf at runtime.
//!
//! ## Key Components
//!
//! * **[`RouteMapping`]:** Declares which HTTP method + path template maps to which
//!   `package.Service/Method`, and whether the JSON body is the request message.
//! * **[`GatewayMux`]:** Validates mappings against the schema and builds the `axum::Router`
//!   that proxies requests.
//! * **[`GrpcClient`]:** A dynamic unary gRPC client using the [`grpc::codec::DynamicCodec`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use bookstore_gateway::{GatewayMux, GrpcClient, RouteMapping};
//! use tonic::transport::Endpoint;
//!
//! # async fn run(descriptors: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let channel = Endpoint::from_static("http://127.0.0.1:8080").connect().await?;
//! let mut mux = GatewayMux::from_file_descriptor_set(descriptors, GrpcClient::new(channel))?;
//! mux.register(RouteMapping::post("/v1/echo", "bookstore.Echo/Echo"))?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8090").await?;
//! axum::serve(listener, mux.into_router()).await?;
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod grpc;
pub mod headers;
pub mod mux;
pub mod route;

pub use error::GatewayError;
pub use grpc::client::{GrpcClient, GrpcRequestError};
pub use mux::{GatewayMux, RegisterError};
pub use route::{BodyMapping, RouteMapping};

// Re-exports
pub use axum;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
