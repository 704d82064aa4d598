//! # RPC Server
//!
//! Assembles the tonic routes for the bookstore services plus gRPC server reflection, and
//! serves them on an already-bound listener.
use crate::service::BookstoreService;
use bookstore_proto::{EchoServer, FILE_DESCRIPTOR_SET, InventoryServer};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::Routes;
use tonic::transport::Server;

/// Inventory, Echo and reflection (`v1` and `v1alpha`) routes.
pub fn routes(service: BookstoreService) -> Result<Routes, tonic_reflection::server::Error> {
    let reflection_v1 = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    // grpcurl and older tooling still speak v1alpha
    let reflection_v1alpha = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1alpha()?;

    Ok(Routes::new(InventoryServer::new(service))
        .add_service(EchoServer::new(service))
        .add_service(reflection_v1)
        .add_service(reflection_v1alpha))
}

/// Serves `routes` until the listener fails.
pub async fn serve(listener: TcpListener, routes: Routes) -> Result<(), tonic::transport::Error> {
    Server::builder()
        .add_routes(routes)
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await
}
