//! # Application Lifecycle
//!
//! [`start`] runs the startup sequence in a fixed order:
//!
//! 1. Bind the RPC listener and start serving gRPC.
//! 2. Connect a client channel to the RPC listener over loopback.
//! 3. Register the gateway routes against that channel.
//! 4. Bind the HTTP listener and start serving the gateway.
//!
//! Any failure aborts the sequence with a [`StartupError`]; the HTTP listener is never bound
//! if an earlier step fails. Once started, [`Bookstore::wait`] supervises both servers and
//! returns as soon as either of them stops.
use crate::gateway::{self, GatewaySetupError};
use crate::server;
use crate::service::BookstoreService;
use bookstore_gateway::GrpcClient;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};
use tonic::transport::Endpoint;

pub const DEFAULT_RPC_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);
pub const DEFAULT_GATEWAY_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8090);

/// Listening addresses for both servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rpc_addr: SocketAddr,
    pub gateway_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_addr: DEFAULT_RPC_ADDR,
            gateway_addr: DEFAULT_GATEWAY_ADDR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to listen on '{addr}': '{source}'")]
    RpcBind { addr: SocketAddr, source: io::Error },
    #[error("Failed to set up server reflection: '{0}'")]
    Reflection(#[from] tonic_reflection::server::Error),
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Failed to dial server '{0}': {1}")]
    Dial(String, #[source] tonic::transport::Error),
    #[error("Failed to register gateway: {0}")]
    Gateway(#[from] GatewaySetupError),
    #[error("Failed to listen on '{addr}' for the gateway: '{source}'")]
    GatewayBind { addr: SocketAddr, source: io::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("gRPC server failed: '{0}'")]
    Rpc(#[source] tonic::transport::Error),
    #[error("gRPC-gateway failed: '{0}'")]
    Gateway(#[source] io::Error),
    #[error("{0} stopped unexpectedly")]
    Stopped(&'static str),
    #[error("{0} task panicked or was cancelled: '{1}'")]
    Task(&'static str, #[source] JoinError),
}

/// Both servers, running.
#[derive(Debug)]
pub struct Bookstore {
    rpc_addr: SocketAddr,
    gateway_addr: SocketAddr,
    rpc: JoinHandle<Result<(), tonic::transport::Error>>,
    gateway: JoinHandle<io::Result<()>>,
}

/// Runs the startup sequence. See the module documentation for the order of steps.
pub async fn start(config: &Config) -> Result<Bookstore, StartupError> {
    let listener = TcpListener::bind(config.rpc_addr)
        .await
        .map_err(|source| StartupError::RpcBind {
            addr: config.rpc_addr,
            source,
        })?;
    let rpc_addr = listener.local_addr().map_err(|source| StartupError::RpcBind {
        addr: config.rpc_addr,
        source,
    })?;

    let routes = server::routes(BookstoreService)?;
    let rpc = tokio::spawn(server::serve(listener, routes));
    tracing::info!(addr = %rpc_addr, "gRPC server started");

    match start_gateway(rpc_addr, config.gateway_addr).await {
        Ok((gateway_addr, gateway)) => Ok(Bookstore {
            rpc_addr,
            gateway_addr,
            rpc,
            gateway,
        }),
        Err(err) => {
            rpc.abort();
            Err(err)
        }
    }
}

async fn start_gateway(
    rpc_addr: SocketAddr,
    gateway_addr: SocketAddr,
) -> Result<(SocketAddr, JoinHandle<io::Result<()>>), StartupError> {
    let url = dial_url(rpc_addr);

    let channel = Endpoint::new(url.clone())
        .map_err(|e| StartupError::InvalidUrl(url.clone(), e))?
        .connect()
        .await
        .map_err(|e| StartupError::Dial(url.clone(), e))?;

    let router = gateway::router(GrpcClient::new(channel))?;

    let listener = TcpListener::bind(gateway_addr)
        .await
        .map_err(|source| StartupError::GatewayBind {
            addr: gateway_addr,
            source,
        })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| StartupError::GatewayBind {
            addr: gateway_addr,
            source,
        })?;

    let handle = tokio::spawn(async move { axum::serve(listener, router).await });
    tracing::info!(addr = %local_addr, upstream = %url, "gRPC-gateway started");

    Ok((local_addr, handle))
}

/// The URL the gateway dials to reach the RPC listener bound at `addr`.
///
/// An unspecified bind address (`0.0.0.0`, `::`) is reached through loopback.
fn dial_url(addr: SocketAddr) -> String {
    let mut target = addr;

    if target.ip().is_unspecified() {
        target.set_ip(match addr {
            SocketAddr::V4(_) => Ipv4Addr::LOCALHOST.into(),
            SocketAddr::V6(_) => Ipv6Addr::LOCALHOST.into(),
        });
    }

    format!("http://{target}")
}

impl Bookstore {
    /// Address the gRPC server is listening on.
    pub fn rpc_addr(&self) -> SocketAddr {
        self.rpc_addr
    }

    /// Address the HTTP gateway is listening on.
    pub fn gateway_addr(&self) -> SocketAddr {
        self.gateway_addr
    }

    /// Waits until either server stops and reports why. The other one is aborted.
    pub async fn wait(self) -> ServeError {
        let Bookstore {
            mut rpc,
            mut gateway,
            ..
        } = self;

        let err = tokio::select! {
            res = &mut rpc => match res {
                Ok(Ok(())) => ServeError::Stopped("gRPC server"),
                Ok(Err(e)) => ServeError::Rpc(e),
                Err(e) => ServeError::Task("gRPC server", e),
            },
            res = &mut gateway => match res {
                Ok(Ok(())) => ServeError::Stopped("gRPC-gateway"),
                Ok(Err(e)) => ServeError::Gateway(e),
                Err(e) => ServeError::Task("gRPC-gateway", e),
            },
        };

        rpc.abort();
        gateway.abort();

        err
    }

    /// Stops both servers.
    pub fn shutdown(self) {
        self.rpc.abort();
        self.gateway.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_fixed_ports() {
        let config = Config::default();

        assert_eq!(config.rpc_addr.port(), 8080);
        assert_eq!(config.gateway_addr.port(), 8090);
        assert!(config.rpc_addr.ip().is_unspecified());
    }

    #[test]
    fn dial_url_uses_loopback_for_unspecified_addresses() {
        assert_eq!(dial_url("0.0.0.0:8080".parse().unwrap()), "http://127.0.0.1:8080");
        assert_eq!(dial_url("[::]:8080".parse().unwrap()), "http://[::1]:8080");
    }

    #[test]
    fn dial_url_keeps_specific_addresses() {
        assert_eq!(dial_url("127.0.0.2:9000".parse().unwrap()), "http://127.0.0.2:9000");
    }
}
