//! # CLI
//!
//! This module defines the command-line interface of `bookstore` using `clap`.
//!
//! Both addresses default to the fixed ports, so running the binary without arguments
//! serves gRPC on `:8080` and the gateway on `:8090`.
use bookstore::app::{Config, DEFAULT_GATEWAY_ADDR, DEFAULT_RPC_ADDR};
use clap::Parser;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(
    name = "bookstore",
    version,
    about = "Bookstore gRPC service with an HTTP/JSON gateway"
)]
pub struct Cli {
    /// Address the gRPC server listens on
    #[arg(long, default_value_t = DEFAULT_RPC_ADDR)]
    pub rpc_addr: SocketAddr,

    /// Address the HTTP/JSON gateway listens on
    #[arg(long, default_value_t = DEFAULT_GATEWAY_ADDR)]
    pub gateway_addr: SocketAddr,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            rpc_addr: cli.rpc_addr,
            gateway_addr: cli.gateway_addr,
        }
    }
}
