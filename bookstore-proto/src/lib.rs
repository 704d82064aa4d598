//! # Bookstore Proto
//!
//! Generated `prost` messages and `tonic` service bindings for the `bookstore`
//! protobuf package, plus the encoded `FileDescriptorSet` the server exposes
//! through reflection and the HTTP gateway uses to transcode JSON.

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/bookstore.rs"));
}

pub use pb::echo_client::EchoClient;
pub use pb::echo_server::{Echo, EchoServer};
pub use pb::inventory_client::InventoryClient;
pub use pb::inventory_server::{Inventory, InventoryServer};

/// Encoded `FileDescriptorSet` for `proto/bookstore.proto`.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("bookstore_descriptor");
