//! # Generic gRPC Transport
//!
//! This module contains the low-level building blocks for performing gRPC calls using
//! dynamic message types.
//!
//! Unlike standard `tonic` clients which are strongly typed (e.g., `EchoMessage`),
//! the components here work with `prost_reflect::DynamicMessage`, resolved at runtime
//! from a `DescriptorPool`.
pub mod client;
pub mod codec;
