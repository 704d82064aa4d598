//! # Bookstore
//!
//! A demonstration gRPC service with an HTTP/JSON gateway in front of it.
//!
//! * **[`service`]:** `bookstore.Inventory/GetBooks` answers a fixed inventory,
//!   `bookstore.Echo/Echo` returns its input.
//! * **[`server`]:** tonic routes for both services plus server reflection.
//! * **[`gateway`]:** the HTTP route mapping, served through `bookstore-gateway`.
//! * **[`app`]:** the startup sequence and supervision of both listeners.
pub mod app;
pub mod gateway;
pub mod server;
pub mod service;
