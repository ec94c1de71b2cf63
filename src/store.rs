//! Connectivity to the backing dictionary store.
//!
//! - [`connection`] - the [`Connection`]/[`ConnectionFactory`] seams and the
//!   [`Row`]/[`Value`] result model
//! - [`driver`] - driver selection from `jdbc.driver`
//! - [`sqlite`] - the bundled SQLite backend
//! - [`mysql`] - the MySQL backend

pub mod connection;
pub mod driver;
pub mod mysql;
pub mod sqlite;

pub use connection::{Connection, ConnectionFactory, Row, Value};
pub use driver::Driver;
