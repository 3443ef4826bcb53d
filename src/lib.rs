pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod sink;
pub mod store;

pub use crate::config::{AppConfig, ReconConfig};
pub use db::create_pool;
pub use error::{MalformedRecord, ReconError};
pub use models::{RawBatch, ReconReport};
pub use service::Reconciler;
pub use sink::{CsvSink, JsonSink, ResultSink};
pub use store::{CreditMemoList, CreditMemoStore, InvoiceIndex, InvoiceStore};
