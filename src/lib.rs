pub mod classifier;
pub mod clients;
pub mod config;
pub mod deserializers;
pub mod embeddings;
pub mod error;
pub mod frontend;
pub mod generation;
pub mod headers;
pub mod http;
pub mod ingest;
pub mod notebook;
pub mod schemas;
pub mod server;
pub mod tools;

pub use config::Config;
pub use error::{DataPrepError, Result};
pub use server::DataPrepServer;
