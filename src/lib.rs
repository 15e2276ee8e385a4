// src/lib.rs

pub mod config;
pub mod constants;
pub mod metrics;
pub mod output_guard; // At-most-one OUTPUT event per artifact
pub mod population;
pub mod popularity; // Dirichlet-prior node popularity
pub mod runner;
pub mod store;
pub mod synthesizer;
pub mod tsv_export;
pub mod types;
pub mod validation;
pub mod workload;

pub use config::Config;
pub use store::{InMemoryStore, MetadataStore, StoreError};
pub use workload::{FillEvents, Workload};
