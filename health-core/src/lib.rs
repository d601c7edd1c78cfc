pub mod classifier;
pub mod config;
pub mod logging;
pub mod report;
pub mod types;

pub use classifier::{classify, classify_all};
pub use config::{Config, HealthThresholds};
pub use report::{FailOn, OutputFormat, Report};
pub use types::{CertificateHealthReport, CertificateRecord, HealthVerdict, SourceError};
