//! Data-quality alerts
//!
//! Compares the distinct values of categorical columns against allow-lists
//! and posts a webhook message when unexpected values show up.

pub mod checker;
pub mod config;
pub mod notifier;
pub mod runner;

pub use checker::{evaluate, find_outliers};
pub use config::{default_checks, load_checks, CheckDefinition, ConfigError};
pub use notifier::{DeliveryOutcome, HttpTransport, Notifier, NotifierError, WebhookTransport};
pub use runner::{run_once, CheckOutcome, CheckRunner, CheckStatus, RunError, RunReport};
