//! Core types for the webnest embedding bridge.
//!
//! This crate carries everything the backends share but none of the
//! platform plumbing: configuration and its defaulting rules, the error
//! taxonomy, proxy endpoint formatting, certificate allowlist encoding
//! and logging setup. The platform backends live in the `webnest`
//! crate.

pub mod certs;
pub mod config;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod types;

pub use certs::{chromium_spki_list, reflective_blob, CertificateAuthority};
pub use config::{Config, IsolationExemption, ResolvedConfig, TransportConfig, FALLBACK_TITLE};
pub use error::{Error, Result};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use proxy::ProxyAddr;
pub use types::{BackendKind, Engine, Size, SizeHint, Visibility};
