//! Error types shared across the bridge.

use thiserror::Error;

/// Errors surfaced by the embedding bridge.
///
/// Construction failures carry the stage that failed so an embedder can
/// tell a missing runtime apart from a refused configuration. Binding
/// faults on the reflective backend are deliberately absent here: they
/// abort the process instead of propagating.
#[derive(Error, Debug)]
pub enum Error {
    /// A backend that embeds into a host object was handed a zero handle.
    #[error("missing host handle: {0}")]
    MissingHostHandle(&'static str),

    /// A native module expected under the storage path could not be
    /// loaded.
    #[error("failed to load native module {path}: {reason}")]
    AssetLoad { path: String, reason: String },

    /// The window class could not be registered with the platform.
    #[error("window class registration failed: {0}")]
    ClassRegistration(String),

    /// The host window could not be created.
    #[error("window creation failed: {0}")]
    WindowCreation(String),

    /// The browser environment reported a failure code during the
    /// startup handshake.
    #[error("environment creation failed: {0:#010x}")]
    EnvironmentCreation(i32),

    /// The browser controller reported a failure code during the
    /// startup handshake.
    #[error("controller creation failed: {0:#010x}")]
    ControllerCreation(i32),

    /// Construction could not finish for a reason outside the native
    /// handshake, such as the owning thread dying early.
    #[error("construction aborted: {0}")]
    ConstructionAborted(String),

    /// The engine rejected the proxy configuration.
    #[error("the engine rejected the proxy configuration")]
    ProxyRefused,

    /// The engine rejected the certificate allowlist.
    #[error("the engine rejected the certificate allowlist")]
    CertificatesRefused,

    /// A certificate in the allowlist is not valid DER.
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// The requested engine does not exist on this platform.
    #[error("unsupported engine: {0}")]
    Unsupported(&'static str),
}

impl Error {
    pub fn asset_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn class_registration(reason: impl Into<String>) -> Self {
        Self::ClassRegistration(reason.into())
    }

    pub fn window_creation(reason: impl Into<String>) -> Self {
        Self::WindowCreation(reason.into())
    }

    pub fn construction_aborted(reason: impl Into<String>) -> Self {
        Self::ConstructionAborted(reason.into())
    }

    pub fn malformed_certificate(reason: impl Into<String>) -> Self {
        Self::MalformedCertificate(reason.into())
    }
}

/// Result alias used throughout the bridge.
pub type Result<T> = std::result::Result<T, Error>;
