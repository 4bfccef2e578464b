//! Embedder supplied configuration and its resolved form.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::certs::CertificateAuthority;
use crate::proxy::ProxyAddr;
use crate::types::{Engine, Size, Visibility};

/// Window title used when the executable name cannot be determined.
pub const FALLBACK_TITLE: &str = "webnest";

/// Boundary to the host's network isolation exemption mechanism.
///
/// Granting loopback access to the browser engine is a shell level
/// operation owned by the embedding application. The bridge only
/// decides when to ask, and treats failure as advisory.
pub trait IsolationExemption: Send + Sync {
    /// Requests a loopback exemption for the given package identity.
    fn request_loopback(&self, identity: &str) -> std::io::Result<()>;
}

/// Embedder supplied construction options. Immutable once an instance
/// has been built from them.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Window title. Empty means derive one from the executable name.
    pub title: String,
    /// Initial content size in pixels. Non positive dimensions fall
    /// back to the default.
    pub size: Size,
    /// Browser profile directory, also where extracted native modules
    /// are expected. Empty means a per title directory under the system
    /// temporary directory.
    pub storage_path: PathBuf,
    /// First URL to show. Empty means start blank.
    pub url: String,
    /// How the host window appears when first shown.
    pub visibility: Visibility,
    /// Enables developer tools where the engine supports them.
    pub debug: bool,
    /// Engine family to use.
    pub engine: Engine,
    /// Existing host window or view to embed into, as a raw handle
    /// value. Zero means create a dedicated window where the platform
    /// allows it.
    pub window: usize,
    /// Host virtual machine handle for the reflective backend. Zero on
    /// platforms that do not need one.
    pub vm: usize,
    /// Network transport settings.
    pub transport: TransportConfig,
}

/// Network transport settings for the embedded engine.
#[derive(Clone, Default)]
pub struct TransportConfig {
    /// Forward proxy for page traffic. Empty host means direct.
    pub proxy: ProxyAddr,
    /// Extra certificate authorities the engine should trust.
    pub certificate_authorities: Vec<CertificateAuthority>,
    /// Allow proxy and allowlist settings even when the engine cannot
    /// scope them to page traffic only.
    pub insecure_bypass_custom_proxy: bool,
    /// Ask the platform to exempt loopback traffic from network
    /// isolation. Best effort.
    pub ignore_network_isolation: bool,
    /// Hook consulted when a loopback exemption is requested.
    pub isolation_exemption: Option<Arc<dyn IsolationExemption>>,
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("proxy", &self.proxy)
            .field(
                "certificate_authorities",
                &self.certificate_authorities.len(),
            )
            .field(
                "insecure_bypass_custom_proxy",
                &self.insecure_bypass_custom_proxy,
            )
            .field("ignore_network_isolation", &self.ignore_network_isolation)
            .field(
                "isolation_exemption",
                &self.isolation_exemption.is_some(),
            )
            .finish()
    }
}

/// Configuration after the defaulting rules have been applied.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub title: String,
    pub size: Size,
    pub storage_path: PathBuf,
    /// The originally configured URL. Kept verbatim so later empty
    /// navigation requests can fall back to it.
    pub url: String,
    pub visibility: Visibility,
    pub debug: bool,
    pub engine: Engine,
    pub window: usize,
    pub vm: usize,
    pub transport: TransportConfig,
}

impl Config {
    /// Applies the defaulting rules: a title derived from the
    /// executable name, 600x600 dimensions and a per title storage
    /// directory under the temp directory.
    pub fn resolve(self) -> ResolvedConfig {
        let stem = executable_stem();
        self.resolve_with_stem(stem.as_deref())
    }

    fn resolve_with_stem(self, stem: Option<&str>) -> ResolvedConfig {
        let title = if self.title.is_empty() {
            match stem {
                Some(stem) if !stem.is_empty() => title_case(stem),
                _ => FALLBACK_TITLE.to_owned(),
            }
        } else {
            self.title
        };

        let mut size = self.size;
        if size.width <= 0 {
            size.width = Size::default().width;
        }
        if size.height <= 0 {
            size.height = Size::default().height;
        }

        let storage_path = if self.storage_path.as_os_str().is_empty() {
            env::temp_dir().join(&title)
        } else {
            self.storage_path
        };

        ResolvedConfig {
            title,
            size,
            storage_path,
            url: self.url,
            visibility: self.visibility,
            debug: self.debug,
            engine: self.engine,
            window: self.window,
            vm: self.vm,
            transport: self.transport,
        }
    }
}

impl ResolvedConfig {
    /// Target for a navigation request. An empty request falls back to
    /// the originally configured URL.
    pub fn effective_url<'a>(&'a self, requested: &'a str) -> &'a str {
        if requested.is_empty() {
            &self.url
        } else {
            requested
        }
    }
}

fn executable_stem() -> Option<String> {
    let exe = env::current_exe().ok()?;
    Some(exe.file_stem()?.to_str()?.to_owned())
}

/// Uppercases every letter that starts a word, where words break on
/// anything that is not alphanumeric or an underscore. This mirrors
/// how command names are conventionally shown as window titles.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for ch in s.chars() {
        if boundary && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        boundary = !(ch.is_alphanumeric() || ch == '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_derives_everything() {
        let resolved = Config::default().resolve_with_stem(Some("demo-app"));
        assert_eq!(resolved.title, "Demo-App");
        assert_eq!(resolved.size, Size::new(600, 600));
        assert_eq!(resolved.storage_path, env::temp_dir().join("Demo-App"));
        assert_eq!(resolved.url, "");
        assert_eq!(resolved.visibility, Visibility::Default);
    }

    #[test]
    fn test_missing_stem_falls_back() {
        let resolved = Config::default().resolve_with_stem(None);
        assert_eq!(resolved.title, FALLBACK_TITLE);
        assert_eq!(
            resolved.storage_path,
            env::temp_dir().join(FALLBACK_TITLE)
        );
    }

    #[test]
    fn test_explicit_values_survive_resolution() {
        let config = Config {
            title: "Fixed".into(),
            size: Size::new(1024, 768),
            storage_path: PathBuf::from("/var/lib/fixed"),
            url: "https://example.com".into(),
            visibility: Visibility::Maximized,
            ..Default::default()
        };
        let resolved = config.resolve_with_stem(Some("ignored"));
        assert_eq!(resolved.title, "Fixed");
        assert_eq!(resolved.size, Size::new(1024, 768));
        assert_eq!(resolved.storage_path, PathBuf::from("/var/lib/fixed"));
        assert_eq!(resolved.url, "https://example.com");
        assert_eq!(resolved.visibility, Visibility::Maximized);
    }

    #[test]
    fn test_dimensions_default_independently() {
        let resolved = Config {
            size: Size::new(0, 480),
            ..Default::default()
        }
        .resolve_with_stem(Some("demo"));
        assert_eq!(resolved.size, Size::new(600, 480));

        let resolved = Config {
            size: Size::new(-10, -10),
            ..Default::default()
        }
        .resolve_with_stem(Some("demo"));
        assert_eq!(resolved.size, Size::new(600, 600));
    }

    #[test]
    fn test_title_case_word_boundaries() {
        assert_eq!(title_case("demo"), "Demo");
        assert_eq!(title_case("demo-app"), "Demo-App");
        assert_eq!(title_case("demo app"), "Demo App");
        // Underscores and digits do not break words.
        assert_eq!(title_case("demo_app"), "Demo_app");
        assert_eq!(title_case("app2go"), "App2go");
    }

    #[test]
    fn test_effective_url_fallback() {
        let resolved = Config {
            url: "https://example.com/start".into(),
            ..Default::default()
        }
        .resolve_with_stem(Some("demo"));
        assert_eq!(
            resolved.effective_url("https://example.com/other"),
            "https://example.com/other"
        );
        assert_eq!(resolved.effective_url(""), "https://example.com/start");
    }

    #[test]
    fn test_effective_url_with_blank_start() {
        let resolved = Config::default().resolve_with_stem(Some("demo"));
        assert_eq!(resolved.effective_url(""), "");
    }
}
