//! Platform backends behind one construction seam.
//!
//! Each platform compiles exactly the backends it can drive. The
//! facade only ever sees [`Native`] and the [`create`] function, so
//! engine selection and platform gating live here and nowhere else.

#[cfg(not(any(windows, target_os = "android")))]
mod headless;
#[cfg(windows)]
mod legacy;
#[cfg(target_os = "android")]
mod reflective;
#[cfg(windows)]
mod webview2;

use std::sync::Arc;

use webnest_core::config::ResolvedConfig;
#[cfg(not(windows))]
use webnest_core::error::Error;
use webnest_core::error::Result;
use webnest_core::types::Engine;

use crate::lifecycle::Lifecycle;

#[cfg(windows)]
pub(crate) use self::windows_native::Native;

#[cfg(target_os = "android")]
pub(crate) type Native = reflective::ReflectiveHost;

#[cfg(not(any(windows, target_os = "android")))]
pub(crate) type Native = headless::HeadlessHost;

#[cfg(windows)]
pub(crate) fn create(config: &ResolvedConfig, lifecycle: Arc<Lifecycle>) -> Result<Native> {
    match config.engine {
        Engine::Auto | Engine::Chromium => {
            webview2::ChromiumHost::create(config, lifecycle).map(Native::Chromium)
        }
        Engine::Legacy => legacy::LegacyHost::create(config, lifecycle).map(Native::Legacy),
    }
}

#[cfg(target_os = "android")]
pub(crate) fn create(config: &ResolvedConfig, lifecycle: Arc<Lifecycle>) -> Result<Native> {
    match config.engine {
        Engine::Auto => reflective::ReflectiveHost::create(config, lifecycle),
        other => Err(Error::Unsupported(other.as_str())),
    }
}

#[cfg(not(any(windows, target_os = "android")))]
pub(crate) fn create(config: &ResolvedConfig, lifecycle: Arc<Lifecycle>) -> Result<Native> {
    match config.engine {
        Engine::Auto => headless::HeadlessHost::create(config, lifecycle),
        other => Err(Error::Unsupported(other.as_str())),
    }
}

#[cfg(windows)]
mod windows_native {
    use webnest_core::error::Result;
    use webnest_core::types::{BackendKind, Size, SizeHint, Visibility};

    use super::legacy::LegacyHost;
    use super::webview2::ChromiumHost;

    /// The backend actually driving this instance.
    pub(crate) enum Native {
        Chromium(ChromiumHost),
        Legacy(LegacyHost),
    }

    macro_rules! delegate {
        ($self:ident, $host:ident => $call:expr) => {
            match $self {
                Native::Chromium($host) => $call,
                Native::Legacy($host) => $call,
            }
        };
    }

    impl Native {
        pub(crate) fn kind(&self) -> BackendKind {
            delegate!(self, host => host.kind())
        }

        pub(crate) fn window(&self) -> usize {
            delegate!(self, host => host.window())
        }

        pub(crate) fn run(&self) -> Result<()> {
            delegate!(self, host => host.run())
        }

        pub(crate) fn navigate(&self, url: &str) -> Result<()> {
            delegate!(self, host => host.navigate(url))
        }

        pub(crate) fn set_title(&self, title: &str) -> Result<()> {
            delegate!(self, host => host.set_title(title))
        }

        pub(crate) fn set_size(&self, size: Size, hint: SizeHint) -> Result<()> {
            delegate!(self, host => host.set_size(size, hint))
        }

        pub(crate) fn set_visibility(&self, visibility: Visibility) -> Result<()> {
            delegate!(self, host => host.set_visibility(visibility))
        }

        pub(crate) fn hibernate(&self) -> Result<()> {
            delegate!(self, host => host.hibernate())
        }

        pub(crate) fn resume(&self) -> Result<()> {
            delegate!(self, host => host.resume())
        }

        pub(crate) fn terminate(&self) -> Result<()> {
            delegate!(self, host => host.terminate())
        }

        pub(crate) fn destroy(&self) -> Result<()> {
            delegate!(self, host => host.destroy())
        }
    }
}
