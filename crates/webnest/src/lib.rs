//! Embeds a native browser view inside a host application window.
//!
//! One lifecycle contract fronts three structurally different native
//! integrations. On Windows the Chromium based engine is driven through
//! hand built COM callback objects and a dedicated per instance message
//! loop, with the bundled legacy module as the alternative engine. On
//! Android a companion object shipped with the host application is
//! resolved and invoked through JNI reflection. Elsewhere a headless
//! stand in keeps the contract testable.
//!
//! Construction blocks until the native side is ready, however
//! asynchronous its protocol is underneath. Afterwards every operation
//! is safe from any thread: calls are either queued to the instance's
//! owning thread or serialized under an instance mutex, and anything
//! called after [`WebView::destroy`] is a silent no-op.
//!
//! ```no_run
//! use webnest::{Config, WebView};
//!
//! fn main() -> webnest::Result<()> {
//!     let view = WebView::new(Config {
//!         title: "Demo".into(),
//!         url: "https://example.com".into(),
//!         ..Config::default()
//!     })?;
//!     view.run()?;
//!     Ok(())
//! }
//! ```

mod backend;
mod dispatch;
mod lifecycle;
mod registry;
mod signal;

use std::sync::Arc;

use tracing::{debug, info};

pub use lifecycle::LifecycleState;
pub use webnest_core::{
    chromium_spki_list, init_logging, reflective_blob, BackendKind, CertificateAuthority, Config,
    Engine, Error, IsolationExemption, LogConfig, LogFormat, ProxyAddr, ResolvedConfig, Result,
    Size, SizeHint, TransportConfig, Visibility, FALLBACK_TITLE,
};

use lifecycle::Lifecycle;

/// One embedded browser view with its own native resources.
///
/// Dropping a live instance destroys it.
pub struct WebView {
    backend: backend::Native,
    kind: BackendKind,
    lifecycle: Arc<Lifecycle>,
    config: ResolvedConfig,
}

impl WebView {
    /// Builds an instance for the resolved configuration and blocks
    /// until the native side is ready. On failure nothing is left
    /// behind, no instance, no window, no retained native references.
    pub fn new(config: Config) -> Result<Self> {
        let config = config.resolve();
        info!(
            title = %config.title,
            engine = config.engine.as_str(),
            "creating webview"
        );

        let lifecycle = Arc::new(Lifecycle::new());
        let backend = backend::create(&config, Arc::clone(&lifecycle))?;
        let kind = backend.kind();
        debug!(
            backend = kind.as_str(),
            window = backend.window(),
            "backend ready"
        );

        let view = Self {
            backend,
            kind,
            lifecycle,
            config,
        };
        view.backend.set_size(view.config.size, SizeHint::None)?;
        if !view.config.url.is_empty() {
            view.backend.navigate(&view.config.url)?;
        }
        view.backend.set_title(&view.config.title)?;
        Ok(view)
    }

    /// Parks the calling thread until [`terminate`](Self::terminate) or
    /// [`destroy`](Self::destroy) releases it. Running again after a
    /// hibernation resumes the native view first.
    pub fn run(&self) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        let resuming = self.lifecycle.state() == LifecycleState::Hibernated;
        if self.lifecycle.start_running() && resuming {
            self.backend.resume()?;
        }
        self.backend.run()
    }

    /// Suspends a running instance. Blocks until the native side has
    /// acknowledged, which on the reflective contract means parking
    /// until destroy. Anything but a running instance is left alone.
    pub fn hibernate(&self) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        if !self.lifecycle.hibernate() {
            return Ok(());
        }
        self.backend.hibernate()
    }

    /// Navigates to `url`. An empty `url` falls back to the originally
    /// configured address, never to a later navigation target. Empty on
    /// top of an unconfigured address does nothing.
    pub fn set_url(&self, url: &str) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        let target = self.config.effective_url(url);
        if target.is_empty() {
            return Ok(());
        }
        self.backend.navigate(target)
    }

    pub fn set_title(&self, title: &str) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        self.backend.set_title(title)
    }

    pub fn set_size(&self, size: Size, hint: SizeHint) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        self.backend.set_size(size, hint)
    }

    pub fn set_visibility(&self, visibility: Visibility) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        self.backend.set_visibility(visibility)
    }

    /// Stops the run loop. What that means is backend specific: the
    /// Chromium backend folds it into destroy, the legacy module stops
    /// its loop but stays destroyable, the reflective backend ignores
    /// it.
    pub fn terminate(&self) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        self.backend.terminate()
    }

    /// Releases the native resources and unblocks every parked caller.
    /// Idempotent, any number of calls release exactly once.
    pub fn destroy(&self) -> Result<()> {
        self.shutdown()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    /// Raw native window handle, zero once destroyed.
    pub fn window(&self) -> usize {
        self.backend.window()
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    fn shutdown(&self) -> Result<()> {
        if !self.lifecycle.destroy() {
            return Ok(());
        }
        info!(backend = self.kind.as_str(), "destroying webview");
        self.backend.destroy()
    }
}

#[cfg(target_os = "android")]
impl WebView {
    /// Buzzes the device through the companion object.
    pub fn vibrate(&self, millis: i64) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        self.backend.vibrate(millis)
    }

    /// Keeps the screen on through the companion object.
    pub fn acquire_wake_lock(&self) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        self.backend.acquire_wake_lock()
    }
}

impl Drop for WebView {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(all(test, not(any(windows, target_os = "android"))))]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn init_test_logging() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_construction_applies_initial_settings_in_order() {
        let view = WebView::new(Config {
            title: "Facade".into(),
            url: "https://start.example/".into(),
            ..Config::default()
        })
        .unwrap();
        view.backend.barrier();

        assert_eq!(view.state(), LifecycleState::Created);
        assert_eq!(view.backend_kind(), BackendKind::Headless);
        assert!(view.window() != 0);
        assert_eq!(
            view.backend.sizes(),
            vec![(Size::new(600, 600), SizeHint::None)]
        );
        assert_eq!(view.backend.navigations(), vec!["https://start.example/"]);
        assert_eq!(view.backend.titles(), vec!["Facade"]);
        view.destroy().unwrap();
    }

    #[test]
    fn test_resolved_defaults_are_visible() {
        let view = WebView::new(Config::default()).unwrap();
        let config = view.config();
        assert!(!config.title.is_empty());
        assert_eq!(config.size, Size::new(600, 600));
        assert!(config.storage_path.ends_with(&config.title));
        view.destroy().unwrap();
    }

    #[test]
    fn test_blank_initial_url_skips_navigation() {
        let view = WebView::new(Config::default()).unwrap();
        view.set_url("").unwrap();
        view.backend.barrier();
        assert!(view.backend.navigations().is_empty());
        view.destroy().unwrap();
    }

    #[test]
    fn test_empty_url_falls_back_to_configured_address() {
        let view = WebView::new(Config {
            url: "https://start.example/".into(),
            ..Config::default()
        })
        .unwrap();
        view.set_url("https://other.example/").unwrap();
        view.set_url("").unwrap();
        view.backend.barrier();
        // The fallback is the configured address, not the last target.
        assert_eq!(
            view.backend.navigations(),
            vec![
                "https://start.example/",
                "https://other.example/",
                "https://start.example/",
            ]
        );
        view.destroy().unwrap();
    }

    #[test]
    fn test_run_blocks_until_destroy() {
        init_test_logging();
        let view = Arc::new(WebView::new(Config::default()).unwrap());
        let runner = {
            let view = Arc::clone(&view);
            thread::spawn(move || view.run().unwrap())
        };
        {
            let view = Arc::clone(&view);
            wait_until(move || view.state() == LifecycleState::Running);
        }
        view.destroy().unwrap();
        runner.join().unwrap();
        assert_eq!(view.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let view = WebView::new(Config::default()).unwrap();
        view.destroy().unwrap();
        assert!(view.backend.destroy_applied());
        assert!(!view.backend.is_registered());
        assert_eq!(view.window(), 0);
        view.destroy().unwrap();
        assert_eq!(view.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_post_destroy_calls_are_silent() {
        let view = WebView::new(Config::default()).unwrap();
        view.destroy().unwrap();
        view.set_title("gone").unwrap();
        view.set_url("https://gone.example/").unwrap();
        view.set_size(Size::new(1, 1), SizeHint::None).unwrap();
        view.set_visibility(Visibility::Maximized).unwrap();
        view.terminate().unwrap();
        view.run().unwrap();
        view.hibernate().unwrap();
        // Nothing above reached the backend. One title from
        // construction, no navigations at all.
        assert!(view.backend.navigations().is_empty());
        assert_eq!(view.backend.titles().len(), 1);
    }

    #[test]
    fn test_hibernate_parks_until_destroy() {
        init_test_logging();
        let view = Arc::new(WebView::new(Config::default()).unwrap());
        let runner = {
            let view = Arc::clone(&view);
            thread::spawn(move || view.run().unwrap())
        };
        {
            let view = Arc::clone(&view);
            wait_until(move || view.state() == LifecycleState::Running);
        }

        let sleeper = {
            let view = Arc::clone(&view);
            thread::spawn(move || view.hibernate().unwrap())
        };
        {
            let view = Arc::clone(&view);
            wait_until(move || view.state() == LifecycleState::Hibernated);
        }
        view.backend.barrier();
        assert_eq!(view.backend.hibernation_count(), 1);

        // Not running, so this neither transitions nor blocks.
        view.hibernate().unwrap();
        assert_eq!(view.state(), LifecycleState::Hibernated);

        view.destroy().unwrap();
        runner.join().unwrap();
        sleeper.join().unwrap();
    }

    #[test]
    fn test_second_run_resumes_a_hibernated_instance() {
        let view = Arc::new(WebView::new(Config::default()).unwrap());
        let runner = {
            let view = Arc::clone(&view);
            thread::spawn(move || view.run().unwrap())
        };
        {
            let view = Arc::clone(&view);
            wait_until(move || view.state() == LifecycleState::Running);
        }
        let sleeper = {
            let view = Arc::clone(&view);
            thread::spawn(move || view.hibernate().unwrap())
        };
        {
            let view = Arc::clone(&view);
            wait_until(move || view.state() == LifecycleState::Hibernated);
        }

        let second_runner = {
            let view = Arc::clone(&view);
            thread::spawn(move || view.run().unwrap())
        };
        {
            let view = Arc::clone(&view);
            wait_until(move || view.state() == LifecycleState::Running);
        }
        view.backend.barrier();
        assert_eq!(view.backend.hibernation_count(), 1);
        assert_eq!(view.backend.resume_count(), 1);

        view.destroy().unwrap();
        runner.join().unwrap();
        sleeper.join().unwrap();
        second_runner.join().unwrap();
    }

    #[test]
    fn test_explicit_engines_are_refused_here() {
        for engine in [Engine::Chromium, Engine::Legacy] {
            let result = WebView::new(Config {
                engine,
                ..Config::default()
            });
            match result {
                Err(Error::Unsupported(name)) => assert_eq!(name, engine.as_str()),
                Err(other) => panic!("unexpected error: {other}"),
                Ok(_) => panic!("construction should have been refused"),
            }
        }
    }
}
