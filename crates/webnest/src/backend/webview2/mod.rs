//! Microsoft Edge WebView2 backend.
//!
//! The embedding process ships `WebView2Loader.dll` under the instance
//! storage directory. A dedicated owning thread initializes COM, builds
//! the host window, then drives environment and controller construction
//! through the completion handlers in [`handlers`]. Every native handle
//! stays on that thread. Other threads reach it through the dispatch
//! queue plus a `WM_NULL` wake, or for window level calls through the
//! handle directly.

mod handlers;
mod window;

use std::env;
use std::ffi::c_void;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};
use webview2_abi as abi;
use windows::core::{s, PCWSTR};
use windows::Win32::Foundation::HWND;
use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};
use windows::Win32::UI::WindowsAndMessaging::{
    DestroyWindow, PostQuitMessage, SetWindowPos, SetWindowTextW, ShowWindow, SWP_NOMOVE,
    SWP_NOZORDER, SW_HIDE, SW_SHOW,
};

use webnest_core::certs::chromium_spki_list;
use webnest_core::config::ResolvedConfig;
use webnest_core::error::{Error, Result};
use webnest_core::types::{BackendKind, Size, SizeHint, Visibility};

use crate::dispatch::{work_queue, DispatchDrain, DispatchQueue};
use crate::lifecycle::Lifecycle;
use crate::registry::Registry;
use crate::signal::{completion_signal, ClosedLatch, CompletionSignal};

const LOADER_MODULE: &str = "WebView2Loader.dll";

/// Packaged app identity of the WebView2 runtime host. Loopback
/// exemptions are granted per identity.
const LOOPBACK_IDENTITY: &str = "Microsoft.Win32WebViewHost_cw5n1h2txyewy";

const ADDITIONAL_ARGUMENTS_VAR: &str = "WEBVIEW2_ADDITIONAL_BROWSER_ARGUMENTS";

/// Runtime selection variables the embedding process may have inherited.
/// They would silently override per instance settings, so construction
/// clears them before handing control to the loader.
const SCRUBBED_VARS: [&str; 4] = [
    ADDITIONAL_ARGUMENTS_VAR,
    "WEBVIEW2_BROWSER_EXECUTABLE_FOLDER",
    "WEBVIEW2_RELEASE_CHANNEL_PREFERENCE",
    "WEBVIEW2_USER_DATA_FOLDER",
];

static REGISTRY: LazyLock<Registry<ChromiumShared>> = LazyLock::new(Registry::default);

/// State shared between the owning thread, the window procedure, the
/// completion handlers, and the facade.
pub(super) struct ChromiumShared {
    pub(super) hwnd: AtomicIsize,
    pub(super) queue: DispatchQueue,
    pub(super) closed: ClosedLatch,
    pub(super) lifecycle: Arc<Lifecycle>,
    pub(super) native: Mutex<NativeRefs>,
    pub(super) limits: Mutex<SizeLimits>,
    owns_window: AtomicBool,
    environment_handler: AtomicUsize,
    controller_handler: AtomicUsize,
}

/// Tracking bounds recorded by hinted resize requests, consulted when
/// the window negotiates its min and max sizes.
#[derive(Default)]
pub(super) struct SizeLimits {
    pub(super) min: Option<Size>,
    pub(super) max: Option<Size>,
}

/// Retained COM pointers, stored as integers and only dereferenced on
/// the owning thread.
#[derive(Default)]
pub(super) struct NativeRefs {
    pub(super) controller: usize,
    pub(super) webview: usize,
}

pub(crate) struct ChromiumHost {
    shared: Arc<ChromiumShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumHost {
    pub(crate) fn create(config: &ResolvedConfig, lifecycle: Arc<Lifecycle>) -> Result<Self> {
        let arguments = browser_arguments(config)?;
        request_isolation_exemption(config);
        scrub_environment(&arguments);

        let (queue, drain) = work_queue();
        let shared = Arc::new(ChromiumShared {
            hwnd: AtomicIsize::new(0),
            queue,
            closed: ClosedLatch::new(),
            lifecycle,
            native: Mutex::new(NativeRefs::default()),
            limits: Mutex::new(SizeLimits::default()),
            owns_window: AtomicBool::new(false),
            environment_handler: AtomicUsize::new(0),
            controller_handler: AtomicUsize::new(0),
        });

        let (signal, ready) = completion_signal();
        let thread = {
            let shared = Arc::clone(&shared);
            let config = config.clone();
            thread::Builder::new()
                .name("webnest-webview2".into())
                .spawn(move || owning_thread(shared, drain, config, signal))
                .map_err(|e| Error::construction_aborted(e.to_string()))?
        };

        let host = Self {
            shared,
            thread: Mutex::new(Some(thread)),
        };
        match ready.wait() {
            Some(Ok(())) => {
                info!("webview2 host ready");
                Ok(host)
            }
            Some(Err(e)) => {
                host.join_and_reclaim();
                Err(e)
            }
            None => {
                host.join_and_reclaim();
                Err(Error::construction_aborted(
                    "host thread exited before construction completed",
                ))
            }
        }
    }

    pub(crate) fn kind(&self) -> BackendKind {
        BackendKind::Chromium
    }

    pub(crate) fn window(&self) -> usize {
        self.shared.hwnd.load(Ordering::Acquire) as usize
    }

    /// Hands a closure to the owning thread and wakes its message loop.
    /// Dropped silently once teardown has started.
    fn post(&self, work: impl FnOnce() + Send + 'static) {
        if self.shared.hwnd.load(Ordering::Acquire) == 0 {
            return;
        }
        self.shared.queue.post(work);
        window::wake(&self.shared);
    }

    pub(crate) fn run(&self) -> Result<()> {
        self.shared.closed.wait();
        Ok(())
    }

    pub(crate) fn navigate(&self, url: &str) -> Result<()> {
        debug!(url = %url, "navigating");
        let shared = Arc::clone(&self.shared);
        let wide_url = window::wide(url);
        self.post(move || {
            let native = shared.native.lock().unwrap();
            if native.webview == 0 {
                return;
            }
            let webview = native.webview as *mut abi::ICoreWebView2;
            unsafe {
                ((*(*webview).vtbl).Navigate)(webview, wide_url.as_ptr());
            }
        });
        Ok(())
    }

    pub(crate) fn set_title(&self, title: &str) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let wide_title = window::wide(title);
        self.post(move || {
            let hwnd = shared.hwnd.load(Ordering::Acquire);
            if hwnd == 0 {
                return;
            }
            unsafe {
                let _ = SetWindowTextW(
                    HWND(hwnd as *mut c_void),
                    PCWSTR::from_raw(wide_title.as_ptr()),
                );
            }
        });
        Ok(())
    }

    /// Applies a resize on the owning thread. Min and max hints only
    /// record tracking bounds, picked up the next time the window
    /// negotiates its limits. A fixed hint pins both bounds and resizes.
    pub(crate) fn set_size(&self, size: Size, hint: SizeHint) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        self.post(move || {
            match hint {
                SizeHint::Min => {
                    shared.limits.lock().unwrap().min = Some(size);
                    return;
                }
                SizeHint::Max => {
                    shared.limits.lock().unwrap().max = Some(size);
                    return;
                }
                SizeHint::Fixed => {
                    let mut limits = shared.limits.lock().unwrap();
                    limits.min = Some(size);
                    limits.max = Some(size);
                }
                SizeHint::None => {}
            }
            let hwnd = shared.hwnd.load(Ordering::Acquire);
            if hwnd == 0 {
                return;
            }
            unsafe {
                let _ = SetWindowPos(
                    HWND(hwnd as *mut c_void),
                    None,
                    0,
                    0,
                    size.width,
                    size.height,
                    SWP_NOMOVE | SWP_NOZORDER,
                );
            }
            window::resize_to_client(&shared);
        });
        Ok(())
    }

    pub(crate) fn set_visibility(&self, visibility: Visibility) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        self.post(move || {
            let hwnd = shared.hwnd.load(Ordering::Acquire);
            if hwnd == 0 {
                return;
            }
            unsafe {
                let _ = ShowWindow(HWND(hwnd as *mut c_void), window::show_command(visibility));
            }
        });
        Ok(())
    }

    /// Hides the window and suspends browser rendering. Returns once the
    /// owning thread has applied both, so callers observe a quiesced
    /// instance.
    pub(crate) fn hibernate(&self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let (signal, applied) = completion_signal();
        self.post(move || {
            apply_suspended(&shared, true);
            signal.complete(());
        });
        applied.wait();
        Ok(())
    }

    pub(crate) fn resume(&self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let (signal, applied) = completion_signal();
        self.post(move || {
            apply_suspended(&shared, false);
            signal.complete(());
        });
        applied.wait();
        Ok(())
    }

    /// Stopping the loop and releasing the native references are one
    /// act here. A quit without teardown would strand retained COM
    /// objects on a thread that no longer drains work.
    pub(crate) fn terminate(&self) -> Result<()> {
        self.destroy()
    }

    pub(crate) fn destroy(&self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        self.shared.queue.post(move || teardown(&shared));
        window::wake(&self.shared);
        self.join_and_reclaim();
        Ok(())
    }

    fn join_and_reclaim(&self) {
        let handle = self.thread.lock().unwrap().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("webview2 host thread panicked");
            }
        }
        // Handler records outlive the browser process's last Release
        // call, which can arrive any time before the thread exits. They
        // are only reclaimed here, after the join.
        reclaim_handlers(&self.shared);
    }
}

fn owning_thread(
    shared: Arc<ChromiumShared>,
    drain: DispatchDrain,
    config: ResolvedConfig,
    signal: CompletionSignal<Result<()>>,
) {
    if let Err(e) = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED).ok() } {
        signal.complete(Err(Error::construction_aborted(e.to_string())));
        return;
    }

    let hwnd = if config.window != 0 {
        // The embedder owns this window and its procedure. It is still
        // registered so teardown bookkeeping stays uniform.
        HWND(config.window as *mut c_void)
    } else {
        match window::create_window(&config) {
            Ok(hwnd) => {
                shared.owns_window.store(true, Ordering::Release);
                hwnd
            }
            Err(e) => {
                signal.complete(Err(e));
                unsafe { CoUninitialize() };
                return;
            }
        }
    };

    shared.hwnd.store(hwnd.0 as isize, Ordering::Release);
    REGISTRY.insert(hwnd.0 as isize, &shared);

    if let Err(e) = start_environment(&shared, &config, signal.clone()) {
        teardown(&shared);
        signal.complete(Err(e));
        unsafe { CoUninitialize() };
        return;
    }

    window::message_loop(&shared, &drain);
    // The handler records hold signal clones until reclamation. If the
    // window was closed mid construction the constructor is still
    // parked, so resolve it here. After a completed construction this
    // is a no-op.
    signal.complete(Err(Error::construction_aborted(
        "host closed during construction",
    )));
    unsafe { CoUninitialize() };
    debug!("owning thread exiting");
}

/// Loads the environment factory and kicks off asynchronous
/// construction. Completion, success or failure, arrives through the
/// handlers on this same thread.
fn start_environment(
    shared: &Arc<ChromiumShared>,
    config: &ResolvedConfig,
    signal: CompletionSignal<Result<()>>,
) -> Result<()> {
    let create_environment = load_loader(&config.storage_path)?;

    let controller_handler = Box::into_raw(Box::new(handlers::ControllerCompleted::new(
        Arc::clone(shared),
        config.debug,
        signal.clone(),
    )));
    let environment_handler = Box::into_raw(Box::new(handlers::EnvironmentCompleted::new(
        Arc::clone(shared),
        shared.hwnd.load(Ordering::Acquire),
        controller_handler,
        signal,
    )));
    shared
        .controller_handler
        .store(controller_handler as usize, Ordering::Release);
    shared
        .environment_handler
        .store(environment_handler as usize, Ordering::Release);

    let user_data = window::wide(&config.storage_path.to_string_lossy());
    let hr = unsafe {
        create_environment(
            std::ptr::null(),
            user_data.as_ptr(),
            std::ptr::null_mut(),
            environment_handler.cast(),
        )
    };
    if hr != abi::S_OK {
        return Err(Error::EnvironmentCreation(hr));
    }
    Ok(())
}

fn load_loader(storage: &Path) -> Result<abi::CreateEnvironmentWithOptionsFn> {
    let path = storage.join(LOADER_MODULE);
    let wide_path = window::wide(&path.to_string_lossy());
    let module = unsafe { LoadLibraryW(PCWSTR::from_raw(wide_path.as_ptr())) }
        .map_err(|e| Error::asset_load(path.display().to_string(), e.to_string()))?;
    let symbol = unsafe {
        GetProcAddress(module, s!("CreateCoreWebView2EnvironmentWithOptions"))
    }
    .ok_or_else(|| {
        Error::asset_load(
            path.display().to_string(),
            "missing export CreateCoreWebView2EnvironmentWithOptions",
        )
    })?;
    Ok(unsafe {
        std::mem::transmute::<unsafe extern "system" fn() -> isize, abi::CreateEnvironmentWithOptionsFn>(
            symbol,
        )
    })
}

/// Releases every native resource owned by an instance. Runs on the
/// owning thread, either from the window procedure on a native close or
/// from a queued work item on an API destroy. The handle swap makes the
/// second caller a no-op.
pub(super) fn teardown(shared: &ChromiumShared) {
    let hwnd = shared.hwnd.swap(0, Ordering::AcqRel);
    if hwnd == 0 {
        return;
    }
    // Unregister first so the window procedure cannot route messages
    // here while handles are being released.
    REGISTRY.remove(hwnd);

    let refs = {
        let mut native = shared.native.lock().unwrap();
        std::mem::take(&mut *native)
    };
    unsafe {
        if refs.controller != 0 {
            let controller = refs.controller as *mut abi::ICoreWebView2Controller;
            ((*(*controller).vtbl).Close)(controller);
        }
        if refs.webview != 0 {
            abi::release_webview(refs.webview as *mut abi::ICoreWebView2);
        }
        if refs.controller != 0 {
            abi::release_controller(refs.controller as *mut abi::ICoreWebView2Controller);
        }
        if shared.owns_window.load(Ordering::Acquire) {
            let _ = DestroyWindow(HWND(hwnd as *mut c_void));
        }
        PostQuitMessage(0);
    }
    shared.closed.fire();
}

fn reclaim_handlers(shared: &ChromiumShared) {
    let environment = shared.environment_handler.swap(0, Ordering::AcqRel);
    if environment != 0 {
        drop(unsafe { Box::from_raw(environment as *mut handlers::EnvironmentCompleted) });
    }
    let controller = shared.controller_handler.swap(0, Ordering::AcqRel);
    if controller != 0 {
        drop(unsafe { Box::from_raw(controller as *mut handlers::ControllerCompleted) });
    }
}

fn apply_suspended(shared: &ChromiumShared, hidden: bool) {
    let hwnd = shared.hwnd.load(Ordering::Acquire);
    if hwnd != 0 {
        let command = if hidden { SW_HIDE } else { SW_SHOW };
        unsafe {
            let _ = ShowWindow(HWND(hwnd as *mut c_void), command);
        }
    }
    let native = shared.native.lock().unwrap();
    if native.controller != 0 {
        let controller = native.controller as *mut abi::ICoreWebView2Controller;
        unsafe {
            ((*(*controller).vtbl).PutIsVisible)(controller, i32::from(!hidden));
        }
    }
}

/// Assembles the Chromium command line for the instance's transport
/// settings. Proxy and trust overrides weaken transport security, so
/// both require the explicit bypass opt in.
fn browser_arguments(config: &ResolvedConfig) -> Result<String> {
    let transport = &config.transport;
    let mut arguments = Vec::new();
    if !transport.proxy.is_empty() {
        if !transport.insecure_bypass_custom_proxy {
            return Err(Error::ProxyRefused);
        }
        arguments.push(format!("--proxy-server={}", transport.proxy));
    }
    if !transport.certificate_authorities.is_empty() {
        if !transport.insecure_bypass_custom_proxy {
            return Err(Error::CertificatesRefused);
        }
        let list = chromium_spki_list(&transport.certificate_authorities)?;
        arguments.push(format!("--ignore-certificate-errors-spki-list={list}"));
    }
    Ok(arguments.join(" "))
}

fn scrub_environment(arguments: &str) {
    for var in SCRUBBED_VARS {
        env::remove_var(var);
    }
    if !arguments.is_empty() {
        env::set_var(ADDITIONAL_ARGUMENTS_VAR, arguments);
    }
}

/// Asks the configured helper to exempt the runtime's packaged identity
/// from network isolation, so pages may reach loopback servers. Best
/// effort, a refusal only degrades loopback access.
fn request_isolation_exemption(config: &ResolvedConfig) {
    if !config.transport.ignore_network_isolation {
        return;
    }
    let Some(exemption) = &config.transport.isolation_exemption else {
        debug!("network isolation exemption requested but no helper is configured");
        return;
    };
    match exemption.request_loopback(LOOPBACK_IDENTITY) {
        Ok(()) => debug!(identity = LOOPBACK_IDENTITY, "loopback exemption granted"),
        Err(e) => warn!(error = %e, "loopback exemption request failed"),
    }
}
