//! Fallback engine backend. Binds the bundled legacy browser module at
//! run time and drives it through its flat C surface.
//!
//! This is the simple case among the backends: every call is a direct,
//! synchronous foreign call. The module runs its own message loop
//! inside `run`, so there is no owning thread, no dispatch queue and
//! no async handshake here. An instance scoped mutex serializes calls
//! against teardown.

use std::ffi::{c_char, c_int, c_void, CString};
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::debug;
use windows::core::{PCSTR, PCWSTR};
use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

use webnest_core::config::ResolvedConfig;
use webnest_core::error::{Error, Result};
use webnest_core::types::{BackendKind, Size, SizeHint, Visibility};

use crate::lifecycle::Lifecycle;

/// File name of the module the asset extractor places under the
/// storage path.
const MODULE_NAME: &str = "webview.dll";

type CreateFn = unsafe extern "C" fn(debug: c_int, window: *mut c_void) -> *mut c_void;
type DestroyFn = unsafe extern "C" fn(w: *mut c_void);
type RunFn = unsafe extern "C" fn(w: *mut c_void);
type TerminateFn = unsafe extern "C" fn(w: *mut c_void);
type GetWindowFn = unsafe extern "C" fn(w: *mut c_void) -> *mut c_void;
type SetTitleFn = unsafe extern "C" fn(w: *mut c_void, title: *const c_char);
type SetSizeFn = unsafe extern "C" fn(w: *mut c_void, width: c_int, height: c_int, hints: c_int);
type NavigateFn = unsafe extern "C" fn(w: *mut c_void, url: *const c_char);

/// Resolved entry points. The module handle is kept for the process
/// lifetime, never freed.
struct Module {
    _module: HMODULE,
    create: CreateFn,
    destroy: DestroyFn,
    run: RunFn,
    terminate: TerminateFn,
    get_window: GetWindowFn,
    set_title: SetTitleFn,
    set_size: SetSizeFn,
    navigate: NavigateFn,
}

fn load_module(path: &Path) -> Result<Module> {
    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
    let module = unsafe { LoadLibraryW(PCWSTR::from_raw(wide.as_ptr())) }
        .map_err(|e| Error::asset_load(path.display().to_string(), e.to_string()))?;
    unsafe {
        Ok(Module {
            create: resolve(module, path, b"webview_create\0")?,
            destroy: resolve(module, path, b"webview_destroy\0")?,
            run: resolve(module, path, b"webview_run\0")?,
            terminate: resolve(module, path, b"webview_terminate\0")?,
            get_window: resolve(module, path, b"webview_get_window\0")?,
            set_title: resolve(module, path, b"webview_set_title\0")?,
            set_size: resolve(module, path, b"webview_set_size\0")?,
            navigate: resolve(module, path, b"webview_navigate\0")?,
            _module: module,
        })
    }
}

unsafe fn resolve<T: Copy>(module: HMODULE, path: &Path, name: &[u8]) -> Result<T> {
    let address = unsafe { GetProcAddress(module, PCSTR::from_raw(name.as_ptr())) }.ok_or_else(|| {
        Error::asset_load(
            path.display().to_string(),
            format!(
                "missing export {}",
                String::from_utf8_lossy(&name[..name.len() - 1])
            ),
        )
    })?;
    Ok(unsafe { std::mem::transmute_copy(&address) })
}

pub(crate) struct LegacyHost {
    module: Module,
    /// Opaque engine pointer, zero once destroyed.
    handle: Mutex<usize>,
}

impl LegacyHost {
    pub(crate) fn create(config: &ResolvedConfig, _lifecycle: Arc<Lifecycle>) -> Result<Self> {
        let module = load_module(&config.storage_path.join(MODULE_NAME))?;
        let debug_flag = c_int::from(config.debug);
        let raw = unsafe { (module.create)(debug_flag, config.window as *mut c_void) };
        if raw.is_null() {
            return Err(Error::window_creation("legacy engine returned null"));
        }
        debug!(debug = config.debug, "legacy engine created");
        Ok(Self {
            module,
            handle: Mutex::new(raw as usize),
        })
    }

    pub(crate) fn kind(&self) -> BackendKind {
        BackendKind::Legacy
    }

    pub(crate) fn window(&self) -> usize {
        let handle = self.handle.lock().unwrap();
        if *handle == 0 {
            return 0;
        }
        unsafe { (self.module.get_window)(*handle as *mut c_void) as usize }
    }

    /// Runs the module's own message loop. Returns when the engine is
    /// terminated or its window closes. The mutex is not held while
    /// the loop runs, so other threads can still reach `terminate`.
    pub(crate) fn run(&self) -> Result<()> {
        let raw = *self.handle.lock().unwrap();
        if raw == 0 {
            return Ok(());
        }
        unsafe { (self.module.run)(raw as *mut c_void) };
        Ok(())
    }

    pub(crate) fn navigate(&self, url: &str) -> Result<()> {
        let handle = self.handle.lock().unwrap();
        if *handle == 0 {
            return Ok(());
        }
        let Ok(url) = CString::new(url) else {
            debug!("navigation target contains a nul byte, ignored");
            return Ok(());
        };
        unsafe { (self.module.navigate)(*handle as *mut c_void, url.as_ptr()) };
        Ok(())
    }

    pub(crate) fn set_title(&self, title: &str) -> Result<()> {
        let handle = self.handle.lock().unwrap();
        if *handle == 0 {
            return Ok(());
        }
        let Ok(title) = CString::new(title) else {
            return Ok(());
        };
        unsafe { (self.module.set_title)(*handle as *mut c_void, title.as_ptr()) };
        Ok(())
    }

    pub(crate) fn set_size(&self, size: Size, hint: SizeHint) -> Result<()> {
        let handle = self.handle.lock().unwrap();
        if *handle == 0 {
            return Ok(());
        }
        unsafe {
            (self.module.set_size)(
                *handle as *mut c_void,
                size.width,
                size.height,
                hint.code(),
            )
        };
        Ok(())
    }

    pub(crate) fn set_visibility(&self, _visibility: Visibility) -> Result<()> {
        // The module's surface has no visibility control.
        Ok(())
    }

    pub(crate) fn hibernate(&self) -> Result<()> {
        Ok(())
    }

    pub(crate) fn resume(&self) -> Result<()> {
        Ok(())
    }

    pub(crate) fn terminate(&self) -> Result<()> {
        let handle = self.handle.lock().unwrap();
        if *handle != 0 {
            unsafe { (self.module.terminate)(*handle as *mut c_void) };
        }
        Ok(())
    }

    /// Stops the loop and releases the engine under the mutex.
    pub(crate) fn destroy(&self) -> Result<()> {
        let mut handle = self.handle.lock().unwrap();
        if *handle != 0 {
            unsafe {
                (self.module.terminate)(*handle as *mut c_void);
                (self.module.destroy)(*handle as *mut c_void);
            }
            *handle = 0;
        }
        Ok(())
    }
}
