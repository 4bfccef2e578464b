//! Hand built COM callback objects for the startup handshake.
//!
//! Each handler is a `#[repr(C)]` record whose first field points at a
//! static vtable of free functions, which is all COM needs. Reference
//! counting is a fiction here: the records live until the host is
//! destroyed and the counts pin at one. QueryInterface refuses every
//! request, the runtime only ever asks for interfaces the bridge
//! already handed it.
//!
//! Both completion handlers run on the owning thread, called back from
//! the message loop. A failing result code resolves the construction
//! signal with a typed error and tears the window down, so the caller
//! parked in `new` always wakes.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::debug;
use webview2_abi as abi;

use webnest_core::error::{Error, Result};

use crate::signal::CompletionSignal;

use super::{teardown, window, ChromiumShared};

#[repr(C)]
pub(super) struct EnvironmentCompleted {
    vtbl: *const abi::ICoreWebView2CreateCoreWebView2EnvironmentCompletedHandlerVtbl,
    shared: Arc<ChromiumShared>,
    parent: isize,
    controller_handler: *mut ControllerCompleted,
    signal: CompletionSignal<Result<()>>,
}

#[repr(C)]
pub(super) struct ControllerCompleted {
    vtbl: *const abi::ICoreWebView2CreateCoreWebView2ControllerCompletedHandlerVtbl,
    shared: Arc<ChromiumShared>,
    debug: bool,
    signal: CompletionSignal<Result<()>>,
}

static ENVIRONMENT_COMPLETED_VTBL:
    abi::ICoreWebView2CreateCoreWebView2EnvironmentCompletedHandlerVtbl =
    abi::ICoreWebView2CreateCoreWebView2EnvironmentCompletedHandlerVtbl {
        Base: abi::UnknownVtbl {
            QueryInterface: no_query_interface,
            AddRef: pinned_add_ref,
            Release: pinned_release,
        },
        Invoke: environment_completed,
    };

static CONTROLLER_COMPLETED_VTBL:
    abi::ICoreWebView2CreateCoreWebView2ControllerCompletedHandlerVtbl =
    abi::ICoreWebView2CreateCoreWebView2ControllerCompletedHandlerVtbl {
        Base: abi::UnknownVtbl {
            QueryInterface: no_query_interface,
            AddRef: pinned_add_ref,
            Release: pinned_release,
        },
        Invoke: controller_completed,
    };

impl EnvironmentCompleted {
    pub(super) fn new(
        shared: Arc<ChromiumShared>,
        parent: isize,
        controller_handler: *mut ControllerCompleted,
        signal: CompletionSignal<Result<()>>,
    ) -> Self {
        Self {
            vtbl: &ENVIRONMENT_COMPLETED_VTBL,
            shared,
            parent,
            controller_handler,
            signal,
        }
    }
}

impl ControllerCompleted {
    pub(super) fn new(
        shared: Arc<ChromiumShared>,
        debug: bool,
        signal: CompletionSignal<Result<()>>,
    ) -> Self {
        Self {
            vtbl: &CONTROLLER_COMPLETED_VTBL,
            shared,
            debug,
            signal,
        }
    }
}

unsafe extern "system" fn no_query_interface(
    _this: *mut c_void,
    _iid: *const abi::Guid,
    object: *mut *mut c_void,
) -> abi::HRESULT {
    if object.is_null() {
        return abi::E_POINTER;
    }
    unsafe { *object = ptr::null_mut() };
    abi::E_NOINTERFACE
}

unsafe extern "system" fn pinned_add_ref(_this: *mut c_void) -> u32 {
    1
}

unsafe extern "system" fn pinned_release(_this: *mut c_void) -> u32 {
    1
}

/// First phase done: the environment exists, ask it for a controller
/// attached to the host window. The environment itself is not retained
/// beyond this call.
unsafe extern "system" fn environment_completed(
    this: *mut c_void,
    result: abi::HRESULT,
    environment: *mut abi::ICoreWebView2Environment,
) -> abi::HRESULT {
    let handler = unsafe { &*(this as *const EnvironmentCompleted) };
    if result != abi::S_OK || environment.is_null() {
        handler.signal.complete(Err(Error::EnvironmentCreation(result)));
        teardown(&handler.shared);
        return abi::S_OK;
    }
    debug!("environment ready");

    let hr = unsafe {
        ((*(*environment).vtbl).CreateCoreWebView2Controller)(
            environment,
            handler.parent,
            handler.controller_handler as *mut c_void,
        )
    };
    if hr != abi::S_OK {
        handler.signal.complete(Err(Error::ControllerCreation(hr)));
        teardown(&handler.shared);
    }
    abi::S_OK
}

/// Second phase done: retain the controller and its webview, apply the
/// settings and wake the caller parked in construction.
unsafe extern "system" fn controller_completed(
    this: *mut c_void,
    result: abi::HRESULT,
    controller: *mut abi::ICoreWebView2Controller,
) -> abi::HRESULT {
    let handler = unsafe { &*(this as *const ControllerCompleted) };
    if result != abi::S_OK || controller.is_null() {
        handler.signal.complete(Err(Error::ControllerCreation(result)));
        teardown(&handler.shared);
        return abi::S_OK;
    }

    unsafe {
        // The controller arrives unowned, the webview arrives already
        // retained through its out parameter.
        ((*(*controller).vtbl).Base.AddRef)(controller as *mut c_void);
        let mut webview: *mut abi::ICoreWebView2 = ptr::null_mut();
        let hr = ((*(*controller).vtbl).GetCoreWebView2)(controller, &mut webview);
        if hr != abi::S_OK || webview.is_null() {
            abi::release_controller(controller);
            handler.signal.complete(Err(Error::ControllerCreation(hr)));
            teardown(&handler.shared);
            return abi::S_OK;
        }

        {
            let mut native = handler.shared.native.lock().unwrap();
            native.controller = controller as usize;
            native.webview = webview as usize;
        }

        apply_settings(webview, handler.debug);
        ((*(*controller).vtbl).PutIsVisible)(controller, 1);
    }
    window::resize_to_client(&handler.shared);

    debug!("controller ready");
    handler.signal.complete(Ok(()));
    abi::S_OK
}

/// Developer tools and context menus follow the debug flag.
unsafe fn apply_settings(webview: *mut abi::ICoreWebView2, debug: bool) {
    let mut settings: *mut abi::ICoreWebView2Settings = ptr::null_mut();
    let hr = unsafe { ((*(*webview).vtbl).GetSettings)(webview, &mut settings) };
    if hr != abi::S_OK || settings.is_null() {
        return;
    }
    let enabled = abi::BOOL::from(debug);
    unsafe {
        ((*(*settings).vtbl).PutAreDevToolsEnabled)(settings, enabled);
        ((*(*settings).vtbl).PutAreDefaultContextMenusEnabled)(settings, enabled);
        ((*(*settings).vtbl).Base.Release)(settings as *mut c_void);
    }
}
