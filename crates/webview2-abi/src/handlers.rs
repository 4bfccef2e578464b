//! Completion handler vtables for the two phase startup handshake.
//!
//! The runtime calls back through these during environment and
//! controller creation. The bridge builds the objects by hand: a
//! `#[repr(C)]` struct whose first field points at a static vtable,
//! with whatever state the callback needs behind it.

use std::ffi::c_void;

use crate::controller::ICoreWebView2Controller;
use crate::environment::ICoreWebView2Environment;
use crate::unknown::UnknownVtbl;
use crate::HRESULT;

/// ICoreWebView2CreateCoreWebView2EnvironmentCompletedHandler.
#[repr(C)]
pub struct ICoreWebView2CreateCoreWebView2EnvironmentCompletedHandlerVtbl {
    pub Base: UnknownVtbl,
    pub Invoke: unsafe extern "system" fn(
        this: *mut c_void,
        result: HRESULT,
        environment: *mut ICoreWebView2Environment,
    ) -> HRESULT,
}

/// ICoreWebView2CreateCoreWebView2ControllerCompletedHandler.
#[repr(C)]
pub struct ICoreWebView2CreateCoreWebView2ControllerCompletedHandlerVtbl {
    pub Base: UnknownVtbl,
    pub Invoke: unsafe extern "system" fn(
        this: *mut c_void,
        result: HRESULT,
        controller: *mut ICoreWebView2Controller,
    ) -> HRESULT,
}
