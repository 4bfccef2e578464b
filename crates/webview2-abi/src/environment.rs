//! ICoreWebView2Environment, the factory for controllers.

use std::ffi::c_void;

use crate::unknown::UnknownVtbl;
use crate::{HRESULT, UnusedSlot};

#[repr(C)]
pub struct ICoreWebView2Environment {
    pub vtbl: *const ICoreWebView2EnvironmentVtbl,
}

#[repr(C)]
pub struct ICoreWebView2EnvironmentVtbl {
    pub Base: UnknownVtbl,
    /// Starts the second phase of the startup handshake. The parent
    /// window is a raw HWND value and the handler a completion object
    /// built in the caller.
    pub CreateCoreWebView2Controller: unsafe extern "system" fn(
        this: *mut ICoreWebView2Environment,
        parent_window: isize,
        handler: *mut c_void,
    ) -> HRESULT,
    pub CreateWebResourceResponse: UnusedSlot,
    pub GetBrowserVersionString: UnusedSlot,
    pub AddNewBrowserVersionAvailable: UnusedSlot,
    pub RemoveNewBrowserVersionAvailable: UnusedSlot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    const SLOT: usize = size_of::<usize>();

    #[test]
    fn test_environment_vtbl_layout() {
        assert_eq!(size_of::<ICoreWebView2EnvironmentVtbl>(), 8 * SLOT);
        assert_eq!(
            offset_of!(ICoreWebView2EnvironmentVtbl, CreateCoreWebView2Controller),
            3 * SLOT
        );
    }
}
