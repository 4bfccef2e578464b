//! ICoreWebView2Controller, the window facing half of a webview.

use std::ffi::c_void;

use crate::unknown::UnknownVtbl;
use crate::webview::ICoreWebView2;
use crate::{Rect, BOOL, HRESULT, UnusedSlot};

#[repr(C)]
pub struct ICoreWebView2Controller {
    pub vtbl: *const ICoreWebView2ControllerVtbl,
}

#[repr(C)]
pub struct ICoreWebView2ControllerVtbl {
    pub Base: UnknownVtbl,
    pub GetIsVisible: UnusedSlot,
    pub PutIsVisible:
        unsafe extern "system" fn(this: *mut ICoreWebView2Controller, visible: BOOL) -> HRESULT,
    pub GetBounds: UnusedSlot,
    pub PutBounds:
        unsafe extern "system" fn(this: *mut ICoreWebView2Controller, bounds: Rect) -> HRESULT,
    pub GetZoomFactor: UnusedSlot,
    pub PutZoomFactor: UnusedSlot,
    pub AddZoomFactorChanged: UnusedSlot,
    pub RemoveZoomFactorChanged: UnusedSlot,
    pub SetBoundsAndZoomFactor: UnusedSlot,
    pub MoveFocus: UnusedSlot,
    pub AddMoveFocusRequested: UnusedSlot,
    pub RemoveMoveFocusRequested: UnusedSlot,
    pub AddGotFocus: UnusedSlot,
    pub RemoveGotFocus: UnusedSlot,
    pub AddLostFocus: UnusedSlot,
    pub RemoveLostFocus: UnusedSlot,
    pub AddAcceleratorKeyPressed: UnusedSlot,
    pub RemoveAcceleratorKeyPressed: UnusedSlot,
    pub GetParentWindow: UnusedSlot,
    pub PutParentWindow: UnusedSlot,
    pub NotifyParentWindowPositionChanged:
        unsafe extern "system" fn(this: *mut ICoreWebView2Controller) -> HRESULT,
    pub Close: unsafe extern "system" fn(this: *mut ICoreWebView2Controller) -> HRESULT,
    pub GetCoreWebView2: unsafe extern "system" fn(
        this: *mut ICoreWebView2Controller,
        webview: *mut *mut ICoreWebView2,
    ) -> HRESULT,
}

/// Releases a controller reference.
///
/// # Safety
///
/// `controller` must be a live controller pointer owned by the caller.
pub unsafe fn release_controller(controller: *mut ICoreWebView2Controller) {
    unsafe { ((*(*controller).vtbl).Base.Release)(controller as *mut c_void) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    const SLOT: usize = size_of::<usize>();

    #[test]
    fn test_controller_vtbl_layout() {
        assert_eq!(size_of::<ICoreWebView2ControllerVtbl>(), 26 * SLOT);
        assert_eq!(offset_of!(ICoreWebView2ControllerVtbl, PutIsVisible), 4 * SLOT);
        assert_eq!(offset_of!(ICoreWebView2ControllerVtbl, PutBounds), 6 * SLOT);
        assert_eq!(
            offset_of!(ICoreWebView2ControllerVtbl, NotifyParentWindowPositionChanged),
            23 * SLOT
        );
        assert_eq!(offset_of!(ICoreWebView2ControllerVtbl, Close), 24 * SLOT);
        assert_eq!(
            offset_of!(ICoreWebView2ControllerVtbl, GetCoreWebView2),
            25 * SLOT
        );
    }
}
