//! ICoreWebView2, the content facing half of a webview.

use std::ffi::c_void;

use crate::settings::ICoreWebView2Settings;
use crate::unknown::UnknownVtbl;
use crate::{HRESULT, UnusedSlot};

#[repr(C)]
pub struct ICoreWebView2 {
    pub vtbl: *const ICoreWebView2Vtbl,
}

#[repr(C)]
pub struct ICoreWebView2Vtbl {
    pub Base: UnknownVtbl,
    pub GetSettings: unsafe extern "system" fn(
        this: *mut ICoreWebView2,
        settings: *mut *mut ICoreWebView2Settings,
    ) -> HRESULT,
    pub GetSource: UnusedSlot,
    /// `uri` is a null terminated UTF-16 string.
    pub Navigate:
        unsafe extern "system" fn(this: *mut ICoreWebView2, uri: *const u16) -> HRESULT,
    pub NavigateToString: UnusedSlot,
    pub AddNavigationStarting: UnusedSlot,
    pub RemoveNavigationStarting: UnusedSlot,
    pub AddContentLoading: UnusedSlot,
    pub RemoveContentLoading: UnusedSlot,
    pub AddSourceChanged: UnusedSlot,
    pub RemoveSourceChanged: UnusedSlot,
    pub AddHistoryChanged: UnusedSlot,
    pub RemoveHistoryChanged: UnusedSlot,
    pub AddNavigationCompleted: UnusedSlot,
    pub RemoveNavigationCompleted: UnusedSlot,
    pub AddFrameNavigationStarting: UnusedSlot,
    pub RemoveFrameNavigationStarting: UnusedSlot,
    pub AddFrameNavigationCompleted: UnusedSlot,
    pub RemoveFrameNavigationCompleted: UnusedSlot,
    pub AddScriptDialogOpening: UnusedSlot,
    pub RemoveScriptDialogOpening: UnusedSlot,
    pub AddPermissionRequested: UnusedSlot,
    pub RemovePermissionRequested: UnusedSlot,
    pub AddProcessFailed: UnusedSlot,
    pub RemoveProcessFailed: UnusedSlot,
    pub AddScriptToExecuteOnDocumentCreated: UnusedSlot,
    pub RemoveScriptToExecuteOnDocumentCreated: UnusedSlot,
    pub ExecuteScript: UnusedSlot,
    pub CapturePreview: UnusedSlot,
    pub Reload: UnusedSlot,
    pub PostWebMessageAsJson: UnusedSlot,
    pub PostWebMessageAsString: UnusedSlot,
    pub AddWebMessageReceived: UnusedSlot,
    pub RemoveWebMessageReceived: UnusedSlot,
    pub CallDevToolsProtocolMethod: UnusedSlot,
    pub GetBrowserProcessId: UnusedSlot,
    pub GetCanGoBack: UnusedSlot,
    pub GetCanGoForward: UnusedSlot,
    pub GoBack: UnusedSlot,
    pub GoForward: UnusedSlot,
    pub GetDevToolsProtocolEventReceiver: UnusedSlot,
    pub Stop: UnusedSlot,
    pub AddNewWindowRequested: UnusedSlot,
    pub RemoveNewWindowRequested: UnusedSlot,
    pub AddDocumentTitleChanged: UnusedSlot,
    pub RemoveDocumentTitleChanged: UnusedSlot,
    pub GetDocumentTitle: UnusedSlot,
    pub AddHostObjectToScript: UnusedSlot,
    pub RemoveHostObjectFromScript: UnusedSlot,
    pub OpenDevToolsWindow: UnusedSlot,
    pub AddContainsFullScreenElementChanged: UnusedSlot,
    pub RemoveContainsFullScreenElementChanged: UnusedSlot,
    pub GetContainsFullScreenElement: UnusedSlot,
    pub AddWebResourceRequested: UnusedSlot,
    pub RemoveWebResourceRequested: UnusedSlot,
    pub AddWebResourceRequestedFilter: UnusedSlot,
    pub RemoveWebResourceRequestedFilter: UnusedSlot,
    pub AddWindowCloseRequested: UnusedSlot,
    pub RemoveWindowCloseRequested: UnusedSlot,
}

/// Releases a webview reference.
///
/// # Safety
///
/// `webview` must be a live webview pointer owned by the caller.
pub unsafe fn release_webview(webview: *mut ICoreWebView2) {
    unsafe { ((*(*webview).vtbl).Base.Release)(webview as *mut c_void) };
}
