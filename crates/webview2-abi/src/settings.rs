//! ICoreWebView2Settings, per webview feature toggles.

use crate::unknown::UnknownVtbl;
use crate::{BOOL, HRESULT, UnusedSlot};

#[repr(C)]
pub struct ICoreWebView2Settings {
    pub vtbl: *const ICoreWebView2SettingsVtbl,
}

#[repr(C)]
pub struct ICoreWebView2SettingsVtbl {
    pub Base: UnknownVtbl,
    pub GetIsScriptEnabled: UnusedSlot,
    pub PutIsScriptEnabled: UnusedSlot,
    pub GetIsWebMessageEnabled: UnusedSlot,
    pub PutIsWebMessageEnabled: UnusedSlot,
    pub GetAreDefaultScriptDialogsEnabled: UnusedSlot,
    pub PutAreDefaultScriptDialogsEnabled: UnusedSlot,
    pub GetIsStatusBarEnabled: UnusedSlot,
    pub PutIsStatusBarEnabled: UnusedSlot,
    pub GetAreDevToolsEnabled: UnusedSlot,
    pub PutAreDevToolsEnabled:
        unsafe extern "system" fn(this: *mut ICoreWebView2Settings, enabled: BOOL) -> HRESULT,
    pub GetAreDefaultContextMenusEnabled: UnusedSlot,
    pub PutAreDefaultContextMenusEnabled:
        unsafe extern "system" fn(this: *mut ICoreWebView2Settings, enabled: BOOL) -> HRESULT,
    pub GetAreHostObjectsAllowed: UnusedSlot,
    pub PutAreHostObjectsAllowed: UnusedSlot,
    pub GetIsZoomControlEnabled: UnusedSlot,
    pub PutIsZoomControlEnabled: UnusedSlot,
    pub GetIsBuiltInErrorPageEnabled: UnusedSlot,
    pub PutIsBuiltInErrorPageEnabled: UnusedSlot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    const SLOT: usize = size_of::<usize>();

    #[test]
    fn test_settings_vtbl_layout() {
        assert_eq!(size_of::<ICoreWebView2SettingsVtbl>(), 21 * SLOT);
        assert_eq!(
            offset_of!(ICoreWebView2SettingsVtbl, PutAreDevToolsEnabled),
            12 * SLOT
        );
        assert_eq!(
            offset_of!(ICoreWebView2SettingsVtbl, PutAreDefaultContextMenusEnabled),
            14 * SLOT
        );
    }
}
