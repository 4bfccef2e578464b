//! Hand written COM ABI definitions for the WebView2 embedding
//! interfaces.
//!
//! The WebView2 runtime is driven through COM interfaces, but the
//! loader is resolved at run time from a module extracted next to the
//! browser profile, so nothing here links against an import library.
//! This crate defines just enough of the ABI to create an environment
//! and controller, navigate, and toggle settings: vtable structs with
//! every slot named in published order, where only the slots the bridge
//! actually calls carry real signatures and the rest are opaque
//! padding.
//!
//! IMPORTANT: These struct layouts MUST match the published stable
//! interfaces exactly. A wrong slot count or order means calling an
//! unrelated method. The layout tests pin the offsets on every
//! platform, which is also why this crate has no Windows dependency.
//!
//! # Safety
//!
//! Everything here is raw ABI. Callers are responsible for pointer
//! validity, reference counting and staying on the thread that owns
//! the interface.

#![allow(non_snake_case)]
#![allow(non_camel_case_types)]

use std::ffi::c_void;

pub mod controller;
pub mod environment;
pub mod handlers;
pub mod settings;
pub mod unknown;
pub mod webview;

pub use controller::*;
pub use environment::*;
pub use handlers::*;
pub use settings::*;
pub use unknown::*;
pub use webview::*;

/// COM result code. Zero is success, the high bit marks failure.
pub type HRESULT = i32;

/// COM boolean. Zero is false, anything else is true.
pub type BOOL = i32;

pub const S_OK: HRESULT = 0;
pub const E_FAIL: HRESULT = 0x8000_4005u32 as i32;
pub const E_NOINTERFACE: HRESULT = 0x8000_4002u32 as i32;
pub const E_POINTER: HRESULT = 0x8000_4003u32 as i32;

/// Interface identifier, layout compatible with the platform GUID.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

/// Rectangle in client coordinates, layout compatible with RECT.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// A vtable slot the bridge never calls. Only its size matters.
pub type UnusedSlot = Option<unsafe extern "system" fn()>;

/// Signature of the `CreateCoreWebView2EnvironmentWithOptions` export
/// of the loader module. The folder arguments are null terminated
/// UTF-16, null meaning the default.
pub type CreateEnvironmentWithOptionsFn = unsafe extern "system" fn(
    browser_executable_folder: *const u16,
    user_data_folder: *const u16,
    environment_options: *mut c_void,
    environment_created_handler: *mut c_void,
) -> HRESULT;

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_rect_layout() {
        assert_eq!(size_of::<Rect>(), 16);
        assert_eq!(offset_of!(Rect, left), 0);
        assert_eq!(offset_of!(Rect, top), 4);
        assert_eq!(offset_of!(Rect, right), 8);
        assert_eq!(offset_of!(Rect, bottom), 12);
    }

    #[test]
    fn test_guid_layout() {
        assert_eq!(size_of::<Guid>(), 16);
        assert_eq!(offset_of!(Guid, data4), 8);
    }

    #[test]
    fn test_unused_slot_is_pointer_sized() {
        assert_eq!(size_of::<UnusedSlot>(), size_of::<usize>());
    }
}
