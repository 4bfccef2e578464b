//! The IUnknown slots every COM vtable starts with.

use std::ffi::c_void;

use crate::{Guid, HRESULT};

/// First three slots of every COM interface.
#[repr(C)]
pub struct UnknownVtbl {
    pub QueryInterface:
        unsafe extern "system" fn(this: *mut c_void, iid: *const Guid, object: *mut *mut c_void) -> HRESULT,
    pub AddRef: unsafe extern "system" fn(this: *mut c_void) -> u32,
    pub Release: unsafe extern "system" fn(this: *mut c_void) -> u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_unknown_is_three_slots() {
        assert_eq!(size_of::<UnknownVtbl>(), 3 * size_of::<usize>());
    }
}
