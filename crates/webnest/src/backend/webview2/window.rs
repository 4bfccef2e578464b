//! Win32 window plumbing for the Chromium backend.

use std::env;
use std::ffi::c_void;
use std::os::windows::ffi::OsStrExt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::error;
use webview2_abi as abi;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, EndPaint, GetStockObject, HBRUSH, PAINTSTRUCT, WHITE_BRUSH,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::SetFocus;
use windows::Win32::UI::Shell::ExtractIconW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DispatchMessageW, GetClassInfoExW, GetClientRect,
    GetMessageW, LoadCursorW, PostMessageW, RegisterClassExW, SetForegroundWindow, ShowWindow,
    TranslateMessage, UpdateWindow, CS_HREDRAW, CS_OWNDC, CS_VREDRAW, CW_USEDEFAULT, HICON,
    IDC_ARROW, MINMAXINFO, MSG, SHOW_WINDOW_CMD, SW_MAXIMIZE, SW_MINIMIZE, SW_SHOW,
    WINDOW_EX_STYLE, WM_CLOSE, WM_DESTROY, WM_ERASEBKGND, WM_GETMINMAXINFO, WM_NULL, WM_PAINT,
    WM_SIZE, WM_SIZING, WM_WINDOWPOSCHANGED, WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
};

use webnest_core::config::ResolvedConfig;
use webnest_core::error::{Error, Result};
use webnest_core::types::Visibility;

use crate::dispatch::DispatchDrain;

use super::{teardown, ChromiumShared, REGISTRY};

const WINDOW_CLASS: PCWSTR = w!("WebnestWindow");

pub(super) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

pub(super) fn show_command(visibility: Visibility) -> SHOW_WINDOW_CMD {
    match visibility {
        Visibility::Default => SW_SHOW,
        Visibility::Maximized => SW_MAXIMIZE,
        Visibility::Minimized => SW_MINIMIZE,
    }
}

/// Creates the dedicated host window, registering the window class on
/// first use.
pub(super) fn create_window(config: &ResolvedConfig) -> Result<HWND> {
    unsafe {
        let instance: HINSTANCE = GetModuleHandleW(None).unwrap_or_default().into();
        ensure_window_class(instance)?;

        let title = wide(&config.title);
        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE(0),
            WINDOW_CLASS,
            PCWSTR::from_raw(title.as_ptr()),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            config.size.width,
            config.size.height,
            None,
            None,
            instance,
            None,
        )
        .map_err(|e| Error::window_creation(e.to_string()))?;

        let _ = ShowWindow(hwnd, show_command(config.visibility));
        let _ = SetForegroundWindow(hwnd);
        let _ = SetFocus(hwnd);
        let _ = UpdateWindow(hwnd);
        Ok(hwnd)
    }
}

unsafe fn ensure_window_class(instance: HINSTANCE) -> Result<()> {
    unsafe {
        let mut existing = WNDCLASSEXW::default();
        if GetClassInfoExW(instance, WINDOW_CLASS, &mut existing).is_ok() {
            return Ok(());
        }

        let icon = application_icon(instance);
        let class = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW | CS_OWNDC,
            lpfnWndProc: Some(wnd_proc),
            hInstance: instance,
            hIcon: icon,
            hIconSm: icon,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            hbrBackground: HBRUSH(GetStockObject(WHITE_BRUSH).0),
            lpszClassName: WINDOW_CLASS,
            ..Default::default()
        };
        if RegisterClassExW(&class) == 0 {
            return Err(Error::class_registration(
                std::io::Error::last_os_error().to_string(),
            ));
        }
    }
    Ok(())
}

/// The window reuses the embedding executable's own icon.
unsafe fn application_icon(instance: HINSTANCE) -> HICON {
    let Ok(path) = env::current_exe() else {
        return HICON::default();
    };
    let path: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
    unsafe { ExtractIconW(instance, PCWSTR::from_raw(path.as_ptr()), 0) }
}

/// Pumps native messages and queued work until teardown.
///
/// Queued items always run as a batch between messages, never in the
/// middle of one. Producers post `WM_NULL` after enqueueing so a loop
/// parked in message retrieval wakes up to drain.
pub(super) fn message_loop(shared: &Arc<ChromiumShared>, drain: &DispatchDrain) {
    let mut msg = MSG::default();
    loop {
        drain.drain();
        if shared.hwnd.load(Ordering::Acquire) == 0 {
            break;
        }
        let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match result.0 {
            -1 => {
                error!("message retrieval failed");
                break;
            }
            0 => break,
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }
    // Stragglers posted during teardown still resolve their signals.
    drain.drain();
}

/// Nudges a loop parked in message retrieval.
pub(super) fn wake(shared: &ChromiumShared) {
    let hwnd = shared.hwnd.load(Ordering::Acquire);
    if hwnd == 0 {
        return;
    }
    unsafe {
        let _ = PostMessageW(HWND(hwnd as *mut c_void), WM_NULL, WPARAM(0), LPARAM(0));
    }
}

/// Syncs the browser bounds to the window's client area.
pub(super) fn resize_to_client(shared: &ChromiumShared) {
    let hwnd = shared.hwnd.load(Ordering::Acquire);
    if hwnd == 0 {
        return;
    }
    let mut rect = RECT::default();
    unsafe {
        let _ = GetClientRect(HWND(hwnd as *mut c_void), &mut rect);
    }
    let native = shared.native.lock().unwrap();
    if native.controller == 0 {
        return;
    }
    let bounds = abi::Rect {
        left: 0,
        top: 0,
        right: rect.right - rect.left,
        bottom: rect.bottom - rect.top,
    };
    let controller = native.controller as *mut abi::ICoreWebView2Controller;
    unsafe {
        ((*(*controller).vtbl).PutBounds)(controller, bounds);
    }
}

/// Fills in the tracking bounds recorded by hinted resizes. Bounds
/// never set are left at the system defaults.
fn apply_size_limits(shared: &ChromiumShared, lparam: LPARAM) {
    let info = lparam.0 as *mut MINMAXINFO;
    if info.is_null() {
        return;
    }
    let limits = shared.limits.lock().unwrap();
    unsafe {
        if let Some(max) = limits.max {
            let point = POINT {
                x: max.width,
                y: max.height,
            };
            (*info).ptMaxSize = point;
            (*info).ptMaxTrackSize = point;
        }
        if let Some(min) = limits.min {
            (*info).ptMinTrackSize = POINT {
                x: min.width,
                y: min.height,
            };
        }
    }
}

fn notify_position_changed(shared: &ChromiumShared) {
    let native = shared.native.lock().unwrap();
    if native.controller == 0 {
        return;
    }
    let controller = native.controller as *mut abi::ICoreWebView2Controller;
    unsafe {
        ((*(*controller).vtbl).NotifyParentWindowPositionChanged)(controller);
    }
}

pub(super) unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let Some(shared) = REGISTRY.get(hwnd.0 as isize) else {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    };
    match msg {
        WM_SIZE | WM_SIZING => {
            resize_to_client(&shared);
            LRESULT(0)
        }
        WM_WINDOWPOSCHANGED => {
            notify_position_changed(&shared);
            unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
        }
        WM_GETMINMAXINFO => {
            apply_size_limits(&shared, lparam);
            LRESULT(0)
        }
        WM_ERASEBKGND => LRESULT(1),
        WM_PAINT => {
            let mut paint = PAINTSTRUCT::default();
            unsafe {
                let _ = BeginPaint(hwnd, &mut paint);
                let _ = EndPaint(hwnd, &paint);
            }
            LRESULT(0)
        }
        WM_CLOSE | WM_DESTROY => {
            // Same gate the facade uses, so a native close and an API
            // destroy cannot both run teardown.
            if shared.lifecycle.destroy() {
                teardown(&shared);
            }
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}
