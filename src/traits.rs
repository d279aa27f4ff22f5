/*
 * Capability traits. Instead of a hierarchy of marker interfaces, each
 * wrapper implements the small set of capabilities it actually has and
 * functions take `impl Trait` bounds for what they need.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::{ControlId, NativeHandle, Rect, ResizeKind, Size, WmArgs, msg};
use crate::window_common::{WindowBase, to_handle};

use windows::Win32::{
    Foundation::{HWND, RECT},
    Graphics::Gdi::InvalidateRect,
    UI::{
        Input::KeyboardAndMouse::{EnableWindow, IsWindowEnabled, SetFocus},
        WindowsAndMessaging::{
            DestroyWindow, GetClientRect, GetWindowTextLengthW, GetWindowTextW, SW_HIDE,
            SW_SHOW, SetWindowTextW, ShowWindow,
        },
    },
};
use windows::core::HSTRING;

/// Anything backed by a native window handle.
pub trait Window {
    fn hwnd(&self) -> HWND;

    fn handle(&self) -> NativeHandle {
        to_handle(self.hwnd())
    }

    fn checked_hwnd(&self) -> PlatformResult<HWND> {
        let hwnd = self.hwnd();
        if hwnd.is_invalid() {
            return Err(PlatformError::InvalidHandle(
                "native window not created yet".to_string(),
            ));
        }
        Ok(hwnd)
    }

    fn client_rect(&self) -> PlatformResult<Rect> {
        let hwnd = self.checked_hwnd()?;
        let mut rc = RECT::default();
        unsafe { GetClientRect(hwnd, &mut rc) }.map_err(|e| {
            PlatformError::win32_call("GetClientRect", format!("{hwnd:?}: {e:?}"))
        })?;
        Ok(Rect {
            left: rc.left,
            top: rc.top,
            right: rc.right,
            bottom: rc.bottom,
        })
    }

    fn set_visible(&self, visible: bool) -> PlatformResult<()> {
        let hwnd = self.checked_hwnd()?;
        unsafe {
            let _ = ShowWindow(hwnd, if visible { SW_SHOW } else { SW_HIDE });
        }
        Ok(())
    }

    fn invalidate(&self) -> PlatformResult<()> {
        let hwnd = self.checked_hwnd()?;
        if !unsafe { InvalidateRect(Some(hwnd), None, true) }.as_bool() {
            return Err(PlatformError::win32_call("InvalidateRect", format!("{hwnd:?}")));
        }
        Ok(())
    }
}

/// A control living inside a parent window.
pub trait Child: Window {
    fn ctrl_id(&self) -> ControlId;
}

pub trait Focusable: Window {
    fn focus(&self) -> PlatformResult<()> {
        let hwnd = self.checked_hwnd()?;
        unsafe { SetFocus(Some(hwnd)) }
            .map(|_| ())
            .map_err(|e| PlatformError::win32_call("SetFocus", format!("{hwnd:?}: {e:?}")))
    }

    fn set_enabled(&self, enabled: bool) -> PlatformResult<()> {
        let hwnd = self.checked_hwnd()?;
        unsafe {
            let _ = EnableWindow(hwnd, enabled);
        }
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        unsafe { IsWindowEnabled(self.hwnd()) }.as_bool()
    }
}

/// Controls whose caption is their window text.
pub trait TextControl: Window {
    fn text(&self) -> PlatformResult<String> {
        read_window_text(self.checked_hwnd()?)
    }

    fn set_text(&self, text: &str) -> PlatformResult<()> {
        let hwnd = self.checked_hwnd()?;
        unsafe { SetWindowTextW(hwnd, &HSTRING::from(text)) }.map_err(|e| {
            PlatformError::win32_call("SetWindowTextW", format!("{hwnd:?}, {text:?}: {e:?}"))
        })
    }
}

/*
 * Windows that can host child controls. The typed registration helpers all
 * funnel into the raw tables of the parent's `WindowCore` and therefore fail
 * with `PlatformError::AlreadyCreated` once the native window exists.
 */
pub trait Parent: Window {
    #[doc(hidden)]
    fn base(&self) -> &WindowBase;

    /// Raw handler; `None` lets the default window procedure run.
    fn on_msg<F>(&self, code: u32, f: F) -> PlatformResult<()>
    where
        F: Fn(WmArgs) -> Option<isize> + 'static,
    {
        self.base().core().on_msg(code, f)
    }

    /// Runs after the children were created (`WM_CREATE`/`WM_INITDIALOG`).
    fn on_create<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn() -> PlatformResult<()> + 'static,
    {
        let code = self.base().creation_msg();
        let default_result = if code == msg::WM_INITDIALOG { 1 } else { 0 };
        self.base().core().on_msg(code, move |_| {
            if let Err(e) = f() {
                log::error!("Parent: creation handler failed: {e}");
            }
            Some(default_result)
        })
    }

    fn on_size<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn(ResizeKind, Size) -> PlatformResult<()> + 'static,
    {
        self.base().core().on_msg(msg::WM_SIZE, handled("WM_SIZE", move |args| {
            let kind = ResizeKind::from_raw(args.wparam).unwrap_or(ResizeKind::Restored);
            f(
                kind,
                Size::new(args.lo_word_lparam() as i32, args.hi_word_lparam() as i32),
            )
        }))
    }

    /// Menu items (`code` 0), accelerators (`code` 1) or control notifications.
    fn on_command<F>(&self, ctrl_id: ControlId, code: u16, f: F) -> PlatformResult<()>
    where
        F: Fn() -> PlatformResult<()> + 'static,
    {
        self.base()
            .core()
            .on_cmd(ctrl_id, code, handled("WM_COMMAND", move |_| f()))
    }

    /// Replaces the default close behaviour; call `destroy()` to close.
    fn on_close<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn() -> PlatformResult<()> + 'static,
    {
        self.base()
            .core()
            .on_msg(msg::WM_CLOSE, handled("WM_CLOSE", move |_| f()))
    }

    fn on_destroy<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn() -> PlatformResult<()> + 'static,
    {
        self.base().core().on_msg(msg::WM_DESTROY, move |_| {
            if let Err(e) = f() {
                log::error!("Parent: WM_DESTROY handler failed: {e}");
            }
            // Let the default procedure finish teardown.
            None
        })
    }

    fn destroy(&self) -> PlatformResult<()> {
        let hwnd = self.checked_hwnd()?;
        unsafe { DestroyWindow(hwnd) }
            .map_err(|e| PlatformError::win32_call("DestroyWindow", format!("{hwnd:?}: {e:?}")))
    }
}

/*
 * Adapts a fallible handler to the raw table. The message counts as handled
 * either way; a failure is logged since there is no caller to return it to.
 */
pub(crate) fn handled<F>(what: &'static str, f: F) -> impl Fn(WmArgs) -> Option<isize> + 'static
where
    F: Fn(WmArgs) -> PlatformResult<()> + 'static,
{
    move |args| {
        if let Err(e) = f(args) {
            log::error!("{what}: handler failed: {e}");
        }
        Some(0)
    }
}

pub(crate) fn read_window_text(hwnd: HWND) -> PlatformResult<String> {
    read_window_text_with(
        || unsafe { GetWindowTextLengthW(hwnd) },
        |buffer| unsafe { GetWindowTextW(hwnd, buffer) },
    )
}

/*
 * Sizes the buffer from the reported length plus the terminator, then keeps
 * only what the copy call reports as written.
 */
fn read_window_text_with<FLen, FGet>(get_len: FLen, get_text: FGet) -> PlatformResult<String>
where
    FLen: FnOnce() -> i32,
    FGet: FnOnce(&mut [u16]) -> i32,
{
    let len = get_len();
    if len <= 0 {
        return Ok(String::new());
    }
    let mut buffer = vec![0u16; len as usize + 1];
    let copied = get_text(&mut buffer);
    if copied < 0 {
        return Err(PlatformError::win32_call("GetWindowTextW", "copy failed"));
    }
    buffer.truncate(copied as usize);
    Ok(String::from_utf16_lossy(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_window_text_with_handles_strings_longer_than_default_buffer() {
        let long_text = "https://example.com/".repeat(20);
        let utf16: Vec<u16> = long_text.encode_utf16().collect();
        let expected_len = utf16.len() as i32;

        let result = read_window_text_with(
            || expected_len,
            |buf| {
                buf[..utf16.len()].copy_from_slice(&utf16);
                utf16.len() as i32
            },
        )
        .expect("should read text without truncation");

        assert_eq!(result, long_text);
    }
}
