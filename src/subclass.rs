/*
 * Subclassing of native controls. A control that has raw message handlers
 * gets `subclass_proc` layered over its class procedure with a
 * session-allocated subclass ID. The control object is found through the
 * handle registry, not through the reference-data word.
 *
 * On WM_NCDESTROY the hook is removed before anything else runs. Removal is
 * tracked per (handle, subclass ID), so removing twice is a no-op.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::events::WindowCore;
use crate::registry::{InstalledHooks, Routed};
use crate::types::{WmArgs, msg};
use crate::window_common::{registry_insert, route_message, to_handle};

use std::cell::RefCell;
use std::rc::Rc;

use windows::Win32::{
    Foundation::{HWND, LPARAM, LRESULT, WPARAM},
    UI::Shell::{DefSubclassProc, RemoveWindowSubclass, SetWindowSubclass},
};

thread_local! {
    static INSTALLED: RefCell<InstalledHooks> = RefCell::new(InstalledHooks::new());
}

pub(crate) fn install(hwnd: HWND, core: &Rc<WindowCore>, subclass_id: usize) -> PlatformResult<()> {
    registry_insert(hwnd, core);
    let ok = unsafe { SetWindowSubclass(hwnd, Some(subclass_proc), subclass_id, 0) }.as_bool();
    if !ok {
        return Err(PlatformError::win32_call(
            "SetWindowSubclass",
            format!("{hwnd:?}, subclass ID {subclass_id}"),
        ));
    }
    INSTALLED.with(|hooks| hooks.borrow_mut().mark_installed(to_handle(hwnd), subclass_id));
    log::debug!(
        "Subclass: installed ID {subclass_id} on {} {hwnd:?}",
        core.kind()
    );
    Ok(())
}

/// Removes the hook if it is still installed. Returns whether it was.
pub(crate) fn remove(hwnd: HWND, subclass_id: usize) -> bool {
    let was_installed =
        INSTALLED.with(|hooks| hooks.borrow_mut().take_installed(to_handle(hwnd), subclass_id));
    if !was_installed {
        log::warn!("Subclass: ID {subclass_id} on {hwnd:?} already removed");
        return false;
    }
    let removed = unsafe { RemoveWindowSubclass(hwnd, Some(subclass_proc), subclass_id) };
    if !removed.as_bool() {
        log::warn!("Subclass: RemoveWindowSubclass({hwnd:?}, {subclass_id}) reported failure");
    }
    true
}

unsafe extern "system" fn subclass_proc(
    hwnd: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    subclass_id: usize,
    _ref_data: usize,
) -> LRESULT {
    if message == msg::WM_NCDESTROY {
        remove(hwnd, subclass_id);
    }
    match route_message(hwnd, WmArgs::new(message, wparam.0, lparam.0)) {
        Routed::Handled(Some(result)) => LRESULT(result),
        Routed::Handled(None) => unsafe { DefSubclassProc(hwnd, message, wparam, lparam) },
        Routed::Unknown => {
            log::trace!("Subclass: message {message:#06X} for unregistered {hwnd:?}");
            unsafe { DefSubclassProc(hwnd, message, wparam, lparam) }
        }
    }
}
