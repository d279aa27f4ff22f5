/*
 * Dialogs loaded from a dialog template resource. The dialog manager creates
 * the children from the template; wrappers declared on a `WindowDialog` bind
 * to them by control ID on WM_INITDIALOG instead of creating anything.
 *
 * The dialog object reaches the dialog procedure as a registry ticket in the
 * init parameter, the same way windows we create pass it in lpCreateParams.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::registry::Routed;
use crate::session::Session;
use crate::traits::{Parent, Window};
use crate::types::{WmArgs, msg};
use crate::window_common::{
    ParentKind, UiThreadHandle, WindowBase, registry_bind, registry_cancel, registry_reserve,
    route_message, to_handle, to_hwnd,
};

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use windows::Win32::{
    Foundation::{GetLastError, HWND, LPARAM, WPARAM},
    UI::WindowsAndMessaging::{
        CreateDialogParamW, DestroyWindow, DialogBoxParamW, EndDialog, SW_SHOW, SetWindowLongPtrW,
        ShowWindow, WINDOW_LONG_PTR_INDEX,
    },
};
use windows::core::PCWSTR;

const DWLP_MSGRESULT: WINDOW_LONG_PTR_INDEX = WINDOW_LONG_PTR_INDEX(0);
const IDCANCEL: u16 = 2;
const BN_CLICKED: u16 = 0;

// Messages whose dialog procedure return value is the result itself.
const WM_CHARTOITEM: u32 = 0x002F;
const WM_COMPAREITEM: u32 = 0x0039;
const WM_QUERYDRAGICON: u32 = 0x0037;
const WM_VKEYTOITEM: u32 = 0x002E;
const WM_CTLCOLORMSGBOX: u32 = 0x0132;
const WM_CTLCOLORSTATIC: u32 = 0x0138;

thread_local! {
    // Tickets of dialogs started with DialogBoxParamW, moved to MODAL_DIALOGS
    // once WM_INITDIALOG reveals the handle.
    static MODAL_TICKETS: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
    static MODAL_DIALOGS: RefCell<HashSet<isize>> = RefCell::new(HashSet::new());
}

fn is_modal(hwnd: HWND) -> bool {
    MODAL_DIALOGS.with(|set| set.borrow().contains(&to_handle(hwnd).0))
}

/// True for messages that a dialog procedure answers through its return value
/// instead of `DWLP_MSGRESULT`.
fn returns_directly(message: u32) -> bool {
    matches!(
        message,
        msg::WM_INITDIALOG | WM_CHARTOITEM | WM_COMPAREITEM | WM_QUERYDRAGICON | WM_VKEYTOITEM
    ) || (WM_CTLCOLORMSGBOX..=WM_CTLCOLORSTATIC).contains(&message)
}

/// Closes a dialog the way it was opened.
fn close_dialog(hwnd: HWND, result: isize) -> PlatformResult<()> {
    if is_modal(hwnd) {
        unsafe { EndDialog(hwnd, result) }
            .map_err(|e| PlatformError::win32_call("EndDialog", format!("{hwnd:?}, {result}: {e:?}")))
    } else {
        unsafe { DestroyWindow(hwnd) }
            .map_err(|e| PlatformError::win32_call("DestroyWindow", format!("{hwnd:?}: {e:?}")))
    }
}

unsafe extern "system" fn dialog_proc(hwnd: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> isize {
    if message == msg::WM_INITDIALOG {
        let ticket = lparam.0 as usize;
        if MODAL_TICKETS.with(|set| set.borrow_mut().remove(&ticket)) {
            MODAL_DIALOGS.with(|set| set.borrow_mut().insert(to_handle(hwnd).0));
        }
        registry_bind(ticket, hwnd);
    }
    if message == msg::WM_NCDESTROY {
        MODAL_DIALOGS.with(|set| set.borrow_mut().remove(&to_handle(hwnd).0));
    }

    let routed = route_message(hwnd, WmArgs::new(message, wparam.0, lparam.0));
    match routed {
        Routed::Handled(Some(result)) if returns_directly(message) => result,
        Routed::Handled(Some(result)) => {
            unsafe { SetWindowLongPtrW(hwnd, DWLP_MSGRESULT, result) };
            1
        }
        Routed::Handled(None) | Routed::Unknown => {
            let args = WmArgs::new(message, wparam.0, lparam.0);
            if message == msg::WM_COMMAND
                && args.lo_word_wparam() == IDCANCEL
                && args.hi_word_wparam() == BN_CLICKED
            {
                // Escape, the close box and a Cancel button all end up here.
                if let Err(e) = close_dialog(hwnd, IDCANCEL as isize) {
                    log::error!("WindowDialog: closing on IDCANCEL failed: {e}");
                }
                return 1;
            }
            // TRUE lets the dialog manager set the default focus.
            isize::from(message == msg::WM_INITDIALOG)
        }
    }
}

#[derive(Debug)]
pub struct WindowDialog {
    base: WindowBase,
    resource_id: u16,
    init_guard_installed: Cell<bool>,
}

impl Window for WindowDialog {
    fn hwnd(&self) -> HWND {
        self.base.hwnd()
    }
}

impl Parent for WindowDialog {
    fn base(&self) -> &WindowBase {
        &self.base
    }
}

impl WindowDialog {
    /// A dialog built from the template with integer ID `resource_id` in the
    /// current module.
    pub fn new(session: &Session, resource_id: u16) -> Self {
        Self {
            base: WindowBase::new(session, "WindowDialog", ParentKind::Dialog),
            resource_id,
            init_guard_installed: Cell::new(false),
        }
    }

    pub fn resource_id(&self) -> u16 {
        self.resource_id
    }

    /*
     * Runs after the children bound on WM_INITDIALOG; a dialog whose
     * children failed to bind is closed right away and the failure is
     * reported by the call that opened it.
     */
    fn install_init_guard(&self) {
        if self.init_guard_installed.replace(true) {
            return;
        }
        let failure = self.base.creation_error_slot();
        let core = Rc::downgrade(self.base.core());
        self.base
            .core()
            .events()
            .add_internal_msg(msg::WM_INITDIALOG, move |_| {
                if failure.borrow().is_none() {
                    return None;
                }
                if let Some(core) = core.upgrade()
                    && let Err(e) = close_dialog(to_hwnd(core.handle()), -1)
                {
                    log::error!("WindowDialog: closing after failed init: {e}");
                }
                None
            });
    }

    fn template(&self) -> PCWSTR {
        // MAKEINTRESOURCEW
        PCWSTR(self.resource_id as usize as *const u16)
    }

    /*
     * Runs the dialog modally and returns the value passed to `end_dialog`
     * (IDCANCEL when closed through Escape or the close box). The caller
     * checks OK/Cancel explicitly.
     */
    pub fn show_modal(&self, owner: Option<&dyn Window>) -> PlatformResult<isize> {
        self.base.core().ensure_not_created("show dialog")?;
        self.install_init_guard();
        let ticket = registry_reserve(self.base.core());
        MODAL_TICKETS.with(|set| set.borrow_mut().insert(ticket));
        let hwnd_owner = owner.map(|w| w.hwnd());

        log::debug!("WindowDialog: showing resource {} modally", self.resource_id);
        let result = unsafe {
            DialogBoxParamW(
                Some(self.base.session().h_instance()),
                self.template(),
                hwnd_owner,
                Some(dialog_proc),
                LPARAM(ticket as isize),
            )
        };
        // Unused if the template failed to load.
        MODAL_TICKETS.with(|set| set.borrow_mut().remove(&ticket));
        registry_cancel(ticket);

        if let Some(err) = self.base.take_creation_error() {
            return Err(err);
        }
        if result == -1 {
            let error = unsafe { GetLastError() };
            return Err(PlatformError::win32_call(
                "DialogBoxParamW",
                format!("resource {}: {error:?}", self.resource_id),
            ));
        }
        Ok(result)
    }

    /// Creates the dialog modelessly and shows it; it lives until `end_dialog`.
    pub fn create_modeless(&self, owner: Option<&dyn Window>) -> PlatformResult<()> {
        self.base.core().ensure_not_created("create dialog")?;
        self.install_init_guard();
        let ticket = registry_reserve(self.base.core());
        let hwnd_owner = owner.map(|w| w.hwnd());

        let created = unsafe {
            CreateDialogParamW(
                Some(self.base.session().h_instance()),
                self.template(),
                hwnd_owner,
                Some(dialog_proc),
                LPARAM(ticket as isize),
            )
        };
        registry_cancel(ticket);
        if let Some(err) = self.base.take_creation_error() {
            return Err(err);
        }
        let hwnd = created.map_err(|e| {
            PlatformError::win32_call(
                "CreateDialogParamW",
                format!("resource {}: {e:?}", self.resource_id),
            )
        })?;
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
        }
        log::debug!(
            "WindowDialog: resource {} created modeless as {hwnd:?}",
            self.resource_id
        );
        Ok(())
    }

    /// Ends a modal dialog with `result`, or destroys a modeless one.
    pub fn end_dialog(&self, result: isize) -> PlatformResult<()> {
        let hwnd = self.checked_hwnd()?;
        close_dialog(hwnd, result)
    }

    pub fn is_open(&self) -> bool {
        self.base.core().is_created()
    }

    pub fn ui_thread_handle(&self) -> PlatformResult<UiThreadHandle> {
        self.base.ui_thread_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_dialog_and_color_messages_return_directly() {
        assert!(returns_directly(msg::WM_INITDIALOG));
        assert!(returns_directly(0x0135)); // WM_CTLCOLORBTN
        assert!(!returns_directly(msg::WM_COMMAND));
        assert!(!returns_directly(msg::WM_NOTIFY));
    }
}
