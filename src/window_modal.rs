/*
 * A modal top-level window built from code rather than a dialog resource.
 * While it runs, its owner is disabled and a nested message loop pumps
 * messages until the modal window is destroyed.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::session::Session;
use crate::traits::{Parent, Window};
use crate::types::{NativeHandle, Point, Size, msg};
use crate::window_common::{
    CreateParams, ParentKind, UiThreadHandle, WindowBase, create_native_window,
    register_window_class, run_message_loop, to_handle, to_hwnd,
};

use std::cell::Cell;
use std::rc::Rc;

use windows::Win32::{
    Foundation::{HWND, LPARAM, WPARAM},
    UI::{
        Input::KeyboardAndMouse::{EnableWindow, SetActiveWindow},
        WindowsAndMessaging::{
            PostMessageW, PostQuitMessage, SW_SHOW, ShowWindow, WINDOW_EX_STYLE, WINDOW_STYLE,
            WM_CLOSE, WS_CAPTION, WS_CLIPCHILDREN, WS_EX_CONTROLPARENT, WS_EX_DLGMODALFRAME,
            WS_SYSMENU,
        },
    },
};

#[derive(Debug, Clone)]
pub struct WindowModalOpts {
    pub title: String,
    pub class_name: Option<String>,
    /// Logical client size.
    pub size: Size,
    pub position: Option<Point>,
    pub style: WINDOW_STYLE,
    pub ex_style: WINDOW_EX_STYLE,
}

impl Default for WindowModalOpts {
    fn default() -> Self {
        Self {
            title: "Modal window".to_string(),
            class_name: None,
            size: Size::new(400, 250),
            position: None,
            style: WS_CAPTION | WS_SYSMENU | WS_CLIPCHILDREN,
            ex_style: WS_EX_DLGMODALFRAME | WS_EX_CONTROLPARENT,
        }
    }
}

/// Re-enables the owner exactly once, before the modal window goes away, so
/// activation returns to the owner instead of another application.
fn release_owner(owner: &Cell<NativeHandle>) {
    let handle = owner.replace(NativeHandle::NULL);
    if handle.is_null() {
        return;
    }
    let hwnd = to_hwnd(handle);
    unsafe {
        let _ = EnableWindow(hwnd, true);
        let _ = SetActiveWindow(hwnd);
    }
    log::debug!("WindowModal: owner {hwnd:?} re-enabled");
}

#[derive(Debug)]
pub struct WindowModal {
    base: WindowBase,
    opts: WindowModalOpts,
    owner: Rc<Cell<NativeHandle>>,
}

impl Window for WindowModal {
    fn hwnd(&self) -> HWND {
        self.base.hwnd()
    }
}

impl Parent for WindowModal {
    fn base(&self) -> &WindowBase {
        &self.base
    }
}

impl WindowModal {
    pub fn new(session: &Session, opts: WindowModalOpts) -> Self {
        let base = WindowBase::new(session, "WindowModal", ParentKind::Window);
        let owner = Rc::new(Cell::new(NativeHandle::NULL));
        {
            // A user WM_CLOSE handler may veto closing; then the owner stays disabled.
            let owner = Rc::clone(&owner);
            let core = Rc::downgrade(base.core());
            base.core().events().add_internal_msg(msg::WM_CLOSE, move |_| {
                let vetoable = core
                    .upgrade()
                    .is_some_and(|core| core.events().has_user_handler_for(msg::WM_CLOSE));
                if !vetoable {
                    release_owner(&owner);
                }
                None
            });
        }
        {
            let owner = Rc::clone(&owner);
            base.core().events().add_internal_msg(msg::WM_DESTROY, move |_| {
                release_owner(&owner);
                None
            });
        }
        Self { base, opts, owner }
    }

    /*
     * Shows the window modally over `owner` and returns once it was
     * destroyed. A WM_QUIT arriving meanwhile ends the nested loop and is
     * posted again so the outer loop sees it too.
     */
    pub fn show_modal(&self, owner: &impl Window) -> PlatformResult<()> {
        let hwnd_owner = owner.checked_hwnd()?;
        let session = self.base.session();
        let class_name = self
            .opts
            .class_name
            .clone()
            .unwrap_or_else(|| format!("{}_Modal", session.config().window_class_name()));
        register_window_class(session, &class_name)?;

        let hwnd = create_native_window(
            &self.base,
            CreateParams {
                class_name: &class_name,
                title: &self.opts.title,
                style: self.opts.style,
                ex_style: self.opts.ex_style,
                position: self.opts.position,
                client_size: self.opts.size,
                owner: Some(hwnd_owner),
            },
        )?;

        self.owner.set(to_handle(hwnd_owner));
        unsafe {
            let _ = EnableWindow(hwnd_owner, false);
            let _ = ShowWindow(hwnd, SW_SHOW);
        }
        log::debug!("WindowModal: running over owner {hwnd_owner:?}");

        let core = Rc::clone(self.base.core());
        let dialog_nav = session.config().enable_dialog_navigation.then_some(hwnd);
        let outcome = run_message_loop(dialog_nav, || core.is_created());
        release_owner(&self.owner);

        if let Some(exit_code) = outcome? {
            log::debug!("WindowModal: WM_QUIT({exit_code}) inside modal loop, re-posting");
            if let Err(e) = self.destroy() {
                log::warn!("WindowModal: destroying after WM_QUIT failed: {e}");
            }
            unsafe { PostQuitMessage(exit_code) };
        }
        Ok(())
    }

    pub fn close(&self) -> PlatformResult<()> {
        let hwnd = self.checked_hwnd()?;
        unsafe { PostMessageW(Some(hwnd), WM_CLOSE, WPARAM(0), LPARAM(0)) }
            .map_err(|e| PlatformError::win32_call("PostMessageW(WM_CLOSE)", format!("{hwnd:?}: {e:?}")))
    }

    pub fn ui_thread_handle(&self) -> PlatformResult<UiThreadHandle> {
        self.base.ui_thread_handle()
    }
}
