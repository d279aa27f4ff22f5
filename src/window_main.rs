/*
 * The application's main window. Children and handlers are declared first,
 * then `run_main` creates the native window, shows it and pumps messages
 * until the window is destroyed, returning the `WM_QUIT` exit code.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::session::Session;
use crate::traits::{Parent, Window};
use crate::types::{Point, Size, msg};
use crate::window_common::{
    CreateParams, ParentKind, UiThreadHandle, WindowBase, create_native_window,
    register_window_class, run_message_loop,
};

use windows::Win32::{
    Foundation::{HWND, LPARAM, WPARAM},
    Graphics::Gdi::UpdateWindow,
    UI::WindowsAndMessaging::{
        PostMessageW, PostQuitMessage, SHOW_WINDOW_CMD, ShowWindow, WINDOW_EX_STYLE, WINDOW_STYLE,
        WM_CLOSE, WS_CLIPCHILDREN, WS_EX_CONTROLPARENT, WS_OVERLAPPEDWINDOW,
    },
};

#[derive(Debug, Clone)]
pub struct WindowMainOpts {
    pub title: String,
    /// Window class; defaults to the session's `window_class_name()`.
    pub class_name: Option<String>,
    /// Logical client size.
    pub size: Size,
    /// `None` lets the system place the window.
    pub position: Option<Point>,
    pub style: WINDOW_STYLE,
    pub ex_style: WINDOW_EX_STYLE,
}

impl Default for WindowMainOpts {
    fn default() -> Self {
        Self {
            title: "Main window".to_string(),
            class_name: None,
            size: Size::new(600, 400),
            position: None,
            style: WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN,
            ex_style: WS_EX_CONTROLPARENT,
        }
    }
}

#[derive(Debug)]
pub struct WindowMain {
    base: WindowBase,
    opts: WindowMainOpts,
}

impl Window for WindowMain {
    fn hwnd(&self) -> HWND {
        self.base.hwnd()
    }
}

impl Parent for WindowMain {
    fn base(&self) -> &WindowBase {
        &self.base
    }
}

impl WindowMain {
    pub fn new(session: &Session, opts: WindowMainOpts) -> Self {
        let base = WindowBase::new(session, "WindowMain", ParentKind::Window);
        // Destroying the main window ends the message loop.
        base.core().events().add_internal_msg(msg::WM_DESTROY, |_| {
            log::debug!("WindowMain: WM_DESTROY, posting WM_QUIT");
            unsafe { PostQuitMessage(0) };
            None
        });
        Self { base, opts }
    }

    /// Creates and shows the window, then runs the message loop. Returns the
    /// exit code carried by `WM_QUIT`.
    pub fn run_main(&self, cmd_show: SHOW_WINDOW_CMD) -> PlatformResult<i32> {
        let session = self.base.session();
        let class_name = self
            .opts
            .class_name
            .clone()
            .unwrap_or_else(|| session.config().window_class_name());
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
                owner: None,
            },
        )?;
        unsafe {
            let _ = ShowWindow(hwnd, cmd_show);
            let _ = UpdateWindow(hwnd);
        }

        let dialog_nav = session.config().enable_dialog_navigation.then_some(hwnd);
        let exit_code = run_message_loop(dialog_nav, || true)?.unwrap_or(0);
        log::debug!("WindowMain: message loop ended with exit code {exit_code}");
        Ok(exit_code)
    }

    /// Asks the window to close, as if the user clicked the close box.
    pub fn close(&self) -> PlatformResult<()> {
        let hwnd = self.checked_hwnd()?;
        unsafe { PostMessageW(Some(hwnd), WM_CLOSE, WPARAM(0), LPARAM(0)) }
            .map_err(|e| PlatformError::win32_call("PostMessageW(WM_CLOSE)", format!("{hwnd:?}: {e:?}")))
    }

    pub fn ui_thread_handle(&self) -> PlatformResult<UiThreadHandle> {
        self.base.ui_thread_handle()
    }
}
