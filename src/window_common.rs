/*
 * Common Win32 windowing plumbing: the per-thread handle registry, window
 * class registration, native window creation, the shared window procedure,
 * the deferred-position layout pass and the message loop.
 *
 * `WindowBase` is the part every parent window shares: its `WindowCore`
 * (handle + dispatch tables), the layout engine for its children and the
 * queue of closures posted from other threads.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::events::WindowCore;
use crate::layout::Layout;
use crate::registry::{self, HandleRegistry, Routed};
use crate::session::Session;
use crate::types::{ControlId, NativeHandle, Point, ResizeKind, Size, WmArgs, msg};
use crate::ui_thread::{UiTaskQueue, UiTaskSender};

use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Rc;

use windows::Win32::{
    Foundation::{GetLastError, HWND, LPARAM, LRESULT, RECT, WPARAM},
    Graphics::Gdi::{COLOR_BTNFACE, HBRUSH},
    UI::{
        Controls::NMHDR,
        WindowsAndMessaging::{
            AdjustWindowRectEx, BeginDeferWindowPos, CREATESTRUCTW, CS_HREDRAW, CS_VREDRAW,
            CW_USEDEFAULT, CreateWindowExW, DefWindowProcW, DeferWindowPos, DestroyWindow,
            DispatchMessageW, EndDeferWindowPos, GetClassInfoExW, GetMessageW, IDC_ARROW,
            IDI_APPLICATION, IsDialogMessageW, LoadCursorW, LoadIconW, MSG, PostMessageW,
            RegisterClassExW, SWP_NOACTIVATE, SWP_NOZORDER, TranslateMessage, WINDOW_EX_STYLE,
            WINDOW_STYLE, WM_NCCREATE, WNDCLASSEXW,
        },
    },
};
use windows::core::{HSTRING, PCWSTR};

thread_local! {
    /*
     * Handle -> object association for every window and subclassed control
     * created on this thread. Window handles are thread-affine, so a
     * per-thread registry is exactly as wide as the handles it maps.
     */
    static REGISTRY: RefCell<HandleRegistry<WindowCore>> = RefCell::new(HandleRegistry::new());
}

#[inline]
pub(crate) fn to_handle(hwnd: HWND) -> NativeHandle {
    NativeHandle(hwnd.0 as isize)
}

#[inline]
pub(crate) fn to_hwnd(handle: NativeHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

pub(crate) fn registry_reserve(core: &Rc<WindowCore>) -> usize {
    REGISTRY.with(|reg| reg.borrow_mut().reserve(Rc::clone(core)))
}

pub(crate) fn registry_cancel(ticket: usize) {
    REGISTRY.with(|reg| {
        reg.borrow_mut().cancel(ticket);
    });
}

pub(crate) fn registry_insert(hwnd: HWND, core: &Rc<WindowCore>) {
    REGISTRY.with(|reg| reg.borrow_mut().insert(to_handle(hwnd), Rc::clone(core)));
}

/*
 * Binds the object parked under `ticket` to `hwnd`. Called on the first
 * message that carries the ticket (WM_NCCREATE or WM_INITDIALOG).
 */
pub(crate) fn registry_bind(ticket: usize, hwnd: HWND) {
    if ticket == 0 {
        return;
    }
    let bound = REGISTRY.with(|reg| reg.borrow_mut().bind(ticket, to_handle(hwnd)));
    match bound {
        Some(core) => {
            if let Err(e) = core.bind_handle(to_handle(hwnd)) {
                log::error!("WindowCommon: binding {hwnd:?} to {} failed: {e}", core.kind());
            } else {
                log::debug!("WindowCommon: {} bound to {hwnd:?}", core.kind());
            }
        }
        None => log::warn!("WindowCommon: creation ticket {ticket} not found for {hwnd:?}"),
    }
}

/// Reads (idFrom, code) from the `NMHDR` a `WM_NOTIFY` points to.
fn decode_notify_header(lparam: isize) -> Option<(ControlId, i32)> {
    let nmhdr_ptr = lparam as *const NMHDR;
    if nmhdr_ptr.is_null() {
        log::warn!("WM_NOTIFY received with null NMHDR pointer. Ignoring.");
        return None;
    }
    let nmhdr = unsafe { &*nmhdr_ptr };
    Some((ControlId::new(nmhdr.idFrom as u16), nmhdr.code as i32))
}

/*
 * Routes one message to the object registered for `hwnd`. Teardown clears
 * the object's handle and drops the association after the handlers ran.
 */
pub(crate) fn route_message(hwnd: HWND, args: WmArgs) -> Routed {
    REGISTRY.with(|reg| {
        registry::route(reg, to_handle(hwnd), args, |core, args| {
            let header = if args.msg == msg::WM_NOTIFY {
                decode_notify_header(args.lparam)
            } else {
                None
            };
            let result = core.dispatch(args, header);
            if args.msg == msg::WM_NCDESTROY {
                core.clear_handle();
            }
            result
        })
    })
}

/// Window procedure shared by every window class this crate registers.
pub(crate) unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_NCCREATE {
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
        registry_bind(create_struct.lpCreateParams as usize, hwnd);
    }
    match route_message(hwnd, WmArgs::new(msg, wparam.0, lparam.0)) {
        Routed::Handled(Some(result)) => LRESULT(result),
        Routed::Handled(None) | Routed::Unknown => unsafe {
            DefWindowProcW(hwnd, msg, wparam, lparam)
        },
    }
}

/*
 * Registers a window class served by `window_proc`, unless a class with
 * that name already exists for this module instance.
 */
pub(crate) fn register_window_class(session: &Session, class_name: &str) -> PlatformResult<()> {
    let class_name_hstring = HSTRING::from(class_name);
    let class_name_pcwstr = PCWSTR(class_name_hstring.as_ptr());

    unsafe {
        let mut wc_test = WNDCLASSEXW::default();
        if GetClassInfoExW(Some(session.h_instance()), class_name_pcwstr, &mut wc_test).is_ok() {
            log::debug!("WindowCommon: Window class '{class_name}' already registered.");
            return Ok(());
        }

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(window_proc),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: session.h_instance(),
            hIcon: LoadIconW(None, IDI_APPLICATION)?,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            hbrBackground: HBRUSH((COLOR_BTNFACE.0 + 1) as *mut c_void),
            lpszMenuName: PCWSTR::null(),
            lpszClassName: class_name_pcwstr,
            hIconSm: LoadIconW(None, IDI_APPLICATION)?,
        };

        if RegisterClassExW(&wc) == 0 {
            let error = GetLastError();
            log::error!("WindowCommon: RegisterClassExW failed: {error:?}");
            Err(PlatformError::InitializationFailed(format!(
                "RegisterClassExW('{class_name}') failed: {error:?}"
            )))
        } else {
            log::debug!("WindowCommon: Window class '{class_name}' registered successfully.");
            Ok(())
        }
    }
}

/// Which message creates a parent's children: `WM_CREATE` for windows we
/// create, `WM_INITDIALOG` for dialogs loaded from resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParentKind {
    Window,
    Dialog,
}

#[derive(Debug)]
pub struct WindowBase {
    session: Session,
    core: Rc<WindowCore>,
    layout: Rc<RefCell<Layout>>,
    ui_queue: Rc<UiTaskQueue>,
    parent_kind: ParentKind,
    // First child creation failure seen while handling the creation message.
    creation_error: Rc<RefCell<Option<PlatformError>>>,
}

impl WindowBase {
    pub(crate) fn new(session: &Session, kind: &'static str, parent_kind: ParentKind) -> Self {
        let core = Rc::new(WindowCore::new(kind));
        let layout = Rc::new(RefCell::new(Layout::new()));
        let ui_queue = Rc::new(UiTaskQueue::new());

        {
            let layout = Rc::clone(&layout);
            core.events().add_internal_msg(msg::WM_SIZE, move |args| {
                let Some(resize_kind) = ResizeKind::from_raw(args.wparam) else {
                    return None;
                };
                let size = Size::new(args.lo_word_lparam() as i32, args.hi_word_lparam() as i32);
                apply_layout(&layout.borrow(), resize_kind, size);
                None
            });
        }
        {
            // Children die with the parent; a later creation lays out fresh ones.
            let layout = Rc::clone(&layout);
            core.events().add_internal_msg(msg::WM_NCDESTROY, move |_| {
                layout.borrow_mut().clear();
                None
            });
        }
        {
            let ui_queue = Rc::clone(&ui_queue);
            core.events()
                .add_internal_msg(msg::WM_APP_UI_THREAD, move |_| {
                    ui_queue.drain();
                    Some(0)
                });
        }

        Self {
            session: session.clone(),
            core,
            layout,
            ui_queue,
            parent_kind,
            creation_error: Rc::new(RefCell::new(None)),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn core(&self) -> &Rc<WindowCore> {
        &self.core
    }

    pub fn hwnd(&self) -> HWND {
        to_hwnd(self.core.handle())
    }

    pub(crate) fn layout(&self) -> &Rc<RefCell<Layout>> {
        &self.layout
    }

    pub(crate) fn parent_kind(&self) -> ParentKind {
        self.parent_kind
    }

    pub(crate) fn creation_error_slot(&self) -> Rc<RefCell<Option<PlatformError>>> {
        Rc::clone(&self.creation_error)
    }

    pub(crate) fn take_creation_error(&self) -> Option<PlatformError> {
        self.creation_error.borrow_mut().take()
    }

    pub(crate) fn creation_msg(&self) -> u32 {
        match self.parent_kind {
            ParentKind::Window => msg::WM_CREATE,
            ParentKind::Dialog => msg::WM_INITDIALOG,
        }
    }

    /// A `Send` handle for scheduling closures back onto this window's thread.
    pub fn ui_thread_handle(&self) -> PlatformResult<UiThreadHandle> {
        if !self.core.is_created() {
            return Err(PlatformError::InvalidHandle(format!(
                "{} has no native window yet",
                self.core.kind()
            )));
        }
        Ok(UiThreadHandle {
            hwnd: self.core.handle().0,
            sender: self.ui_queue.sender(),
        })
    }
}

/*
 * Fire-and-forget scheduling onto the thread that owns a window. The
 * closure is queued, then a message wakes the window procedure, which
 * drains the queue on its own thread.
 */
#[derive(Debug, Clone)]
pub struct UiThreadHandle {
    hwnd: isize,
    sender: UiTaskSender,
}

impl UiThreadHandle {
    pub fn run<F>(&self, task: F) -> PlatformResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.sender.push(task) {
            return Err(PlatformError::OperationFailed(
                "UI thread queue is gone; window was destroyed".to_string(),
            ));
        }
        unsafe {
            PostMessageW(
                Some(to_hwnd(NativeHandle(self.hwnd))),
                msg::WM_APP_UI_THREAD,
                WPARAM(0),
                LPARAM(0),
            )
        }
        .map_err(|e| {
            PlatformError::win32_call("PostMessageW(WM_APP_UI_THREAD)", format!("{e:?}"))
        })
    }
}

/*
 * Moves every child according to the layout in one deferred batch. A failed
 * batch is abandoned; the next resize retries from scratch.
 */
fn apply_layout(layout: &Layout, kind: ResizeKind, size: Size) {
    let moves = layout.compute(kind, size);
    if moves.is_empty() {
        return;
    }
    log::trace!("Layout: repositioning {} child(ren) for {size:?}", moves.len());
    unsafe {
        let mut hdwp = match BeginDeferWindowPos(moves.len() as i32) {
            Ok(hdwp) => hdwp,
            Err(e) => {
                log::error!("Layout: BeginDeferWindowPos({}) failed: {e:?}", moves.len());
                return;
            }
        };
        for (handle, rc) in moves {
            hdwp = match DeferWindowPos(
                hdwp,
                to_hwnd(handle),
                None,
                rc.left,
                rc.top,
                rc.width(),
                rc.height(),
                SWP_NOZORDER | SWP_NOACTIVATE,
            ) {
                Ok(next) => next,
                Err(e) => {
                    log::error!("Layout: DeferWindowPos({handle:?}, {rc:?}) failed: {e:?}");
                    return;
                }
            };
        }
        if let Err(e) = EndDeferWindowPos(hdwp) {
            log::error!("Layout: EndDeferWindowPos failed: {e:?}");
        }
    }
}

pub(crate) struct CreateParams<'a> {
    pub class_name: &'a str,
    pub title: &'a str,
    pub style: WINDOW_STYLE,
    pub ex_style: WINDOW_EX_STYLE,
    pub position: Option<Point>,
    /// Logical client size; scaled by the session DPI and grown to a window size.
    pub client_size: Size,
    pub owner: Option<HWND>,
}

/*
 * Creates a top-level native window for `base`. The base is parked in the
 * registry under a ticket that travels through `lpCreateParams`, so the
 * window procedure can bind it on WM_NCCREATE before WM_CREATE fires.
 */
pub(crate) fn create_native_window(base: &WindowBase, params: CreateParams) -> PlatformResult<HWND> {
    base.core.ensure_not_created("create window")?;

    let dpi = base.session.dpi();
    let client = dpi.scale_size(params.client_size);
    let mut rc = RECT {
        left: 0,
        top: 0,
        right: client.cx,
        bottom: client.cy,
    };
    unsafe { AdjustWindowRectEx(&mut rc, params.style, false, params.ex_style) }.map_err(|e| {
        PlatformError::win32_call(
            "AdjustWindowRectEx",
            format!("client {client:?}, style {:#X}: {e:?}", params.style.0),
        )
    })?;
    let (x, y) = match params.position {
        Some(pt) => {
            let pt = dpi.scale_point(pt);
            (pt.x, pt.y)
        }
        None => (CW_USEDEFAULT, CW_USEDEFAULT),
    };

    let ticket = registry_reserve(&base.core);
    let created = unsafe {
        CreateWindowExW(
            params.ex_style,
            &HSTRING::from(params.class_name),
            &HSTRING::from(params.title),
            params.style,
            x,
            y,
            rc.right - rc.left,
            rc.bottom - rc.top,
            params.owner,
            None,
            Some(base.session.h_instance()),
            Some(ticket as *const c_void),
        )
    };
    match created {
        Ok(hwnd) => {
            if let Some(err) = base.take_creation_error() {
                log::error!(
                    "WindowCommon: child creation failed for {} '{}': {err}",
                    base.core.kind(),
                    params.title
                );
                unsafe {
                    let _ = DestroyWindow(hwnd);
                }
                return Err(err);
            }
            log::debug!(
                "WindowCommon: created {} '{}' as {hwnd:?}",
                base.core.kind(),
                params.title
            );
            Ok(hwnd)
        }
        Err(e) => {
            registry_cancel(ticket);
            Err(PlatformError::win32_call(
                "CreateWindowExW",
                format!("class '{}', title '{}': {e:?}", params.class_name, params.title),
            ))
        }
    }
}

/*
 * Pumps messages until WM_QUIT (returns its exit code) or until
 * `keep_running` turns false (returns None). Keyboard navigation between
 * children goes through `IsDialogMessageW` when `dialog_nav` is set.
 */
pub(crate) fn run_message_loop(
    dialog_nav: Option<HWND>,
    keep_running: impl Fn() -> bool,
) -> PlatformResult<Option<i32>> {
    let mut message = MSG::default();
    while keep_running() {
        let ret = unsafe { GetMessageW(&mut message, None, 0, 0) };
        match ret.0 {
            -1 => {
                let error = unsafe { GetLastError() };
                return Err(PlatformError::win32_call("GetMessageW", format!("{error:?}")));
            }
            0 => return Ok(Some(message.wParam.0 as i32)),
            _ => {}
        }
        if let Some(hwnd) = dialog_nav
            && unsafe { IsDialogMessageW(hwnd, &message) }.as_bool()
        {
            continue;
        }
        unsafe {
            let _ = TranslateMessage(&message);
            DispatchMessageW(&message);
        }
    }
    Ok(None)
}
