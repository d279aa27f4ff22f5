/*
 * Native control wrappers. Every wrapper is a thin facade over
 * `BaseControl`, which owns the control ID and the control's own
 * `WindowCore` (used only when the control is subclassed), schedules the
 * native creation on the parent's creation message and knows how to send
 * messages to the control once it exists.
 *
 * Controls are declared before their parent is created. On a window we
 * create, the control is created with `CreateWindowExW`; on a resource
 * dialog, the control already exists and is bound by its ID.
 */
pub mod button;
pub mod checkbox;
pub mod combobox;
pub mod edit;
pub mod label;
pub mod listview;
pub mod progress_bar;
pub mod radio_group;
pub mod status_bar;
pub mod tab;
pub mod treeview;

pub use button::{Button, ButtonOpts};
pub use checkbox::{CheckBox, CheckBoxOpts};
pub use combobox::{ComboBox, ComboBoxOpts};
pub use edit::{Edit, EditOpts};
pub use label::{Label, LabelOpts, TextAlign};
pub use listview::{ListView, ListViewChange, ListViewOpts};
pub use progress_bar::{ProgressBar, ProgressBarOpts};
pub use radio_group::{RadioButton, RadioGroup, RadioGroupOpts};
pub use status_bar::{StatusBar, StatusBarOpts, StatusBarPart};
pub use tab::{Tab, TabItem, TabOpts};
pub use treeview::{TreeView, TreeViewItem, TreeViewOpts};

use crate::error::{PlatformError, Result as PlatformResult};
use crate::events::WindowCore;
use crate::layout::Layout;
use crate::session::Session;
use crate::subclass;
use crate::traits::{Parent, handled};
use crate::types::{ControlId, Point, Rect, ResizePolicy, Size, WmArgs, msg};
use crate::window_common::{ParentKind, to_handle, to_hwnd};

use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::{Rc, Weak};

use windows::Win32::{
    Foundation::{HWND, LPARAM, POINT, RECT, WPARAM},
    Graphics::Gdi::ScreenToClient,
    UI::WindowsAndMessaging::{
        CreateWindowExW, GetClientRect, GetDlgItem, GetWindowRect, HMENU, SendMessageW,
        WINDOW_EX_STYLE, WINDOW_STYLE, WM_SETFONT, WS_CHILD,
    },
};
use windows::core::{HSTRING, PCWSTR};

/// What `CreateWindowExW` needs for one child control.
pub(crate) struct ControlParams {
    pub class_name: PCWSTR,
    pub text: String,
    pub style: WINDOW_STYLE,
    pub ex_style: WINDOW_EX_STYLE,
    /// Logical coordinates; scaled by the session DPI at creation.
    pub position: Point,
    pub size: Size,
    pub resize: (ResizePolicy, ResizePolicy),
}

#[derive(Debug)]
pub(crate) struct BaseControl {
    core: Rc<WindowCore>,
    ctrl_id: ControlId,
    session: Session,
    parent_core: Weak<WindowCore>,
    parent_kind: ParentKind,
}

impl BaseControl {
    /*
     * Declares a control on `parent`. The parent must not exist yet. Custom
     * IDs bypass the session allocator; resource dialogs require one since
     * the control already carries its ID in the template.
     */
    pub(crate) fn new(
        parent: &impl Parent,
        kind: &'static str,
        ctrl_id: Option<ControlId>,
    ) -> PlatformResult<Rc<Self>> {
        let base = parent.base();
        base.core().ensure_not_created("add child control")?;
        let ctrl_id = match (ctrl_id, base.parent_kind()) {
            (Some(id), _) => id,
            (None, ParentKind::Dialog) => {
                return Err(PlatformError::InitializationFailed(format!(
                    "{kind} on a resource dialog needs an explicit ctrl_id"
                )));
            }
            (None, ParentKind::Window) => base.session().next_control_id()?,
        };

        let this = Rc::new(Self {
            core: Rc::new(WindowCore::new(kind)),
            ctrl_id,
            session: base.session().clone(),
            parent_core: Rc::downgrade(base.core()),
            parent_kind: base.parent_kind(),
        });

        // Controls that were never subclassed learn about teardown from the parent.
        let weak = Rc::downgrade(&this.core);
        base.core().events().add_internal_msg(msg::WM_NCDESTROY, move |_| {
            if let Some(core) = weak.upgrade() {
                core.clear_handle();
            }
            None
        });

        log::debug!("{kind}: declared with control ID {}", ctrl_id.raw());
        Ok(this)
    }

    /*
     * Hooks creation into the parent's creation message. `after_create` runs
     * once the handle exists, for setup that needs it (initial items, parts).
     * A failure is stored on the parent so its creation fails as a whole.
     */
    pub(crate) fn schedule_create<F>(self: &Rc<Self>, parent: &impl Parent, params: ControlParams, after_create: F)
    where
        F: Fn(HWND) -> PlatformResult<()> + 'static,
    {
        let base = parent.base();
        let this = Rc::clone(self);
        let layout = Rc::clone(base.layout());
        let failure = base.creation_error_slot();
        base.core()
            .events()
            .add_internal_msg(base.creation_msg(), move |_| {
                let result = this
                    .create(&params, &layout)
                    .and_then(&after_create);
                if let Err(e) = result {
                    log::error!(
                        "{}: creation of control {} failed: {e}",
                        this.core.kind(),
                        this.ctrl_id.raw()
                    );
                    failure.borrow_mut().get_or_insert(e);
                }
                None
            });
    }

    fn parent_hwnd(&self) -> PlatformResult<HWND> {
        match self.parent_core.upgrade() {
            Some(core) if core.is_created() => Ok(to_hwnd(core.handle())),
            _ => Err(PlatformError::InvalidHandle(format!(
                "parent of {} {} does not exist",
                self.core.kind(),
                self.ctrl_id.raw()
            ))),
        }
    }

    fn create(&self, params: &ControlParams, layout: &RefCell<Layout>) -> PlatformResult<HWND> {
        self.core.ensure_not_created("create control")?;
        let hwnd_parent = self.parent_hwnd()?;
        let dpi = self.session.dpi();

        let (hwnd, rect) = match self.parent_kind {
            ParentKind::Window => {
                let pos = dpi.scale_point(params.position);
                let size = dpi.scale_size(params.size);
                let hwnd = unsafe {
                    CreateWindowExW(
                        params.ex_style,
                        params.class_name,
                        &HSTRING::from(params.text.as_str()),
                        params.style | WS_CHILD,
                        pos.x,
                        pos.y,
                        size.cx,
                        size.cy,
                        Some(hwnd_parent),
                        Some(HMENU(self.ctrl_id.raw() as usize as *mut c_void)),
                        Some(self.session.h_instance()),
                        None,
                    )
                }
                .map_err(|e| {
                    PlatformError::win32_call(
                        "CreateWindowExW",
                        format!(
                            "{} ID {} at {pos:?} size {size:?}: {e:?}",
                            self.core.kind(),
                            self.ctrl_id.raw()
                        ),
                    )
                })?;
                unsafe {
                    SendMessageW(
                        hwnd,
                        WM_SETFONT,
                        Some(WPARAM(self.session.ui_font().hfont().0 as usize)),
                        Some(LPARAM(1)),
                    );
                }
                (hwnd, Rect::from_pos_size(pos, size))
            }
            ParentKind::Dialog => {
                let hwnd = unsafe { GetDlgItem(Some(hwnd_parent), self.ctrl_id.raw() as i32) }
                    .map_err(|e| {
                        PlatformError::win32_call(
                            "GetDlgItem",
                            format!("ID {} in {hwnd_parent:?}: {e:?}", self.ctrl_id.raw()),
                        )
                    })?;
                (hwnd, rect_in_parent(hwnd, hwnd_parent)?)
            }
        };
        self.core.bind_handle(to_handle(hwnd))?;

        if params.resize != (ResizePolicy::Fixed, ResizePolicy::Fixed) {
            let mut layout = layout.borrow_mut();
            if layout.original_parent_size().is_none() {
                let mut rc = RECT::default();
                unsafe { GetClientRect(hwnd_parent, &mut rc) }.map_err(|e| {
                    PlatformError::win32_call("GetClientRect", format!("{hwnd_parent:?}: {e:?}"))
                })?;
                layout.set_original_parent_size(Size::new(rc.right - rc.left, rc.bottom - rc.top));
            }
            layout.add(to_handle(hwnd), rect, params.resize.0, params.resize.1);
        }

        if self.core.events().has_user_msg_handlers() {
            subclass::install(hwnd, &self.core, self.session.next_subclass_id())?;
        }

        log::debug!(
            "{}: control {} created as {hwnd:?}",
            self.core.kind(),
            self.ctrl_id.raw()
        );
        Ok(hwnd)
    }

    pub(crate) fn ctrl_id(&self) -> ControlId {
        self.ctrl_id
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn hwnd(&self) -> HWND {
        to_hwnd(self.core.handle())
    }

    pub(crate) fn is_created(&self) -> bool {
        self.core.is_created()
    }

    /// Sends `message` to the control; fails if the control does not exist.
    pub(crate) fn send(&self, message: u32, wparam: usize, lparam: isize) -> PlatformResult<isize> {
        if !self.core.is_created() {
            return Err(PlatformError::InvalidHandle(format!(
                "{} {} not created yet (message {message:#06X})",
                self.core.kind(),
                self.ctrl_id.raw()
            )));
        }
        let result =
            unsafe { SendMessageW(self.hwnd(), message, Some(WPARAM(wparam)), Some(LPARAM(lparam))) };
        Ok(result.0)
    }

    /// Raw handler on the control itself; the control gets subclassed.
    pub(crate) fn on_subclass_msg<F>(&self, code: u32, f: F) -> PlatformResult<()>
    where
        F: Fn(WmArgs) -> Option<isize> + 'static,
    {
        self.core.on_msg(code, f)
    }

    fn parent_core(&self) -> PlatformResult<Rc<WindowCore>> {
        self.parent_core.upgrade().ok_or_else(|| {
            PlatformError::InvalidHandle(format!(
                "parent of {} {} was dropped",
                self.core.kind(),
                self.ctrl_id.raw()
            ))
        })
    }

    /// Handler for a `WM_COMMAND` notification this control sends its parent.
    pub(crate) fn on_parent_cmd<F>(&self, code: u16, f: F) -> PlatformResult<()>
    where
        F: Fn(WmArgs) -> PlatformResult<()> + 'static,
    {
        self.parent_core()?
            .on_cmd(self.ctrl_id, code, handled(self.core.kind(), f))
    }

    /// Handler for a `WM_NOTIFY` notification this control sends its parent.
    pub(crate) fn on_parent_nfy<F>(&self, code: i32, f: F) -> PlatformResult<()>
    where
        F: Fn(WmArgs) -> PlatformResult<()> + 'static,
    {
        self.parent_core()?
            .on_nfy(self.ctrl_id, code, handled(self.core.kind(), f))
    }

    /// Crate-internal parent message hook, allowed at any time.
    pub(crate) fn on_parent_internal_msg<F>(&self, code: u32, f: F) -> PlatformResult<()>
    where
        F: Fn(WmArgs) -> Option<isize> + 'static,
    {
        self.parent_core()?.events().add_internal_msg(code, f);
        Ok(())
    }
}

/// A dialog control's rectangle in its parent's client coordinates.
fn rect_in_parent(hwnd: HWND, hwnd_parent: HWND) -> PlatformResult<Rect> {
    let mut rc = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut rc) }
        .map_err(|e| PlatformError::win32_call("GetWindowRect", format!("{hwnd:?}: {e:?}")))?;
    let mut top_left = POINT {
        x: rc.left,
        y: rc.top,
    };
    let mut bottom_right = POINT {
        x: rc.right,
        y: rc.bottom,
    };
    unsafe {
        let _ = ScreenToClient(hwnd_parent, &mut top_left);
        let _ = ScreenToClient(hwnd_parent, &mut bottom_right);
    }
    Ok(Rect {
        left: top_left.x,
        top: top_left.y,
        right: bottom_right.x,
        bottom: bottom_right.y,
    })
}

/// UTF-16 buffer with a terminator, for structs that carry `LPWSTR`.
pub(crate) fn wide_z(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Implements the capability traits every control wrapper shares.
macro_rules! impl_control_traits {
    ($ty:ty) => {
        impl $crate::traits::Window for $ty {
            fn hwnd(&self) -> windows::Win32::Foundation::HWND {
                self.base.hwnd()
            }
        }

        impl $crate::traits::Child for $ty {
            fn ctrl_id(&self) -> $crate::types::ControlId {
                self.base.ctrl_id()
            }
        }

        impl $ty {
            /// Raw handler on the control itself. Registering one makes the
            /// control subclassed when it is created.
            pub fn on_msg<F>(&self, code: u32, f: F) -> $crate::error::Result<()>
            where
                F: Fn($crate::types::WmArgs) -> Option<isize> + 'static,
            {
                self.base.on_subclass_msg(code, f)
            }
        }
    };
}
pub(crate) use impl_control_traits;
