/*
 * Single- or multi-line text input. The text itself goes through
 * `TextControl`; this wrapper adds selection, length limit and change
 * notifications.
 */
use super::{BaseControl, ControlParams, impl_control_traits};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::traits::{Focusable, Parent, TextControl};
use crate::types::{ControlId, Point, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::UI::WindowsAndMessaging::{
    WINDOW_EX_STYLE, WINDOW_STYLE, WS_EX_CLIENTEDGE, WS_TABSTOP, WS_VISIBLE, WS_VSCROLL,
};
use windows::core::{PCWSTR, w};

const WC_EDIT: PCWSTR = w!("EDIT");

// Edit styles
const ES_MULTILINE: u32 = 0x0004;
const ES_PASSWORD: u32 = 0x0020;
const ES_AUTOVSCROLL: u32 = 0x0040;
const ES_AUTOHSCROLL: u32 = 0x0080;
const ES_READONLY: u32 = 0x0800;
const ES_WANTRETURN: u32 = 0x1000;

// Edit messages
const EM_GETSEL: u32 = 0x00B0;
const EM_SETSEL: u32 = 0x00B1;
const EM_SETLIMITTEXT: u32 = 0x00C5;
const EM_SETREADONLY: u32 = 0x00CF;

const EN_CHANGE: u16 = 0x0300;

#[derive(Debug, Clone)]
pub struct EditOpts {
    pub text: String,
    pub position: Point,
    pub size: Size,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    pub ctrl_id: Option<ControlId>,
    pub multiline: bool,
    pub read_only: bool,
    pub password: bool,
    /// Maximum number of characters; `None` keeps the system default.
    pub limit: Option<u32>,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for EditOpts {
    fn default() -> Self {
        Self {
            text: String::new(),
            position: Point::new(0, 0),
            size: Size::new(200, 24),
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            ctrl_id: None,
            multiline: false,
            read_only: false,
            password: false,
            limit: None,
            window_style: WS_TABSTOP | WS_VISIBLE,
            window_ex_style: WS_EX_CLIENTEDGE,
        }
    }
}

fn edit_style(opts: &EditOpts) -> WINDOW_STYLE {
    let mut es = if opts.multiline {
        ES_MULTILINE | ES_AUTOVSCROLL | ES_WANTRETURN
    } else {
        ES_AUTOHSCROLL
    };
    if opts.read_only {
        es |= ES_READONLY;
    }
    // Multi-line edits cannot mask their text.
    if opts.password && !opts.multiline {
        es |= ES_PASSWORD;
    }
    let style = opts.window_style | WINDOW_STYLE(es);
    if opts.multiline {
        style | WS_VSCROLL
    } else {
        style
    }
}

/// Unpacks the `EM_GETSEL` result: start in the low word, end in the high word.
fn decode_selection(packed: isize) -> (u32, u32) {
    let packed = packed as usize;
    ((packed & 0xFFFF) as u32, ((packed >> 16) & 0xFFFF) as u32)
}

#[derive(Debug, Clone)]
pub struct Edit {
    base: Rc<BaseControl>,
}

impl_control_traits!(Edit);
impl Focusable for Edit {}
impl TextControl for Edit {}

impl Edit {
    pub fn new(parent: &impl Parent, opts: EditOpts) -> PlatformResult<Self> {
        if opts.password && opts.multiline {
            log::warn!("Edit: password style ignored on a multi-line edit");
        }
        let base = BaseControl::new(parent, "Edit", opts.ctrl_id)?;
        let params = ControlParams {
            class_name: WC_EDIT,
            style: edit_style(&opts),
            ex_style: opts.window_ex_style,
            position: opts.position,
            size: opts.size,
            resize: opts.resize_behavior,
            text: opts.text,
        };
        let limit = opts.limit;
        let weak = Rc::downgrade(&base);
        base.schedule_create(parent, params, move |_| match (weak.upgrade(), limit) {
            (Some(base), Some(limit)) => base.send(EM_SETLIMITTEXT, limit as usize, 0).map(|_| ()),
            _ => Ok(()),
        });
        Ok(Self { base })
    }

    /// Selects characters `start..end`; `(0, -1)` selects everything.
    pub fn set_selection(&self, start: i32, end: i32) -> PlatformResult<()> {
        self.base
            .send(EM_SETSEL, start as isize as usize, end as isize)
            .map(|_| ())
    }

    pub fn selection(&self) -> PlatformResult<(u32, u32)> {
        self.base.send(EM_GETSEL, 0, 0).map(decode_selection)
    }

    pub fn set_limit(&self, max_chars: u32) -> PlatformResult<()> {
        self.base
            .send(EM_SETLIMITTEXT, max_chars as usize, 0)
            .map(|_| ())
    }

    pub fn set_read_only(&self, read_only: bool) -> PlatformResult<()> {
        if self.base.send(EM_SETREADONLY, read_only as usize, 0)? == 0 {
            return Err(PlatformError::win32_call(
                "SendMessageW(EM_SETREADONLY)",
                format!("control {}, read_only {read_only}", self.base.ctrl_id().raw()),
            ));
        }
        Ok(())
    }

    /// Runs after every user edit (`EN_CHANGE`).
    pub fn on_change<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn() -> PlatformResult<()> + 'static,
    {
        self.base.on_parent_cmd(EN_CHANGE, move |_| f())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_edit_scrolls_vertically_and_drops_password() {
        // Arrange
        let opts = EditOpts {
            multiline: true,
            password: true,
            ..Default::default()
        };
        // Act
        let style = edit_style(&opts);
        // Assert
        assert_ne!(style.0 & ES_MULTILINE, 0);
        assert_eq!(style.0 & ES_PASSWORD, 0);
        assert!(style.contains(WS_VSCROLL));
    }

    #[test]
    fn single_line_password_edit_scrolls_horizontally() {
        let opts = EditOpts {
            password: true,
            read_only: true,
            ..Default::default()
        };
        let style = edit_style(&opts);
        assert_ne!(style.0 & ES_PASSWORD, 0);
        assert_ne!(style.0 & ES_READONLY, 0);
        assert_ne!(style.0 & ES_AUTOHSCROLL, 0);
        assert!(!style.contains(WS_VSCROLL));
    }

    #[test]
    fn selection_is_unpacked_from_low_and_high_words() {
        assert_eq!(decode_selection((12 << 16) | 3), (3, 12));
        assert_eq!(decode_selection(0), (0, 0));
    }
}
