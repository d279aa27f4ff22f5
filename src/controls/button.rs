/*
 * Push button. Clicks arrive at the parent as WM_COMMAND/BN_CLICKED and are
 * routed to `on_clicked` handlers by control ID.
 */
use super::{BaseControl, ControlParams, impl_control_traits};
use crate::error::Result as PlatformResult;
use crate::traits::{Focusable, Parent, TextControl};
use crate::types::{ControlId, Point, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::UI::WindowsAndMessaging::{
    BS_DEFPUSHBUTTON, BS_PUSHBUTTON, WINDOW_EX_STYLE, WINDOW_STYLE, WS_TABSTOP, WS_VISIBLE,
};
use windows::core::{PCWSTR, w};

const WC_BUTTON: PCWSTR = w!("BUTTON");

pub(crate) const BN_CLICKED: u16 = 0;
const BM_CLICK: u32 = 0x00F5;

#[derive(Debug, Clone)]
pub struct ButtonOpts {
    pub text: String,
    pub position: Point,
    pub size: Size,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    pub ctrl_id: Option<ControlId>,
    /// Makes this the dialog's default button (`BS_DEFPUSHBUTTON`).
    pub default: bool,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for ButtonOpts {
    fn default() -> Self {
        Self {
            text: String::new(),
            position: Point::new(0, 0),
            size: Size::new(88, 26),
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            ctrl_id: None,
            default: false,
            window_style: WS_TABSTOP | WS_VISIBLE,
            window_ex_style: WINDOW_EX_STYLE(0),
        }
    }
}

fn button_style(opts: &ButtonOpts) -> WINDOW_STYLE {
    let kind = if opts.default {
        BS_DEFPUSHBUTTON
    } else {
        BS_PUSHBUTTON
    };
    opts.window_style | WINDOW_STYLE(kind as u32)
}

#[derive(Debug, Clone)]
pub struct Button {
    base: Rc<BaseControl>,
}

impl_control_traits!(Button);
impl Focusable for Button {}
impl TextControl for Button {}

impl Button {
    pub fn new(parent: &impl Parent, opts: ButtonOpts) -> PlatformResult<Self> {
        let base = BaseControl::new(parent, "Button", opts.ctrl_id)?;
        let params = ControlParams {
            class_name: WC_BUTTON,
            style: button_style(&opts),
            ex_style: opts.window_ex_style,
            position: opts.position,
            size: opts.size,
            resize: opts.resize_behavior,
            text: opts.text,
        };
        base.schedule_create(parent, params, |_| Ok(()));
        Ok(Self { base })
    }

    pub fn on_clicked<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn() -> PlatformResult<()> + 'static,
    {
        self.base.on_parent_cmd(BN_CLICKED, move |_| f())
    }

    /// Simulates a user click; the parent receives BN_CLICKED.
    pub fn click(&self) -> PlatformResult<()> {
        self.base.send(BM_CLICK, 0, 0).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_button_style_is_selected_by_flag() {
        // Arrange
        let plain = ButtonOpts::default();
        let default = ButtonOpts {
            default: true,
            ..Default::default()
        };
        // Act
        let plain_style = button_style(&plain);
        let default_style = button_style(&default);
        // Assert
        assert_eq!(plain_style.0 & 0x0F, BS_PUSHBUTTON as u32);
        assert_eq!(default_style.0 & 0x0F, BS_DEFPUSHBUTTON as u32);
        assert!(default_style.contains(WS_TABSTOP));
    }
}
