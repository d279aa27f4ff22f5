/*
 * Auto check box (`BS_AUTOCHECKBOX`): the control toggles itself on click,
 * the parent only gets told about it through BN_CLICKED.
 */
use super::button::BN_CLICKED;
use super::{BaseControl, ControlParams, impl_control_traits};
use crate::error::Result as PlatformResult;
use crate::traits::{Focusable, Parent, TextControl};
use crate::types::{ControlId, Point, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::UI::Controls::{BST_CHECKED, BST_UNCHECKED};
use windows::Win32::UI::WindowsAndMessaging::{
    BM_GETCHECK, BM_SETCHECK, BS_AUTOCHECKBOX, WINDOW_EX_STYLE, WINDOW_STYLE, WS_TABSTOP,
    WS_VISIBLE,
};
use windows::core::{PCWSTR, w};

const WC_BUTTON: PCWSTR = w!("BUTTON");

#[derive(Debug, Clone)]
pub struct CheckBoxOpts {
    pub text: String,
    pub position: Point,
    pub size: Size,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    pub ctrl_id: Option<ControlId>,
    pub checked: bool,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for CheckBoxOpts {
    fn default() -> Self {
        Self {
            text: String::new(),
            position: Point::new(0, 0),
            size: Size::new(120, 20),
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            ctrl_id: None,
            checked: false,
            window_style: WS_TABSTOP | WS_VISIBLE,
            window_ex_style: WINDOW_EX_STYLE(0),
        }
    }
}

fn check_state_param(checked: bool) -> usize {
    if checked {
        BST_CHECKED.0 as usize
    } else {
        BST_UNCHECKED.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct CheckBox {
    base: Rc<BaseControl>,
}

impl_control_traits!(CheckBox);
impl Focusable for CheckBox {}
impl TextControl for CheckBox {}

impl CheckBox {
    pub fn new(parent: &impl Parent, opts: CheckBoxOpts) -> PlatformResult<Self> {
        let base = BaseControl::new(parent, "CheckBox", opts.ctrl_id)?;
        let params = ControlParams {
            class_name: WC_BUTTON,
            style: opts.window_style | WINDOW_STYLE(BS_AUTOCHECKBOX as u32),
            ex_style: opts.window_ex_style,
            position: opts.position,
            size: opts.size,
            resize: opts.resize_behavior,
            text: opts.text,
        };
        let checked = opts.checked;
        let weak = Rc::downgrade(&base);
        base.schedule_create(parent, params, move |_| match weak.upgrade() {
            Some(base) if checked => base
                .send(BM_SETCHECK, check_state_param(true), 0)
                .map(|_| ()),
            _ => Ok(()),
        });
        Ok(Self { base })
    }

    pub fn is_checked(&self) -> PlatformResult<bool> {
        let state = self.base.send(BM_GETCHECK, 0, 0)?;
        Ok(state == BST_CHECKED.0 as isize)
    }

    pub fn set_checked(&self, checked: bool) -> PlatformResult<()> {
        self.base
            .send(BM_SETCHECK, check_state_param(checked), 0)
            .map(|_| ())
    }

    pub fn on_clicked<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn() -> PlatformResult<()> + 'static,
    {
        self.base.on_parent_cmd(BN_CLICKED, move |_| f())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_state_maps_to_button_states() {
        assert_eq!(check_state_param(true), 1);
        assert_eq!(check_state_param(false), 0);
    }
}
