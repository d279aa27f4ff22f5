/*
 * A group of auto radio buttons stacked vertically. The first button carries
 * `WS_GROUP` so arrow keys move inside the group and the OS keeps exactly one
 * of them checked. Buttons are addressed by index.
 */
use super::button::BN_CLICKED;
use super::{BaseControl, ControlParams};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::traits::{Parent, read_window_text};
use crate::types::{ControlId, Point, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::UI::Controls::{BST_CHECKED, BST_UNCHECKED};
use windows::Win32::UI::WindowsAndMessaging::{
    BM_GETCHECK, BM_SETCHECK, BS_AUTORADIOBUTTON, WINDOW_EX_STYLE, WINDOW_STYLE, WS_GROUP,
    WS_TABSTOP, WS_VISIBLE,
};
use windows::core::{PCWSTR, w};

const WC_BUTTON: PCWSTR = w!("BUTTON");

#[derive(Debug, Clone)]
pub struct RadioGroupOpts {
    pub labels: Vec<String>,
    /// Position of the first button; the others follow below it.
    pub position: Point,
    pub item_size: Size,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    /// ID of the first button; the others take consecutive IDs.
    pub first_ctrl_id: Option<ControlId>,
    pub selected: Option<usize>,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for RadioGroupOpts {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            position: Point::new(0, 0),
            item_size: Size::new(120, 20),
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            first_ctrl_id: None,
            selected: None,
            window_style: WS_VISIBLE,
            window_ex_style: WINDOW_EX_STYLE(0),
        }
    }
}

fn member_style(base: WINDOW_STYLE, index: usize) -> WINDOW_STYLE {
    let style = base | WINDOW_STYLE(BS_AUTORADIOBUTTON as u32);
    if index == 0 {
        style | WS_GROUP | WS_TABSTOP
    } else {
        style
    }
}

fn member_position(origin: Point, item_size: Size, index: usize) -> Point {
    Point::new(origin.x, origin.y + item_size.cy * index as i32)
}

fn member_ctrl_id(first: Option<ControlId>, index: usize) -> PlatformResult<Option<ControlId>> {
    let Some(first) = first else {
        return Ok(None);
    };
    u16::try_from(index)
        .ok()
        .and_then(|i| first.raw().checked_add(i))
        .map(|raw| Some(ControlId::new(raw)))
        .ok_or_else(|| {
            PlatformError::OperationFailed(format!(
                "radio button {index} after ID {} is outside the control ID range",
                first.raw()
            ))
        })
}

#[derive(Debug, Clone)]
pub struct RadioGroup {
    buttons: Vec<Rc<BaseControl>>,
}

impl RadioGroup {
    pub fn new(parent: &impl Parent, opts: RadioGroupOpts) -> PlatformResult<Self> {
        if opts.labels.is_empty() {
            return Err(PlatformError::OperationFailed(
                "a radio group needs at least one button".to_string(),
            ));
        }
        if let Some(selected) = opts.selected
            && selected >= opts.labels.len()
        {
            return Err(PlatformError::OperationFailed(format!(
                "initial selection {selected} out of {} radio buttons",
                opts.labels.len()
            )));
        }

        let mut buttons = Vec::with_capacity(opts.labels.len());
        for (index, label) in opts.labels.iter().enumerate() {
            let ctrl_id = member_ctrl_id(opts.first_ctrl_id, index)?;
            let base = BaseControl::new(parent, "RadioButton", ctrl_id)?;
            let params = ControlParams {
                class_name: WC_BUTTON,
                text: label.clone(),
                style: member_style(opts.window_style, index),
                ex_style: opts.window_ex_style,
                position: member_position(opts.position, opts.item_size, index),
                size: opts.item_size,
                resize: opts.resize_behavior,
            };
            let check_now = opts.selected == Some(index);
            let weak = Rc::downgrade(&base);
            base.schedule_create(parent, params, move |_| match weak.upgrade() {
                Some(base) if check_now => base
                    .send(BM_SETCHECK, BST_CHECKED.0 as usize, 0)
                    .map(|_| ()),
                _ => Ok(()),
            });
            buttons.push(base);
        }
        Ok(Self { buttons })
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn button(&self, index: usize) -> Option<RadioButton<'_>> {
        (index < self.buttons.len()).then_some(RadioButton { group: self, index })
    }

    /// Index of the checked button, if any.
    pub fn checked_index(&self) -> PlatformResult<Option<usize>> {
        for (index, base) in self.buttons.iter().enumerate() {
            if base.send(BM_GETCHECK, 0, 0)? == BST_CHECKED.0 as isize {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Checks the button at `index` and unchecks the rest.
    pub fn select(&self, index: usize) -> PlatformResult<()> {
        if index >= self.buttons.len() {
            return Err(PlatformError::OperationFailed(format!(
                "radio index {index} out of {} buttons",
                self.buttons.len()
            )));
        }
        for (i, base) in self.buttons.iter().enumerate() {
            let state = if i == index {
                BST_CHECKED
            } else {
                BST_UNCHECKED
            };
            base.send(BM_SETCHECK, state.0 as usize, 0)?;
        }
        Ok(())
    }

    /// `f` receives the index of the clicked button.
    pub fn on_clicked<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn(usize) -> PlatformResult<()> + 'static,
    {
        let f = Rc::new(f);
        for (index, base) in self.buttons.iter().enumerate() {
            let f = Rc::clone(&f);
            base.on_parent_cmd(BN_CLICKED, move |_| f(index))?;
        }
        Ok(())
    }
}

/// Index-keyed view of one button in a `RadioGroup`.
#[derive(Debug, Clone, Copy)]
pub struct RadioButton<'a> {
    group: &'a RadioGroup,
    index: usize,
}

impl RadioButton<'_> {
    fn base(&self) -> &BaseControl {
        &self.group.buttons[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ctrl_id(&self) -> ControlId {
        self.base().ctrl_id()
    }

    pub fn is_checked(&self) -> PlatformResult<bool> {
        Ok(self.base().send(BM_GETCHECK, 0, 0)? == BST_CHECKED.0 as isize)
    }

    pub fn select(&self) -> PlatformResult<()> {
        self.group.select(self.index)
    }

    pub fn text(&self) -> PlatformResult<String> {
        read_window_text(self.base().hwnd())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_button_starts_a_group() {
        let base = WS_VISIBLE;
        assert!(member_style(base, 0).contains(WS_GROUP));
        assert!(!member_style(base, 1).contains(WS_GROUP));
        assert!(!member_style(base, 2).contains(WS_TABSTOP));
    }

    #[test]
    fn buttons_stack_below_the_first() {
        // Arrange
        let origin = Point::new(10, 40);
        let item = Size::new(100, 22);
        // Act
        let third = member_position(origin, item, 2);
        // Assert
        assert_eq!(third, Point::new(10, 84));
    }

    #[test]
    fn consecutive_ids_follow_the_first() {
        let first = Some(ControlId::new(1001));
        assert_eq!(member_ctrl_id(first, 2).unwrap(), Some(ControlId::new(1003)));
        assert_eq!(member_ctrl_id(None, 2).unwrap(), None);
        assert!(member_ctrl_id(Some(ControlId::new(u16::MAX)), 1).is_err());
    }
}
