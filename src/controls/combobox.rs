/*
 * Drop-down list combo box. Items are plain strings addressed by index.
 */
use super::{BaseControl, ControlParams, impl_control_traits, wide_z};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::traits::{Focusable, Parent};
use crate::types::{ControlId, Point, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::UI::WindowsAndMessaging::{
    WINDOW_EX_STYLE, WINDOW_STYLE, WS_TABSTOP, WS_VISIBLE, WS_VSCROLL,
};
use windows::core::{PCWSTR, w};

const WC_COMBOBOX: PCWSTR = w!("COMBOBOX");

// ComboBox styles
const CBS_DROPDOWNLIST: u32 = 0x0003;
const CBS_HASSTRINGS: u32 = 0x0200;

// ComboBox messages
const CB_ADDSTRING: u32 = 0x0143;
const CB_GETCOUNT: u32 = 0x0146;
const CB_GETCURSEL: u32 = 0x0147;
const CB_GETLBTEXT: u32 = 0x0148;
const CB_GETLBTEXTLEN: u32 = 0x0149;
const CB_RESETCONTENT: u32 = 0x014B;
const CB_SETCURSEL: u32 = 0x014E;
const CB_ERR: isize = -1;
const CB_ERRSPACE: isize = -2;

const CBN_SELCHANGE: u16 = 1;

#[derive(Debug, Clone)]
pub struct ComboBoxOpts {
    pub items: Vec<String>,
    pub selected: Option<usize>,
    pub position: Point,
    /// Height includes the dropped-down list.
    pub size: Size,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    pub ctrl_id: Option<ControlId>,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for ComboBoxOpts {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            position: Point::new(0, 0),
            size: Size::new(160, 200),
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            ctrl_id: None,
            window_style: WS_TABSTOP | WS_VISIBLE | WS_VSCROLL,
            window_ex_style: WINDOW_EX_STYLE(0),
        }
    }
}

/// Maps a `CB_GETCURSEL` result to an index; `CB_ERR` means no selection.
fn selection_from_result(result: isize) -> Option<usize> {
    usize::try_from(result).ok()
}

#[derive(Debug, Clone)]
pub struct ComboBox {
    base: Rc<BaseControl>,
}

impl_control_traits!(ComboBox);
impl Focusable for ComboBox {}

fn add_items_to(base: &BaseControl, items: &[String]) -> PlatformResult<()> {
    for item in items {
        let wide = wide_z(item);
        let result = base.send(CB_ADDSTRING, 0, wide.as_ptr() as isize)?;
        if result == CB_ERR || result == CB_ERRSPACE {
            return Err(PlatformError::win32_call(
                "SendMessageW(CB_ADDSTRING)",
                format!("control {}, item {item:?}, result {result}", base.ctrl_id().raw()),
            ));
        }
    }
    Ok(())
}

fn select_in(base: &BaseControl, index: Option<usize>) -> PlatformResult<()> {
    let wparam = index.unwrap_or(usize::MAX);
    let result = base.send(CB_SETCURSEL, wparam, 0)?;
    // Clearing the selection also reports CB_ERR.
    if index.is_some() && result == CB_ERR {
        return Err(PlatformError::win32_call(
            "SendMessageW(CB_SETCURSEL)",
            format!("control {}, index {index:?}", base.ctrl_id().raw()),
        ));
    }
    Ok(())
}

impl ComboBox {
    pub fn new(parent: &impl Parent, opts: ComboBoxOpts) -> PlatformResult<Self> {
        let base = BaseControl::new(parent, "ComboBox", opts.ctrl_id)?;
        let params = ControlParams {
            class_name: WC_COMBOBOX,
            text: String::new(),
            style: opts.window_style | WINDOW_STYLE(CBS_DROPDOWNLIST | CBS_HASSTRINGS),
            ex_style: opts.window_ex_style,
            position: opts.position,
            size: opts.size,
            resize: opts.resize_behavior,
        };
        let items = opts.items;
        let selected = opts.selected;
        let weak = Rc::downgrade(&base);
        base.schedule_create(parent, params, move |_| {
            let Some(base) = weak.upgrade() else {
                return Ok(());
            };
            add_items_to(&base, &items)?;
            if selected.is_some() {
                select_in(&base, selected)?;
            }
            Ok(())
        });
        Ok(Self { base })
    }

    pub fn add_items<S: AsRef<str>>(&self, items: &[S]) -> PlatformResult<()> {
        let owned: Vec<String> = items.iter().map(|s| s.as_ref().to_string()).collect();
        add_items_to(&self.base, &owned)
    }

    pub fn delete_all(&self) -> PlatformResult<()> {
        self.base.send(CB_RESETCONTENT, 0, 0).map(|_| ())
    }

    pub fn count(&self) -> PlatformResult<usize> {
        let result = self.base.send(CB_GETCOUNT, 0, 0)?;
        usize::try_from(result).map_err(|_| {
            PlatformError::win32_call(
                "SendMessageW(CB_GETCOUNT)",
                format!("control {}", self.base.ctrl_id().raw()),
            )
        })
    }

    pub fn selected_index(&self) -> PlatformResult<Option<usize>> {
        self.base.send(CB_GETCURSEL, 0, 0).map(selection_from_result)
    }

    /// `None` clears the selection.
    pub fn select(&self, index: Option<usize>) -> PlatformResult<()> {
        select_in(&self.base, index)
    }

    pub fn item_text(&self, index: usize) -> PlatformResult<String> {
        let len = self.base.send(CB_GETLBTEXTLEN, index, 0)?;
        if len == CB_ERR {
            return Err(PlatformError::win32_call(
                "SendMessageW(CB_GETLBTEXTLEN)",
                format!("control {}, index {index}", self.base.ctrl_id().raw()),
            ));
        }
        let mut buffer = vec![0u16; len as usize + 1];
        let copied = self
            .base
            .send(CB_GETLBTEXT, index, buffer.as_mut_ptr() as isize)?;
        if copied == CB_ERR {
            return Err(PlatformError::win32_call(
                "SendMessageW(CB_GETLBTEXT)",
                format!("control {}, index {index}", self.base.ctrl_id().raw()),
            ));
        }
        buffer.truncate(copied as usize);
        Ok(String::from_utf16_lossy(&buffer))
    }

    pub fn selected_text(&self) -> PlatformResult<Option<String>> {
        match self.selected_index()? {
            Some(index) => self.item_text(index).map(Some),
            None => Ok(None),
        }
    }

    pub fn on_sel_change<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn() -> PlatformResult<()> + 'static,
    {
        self.base.on_parent_cmd(CBN_SELCHANGE, move |_| f())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cb_err_means_no_selection() {
        assert_eq!(selection_from_result(CB_ERR), None);
        assert_eq!(selection_from_result(0), Some(0));
        assert_eq!(selection_from_result(4), Some(4));
    }
}
