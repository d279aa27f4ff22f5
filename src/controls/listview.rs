/*
 * Report-view list control: columns, rows of sub-item texts and a single
 * selection. Rows and columns are addressed by index.
 */
use super::{BaseControl, ControlParams, impl_control_traits, wide_z};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::traits::{Focusable, Parent};
use crate::types::{ControlId, Point, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::UI::{
    Controls::{
        LVCF_TEXT, LVCF_WIDTH, LVCOLUMNW, LVIF_TEXT, LVIS_SELECTED, LVITEMW, LVM_DELETEALLITEMS,
        LVM_GETITEMCOUNT, LVM_GETITEMTEXTW, LVM_GETNEXTITEM, LVM_INSERTCOLUMNW, LVM_INSERTITEMW,
        LVM_SETEXTENDEDLISTVIEWSTYLE, LVM_SETITEMSTATE, LVM_SETITEMTEXTW, NMLISTVIEW,
    },
    WindowsAndMessaging::{WINDOW_EX_STYLE, WINDOW_STYLE, WS_EX_CLIENTEDGE, WS_TABSTOP, WS_VISIBLE},
};
use windows::core::{PCWSTR, PWSTR, w};

const WC_LISTVIEW: PCWSTR = w!("SysListView32");

// ListView styles
const LVS_REPORT: u32 = 0x0001;
const LVS_SINGLESEL: u32 = 0x0004;
const LVS_SHOWSELALWAYS: u32 = 0x0008;
const LVS_EX_GRIDLINES: usize = 0x0001;
const LVS_EX_FULLROWSELECT: usize = 0x0020;

const LVNI_SELECTED: usize = 0x0002;
const LVIF_STATE_CHANGED: u32 = 0x0008;

const LVN_ITEMCHANGED: i32 = -101;

/// One `LVN_ITEMCHANGED` state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListViewChange {
    pub item: usize,
    pub selected: bool,
    pub was_selected: bool,
}

fn decode_item_change(item: i32, changed: u32, new_state: u32, old_state: u32) -> Option<ListViewChange> {
    if changed & LVIF_STATE_CHANGED == 0 {
        return None;
    }
    let selected_bit = LVIS_SELECTED.0;
    let change = ListViewChange {
        item: usize::try_from(item).ok()?,
        selected: new_state & selected_bit != 0,
        was_selected: old_state & selected_bit != 0,
    };
    // Only selection transitions are reported.
    (change.selected != change.was_selected).then_some(change)
}

fn change_from_notify(nmlv: &NMLISTVIEW) -> Option<ListViewChange> {
    decode_item_change(nmlv.iItem, nmlv.uChanged.0, nmlv.uNewState.0, nmlv.uOldState.0)
}

#[derive(Debug, Clone)]
pub struct ListViewOpts {
    /// (title, logical width) of the initial columns.
    pub columns: Vec<(String, i32)>,
    pub position: Point,
    pub size: Size,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    pub ctrl_id: Option<ControlId>,
    pub grid_lines: bool,
    pub full_row_select: bool,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for ListViewOpts {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            position: Point::new(0, 0),
            size: Size::new(300, 200),
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            ctrl_id: None,
            grid_lines: false,
            full_row_select: true,
            window_style: WS_TABSTOP | WS_VISIBLE,
            window_ex_style: WS_EX_CLIENTEDGE,
        }
    }
}

fn extended_style(opts: &ListViewOpts) -> usize {
    let mut ex = 0;
    if opts.grid_lines {
        ex |= LVS_EX_GRIDLINES;
    }
    if opts.full_row_select {
        ex |= LVS_EX_FULLROWSELECT;
    }
    ex
}

#[derive(Debug, Clone)]
pub struct ListView {
    base: Rc<BaseControl>,
}

impl_control_traits!(ListView);
impl Focusable for ListView {}

fn insert_column(base: &BaseControl, index: usize, title: &str, width: i32) -> PlatformResult<usize> {
    let mut wide = wide_z(title);
    let column = LVCOLUMNW {
        mask: LVCF_TEXT | LVCF_WIDTH,
        cx: base.session().dpi().scale_x(width),
        pszText: PWSTR(wide.as_mut_ptr()),
        ..Default::default()
    };
    let result = base.send(LVM_INSERTCOLUMNW, index, &column as *const _ as isize)?;
    usize::try_from(result).map_err(|_| {
        PlatformError::win32_call(
            "SendMessageW(LVM_INSERTCOLUMNW)",
            format!("control {}, column {index} {title:?}", base.ctrl_id().raw()),
        )
    })
}

impl ListView {
    pub fn new(parent: &impl Parent, opts: ListViewOpts) -> PlatformResult<Self> {
        let base = BaseControl::new(parent, "ListView", opts.ctrl_id)?;
        let ex = extended_style(&opts);
        let params = ControlParams {
            class_name: WC_LISTVIEW,
            text: String::new(),
            style: opts.window_style
                | WINDOW_STYLE(LVS_REPORT | LVS_SINGLESEL | LVS_SHOWSELALWAYS),
            ex_style: opts.window_ex_style,
            position: opts.position,
            size: opts.size,
            resize: opts.resize_behavior,
        };
        let columns = opts.columns;
        let weak = Rc::downgrade(&base);
        base.schedule_create(parent, params, move |_| {
            let Some(base) = weak.upgrade() else {
                return Ok(());
            };
            base.send(LVM_SETEXTENDEDLISTVIEWSTYLE, ex, ex as isize)?;
            for (index, (title, width)) in columns.iter().enumerate() {
                insert_column(&base, index, title, *width)?;
            }
            Ok(())
        });
        Ok(Self { base })
    }

    /// Appends a column; returns its index.
    pub fn add_column(&self, title: &str, width: i32) -> PlatformResult<usize> {
        // An index past the end appends.
        insert_column(&self.base, i32::MAX as usize, title, width)
    }

    /*
     * Appends a row. The first text fills the item itself, the rest fill
     * sub-items 1.. in order. Returns the row index.
     */
    pub fn add_item<S: AsRef<str>>(&self, texts: &[S]) -> PlatformResult<usize> {
        let first = texts.first().map_or("", |s| s.as_ref());
        let mut wide = wide_z(first);
        let item = LVITEMW {
            mask: LVIF_TEXT,
            iItem: i32::MAX,
            iSubItem: 0,
            pszText: PWSTR(wide.as_mut_ptr()),
            ..Default::default()
        };
        let result = self
            .base
            .send(LVM_INSERTITEMW, 0, &item as *const _ as isize)?;
        let row = usize::try_from(result).map_err(|_| {
            PlatformError::win32_call(
                "SendMessageW(LVM_INSERTITEMW)",
                format!("control {}, text {first:?}", self.base.ctrl_id().raw()),
            )
        })?;
        for (sub, text) in texts.iter().enumerate().skip(1) {
            self.set_sub_item_text(row, sub, text.as_ref())?;
        }
        Ok(row)
    }

    pub fn set_sub_item_text(&self, item: usize, sub_item: usize, text: &str) -> PlatformResult<()> {
        let mut wide = wide_z(text);
        let lvi = LVITEMW {
            iSubItem: sub_item as i32,
            pszText: PWSTR(wide.as_mut_ptr()),
            ..Default::default()
        };
        if self
            .base
            .send(LVM_SETITEMTEXTW, item, &lvi as *const _ as isize)?
            == 0
        {
            return Err(PlatformError::win32_call(
                "SendMessageW(LVM_SETITEMTEXTW)",
                format!(
                    "control {}, item {item}, sub-item {sub_item}, {text:?}",
                    self.base.ctrl_id().raw()
                ),
            ));
        }
        Ok(())
    }

    /// Reads a cell, growing the buffer until the text fits.
    pub fn item_text(&self, item: usize, sub_item: usize) -> PlatformResult<String> {
        let mut capacity = 128usize;
        loop {
            let mut buffer = vec![0u16; capacity];
            let lvi = LVITEMW {
                iSubItem: sub_item as i32,
                pszText: PWSTR(buffer.as_mut_ptr()),
                cchTextMax: capacity as i32,
                ..Default::default()
            };
            let copied = self
                .base
                .send(LVM_GETITEMTEXTW, item, &lvi as *const _ as isize)?
                .max(0) as usize;
            if copied + 1 < capacity {
                buffer.truncate(copied);
                return Ok(String::from_utf16_lossy(&buffer));
            }
            capacity *= 2;
        }
    }

    pub fn item_count(&self) -> PlatformResult<usize> {
        Ok(self.base.send(LVM_GETITEMCOUNT, 0, 0)?.max(0) as usize)
    }

    pub fn selected_index(&self) -> PlatformResult<Option<usize>> {
        // Start before the first item: wParam -1.
        let found = self
            .base
            .send(LVM_GETNEXTITEM, usize::MAX, LVNI_SELECTED as isize)?;
        Ok(usize::try_from(found).ok())
    }

    pub fn select(&self, item: usize) -> PlatformResult<()> {
        let lvi = LVITEMW {
            state: LVIS_SELECTED,
            stateMask: LVIS_SELECTED,
            ..Default::default()
        };
        if self
            .base
            .send(LVM_SETITEMSTATE, item, &lvi as *const _ as isize)?
            == 0
        {
            return Err(PlatformError::win32_call(
                "SendMessageW(LVM_SETITEMSTATE)",
                format!("control {}, item {item}", self.base.ctrl_id().raw()),
            ));
        }
        Ok(())
    }

    pub fn delete_all_items(&self) -> PlatformResult<()> {
        if self.base.send(LVM_DELETEALLITEMS, 0, 0)? == 0 {
            return Err(PlatformError::win32_call(
                "SendMessageW(LVM_DELETEALLITEMS)",
                format!("control {}", self.base.ctrl_id().raw()),
            ));
        }
        Ok(())
    }

    /// Selection changes of any row (`LVN_ITEMCHANGED`).
    pub fn on_item_changed<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn(ListViewChange) -> PlatformResult<()> + 'static,
    {
        self.base.on_parent_nfy(LVN_ITEMCHANGED, move |args| {
            let nmlv = args.lparam as *const NMLISTVIEW;
            if nmlv.is_null() {
                return Ok(());
            }
            match change_from_notify(unsafe { &*nmlv }) {
                Some(change) => f(change),
                None => Ok(()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_change_reports_selection_transitions_only() {
        // Arrange
        let selected = LVIS_SELECTED.0;
        // Act
        let gained = decode_item_change(3, LVIF_STATE_CHANGED, selected, 0);
        let focus_only = decode_item_change(3, LVIF_STATE_CHANGED, 0x1, 0);
        let text_change = decode_item_change(3, 0x1, selected, 0);
        // Assert
        assert_eq!(
            gained,
            Some(ListViewChange {
                item: 3,
                selected: true,
                was_selected: false
            })
        );
        assert_eq!(focus_only, None);
        assert_eq!(text_change, None);
    }

    #[test]
    fn header_row_changes_are_ignored() {
        assert_eq!(decode_item_change(-1, LVIF_STATE_CHANGED, 0, LVIS_SELECTED.0), None);
    }

    #[test]
    fn extended_style_follows_flags() {
        let opts = ListViewOpts {
            grid_lines: true,
            ..Default::default()
        };
        assert_eq!(extended_style(&opts), LVS_EX_GRIDLINES | LVS_EX_FULLROWSELECT);
    }

    #[test]
    fn deselection_is_read_from_the_notify_payload() {
        // Arrange
        let mut nmlv = NMLISTVIEW::default();
        nmlv.iItem = 5;
        nmlv.uChanged.0 = LVIF_STATE_CHANGED;
        nmlv.uOldState = LVIS_SELECTED;
        // Act
        let change = change_from_notify(&nmlv);
        // Assert
        assert_eq!(
            change,
            Some(ListViewChange {
                item: 5,
                selected: false,
                was_selected: true
            })
        );
    }
}
