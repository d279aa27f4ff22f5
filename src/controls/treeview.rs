/*
 * Tree view. Items are identified by their native `HTREEITEM`; a
 * `TreeViewItem` is a cheap handle pairing that item with its tree. Item
 * handles stay valid until the item or the tree is deleted.
 */
use super::{BaseControl, ControlParams, impl_control_traits, wide_z};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::traits::{Focusable, Parent};
use crate::types::{ControlId, Point, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::UI::{
    Controls::{
        HTREEITEM, NMTREEVIEWW, TVIF_HANDLE, TVIF_TEXT, TVINSERTSTRUCTW, TVINSERTSTRUCTW_0,
        TVITEMW, TVM_DELETEITEM, TVM_EXPAND, TVM_GETCOUNT, TVM_GETITEMW, TVM_GETNEXTITEM,
        TVM_INSERTITEMW, TVM_SELECTITEM, TVM_SETITEMW,
    },
    WindowsAndMessaging::{WINDOW_EX_STYLE, WINDOW_STYLE, WS_EX_CLIENTEDGE, WS_TABSTOP, WS_VISIBLE},
};
use windows::core::{PCWSTR, PWSTR, w};

const WC_TREEVIEW: PCWSTR = w!("SysTreeView32");

// TreeView styles
const TVS_HASBUTTONS: u32 = 0x0001;
const TVS_HASLINES: u32 = 0x0002;
const TVS_LINESATROOT: u32 = 0x0004;
const TVS_SHOWSELALWAYS: u32 = 0x0020;

// Special item handles
const TVI_ROOT: isize = -0x10000;
const TVI_LAST: isize = -0xFFFE;

// TVM_GETNEXTITEM / TVM_SELECTITEM relations
const TVGN_ROOT: usize = 0x0000;
const TVGN_NEXT: usize = 0x0001;
const TVGN_PARENT: usize = 0x0003;
const TVGN_CHILD: usize = 0x0004;
const TVGN_CARET: usize = 0x0009;

const TVE_COLLAPSE: usize = 0x0001;
const TVE_EXPAND: usize = 0x0002;

const TVN_SELCHANGEDW: i32 = -451;

#[derive(Debug, Clone)]
pub struct TreeViewOpts {
    pub position: Point,
    pub size: Size,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    pub ctrl_id: Option<ControlId>,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for TreeViewOpts {
    fn default() -> Self {
        Self {
            position: Point::new(0, 0),
            size: Size::new(200, 300),
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            ctrl_id: None,
            window_style: WS_TABSTOP
                | WS_VISIBLE
                | WINDOW_STYLE(TVS_HASBUTTONS | TVS_HASLINES | TVS_LINESATROOT | TVS_SHOWSELALWAYS),
            window_ex_style: WS_EX_CLIENTEDGE,
        }
    }
}

/// `TVM_GETNEXTITEM` and friends return 0 for "no such item".
fn item_from_result(result: isize) -> Option<HTREEITEM> {
    (result != 0).then_some(HTREEITEM(result))
}

#[derive(Debug, Clone)]
pub struct TreeView {
    base: Rc<BaseControl>,
}

impl_control_traits!(TreeView);
impl Focusable for TreeView {}

impl TreeView {
    pub fn new(parent: &impl Parent, opts: TreeViewOpts) -> PlatformResult<Self> {
        let base = BaseControl::new(parent, "TreeView", opts.ctrl_id)?;
        let params = ControlParams {
            class_name: WC_TREEVIEW,
            text: String::new(),
            style: opts.window_style,
            ex_style: opts.window_ex_style,
            position: opts.position,
            size: opts.size,
            resize: opts.resize_behavior,
        };
        base.schedule_create(parent, params, |_| Ok(()));
        Ok(Self { base })
    }

    fn item(&self, hitem: HTREEITEM) -> TreeViewItem {
        TreeViewItem {
            base: Rc::clone(&self.base),
            hitem,
        }
    }

    pub fn add_root(&self, text: &str) -> PlatformResult<TreeViewItem> {
        let hitem = insert_item(&self.base, HTREEITEM(TVI_ROOT), text)?;
        Ok(self.item(hitem))
    }

    pub fn first_root(&self) -> PlatformResult<Option<TreeViewItem>> {
        let result = self.base.send(TVM_GETNEXTITEM, TVGN_ROOT, 0)?;
        Ok(item_from_result(result).map(|h| self.item(h)))
    }

    pub fn selected_item(&self) -> PlatformResult<Option<TreeViewItem>> {
        let result = self.base.send(TVM_GETNEXTITEM, TVGN_CARET, 0)?;
        Ok(item_from_result(result).map(|h| self.item(h)))
    }

    pub fn item_count(&self) -> PlatformResult<usize> {
        Ok(self.base.send(TVM_GETCOUNT, 0, 0)?.max(0) as usize)
    }

    pub fn delete_all(&self) -> PlatformResult<()> {
        // TVI_ROOT deletes every item.
        if self.base.send(TVM_DELETEITEM, 0, TVI_ROOT)? == 0 {
            return Err(PlatformError::win32_call(
                "SendMessageW(TVM_DELETEITEM, TVI_ROOT)",
                format!("control {}", self.base.ctrl_id().raw()),
            ));
        }
        Ok(())
    }

    /// `f` receives the newly selected item (`TVN_SELCHANGEDW`).
    pub fn on_sel_changed<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn(TreeViewItem) -> PlatformResult<()> + 'static,
    {
        let base = Rc::downgrade(&self.base);
        self.base.on_parent_nfy(TVN_SELCHANGEDW, move |args| {
            let nmtv = args.lparam as *const NMTREEVIEWW;
            let Some(base) = base.upgrade() else {
                return Ok(());
            };
            if nmtv.is_null() {
                return Ok(());
            }
            let hitem = unsafe { (*nmtv).itemNew.hItem };
            if hitem.0 == 0 {
                return Ok(());
            }
            f(TreeViewItem { base, hitem })
        })
    }
}

fn insert_item(base: &BaseControl, parent: HTREEITEM, text: &str) -> PlatformResult<HTREEITEM> {
    let mut wide = wide_z(text);
    let insert = TVINSERTSTRUCTW {
        hParent: parent,
        hInsertAfter: HTREEITEM(TVI_LAST),
        Anonymous: TVINSERTSTRUCTW_0 {
            item: TVITEMW {
                mask: TVIF_TEXT,
                pszText: PWSTR(wide.as_mut_ptr()),
                ..Default::default()
            },
        },
    };
    let result = base.send(TVM_INSERTITEMW, 0, &insert as *const _ as isize)?;
    item_from_result(result).ok_or_else(|| {
        PlatformError::win32_call(
            "SendMessageW(TVM_INSERTITEMW)",
            format!(
                "control {}, parent {:#X}, text {text:?}",
                base.ctrl_id().raw(),
                parent.0
            ),
        )
    })
}

#[derive(Debug, Clone)]
pub struct TreeViewItem {
    base: Rc<BaseControl>,
    hitem: HTREEITEM,
}

impl PartialEq for TreeViewItem {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.base, &other.base) && self.hitem == other.hitem
    }
}

impl TreeViewItem {
    pub fn raw_handle(&self) -> isize {
        self.hitem.0
    }

    fn related(&self, relation: usize) -> PlatformResult<Option<TreeViewItem>> {
        let result = self
            .base
            .send(TVM_GETNEXTITEM, relation, self.hitem.0)?;
        Ok(item_from_result(result).map(|hitem| TreeViewItem {
            base: Rc::clone(&self.base),
            hitem,
        }))
    }

    pub fn add_child(&self, text: &str) -> PlatformResult<TreeViewItem> {
        let hitem = insert_item(&self.base, self.hitem, text)?;
        Ok(TreeViewItem {
            base: Rc::clone(&self.base),
            hitem,
        })
    }

    pub fn parent(&self) -> PlatformResult<Option<TreeViewItem>> {
        self.related(TVGN_PARENT)
    }

    pub fn first_child(&self) -> PlatformResult<Option<TreeViewItem>> {
        self.related(TVGN_CHILD)
    }

    pub fn next_sibling(&self) -> PlatformResult<Option<TreeViewItem>> {
        self.related(TVGN_NEXT)
    }

    pub fn text(&self) -> PlatformResult<String> {
        let mut capacity = 128usize;
        loop {
            let mut buffer = vec![0u16; capacity];
            let mut tvi = TVITEMW {
                mask: TVIF_TEXT | TVIF_HANDLE,
                hItem: self.hitem,
                pszText: PWSTR(buffer.as_mut_ptr()),
                cchTextMax: capacity as i32,
                ..Default::default()
            };
            if self
                .base
                .send(TVM_GETITEMW, 0, &mut tvi as *mut _ as isize)?
                == 0
            {
                return Err(PlatformError::win32_call(
                    "SendMessageW(TVM_GETITEMW)",
                    format!("control {}, item {:#X}", self.base.ctrl_id().raw(), self.hitem.0),
                ));
            }
            let len = buffer.iter().position(|&c| c == 0).unwrap_or(capacity);
            if len + 1 < capacity {
                buffer.truncate(len);
                return Ok(String::from_utf16_lossy(&buffer));
            }
            capacity *= 2;
        }
    }

    pub fn set_text(&self, text: &str) -> PlatformResult<()> {
        let mut wide = wide_z(text);
        let tvi = TVITEMW {
            mask: TVIF_TEXT | TVIF_HANDLE,
            hItem: self.hitem,
            pszText: PWSTR(wide.as_mut_ptr()),
            ..Default::default()
        };
        if self.base.send(TVM_SETITEMW, 0, &tvi as *const _ as isize)? == 0 {
            return Err(PlatformError::win32_call(
                "SendMessageW(TVM_SETITEMW)",
                format!(
                    "control {}, item {:#X}, text {text:?}",
                    self.base.ctrl_id().raw(),
                    self.hitem.0
                ),
            ));
        }
        Ok(())
    }

    /// Expands or collapses the item. Items without children report no change.
    pub fn expand(&self, expand: bool) -> PlatformResult<bool> {
        let action = if expand { TVE_EXPAND } else { TVE_COLLAPSE };
        Ok(self.base.send(TVM_EXPAND, action, self.hitem.0)? != 0)
    }

    pub fn select(&self) -> PlatformResult<()> {
        if self
            .base
            .send(TVM_SELECTITEM, TVGN_CARET, self.hitem.0)?
            == 0
        {
            return Err(PlatformError::win32_call(
                "SendMessageW(TVM_SELECTITEM)",
                format!("control {}, item {:#X}", self.base.ctrl_id().raw(), self.hitem.0),
            ));
        }
        Ok(())
    }

    /// Deletes the item and its subtree; the handle is dead afterwards.
    pub fn delete(self) -> PlatformResult<()> {
        if self.base.send(TVM_DELETEITEM, 0, self.hitem.0)? == 0 {
            return Err(PlatformError::win32_call(
                "SendMessageW(TVM_DELETEITEM)",
                format!("control {}, item {:#X}", self.base.ctrl_id().raw(), self.hitem.0),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_result_means_no_item() {
        assert_eq!(item_from_result(0), None);
        assert_eq!(item_from_result(0x1234), Some(HTREEITEM(0x1234)));
    }

    #[test]
    fn special_handles_match_commctrl() {
        assert_eq!(TVI_ROOT as usize as u32, 0xFFFF_0000);
        assert_eq!(TVI_LAST as usize as u32, 0xFFFF_0002);
    }
}
