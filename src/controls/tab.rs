/*
 * Tab control. Tabs are addressed by index; `TabItem` is an index-keyed view
 * onto one of them. The control only draws the tab strip, callers show and
 * hide their own page contents on `on_sel_change`.
 */
use super::{BaseControl, ControlParams, impl_control_traits, wide_z};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::traits::{Focusable, Parent, Window};
use crate::types::{ControlId, Point, Rect, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::{
    Foundation::RECT,
    UI::{
        Controls::{
            TCIF_TEXT, TCITEMW, TCM_ADJUSTRECT, TCM_GETCURSEL, TCM_GETITEMCOUNT, TCM_GETITEMW,
            TCM_INSERTITEMW, TCM_SETCURSEL, TCM_SETITEMW,
        },
        WindowsAndMessaging::{WINDOW_EX_STYLE, WINDOW_STYLE, WS_CLIPSIBLINGS, WS_TABSTOP, WS_VISIBLE},
    },
};
use windows::core::{PCWSTR, PWSTR, w};

const WC_TABCONTROL: PCWSTR = w!("SysTabControl32");

const TCN_SELCHANGE: i32 = -551;

#[derive(Debug, Clone)]
pub struct TabOpts {
    pub titles: Vec<String>,
    pub position: Point,
    pub size: Size,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    pub ctrl_id: Option<ControlId>,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for TabOpts {
    fn default() -> Self {
        Self {
            titles: Vec::new(),
            position: Point::new(0, 0),
            size: Size::new(300, 200),
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            ctrl_id: None,
            window_style: WS_TABSTOP | WS_VISIBLE | WS_CLIPSIBLINGS,
            window_ex_style: WINDOW_EX_STYLE(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tab {
    base: Rc<BaseControl>,
}

impl_control_traits!(Tab);
impl Focusable for Tab {}

fn insert_tab(base: &BaseControl, index: usize, title: &str) -> PlatformResult<usize> {
    let mut wide = wide_z(title);
    let item = TCITEMW {
        mask: TCIF_TEXT,
        pszText: PWSTR(wide.as_mut_ptr()),
        ..Default::default()
    };
    let result = base.send(TCM_INSERTITEMW, index, &item as *const _ as isize)?;
    usize::try_from(result).map_err(|_| {
        PlatformError::win32_call(
            "SendMessageW(TCM_INSERTITEMW)",
            format!("control {}, index {index}, title {title:?}", base.ctrl_id().raw()),
        )
    })
}

impl Tab {
    pub fn new(parent: &impl Parent, opts: TabOpts) -> PlatformResult<Self> {
        let base = BaseControl::new(parent, "Tab", opts.ctrl_id)?;
        let params = ControlParams {
            class_name: WC_TABCONTROL,
            text: String::new(),
            style: opts.window_style,
            ex_style: opts.window_ex_style,
            position: opts.position,
            size: opts.size,
            resize: opts.resize_behavior,
        };
        let titles = opts.titles;
        let weak = Rc::downgrade(&base);
        base.schedule_create(parent, params, move |_| {
            let Some(base) = weak.upgrade() else {
                return Ok(());
            };
            for (index, title) in titles.iter().enumerate() {
                insert_tab(&base, index, title)?;
            }
            Ok(())
        });
        Ok(Self { base })
    }

    /// Appends a tab.
    pub fn add_tab(&self, title: &str) -> PlatformResult<TabItem<'_>> {
        let index = insert_tab(&self.base, self.count()?, title)?;
        Ok(TabItem { tab: self, index })
    }

    pub fn tab(&self, index: usize) -> PlatformResult<Option<TabItem<'_>>> {
        Ok((index < self.count()?).then_some(TabItem { tab: self, index }))
    }

    pub fn count(&self) -> PlatformResult<usize> {
        Ok(self.base.send(TCM_GETITEMCOUNT, 0, 0)?.max(0) as usize)
    }

    pub fn selected_index(&self) -> PlatformResult<Option<usize>> {
        Ok(usize::try_from(self.base.send(TCM_GETCURSEL, 0, 0)?).ok())
    }

    /// Area below the tab strip, in the tab control's client coordinates.
    pub fn display_area(&self) -> PlatformResult<Rect> {
        let client = self.client_rect()?;
        let mut rc = RECT {
            left: client.left,
            top: client.top,
            right: client.right,
            bottom: client.bottom,
        };
        self.base
            .send(TCM_ADJUSTRECT, 0, &mut rc as *mut RECT as isize)?;
        Ok(Rect {
            left: rc.left,
            top: rc.top,
            right: rc.right,
            bottom: rc.bottom,
        })
    }

    /// `f` receives the newly selected index (`TCN_SELCHANGE`).
    pub fn on_sel_change<F>(&self, f: F) -> PlatformResult<()>
    where
        F: Fn(usize) -> PlatformResult<()> + 'static,
    {
        let base = Rc::downgrade(&self.base);
        self.base.on_parent_nfy(TCN_SELCHANGE, move |_| {
            let Some(base) = base.upgrade() else {
                return Ok(());
            };
            match usize::try_from(base.send(TCM_GETCURSEL, 0, 0)?) {
                Ok(index) => f(index),
                Err(_) => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TabItem<'a> {
    tab: &'a Tab,
    index: usize,
}

impl TabItem<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> PlatformResult<String> {
        let mut buffer = vec![0u16; 256];
        let item = TCITEMW {
            mask: TCIF_TEXT,
            pszText: PWSTR(buffer.as_mut_ptr()),
            cchTextMax: buffer.len() as i32,
            ..Default::default()
        };
        if self
            .tab
            .base
            .send(TCM_GETITEMW, self.index, &item as *const _ as isize)?
            == 0
        {
            return Err(PlatformError::win32_call(
                "SendMessageW(TCM_GETITEMW)",
                format!("control {}, index {}", self.tab.base.ctrl_id().raw(), self.index),
            ));
        }
        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        buffer.truncate(len);
        Ok(String::from_utf16_lossy(&buffer))
    }

    pub fn set_title(&self, title: &str) -> PlatformResult<()> {
        let mut wide = wide_z(title);
        let item = TCITEMW {
            mask: TCIF_TEXT,
            pszText: PWSTR(wide.as_mut_ptr()),
            ..Default::default()
        };
        if self
            .tab
            .base
            .send(TCM_SETITEMW, self.index, &item as *const _ as isize)?
            == 0
        {
            return Err(PlatformError::win32_call(
                "SendMessageW(TCM_SETITEMW)",
                format!(
                    "control {}, index {}, title {title:?}",
                    self.tab.base.ctrl_id().raw(),
                    self.index
                ),
            ));
        }
        Ok(())
    }

    /// Selects the tab. Like the native message, this does not raise
    /// `on_sel_change`.
    pub fn select(&self) -> PlatformResult<()> {
        let previous = self.tab.base.send(TCM_SETCURSEL, self.index, 0)?;
        log::trace!("Tab: selected {} (was {previous})", self.index);
        Ok(())
    }
}
