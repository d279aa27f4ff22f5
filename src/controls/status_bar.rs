/*
 * Status bar docked at the bottom of its parent. The bar sizes itself, so it
 * stays out of the layout engine; instead an internal WM_SIZE handler on the
 * parent forwards the resize to the bar and re-splits the parts.
 */
use super::{BaseControl, ControlParams, impl_control_traits, wide_z};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::layout::{PartWidth, split_parts};
use crate::traits::Parent;
use crate::types::{ControlId, Point, ResizeKind, ResizePolicy, Size, msg};

use std::rc::Rc;

use windows::Win32::{
    Foundation::RECT,
    UI::WindowsAndMessaging::{GetClientRect, GetParent, WINDOW_EX_STYLE, WINDOW_STYLE, WS_VISIBLE},
};
use windows::core::{PCWSTR, w};

const WC_STATUSBAR: PCWSTR = w!("msctls_statusbar32");

const CCS_BOTTOM: u32 = 0x0003;
const SBARS_SIZEGRIP: u32 = 0x0100;

const SB_SETTEXTW: u32 = 0x040B;
const SB_GETTEXTW: u32 = 0x040D;
const SB_GETTEXTLENGTHW: u32 = 0x040C;
const SB_SETPARTS: u32 = 0x0404;
const SB_GETPARTS: u32 = 0x0406;

// SB_SETPARTS accepts at most 256 parts.
const MAX_PARTS: usize = 256;

#[derive(Debug, Clone)]
pub struct StatusBarOpts {
    /// Part widths; `Fixed` widths are logical and DPI-scaled.
    pub parts: Vec<PartWidth>,
    pub size_grip: bool,
    pub ctrl_id: Option<ControlId>,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for StatusBarOpts {
    fn default() -> Self {
        Self {
            parts: vec![PartWidth::Proportional(1)],
            size_grip: true,
            ctrl_id: None,
            window_style: WS_VISIBLE,
            window_ex_style: WINDOW_EX_STYLE(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusBar {
    base: Rc<BaseControl>,
    parts: Rc<Vec<PartWidth>>,
}

impl_control_traits!(StatusBar);

fn set_parts(base: &BaseControl, parts: &[PartWidth], width: i32) -> PlatformResult<()> {
    let edges = split_parts(parts, width);
    if base.send(SB_SETPARTS, edges.len(), edges.as_ptr() as isize)? == 0 {
        return Err(PlatformError::win32_call(
            "SendMessageW(SB_SETPARTS)",
            format!("control {}, edges {edges:?}", base.ctrl_id().raw()),
        ));
    }
    Ok(())
}

fn parent_client_width(base: &BaseControl) -> PlatformResult<i32> {
    let hwnd_parent = unsafe { GetParent(base.hwnd()) }
        .map_err(|e| PlatformError::win32_call("GetParent", format!("{:?}: {e:?}", base.hwnd())))?;
    let mut rc = RECT::default();
    unsafe { GetClientRect(hwnd_parent, &mut rc) }
        .map_err(|e| PlatformError::win32_call("GetClientRect", format!("{hwnd_parent:?}: {e:?}")))?;
    Ok(rc.right - rc.left)
}

impl StatusBar {
    pub fn new(parent: &impl Parent, opts: StatusBarOpts) -> PlatformResult<Self> {
        if opts.parts.is_empty() || opts.parts.len() > MAX_PARTS {
            return Err(PlatformError::OperationFailed(format!(
                "a status bar takes 1 to {MAX_PARTS} parts, got {}",
                opts.parts.len()
            )));
        }
        let base = BaseControl::new(parent, "StatusBar", opts.ctrl_id)?;
        let dpi = base.session().dpi();
        let parts: Rc<Vec<PartWidth>> = Rc::new(
            opts.parts
                .iter()
                .map(|p| match *p {
                    PartWidth::Fixed(w) => PartWidth::Fixed(dpi.scale_x(w)),
                    other => other,
                })
                .collect(),
        );

        let mut style = opts.window_style | WINDOW_STYLE(CCS_BOTTOM);
        if opts.size_grip {
            style |= WINDOW_STYLE(SBARS_SIZEGRIP);
        }
        let params = ControlParams {
            class_name: WC_STATUSBAR,
            text: String::new(),
            style,
            ex_style: opts.window_ex_style,
            position: Point::new(0, 0),
            size: Size::new(0, 0),
            resize: (ResizePolicy::Fixed, ResizePolicy::Fixed),
        };
        {
            let weak = Rc::downgrade(&base);
            let parts = Rc::clone(&parts);
            base.schedule_create(parent, params, move |_| match weak.upgrade() {
                Some(base) => set_parts(&base, &parts, parent_client_width(&base)?),
                None => Ok(()),
            });
        }
        {
            let weak = Rc::downgrade(&base);
            let parts = Rc::clone(&parts);
            base.on_parent_internal_msg(msg::WM_SIZE, move |args| {
                let base = weak.upgrade()?;
                if !base.is_created() || ResizeKind::from_raw(args.wparam) == Some(ResizeKind::Minimized) {
                    return None;
                }
                // The bar repositions itself when it sees WM_SIZE.
                let _ = base.send(msg::WM_SIZE, 0, 0);
                if let Err(e) = set_parts(&base, &parts, args.lo_word_lparam() as i32) {
                    log::error!("StatusBar: re-splitting parts failed: {e}");
                }
                None
            })?;
        }
        Ok(Self { base, parts })
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn part(&self, index: usize) -> Option<StatusBarPart<'_>> {
        (index < self.parts.len()).then_some(StatusBarPart { bar: self, index })
    }

    /// Current right edges of the parts, as the bar reports them.
    pub fn part_edges(&self) -> PlatformResult<Vec<i32>> {
        let mut edges = vec![0i32; self.parts.len()];
        let count = self
            .base
            .send(SB_GETPARTS, edges.len(), edges.as_mut_ptr() as isize)?;
        edges.truncate(count.max(0) as usize);
        Ok(edges)
    }

    /// Forces a re-split against the parent's current width.
    pub fn refresh_parts(&self) -> PlatformResult<()> {
        let width = parent_client_width(&self.base)?;
        set_parts(&self.base, &self.parts, width)
    }
}

/// Index-keyed view of one part of a `StatusBar`.
#[derive(Debug, Clone, Copy)]
pub struct StatusBarPart<'a> {
    bar: &'a StatusBar,
    index: usize,
}

impl StatusBarPart<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_text(&self, text: &str) -> PlatformResult<()> {
        let wide = wide_z(text);
        let base = &self.bar.base;
        if base.send(SB_SETTEXTW, self.index, wide.as_ptr() as isize)? == 0 {
            return Err(PlatformError::win32_call(
                "SendMessageW(SB_SETTEXTW)",
                format!(
                    "control {}, part {}, text {text:?}",
                    base.ctrl_id().raw(),
                    self.index
                ),
            ));
        }
        Ok(())
    }

    pub fn text(&self) -> PlatformResult<String> {
        let base = &self.bar.base;
        // Length in the low word, drawing flags in the high word.
        let len = (base.send(SB_GETTEXTLENGTHW, self.index, 0)? & 0xFFFF) as usize;
        let mut buffer = vec![0u16; len + 1];
        base.send(SB_GETTEXTW, self.index, buffer.as_mut_ptr() as isize)?;
        buffer.truncate(len);
        Ok(String::from_utf16_lossy(&buffer))
    }
}
