/*
 * Progress bar with a 32-bit range. Marquee mode needs the `PBS_MARQUEE`
 * style, which `set_marquee` switches on the live control.
 */
use super::{BaseControl, ControlParams, impl_control_traits};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::traits::Parent;
use crate::types::{ControlId, Point, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::UI::{
    Controls::{
        PBM_GETPOS, PBM_GETRANGE, PBM_SETMARQUEE, PBM_SETPOS, PBM_SETRANGE32, PBS_SMOOTH,
        PROGRESS_CLASSW,
    },
    WindowsAndMessaging::{
        GWL_STYLE, GetWindowLongPtrW, SetWindowLongPtrW, WINDOW_EX_STYLE, WINDOW_STYLE,
        WS_CLIPSIBLINGS, WS_VISIBLE,
    },
};

const PBS_MARQUEE: u32 = 0x0008;

#[derive(Debug, Clone)]
pub struct ProgressBarOpts {
    pub position: Point,
    pub size: Size,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    pub ctrl_id: Option<ControlId>,
    pub range: (i32, i32),
    pub value: i32,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for ProgressBarOpts {
    fn default() -> Self {
        Self {
            position: Point::new(0, 0),
            size: Size::new(200, 18),
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            ctrl_id: None,
            range: (0, 100),
            value: 0,
            window_style: WS_VISIBLE | WS_CLIPSIBLINGS | WINDOW_STYLE(PBS_SMOOTH),
            window_ex_style: WINDOW_EX_STYLE(0),
        }
    }
}

fn marquee_style(current: u32, on: bool) -> u32 {
    if on {
        current | PBS_MARQUEE
    } else {
        current & !PBS_MARQUEE
    }
}

#[derive(Debug, Clone)]
pub struct ProgressBar {
    base: Rc<BaseControl>,
}

impl_control_traits!(ProgressBar);

fn apply_range(base: &BaseControl, min: i32, max: i32) -> PlatformResult<()> {
    if min > max {
        return Err(PlatformError::OperationFailed(format!(
            "progress range {min}..{max} is inverted"
        )));
    }
    base.send(PBM_SETRANGE32, min as isize as usize, max as isize)
        .map(|_| ())
}

impl ProgressBar {
    pub fn new(parent: &impl Parent, opts: ProgressBarOpts) -> PlatformResult<Self> {
        let base = BaseControl::new(parent, "ProgressBar", opts.ctrl_id)?;
        let params = ControlParams {
            class_name: PROGRESS_CLASSW,
            text: String::new(),
            style: opts.window_style,
            ex_style: opts.window_ex_style,
            position: opts.position,
            size: opts.size,
            resize: opts.resize_behavior,
        };
        let (min, max) = opts.range;
        let value = opts.value;
        let weak = Rc::downgrade(&base);
        base.schedule_create(parent, params, move |_| {
            let Some(base) = weak.upgrade() else {
                return Ok(());
            };
            apply_range(&base, min, max)?;
            base.send(PBM_SETPOS, value as isize as usize, 0).map(|_| ())
        });
        Ok(Self { base })
    }

    pub fn set_range(&self, min: i32, max: i32) -> PlatformResult<()> {
        apply_range(&self.base, min, max)
    }

    pub fn range(&self) -> PlatformResult<(i32, i32)> {
        let min = self.base.send(PBM_GETRANGE, 1, 0)? as i32;
        let max = self.base.send(PBM_GETRANGE, 0, 0)? as i32;
        Ok((min, max))
    }

    /// Returns the previous position.
    pub fn set_position(&self, value: i32) -> PlatformResult<i32> {
        Ok(self.base.send(PBM_SETPOS, value as isize as usize, 0)? as i32)
    }

    pub fn position(&self) -> PlatformResult<i32> {
        Ok(self.base.send(PBM_GETPOS, 0, 0)? as i32)
    }

    /// Switches marquee animation on or off; `interval_ms` 0 uses the default speed.
    pub fn set_marquee(&self, on: bool, interval_ms: u32) -> PlatformResult<()> {
        let hwnd = self.base.hwnd();
        if hwnd.is_invalid() {
            return Err(PlatformError::InvalidHandle(
                "progress bar not created yet".to_string(),
            ));
        }
        unsafe {
            let current = GetWindowLongPtrW(hwnd, GWL_STYLE) as u32;
            SetWindowLongPtrW(hwnd, GWL_STYLE, marquee_style(current, on) as isize);
        }
        self.base
            .send(PBM_SETMARQUEE, on as usize, interval_ms as isize)
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marquee_toggles_only_its_own_bit() {
        let base = WS_VISIBLE.0 | PBS_SMOOTH;
        let on = marquee_style(base, true);
        assert_eq!(on, base | PBS_MARQUEE);
        assert_eq!(marquee_style(on, false), base);
    }
}
