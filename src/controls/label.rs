/*
 * Static text. Without an explicit size the label is sized to its text as
 * measured in the session font.
 */
use super::{BaseControl, ControlParams, impl_control_traits};
use crate::dpi::Dpi;
use crate::error::Result as PlatformResult;
use crate::traits::{Parent, TextControl};
use crate::types::{ControlId, Point, ResizePolicy, Size};

use std::rc::Rc;

use windows::Win32::UI::WindowsAndMessaging::{WINDOW_EX_STYLE, WINDOW_STYLE, WS_VISIBLE};
use windows::core::{PCWSTR, w};

const WC_STATIC: PCWSTR = w!("STATIC");

const SS_LEFT: u32 = 0x0000;
const SS_CENTER: u32 = 0x0001;
const SS_RIGHT: u32 = 0x0002;
const SS_NOTIFY: u32 = 0x0100;

const STN_CLICKED: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone)]
pub struct LabelOpts {
    pub text: String,
    pub position: Point,
    /// `None` sizes the label to its text.
    pub size: Option<Size>,
    pub align: TextAlign,
    pub resize_behavior: (ResizePolicy, ResizePolicy),
    pub ctrl_id: Option<ControlId>,
    pub window_style: WINDOW_STYLE,
    pub window_ex_style: WINDOW_EX_STYLE,
}

impl Default for LabelOpts {
    fn default() -> Self {
        Self {
            text: String::new(),
            position: Point::new(0, 0),
            size: None,
            align: TextAlign::Left,
            resize_behavior: (ResizePolicy::Fixed, ResizePolicy::Fixed),
            ctrl_id: None,
            window_style: WS_VISIBLE,
            window_ex_style: WINDOW_EX_STYLE(0),
        }
    }
}

fn label_style(base: WINDOW_STYLE, align: TextAlign) -> WINDOW_STYLE {
    let ss = match align {
        TextAlign::Left => SS_LEFT,
        TextAlign::Center => SS_CENTER,
        TextAlign::Right => SS_RIGHT,
    };
    base | WINDOW_STYLE(ss | SS_NOTIFY)
}

/// Logical size of the label; only measures when no size was given.
fn label_size(
    explicit: Option<Size>,
    dpi: Dpi,
    measure: impl FnOnce() -> PlatformResult<Size>,
) -> PlatformResult<Size> {
    match explicit {
        Some(size) => Ok(size),
        None => Ok(dpi.unscale_size(measure()?)),
    }
}

#[derive(Debug, Clone)]
pub struct Label {
    base: Rc<BaseControl>,
}

impl_control_traits!(Label);
impl TextControl for Label {}

impl Label {
    pub fn new(parent: &impl Parent, opts: LabelOpts) -> PlatformResult<Self> {
        // Measured before declaring, so a failure leaves the parent untouched.
        let session = parent.base().session();
        let size = label_size(opts.size, session.dpi(), || session.measure_text(&opts.text))?;
        let base = BaseControl::new(parent, "Label", opts.ctrl_id)?;
        let params = ControlParams {
            class_name: WC_STATIC,
            style: label_style(opts.window_style, opts.align),
            ex_style: opts.window_ex_style,
            position: opts.position,
            size,
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
        self.base.on_parent_cmd(STN_CLICKED, move |_| f())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;

    #[test]
    fn alignment_maps_to_static_style() {
        assert_eq!(label_style(WINDOW_STYLE(0), TextAlign::Left).0 & 0x3, SS_LEFT);
        assert_eq!(label_style(WINDOW_STYLE(0), TextAlign::Center).0 & 0x3, SS_CENTER);
        assert_eq!(label_style(WINDOW_STYLE(0), TextAlign::Right).0 & 0x3, SS_RIGHT);
        assert_ne!(label_style(WS_VISIBLE, TextAlign::Left).0 & SS_NOTIFY, 0);
    }

    #[test]
    fn explicit_size_skips_measuring() {
        // Arrange
        let mut measured = false;
        // Act
        let size = label_size(Some(Size::new(80, 20)), Dpi::new(144, 144), || {
            measured = true;
            Ok(Size::new(1, 1))
        });
        // Assert
        assert_eq!(size.unwrap(), Size::new(80, 20));
        assert!(!measured);
    }

    #[test]
    fn measuring_failure_is_returned_before_declaring() {
        // Arrange
        let failing = || Err(PlatformError::Io("GetTextExtentPoint32W failed".into()));
        // Act
        let size = label_size(None, Dpi::default(), failing);
        // Assert
        assert!(matches!(size, Err(PlatformError::Io(_))));
    }

    #[test]
    fn measured_size_is_unscaled_to_logical_units() {
        let size = label_size(None, Dpi::new(144, 144), || Ok(Size::new(150, 30)));
        assert_eq!(size.unwrap(), Size::new(100, 20));
    }
}
