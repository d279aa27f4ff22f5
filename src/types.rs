/*
 * Platform-agnostic value types used throughout the crate: opaque native
 * handles, control IDs, geometry, resize policies and the raw message tuple
 * delivered by the OS. None of these touch Win32, so the dispatch and layout
 * logic built on them can be unit-tested on any host.
 */

/// Opaque OS-assigned identifier for a window or control. Zero until created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeHandle(pub isize);

impl NativeHandle {
    pub const NULL: NativeHandle = NativeHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Identifies a child control within its parent window. Sent as the low word
/// of `WM_COMMAND` and in `NMHDR::idFrom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u16);

impl ControlId {
    pub const fn new(raw: u16) -> Self {
        ControlId(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub cx: i32,
    pub cy: i32,
}

impl Size {
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn from_pos_size(pos: Point, size: Size) -> Self {
        Self {
            left: pos.x,
            top: pos.y,
            right: pos.x + size.cx,
            bottom: pos.y + size.cy,
        }
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub const fn position(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

/// How one axis of a child control follows its parent when the parent resizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizePolicy {
    /// Keeps its original offset and extent.
    #[default]
    Fixed,
    /// Keeps its extent, moves with the far edge of the parent.
    Anchor,
    /// Keeps its near-edge offset, grows and shrinks with the parent.
    Stretch,
}

/// The `wParam` of `WM_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeKind {
    Restored,
    Minimized,
    Maximized,
    MaxShow,
    MaxHide,
}

impl ResizeKind {
    pub fn from_raw(raw: usize) -> Option<Self> {
        match raw {
            0 => Some(ResizeKind::Restored),
            1 => Some(ResizeKind::Minimized),
            2 => Some(ResizeKind::Maximized),
            3 => Some(ResizeKind::MaxShow),
            4 => Some(ResizeKind::MaxHide),
            _ => None,
        }
    }
}

/// A message exactly as the window procedure received it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WmArgs {
    pub msg: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl WmArgs {
    pub const fn new(msg: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            msg,
            wparam,
            lparam,
        }
    }

    #[inline]
    pub fn lo_word_wparam(&self) -> u16 {
        (self.wparam & 0xFFFF) as u16
    }

    #[inline]
    pub fn hi_word_wparam(&self) -> u16 {
        ((self.wparam >> 16) & 0xFFFF) as u16
    }

    #[inline]
    pub fn lo_word_lparam(&self) -> u16 {
        (self.lparam & 0xFFFF) as u16
    }

    #[inline]
    pub fn hi_word_lparam(&self) -> u16 {
        ((self.lparam >> 16) & 0xFFFF) as u16
    }
}

/// Message and notification codes the portable core needs to recognize.
pub mod msg {
    pub const WM_CREATE: u32 = 0x0001;
    pub const WM_DESTROY: u32 = 0x0002;
    pub const WM_SIZE: u32 = 0x0005;
    pub const WM_CLOSE: u32 = 0x0010;
    pub const WM_NOTIFY: u32 = 0x004E;
    pub const WM_NCDESTROY: u32 = 0x0082;
    pub const WM_INITDIALOG: u32 = 0x0110;
    pub const WM_COMMAND: u32 = 0x0111;
    pub const WM_APP: u32 = 0x8000;
    // Wakes the owning thread to drain closures queued from other threads.
    pub const WM_APP_UI_THREAD: u32 = WM_APP + 0x3FFF;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_from_pos_size_round_trips_geometry() {
        let rc = Rect::from_pos_size(Point::new(10, 20), Size::new(100, 30));
        assert_eq!(rc.width(), 100);
        assert_eq!(rc.height(), 30);
        assert_eq!(rc.position(), Point::new(10, 20));
        assert_eq!(rc.right, 110);
    }

    #[test]
    fn wm_size_wparam_decodes_minimized() {
        assert_eq!(ResizeKind::from_raw(1), Some(ResizeKind::Minimized));
        assert_eq!(ResizeKind::from_raw(0), Some(ResizeKind::Restored));
        assert_eq!(ResizeKind::from_raw(9), None);
    }

    #[test]
    fn wm_args_splits_command_words() {
        // BN_CLICKED from control 20001
        let args = WmArgs::new(msg::WM_COMMAND, 20001, 0x1234);
        assert_eq!(args.lo_word_wparam(), 20001);
        assert_eq!(args.hi_word_wparam(), 0);

        let size = WmArgs::new(msg::WM_SIZE, 0, (200 << 16) | 400);
        assert_eq!(size.lo_word_lparam(), 400);
        assert_eq!(size.hi_word_lparam(), 200);
    }

    #[test]
    fn null_handle_is_default() {
        assert!(NativeHandle::default().is_null());
        assert!(!NativeHandle(0x10).is_null());
    }
}
