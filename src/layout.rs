/*
 * Resize engine for child controls. Each child's rectangle is recorded in
 * parent client coordinates together with one `ResizePolicy` per axis; the
 * parent's client size at creation time is the reference. On every resize
 * the engine derives each child's new rectangle from the delta between the
 * new and the original parent extent. The Win32 side applies the result in
 * a single deferred-window-position batch.
 */
use crate::types::{NativeHandle, Rect, ResizeKind, ResizePolicy, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutChild {
    pub handle: NativeHandle,
    pub rect: Rect,
    pub horz: ResizePolicy,
    pub vert: ResizePolicy,
}

#[derive(Debug, Default)]
pub struct Layout {
    children: Vec<LayoutChild>,
    original_parent: Option<Size>,
}

/// Returns (new offset, new extent) for one axis.
fn resolve_axis(policy: ResizePolicy, offset: i32, extent: i32, delta: i32) -> (i32, i32) {
    match policy {
        ResizePolicy::Fixed => (offset, extent),
        ResizePolicy::Anchor => (offset + delta, extent),
        ResizePolicy::Stretch => (offset, (extent + delta).max(0)),
    }
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, handle: NativeHandle, rect: Rect, horz: ResizePolicy, vert: ResizePolicy) {
        log::trace!("Layout: child {handle:?} at {rect:?}, policies ({horz:?}, {vert:?})");
        self.children.push(LayoutChild {
            handle,
            rect,
            horz,
            vert,
        });
    }

    pub fn set_original_parent_size(&mut self, size: Size) {
        self.original_parent = Some(size);
    }

    pub fn original_parent_size(&self) -> Option<Size> {
        self.original_parent
    }

    /// Forgets every child and the reference size; the parent was destroyed
    /// and the next creation records both again.
    pub fn clear(&mut self) {
        log::trace!("Layout: clearing {} child(ren)", self.children.len());
        self.children.clear();
        self.original_parent = None;
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> &[LayoutChild] {
        &self.children
    }

    /*
     * Computes every child's rectangle for a parent client area of
     * `new_size`. Minimizing, an empty layout or a layout whose parent size
     * was never recorded yields no repositioning at all.
     */
    pub fn compute(&self, kind: ResizeKind, new_size: Size) -> Vec<(NativeHandle, Rect)> {
        if kind == ResizeKind::Minimized || self.children.is_empty() {
            return Vec::new();
        }
        let Some(original) = self.original_parent else {
            log::warn!("Layout: resize before the parent size was recorded; ignoring");
            return Vec::new();
        };
        let dx = new_size.cx - original.cx;
        let dy = new_size.cy - original.cy;

        self.children
            .iter()
            .map(|child| {
                let (x, cx) = resolve_axis(child.horz, child.rect.left, child.rect.width(), dx);
                let (y, cy) = resolve_axis(child.vert, child.rect.top, child.rect.height(), dy);
                (
                    child.handle,
                    Rect {
                        left: x,
                        top: y,
                        right: x + cx,
                        bottom: y + cy,
                    },
                )
            })
            .collect()
    }
}

/// Width of one status bar part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartWidth {
    /// Pixels, already DPI-scaled.
    Fixed(i32),
    /// Share of what the fixed parts leave over, by weight.
    Proportional(u32),
}

/*
 * Splits `total` pixels into parts and returns each part's right edge, the
 * form `SB_SETPARTS` takes. Fixed parts keep their width; proportional parts
 * divide the remainder by weight, the last of them absorbing rounding. The
 * final edge is never short of `total` so the bar is always covered.
 */
pub fn split_parts(parts: &[PartWidth], total: i32) -> Vec<i32> {
    let fixed: i32 = parts
        .iter()
        .map(|p| match p {
            PartWidth::Fixed(w) => (*w).max(0),
            PartWidth::Proportional(_) => 0,
        })
        .sum();
    let weights: u64 = parts
        .iter()
        .map(|p| match p {
            PartWidth::Proportional(w) => u64::from(*w),
            PartWidth::Fixed(_) => 0,
        })
        .sum();
    let remaining = i64::from((total - fixed).max(0));
    let last_proportional = parts
        .iter()
        .rposition(|p| matches!(p, PartWidth::Proportional(w) if *w > 0));

    let mut edges = Vec::with_capacity(parts.len());
    let mut right = 0i32;
    let mut handed_out = 0i64;
    for (index, part) in parts.iter().enumerate() {
        let width = match *part {
            PartWidth::Fixed(w) => w.max(0),
            PartWidth::Proportional(_) if Some(index) == last_proportional => {
                (remaining - handed_out) as i32
            }
            PartWidth::Proportional(w) if weights > 0 => {
                let share = remaining * i64::from(w) / weights as i64;
                handed_out += share;
                share as i32
            }
            PartWidth::Proportional(_) => 0,
        };
        right += width;
        edges.push(right);
    }
    if let Some(last) = edges.last_mut() {
        *last = (*last).max(total);
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rect {
        Rect::from_pos_size(Point::new(x, y), Size::new(w, h))
    }

    fn single_child(horz: ResizePolicy, vert: ResizePolicy, child: Rect, parent: Size) -> Layout {
        let mut layout = Layout::new();
        layout.add(NativeHandle(0x10), child, horz, vert);
        layout.set_original_parent_size(parent);
        layout
    }

    #[test]
    fn fixed_on_both_axes_keeps_original_rect() {
        let original = rect(10, 10, 100, 20);
        let layout = single_child(
            ResizePolicy::Fixed,
            ResizePolicy::Fixed,
            original,
            Size::new(300, 200),
        );
        for new_size in [Size::new(400, 250), Size::new(120, 90), Size::new(300, 200)] {
            let out = layout.compute(ResizeKind::Restored, new_size);
            assert_eq!(out, vec![(NativeHandle(0x10), original)]);
        }
    }

    #[test]
    fn stretch_on_both_axes_grows_size_by_delta() {
        // Arrange
        let layout = single_child(
            ResizePolicy::Stretch,
            ResizePolicy::Stretch,
            rect(10, 15, 100, 20),
            Size::new(300, 200),
        );
        // Act
        let out = layout.compute(ResizeKind::Maximized, Size::new(450, 260));
        // Assert
        assert_eq!(out[0].1, rect(10, 15, 100 + 150, 20 + 60));
    }

    #[test]
    fn anchor_on_both_axes_moves_by_delta() {
        let layout = single_child(
            ResizePolicy::Anchor,
            ResizePolicy::Anchor,
            rect(200, 160, 80, 24),
            Size::new(300, 200),
        );
        let out = layout.compute(ResizeKind::Restored, Size::new(250, 260));
        assert_eq!(out[0].1, rect(200 - 50, 160 + 60, 80, 24));
    }

    #[test]
    fn minimized_resize_repositions_nothing() {
        let layout = single_child(
            ResizePolicy::Stretch,
            ResizePolicy::Anchor,
            rect(10, 10, 100, 20),
            Size::new(300, 200),
        );
        assert!(layout.compute(ResizeKind::Minimized, Size::new(0, 0)).is_empty());
        assert_eq!(layout.children()[0].rect, rect(10, 10, 100, 20));
    }

    #[test]
    fn empty_layout_repositions_nothing() {
        let mut layout = Layout::new();
        layout.set_original_parent_size(Size::new(300, 200));
        assert!(layout.compute(ResizeKind::Restored, Size::new(400, 300)).is_empty());
    }

    #[test]
    fn stretch_horizontal_fixed_vertical_scenario() {
        let layout = single_child(
            ResizePolicy::Stretch,
            ResizePolicy::Fixed,
            rect(10, 10, 100, 20),
            Size::new(300, 200),
        );
        let out = layout.compute(ResizeKind::Restored, Size::new(400, 200));
        assert_eq!(out[0].1, rect(10, 10, 200, 20));
    }

    #[test]
    fn stretch_never_produces_negative_extent() {
        let layout = single_child(
            ResizePolicy::Stretch,
            ResizePolicy::Fixed,
            rect(10, 10, 100, 20),
            Size::new(300, 200),
        );
        let out = layout.compute(ResizeKind::Restored, Size::new(50, 200));
        assert_eq!(out[0].1.width(), 0);
        assert_eq!(out[0].1.left, 10);
    }

    #[test]
    fn mixed_children_follow_their_own_policies() {
        let mut layout = Layout::new();
        layout.add(
            NativeHandle(1),
            rect(10, 10, 280, 150),
            ResizePolicy::Stretch,
            ResizePolicy::Stretch,
        );
        layout.add(
            NativeHandle(2),
            rect(210, 170, 80, 24),
            ResizePolicy::Anchor,
            ResizePolicy::Anchor,
        );
        layout.set_original_parent_size(Size::new(300, 200));

        let out = layout.compute(ResizeKind::Restored, Size::new(500, 300));

        assert_eq!(out.len(), 2);
        assert_eq!(out[0], (NativeHandle(1), rect(10, 10, 480, 250)));
        assert_eq!(out[1], (NativeHandle(2), rect(410, 270, 80, 24)));
    }

    #[test]
    fn status_parts_split_remainder_by_weight() {
        // Arrange
        let parts = [
            PartWidth::Fixed(100),
            PartWidth::Proportional(1),
            PartWidth::Proportional(2),
        ];
        // Act
        let edges = split_parts(&parts, 400);
        // Assert
        assert_eq!(edges, vec![100, 200, 400]);
    }

    #[test]
    fn last_proportional_part_absorbs_rounding() {
        let parts = [PartWidth::Proportional(1); 3];
        assert_eq!(split_parts(&parts, 100), vec![33, 66, 100]);
    }

    #[test]
    fn fixed_parts_wider_than_bar_still_cover_it() {
        let parts = [PartWidth::Fixed(80), PartWidth::Proportional(1), PartWidth::Fixed(80)];
        let edges = split_parts(&parts, 120);
        assert_eq!(edges, vec![80, 80, 160]);
    }

    #[test]
    fn fixed_only_bar_extends_last_part_to_the_edge() {
        let parts = [PartWidth::Fixed(50), PartWidth::Fixed(50)];
        assert_eq!(split_parts(&parts, 300), vec![50, 300]);
        assert!(split_parts(&[], 300).is_empty());
    }

    #[test]
    fn recreated_parent_lays_out_only_its_live_children() {
        // Arrange
        let mut layout = Layout::new();
        layout.set_original_parent_size(Size::new(300, 200));
        layout.add(
            NativeHandle(0x1001),
            rect(10, 10, 100, 20),
            ResizePolicy::Stretch,
            ResizePolicy::Fixed,
        );
        layout.clear();
        layout.set_original_parent_size(Size::new(300, 200));
        layout.add(
            NativeHandle(0x2002),
            rect(10, 10, 100, 20),
            ResizePolicy::Stretch,
            ResizePolicy::Fixed,
        );
        // Act
        let out = layout.compute(ResizeKind::Restored, Size::new(400, 200));
        // Assert
        assert_eq!(out, vec![(NativeHandle(0x2002), rect(10, 10, 200, 20))]);
    }

    #[test]
    fn cleared_layout_forgets_parent_size() {
        let mut layout = single_child(
            ResizePolicy::Anchor,
            ResizePolicy::Anchor,
            rect(0, 0, 10, 10),
            Size::new(100, 100),
        );
        layout.clear();
        assert!(layout.is_empty());
        assert_eq!(layout.original_parent_size(), None);
    }
}
