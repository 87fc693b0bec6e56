//! Drag-resizable pane widths, measured in terminal columns.

/// Width bounds for one pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneLimits {
    pub default_width: u16,
    pub collapsed_width: u16,
    /// Releasing a drag at or below this width collapses the pane.
    pub threshold: u16,
}

pub const SOURCES_PANE: PaneLimits = PaneLimits {
    default_width: 32,
    collapsed_width: 6,
    threshold: 18,
};

pub const AUX_PANEL: PaneLimits = PaneLimits {
    default_width: 40,
    collapsed_width: 6,
    threshold: 18,
};

/// Which border of the pane the user grabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    /// Pane sits on the left; moving right widens it.
    Right,
    /// Pane sits on the right; moving left widens it.
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    NotDragging,
    Resized,
    Collapsed,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    anchor_column: u16,
    start_width: u16,
    latest_width: u16,
}

#[derive(Debug, Clone)]
pub struct ResizablePane {
    limits: PaneLimits,
    edge: ResizeEdge,
    width: u16,
    drag: Option<Drag>,
}

impl ResizablePane {
    pub fn new(limits: PaneLimits, edge: ResizeEdge) -> Self {
        Self {
            limits,
            edge,
            width: limits.default_width,
            drag: None,
        }
    }

    pub fn limits(&self) -> PaneLimits {
        self.limits
    }

    /// Current width clamped to what fits in `total` columns.
    pub fn width(&self, total: u16) -> u16 {
        self.clamp(self.width, total)
    }

    pub fn is_collapsed(&self) -> bool {
        self.width <= self.limits.collapsed_width
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn max_width(&self, total: u16) -> u16 {
        (total / 3).max(self.limits.collapsed_width)
    }

    fn clamp(&self, width: u16, total: u16) -> u16 {
        width.clamp(self.limits.collapsed_width, self.max_width(total))
    }

    pub fn begin_drag(&mut self, column: u16) {
        self.drag = Some(Drag {
            anchor_column: column,
            start_width: self.width,
            latest_width: self.width,
        });
    }

    /// Follow the pointer to `column`. Returns the new width, or `None` when
    /// no drag is in progress.
    pub fn drag_to(&mut self, column: u16, total: u16) -> Option<u16> {
        let drag = self.drag?;
        let offset = i32::from(column) - i32::from(drag.anchor_column);
        let offset = match self.edge {
            ResizeEdge::Right => offset,
            ResizeEdge::Left => -offset,
        };
        let raw = (i32::from(drag.start_width) + offset).clamp(0, i32::from(u16::MAX));
        let width = self.clamp(raw as u16, total);

        self.width = width;
        self.drag = Some(Drag {
            latest_width: width,
            ..drag
        });
        Some(width)
    }

    /// Release the pointer. A drag that began at or above the threshold and
    /// ended at or below it snaps the pane to its collapsed width.
    pub fn end_drag(&mut self) -> DragOutcome {
        let Some(drag) = self.drag.take() else {
            return DragOutcome::NotDragging;
        };
        if drag.start_width >= self.limits.threshold && drag.latest_width <= self.limits.threshold {
            self.collapse();
            DragOutcome::Collapsed
        } else {
            DragOutcome::Resized
        }
    }

    /// Keyboard resize by `delta` columns.
    pub fn nudge(&mut self, delta: i16, total: u16) -> u16 {
        let raw = (i32::from(self.width) + i32::from(delta)).clamp(0, i32::from(u16::MAX));
        self.width = self.clamp(raw as u16, total);
        self.width
    }

    pub fn collapse(&mut self) {
        self.drag = None;
        self.width = self.limits.collapsed_width;
    }

    pub fn reset(&mut self) {
        self.drag = None;
        self.width = self.limits.default_width;
    }

    /// Collapsed panes expand back to their default width.
    pub fn toggle_collapsed(&mut self) {
        if self.is_collapsed() {
            self.reset();
        } else {
            self.collapse();
        }
    }
}
