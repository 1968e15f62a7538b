//! Selection and transform of existing shape groups.
//!
//! The selector works on any group whose record allows it, whatever the
//! annotation type. Dragging translates the group transform; handle drags
//! rescale it so the group's bounds land on the dragged box.

use crate::canvas::PageCanvas;
use crate::input::InputEvent;
use kurbo::Point;
use pa_core::geometry::ClientRect;
use pa_core::shape::Transform;
use pa_core::{AnnotationId, AnnotationRecord};

/// Smallest side a resize may shrink a group to.
const MIN_SIDE: f64 = 1.0;

/// Extra slop around a group when clicking to select it.
const HIT_TOLERANCE: f64 = 2.0;

/// What the selector may do with a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub draggable: bool,
    pub resizable: bool,
}

impl Permissions {
    pub fn of(record: &AnnotationRecord) -> Self {
        Self {
            draggable: record.draggable,
            resizable: record.resizable,
        }
    }

    pub fn any(self) -> bool {
        self.draggable || self.resizable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleType {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
}

/// Resize handles around `rect`: four corners, then four edge midpoints.
pub fn generate_handles(rect: &ClientRect) -> [(HandleType, Point); 8] {
    let c = rect.center();
    [
        (HandleType::TopLeft, Point::new(rect.x, rect.y)),
        (HandleType::TopRight, Point::new(rect.right(), rect.y)),
        (HandleType::BottomLeft, Point::new(rect.x, rect.bottom())),
        (HandleType::BottomRight, Point::new(rect.right(), rect.bottom())),
        (HandleType::Top, Point::new(c.x, rect.y)),
        (HandleType::Bottom, Point::new(c.x, rect.bottom())),
        (HandleType::Left, Point::new(rect.x, c.y)),
        (HandleType::Right, Point::new(rect.right(), c.y)),
    ]
}

impl HandleType {
    /// The box `start` becomes when this handle is dragged to `p`.
    pub fn resize(self, start: &ClientRect, p: Point) -> ClientRect {
        let (mut x0, mut y0, mut x1, mut y1) = (start.x, start.y, start.right(), start.bottom());
        match self {
            HandleType::TopLeft => (x0, y0) = (p.x, p.y),
            HandleType::TopRight => (x1, y0) = (p.x, p.y),
            HandleType::BottomLeft => (x0, y1) = (p.x, p.y),
            HandleType::BottomRight => (x1, y1) = (p.x, p.y),
            HandleType::Top => y0 = p.y,
            HandleType::Bottom => y1 = p.y,
            HandleType::Left => x0 = p.x,
            HandleType::Right => x1 = p.x,
        }
        let mut r = ClientRect::from_corners(Point::new(x0, y0), Point::new(x1, y1));
        r.width = r.width.max(MIN_SIDE);
        r.height = r.height.max(MIN_SIDE);
        r
    }
}

/// Notifications for the painter, which turns them into store updates and
/// host callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorEvent {
    /// `rect` is the selection box in page pixels.
    Selected {
        id: AnnotationId,
        is_click: bool,
        rect: ClientRect,
    },
    /// A drag or resize started moving the group.
    Changing(AnnotationId),
    /// A drag or resize finished.
    Changed {
        id: AnnotationId,
        serialized_shape: String,
        rect: ClientRect,
        transformer_rect: ClientRect,
    },
    Delete(AnnotationId),
    /// The selection was dropped.
    Cancel(AnnotationId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragMode {
    Move,
    Resize(HandleType),
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    mode: DragMode,
    origin: Point,
    start_rect: ClientRect,
    start_transform: Transform,
    moved: bool,
}

#[derive(Debug, Clone, Copy)]
struct Selection {
    id: AnnotationId,
    page_number: u32,
    permissions: Permissions,
}

#[derive(Debug)]
pub struct Selector {
    page: Option<u32>,
    selection: Option<Selection>,
    drag: Option<Drag>,
    handle_size: f64,
}

impl Selector {
    pub fn new(handle_size: f64) -> Self {
        Self {
            page: None,
            selection: None,
            drag: None,
            handle_size,
        }
    }

    /// Enable click-to-select on `page_number`. A selection on another page
    /// is cancelled.
    pub fn activate(&mut self, page_number: u32) -> Vec<SelectorEvent> {
        self.page = Some(page_number);
        match self.selection {
            Some(s) if s.page_number != page_number => self.cancel(),
            _ => Vec::new(),
        }
    }

    /// Stop selecting, as when another tool becomes active.
    pub fn deactivate(&mut self) -> Vec<SelectorEvent> {
        self.page = None;
        self.cancel()
    }

    pub fn active_page(&self) -> Option<u32> {
        self.page
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selection.map(|s| s.id)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|d| d.moved)
    }

    /// Handles for the current selection, in canvas space.
    pub fn handles(&self, canvas: &PageCanvas) -> Vec<(HandleType, Point)> {
        let Some(sel) = self.selection.filter(|s| s.permissions.resizable) else {
            return Vec::new();
        };
        canvas
            .layer
            .get(sel.id)
            .and_then(|g| g.client_rect())
            .map(|r| generate_handles(&r).to_vec())
            .unwrap_or_default()
    }

    /// Select `id` without a click, dropping any previous selection first.
    pub fn select(&mut self, canvas: &PageCanvas, id: AnnotationId, permissions: Permissions) -> Vec<SelectorEvent> {
        self.select_inner(canvas, id, permissions, false)
    }

    fn select_inner(
        &mut self,
        canvas: &PageCanvas,
        id: AnnotationId,
        permissions: Permissions,
        is_click: bool,
    ) -> Vec<SelectorEvent> {
        let Some(rect) = canvas.layer.get(id).and_then(|g| g.client_rect()) else {
            log::warn!("cannot select {id}: no group on page {}", canvas.page_number);
            return Vec::new();
        };
        let mut events = if self.selected() == Some(id) {
            Vec::new()
        } else {
            self.cancel()
        };
        self.page = Some(canvas.page_number);
        self.selection = Some(Selection {
            id,
            page_number: canvas.page_number,
            permissions,
        });
        events.push(SelectorEvent::Selected {
            id,
            is_click,
            rect: canvas.to_screen(&rect),
        });
        events
    }

    /// Drop the current selection.
    pub fn cancel(&mut self) -> Vec<SelectorEvent> {
        self.drag = None;
        match self.selection.take() {
            Some(s) => vec![SelectorEvent::Cancel(s.id)],
            None => Vec::new(),
        }
    }

    /// Forget `id` silently, as when its record is removed elsewhere.
    pub fn forget(&mut self, id: AnnotationId) {
        if self.selected() == Some(id) {
            self.selection = None;
            self.drag = None;
        }
    }

    /// Delete request for the current selection.
    pub fn delete_selected(&mut self) -> Option<SelectorEvent> {
        let sel = self.selection.take()?;
        self.drag = None;
        Some(SelectorEvent::Delete(sel.id))
    }

    pub fn handle<F>(&mut self, canvas: &mut PageCanvas, event: &InputEvent, permissions: F) -> Vec<SelectorEvent>
    where
        F: Fn(AnnotationId) -> Option<Permissions>,
    {
        let p = event.position();
        match event {
            InputEvent::PointerDown { .. } => self.pointer_down(canvas, p, permissions),
            InputEvent::PointerMove { .. } => self.pointer_move(canvas, p),
            InputEvent::PointerUp { .. } => self.pointer_up(canvas),
        }
    }

    pub fn pointer_down<F>(&mut self, canvas: &PageCanvas, p: Point, permissions: F) -> Vec<SelectorEvent>
    where
        F: Fn(AnnotationId) -> Option<Permissions>,
    {
        if self.page != Some(canvas.page_number) {
            return Vec::new();
        }

        // Handles and body of the current selection take precedence.
        if let Some(sel) = self.selection.filter(|s| s.page_number == canvas.page_number)
            && let Some(group) = canvas.layer.get(sel.id)
            && let Some(rect) = group.client_rect()
        {
            let handle = sel
                .permissions
                .resizable
                .then(|| {
                    generate_handles(&rect)
                        .into_iter()
                        .find(|(_, h)| h.distance(p) <= self.handle_size)
                })
                .flatten();
            let mode = match handle {
                Some((h, _)) => Some(DragMode::Resize(h)),
                None if sel.permissions.draggable && rect.inflate(HIT_TOLERANCE).contains(p) => Some(DragMode::Move),
                None => None,
            };
            if let Some(mode) = mode {
                self.drag = Some(Drag {
                    mode,
                    origin: p,
                    start_rect: rect,
                    start_transform: group.transform,
                    moved: false,
                });
                return Vec::new();
            }
        }

        let hit = canvas
            .layer
            .hit_test(p, HIT_TOLERANCE)
            .and_then(|id| permissions(id).filter(|perm| perm.any()).map(|perm| (id, perm)));
        let Some((id, perm)) = hit else {
            return self.cancel();
        };
        let events = self.select_inner(canvas, id, perm, true);
        if perm.draggable
            && let Some(group) = canvas.layer.get(id)
            && let Some(rect) = group.client_rect()
        {
            self.drag = Some(Drag {
                mode: DragMode::Move,
                origin: p,
                start_rect: rect,
                start_transform: group.transform,
                moved: false,
            });
        }
        events
    }

    pub fn pointer_move(&mut self, canvas: &mut PageCanvas, p: Point) -> Vec<SelectorEvent> {
        let (Some(sel), Some(drag)) = (self.selection, self.drag.as_mut()) else {
            return Vec::new();
        };
        let Some(group) = canvas.layer.get_mut(sel.id) else {
            return Vec::new();
        };
        let delta = p - drag.origin;
        group.transform = match drag.mode {
            DragMode::Move => Transform {
                x: drag.start_transform.x + delta.x,
                y: drag.start_transform.y + delta.y,
                ..drag.start_transform
            },
            DragMode::Resize(handle) => {
                let target = handle.resize(&drag.start_rect, p);
                match group.local_rect() {
                    Some(local) => fit_transform(&local, &drag.start_rect, &target, &drag.start_transform),
                    None => drag.start_transform,
                }
            }
        };
        if drag.moved {
            Vec::new()
        } else {
            drag.moved = true;
            vec![SelectorEvent::Changing(sel.id)]
        }
    }

    pub fn pointer_up(&mut self, canvas: &PageCanvas) -> Vec<SelectorEvent> {
        let Some(drag) = self.drag.take() else {
            return Vec::new();
        };
        let Some(sel) = self.selection else {
            return Vec::new();
        };
        if !drag.moved {
            return Vec::new();
        }
        let Some(group) = canvas.layer.get(sel.id) else {
            return Vec::new();
        };
        let Some(rect) = group.client_rect() else {
            return Vec::new();
        };
        match group.to_json() {
            Ok(serialized_shape) => vec![SelectorEvent::Changed {
                id: sel.id,
                serialized_shape,
                rect,
                transformer_rect: canvas.to_screen(&rect),
            }],
            Err(e) => {
                log::error!("cannot serialize transformed group {}: {e}", sel.id);
                Vec::new()
            }
        }
    }
}

/// Transform that maps `local` onto `target`. An axis with no extent keeps
/// its starting scale and follows the box's offset from `start`.
fn fit_transform(local: &ClientRect, start: &ClientRect, target: &ClientRect, t0: &Transform) -> Transform {
    let (scale_x, x) = if local.width > f64::EPSILON {
        let s = target.width / local.width;
        (s, target.x - s * local.x)
    } else {
        (t0.scale_x, t0.x + target.x - start.x)
    };
    let (scale_y, y) = if local.height > f64::EPSILON {
        let s = target.height / local.height;
        (s, target.y - s * local.y)
    } else {
        (t0.scale_y, t0.y + target.y - start.y)
    };
    Transform {
        x,
        y,
        scale_x,
        scale_y,
    }
}
