//! Responsive layout engine.
//!
//! Pure geometry: box positions and connector routes are a function of the
//! container width, the component catalogue and [`LayoutConfig`] only.
//! Calling [`compute_layout`] twice with the same inputs yields identical
//! output.
//!
//! ## Modes
//!
//! ```text
//! Wide (annotation right of the box)     Narrow (annotation inside the box)
//! ┌──────────┐                           ┌──────────────────────────┐
//! │  Label   │  annotation               │          Label           │
//! └────┬─────┘                           │        annotation        │
//!      ▼                                 └────────────┬─────────────┘
//! ```
//!
//! Switching modes moves annotations and narrows the residual lanes; it
//! never changes which boxes exist or their order.

use serde::Serialize;

use super::component::{Component, ComponentKey, Connector, ConnectorKind};
use crate::config::LayoutConfig;

/// A point in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Grows the rectangle by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }

    /// Smallest rectangle containing all `points`.
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// Wide/narrow geometry variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutMode {
    Wide,
    Narrow,
}

/// Where annotations (sublabels) are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelSide {
    /// Outside, right of the box, left-aligned.
    Right,
    /// Inside the box under the label, centred.
    Inside,
}

/// Geometry of one visible component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGeometry {
    pub key: ComponentKey,
    pub rect: Rect,
    pub is_container: bool,
    pub label_anchor: Point,
    /// Present when the component has a sublabel.
    pub annotation_anchor: Option<Point>,
    /// Present when the component has a MOE/FFN toggle.
    pub toggle_rect: Option<Rect>,
}

/// Routed arrow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorRoute {
    pub from: ComponentKey,
    pub to: ComponentKey,
    pub kind: ConnectorKind,
    pub points: Vec<Point>,
}

/// Result of one layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub mode: LayoutMode,
    pub label_side: LabelSide,
    pub lane_offset: f32,
    pub boxes: Vec<BoxGeometry>,
    pub connectors: Vec<ConnectorRoute>,
}

impl Layout {
    pub fn get(&self, key: ComponentKey) -> Option<&BoxGeometry> {
        self.boxes.iter().find(|b| b.key == key)
    }

    /// Bounds of the whole drawing.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Box column for the wide attempt: `(x, width)`.
fn wide_column(width: f32, config: &LayoutConfig) -> (f32, f32) {
    let box_width = (width * config.box_width_ratio).clamp(config.min_box_width, config.max_box_width);
    (config.margin + config.container_padding, box_width)
}

/// Picks the layout mode for a container width.
pub fn select_mode(width: f32, config: &LayoutConfig) -> LayoutMode {
    let (box_x, box_width) = wide_column(width, config);
    let right_space = width - box_x - box_width - config.margin;
    if right_space >= config.label_fit_min {
        LayoutMode::Wide
    } else {
        LayoutMode::Narrow
    }
}

/// Computes box and connector geometry for the visible components.
///
/// Hidden components get no box, and connectors touching them are dropped.
pub fn compute_layout(
    width: f32,
    components: &[Component],
    connectors: &[Connector],
    config: &LayoutConfig,
) -> Layout {
    let mode = select_mode(width, config);
    let inset = config.margin + config.container_padding;
    let (box_x, box_width, label_side, lane_offset) = match mode {
        LayoutMode::Wide => {
            let (x, w) = wide_column(width, config);
            (x, w, LabelSide::Right, config.wide_lane_offset)
        }
        LayoutMode::Narrow => {
            let w = (width - 2.0 * inset).max(config.narrow_min_box_width);
            (inset, w, LabelSide::Inside, config.narrow_lane_offset)
        }
    };

    let boxes: Vec<BoxGeometry> = components
        .iter()
        .filter(|c| !c.hidden)
        .map(|c| place_box(c, box_x, box_width, label_side, config))
        .collect();

    let routes = connectors
        .iter()
        .filter_map(|conn| {
            let from = boxes.iter().find(|b| b.key == conn.from)?;
            let to = boxes.iter().find(|b| b.key == conn.to)?;
            Some(ConnectorRoute {
                from: conn.from,
                to: conn.to,
                kind: conn.kind,
                points: route(conn.kind, &from.rect, &to.rect, lane_offset),
            })
        })
        .collect();

    let content_bottom = boxes.iter().map(|b| b.rect.bottom()).fold(0.0, f32::max);

    Layout {
        width,
        height: content_bottom + config.margin,
        mode,
        label_side,
        lane_offset,
        boxes,
        connectors: routes,
    }
}

fn place_box(
    component: &Component,
    box_x: f32,
    box_width: f32,
    label_side: LabelSide,
    config: &LayoutConfig,
) -> BoxGeometry {
    let rect = if component.is_container {
        Rect::new(
            box_x - config.container_padding,
            component.y,
            box_width + 2.0 * config.container_padding,
            component.height,
        )
    } else {
        Rect::new(box_x, component.y, box_width, component.height)
    };

    let center = rect.center();
    let label_anchor = if component.is_container {
        Point::new(rect.x + 10.0, rect.y + 18.0)
    } else if component.sublabel.is_some() && label_side == LabelSide::Inside {
        Point::new(center.x, center.y - 6.0)
    } else {
        Point::new(center.x, center.y + 4.0)
    };

    let annotation_anchor = component.sublabel.map(|_| match label_side {
        LabelSide::Right => Point::new(rect.right() + config.label_gap, center.y + 4.0),
        LabelSide::Inside => Point::new(center.x, center.y + 12.0),
    });

    let toggle_rect = component.has_toggle.then(|| {
        Rect::new(
            rect.right() - config.toggle_size - 6.0,
            rect.y + 6.0,
            config.toggle_size,
            config.toggle_size,
        )
    });

    BoxGeometry {
        key: component.key,
        rect,
        is_container: component.is_container,
        label_anchor,
        annotation_anchor,
        toggle_rect,
    }
}

fn route(kind: ConnectorKind, from: &Rect, to: &Rect, lane_offset: f32) -> Vec<Point> {
    match kind {
        ConnectorKind::Flow => {
            let start = Point::new(from.center().x, from.bottom());
            let end = Point::new(to.center().x, to.y);
            if (start.x - end.x).abs() < f32::EPSILON {
                vec![start, end]
            } else {
                let mid_y = (start.y + end.y) / 2.0;
                vec![start, Point::new(start.x, mid_y), Point::new(end.x, mid_y), end]
            }
        }
        ConnectorKind::Residual => {
            let lane_x = from.right().max(to.right()) + lane_offset;
            let from_y = from.center().y;
            let to_y = to.center().y;
            vec![
                Point::new(from.right(), from_y),
                Point::new(lane_x, from_y),
                Point::new(lane_x, to_y),
                Point::new(to.right(), to_y),
            ]
        }
    }
}
