//! Vector drawing surface boundary.
//!
//! Renderers and demo controllers draw through the [`Surface`] trait, which
//! only needs shape primitives, per-node attributes and timed attribute
//! transitions. [`Scene`] is the in-memory implementation: it keeps a
//! retained node list that hosts can inspect, hit-test or serialise to SVG.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use super::layout::{Point, Rect};

/// Handle of a node on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Start,
    Middle,
    End,
}

impl TextAlign {
    fn svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Geometry of a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Rect { rect: Rect, corner_radius: f32 },
    Path { points: Vec<Point>, arrow: bool },
    Circle { center: Point, radius: f32 },
    Text { anchor: Point, content: String, align: TextAlign },
}

/// A shape plus its presentation attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Element id used by selectors (tour targets, tests).
    pub element_id: Option<String>,
    pub kind: ShapeKind,
    pub attrs: BTreeMap<String, String>,
}

impl Shape {
    fn new(kind: ShapeKind) -> Self {
        Self {
            element_id: None,
            kind,
            attrs: BTreeMap::new(),
        }
    }

    pub fn rect(rect: Rect, corner_radius: f32) -> Self {
        Self::new(ShapeKind::Rect {
            rect,
            corner_radius,
        })
    }

    pub fn path(points: Vec<Point>, arrow: bool) -> Self {
        Self::new(ShapeKind::Path { points, arrow })
    }

    pub fn circle(center: Point, radius: f32) -> Self {
        Self::new(ShapeKind::Circle { center, radius })
    }

    pub fn text(anchor: Point, content: impl Into<String>, align: TextAlign) -> Self {
        Self::new(ShapeKind::Text {
            anchor,
            content: content.into(),
            align,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// Bounding box of the shape (text is a zero-size box at its anchor).
    pub fn bounds(&self) -> Option<Rect> {
        match &self.kind {
            ShapeKind::Rect { rect, .. } => Some(*rect),
            ShapeKind::Path { points, .. } => Rect::bounding(points),
            ShapeKind::Circle { center, radius } => Some(Rect::new(
                center.x - radius,
                center.y - radius,
                2.0 * radius,
                2.0 * radius,
            )),
            ShapeKind::Text { anchor, .. } => Some(Rect::new(anchor.x, anchor.y, 0.0, 0.0)),
        }
    }
}

/// Pointer events delivered by the host to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Click(NodeId),
    PointerEnter(NodeId),
    PointerLeave(NodeId),
}

/// A recorded timed attribute change.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub node: NodeId,
    pub attr: String,
    pub value: String,
    pub duration: Duration,
}

/// Scalable 2D vector drawing surface.
pub trait Surface {
    /// Removes every node.
    fn clear(&mut self);

    /// Adds a shape on top of the existing ones.
    fn add(&mut self, shape: Shape) -> NodeId;

    /// Removes a node; unknown ids are ignored.
    fn remove(&mut self, node: NodeId);

    /// Sets an attribute immediately.
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str);

    /// Animates an attribute towards `value` over `duration`.
    fn transition(&mut self, node: NodeId, name: &str, value: &str, duration: Duration);

    /// Resizes the drawing area.
    fn set_size(&mut self, width: f32, height: f32);

    /// Number of live nodes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds of the node with the given element id.
    fn bounds(&self, element_id: &str) -> Option<Rect>;
}

/// Retained in-memory surface that serialises to SVG.
///
/// Transitions are applied at once and kept in a log; animating them is
/// the host's business.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Shape>,
    next_id: usize,
    width: f32,
    height: f32,
    transitions: Vec<Transition>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&Shape> {
        self.nodes.get(&node)
    }

    /// Value of an attribute on a node.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(&node)?.attrs.get(name).map(String::as_str)
    }

    /// Node carrying the given element id.
    pub fn find(&self, element_id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, s)| s.element_id.as_deref() == Some(element_id))
            .map(|(id, _)| *id)
    }

    /// Nodes in drawing order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Shape)> {
        self.nodes.iter().map(|(id, s)| (*id, s))
    }

    /// Nodes whose `class` attribute contains `class`.
    pub fn count_class(&self, class: &str) -> usize {
        self.nodes
            .values()
            .filter(|s| {
                s.attrs
                    .get("class")
                    .is_some_and(|c| c.split_whitespace().any(|part| part == class))
            })
            .count()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Serialises the scene to a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        out.push_str(
            "  <defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"9\" refY=\"5\" \
             markerWidth=\"6\" markerHeight=\"6\" orient=\"auto\">\
             <path d=\"M0,0 L10,5 L0,10 z\"/></marker></defs>\n",
        );
        for shape in self.nodes.values() {
            out.push_str("  ");
            write_shape(&mut out, shape);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_attrs(out: &mut String, shape: &Shape) {
    if let Some(id) = &shape.element_id {
        let _ = write!(out, r#" id="{}""#, escape(id));
    }
    for (name, value) in &shape.attrs {
        let _ = write!(out, r#" {}="{}""#, name, escape(value));
    }
}

fn write_shape(out: &mut String, shape: &Shape) {
    match &shape.kind {
        ShapeKind::Rect {
            rect,
            corner_radius,
        } => {
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}""#,
                rect.x, rect.y, rect.width, rect.height, corner_radius
            );
            write_attrs(out, shape);
            out.push_str("/>");
        }
        ShapeKind::Path { points, arrow } => {
            let d: Vec<String> = points
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{}{},{}", if i == 0 { "M" } else { "L" }, p.x, p.y))
                .collect();
            let _ = write!(out, r#"<path d="{}" fill="none""#, d.join(" "));
            if *arrow {
                out.push_str(r#" marker-end="url(#arrow)""#);
            }
            write_attrs(out, shape);
            out.push_str("/>");
        }
        ShapeKind::Circle { center, radius } => {
            let _ = write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}""#,
                center.x, center.y, radius
            );
            write_attrs(out, shape);
            out.push_str("/>");
        }
        ShapeKind::Text {
            anchor,
            content,
            align,
        } => {
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" text-anchor="{}""#,
                anchor.x,
                anchor.y,
                align.svg()
            );
            write_attrs(out, shape);
            let _ = write!(out, ">{}</text>", escape(content));
        }
    }
}

impl Surface for Scene {
    fn clear(&mut self) {
        self.nodes.clear();
        self.transitions.clear();
    }

    fn add(&mut self, shape: Shape) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, shape);
        id
    }

    fn remove(&mut self, node: NodeId) {
        self.nodes.remove(&node);
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(shape) = self.nodes.get_mut(&node) {
            shape.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn transition(&mut self, node: NodeId, name: &str, value: &str, duration: Duration) {
        if !self.nodes.contains_key(&node) {
            return;
        }
        self.set_attr(node, name, value);
        self.transitions.push(Transition {
            node,
            attr: name.to_string(),
            value: value.to_string(),
            duration,
        });
    }

    fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn bounds(&self, element_id: &str) -> Option<Rect> {
        self.nodes
            .values()
            .find(|s| s.element_id.as_deref() == Some(element_id))
            .and_then(Shape::bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_find_and_bounds() {
        let mut scene = Scene::new();
        let id = scene.add(Shape::rect(Rect::new(10.0, 20.0, 30.0, 40.0), 4.0).with_id("box"));
        assert_eq!(scene.find("box"), Some(id));
        assert_eq!(scene.bounds("box"), Some(Rect::new(10.0, 20.0, 30.0, 40.0)));
        assert_eq!(scene.bounds("missing"), None);
    }

    #[test]
    fn test_transition_applies_and_logs() {
        let mut scene = Scene::new();
        let id = scene.add(Shape::circle(Point::new(0.0, 0.0), 5.0));
        scene.transition(id, "opacity", "0.5", Duration::from_millis(200));
        assert_eq!(scene.attr(id, "opacity"), Some("0.5"));
        assert_eq!(scene.transitions().len(), 1);
        scene.remove(id);
        scene.transition(id, "opacity", "1", Duration::from_millis(200));
        assert_eq!(scene.transitions().len(), 1);
    }

    #[test]
    fn test_svg_escapes_text() {
        let mut scene = Scene::new();
        scene.set_size(100.0, 50.0);
        scene.add(Shape::text(Point::new(1.0, 2.0), "a < b & \"c\"", TextAlign::Middle));
        let svg = scene.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(svg.contains(r#"text-anchor="middle""#));
    }

    #[test]
    fn test_clear_empties_scene() {
        let mut scene = Scene::new();
        scene.add(Shape::path(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)], true));
        assert!(!scene.is_empty());
        scene.clear();
        assert!(scene.is_empty());
    }
}
