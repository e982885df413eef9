//! Diagram renderer.
//!
//! One [`DiagramRenderer`] draws one [`Section`] onto a [`Surface`] and owns
//! all of its runtime state: the last layout, the highlighted component,
//! hover state, the MOE/FFN mode flag and its resize listener.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──init──► Initialized ──destroy──► Destroyed
//!                            │   ▲                    │
//!                            └───┘ resize/toggle      └──init──► Initialized
//! ```
//!
//! `destroy` is idempotent and is a no-op before `init`.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info};

use super::component::{Component, ComponentKey, ConnectorKind, Section};
use super::layout::{LabelSide, Layout, Point, Rect, compute_layout};
use super::surface::{NodeId, Shape, Surface, SurfaceEvent, TextAlign};
use super::viewport::{ListenerId, Viewport};
use crate::config::LayoutConfig;

const BOX_STROKE: &str = "#94a3b8";
const BOX_STROKE_WIDTH: &str = "1";
const HIGHLIGHT_STROKE: &str = "#f59e0b";
const HIGHLIGHT_STROKE_WIDTH: &str = "3";
const ARROW_STROKE: &str = "#64748b";
const HIGHLIGHT_DURATION: Duration = Duration::from_millis(300);
const DEMO_BADGE_RADIUS: f32 = 7.0;

/// Info-panel callback; receives the clicked component's info key.
pub type ClickCallback = Box<dyn FnMut(&str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Initialized,
    Destroyed,
}

/// What a click resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A box was clicked; the callback received this key.
    Info(&'static str),
    /// The MOE/FFN toggle was clicked and the mode flipped.
    ToggleMoe,
    /// The "try it" badge of a component with a demo was clicked.
    Demo(ComponentKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitTarget {
    Component(ComponentKey),
    Toggle,
    Demo(ComponentKey),
}

pub struct DiagramRenderer<S: Surface> {
    section: Section,
    surface: S,
    config: LayoutConfig,
    components: Vec<Component>,
    state: RendererState,
    width: f32,
    layout: Option<Layout>,
    highlighted: Option<ComponentKey>,
    hovered: Option<ComponentKey>,
    moe_mode: bool,
    listener: Option<ListenerId>,
    on_click: Option<ClickCallback>,
    box_nodes: BTreeMap<ComponentKey, NodeId>,
    node_targets: BTreeMap<NodeId, HitTarget>,
    /// Click regions in priority order: affordances, boxes, containers.
    hit_regions: Vec<(Rect, HitTarget)>,
}

impl<S: Surface> DiagramRenderer<S> {
    pub fn new(section: Section, surface: S, config: LayoutConfig) -> Self {
        Self {
            section,
            surface,
            config,
            components: section.components(),
            state: RendererState::Uninitialized,
            width: 0.0,
            layout: None,
            highlighted: None,
            hovered: None,
            moe_mode: false,
            listener: None,
            on_click: None,
            box_nodes: BTreeMap::new(),
            node_targets: BTreeMap::new(),
            hit_regions: Vec::new(),
        }
    }

    /// Clears any prior render, lays out and draws the diagram, and
    /// subscribes a resize listener.
    pub fn init(
        &mut self,
        width: f32,
        viewport: &mut Viewport,
        on_click: impl FnMut(&str) + 'static,
    ) {
        if let Some(previous) = self.listener.take() {
            viewport.unsubscribe(previous);
        }
        self.components = self.section.components();
        self.moe_mode = false;
        self.highlighted = None;
        self.hovered = None;
        self.width = width;
        self.on_click = Some(Box::new(on_click));
        self.redraw();
        self.listener = Some(viewport.subscribe());
        self.state = RendererState::Initialized;
        info!(
            section = %self.section,
            width,
            components = self.component_count(),
            arrows = self.arrow_count(),
            "diagram initialised"
        );
    }

    /// Recomputes the layout for a new width, redraws and reapplies the
    /// highlight.
    pub fn handle_resize(&mut self, width: f32) {
        if self.state != RendererState::Initialized {
            return;
        }
        self.width = width;
        self.redraw();
        debug!(section = %self.section, width, mode = ?self.layout.as_ref().map(|l| l.mode), "diagram resized");
    }

    /// Unsubscribes the resize listener and drops all rendered state.
    pub fn destroy(&mut self, viewport: &mut Viewport) {
        if let Some(id) = self.listener.take() {
            viewport.unsubscribe(id);
        }
        self.surface.clear();
        self.layout = None;
        self.highlighted = None;
        self.hovered = None;
        self.moe_mode = false;
        self.on_click = None;
        self.box_nodes.clear();
        self.node_targets.clear();
        self.hit_regions.clear();
        self.components = self.section.components();
        if self.state == RendererState::Initialized {
            self.state = RendererState::Destroyed;
            info!(section = %self.section, "diagram destroyed");
        }
    }

    /// Emphasises one visible component, clearing any previous highlight.
    ///
    /// Keys that are not drawn right now (other section, hidden by the
    /// MOE/FFN mode) are ignored.
    pub fn highlight_component(&mut self, key: ComponentKey) {
        self.clear_highlight();
        if self.state != RendererState::Initialized {
            return;
        }
        if let Some(&node) = self.box_nodes.get(&key) {
            self.emphasise(node);
            self.highlighted = Some(key);
            debug!(component = %key, "highlighted");
        }
    }

    /// Highlights by textual key; unknown keys are a no-op.
    pub fn highlight_key(&mut self, key: &str) {
        match ComponentKey::parse(key) {
            Some(key) => self.highlight_component(key),
            None => self.clear_highlight(),
        }
    }

    pub fn clear_highlight(&mut self) {
        let Some(key) = self.highlighted.take() else {
            return;
        };
        if let Some(&node) = self.box_nodes.get(&key) {
            self.surface.transition(node, "stroke", BOX_STROKE, HIGHLIGHT_DURATION);
            self.surface
                .transition(node, "stroke-width", BOX_STROKE_WIDTH, HIGHLIGHT_DURATION);
        }
    }

    /// Flips between the dense feed-forward and the MOE view.
    ///
    /// Only the architecture diagram has the toggle; elsewhere this returns
    /// `false` and changes nothing.
    pub fn toggle_moe(&mut self) -> bool {
        if self.section != Section::Architecture || self.state != RendererState::Initialized {
            return false;
        }
        self.moe_mode = !self.moe_mode;
        let moe_mode = self.moe_mode;
        for component in &mut self.components {
            match component.key {
                ComponentKey::FeedForward => component.hidden = moe_mode,
                ComponentKey::Moe => component.hidden = !moe_mode,
                _ => {}
            }
        }
        self.redraw();
        info!(moe_mode, "feed-forward view toggled");
        true
    }

    /// Switches to the MOE view if it is not already shown.
    pub fn reveal_moe(&mut self) {
        if !self.moe_mode {
            self.toggle_moe();
        }
    }

    /// Routes a pointer event from the host.
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Option<Dispatch> {
        if self.state != RendererState::Initialized {
            return None;
        }
        match event {
            SurfaceEvent::Click(node) => {
                let target = *self.node_targets.get(&node)?;
                self.dispatch(target)
            }
            SurfaceEvent::PointerEnter(node) => {
                if let Some(HitTarget::Component(key)) = self.node_targets.get(&node).copied() {
                    self.set_hover(Some(key));
                }
                None
            }
            SurfaceEvent::PointerLeave(node) => {
                if let Some(HitTarget::Component(key)) = self.node_targets.get(&node).copied()
                    && self.hovered == Some(key)
                {
                    self.set_hover(None);
                }
                None
            }
        }
    }

    /// Hit-tests a point in diagram coordinates and dispatches the click.
    ///
    /// Toggles and demo badges win over boxes, boxes over containers.
    pub fn click_at(&mut self, point: Point) -> Option<Dispatch> {
        if self.state != RendererState::Initialized {
            return None;
        }
        let target = self
            .hit_regions
            .iter()
            .find(|(rect, _)| rect.contains(point))
            .map(|(_, target)| *target)?;
        self.dispatch(target)
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn highlighted(&self) -> Option<ComponentKey> {
        self.highlighted
    }

    pub fn hovered(&self) -> Option<ComponentKey> {
        self.hovered
    }

    pub fn is_moe_mode(&self) -> bool {
        self.moe_mode
    }

    pub fn listener(&self) -> Option<ListenerId> {
        self.listener
    }

    /// Node of a drawn component box.
    pub fn node_of(&self, key: ComponentKey) -> Option<NodeId> {
        self.box_nodes.get(&key).copied()
    }

    /// Number of drawn component boxes (containers included).
    pub fn component_count(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.boxes.len())
    }

    pub fn arrow_count(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.connectors.len())
    }

    fn dispatch(&mut self, target: HitTarget) -> Option<Dispatch> {
        match target {
            HitTarget::Toggle => self.toggle_moe().then_some(Dispatch::ToggleMoe),
            HitTarget::Demo(key) => Some(Dispatch::Demo(key)),
            HitTarget::Component(key) => {
                let info_key = self
                    .components
                    .iter()
                    .find(|c| c.key == key)
                    .map(Component::click_key)?;
                if let Some(callback) = self.on_click.as_mut() {
                    callback(info_key);
                }
                debug!(component = %key, info_key, "component clicked");
                Some(Dispatch::Info(info_key))
            }
        }
    }

    fn set_hover(&mut self, key: Option<ComponentKey>) {
        if let Some(previous) = self.hovered.take()
            && let Some(&node) = self.box_nodes.get(&previous)
        {
            self.surface.set_attr(node, "opacity", "1");
        }
        if let Some(key) = key
            && let Some(&node) = self.box_nodes.get(&key)
        {
            self.surface.set_attr(node, "opacity", "0.85");
            self.hovered = Some(key);
        }
    }

    fn emphasise(&mut self, node: NodeId) {
        self.surface
            .transition(node, "stroke", HIGHLIGHT_STROKE, HIGHLIGHT_DURATION);
        self.surface
            .transition(node, "stroke-width", HIGHLIGHT_STROKE_WIDTH, HIGHLIGHT_DURATION);
    }

    fn redraw(&mut self) {
        let layout = compute_layout(
            self.width,
            &self.components,
            &self.section.connectors(),
            &self.config,
        );

        self.surface.clear();
        self.box_nodes.clear();
        self.node_targets.clear();
        self.hit_regions.clear();
        self.surface.set_size(layout.width, layout.height);

        let mut affordances = Vec::new();
        let mut boxes = Vec::new();
        let mut containers = Vec::new();

        for geometry in &layout.boxes {
            let Some(component) = self.components.iter().find(|c| c.key == geometry.key) else {
                continue;
            };
            let target = HitTarget::Component(component.key);
            let class = if component.is_container {
                "container"
            } else {
                "component"
            };

            let node = self.surface.add(
                Shape::rect(geometry.rect, 8.0)
                    .with_id(component.key.element_id())
                    .attr("class", class)
                    .attr("fill", component.color)
                    .attr("stroke", BOX_STROKE)
                    .attr("stroke-width", BOX_STROKE_WIDTH),
            );
            self.box_nodes.insert(component.key, node);
            self.node_targets.insert(node, target);

            let align = if component.is_container {
                TextAlign::Start
            } else {
                TextAlign::Middle
            };
            let label = self.surface.add(
                Shape::text(geometry.label_anchor, component.label, align).attr("class", "label"),
            );
            self.node_targets.insert(label, target);

            if let (Some(sublabel), Some(anchor)) = (component.sublabel, geometry.annotation_anchor)
            {
                let align = match layout.label_side {
                    LabelSide::Right => TextAlign::Start,
                    LabelSide::Inside => TextAlign::Middle,
                };
                self.surface
                    .add(Shape::text(anchor, sublabel, align).attr("class", "annotation"));
            }

            if let Some(toggle) = geometry.toggle_rect {
                let caption = if self.moe_mode { "FFN" } else { "MoE" };
                let toggle_node = self.surface.add(
                    Shape::rect(toggle, 4.0)
                        .with_id(format!("toggle-{}", component.key))
                        .attr("class", "toggle")
                        .attr("fill", "#ffffff")
                        .attr("stroke", BOX_STROKE),
                );
                let caption_node = self.surface.add(
                    Shape::text(toggle.center(), caption, TextAlign::Middle)
                        .attr("class", "toggle-label"),
                );
                self.node_targets.insert(toggle_node, HitTarget::Toggle);
                self.node_targets.insert(caption_node, HitTarget::Toggle);
                affordances.push((toggle, HitTarget::Toggle));
            }

            if component.has_demo {
                let center = Point::new(
                    geometry.rect.right() - DEMO_BADGE_RADIUS - 5.0,
                    geometry.rect.bottom() - DEMO_BADGE_RADIUS - 5.0,
                );
                let badge = self.surface.add(
                    Shape::circle(center, DEMO_BADGE_RADIUS)
                        .with_id(format!("demo-{}", component.key))
                        .attr("class", "demo-badge")
                        .attr("fill", "#2563eb"),
                );
                let demo = HitTarget::Demo(component.key);
                self.node_targets.insert(badge, demo);
                affordances.push((
                    Rect::new(
                        center.x - DEMO_BADGE_RADIUS,
                        center.y - DEMO_BADGE_RADIUS,
                        2.0 * DEMO_BADGE_RADIUS,
                        2.0 * DEMO_BADGE_RADIUS,
                    ),
                    demo,
                ));
            }

            if component.is_container {
                containers.push((geometry.rect, target));
            } else {
                boxes.push((geometry.rect, target));
            }
        }

        for route in &layout.connectors {
            let class = match route.kind {
                ConnectorKind::Flow => "arrow",
                ConnectorKind::Residual => "arrow residual",
            };
            let mut shape = Shape::path(route.points.clone(), true)
                .attr("class", class)
                .attr("stroke", ARROW_STROKE);
            if route.kind == ConnectorKind::Residual {
                shape = shape.attr("stroke-dasharray", "4 3");
            }
            self.surface.add(shape);
        }

        self.hit_regions.extend(affordances);
        self.hit_regions.extend(boxes);
        self.hit_regions.extend(containers);
        self.layout = Some(layout);

        if let Some(key) = self.highlighted {
            match self.box_nodes.get(&key).copied() {
                Some(node) => self.emphasise(node),
                None => self.highlighted = None,
            }
        }
        self.hovered = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::diagram::surface::Scene;

    fn renderer(section: Section) -> (DiagramRenderer<Scene>, Viewport, Rc<RefCell<Vec<String>>>) {
        let mut viewport = Viewport::new(1000.0, 800.0);
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        let mut renderer = DiagramRenderer::new(section, Scene::new(), LayoutConfig::default());
        renderer.init(1000.0, &mut viewport, move |key: &str| {
            sink.borrow_mut().push(key.to_string())
        });
        (renderer, viewport, clicks)
    }

    #[test]
    fn test_init_draws_visible_components() {
        let (r, viewport, _) = renderer(Section::Architecture);
        assert_eq!(r.state(), RendererState::Initialized);
        assert_eq!(r.component_count(), 13);
        assert_eq!(r.arrow_count(), 13);
        assert_eq!(r.surface().count_class("arrow"), 13);
        assert!(r.surface().find("component-moe").is_none());
        assert_eq!(viewport.listener_count(), 1);
    }

    #[test]
    fn test_highlight_replaces_previous() {
        let (mut r, _, _) = renderer(Section::Architecture);
        r.highlight_component(ComponentKey::Attention);
        r.highlight_component(ComponentKey::LmHead);
        assert_eq!(r.highlighted(), Some(ComponentKey::LmHead));
        let attention = r.node_of(ComponentKey::Attention).unwrap();
        assert_eq!(r.surface().attr(attention, "stroke"), Some(BOX_STROKE));
        let head = r.node_of(ComponentKey::LmHead).unwrap();
        assert_eq!(r.surface().attr(head, "stroke"), Some(HIGHLIGHT_STROKE));
    }

    #[test]
    fn test_highlight_hidden_or_foreign_is_noop() {
        let (mut r, _, _) = renderer(Section::Architecture);
        r.highlight_component(ComponentKey::Moe);
        assert_eq!(r.highlighted(), None);
        r.highlight_component(ComponentKey::KvCache);
        assert_eq!(r.highlighted(), None);
        r.highlight_key("not-a-component");
        assert_eq!(r.highlighted(), None);
        r.clear_highlight();
        r.clear_highlight();
    }

    #[test]
    fn test_toggle_moe_swaps_groups() {
        let (mut r, _, _) = renderer(Section::Architecture);
        assert!(r.toggle_moe());
        assert!(r.is_moe_mode());
        assert!(r.surface().find("component-moe").is_some());
        assert!(r.surface().find("component-ffn").is_none());
        assert_eq!(r.component_count(), 13);
        assert_eq!(r.arrow_count(), 13);
        r.reveal_moe();
        assert!(r.is_moe_mode());
    }

    #[test]
    fn test_toggle_is_architecture_only() {
        let (mut r, _, _) = renderer(Section::Inference);
        assert!(!r.toggle_moe());
        assert!(!r.is_moe_mode());
    }

    #[test]
    fn test_click_dispatches_info_key() {
        let (mut r, _, clicks) = renderer(Section::Architecture);
        let node = r.node_of(ComponentKey::Positional).unwrap();
        assert_eq!(
            r.handle_event(SurfaceEvent::Click(node)),
            Some(Dispatch::Info("embedding"))
        );
        let center = r.layout().unwrap().get(ComponentKey::Tokenizer).unwrap().rect.center();
        assert_eq!(r.click_at(center), Some(Dispatch::Info("tokenizer")));
        assert_eq!(*clicks.borrow(), vec!["embedding", "tokenizer"]);
    }

    #[test]
    fn test_click_on_toggle_flips_mode_without_info() {
        let (mut r, _, clicks) = renderer(Section::Architecture);
        let toggle = r
            .layout()
            .unwrap()
            .get(ComponentKey::FeedForward)
            .unwrap()
            .toggle_rect
            .unwrap();
        assert_eq!(r.click_at(toggle.center()), Some(Dispatch::ToggleMoe));
        assert!(r.is_moe_mode());
        assert!(clicks.borrow().is_empty());
    }

    #[test]
    fn test_child_wins_over_container() {
        let (mut r, _, _) = renderer(Section::Architecture);
        let rect = r.layout().unwrap().get(ComponentKey::AddNorm1).unwrap().rect;
        assert_eq!(
            r.click_at(Point::new(rect.x + 4.0, rect.y + 4.0)),
            Some(Dispatch::Info("add-norm"))
        );
    }

    #[test]
    fn test_hover_tracks_pointer() {
        let (mut r, _, _) = renderer(Section::Training);
        let node = r.node_of(ComponentKey::Loss).unwrap();
        r.handle_event(SurfaceEvent::PointerEnter(node));
        assert_eq!(r.hovered(), Some(ComponentKey::Loss));
        r.handle_event(SurfaceEvent::PointerLeave(node));
        assert_eq!(r.hovered(), None);
    }

    #[test]
    fn test_destroy_twice_and_before_init() {
        let mut viewport = Viewport::new(800.0, 600.0);
        let mut fresh = DiagramRenderer::new(Section::Training, Scene::new(), LayoutConfig::default());
        fresh.destroy(&mut viewport);
        assert_eq!(fresh.state(), RendererState::Uninitialized);

        let (mut r, mut viewport, _) = renderer(Section::Architecture);
        r.highlight_component(ComponentKey::Attention);
        r.destroy(&mut viewport);
        r.destroy(&mut viewport);
        assert_eq!(r.state(), RendererState::Destroyed);
        assert_eq!(viewport.listener_count(), 0);
        assert!(r.surface().is_empty());
        assert_eq!(r.highlighted(), None);
    }

    #[test]
    fn test_resize_keeps_highlight() {
        let (mut r, _, _) = renderer(Section::Architecture);
        r.highlight_component(ComponentKey::Softmax);
        r.handle_resize(500.0);
        assert_eq!(r.highlighted(), Some(ComponentKey::Softmax));
        let node = r.node_of(ComponentKey::Softmax).unwrap();
        assert_eq!(r.surface().attr(node, "stroke"), Some(HIGHLIGHT_STROKE));
    }
}
