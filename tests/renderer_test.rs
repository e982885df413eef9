//! Integration tests for the diagram renderer.

use std::cell::RefCell;
use std::rc::Rc;

use transformer_viz::config::LayoutConfig;
use transformer_viz::diagram::{
    ComponentKey, DiagramRenderer, Dispatch, LabelSide, RendererState, Scene, Section,
    Surface, SurfaceEvent, Viewport,
};

fn renderer(section: Section) -> (DiagramRenderer<Scene>, Viewport) {
    let mut viewport = Viewport::new(1000.0, 800.0);
    let mut renderer = DiagramRenderer::new(section, Scene::new(), LayoutConfig::default());
    renderer.init(1000.0, &mut viewport, |_| {});
    (renderer, viewport)
}

#[test]
fn test_init_draws_and_subscribes() {
    let (renderer, viewport) = renderer(Section::Architecture);
    assert_eq!(renderer.state(), RendererState::Initialized);
    assert_eq!(renderer.component_count(), 13);
    assert_eq!(renderer.arrow_count(), 13);
    assert_eq!(viewport.listener_count(), 1);
}

#[test]
fn test_destroy_twice_is_safe() {
    let (mut renderer, mut viewport) = renderer(Section::Inference);
    renderer.destroy(&mut viewport);
    renderer.destroy(&mut viewport);
    assert_eq!(renderer.state(), RendererState::Destroyed);
    assert_eq!(viewport.listener_count(), 0);
    assert!(renderer.surface().is_empty());
}

#[test]
fn test_resize_switches_label_side() {
    let (mut renderer, mut viewport) = renderer(Section::Architecture);
    let components = renderer.component_count();
    let arrows = renderer.arrow_count();
    renderer.highlight_component(ComponentKey::Attention);

    let notified = viewport.resize(500.0, 800.0);
    assert_eq!(notified, vec![renderer.listener().unwrap()]);
    renderer.handle_resize(500.0);

    let layout = renderer.layout().unwrap();
    assert_eq!(layout.label_side, LabelSide::Inside);
    assert_eq!(renderer.component_count(), components);
    assert_eq!(renderer.arrow_count(), arrows);
    assert_eq!(renderer.highlighted(), Some(ComponentKey::Attention));
}

#[test]
fn test_height_only_resize_is_ignored() {
    let (_renderer, mut viewport) = renderer(Section::Architecture);
    assert!(viewport.resize(1000.0, 400.0).is_empty());
}

#[test]
fn test_highlight_moves_between_components() {
    let (mut renderer, _viewport) = renderer(Section::Architecture);
    renderer.highlight_key("embedding");
    renderer.highlight_key("softmax");
    assert_eq!(renderer.highlighted(), Some(ComponentKey::Softmax));
    renderer.highlight_key("not-a-component");
    assert_eq!(renderer.highlighted(), None);
}

#[test]
fn test_toggle_moe_only_on_architecture() {
    let (mut arch, _v1) = renderer(Section::Architecture);
    assert!(arch.toggle_moe());
    assert!(arch.is_moe_mode());
    assert!(arch.node_of(ComponentKey::Moe).is_some());
    assert!(arch.node_of(ComponentKey::FeedForward).is_none());
    assert_eq!(arch.component_count(), 13);

    let (mut training, _v2) = renderer(Section::Training);
    assert!(!training.toggle_moe());
    assert!(!training.is_moe_mode());
}

#[test]
fn test_click_reports_info_key() {
    let keys = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&keys);
    let mut viewport = Viewport::new(1000.0, 800.0);
    let mut renderer =
        DiagramRenderer::new(Section::Architecture, Scene::new(), LayoutConfig::default());
    renderer.init(1000.0, &mut viewport, move |key: &str| {
        sink.borrow_mut().push(key.to_string())
    });

    let node = renderer.node_of(ComponentKey::Tokenizer).unwrap();
    assert_eq!(
        renderer.handle_event(SurfaceEvent::Click(node)),
        Some(Dispatch::Info("tokenizer"))
    );
    assert_eq!(keys.borrow().as_slice(), ["tokenizer".to_string()]);
}

#[test]
fn test_no_events_after_destroy() {
    let (mut renderer, mut viewport) = renderer(Section::Architecture);
    let node = renderer.node_of(ComponentKey::Attention).unwrap();
    renderer.destroy(&mut viewport);
    assert_eq!(renderer.handle_event(SurfaceEvent::Click(node)), None);
    assert!(!renderer.toggle_moe());
}
