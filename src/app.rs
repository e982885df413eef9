//! Host application.
//!
//! Owns the viewport, the active section's renderer and the shared model
//! parameters. It implements the section switcher (with a completion
//! callback), routes resize notifications to the renderer that subscribed,
//! and consumes tour signals.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::VizConfig;
use crate::diagram::{
    ComponentKey, DiagramRenderer, Dispatch, Point, Rect, RendererState, Scene, Section,
    SurfaceEvent, Surface, Viewport,
};
use crate::educational::explanations::{Explanation, InfoTopic, lookup};
use crate::educational::tour::{TourHost, TourPhase, TourSignal};
use crate::model::params::{ModelParams, ParamsCell};

/// Selector of the whole diagram.
pub const DIAGRAM_SELECTOR: &str = "#diagram";

pub struct App {
    config: VizConfig,
    params: ParamsCell,
    viewport: Viewport,
    section: Section,
    renderer: DiagramRenderer<Scene>,
    /// Every info key the diagram callback received, oldest first.
    clicks: Rc<RefCell<Vec<String>>>,
    panel: Option<InfoTopic>,
    active_demo: Option<ComponentKey>,
    tour_outcome: Option<TourPhase>,
}

impl App {
    /// Creates the app and renders the architecture section.
    pub fn new(config: VizConfig, width: f32, height: f32) -> Self {
        let renderer = DiagramRenderer::new(Section::Architecture, Scene::new(), config.layout.clone());
        let mut app = Self {
            config,
            params: ParamsCell::new(),
            viewport: Viewport::new(width, height),
            section: Section::Architecture,
            renderer,
            clicks: Rc::new(RefCell::new(Vec::new())),
            panel: None,
            active_demo: None,
            tour_outcome: None,
        };
        app.init_renderer();
        app
    }

    fn init_renderer(&mut self) {
        let clicks = Rc::clone(&self.clicks);
        let width = self.viewport.width();
        self.renderer.init(width, &mut self.viewport, move |key: &str| {
            clicks.borrow_mut().push(key.to_string())
        });
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    /// Shared model parameters, built on first use.
    pub fn params(&self) -> Arc<ModelParams> {
        self.params.get_or_init(&self.config.model, &self.config.moe)
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn renderer(&self) -> &DiagramRenderer<Scene> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut DiagramRenderer<Scene> {
        &mut self.renderer
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn panel(&self) -> Option<InfoTopic> {
        self.panel
    }

    pub fn active_demo(&self) -> Option<ComponentKey> {
        self.active_demo
    }

    pub fn tour_outcome(&self) -> Option<TourPhase> {
        self.tour_outcome
    }

    /// Info keys received from diagram clicks.
    pub fn clicked_keys(&self) -> Vec<String> {
        self.clicks.borrow().clone()
    }

    /// Shows `section`, then runs `then` once its diagram has rendered.
    ///
    /// Switching to the section already shown only runs `then`.
    pub fn switch_section(&mut self, section: Section, then: impl FnOnce(&mut Self)) {
        if section != self.section || self.renderer.state() != RendererState::Initialized {
            self.renderer.destroy(&mut self.viewport);
            self.renderer = DiagramRenderer::new(section, Scene::new(), self.config.layout.clone());
            self.section = section;
            self.panel = None;
            self.init_renderer();
            info!(section = %section, "section switched");
        }
        then(self);
    }

    /// Resizes the viewport and notifies the subscribed renderer.
    pub fn resize(&mut self, width: f32, height: f32) {
        let notified = self.viewport.resize(width, height);
        if let Some(listener) = self.renderer.listener()
            && notified.contains(&listener)
        {
            self.renderer.handle_resize(width);
        }
    }

    /// Opens the info panel for `key`; unknown keys are ignored.
    pub fn open_info(&mut self, key: &str) -> Option<&'static Explanation> {
        let topic = InfoTopic::parse(key)?;
        self.panel = Some(topic);
        debug!(key, "info panel opened");
        Some(topic.explanation())
    }

    pub fn close_info(&mut self) {
        self.panel = None;
    }

    /// Cross-section link: shows the component's section, then opens its
    /// panel and highlights it.
    pub fn navigate_to(&mut self, key: ComponentKey) {
        self.switch_section(key.section(), |app| {
            app.open_info(InfoTopic::for_component(key).key());
            app.renderer.highlight_component(key);
        });
    }

    /// Clicks at a diagram point.
    pub fn click_at(&mut self, point: Point) -> Option<Dispatch> {
        let dispatch = self.renderer.click_at(point);
        self.apply_dispatch(dispatch);
        dispatch
    }

    /// Forwards a pointer event to the renderer.
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Option<Dispatch> {
        let dispatch = self.renderer.handle_event(event);
        self.apply_dispatch(dispatch);
        dispatch
    }

    fn apply_dispatch(&mut self, dispatch: Option<Dispatch>) {
        match dispatch {
            Some(Dispatch::Info(key)) => {
                self.open_info(key);
            }
            Some(Dispatch::Demo(key)) => {
                self.active_demo = Some(key);
                info!(demo = %key, "demo opened");
            }
            Some(Dispatch::ToggleMoe) | None => {}
        }
    }

    pub fn close_demo(&mut self) {
        self.active_demo = None;
    }

    /// Current diagram as SVG.
    pub fn to_svg(&self) -> String {
        self.renderer.surface().to_svg()
    }

    /// Tears the diagram down.
    pub fn shutdown(&mut self) {
        self.renderer.destroy(&mut self.viewport);
    }
}

impl TourHost for App {
    fn signal(&mut self, signal: TourSignal) {
        debug!(?signal, "tour signal");
        match signal {
            TourSignal::EnsureHomeView => {
                self.panel = None;
                self.active_demo = None;
                self.tour_outcome = None;
            }
            TourSignal::SwitchSection(section) => self.switch_section(section, |_| {}),
            TourSignal::Highlight(key) => self.renderer.highlight_component(key),
            TourSignal::ClearHighlight => self.renderer.clear_highlight(),
            TourSignal::RevealMoe => self.renderer.reveal_moe(),
        }
    }

    fn target_bounds(&self, selector: &str) -> Option<Rect> {
        if selector == DIAGRAM_SELECTOR {
            return self.renderer.layout().map(|l| l.bounds());
        }
        let id = selector.strip_prefix('#')?;
        self.renderer.surface().bounds(id)
    }

    fn viewport_size(&self) -> (f32, f32) {
        self.viewport.size()
    }

    fn on_complete(&mut self) {
        self.tour_outcome = Some(TourPhase::Complete);
    }

    fn on_exit(&mut self) {
        self.tour_outcome = Some(TourPhase::Exited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(VizConfig::default(), 1000.0, 800.0)
    }

    #[test]
    fn test_starts_on_architecture() {
        let app = app();
        assert_eq!(app.section(), Section::Architecture);
        assert_eq!(app.viewport().listener_count(), 1);
        assert!(app.to_svg().contains("component-attention"));
    }

    #[test]
    fn test_switch_section_runs_callback_after_render() {
        let mut app = app();
        let mut rendered = 0;
        app.switch_section(Section::Training, |app| {
            rendered = app.renderer().component_count();
        });
        assert_eq!(rendered, 7);
        assert_eq!(app.viewport().listener_count(), 1);
    }

    #[test]
    fn test_navigate_to_other_section() {
        let mut app = app();
        app.navigate_to(ComponentKey::KvCache);
        assert_eq!(app.section(), Section::Inference);
        assert_eq!(app.renderer().highlighted(), Some(ComponentKey::KvCache));
        assert_eq!(app.panel(), Some(InfoTopic::KvCache));
    }

    #[test]
    fn test_click_opens_panel_and_demo() {
        let mut app = app();
        let node = app.renderer().node_of(ComponentKey::AddNorm2).unwrap();
        app.handle_event(SurfaceEvent::Click(node));
        assert_eq!(app.panel(), Some(InfoTopic::AddNorm));
        assert_eq!(app.clicked_keys(), vec!["add-norm".to_string()]);

        let badge = app.renderer().surface().bounds("demo-attention").unwrap();
        assert_eq!(
            app.click_at(badge.center()),
            Some(Dispatch::Demo(ComponentKey::Attention))
        );
        assert_eq!(app.active_demo(), Some(ComponentKey::Attention));
    }

    #[test]
    fn test_resize_reaches_renderer() {
        let mut app = app();
        app.resize(500.0, 800.0);
        assert_eq!(
            app.renderer().layout().unwrap().mode,
            crate::diagram::LayoutMode::Narrow
        );
    }

    #[test]
    fn test_params_built_once() {
        let app = app();
        assert!(Arc::ptr_eq(&app.params(), &app.params()));
    }
}
