//! Guided tour over the diagrams.
//!
//! A linear sequence of steps with a single cursor. The tour never touches a
//! renderer directly: it raises [`TourSignal`]s and asks the [`TourHost`]
//! for element bounds, so it works with any diagram variant.
//!
//! ## States
//!
//! ```text
//! Inactive ──start──► Active ──next (last step)──► Complete
//!                       │
//!                       └──exit──► Exited
//! ```
//!
//! Both terminal states clear the highlight; `start` re-enters `Active`.

use tracing::{debug, info};

use crate::diagram::{ComponentKey, Point, Rect, Section};

pub const TOOLTIP_WIDTH: f32 = 320.0;
pub const TOOLTIP_HEIGHT: f32 = 180.0;
pub const TOOLTIP_GAP: f32 = 12.0;
pub const SPOTLIGHT_PADDING: f32 = 8.0;
pub const VIEWPORT_MARGIN: f32 = 10.0;

/// Where the tooltip goes relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipPosition {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

/// Side effect fired when a step is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourAction {
    RevealMoe,
}

#[derive(Debug, Clone)]
pub struct TourStep {
    /// Selector of the element to spotlight, e.g. `#component-attention`.
    pub target: &'static str,
    pub component: Option<ComponentKey>,
    pub section: Option<Section>,
    pub title: &'static str,
    pub content: &'static str,
    pub position: TooltipPosition,
    pub action: Option<TourAction>,
    pub is_final: bool,
}

impl TourStep {
    fn new(target: &'static str, title: &'static str, content: &'static str) -> Self {
        Self {
            target,
            component: None,
            section: None,
            title,
            content,
            position: TooltipPosition::Right,
            action: None,
            is_final: false,
        }
    }

    fn component(mut self, key: ComponentKey) -> Self {
        self.component = Some(key);
        self.section = Some(key.section());
        self
    }

    fn section(mut self, section: Section) -> Self {
        self.section = Some(section);
        self
    }

    fn position(mut self, position: TooltipPosition) -> Self {
        self.position = position;
        self
    }

    fn action(mut self, action: TourAction) -> Self {
        self.action = Some(action);
        self
    }

    fn last(mut self) -> Self {
        self.is_final = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourPhase {
    Inactive,
    Active,
    Complete,
    Exited,
}

/// Requests raised by the tour for the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourSignal {
    /// Close panels and demos so the diagram is visible.
    EnsureHomeView,
    SwitchSection(Section),
    Highlight(ComponentKey),
    ClearHighlight,
    RevealMoe,
}

/// The application side of the tour.
pub trait TourHost {
    fn signal(&mut self, signal: TourSignal);

    /// On-screen bounds of the element matching `selector`, if present.
    fn target_bounds(&self, selector: &str) -> Option<Rect>;

    fn viewport_size(&self) -> (f32, f32);

    fn on_complete(&mut self) {}

    fn on_exit(&mut self) {}
}

/// What the overlay shows for the current step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub index: usize,
    pub total: usize,
    pub title: &'static str,
    pub content: &'static str,
    /// "i / N", one-based.
    pub progress: String,
    /// Padded target bounds; `None` when the target is absent.
    pub spotlight: Option<Rect>,
    /// Top-left corner of the tooltip, clamped inside the viewport.
    pub tooltip: Point,
    pub centered: bool,
    pub is_final: bool,
}

#[derive(Debug, Clone)]
pub struct Tour {
    steps: Vec<TourStep>,
    current: usize,
    phase: TourPhase,
}

impl Default for Tour {
    fn default() -> Self {
        Self::new(default_steps())
    }
}

impl Tour {
    pub fn new(steps: Vec<TourStep>) -> Self {
        Self {
            steps,
            current: 0,
            phase: TourPhase::Inactive,
        }
    }

    pub fn steps(&self) -> &[TourStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn phase(&self) -> TourPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == TourPhase::Active
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    /// Resets the cursor and shows the first step.
    pub fn start(&mut self, host: &mut impl TourHost) -> Option<StepView> {
        self.current = 0;
        self.phase = TourPhase::Active;
        info!(steps = self.steps.len(), "tour started");
        host.signal(TourSignal::EnsureHomeView);
        if self.steps.is_empty() {
            self.complete(host);
            return None;
        }
        self.show_step(0, host)
    }

    /// Advances, or completes the tour from the last step.
    pub fn next(&mut self, host: &mut impl TourHost) -> Option<StepView> {
        if !self.is_active() {
            return None;
        }
        if self.current + 1 >= self.steps.len() {
            self.complete(host);
            return None;
        }
        self.show_step(self.current + 1, host)
    }

    /// Goes back one step; no-op on the first step.
    pub fn prev(&mut self, host: &mut impl TourHost) -> Option<StepView> {
        if !self.is_active() || self.current == 0 {
            return None;
        }
        self.show_step(self.current - 1, host)
    }

    /// Moves the cursor to `index` and applies the step's side effects.
    pub fn show_step(&mut self, index: usize, host: &mut impl TourHost) -> Option<StepView> {
        if !self.is_active() {
            return None;
        }
        let step = self.steps.get(index)?.clone();
        self.current = index;

        if let Some(section) = step.section {
            host.signal(TourSignal::SwitchSection(section));
        }
        if step.action == Some(TourAction::RevealMoe) {
            host.signal(TourSignal::RevealMoe);
        }
        match step.component {
            Some(key) => host.signal(TourSignal::Highlight(key)),
            None => host.signal(TourSignal::ClearHighlight),
        }

        let viewport = host.viewport_size();
        let target = match step.position {
            TooltipPosition::Center => None,
            _ => host.target_bounds(step.target),
        };
        let (spotlight, tooltip, centered) = match target {
            Some(bounds) => {
                let spotlight = bounds.inflate(SPOTLIGHT_PADDING);
                (
                    Some(spotlight),
                    place_tooltip(spotlight, step.position, viewport),
                    false,
                )
            }
            None => (None, centered_tooltip(viewport), true),
        };

        debug!(
            step = index,
            title = step.title,
            centered,
            "tour step shown"
        );

        Some(StepView {
            index,
            total: self.steps.len(),
            title: step.title,
            content: step.content,
            progress: format!("{} / {}", index + 1, self.steps.len()),
            spotlight,
            tooltip,
            centered,
            is_final: step.is_final,
        })
    }

    pub fn complete(&mut self, host: &mut impl TourHost) {
        if self.phase != TourPhase::Active {
            return;
        }
        self.phase = TourPhase::Complete;
        host.signal(TourSignal::ClearHighlight);
        host.on_complete();
        info!("tour complete");
    }

    /// Leaves the tour from any active step.
    pub fn exit(&mut self, host: &mut impl TourHost) {
        if self.phase != TourPhase::Active {
            return;
        }
        self.phase = TourPhase::Exited;
        host.signal(TourSignal::ClearHighlight);
        host.on_exit();
        info!(step = self.current, "tour exited");
    }
}

fn clamp_axis(value: f32, size: f32, extent: f32) -> f32 {
    let max = extent - size - VIEWPORT_MARGIN;
    if max < VIEWPORT_MARGIN {
        VIEWPORT_MARGIN
    } else {
        value.clamp(VIEWPORT_MARGIN, max)
    }
}

fn clamp_tooltip(x: f32, y: f32, (width, height): (f32, f32)) -> Point {
    Point::new(
        clamp_axis(x, TOOLTIP_WIDTH, width),
        clamp_axis(y, TOOLTIP_HEIGHT, height),
    )
}

fn centered_tooltip(viewport: (f32, f32)) -> Point {
    clamp_tooltip(
        (viewport.0 - TOOLTIP_WIDTH) / 2.0,
        (viewport.1 - TOOLTIP_HEIGHT) / 2.0,
        viewport,
    )
}

fn place_tooltip(spotlight: Rect, position: TooltipPosition, viewport: (f32, f32)) -> Point {
    let center = spotlight.center();
    let (x, y) = match position {
        TooltipPosition::Top => (
            center.x - TOOLTIP_WIDTH / 2.0,
            spotlight.y - TOOLTIP_GAP - TOOLTIP_HEIGHT,
        ),
        TooltipPosition::Bottom => (center.x - TOOLTIP_WIDTH / 2.0, spotlight.bottom() + TOOLTIP_GAP),
        TooltipPosition::Left => (
            spotlight.x - TOOLTIP_GAP - TOOLTIP_WIDTH,
            center.y - TOOLTIP_HEIGHT / 2.0,
        ),
        TooltipPosition::Right => (spotlight.right() + TOOLTIP_GAP, center.y - TOOLTIP_HEIGHT / 2.0),
        TooltipPosition::Center => return centered_tooltip(viewport),
    };
    clamp_tooltip(x, y, viewport)
}

/// The built-in ten-step tour.
pub fn default_steps() -> Vec<TourStep> {
    use ComponentKey::*;
    vec![
        TourStep::new(
            "#diagram",
            "Welcome",
            "This diagram follows one prompt through a small decoder-only \
transformer. Click any box for details, or follow along.",
        )
        .section(Section::Architecture)
        .position(TooltipPosition::Center),
        TourStep::new(
            "#component-tokenizer",
            "Tokenization",
            "Text is split into tokens and every token gets an id.",
        )
        .component(Tokenizer),
        TourStep::new(
            "#component-embedding",
            "Embeddings",
            "Ids become 64-dimensional vectors, with position information added.",
        )
        .component(Embedding),
        TourStep::new(
            "#component-attention",
            "Self-Attention",
            "Each token looks back at earlier tokens. Try the demo to see the heatmap.",
        )
        .component(Attention),
        TourStep::new(
            "#component-ffn",
            "Feed-Forward",
            "A per-token MLP that expands to 256 dimensions and back.",
        )
        .component(FeedForward),
        TourStep::new(
            "#component-moe",
            "Mixture of Experts",
            "Swap the dense feed-forward for 8 experts; a router picks 2 per token.",
        )
        .component(Moe)
        .action(TourAction::RevealMoe),
        TourStep::new(
            "#component-softmax",
            "Picking the Next Token",
            "Logits become probabilities, and sampling picks one token.",
        )
        .component(Softmax)
        .position(TooltipPosition::Left),
        TourStep::new(
            "#component-loss",
            "Training",
            "During training the same forward pass is scored with cross-entropy \
and the weights are nudged.",
        )
        .component(Loss),
        TourStep::new(
            "#component-kv-cache",
            "Fast Inference",
            "The KV cache stores past keys and values so each step only computes \
the new token.",
        )
        .component(KvCache),
        TourStep::new(
            "#diagram",
            "You're Ready",
            "Explore the sections, open the demos and change the inputs.",
        )
        .section(Section::Architecture)
        .position(TooltipPosition::Center)
        .last(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHost {
        signals: Vec<TourSignal>,
        target: Option<Rect>,
        completed: bool,
        exited: bool,
    }

    impl TourHost for RecordingHost {
        fn signal(&mut self, signal: TourSignal) {
            self.signals.push(signal);
        }

        fn target_bounds(&self, _selector: &str) -> Option<Rect> {
            self.target
        }

        fn viewport_size(&self) -> (f32, f32) {
            (1024.0, 768.0)
        }

        fn on_complete(&mut self) {
            self.completed = true;
        }

        fn on_exit(&mut self) {
            self.exited = true;
        }
    }

    #[test]
    fn test_default_tour_shape() {
        let tour = Tour::default();
        assert_eq!(tour.len(), 10);
        assert!(tour.steps()[9].is_final);
        assert!(tour.steps()[..9].iter().all(|s| !s.is_final));
        assert_eq!(tour.steps()[5].action, Some(TourAction::RevealMoe));
    }

    #[test]
    fn test_start_emits_home_view_first() {
        let mut host = RecordingHost::default();
        let mut tour = Tour::default();
        let view = tour.start(&mut host).unwrap();
        assert_eq!(host.signals[0], TourSignal::EnsureHomeView);
        assert_eq!(view.progress, "1 / 10");
        assert!(view.centered);
        assert!(view.spotlight.is_none());
    }

    #[test]
    fn test_prev_is_noop_on_first_step() {
        let mut host = RecordingHost::default();
        let mut tour = Tour::default();
        tour.start(&mut host);
        assert!(tour.prev(&mut host).is_none());
        assert_eq!(tour.current_step(), 0);
    }

    #[test]
    fn test_missing_target_centres_tooltip() {
        let mut host = RecordingHost::default();
        let mut tour = Tour::default();
        tour.start(&mut host);
        let view = tour.next(&mut host).unwrap();
        assert!(view.centered);
        assert_eq!(view.tooltip, Point::new(352.0, 294.0));
    }

    #[test]
    fn test_tooltip_clamped_inside_viewport() {
        let mut host = RecordingHost {
            target: Some(Rect::new(900.0, 700.0, 100.0, 50.0)),
            ..Default::default()
        };
        let mut tour = Tour::default();
        tour.start(&mut host);
        let view = tour.next(&mut host).unwrap();
        let spotlight = view.spotlight.unwrap();
        assert_eq!(spotlight, Rect::new(892.0, 692.0, 116.0, 66.0));
        assert!(view.tooltip.x + TOOLTIP_WIDTH <= 1024.0 - VIEWPORT_MARGIN);
        assert!(view.tooltip.y + TOOLTIP_HEIGHT <= 768.0 - VIEWPORT_MARGIN);
        assert!(view.tooltip.x >= VIEWPORT_MARGIN);
    }

    #[test]
    fn test_moe_step_reveals_before_highlight() {
        let mut host = RecordingHost::default();
        let mut tour = Tour::default();
        tour.start(&mut host);
        host.signals.clear();
        tour.show_step(5, &mut host);
        assert_eq!(
            host.signals,
            vec![
                TourSignal::SwitchSection(Section::Architecture),
                TourSignal::RevealMoe,
                TourSignal::Highlight(ComponentKey::Moe),
            ]
        );
    }

    #[test]
    fn test_exit_clears_highlight() {
        let mut host = RecordingHost::default();
        let mut tour = Tour::default();
        tour.start(&mut host);
        tour.next(&mut host);
        tour.exit(&mut host);
        assert_eq!(tour.phase(), TourPhase::Exited);
        assert_eq!(host.signals.last(), Some(&TourSignal::ClearHighlight));
        assert!(host.exited);
        assert!(tour.next(&mut host).is_none());
    }

    #[test]
    fn test_next_past_final_completes() {
        let mut host = RecordingHost::default();
        let mut tour = Tour::default();
        tour.start(&mut host);
        let mut last = None;
        for _ in 0..9 {
            last = tour.next(&mut host);
        }
        assert!(last.unwrap().is_final);
        assert!(tour.next(&mut host).is_none());
        assert_eq!(tour.phase(), TourPhase::Complete);
        assert!(host.completed);
    }
}
