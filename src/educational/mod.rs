//! Teaching layer on top of the diagrams and simulators.
//!
//! - **Explanations**: info-panel content keyed by component
//! - **Visualizers**: ASCII renderings of demo results
//! - **Tour**: guided step-by-step walk through the diagrams
//!
//! ## Usage
//!
//! ```rust,ignore
//! use transformer_viz::educational::{Tour, lookup};
//!
//! let panel = lookup("attention").unwrap();
//! println!("{}: {}", panel.title, panel.short);
//!
//! let mut tour = Tour::default();
//! let first = tour.start(&mut app);
//! ```

pub mod explanations;
pub mod tour;
pub mod visualizers;

pub use explanations::{Explanation, ExplanationLevel, InfoTopic, lookup};
pub use tour::{
    StepView, TooltipPosition, Tour, TourAction, TourHost, TourPhase, TourSignal, TourStep,
    default_steps,
};
pub use visualizers::{
    attention_heatmap_ascii, box_text, cache_comparison, expert_load_table, probability_bars,
    ratio_bar,
};
