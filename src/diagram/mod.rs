//! Interactive transformer diagrams.
//!
//! - `component`: static component catalogue per section
//! - `layout`: responsive wide/narrow geometry
//! - `surface`: drawing surface trait and the in-memory SVG scene
//! - `viewport`: resize listener registry
//! - `renderer`: stateful diagram renderer (highlight, MOE toggle, clicks)

pub mod component;
pub mod layout;
pub mod renderer;
pub mod surface;
pub mod viewport;

pub use component::{Component, ComponentKey, Connector, ConnectorKind, Section};
pub use layout::{
    BoxGeometry, ConnectorRoute, LabelSide, Layout, LayoutMode, Point, Rect, compute_layout,
    select_mode,
};
pub use renderer::{ClickCallback, DiagramRenderer, Dispatch, RendererState};
pub use surface::{NodeId, Scene, Shape, ShapeKind, Surface, SurfaceEvent, TextAlign, Transition};
pub use viewport::{ListenerId, Viewport};
