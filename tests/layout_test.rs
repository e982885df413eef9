//! Integration tests for the responsive layout engine.

use transformer_viz::config::LayoutConfig;
use transformer_viz::diagram::{
    ComponentKey, LabelSide, LayoutMode, Section, compute_layout, select_mode,
};

fn architecture_layout(width: f32) -> transformer_viz::diagram::Layout {
    let section = Section::Architecture;
    compute_layout(
        width,
        &section.components(),
        &section.connectors(),
        &LayoutConfig::default(),
    )
}

#[test]
fn test_mode_follows_width() {
    let config = LayoutConfig::default();
    assert_eq!(select_mode(1000.0, &config), LayoutMode::Wide);
    assert_eq!(select_mode(500.0, &config), LayoutMode::Narrow);
}

#[test]
fn test_wide_labels_outside_narrow_inside() {
    let wide = architecture_layout(1000.0);
    assert_eq!(wide.label_side, LabelSide::Right);
    let narrow = architecture_layout(500.0);
    assert_eq!(narrow.label_side, LabelSide::Inside);
    assert!(narrow.lane_offset < wide.lane_offset);
}

#[test]
fn test_layout_is_idempotent() {
    assert_eq!(architecture_layout(820.0), architecture_layout(820.0));
}

#[test]
fn test_hidden_moe_has_no_box() {
    let layout = architecture_layout(1000.0);
    assert!(layout.get(ComponentKey::Moe).is_none());
    assert!(layout.get(ComponentKey::FeedForward).is_some());
    assert!(
        layout
            .connectors
            .iter()
            .all(|c| c.from != ComponentKey::Moe && c.to != ComponentKey::Moe)
    );
}

#[test]
fn test_boxes_fit_the_drawing() {
    for width in [360.0, 500.0, 760.0, 1000.0, 1400.0] {
        let layout = architecture_layout(width);
        let bounds = layout.bounds();
        for b in &layout.boxes {
            assert!(b.rect.x >= 0.0, "{:?} at width {width}", b.key);
            assert!(b.rect.bottom() <= bounds.bottom());
        }
    }
}

#[test]
fn test_every_section_lays_out() {
    for section in Section::ALL {
        let layout = compute_layout(
            900.0,
            &section.components(),
            &section.connectors(),
            &LayoutConfig::default(),
        );
        let visible = section.components().iter().filter(|c| !c.hidden).count();
        assert_eq!(layout.boxes.len(), visible);
        assert!(!layout.connectors.is_empty());
    }
}
