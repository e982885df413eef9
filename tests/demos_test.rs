//! Integration tests for the demo controllers.

use std::sync::Arc;
use std::time::Duration;

use transformer_viz::config::{ModelConfig, MoeConfig, PlaybackConfig, SamplingConfig};
use transformer_viz::demos::{
    AttentionDemo, HeadSelection, KvCacheDemo, MoeDemo, Playback, PlaybackOutcome, SamplingDemo,
};
use transformer_viz::diagram::Scene;
use transformer_viz::model::ModelParams;
use transformer_viz::Error;

fn params() -> Arc<ModelParams> {
    Arc::new(ModelParams::new(&ModelConfig::default(), &MoeConfig::default()))
}

#[test]
fn test_attention_demo_heatmap() {
    let mut demo = AttentionDemo::new(params());
    demo.run("The cat sat on the mat").unwrap();
    assert!(demo.select_head(HeadSelection::Head(2)));
    assert!(!demo.select_head(HeadSelection::Head(4)));
    assert!(demo.select_layer(1));
    assert!(!demo.select_layer(3));

    let cells = demo.heatmap_cells();
    assert_eq!(cells.len(), 36);
    assert_eq!(cells.iter().filter(|c| c.masked).count(), 15);

    let mut scene = Scene::new();
    assert_eq!(demo.render(&mut scene), 36);
    assert!(demo.ascii().unwrap().contains("cat"));
}

#[test]
fn test_attention_demo_rejects_empty_input() {
    let mut demo = AttentionDemo::new(params());
    assert!(matches!(demo.run("   "), Err(Error::EmptyInput)));
    assert!(demo.result().is_none());
}

#[test]
fn test_moe_demo_reports_load() {
    let mut demo = MoeDemo::new(params(), &PlaybackConfig::default());
    let run = demo.run("def sum ( a , b ) : return a + b").unwrap();
    assert_eq!(run.tokens.len(), 10);
    assert_eq!(run.stats.counts.iter().sum::<usize>(), 20);
}

#[test]
fn test_kv_cache_four_tokens() {
    let mut demo = KvCacheDemo::new(&ModelConfig::default(), &PlaybackConfig::default());
    let stats = demo.generate(4);
    assert_eq!(stats.k_without_cache, 640);
    assert_eq!(stats.k_with_cache, 256);
    assert!((stats.k_savings_percent() - 60.0).abs() < 1e-4);
    assert!((stats.v_savings_percent() - 60.0).abs() < 1e-4);
    assert!(demo.ascii().contains("60.0%"));
}

#[test]
fn test_greedy_sampling_picks_mat() {
    let config = SamplingConfig {
        temperature: 0.0,
        ..SamplingConfig::default()
    };
    let mut demo = SamplingDemo::new(&config);
    for _ in 0..5 {
        assert_eq!(demo.sample().unwrap(), "mat");
    }
    assert_eq!(demo.history().len(), 5);
}

#[test]
fn test_top_k_limits_choices() {
    let config = SamplingConfig {
        temperature: 2.0,
        top_k: 2,
        ..SamplingConfig::default()
    };
    let mut demo = SamplingDemo::new(&config);
    for _ in 0..50 {
        let word = demo.sample().unwrap();
        assert!(word == "mat" || word == "floor", "unexpected {word}");
    }
    let dist = demo.distribution().unwrap();
    assert_eq!(dist.iter().filter(|p| **p > 0.0).count(), 2);
}

#[test]
fn test_playback_cancel_and_rearm() {
    let playback = Playback::new(Duration::from_millis(1));
    let handle = playback.handle();
    let outcome = playback.run(5, &mut |_: Duration| handle.stop(), |_| {});
    assert_eq!(outcome, PlaybackOutcome::Cancelled { completed: 1 });

    let outcome = playback.run(3, &mut |_: Duration| {}, |_| {});
    assert_eq!(outcome, PlaybackOutcome::Finished { steps: 3 });
}
