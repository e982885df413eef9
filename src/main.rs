//! transformer-viz CLI.
//!
//! Runs the demos in the terminal and prints diagrams as SVG.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use transformer_viz::demos::{
    AttentionDemo, HeadSelection, KvCacheDemo, MoeDemo, SamplingDemo, ThreadTicker,
};
use transformer_viz::diagram::{ComponentKey, Section};
use transformer_viz::educational::{Tour, visualizers::box_text};
use transformer_viz::model::{MoeRouter, NoBias};
use transformer_viz::{App, VizConfig};

#[derive(Parser, Debug)]
#[command(
    name = "transformer-viz",
    about = "Toy transformer simulations and interactive diagrams",
    version
)]
struct Cli {
    /// JSON configuration file; defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a causal attention heatmap for the input text.
    Attention {
        /// Layer to show.
        #[arg(short, long, default_value_t = 0)]
        layer: usize,
        /// Head to show; omit to average all heads.
        #[arg(long)]
        head: Option<usize>,
        /// Input text.
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Route every token through the mixture-of-experts router.
    Moe {
        /// Route without the word-category bias.
        #[arg(long, default_value_t = false)]
        no_bias: bool,
        /// Reveal tokens one by one.
        #[arg(long, default_value_t = false)]
        play: bool,
        /// Input text.
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Sample continuations of a fixed prompt.
    Sample {
        #[arg(short, long)]
        temperature: Option<f32>,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        top_p: Option<f32>,
        /// Number of draws.
        #[arg(short = 'n', long, default_value_t = 10)]
        draws: usize,
    },
    /// Compare K/V computations with and without a cache.
    KvCache {
        /// Tokens to generate.
        #[arg(short = 'n', long, default_value_t = 4)]
        tokens: usize,
        /// Generate one token per tick.
        #[arg(long, default_value_t = false)]
        play: bool,
    },
    /// Print a diagram as SVG.
    Diagram {
        #[arg(short, long, value_enum, default_value_t = SectionArg::Architecture)]
        section: SectionArg,
        /// Container width in pixels.
        #[arg(short, long, default_value_t = 1000.0)]
        width: f32,
        /// Component to highlight, e.g. `attention` or `kv-cache`.
        #[arg(long)]
        highlight: Option<String>,
        /// Show the MOE view of the architecture.
        #[arg(long, default_value_t = false)]
        moe: bool,
    },
    /// Walk through the guided tour.
    Tour {
        #[arg(short, long, default_value_t = 1000.0)]
        width: f32,
        #[arg(long, default_value_t = 800.0)]
        height: f32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SectionArg {
    Architecture,
    Training,
    Inference,
}

impl From<SectionArg> for Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::Architecture => Section::Architecture,
            SectionArg::Training => Section::Training,
            SectionArg::Inference => Section::Inference,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<VizConfig> {
    match path {
        Some(path) => VizConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(VizConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    tracing::info!("transformer-viz v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Attention { layer, head, text } => {
            let app = App::new(config, 1000.0, 800.0);
            let mut demo = AttentionDemo::new(app.params());
            let text = text.join(" ");
            demo.run(&text).context("nothing to attend over")?;
            if !demo.select_layer(layer) {
                anyhow::bail!("layer {layer} does not exist");
            }
            let selection = head.map_or(HeadSelection::Average, HeadSelection::Head);
            if !demo.select_head(selection) {
                anyhow::bail!("head {head:?} does not exist");
            }
            if let Some(ascii) = demo.ascii() {
                println!("{ascii}");
            }
            if let Some(pass) = demo.result() {
                println!();
                for (i, j, w) in demo.strongest_links() {
                    println!(
                        "  {:>10} → {:<10} {:.2}",
                        pass.tokens[i].display(10),
                        pass.tokens[j].display(10),
                        w
                    );
                }
            }
        }
        Command::Moe {
            no_bias,
            play,
            text,
        } => {
            let app = App::new(config.clone(), 1000.0, 800.0);
            let params = app.params();
            let mut demo = MoeDemo::new(Arc::clone(&params), &config.playback);
            if no_bias {
                demo = demo.with_router(MoeRouter::new(params).with_bias(Arc::new(NoBias)));
            }
            demo.run(&text.join(" ")).context("nothing to route")?;
            if play {
                demo.rewind();
                demo.play(&mut ThreadTicker, |result| {
                    let experts: Vec<String> =
                        result.top_experts.iter().map(|e| e.to_string()).collect();
                    println!(
                        "  {} → experts {}",
                        result.token.as_deref().unwrap_or("?"),
                        experts.join(", ")
                    );
                });
                println!();
            }
            if let Some(ascii) = demo.ascii() {
                println!("{ascii}");
            }
        }
        Command::Sample {
            temperature,
            top_k,
            top_p,
            draws,
        } => {
            let mut demo = SamplingDemo::new(&config.sampling);
            let sampler = demo.sampler_mut();
            if let Some(t) = temperature {
                sampler.set_temperature(t);
            }
            if let Some(k) = top_k {
                sampler.set_top_k(k);
            }
            if let Some(p) = top_p {
                sampler.set_top_p(p);
            }
            println!("{} …", demo.prompt());
            println!("{}", demo.ascii()?);
            let mut words = Vec::with_capacity(draws);
            for _ in 0..draws {
                words.push(demo.sample()?.to_string());
            }
            println!("draws: {}", words.join(", "));
        }
        Command::KvCache { tokens, play } => {
            let mut demo = KvCacheDemo::new(&config.model, &config.playback);
            if play {
                demo.play(tokens, &mut ThreadTicker, |step| {
                    println!(
                        "  step {:>2} {:<8} K without cache {:>5}  with cache {:>4}",
                        step.step, step.token, step.k_without_cache, step.k_with_cache
                    );
                });
            } else {
                demo.generate(tokens);
            }
            println!("{}", demo.ascii());
        }
        Command::Diagram {
            section,
            width,
            highlight,
            moe,
        } => {
            let mut app = App::new(config, width, 800.0);
            app.switch_section(section.into(), |app| {
                if moe {
                    app.renderer_mut().reveal_moe();
                }
                if let Some(key) = highlight.as_deref() {
                    if ComponentKey::parse(key).is_none() {
                        tracing::warn!("unknown component {key}");
                    }
                    app.renderer_mut().highlight_key(key);
                }
            });
            print!("{}", app.to_svg());
            app.shutdown();
        }
        Command::Tour { width, height } => {
            let mut app = App::new(config, width, height);
            let mut tour = Tour::default();
            let mut view = tour.start(&mut app);
            while let Some(step) = view {
                let body = format!(
                    "{}\n\n[{}] section: {}",
                    step.content,
                    step.progress,
                    app.section()
                );
                println!("{}\n", box_text(&body, step.title, 64));
                view = tour.next(&mut app);
            }
            println!("tour finished: {:?}", tour.phase());
            app.shutdown();
        }
    }

    Ok(())
}
