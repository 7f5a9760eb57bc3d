use anyhow::{bail, Context};
use charcard_rs::export::{Overlay, OverlayElement};
use charcard_rs::interaction::DeviceClass;
use charcard_rs::model::Offset;
use charcard_rs::sampler::ColorStop;
use charcard_rs::{
    BackgroundChoice, Card, CardConfig, CharacterInfo, Element, PortraitSource, TransformState,
};
use clap::{ArgGroup, Parser, ValueEnum};
use log::{info, LevelFilter};
use std::path::PathBuf;

/// How the portrait argument is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PortraitKind {
    /// Official game art, framed with the gacha crop
    Game,
    /// A previously stored custom portrait URL or path
    Custom,
    /// A local image file, compressed to the portrait viewport
    Upload,
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(group(ArgGroup::new("background").required(true).args(["element", "namecard"])))]
#[clap(group(ArgGroup::new("destination").required(true).args(["output", "download_dir"])))]
struct Args {
    /// Portrait URL or path
    #[clap(short, long)]
    portrait: String,

    /// How to treat the portrait
    #[clap(long, value_enum, default_value = "game")]
    portrait_kind: PortraitKind,

    /// Character name
    #[clap(short, long)]
    character: String,

    /// Build identifier, used in the download file name
    #[clap(long, default_value = "0")]
    id: String,

    /// Elemental background (anemo, cryo, dendro, electro, geo, hydro, pyro)
    #[clap(short, long)]
    element: Option<Element>,

    /// Namecard image URL or path to use as background
    #[clap(short, long)]
    namecard: Option<String>,

    /// Tint the background with colors sampled from the portrait
    #[clap(short, long)]
    adaptive: bool,

    /// Zoom factor of the portrait
    #[clap(short, long, default_value = "1.0")]
    zoom: f32,

    /// Horizontal pan in logical pixels
    #[clap(long, requires = "pan_y", allow_negative_numbers = true)]
    pan_x: Option<f32>,

    /// Vertical pan in logical pixels
    #[clap(long, requires = "pan_x", allow_negative_numbers = true)]
    pan_y: Option<f32>,

    /// Path to a JSON card configuration
    #[clap(long)]
    config: Option<PathBuf>,

    /// Directory or URL holding elementalBackgrounds/
    #[clap(long)]
    asset_base: Option<String>,

    /// SVG file drawn over the card
    #[clap(long)]
    overlay_svg: Option<PathBuf>,

    /// Class of the overlay element, matched by snapshot nudges
    #[clap(long, default_value = "overlay")]
    overlay_class: String,

    /// Overlay position as x,y in logical pixels
    #[clap(long, default_value = "0,0")]
    overlay_at: String,

    /// Path to the output PNG file
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Directory receiving <character>-<id>.png
    #[clap(long)]
    download_dir: Option<PathBuf>,

    /// Print the sampled adaptive colors as JSON
    #[clap(long)]
    print_colors: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::new();
    match verbose {
        0 => match std::env::var("RUST_LOG") {
            Ok(filter) => {
                builder.parse_filters(&filter);
            }
            Err(_) => {
                builder.filter_level(LevelFilter::Warn);
            }
        },
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        2 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

fn parse_offset(value: &str) -> anyhow::Result<Offset> {
    let Some((x, y)) = value.split_once(',') else {
        bail!("expected x,y but got {value:?}");
    };
    Ok(Offset::new(
        x.trim().parse().with_context(|| format!("invalid x in {value:?}"))?,
        y.trim().parse().with_context(|| format!("invalid y in {value:?}"))?,
    ))
}

fn stops_to_json(stops: &[ColorStop]) -> serde_json::Value {
    stops
        .iter()
        .map(|stop| serde_json::json!({ "offset": stop.offset, "color": stop.color.to_hex() }))
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => CardConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => CardConfig::default(),
    };
    if let Some(asset_base) = &args.asset_base {
        config.asset_base = asset_base.clone();
    }
    let density = config.viewport.pixel_density;

    let background = match (args.element, &args.namecard) {
        (_, Some(url)) => BackgroundChoice::Namecard { url: url.clone() },
        (Some(element), None) => BackgroundChoice::Element(element),
        (None, None) => bail!("either --element or --namecard is required"),
    };

    let character = CharacterInfo {
        name: args.character.clone(),
        id: args.id.clone(),
        game_art_url: args.portrait.clone(),
    };
    let mut card = Card::new(config, character, background, DeviceClass::Mouse, None)
        .context("invalid card configuration")?;

    match args.portrait_kind {
        PortraitKind::Game => {}
        PortraitKind::Custom => card.set_portrait(PortraitSource::CustomUrl(args.portrait.clone())),
        PortraitKind::Upload => {
            let bytes = std::fs::read(&args.portrait)
                .with_context(|| format!("failed to read portrait {}", args.portrait))?;
            card.set_user_upload(&bytes)
                .context("failed to prepare uploaded portrait")?;
        }
    }
    card.set_adaptive_tint(args.adaptive);
    card.set_transform(TransformState {
        zoom: args.zoom,
        pan: match (args.pan_x, args.pan_y) {
            (Some(x), Some(y)) => Some(Offset::new(x, y)),
            _ => None,
        },
    });

    let outcome = card.load().await.context("failed to load card images")?;
    if let Some(outcome) = outcome {
        info!("Portrait placed at {:?}", outcome.placement);
    }

    let mut overlay = Overlay::new();
    if let Some(path) = &args.overlay_svg {
        let svg = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read overlay {}", path.display()))?;
        let at = parse_offset(&args.overlay_at)?;
        overlay.push(OverlayElement::from_svg(&args.overlay_class, at, &svg, density)?);
    }

    if let Some(output) = &args.output {
        let png = card.snapshot(&mut overlay)?;
        std::fs::write(output, png)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!("Wrote card to {}", output.display());
    }
    if let Some(dir) = &args.download_dir {
        let path = card.download(&mut overlay, dir)?;
        println!("{}", path.display());
    }

    if args.print_colors {
        let colors = match card.adaptive_colors() {
            Some(colors) => serde_json::json!({
                "solid": stops_to_json(&colors.solid),
                "translucent": stops_to_json(&colors.translucent),
            }),
            None => serde_json::Value::Null,
        };
        println!("{}", serde_json::to_string_pretty(&colors)?);
    }
    Ok(())
}
