use crate::board;
use crate::config::AppConfig;
use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;
use stratboard_core::export::{self, ExportOptions, ExportRegion};
use stratboard_core::{BoardDocument, NodeId, Persistence, Storage};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Project id
    pub project: String,
    /// Write a PNG to this path (defaults to a name derived from the board)
    #[arg(long)]
    pub png: Option<PathBuf>,
    /// Write a Markdown outline to this path, or `-` for stdout
    #[arg(long)]
    pub text: Option<String>,
    /// Export only this node
    #[arg(long, conflicts_with = "visible")]
    pub node: Option<String>,
    /// Export what the configured viewport shows
    #[arg(long)]
    pub visible: bool,
    /// Pixels per board unit
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
}

impl ExportArgs {
    fn region(&self, config: &AppConfig, camera: &stratboard_core::Camera) -> ExportRegion {
        match (&self.node, self.visible) {
            (Some(node), _) => ExportRegion::Node(NodeId::from(node.as_str())),
            (None, true) => ExportRegion::Visible {
                camera: camera.clone(),
                viewport: config.viewport(),
            },
            (None, false) => ExportRegion::default(),
        }
    }
}

fn write_png(doc: &BoardDocument, region: &ExportRegion, scale: f64, path: PathBuf) -> Result<()> {
    if !(scale.is_finite() && scale > 0.0) {
        bail!("scale must be a positive number");
    }
    let options = ExportOptions {
        scale,
        ..Default::default()
    };
    let bytes = export::render_png(doc, region, &options)?;
    std::fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn write_text(doc: &BoardDocument, target: &str) -> Result<()> {
    let outline = export::export_text(doc);
    if target == "-" {
        print!("{}", outline);
    } else {
        std::fs::write(target, outline).with_context(|| format!("writing {}", target))?;
        println!("Wrote {}", target);
    }
    Ok(())
}

pub async fn run<S: Storage>(persistence: Persistence<S>, args: &ExportArgs, config: &AppConfig) -> Result<()> {
    let session = board::open(persistence, &args.project, config).await?;
    let doc = session.store().document();

    if let Some(target) = &args.text {
        write_text(doc, target)?;
    }
    if args.png.is_some() || args.text.is_none() {
        let region = args.region(config, session.store().camera());
        let path = args
            .png
            .clone()
            .unwrap_or_else(|| PathBuf::from(export::export_filename(doc, &region)));
        write_png(doc, &region, args.scale, path)?;
    }
    Ok(())
}
