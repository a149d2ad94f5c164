use clap::Parser;
use eval_plots::{render_curves, MetricSummary};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "plot_metrics",
    about = "Render PSNR/SSIM evaluation curves from precomputed CSV summaries"
)]
struct Args {
    /// Per-timestep PSNR summary CSV.
    #[arg(long, default_value = "results/psnr_all.csv")]
    psnr: PathBuf,
    /// Per-timestep SSIM summary CSV.
    #[arg(long, default_value = "results/ssim_all.csv")]
    ssim: PathBuf,
    /// Output image path.
    #[arg(long, default_value = "all.png")]
    out: PathBuf,
    /// Output image width in pixels.
    #[arg(long, default_value_t = 1600)]
    width: u32,
    /// Output image height in pixels.
    #[arg(long, default_value_t = 500)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let psnr = MetricSummary::from_csv("PSNR", &args.psnr)?;
    let ssim = MetricSummary::from_csv("SSIM", &args.ssim)?;
    render_curves(&psnr, &ssim, &args.out, (args.width, args.height))
        .map_err(|e| anyhow::anyhow!("failed to render {}: {e}", args.out.display()))?;
    println!("Wrote {}", args.out.display());
    Ok(())
}
