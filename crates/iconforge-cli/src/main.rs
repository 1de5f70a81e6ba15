//! Command-line batch exporter.
//!
//! Renders a built-in catalog of demo objects to PNG icons. Mostly a
//! driver for `iconforge-engine`: submit, tick until done, report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use iconforge_engine::device::{Gpu, GpuInit};
use iconforge_engine::export::{BATCH_SIZE, ExportRequest, ExportSize, Exporter, SessionState};
use iconforge_engine::object::{IconObject, LightingProfile, ObjectId};
use iconforge_engine::render::mesh::IconMesh;

struct Options {
    directory: PathBuf,
    size: ExportSize,
    count: usize,
}

impl Options {
    fn parse() -> anyhow::Result<Self> {
        let mut options = Self {
            directory: PathBuf::from("item_exports"),
            size: ExportSize::default(),
            count: 64,
        };
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out" => {
                    let dir = args.next().context("--out needs a directory")?;
                    options.directory = PathBuf::from(dir);
                }
                "--size" => {
                    let edge: u32 = args
                        .next()
                        .context("--size needs a pixel edge")?
                        .parse()
                        .context("--size must be a number")?;
                    options.size = ExportSize::try_from(edge)?;
                }
                "--count" => {
                    options.count = args
                        .next()
                        .context("--count needs a number")?
                        .parse()
                        .context("--count must be a number")?;
                }
                "--help" | "-h" => {
                    println!("usage: iconforge [--out DIR] [--size EDGE] [--count N]");
                    println!("  --out DIR    output directory (default: item_exports)");
                    println!("  --size EDGE  icon edge in pixels: 16|32|64|128|256|512|1024");
                    println!("  --count N    number of demo objects to export (default: 64)");
                    std::process::exit(0);
                }
                other => bail!("unknown argument: {other}"),
            }
        }
        Ok(options)
    }
}

/// Demo catalog alternating flat sprites and shaded cubes, with the odd
/// empty mesh mixed in to exercise the skip path.
fn sample_catalog(count: usize) -> Vec<IconObject> {
    (0..count)
        .map(|n| {
            let hue = n as f32 / count.max(1) as f32;
            let color = [
                0.5 + 0.5 * (hue * std::f32::consts::TAU).cos(),
                0.5 + 0.5 * ((hue + 1.0 / 3.0) * std::f32::consts::TAU).cos(),
                0.5 + 0.5 * ((hue + 2.0 / 3.0) * std::f32::consts::TAU).cos(),
                1.0,
            ];
            if n % 17 == 9 {
                IconObject::new(
                    ObjectId::new("demo", format!("ghost_{n:03}")),
                    IconMesh::default(),
                    LightingProfile::Flat,
                )
            } else if n % 2 == 0 {
                IconObject::new(
                    ObjectId::new("demo", format!("sprite_{n:03}")),
                    IconMesh::sprite_quad(color),
                    LightingProfile::Flat,
                )
            } else {
                IconObject::new(
                    ObjectId::new("demo", format!("cube_{n:03}")),
                    IconMesh::cube(color),
                    LightingProfile::Shaded,
                )
            }
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    iconforge_engine::logging::init_logging(Default::default());

    let options = Options::parse()?;
    let objects = sample_catalog(options.count);
    let total = objects.len();

    let gpu = Arc::new(Gpu::new_blocking(GpuInit::default())?);
    let mut exporter = Exporter::new(gpu);

    exporter.submit(ExportRequest {
        directory: options.directory.clone(),
        size: options.size,
        objects,
    })?;

    let mut last_reported = 0;
    while exporter.tick(BATCH_SIZE) {
        let (completed, _) = exporter.progress();
        if completed != last_reported {
            log::info!("progress: {completed}/{total}");
            last_reported = completed;
        } else {
            // No forward progress since the last poll: only captures or
            // writes remain, so pace the loop instead of spinning on tick.
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
    }

    let (completed, _) = exporter.progress();
    let failed = exporter.failed();
    match exporter.state() {
        SessionState::Completed => {
            println!(
                "exported {completed} icons to {}",
                options.directory.display()
            );
        }
        SessionState::CompletedWithErrors => {
            println!(
                "exported {} icons to {} ({} failed)",
                completed - failed.len(),
                options.directory.display(),
                failed.len()
            );
            for id in &failed {
                println!("  failed: {id}");
            }
        }
        state => println!("export ended in state {state:?}"),
    }
    exporter.close();

    if failed.is_empty() {
        Ok(())
    } else {
        bail!("{} objects failed", failed.len())
    }
}
