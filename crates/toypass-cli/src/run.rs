use std::fs;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use toypass::{Properties, ShaderUnit, UnitState};
use toypass_wgpu::WgpuDevice;

use crate::cli::Cli;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(args: Cli) -> Result<()> {
    let (width, height) = args.size;
    let mut device = WgpuDevice::new(width, height)?;

    let mut unit = match &args.describe {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read description {}", path.display()))?;
            let props: Properties = serde_json::from_str(&text)
                .with_context(|| format!("invalid description JSON in {}", path.display()))?;
            ShaderUnit::from_props(&mut device, &props)
        }
        None => ShaderUnit::new(),
    };

    if let Some(shader) = &args.shader {
        unit.set_shader_path(shader);
    }
    for channel in &args.channels {
        if let Err(err) = unit.load_channel(&mut device, channel.index, &channel.desc) {
            tracing::warn!(
                channel = channel.index,
                error = %err,
                "failed to load channel image"
            );
        }
    }

    unit.inputs_mut()
        .set_resolution([width as f32, height as f32, 1.0]);
    if let Some(fps) = args.fps {
        unit.inputs_mut().set_frame_rate(fps.max(1.0));
    }
    let frame_budget = args
        .fps
        .map(|fps| Duration::from_secs_f32(1.0 / fps.max(1.0)));

    let start = Instant::now();
    let mut last_frame = start;
    for index in 0..args.frames {
        let now = Instant::now();
        unit.inputs_mut()
            .set_time(now.duration_since(start).as_secs_f32());
        unit.inputs_mut()
            .set_time_delta(now.duration_since(last_frame).as_secs_f32());
        unit.inputs_mut().set_frame(i64::from(index));
        last_frame = now;

        unit.tick(&mut device);
        if unit.state() == UnitState::Failed {
            break;
        }

        if let Some(budget) = frame_budget {
            let elapsed = now.elapsed();
            if elapsed < budget {
                std::thread::sleep(budget - elapsed);
            }
        }
    }

    if let Some(path) = &args.save_state {
        let json = serde_json::to_string_pretty(&unit.to_props())
            .context("failed to serialize unit state")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write state to {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved unit state");
    }

    if unit.state() == UnitState::Failed {
        let shader_path = unit.shader_path().to_path_buf();
        unit.release(&mut device);
        bail!("shader failed to load: {}", shader_path.display());
    }

    if let Some(path) = &args.snapshot {
        let pixels = device.read_target()?;
        image::save_buffer(path, &pixels, width, height, image::ExtendedColorType::Rgba8)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote snapshot");
    }

    unit.release(&mut device);
    Ok(())
}
