use std::path::PathBuf;

use clap::Parser;
use toypass::{ChannelDesc, Filter, Wrap, CHANNEL_COUNT};

#[derive(Parser, Debug)]
#[command(
    name = "toypass",
    author,
    version,
    about = "Renders a Shadertoy-style fragment shader offscreen",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Fragment shader file defining `mainImage`.
    #[arg(value_name = "SHADER")]
    pub shader: Option<PathBuf>,

    /// Restore the unit from a previously saved JSON description.
    #[arg(long, value_name = "FILE", conflicts_with = "shader")]
    pub describe: Option<PathBuf>,

    /// Render resolution (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "1280x720")]
    pub size: (u32, u32),

    /// Bind an image to a channel: `INDEX:PATH[:FILTER[:WRAP[:srgb]]]`.
    /// FILTER is `nearest`, `linear`, or `mipmap`; WRAP is `repeat` or `clamp`.
    #[arg(long = "channel", value_name = "SPEC", value_parser = parse_channel)]
    pub channels: Vec<ChannelArg>,

    /// Number of frames to render before exiting.
    #[arg(long, value_name = "COUNT", default_value_t = 60)]
    pub frames: u32,

    /// Fixed frame rate; unpaced when omitted.
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Write the final frame as a PNG.
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Persist the unit description as JSON after the run.
    #[arg(long, value_name = "PATH")]
    pub save_state: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ChannelArg {
    pub index: usize,
    pub desc: ChannelDesc,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width `{width}`"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height `{height}`"))?;
    if width == 0 || height == 0 {
        return Err("render size must be non-zero".to_string());
    }
    Ok((width, height))
}

pub fn parse_channel(value: &str) -> Result<ChannelArg, String> {
    let mut parts = value.splitn(5, ':');
    let index = parts
        .next()
        .ok_or_else(|| "empty channel spec".to_string())?;
    let index: usize = index
        .parse()
        .map_err(|_| format!("invalid channel index `{index}`"))?;
    if index >= CHANNEL_COUNT {
        return Err(format!(
            "channel index {index} out of range (0-{})",
            CHANNEL_COUNT - 1
        ));
    }

    let path = parts
        .next()
        .filter(|path| !path.is_empty())
        .ok_or_else(|| "channel spec is missing an image path".to_string())?;
    let mut desc = ChannelDesc::new(path);

    if let Some(filter) = parts.next() {
        desc.filter =
            Filter::parse(filter).ok_or_else(|| format!("unknown filter `{filter}`"))?;
    }
    if let Some(wrap) = parts.next() {
        desc.wrap = Wrap::parse(wrap).ok_or_else(|| format!("unknown wrap mode `{wrap}`"))?;
    }
    if let Some(flag) = parts.next() {
        match flag {
            "srgb" => desc.srgb = true,
            "" => {}
            other => return Err(format!("unknown channel flag `{other}`")),
        }
    }

    Ok(ChannelArg { index, desc })
}
