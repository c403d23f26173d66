//! Channel texture loading, including cubemap detection by filename
//! convention.
//!
//! A path like `sky.png` is probed for sibling faces `sky_1.png` through
//! `sky_5.png`; when all five exist the set is decoded as a six-face cube,
//! otherwise the base image loads as a plain 2D texture. Face consistency
//! is validated before anything touches the device, so a rejected load
//! never leaves a partially constructed GPU resource behind.

use std::path::{Path, PathBuf};

use image::GenericImageView;

use crate::device::{
    AddressMode, FilterMode, RenderDevice, SamplerDesc, SamplerHandle, TextureHandle,
    TextureShape, TextureUpload,
};
use crate::error::PassError;
use crate::props::Properties;

/// Number of derived face paths probed beyond the base image.
const EXTRA_FACE_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
    Mipmap,
}

impl Filter {
    pub fn name(self) -> &'static str {
        match self {
            Filter::Nearest => "nearest",
            Filter::Linear => "linear",
            Filter::Mipmap => "mipmap",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "nearest" => Some(Filter::Nearest),
            "linear" => Some(Filter::Linear),
            "mipmap" => Some(Filter::Mipmap),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    Clamp,
}

impl Wrap {
    pub fn name(self) -> &'static str {
        match self {
            Wrap::Repeat => "repeat",
            Wrap::Clamp => "clamp",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "repeat" => Some(Wrap::Repeat),
            "clamp" => Some(Wrap::Clamp),
            _ => None,
        }
    }
}

/// Everything needed to (re)create a channel texture from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDesc {
    pub path: PathBuf,
    pub filter: Filter,
    pub wrap: Wrap,
    pub srgb: bool,
}

impl ChannelDesc {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filter: Filter::default(),
            wrap: Wrap::default(),
            srgb: false,
        }
    }

    pub fn to_props(&self) -> Properties {
        let mut props = Properties::new();
        props.set("path", self.path.to_string_lossy().into_owned());
        props.set("filter", self.filter.name());
        props.set("wrap", self.wrap.name());
        props.set("srgb", self.srgb);
        props
    }

    /// Rebuilds a descriptor from a property table; `path` is mandatory,
    /// everything else falls back to defaults.
    pub fn from_props(props: &Properties) -> Option<Self> {
        let path: PathBuf = props.try_get("path")?;
        let filter = props
            .try_get::<String>("filter")
            .and_then(|name| Filter::parse(&name))
            .unwrap_or_default();
        let wrap = props
            .try_get::<String>("wrap")
            .and_then(|name| Wrap::parse(&name))
            .unwrap_or_default();
        Some(Self {
            path,
            filter,
            wrap,
            srgb: props.get("srgb", false),
        })
    }
}

/// One loaded channel image (2D or cube) plus its sampling configuration.
///
/// Immutable after construction; a changed source is expressed by loading
/// a replacement and releasing this one.
#[derive(Debug)]
pub struct ChannelTexture {
    source_path: PathBuf,
    filter: Filter,
    wrap: Wrap,
    srgb: bool,
    shape: TextureShape,
    width: u32,
    height: u32,
    texture: TextureHandle,
    sampler: SamplerHandle,
}

impl ChannelTexture {
    /// Decodes the image (or six-face set) behind `desc` and creates the
    /// GPU texture and sampler. Fails without side effects: handles are
    /// only created after every required face decoded and validated.
    pub fn load(device: &mut dyn RenderDevice, desc: &ChannelDesc) -> Result<Self, PassError> {
        if !desc.path.exists() {
            return Err(PassError::PathNotFound(desc.path.clone()));
        }

        let decoded = match probe_cubemap_faces(&desc.path) {
            Some(faces) => decode_cube(&desc.path, &faces)?,
            None => decode_2d(&desc.path)?,
        };

        let generate_mips =
            decoded.shape == TextureShape::Texture2d && desc.filter == Filter::Mipmap;
        let texture = device.create_texture(&TextureUpload {
            width: decoded.width,
            height: decoded.height,
            shape: decoded.shape,
            srgb: desc.srgb,
            generate_mips,
            pixels: &decoded.pixels,
        })?;
        let sampler = device.create_sampler(&sampler_desc(desc.filter, desc.wrap));

        tracing::debug!(
            path = %desc.path.display(),
            shape = ?decoded.shape,
            width = decoded.width,
            height = decoded.height,
            "channel texture loaded"
        );

        Ok(Self {
            source_path: desc.path.clone(),
            filter: desc.filter,
            wrap: desc.wrap,
            srgb: desc.srgb,
            shape: decoded.shape,
            width: decoded.width,
            height: decoded.height,
            texture,
            sampler,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn wrap(&self) -> Wrap {
        self.wrap
    }

    pub fn is_srgb(&self) -> bool {
        self.srgb
    }

    pub fn shape(&self) -> TextureShape {
        self.shape
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn sampler(&self) -> SamplerHandle {
        self.sampler
    }

    /// The descriptor this texture was created from, for persistence.
    pub fn describe(&self) -> ChannelDesc {
        ChannelDesc {
            path: self.source_path.clone(),
            filter: self.filter,
            wrap: self.wrap,
            srgb: self.srgb,
        }
    }

    /// Returns both handles to the device. Consumes the resource so a
    /// released texture can never be rebound.
    pub fn release(self, device: &mut dyn RenderDevice) {
        device.destroy_texture(self.texture);
        device.destroy_sampler(self.sampler);
    }
}

/// Maps the user-facing filter/wrap pair onto a concrete sampler
/// configuration. `Linear` keeps the mip filter at point because no mip
/// chain exists for that mode.
pub fn sampler_desc(filter: Filter, wrap: Wrap) -> SamplerDesc {
    let (min_filter, mag_filter, mip_filter) = match filter {
        Filter::Nearest => (FilterMode::Point, FilterMode::Point, FilterMode::Point),
        Filter::Linear => (FilterMode::Linear, FilterMode::Linear, FilterMode::Point),
        Filter::Mipmap => (FilterMode::Linear, FilterMode::Linear, FilterMode::Linear),
    };
    let address = match wrap {
        Wrap::Repeat => AddressMode::Wrap,
        Wrap::Clamp => AddressMode::Clamp,
    };
    SamplerDesc {
        min_filter,
        mag_filter,
        mip_filter,
        address,
    }
}

struct DecodedPixels {
    width: u32,
    height: u32,
    shape: TextureShape,
    pixels: Vec<u8>,
}

fn decode_2d(path: &Path) -> Result<DecodedPixels, PassError> {
    let (width, height, _, pixels) = decode_face(path)?;
    Ok(DecodedPixels {
        width,
        height,
        shape: TextureShape::Texture2d,
        pixels: pixels.into_raw(),
    })
}

fn decode_cube(
    base: &Path,
    faces: &[PathBuf; EXTRA_FACE_COUNT],
) -> Result<DecodedPixels, PassError> {
    let (width, height, color, first) = decode_face(base)?;
    let face_bytes = first.len();
    let mut pixels = Vec::with_capacity(face_bytes * 6);
    pixels.extend_from_slice(&first);

    for face_path in faces {
        let (face_width, face_height, face_color, face) = decode_face(face_path)?;
        if face_width != width || face_height != height {
            return Err(PassError::FormatMismatch(format!(
                "{} is {}x{}, but {} is {}x{}",
                face_path.display(),
                face_width,
                face_height,
                base.display(),
                width,
                height
            )));
        }
        if face_color != color {
            return Err(PassError::FormatMismatch(format!(
                "{} decodes as {:?}, but {} decodes as {:?}",
                face_path.display(),
                face_color,
                base.display(),
                color
            )));
        }
        pixels.extend_from_slice(&face);
    }

    Ok(DecodedPixels {
        width,
        height,
        shape: TextureShape::Cube,
        pixels,
    })
}

fn decode_face(
    path: &Path,
) -> Result<(u32, u32, image::ColorType, image::RgbaImage), PassError> {
    let decoded = image::open(path).map_err(|err| PassError::DecodeError {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let (width, height) = decoded.dimensions();
    Ok((width, height, decoded.color(), decoded.to_rgba8()))
}

/// Returns the derived face paths 1-5 when every one of them exists next
/// to the base image; `None` means the path loads as a plain 2D texture.
fn probe_cubemap_faces(path: &Path) -> Option<[PathBuf; EXTRA_FACE_COUNT]> {
    let faces: [PathBuf; EXTRA_FACE_COUNT] =
        std::array::from_fn(|index| face_path(path, index as u32 + 1));
    if faces.iter().all(|face| face.exists()) {
        Some(faces)
    } else {
        None
    }
}

/// Face `index` lives next to the base image with `_<index>` inserted
/// ahead of the extension (`sky.png` → `sky_1.png`); with no extension the
/// suffix is simply appended.
fn face_path(path: &Path, index: u32) -> PathBuf {
    let name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
    let face_name = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{stem}_{index}.{extension}"),
        _ => format!("{name}_{index}"),
    };
    path.with_file_name(face_name)
}
