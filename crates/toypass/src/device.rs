//! Seam between the pass core and the host graphics API.
//!
//! The core never touches a GPU directly; it drives an implementation of
//! [`RenderDevice`] and owns the opaque handles it gets back. Handles are
//! plain ids so the trait stays object-safe and mockable in tests.

use std::path::Path;

use crate::error::PassError;

/// A pass exposes four optional input channels (`iChannel0-3`).
pub const CHANNEL_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Point,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Wrap,
    Clamp,
}

/// Fully resolved sampling configuration; the same addressing mode applies
/// to every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mip_filter: FilterMode,
    pub address: AddressMode,
}

/// Texture dimensionality of a channel resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureShape {
    Texture2d,
    Cube,
}

/// RGBA8 pixel payload handed to the device for texture creation.
#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    pub width: u32,
    pub height: u32,
    pub shape: TextureShape,
    pub srgb: bool,
    pub generate_mips: bool,
    /// Tightly packed RGBA8 rows; for cubes, six faces concatenated in
    /// face order with no padding between faces.
    pub pixels: &'a [u8],
}

/// Per-draw uniform payloads keyed by name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i64),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

/// Host graphics capabilities consumed by the pass core.
///
/// All resource handles returned here are exclusively owned by the caller
/// and must be returned through the matching `destroy_*` call.
pub trait RenderDevice {
    /// Compiles the full-screen program for the fragment source at
    /// `fragment`. `channel_shapes` fixes the texture dimensionality of
    /// the four channel bindings for this program.
    fn compile_program(
        &mut self,
        fragment: &Path,
        channel_shapes: &[TextureShape; CHANNEL_COUNT],
    ) -> Result<ProgramHandle, PassError>;

    fn destroy_program(&mut self, program: ProgramHandle);

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureHandle, PassError>;

    fn destroy_texture(&mut self, texture: TextureHandle);

    fn create_sampler(&mut self, desc: &SamplerDesc) -> SamplerHandle;

    fn destroy_sampler(&mut self, sampler: SamplerHandle);

    /// Reports whether `program` declares a uniform named `name`.
    fn has_uniform(&self, program: ProgramHandle, name: &str) -> bool;

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue);

    fn bind_texture(&mut self, program: ProgramHandle, name: &str, texture: TextureHandle);

    fn bind_sampler(&mut self, program: ProgramHandle, name: &str, sampler: SamplerHandle);

    fn clear_target(&mut self, color: [f32; 4], depth: f32, stencil: u8);

    /// Issues the single full-screen draw for `program` into the current
    /// render target.
    fn draw_fullscreen(&mut self, program: ProgramHandle);
}
