use std::collections::HashSet;
use std::path::{Path, PathBuf};

use toypass::{
    PassError, ProgramHandle, RenderDevice, SamplerDesc, SamplerHandle, TextureHandle,
    TextureShape, TextureUpload, UniformValue, CHANNEL_COUNT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRecord {
    pub width: u32,
    pub height: u32,
    pub shape: TextureShape,
    pub srgb: bool,
    pub generate_mips: bool,
    pub byte_len: usize,
}

/// Records every device call the pass core makes, with injectable compile
/// failures and a configurable set of declared uniforms.
#[derive(Default)]
pub struct RecordingDevice {
    next_id: u64,
    pub fail_compile_with: Option<String>,
    /// `None` means every uniform name is declared.
    pub declared_uniforms: Option<HashSet<String>>,
    pub compile_requests: Vec<PathBuf>,
    pub compiled_shapes: Vec<[TextureShape; CHANNEL_COUNT]>,
    pub live_programs: HashSet<u64>,
    pub live_textures: HashSet<u64>,
    pub live_samplers: HashSet<u64>,
    pub uploads: Vec<UploadRecord>,
    pub sampler_descs: Vec<SamplerDesc>,
    pub uniform_uploads: Vec<(String, UniformValue)>,
    pub texture_binds: Vec<(ProgramHandle, String, TextureHandle)>,
    pub sampler_binds: Vec<(ProgramHandle, String, SamplerHandle)>,
    pub clears: Vec<([f32; 4], f32, u8)>,
    pub draws: Vec<ProgramHandle>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderDevice for RecordingDevice {
    fn compile_program(
        &mut self,
        fragment: &Path,
        channel_shapes: &[TextureShape; CHANNEL_COUNT],
    ) -> Result<ProgramHandle, PassError> {
        self.compile_requests.push(fragment.to_path_buf());
        self.compiled_shapes.push(*channel_shapes);
        if let Some(message) = &self.fail_compile_with {
            return Err(PassError::CompileFailure(message.clone()));
        }
        let id = self.next_id();
        self.live_programs.insert(id);
        Ok(ProgramHandle(id))
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        assert!(
            self.live_programs.remove(&program.0),
            "destroyed a program that was not live"
        );
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureHandle, PassError> {
        self.uploads.push(UploadRecord {
            width: upload.width,
            height: upload.height,
            shape: upload.shape,
            srgb: upload.srgb,
            generate_mips: upload.generate_mips,
            byte_len: upload.pixels.len(),
        });
        let id = self.next_id();
        self.live_textures.insert(id);
        Ok(TextureHandle(id))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        assert!(
            self.live_textures.remove(&texture.0),
            "destroyed a texture that was not live"
        );
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> SamplerHandle {
        self.sampler_descs.push(*desc);
        let id = self.next_id();
        self.live_samplers.insert(id);
        SamplerHandle(id)
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        assert!(
            self.live_samplers.remove(&sampler.0),
            "destroyed a sampler that was not live"
        );
    }

    fn has_uniform(&self, _program: ProgramHandle, name: &str) -> bool {
        self.declared_uniforms
            .as_ref()
            .map_or(true, |declared| declared.contains(name))
    }

    fn set_uniform(&mut self, _program: ProgramHandle, name: &str, value: UniformValue) {
        self.uniform_uploads.push((name.to_string(), value));
    }

    fn bind_texture(&mut self, program: ProgramHandle, name: &str, texture: TextureHandle) {
        self.texture_binds.push((program, name.to_string(), texture));
    }

    fn bind_sampler(&mut self, program: ProgramHandle, name: &str, sampler: SamplerHandle) {
        self.sampler_binds.push((program, name.to_string(), sampler));
    }

    fn clear_target(&mut self, color: [f32; 4], depth: f32, stencil: u8) {
        self.clears.push((color, depth, stencil));
    }

    fn draw_fullscreen(&mut self, program: ProgramHandle) {
        self.draws.push(program);
    }
}

/// Writes a solid-color RGBA PNG fixture.
pub fn write_rgba_png(path: &Path, width: u32, height: u32, rgba: [u8; 4]) {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    image.save(path).expect("failed to write png fixture");
}

/// Writes a grayscale PNG, which decodes with a different source pixel
/// format than the RGBA fixtures.
pub fn write_gray_png(path: &Path, width: u32, height: u32, luma: u8) {
    let image = image::GrayImage::from_pixel(width, height, image::Luma([luma]));
    image.save(path).expect("failed to write png fixture");
}
