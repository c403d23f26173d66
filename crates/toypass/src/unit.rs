//! The hot-reloadable full-screen shader unit.
//!
//! A `ShaderUnit` owns at most one compiled program, up to four channel
//! textures, and the per-frame input block. Shader or channel changes are
//! applied lazily: setters only mark state dirty, and `tick` processes at
//! most one reload before the draw it issues. A failed compile parks the
//! unit in a quiet `Failed` state (no draws, no retries) until the path
//! changes again, so a broken shader on disk never spins the render loop.

use std::path::{Path, PathBuf};

use crate::device::{ProgramHandle, RenderDevice, TextureShape, CHANNEL_COUNT};
use crate::error::PassError;
use crate::inputs::ShaderInputs;
use crate::props::Properties;
use crate::texture::{ChannelDesc, ChannelTexture};

/// Channel `i` binds its texture as `iChannel<i>`...
pub const CHANNEL_UNIFORM_PREFIX: &str = "iChannel";
/// ...and its sampler as `iChannel<i>_sampler`.
pub const CHANNEL_SAMPLER_SUFFIX: &str = "_sampler";

/// Sentinel color the output target is cleared to before every draw.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

const KEY_SHADER_PATH: &str = "shaderPath";
const KEY_SHADER_INPUTS: &str = "shaderInputs";
const KEY_SHADER_LOADED: &str = "shaderLoaded";

fn channel_key(channel: usize) -> String {
    format!("channel{channel}")
}

/// Observable lifecycle of a unit. Compilation is synchronous, so there is
/// no externally visible in-flight state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// No reload has been processed yet.
    Uninitialized,
    /// The current program compiled and is safe to execute.
    Ready,
    /// The last reload attempt failed; frames are skipped until the next
    /// successful reload.
    Failed,
}

pub struct ShaderUnit {
    shader_path: PathBuf,
    program: Option<ProgramHandle>,
    compiled_ok: bool,
    pending_reload: bool,
    reload_attempted: bool,
    /// Channel shapes baked into the live program; meaningful only while
    /// `compiled_ok` is set.
    compiled_shapes: [TextureShape; CHANNEL_COUNT],
    channels: [Option<ChannelTexture>; CHANNEL_COUNT],
    inputs: ShaderInputs,
}

impl Default for ShaderUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderUnit {
    pub fn new() -> Self {
        Self {
            shader_path: PathBuf::new(),
            program: None,
            compiled_ok: false,
            pending_reload: false,
            reload_attempted: false,
            compiled_shapes: [TextureShape::Texture2d; CHANNEL_COUNT],
            channels: std::array::from_fn(|_| None),
            inputs: ShaderInputs::default(),
        }
    }

    pub fn with_shader_path(path: impl Into<PathBuf>) -> Self {
        let mut unit = Self::new();
        unit.set_shader_path(path);
        unit
    }

    /// Rebuilds a unit from the persisted property layout. Channel loads
    /// happen here; the shader compile is queued for the first `tick`.
    /// A channel that fails to load is reported once and left unbound.
    pub fn from_props(device: &mut dyn RenderDevice, props: &Properties) -> Self {
        let mut unit = Self::new();
        let path: String = props.get(KEY_SHADER_PATH, String::new());
        if !path.is_empty() {
            unit.set_shader_path(path);
        }
        if let Some(inputs) = props.try_get::<Properties>(KEY_SHADER_INPUTS) {
            unit.inputs = ShaderInputs::from_props(&inputs);
        }
        for channel in 0..CHANNEL_COUNT {
            let Some(table) = props.try_get::<Properties>(&channel_key(channel)) else {
                continue;
            };
            let Some(desc) = ChannelDesc::from_props(&table) else {
                tracing::warn!(channel, "channel descriptor has no path; ignored");
                continue;
            };
            if let Err(error) = unit.load_channel(device, channel, &desc) {
                tracing::error!(
                    channel,
                    path = %desc.path.display(),
                    %error,
                    "failed to load channel texture"
                );
            }
        }
        unit
    }

    /// Externalizes the unit as `{shaderPath, shaderInputs, shaderLoaded,
    /// channel0..3}` for save/restore.
    pub fn to_props(&self) -> Properties {
        let mut props = Properties::new();
        props.set(KEY_SHADER_PATH, self.shader_path.to_string_lossy().into_owned());
        props.set(KEY_SHADER_INPUTS, self.inputs.to_props());
        props.set(KEY_SHADER_LOADED, self.compiled_ok);
        for (channel, slot) in self.channels.iter().enumerate() {
            if let Some(texture) = slot {
                props.set(channel_key(channel), texture.describe().to_props());
            }
        }
        props
    }

    pub fn shader_path(&self) -> &Path {
        &self.shader_path
    }

    /// Stores a new shader path and queues a reload for the next tick.
    /// Setting the path it already holds is a no-op, so repeated calls
    /// cannot trigger repeated compiles.
    pub fn set_shader_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if path == self.shader_path {
            return;
        }
        self.shader_path = path;
        self.pending_reload = true;
    }

    pub fn inputs(&self) -> &ShaderInputs {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut ShaderInputs {
        &mut self.inputs
    }

    pub fn shader_loaded(&self) -> bool {
        self.compiled_ok
    }

    pub fn pending_reload(&self) -> bool {
        self.pending_reload
    }

    pub fn state(&self) -> UnitState {
        if self.compiled_ok {
            UnitState::Ready
        } else if self.reload_attempted {
            UnitState::Failed
        } else {
            UnitState::Uninitialized
        }
    }

    pub fn channel(&self, channel: usize) -> Option<&ChannelTexture> {
        self.channels.get(channel).and_then(Option::as_ref)
    }

    /// Loads `desc` from disk and binds it to `channel`. On failure the
    /// previous binding, if any, is retained and the error is reported
    /// once rather than every frame.
    pub fn load_channel(
        &mut self,
        device: &mut dyn RenderDevice,
        channel: usize,
        desc: &ChannelDesc,
    ) -> Result<(), PassError> {
        if channel >= CHANNEL_COUNT {
            tracing::warn!(channel, "channel load ignored; index out of range");
            return Err(PassError::InvalidChannel(channel));
        }
        let texture = ChannelTexture::load(device, desc)?;
        self.set_texture(device, channel, texture)
    }

    /// Binds an already-loaded texture to `channel`, releasing whatever it
    /// replaces. If a compiled program is live and the texture matches the
    /// shape the program was compiled with, it is rebound immediately;
    /// otherwise a recompile is queued so the new shape is applied before
    /// the next draw.
    pub fn set_texture(
        &mut self,
        device: &mut dyn RenderDevice,
        channel: usize,
        texture: ChannelTexture,
    ) -> Result<(), PassError> {
        if channel >= CHANNEL_COUNT {
            tracing::warn!(channel, "texture bind ignored; index out of range");
            texture.release(device);
            return Err(PassError::InvalidChannel(channel));
        }
        if let Some(previous) = std::mem::replace(&mut self.channels[channel], Some(texture)) {
            previous.release(device);
        }
        if self.compiled_ok {
            if let (Some(program), Some(texture)) = (self.program, self.channels[channel].as_ref())
            {
                if texture.shape() == self.compiled_shapes[channel] {
                    bind_channel(device, program, channel, texture);
                } else {
                    tracing::debug!(
                        channel,
                        shape = ?texture.shape(),
                        "channel shape changed; queueing recompile"
                    );
                    self.pending_reload = true;
                }
            }
        }
        Ok(())
    }

    /// Drops the texture bound to `channel`, releasing its resources. An
    /// empty slot compiles as 2D, so clearing a cube-shaped slot queues a
    /// recompile.
    pub fn clear_channel(
        &mut self,
        device: &mut dyn RenderDevice,
        channel: usize,
    ) -> Result<(), PassError> {
        if channel >= CHANNEL_COUNT {
            return Err(PassError::InvalidChannel(channel));
        }
        if let Some(texture) = self.channels[channel].take() {
            texture.release(device);
            if self.compiled_ok && self.compiled_shapes[channel] != TextureShape::Texture2d {
                self.pending_reload = true;
            }
        }
        Ok(())
    }

    /// Per-frame entry point: processes a queued reload, then either runs
    /// the full-screen pass (upload uniforms, bind channels, clear, draw)
    /// or skips the frame entirely when no valid program exists.
    pub fn tick(&mut self, device: &mut dyn RenderDevice) {
        if self.pending_reload {
            // cleared before the attempt so a failure cannot retry itself
            self.pending_reload = false;
            self.reload(device);
        }

        if !self.compiled_ok {
            return;
        }
        let Some(program) = self.program else {
            return;
        };

        for (name, value) in self.inputs.uniform_values() {
            device.set_uniform(program, name, value);
        }
        for (channel, slot) in self.channels.iter().enumerate() {
            if let Some(texture) = slot {
                bind_channel(device, program, channel, texture);
            }
        }
        device.clear_target(CLEAR_COLOR, 1.0, 0);
        device.draw_fullscreen(program);
    }

    /// Releases the program and every channel resource. The unit returns
    /// to its uninitialized state and may be reused.
    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        if let Some(program) = self.program.take() {
            device.destroy_program(program);
        }
        for slot in &mut self.channels {
            if let Some(texture) = slot.take() {
                texture.release(device);
            }
        }
        self.compiled_ok = false;
        self.reload_attempted = false;
    }

    /// One compile attempt. Any previous program is discarded whether or
    /// not the new one compiles; rendering resumes only after a later
    /// successful reload.
    fn reload(&mut self, device: &mut dyn RenderDevice) {
        self.reload_attempted = true;
        self.compiled_ok = false;

        if self.shader_path.as_os_str().is_empty() {
            tracing::error!("shader path is empty");
            self.discard_program(device);
            return;
        }
        if !self.shader_path.exists() {
            tracing::error!(path = %self.shader_path.display(), "shader file does not exist");
            self.discard_program(device);
            return;
        }

        let shapes = self.channel_shapes();
        match device.compile_program(&self.shader_path, &shapes) {
            Ok(program) => {
                // the old program is released only once the new handle is
                // confirmed valid
                self.discard_program(device);
                self.program = Some(program);
                self.compiled_ok = true;
                self.compiled_shapes = shapes;
                tracing::info!(path = %self.shader_path.display(), "shader compiled");
                for (channel, slot) in self.channels.iter().enumerate() {
                    if let Some(texture) = slot {
                        bind_channel(device, program, channel, texture);
                    }
                }
            }
            Err(error) => {
                tracing::error!(
                    path = %self.shader_path.display(),
                    %error,
                    "shader compilation failed"
                );
                self.discard_program(device);
            }
        }
    }

    fn discard_program(&mut self, device: &mut dyn RenderDevice) {
        if let Some(program) = self.program.take() {
            device.destroy_program(program);
        }
    }

    fn channel_shapes(&self) -> [TextureShape; CHANNEL_COUNT] {
        std::array::from_fn(|channel| {
            self.channels[channel]
                .as_ref()
                .map(ChannelTexture::shape)
                .unwrap_or(TextureShape::Texture2d)
        })
    }
}

fn bind_channel(
    device: &mut dyn RenderDevice,
    program: ProgramHandle,
    channel: usize,
    texture: &ChannelTexture,
) {
    let name = format!("{CHANNEL_UNIFORM_PREFIX}{channel}");
    if !device.has_uniform(program, &name) {
        let error = PassError::ChannelNotBound(name);
        tracing::warn!(channel, %error, "channel binding skipped");
        return;
    }
    device.bind_texture(program, &name, texture.texture());
    device.bind_sampler(
        program,
        &format!("{name}{CHANNEL_SAMPLER_SUFFIX}"),
        texture.sampler(),
    );
}
