//! Self-contained "live shader" execution unit: a hot-reloadable
//! full-screen fragment pass with four optional image channels and a fixed
//! block of time/frame/mouse uniforms. GPU work is funneled through the
//! [`RenderDevice`] seam so the core stays independent of any graphics API.

mod device;
mod error;
mod inputs;
mod props;
mod texture;
mod unit;

pub use device::{
    AddressMode, FilterMode, ProgramHandle, RenderDevice, SamplerDesc, SamplerHandle,
    TextureHandle, TextureShape, TextureUpload, UniformValue, CHANNEL_COUNT,
};
pub use error::PassError;
pub use inputs::{
    ShaderInputs, INPUT_FRAME, INPUT_FRAME_RATE, INPUT_MOUSE, INPUT_RESOLUTION, INPUT_TIME,
    INPUT_TIME_DELTA,
};
pub use props::{FromValue, Properties, Value};
pub use texture::{sampler_desc, ChannelDesc, ChannelTexture, Filter, Wrap};
pub use unit::{
    ShaderUnit, UnitState, CHANNEL_SAMPLER_SUFFIX, CHANNEL_UNIFORM_PREFIX, CLEAR_COLOR,
};
