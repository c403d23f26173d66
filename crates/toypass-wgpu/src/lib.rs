//! Headless wgpu backend for the `toypass` shader unit. Compiles GLSL
//! fragments through naga, renders into an offscreen RGBA8 target, and can
//! read the result back for snapshots.

mod compile;
mod context;
mod device;

pub use device::WgpuDevice;
