mod support;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use support::{write_rgba_png, RecordingDevice};
use tempfile::TempDir;
use toypass::{
    ChannelDesc, ChannelTexture, PassError, Properties, ShaderUnit, TextureShape, UniformValue,
    UnitState, Value, CLEAR_COLOR,
};

const DEMO_SHADER: &str = r"void mainImage(out vec4 fragColor, in vec2 fragCoord) {
    fragColor = vec4(fragCoord / iResolution.xy, 0.0, 1.0);
}
";

fn write_shader(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, DEMO_SHADER).unwrap();
    path
}

fn load_fixture_texture(device: &mut RecordingDevice, dir: &TempDir, name: &str) -> ChannelTexture {
    let path = dir.path().join(name);
    write_rgba_png(&path, 4, 4, [128, 64, 32, 255]);
    ChannelTexture::load(device, &ChannelDesc::new(path)).unwrap()
}

fn load_fixture_cubemap(device: &mut RecordingDevice, dir: &TempDir, stem: &str) -> ChannelTexture {
    let base = dir.path().join(format!("{stem}.png"));
    write_rgba_png(&base, 4, 4, [255, 255, 255, 255]);
    for face in 1..=5 {
        write_rgba_png(
            &dir.path().join(format!("{stem}_{face}.png")),
            4,
            4,
            [0, 0, 0, 255],
        );
    }
    ChannelTexture::load(device, &ChannelDesc::new(base)).unwrap()
}

#[test]
fn setting_the_same_path_twice_compiles_once() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::new();

    unit.set_shader_path(&shader);
    unit.tick(&mut device);
    unit.set_shader_path(&shader);
    unit.tick(&mut device);

    assert_eq!(device.compile_requests.len(), 1);
    assert_eq!(device.draws.len(), 2);
    assert_eq!(unit.state(), UnitState::Ready);
}

#[test]
fn failed_compile_clears_pending_and_never_retries() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    device.fail_compile_with = Some("unexpected token".to_string());
    let mut unit = ShaderUnit::with_shader_path(&shader);

    unit.tick(&mut device);
    assert!(!unit.pending_reload());
    assert_eq!(unit.state(), UnitState::Failed);
    assert_eq!(device.compile_requests.len(), 1);

    // no path change, so another tick must not attempt a second compile
    unit.tick(&mut device);
    assert_eq!(device.compile_requests.len(), 1);
    assert!(device.draws.is_empty());
}

#[test]
fn failed_state_skips_uploads_clears_and_draws() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    device.fail_compile_with = Some("bad shader".to_string());
    let mut unit = ShaderUnit::with_shader_path(&shader);

    unit.tick(&mut device);
    unit.tick(&mut device);

    assert!(device.uniform_uploads.is_empty());
    assert!(device.clears.is_empty());
    assert!(device.draws.is_empty());
}

#[test]
fn clearing_the_path_fails_without_a_compile_attempt() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::with_shader_path(&shader);

    unit.tick(&mut device);
    assert_eq!(unit.state(), UnitState::Ready);

    unit.set_shader_path("");
    unit.tick(&mut device);

    assert_eq!(unit.state(), UnitState::Failed);
    assert_eq!(device.compile_requests.len(), 1);
    assert!(device.live_programs.is_empty());
}

#[test]
fn missing_shader_file_fails_without_a_compile_attempt() {
    let dir = TempDir::new().unwrap();
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::with_shader_path(dir.path().join("nope.frag"));

    unit.tick(&mut device);

    assert_eq!(unit.state(), UnitState::Failed);
    assert!(device.compile_requests.is_empty());
    assert!(device.draws.is_empty());
}

#[test]
fn failed_reload_discards_the_previous_program() {
    let dir = TempDir::new().unwrap();
    let first = write_shader(&dir, "first.frag");
    let second = write_shader(&dir, "second.frag");
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::with_shader_path(&first);

    unit.tick(&mut device);
    assert_eq!(device.live_programs.len(), 1);

    device.fail_compile_with = Some("regression".to_string());
    unit.set_shader_path(&second);
    unit.tick(&mut device);

    // no stale-program fallback: the old program is gone and nothing draws
    assert!(device.live_programs.is_empty());
    assert_eq!(unit.state(), UnitState::Failed);
    assert_eq!(device.draws.len(), 1);
}

#[test]
fn ready_tick_uploads_all_inputs_then_clears_and_draws() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::with_shader_path(&shader);

    unit.inputs_mut().set_resolution([640.0, 480.0, 1.0]);
    unit.inputs_mut().set_time(2.5);
    unit.inputs_mut().set_frame(42);
    unit.tick(&mut device);

    let names: Vec<&str> = device
        .uniform_uploads
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(
        names,
        ["iResolution", "iTime", "iTimeDelta", "iFrameRate", "iFrame", "iMouse"]
    );
    assert!(device
        .uniform_uploads
        .contains(&("iFrame".to_string(), UniformValue::Int(42))));
    assert_eq!(device.clears, vec![(CLEAR_COLOR, 1.0, 0)]);
    assert_eq!(device.draws.len(), 1);
}

#[test]
fn out_of_range_channel_is_rejected_and_slots_stay_empty() {
    let dir = TempDir::new().unwrap();
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::new();
    let texture = load_fixture_texture(&mut device, &dir, "tex.png");

    let result = unit.set_texture(&mut device, 4, texture);

    assert!(matches!(result, Err(PassError::InvalidChannel(4))));
    for channel in 0..4 {
        assert!(unit.channel(channel).is_none());
    }
}

#[test]
fn channels_are_rebound_after_every_successful_reload() {
    let dir = TempDir::new().unwrap();
    let first = write_shader(&dir, "first.frag");
    let second = write_shader(&dir, "second.frag");
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::new();

    let texture = load_fixture_texture(&mut device, &dir, "tex.png");
    unit.set_texture(&mut device, 0, texture).unwrap();

    unit.set_shader_path(&first);
    unit.tick(&mut device);
    unit.set_shader_path(&second);
    unit.tick(&mut device);

    let programs: Vec<_> = device
        .texture_binds
        .iter()
        .filter(|(_, name, _)| name == "iChannel0")
        .map(|(program, _, _)| *program)
        .collect();
    assert!(programs.len() >= 2);
    assert_ne!(programs.first(), programs.last());
    assert!(device
        .sampler_binds
        .iter()
        .any(|(_, name, _)| name == "iChannel0_sampler"));
}

#[test]
fn setting_a_texture_on_a_ready_unit_binds_immediately() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::with_shader_path(&shader);
    unit.tick(&mut device);

    let texture = load_fixture_texture(&mut device, &dir, "tex.png");
    unit.set_texture(&mut device, 2, texture).unwrap();

    assert!(device
        .texture_binds
        .iter()
        .any(|(_, name, _)| name == "iChannel2"));
    // same shape as the compiled slot, so no recompile is queued
    assert!(!unit.pending_reload());
}

#[test]
fn channel_shape_change_queues_a_recompile() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::with_shader_path(&shader);

    unit.tick(&mut device);
    assert_eq!(
        device.compiled_shapes[0],
        [TextureShape::Texture2d; 4]
    );

    let cube = load_fixture_cubemap(&mut device, &dir, "sky");
    unit.set_texture(&mut device, 0, cube).unwrap();
    assert!(unit.pending_reload());

    unit.tick(&mut device);
    assert_eq!(device.compile_requests.len(), 2);
    assert_eq!(device.compiled_shapes[1][0], TextureShape::Cube);
    assert_eq!(unit.state(), UnitState::Ready);
}

#[test]
fn clearing_a_cube_channel_queues_a_recompile() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::with_shader_path(&shader);

    let cube = load_fixture_cubemap(&mut device, &dir, "sky");
    unit.set_texture(&mut device, 1, cube).unwrap();
    unit.tick(&mut device);
    assert_eq!(device.compiled_shapes[0][1], TextureShape::Cube);

    unit.clear_channel(&mut device, 1).unwrap();
    assert!(unit.pending_reload());

    unit.tick(&mut device);
    assert_eq!(device.compile_requests.len(), 2);
    assert_eq!(device.compiled_shapes[1][1], TextureShape::Texture2d);

    // clearing an already-empty slot queues nothing
    unit.clear_channel(&mut device, 1).unwrap();
    assert!(!unit.pending_reload());
}

#[test]
fn undeclared_channel_uniform_skips_binding_but_not_the_frame() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    device.declared_uniforms = Some(HashSet::from([
        "iResolution".to_string(),
        "iTime".to_string(),
        "iTimeDelta".to_string(),
        "iFrameRate".to_string(),
        "iFrame".to_string(),
        "iMouse".to_string(),
    ]));
    let mut unit = ShaderUnit::with_shader_path(&shader);

    let texture = load_fixture_texture(&mut device, &dir, "tex.png");
    unit.set_texture(&mut device, 0, texture).unwrap();
    unit.tick(&mut device);

    assert!(device.texture_binds.is_empty());
    assert!(device.sampler_binds.is_empty());
    assert_eq!(device.draws.len(), 1);
}

#[test]
fn release_returns_every_live_resource() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::with_shader_path(&shader);

    let texture = load_fixture_texture(&mut device, &dir, "tex.png");
    unit.set_texture(&mut device, 1, texture).unwrap();
    unit.tick(&mut device);
    unit.release(&mut device);

    assert!(device.live_programs.is_empty());
    assert!(device.live_textures.is_empty());
    assert!(device.live_samplers.is_empty());
    assert_eq!(unit.state(), UnitState::Uninitialized);
}

#[test]
fn props_round_trip_restores_path_inputs_and_channels() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");
    let texture_path = dir.path().join("rock.png");
    write_rgba_png(&texture_path, 8, 8, [10, 20, 30, 255]);

    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::with_shader_path(&shader);
    unit.inputs_mut().set_time(9.0);
    unit.inputs_mut().set_frame(120);
    unit.load_channel(&mut device, 0, &ChannelDesc::new(&texture_path))
        .unwrap();
    unit.tick(&mut device);

    let props = unit.to_props();
    assert_eq!(props.get("shaderLoaded", false), true);
    assert!(props.has("channel0"));
    assert!(!props.has("channel1"));

    let mut restore_device = RecordingDevice::new();
    let restored = ShaderUnit::from_props(&mut restore_device, &props);

    assert_eq!(restored.shader_path(), shader.as_path());
    assert_eq!(restored.inputs().time(), 9.0);
    assert_eq!(restored.inputs().frame(), 120);
    assert_eq!(restore_device.live_textures.len(), 1);
    // the compile itself is deferred to the first tick
    assert!(restored.pending_reload());
}

#[test]
fn from_props_tolerates_a_channel_that_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let shader = write_shader(&dir, "shader.frag");

    let mut channel = Properties::new();
    channel.set("path", dir.path().join("missing.png").to_string_lossy().into_owned());
    let mut props = Properties::new();
    props.set("shaderPath", shader.to_string_lossy().into_owned());
    props.set("channel0", Value::Table(channel));

    let mut device = RecordingDevice::new();
    let mut unit = ShaderUnit::from_props(&mut device, &props);
    unit.tick(&mut device);

    assert!(unit.channel(0).is_none());
    assert_eq!(unit.state(), UnitState::Ready);
    assert_eq!(device.draws.len(), 1);
}
