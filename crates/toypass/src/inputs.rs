use crate::device::UniformValue;
use crate::props::Properties;

pub const INPUT_RESOLUTION: &str = "iResolution";
pub const INPUT_TIME: &str = "iTime";
pub const INPUT_TIME_DELTA: &str = "iTimeDelta";
pub const INPUT_FRAME_RATE: &str = "iFrameRate";
pub const INPUT_FRAME: &str = "iFrame";
pub const INPUT_MOUSE: &str = "iMouse";

/// Playback clock and pointer state uploaded to the shader once per frame.
///
/// Pure storage: setters overwrite unconditionally and perform no
/// validation, leaving clock discipline to the external driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderInputs {
    resolution: [f32; 3],
    time: f32,
    time_delta: f32,
    frame_rate: f32,
    frame: i64,
    mouse: [f32; 4],
}

impl Default for ShaderInputs {
    fn default() -> Self {
        Self {
            resolution: [1.0, 1.0, 1.0],
            time: 0.0,
            time_delta: 0.0,
            frame_rate: 60.0,
            frame: 0,
            mouse: [0.0; 4],
        }
    }
}

impl ShaderInputs {
    pub fn resolution(&self) -> [f32; 3] {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: [f32; 3]) {
        self.resolution = resolution;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    pub fn time_delta(&self) -> f32 {
        self.time_delta
    }

    pub fn set_time_delta(&mut self, time_delta: f32) {
        self.time_delta = time_delta;
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn set_frame_rate(&mut self, frame_rate: f32) {
        self.frame_rate = frame_rate;
    }

    pub fn frame(&self) -> i64 {
        self.frame
    }

    pub fn set_frame(&mut self, frame: i64) {
        self.frame = frame;
    }

    pub fn mouse(&self) -> [f32; 4] {
        self.mouse
    }

    pub fn set_mouse(&mut self, mouse: [f32; 4]) {
        self.mouse = mouse;
    }

    /// Externalizes every field under its uniform name. The mapping is
    /// invertible through [`ShaderInputs::from_props`].
    pub fn to_props(&self) -> Properties {
        let mut props = Properties::new();
        props.set(INPUT_RESOLUTION, self.resolution);
        props.set(INPUT_TIME, self.time);
        props.set(INPUT_TIME_DELTA, self.time_delta);
        props.set(INPUT_FRAME_RATE, self.frame_rate);
        props.set(INPUT_FRAME, self.frame);
        props.set(INPUT_MOUSE, self.mouse);
        props
    }

    /// Rebuilds the block from a property bag, falling back to defaults
    /// for absent keys.
    pub fn from_props(props: &Properties) -> Self {
        let defaults = Self::default();
        Self {
            resolution: props.get(INPUT_RESOLUTION, defaults.resolution),
            time: props.get(INPUT_TIME, defaults.time),
            time_delta: props.get(INPUT_TIME_DELTA, defaults.time_delta),
            frame_rate: props.get(INPUT_FRAME_RATE, defaults.frame_rate),
            frame: props.get(INPUT_FRAME, defaults.frame),
            mouse: props.get(INPUT_MOUSE, defaults.mouse),
        }
    }

    /// All six fields paired with their uniform names, in upload order.
    pub fn uniform_values(&self) -> [(&'static str, UniformValue); 6] {
        [
            (INPUT_RESOLUTION, UniformValue::Vec3(self.resolution)),
            (INPUT_TIME, UniformValue::Float(self.time)),
            (INPUT_TIME_DELTA, UniformValue::Float(self.time_delta)),
            (INPUT_FRAME_RATE, UniformValue::Float(self.frame_rate)),
            (INPUT_FRAME, UniformValue::Int(self.frame)),
            (INPUT_MOUSE, UniformValue::Vec4(self.mouse)),
        ]
    }
}
