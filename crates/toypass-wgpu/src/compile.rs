use std::borrow::Cow;
use std::fmt::Write;

use wgpu::naga::ShaderStage;

use toypass::{TextureShape, CHANNEL_COUNT};

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Wraps the user's `mainImage` fragment with our prelude and compiles it
/// through naga's GLSL frontend.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    source: &str,
    channel_shapes: &[TextureShape; CHANNEL_COUNT],
) -> wgpu::ShaderModule {
    let wrapped = wrap_fragment(source, channel_shapes);
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("toypass fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Produces a self-contained GLSL fragment shader from raw `mainImage`
/// code:
///
/// 1. Strip `#version` directives and declarations of the uniforms we
///    inject ourselves.
/// 2. Prepend a header declaring the uniform block, the four channel
///    texture/sampler pairs (2D or cube per `channel_shapes`), and macro
///    aliases for the public names.
/// 3. Append a footer that remaps `gl_FragCoord` to a bottom-left origin,
///    calls `mainImage`, and writes `outColor`.
fn wrap_fragment(source: &str, channel_shapes: &[TextureShape; CHANNEL_COUNT]) -> String {
    let mut sanitized = String::new();
    let mut skipped_version = false;
    for line in source.lines() {
        if !skipped_version && line.trim_start().starts_with("#version") {
            skipped_version = true;
            continue;
        }
        if is_injected_uniform_decl(line) {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    let mut header = String::from(HEADER);
    for (index, shape) in channel_shapes.iter().enumerate() {
        let (texture_type, combined_type) = match shape {
            TextureShape::Texture2d => ("texture2D", "sampler2D"),
            TextureShape::Cube => ("textureCube", "samplerCube"),
        };
        let _ = writeln!(
            header,
            "layout(set = 1, binding = {}) uniform {texture_type} toypass_channel{index}_texture;",
            index * 2
        );
        let _ = writeln!(
            header,
            "layout(set = 1, binding = {}) uniform sampler toypass_channel{index}_sampler;",
            index * 2 + 1
        );
        let _ = writeln!(
            header,
            "#define iChannel{index} {combined_type}(toypass_channel{index}_texture, toypass_channel{index}_sampler)"
        );
    }

    format!("{header}{FRAGCOORD_SHIM}\n#line 1\n{sanitized}{FOOTER}")
}

fn is_injected_uniform_decl(line: &str) -> bool {
    const INJECTED: [&str; 10] = [
        "iResolution",
        "iTimeDelta",
        "iTime",
        "iFrameRate",
        "iFrame",
        "iMouse",
        "iChannel0",
        "iChannel1",
        "iChannel2",
        "iChannel3",
    ];
    let trimmed = line.trim_start();
    trimmed.starts_with("uniform ") && INJECTED.iter().any(|name| trimmed.contains(name))
}

/// GLSL prologue injected ahead of every user fragment. The uniform block
/// layout must match `PassUniforms` in `device.rs`.
const HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform PassInputs {
    vec3 _iResolution;
    float _iTime;
    float _iTimeDelta;
    float _iFrameRate;
    int _iFrame;
    float _padding0;
    vec4 _iMouse;
} ubo;

#define iResolution ubo._iResolution
#define iTime ubo._iTime
#define iTimeDelta ubo._iTimeDelta
#define iFrameRate ubo._iFrameRate
#define iFrame ubo._iFrame
#define iMouse ubo._iMouse

";

const FRAGCOORD_SHIM: &str = r"
vec4 toypass_gl_FragCoord;
#define gl_FragCoord toypass_gl_FragCoord
";

/// Epilogue that remaps coordinates and delegates to `mainImage`.
const FOOTER: &str = r"void main() {
    // Capture the hardware builtin, then remap to a bottom-left origin.
    #undef gl_FragCoord
    vec2 builtinFC = vec2(gl_FragCoord.x, gl_FragCoord.y);
    #define gl_FragCoord toypass_gl_FragCoord

    vec2 fragCoord = vec2(builtinFC.x, iResolution.y - builtinFC.y);
    toypass_gl_FragCoord = vec4(fragCoord, 0.0, 1.0);

    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    outColor = vec4(color.rgb, color.a);
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    const FLAT_SHAPES: [TextureShape; CHANNEL_COUNT] = [TextureShape::Texture2d; CHANNEL_COUNT];

    #[test]
    fn wrap_strips_version_and_injected_uniforms() {
        let source = r#"
            #version 300 es
            uniform float iTime;
            uniform vec3 iResolution;
            void mainImage(out vec4 fragColor, in vec2 fragCoord) {
                fragColor = vec4(fragCoord, 0.0, 1.0);
            }
        "#;

        let wrapped = wrap_fragment(source, &FLAT_SHAPES);
        assert!(!wrapped.contains("uniform float iTime"));
        assert!(!wrapped.contains("uniform vec3 iResolution"));
        assert!(wrapped.contains("mainImage"));
        assert_eq!(wrapped.matches("#version").count(), 1);
    }

    #[test]
    fn channel_shapes_pick_the_sampler_type() {
        let mut shapes = FLAT_SHAPES;
        shapes[1] = TextureShape::Cube;

        let wrapped = wrap_fragment("void mainImage(out vec4 c, in vec2 f) {}", &shapes);
        assert!(wrapped.contains("uniform texture2D toypass_channel0_texture"));
        assert!(wrapped.contains("uniform textureCube toypass_channel1_texture"));
        assert!(wrapped
            .contains("#define iChannel1 samplerCube(toypass_channel1_texture, toypass_channel1_sampler)"));
    }
}
