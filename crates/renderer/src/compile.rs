use std::borrow::Cow;
use std::fmt::Write as _;

use exhibits::ExhibitProgram;
use thiserror::Error;
use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::ShaderStage;

use crate::gpu::SlotLayout;

/// Wrapped exhibit source rejected by the GLSL frontend.
#[derive(Debug, Error)]
#[error("fragment shader failed to parse: {message}")]
pub struct CompileError {
    pub message: String,
}

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("nova fullscreen vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the pass that stretches a reduced drawing buffer over the
/// swapchain.
pub(crate) fn compile_blit_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("nova blit fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(BLIT_FRAGMENT_GLSL),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Compiles an already wrapped exhibit fragment shader.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device, wrapped: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("nova exhibit fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped.to_owned()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Runs the wrapped source through naga's GLSL frontend so syntax errors come
/// back as text instead of a device validation error.
pub fn validate_fragment(wrapped: &str) -> Result<(), CompileError> {
    let mut frontend = Frontend::default();
    frontend
        .parse(&Options::from(ShaderStage::Fragment), wrapped)
        .map(|_| ())
        .map_err(|errors| CompileError {
            message: errors.to_string(),
        })
}

/// Produces a self-contained GLSL 450 fragment shader from exhibit code.
///
/// Steps performed:
///
/// 1. Strip `#version` and `precision` lines, plus the `uniform` declarations
///    of every bound name, so the block below owns them.
/// 2. Prepend the header: the slot block and one macro per binding, pointing
///    the exhibit's names at their slot.
/// 3. Append the footer, which flips `gl_FragCoord` to a bottom-left origin
///    and calls `mainImage`.
pub fn wrap_exhibit_fragment(program: &ExhibitProgram) -> String {
    let layout = SlotLayout::for_program(program);

    let mut body = String::new();
    for line in program.fragment_source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version") || trimmed.starts_with("precision ") {
            continue;
        }
        if declared_uniform(trimmed).is_some_and(|name| program.binding(name).is_some()) {
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    let mut header = String::from(HEADER_PRELUDE);
    let _ = writeln!(
        header,
        "layout(std140, set = 0, binding = 0) uniform ExhibitUniforms {{\n    vec4 slots[{}];\n}} nova_ubo;\n",
        layout.slot_count()
    );
    header.push_str("#define nova_surface nova_ubo.slots[0]\n");
    for (slot, binding) in layout.slots() {
        let swizzle = if binding.role.components() == 2 { "xy" } else { "x" };
        let _ = writeln!(
            header,
            "#define {} nova_ubo.slots[{slot}].{swizzle}",
            binding.name
        );
    }

    format!("{header}\n{body}{FOOTER}")
}

/// Name declared by a plain `uniform <type> <name>;` line.
fn declared_uniform(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("uniform ")?;
    let declaration = rest.split(';').next()?;
    declaration.split_whitespace().last()
}

const HEADER_PRELUDE: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 nova_out_color;

";

/// `nova_surface` holds (buffer width, buffer height, 0, 0).
const FOOTER: &str = r"
void main() {
    vec2 fragCoord = vec2(gl_FragCoord.x, nova_surface.y - gl_FragCoord.y);
    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    nova_out_color = vec4(color.rgb, 1.0);
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

/// Texture rows run top-down while `v_uv.y` grows upwards.
const BLIT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 nova_out_color;

layout(set = 0, binding = 0) uniform texture2D nova_frame_texture;
layout(set = 0, binding = 1) uniform sampler nova_frame_sampler;

void main() {
    vec2 uv = vec2(v_uv.x, 1.0 - v_uv.y);
    nova_out_color = texture(sampler2D(nova_frame_texture, nova_frame_sampler), uv);
}
";
