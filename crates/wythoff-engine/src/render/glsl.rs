//! GLSL source handling: loading, wrapping and up-front validation.
//!
//! Fragment programs are written in the Shadertoy style: they define
//! `void mainImage(out vec4 fragColor, in vec2 fragCoord)` and read the
//! `iResolution`/`iTime`/`iMouse`/`iFrame`/`AA` uniforms and the
//! `iChannel0`/`iChannel1`/`iTexture` samplers. The preamble below declares
//! those names against the bind group layout in `channels.rs`; the epilogue
//! supplies `main`.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

/// Declarations prepended to every fragment program.
pub const FRAGMENT_PREAMBLE: &str = "\
#version 450

layout(set = 0, binding = 0) uniform WythoffGlobals {
    vec3 iResolution;
    float iTime;
    vec4 iMouse;
    int iFrame;
    int AA;
    int iFlipY;
    int wy_pad;
};

layout(set = 1, binding = 0) uniform texture2D wy_channel0;
layout(set = 1, binding = 1) uniform texture2D wy_channel1;
layout(set = 1, binding = 2) uniform texture2D wy_texture;
layout(set = 1, binding = 3) uniform sampler wy_nearest;
layout(set = 1, binding = 4) uniform sampler wy_linear;

#define iChannel0 sampler2D(wy_channel0, wy_nearest)
#define iChannel1 sampler2D(wy_channel1, wy_nearest)
#define iTexture sampler2D(wy_texture, wy_linear)
";

/// Entry point appended to every fragment program.
pub const FRAGMENT_EPILOGUE: &str = "\
layout(location = 0) out vec4 wy_frag_color;

void main() {
    vec2 fragCoord = gl_FragCoord.xy;
    if (iFlipY != 0) {
        fragCoord.y = iResolution.y - fragCoord.y;
    }
    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    wy_frag_color = color;
}
";

const VERTEX_PREAMBLE: &str = "#version 450\n";

/// Shader stage of an assembled source.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

/// One named GLSL source text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shader source {}", path.display()))?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Vertex source plus the ordered fragment sources of one program.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub vertex: SourceFile,
    pub fragment: Vec<SourceFile>,
}

impl ProgramSource {
    /// Loads `vertex` and `fragments` (concatenated in order) from `dir`.
    pub fn load(dir: &Path, vertex: &str, fragments: &[&str]) -> Result<Self> {
        let vertex = SourceFile::load(&dir.join(vertex))?;
        let fragment = fragments
            .iter()
            .map(|name| SourceFile::load(&dir.join(name)))
            .collect::<Result<Vec<_>>>()?;
        anyhow::ensure!(!fragment.is_empty(), "program has no fragment sources");
        Ok(Self { vertex, fragment })
    }

    pub fn fragment_names(&self) -> String {
        self.fragment
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    name: String,
    /// 1-based line in the assembled text where this segment starts.
    first_line: u32,
    line_count: u32,
}

/// Assembled GLSL text plus a map from assembled lines back to inputs.
#[derive(Debug, Clone)]
pub struct AssembledSource {
    pub stage: Stage,
    pub text: String,
    segments: Vec<Segment>,
}

impl AssembledSource {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            text: String::new(),
            segments: Vec::new(),
        }
    }

    /// Appends user text with its `#version` lines blanked.
    fn push(&mut self, name: &str, text: &str) {
        self.push_raw(name, &strip_version(text));
    }

    fn push_raw(&mut self, name: &str, body: &str) {
        let first_line = self.text.lines().count() as u32 + 1;
        let line_count = body.lines().count() as u32;

        self.text.push_str(body);
        if !self.text.ends_with('\n') {
            self.text.push('\n');
        }

        self.segments.push(Segment {
            name: name.to_string(),
            first_line,
            line_count,
        });
    }

    /// Maps a 1-based assembled line number to `(segment name, 1-based line)`.
    pub fn locate(&self, line: u32) -> Option<(&str, u32)> {
        self.segments
            .iter()
            .find(|s| line >= s.first_line && line < s.first_line + s.line_count.max(1))
            .map(|s| (s.name.as_str(), line - s.first_line + 1))
    }
}

/// Drops `#version` directives, keeping a blank line in their place so line
/// numbers stay aligned with the input.
pub fn strip_version(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if !line.trim_start().starts_with("#version") {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// Wraps fragment parts with the uniform/channel preamble and `main`.
pub fn assemble_fragment(parts: &[SourceFile]) -> AssembledSource {
    let mut out = AssembledSource::new(Stage::Fragment);
    out.push_raw("<preamble>", FRAGMENT_PREAMBLE);
    for part in parts {
        out.push(&part.name, &part.text);
    }
    out.push_raw("<epilogue>", FRAGMENT_EPILOGUE);
    out
}

/// Pins the GLSL version of a vertex program.
pub fn assemble_vertex(source: &SourceFile) -> AssembledSource {
    let mut out = AssembledSource::new(Stage::Vertex);
    out.push_raw("<preamble>", VERTEX_PREAMBLE);
    out.push(&source.name, &source.text);
    out
}

/// A GLSL compile failure, located in the user's file when possible.
#[derive(Debug, Clone)]
pub struct ShaderError {
    pub stage: Stage,
    /// `(file, line)` of the first diagnostic.
    pub location: Option<(String, u32)>,
    /// Compiler diagnostic rendered against the assembled source.
    pub diagnostic: String,
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some((file, line)) => write!(f, "{} shader error at {file}:{line}", self.stage)?,
            None => write!(f, "{} shader error", self.stage)?,
        }
        write!(f, "\n{}", self.diagnostic)
    }
}

impl std::error::Error for ShaderError {}

/// Parses and validates an assembled source with naga.
///
/// wgpu would catch the same problems, but only as an uncaptured device
/// error; doing it here gives a recoverable error with file/line context.
pub fn validate(source: &AssembledSource) -> Result<(), ShaderError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(source.stage.to_naga());

    let module = frontend.parse(&options, &source.text).map_err(|errors| {
        let line = errors
            .errors
            .first()
            .map(|e| e.meta.location(&source.text).line_number);
        source.error_at(line, errors.emit_to_string(&source.text))
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator.validate(&module).map_err(|err| {
        let line = err.location(&source.text).map(|l| l.line_number);
        source.error_at(line, err.emit_to_string(&source.text))
    })?;

    Ok(())
}

impl AssembledSource {
    fn error_at(&self, line: Option<u32>, diagnostic: String) -> ShaderError {
        ShaderError {
            stage: self.stage,
            location: line
                .and_then(|l| self.locate(l))
                .map(|(name, l)| (name.to_string(), l)),
            diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRADIENT: &str = "\
void mainImage(out vec4 fragColor, in vec2 fragCoord) {
    vec2 uv = fragCoord / iResolution.xy;
    vec4 prev = texture(iChannel0, uv);
    fragColor = mix(prev, vec4(uv, 0.5 + 0.5 * sin(iTime), 1.0), 0.5);
}
";

    #[test]
    fn version_lines_become_blank() {
        let out = strip_version("#version 330\nvoid f() {}\n  #version 120\n");
        assert_eq!(out, "\nvoid f() {}\n\n");
    }

    #[test]
    fn fragment_parts_are_wrapped_in_order() {
        let parts = [
            SourceFile::new("common.frag", "float helper() { return 1.0; }\n"),
            SourceFile::new("pass.frag", GRADIENT),
        ];
        let src = assemble_fragment(&parts);

        assert!(src.text.starts_with("#version 450\n"));
        let helper = src.text.find("helper()").unwrap();
        let image = src.text.find("void mainImage").unwrap();
        let main = src.text.find("void main()").unwrap();
        assert!(helper < image && image < main);
    }

    #[test]
    fn lines_map_back_to_their_files() {
        let parts = [
            SourceFile::new("common.frag", "// one\n// two\n"),
            SourceFile::new("pass.frag", GRADIENT),
        ];
        let src = assemble_fragment(&parts);
        let preamble_lines = FRAGMENT_PREAMBLE.lines().count() as u32;

        assert_eq!(src.locate(1), Some(("<preamble>", 1)));
        assert_eq!(src.locate(preamble_lines + 2), Some(("common.frag", 2)));
        assert_eq!(src.locate(preamble_lines + 3), Some(("pass.frag", 1)));
    }

    #[test]
    fn wrapped_fragment_validates() {
        let src = assemble_fragment(&[SourceFile::new("pass.frag", GRADIENT)]);
        validate(&src).unwrap();
    }

    #[test]
    fn vertex_source_validates() {
        let vs = SourceFile::new(
            "quad.vert",
            "#version 330\nlayout(location = 0) in vec2 position;\nvoid main() { gl_Position = vec4(position, 0.0, 1.0); }\n",
        );
        validate(&assemble_vertex(&vs)).unwrap();
    }

    #[test]
    fn syntax_errors_point_at_user_file() {
        let broken = "void mainImage(out vec4 fragColor, in vec2 fragCoord) {\n    fragColor = vec4(1.0)\n}\n";
        let src = assemble_fragment(&[SourceFile::new("broken.frag", broken)]);

        let err = validate(&src).unwrap_err();
        assert_eq!(err.stage, Stage::Fragment);
        let (file, line) = err.location.clone().expect("error should be located");
        assert_eq!(file, "broken.frag");
        assert!((2..=3).contains(&line), "unexpected line {line}");
        assert!(err.to_string().starts_with("fragment shader error at broken.frag:"));
    }

    #[test]
    fn missing_files_report_their_path() {
        let err = ProgramSource::load(Path::new("/nonexistent"), "a.vert", &["b.frag"]).unwrap_err();
        assert!(format!("{err:#}").contains("a.vert"));
    }
}
