use std::path::PathBuf;

use thiserror::Error;

/// Failures the renderer reports to its caller instead of logging and
/// carrying on with a half-built resource.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("mesh `{name}` has no vertices, nothing to upload")]
    EmptyMesh { name: String },

    #[error("failed to read shader source {path}: {source}")]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader `{program}` failed to compile: {message}")]
    ShaderCompile { program: String, message: String },

    #[error("shader `{program}` declares no binding for `{name}`")]
    MissingBinding { program: String, name: String },

    #[error("light set has {actual} {kind} lights but the layout was built for {expected}")]
    LightCountMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("asset not found: {0}")]
    MissingAsset(PathBuf),

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cubemap faces must share one square size, {path} is {width}x{height}")]
    CubemapFace {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed vertex data in {path} at line {line}: {reason}")]
    VertexData {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no suitable graphics adapter found")]
    NoAdapter,
}
