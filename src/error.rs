use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading assets, building geometry or bringing up the window and GPU.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid typeface JSON: {0}")]
    Typeface(#[from] serde_json::Error),
    #[error("malformed outline for glyph {glyph:?}: {reason}")]
    Outline { glyph: char, reason: String },
    #[error("could not tessellate outline: {0:?}")]
    Tessellation(lyon::tessellation::TessellationError),
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("could not serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
    #[error("could not create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("could not create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("could not acquire a frame: {0}")]
    Frame(wgpu::SurfaceError),
    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("could not create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("could not spawn {name} worker: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
