//! Background asset loading.
//!
//! Decoding happens on short-lived worker threads. The result comes back to
//! the owner of the scene as an [`AssetEvent`] through an [`AssetSink`]; in
//! the app that sink is the winit event loop proxy, so completions are handled
//! on the main thread between frames.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use image::RgbaImage;
use winit::event_loop::EventLoopProxy;

use crate::ecs::TextureId;
use crate::error::{Error, Result};
use crate::font::Font;

/// A finished load.
#[derive(Debug)]
pub enum AssetEvent {
    TextureLoaded {
        id: TextureId,
        path: PathBuf,
        result: Result<RgbaImage>,
    },
    FontLoaded {
        path: PathBuf,
        result: Result<Font>,
    },
}

/// Where finished loads are delivered.
pub trait AssetSink: Clone + Send + 'static {
    fn deliver(&self, event: AssetEvent);
}

impl AssetSink for EventLoopProxy<AssetEvent> {
    fn deliver(&self, event: AssetEvent) {
        if self.send_event(event).is_err() {
            log::debug!("event loop closed before asset arrived");
        }
    }
}

impl AssetSink for mpsc::Sender<AssetEvent> {
    fn deliver(&self, event: AssetEvent) {
        let _ = self.send(event);
    }
}

/// Starts loads and hands results to its sink.
#[derive(Clone, Debug)]
pub struct AssetLoader<S: AssetSink> {
    sink: S,
}

impl<S: AssetSink> AssetLoader<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Decodes an image file into the texture slot `id`.
    pub fn load_texture(&self, id: TextureId, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        self.spawn("texture", move || {
            let result = decode_image(&path);
            AssetEvent::TextureLoaded { id, path, result }
        })
    }

    /// Parses a typeface JSON file.
    pub fn load_font(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        self.spawn("font", move || {
            let result = Font::load(&path);
            AssetEvent::FontLoaded { path, result }
        })
    }

    fn spawn(
        &self,
        name: &'static str,
        job: impl FnOnce() -> AssetEvent + Send + 'static,
    ) -> Result<()> {
        let sink = self.sink.clone();
        thread::Builder::new()
            .name(format!("{name} loader"))
            .spawn(move || sink.deliver(job()))
            .map(|_| ())
            .map_err(|source| Error::Spawn { name, source })
    }
}

fn decode_image(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let image = image::load_from_memory(&bytes)?;
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("matcap-text-{}-{name}", std::process::id()))
    }

    fn loader() -> (AssetLoader<mpsc::Sender<AssetEvent>>, mpsc::Receiver<AssetEvent>) {
        let (tx, rx) = mpsc::channel();
        (AssetLoader::new(tx), rx)
    }

    #[test]
    fn texture_arrives_decoded() {
        let path = temp_path("matcap.png");
        RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let (loader, rx) = loader();
        loader.load_texture(TextureId(4), &path).unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AssetEvent::TextureLoaded { id, result, .. } => {
                assert_eq!(id, TextureId(4));
                let image = result.unwrap();
                assert_eq!(image.dimensions(), (2, 3));
                assert_eq!(image.get_pixel(1, 1).0, [10, 20, 30, 255]);
            }
            other => panic!("unexpected event {other:?}"),
        }
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_texture_reports_failure() {
        let (loader, rx) = loader();
        loader
            .load_texture(TextureId(0), temp_path("absent.png"))
            .unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AssetEvent::TextureLoaded { result, .. } => {
                assert!(matches!(result, Err(Error::Io { .. })));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn font_is_delivered_once() {
        let path = temp_path("font.json");
        std::fs::write(&path, crate::font::tests::TEST_FONT).unwrap();

        let (loader, rx) = loader();
        loader.load_font(&path).unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AssetEvent::FontLoaded { result, .. } => {
                assert!(result.unwrap().glyph('O').is_some());
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn malformed_font_is_an_error() {
        let path = temp_path("broken.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let (loader, rx) = loader();
        loader.load_font(&path).unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AssetEvent::FontLoaded { result, .. } => {
                assert!(matches!(result, Err(Error::Typeface(_))));
            }
            other => panic!("unexpected event {other:?}"),
        }
        let _ = std::fs::remove_file(path);
    }
}
