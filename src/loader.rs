//! Single-shot background model loading.
//!
//! A [`ModelLoader`] reads and prepares one model file on a worker thread. The
//! frame loop calls [`ModelLoader::poll`] once per frame; the result comes out
//! exactly once, after which the loader reports itself finished.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::geometry::{GeometryError, GeometryPipeline, RawGeometry};

/// What to load and how large it should end up.
#[derive(Clone, Debug)]
pub struct ModelRequest {
    pub path: PathBuf,
    /// Size of the model's largest dimension after loading.
    pub size: f32,
}

impl ModelRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: 8.0,
        }
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    fn pipeline(&self) -> GeometryPipeline {
        GeometryPipeline::new()
            .centered()
            .normalized()
            .scaled(self.size)
    }

    /// Loads and prepares the model on the calling thread.
    pub fn load(&self) -> Result<RawGeometry, GeometryError> {
        let geometry = RawGeometry::load(&self.path)?;
        Ok(self.pipeline().apply(geometry))
    }
}

pub type LoadResult = Result<RawGeometry, GeometryError>;

/// Handle to an in-flight model load.
pub struct ModelLoader {
    receiver: Option<Receiver<LoadResult>>,
}

impl ModelLoader {
    /// Starts loading `request` on a new thread.
    pub fn spawn(request: ModelRequest) -> Self {
        let (sender, receiver) = mpsc::channel();
        log::info!("Loading model {}", request.path.display());

        let spawned = thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || {
                let result = request.load();
                // The receiver may be gone if the app already closed.
                let _ = sender.send(result);
            });

        let receiver = match spawned {
            Ok(_) => Some(receiver),
            Err(e) => {
                log::error!("Failed to start model loader thread: {e}");
                None
            }
        };
        Self { receiver }
    }

    /// Returns the load result once it is ready. Never blocks.
    pub fn poll(&mut self) -> Option<LoadResult> {
        let receiver = self.receiver.as_ref()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.receiver = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                Some(Err(GeometryError::Parse(
                    "model loader stopped without a result".to_string(),
                )))
            }
        }
    }

    /// True once the result has been handed out.
    pub fn is_finished(&self) -> bool {
        self.receiver.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::binary_stl;
    use std::time::{Duration, Instant};

    fn wait(loader: &mut ModelLoader) -> LoadResult {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(result) = loader.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "loader timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sceneplay-{}-{name}", std::process::id()))
    }

    #[test]
    fn loads_and_resizes_stl() {
        let path = temp_path("tetra.stl");
        let stl = binary_stl(&[
            [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        ]);
        std::fs::write(&path, stl).unwrap();

        let mut loader = ModelLoader::spawn(ModelRequest::new(&path).size(4.0));
        let geometry = wait(&mut loader).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(loader.is_finished());
        assert!(loader.poll().is_none());
        let size = geometry.size();
        assert!((size.x - 4.0).abs() < 1e-5);
        assert!((size.y - 2.0).abs() < 1e-5);
        assert!(geometry.center().length() < 1e-5);
    }

    #[test]
    fn bundled_model_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join(crate::config::DEFAULT_MODEL);
        let geometry = ModelRequest::new(path).load().unwrap();

        assert_eq!(geometry.primitive_count(), 8);
        let size = geometry.size();
        assert!((size.max_element() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let mut loader = ModelLoader::spawn(ModelRequest::new(temp_path("missing.stl")));
        let err = wait(&mut loader).unwrap_err();
        assert!(matches!(err, GeometryError::Io(_)));
        assert!(loader.is_finished());
    }
}
