use super::{encode_jpeg, CameraSource, CameraStream};
use crate::error::CameraAccessError;
use crate::model::{CameraConstraints, EncodedImage};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Camera backed by a snapshot file that an external capture tool keeps overwriting
/// with the latest frame (e.g. `ffmpeg -f v4l2 -i /dev/video0 -update 1 frame.jpg`).
pub(crate) struct SnapshotCamera {
    path: PathBuf,
    active: Option<u64>,
    next_id: u64,
}

impl SnapshotCamera {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            active: None,
            next_id: 1,
        }
    }

    fn map_io(&self, e: std::io::Error) -> CameraAccessError {
        match e.kind() {
            ErrorKind::PermissionDenied => {
                CameraAccessError::PermissionDenied(format!("{}: {e}", self.path.display()))
            }
            _ => CameraAccessError::DeviceUnavailable(format!("{}: {e}", self.path.display())),
        }
    }
}

impl CameraSource for SnapshotCamera {
    async fn acquire(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<CameraStream, CameraAccessError> {
        if self.active.is_some() {
            return Err(CameraAccessError::DeviceUnavailable(
                "camera is already in use".into(),
            ));
        }
        // Opening the file is the permission check.
        tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| self.map_io(e))?;

        let id = self.next_id;
        self.next_id += 1;
        self.active = Some(id);
        tracing::debug!(path = %self.path.display(), id, "snapshot stream acquired");
        Ok(CameraStream {
            id,
            constraints: *constraints,
        })
    }

    async fn grab_frame(
        &mut self,
        stream: &CameraStream,
        quality: u8,
    ) -> Result<EncodedImage, CameraAccessError> {
        if self.active != Some(stream.id) {
            return Err(CameraAccessError::FrameGrab("stream is not active".into()));
        }
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            CameraAccessError::FrameGrab(format!("{}: {e}", self.path.display()))
        })?;
        let frame = image::load_from_memory(&raw)
            .map_err(|e| CameraAccessError::FrameGrab(format!("unreadable frame: {e}")))?
            .to_rgb8();
        encode_jpeg(frame, quality).await
    }

    fn release(&mut self, stream: CameraStream) {
        if self.active == Some(stream.id) {
            self.active = None;
            tracing::debug!(id = stream.id, "snapshot stream released");
        }
    }

    fn active_streams(&self) -> usize {
        usize::from(self.active.is_some())
    }
}
