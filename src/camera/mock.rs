use super::{CameraSource, CameraStream};
use crate::error::CameraAccessError;
use crate::model::{CameraConstraints, EncodedImage};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters shared between a test and the camera it handed to a controller.
#[derive(Default)]
pub(crate) struct MockCameraProbe {
    pub acquires: AtomicUsize,
    pub releases: AtomicUsize,
    pub active: AtomicUsize,
    pub deny_access: AtomicBool,
    pub fail_grab: AtomicBool,
}

pub(crate) struct MockCamera {
    probe: Arc<MockCameraProbe>,
    active: Option<u64>,
    next_id: u64,
}

impl MockCamera {
    pub fn new() -> (Self, Arc<MockCameraProbe>) {
        let probe = Arc::new(MockCameraProbe::default());
        (
            Self {
                probe: probe.clone(),
                active: None,
                next_id: 1,
            },
            probe,
        )
    }
}

impl CameraSource for MockCamera {
    async fn acquire(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<CameraStream, CameraAccessError> {
        if self.probe.deny_access.load(Ordering::SeqCst) {
            return Err(CameraAccessError::PermissionDenied("denied by test".into()));
        }
        if self.active.is_some() {
            return Err(CameraAccessError::DeviceUnavailable("busy".into()));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.active = Some(id);
        self.probe.acquires.fetch_add(1, Ordering::SeqCst);
        self.probe.active.fetch_add(1, Ordering::SeqCst);
        Ok(CameraStream {
            id,
            constraints: *constraints,
        })
    }

    async fn grab_frame(
        &mut self,
        stream: &CameraStream,
        _quality: u8,
    ) -> Result<EncodedImage, CameraAccessError> {
        if self.probe.fail_grab.load(Ordering::SeqCst) {
            return Err(CameraAccessError::FrameGrab("grab failed by test".into()));
        }
        Ok(EncodedImage {
            mime: "image/jpeg",
            bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]),
            width: stream.constraints.width,
            height: stream.constraints.height,
        })
    }

    fn release(&mut self, stream: CameraStream) {
        if self.active == Some(stream.id) {
            self.active = None;
            self.probe.releases.fetch_add(1, Ordering::SeqCst);
            self.probe.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn active_streams(&self) -> usize {
        usize::from(self.active.is_some())
    }
}
