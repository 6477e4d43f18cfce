use super::{encode_jpeg, CameraSource, CameraStream};
use crate::error::CameraAccessError;
use crate::model::{CameraConstraints, EncodedImage};
use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs},
};

/// Live capture device opened through OpenCV video I/O (V4L2, AVFoundation, MSMF...).
pub(crate) struct OpencvCamera {
    device: i32,
    capture: Option<VideoCapture>,
    active: Option<u64>,
    next_id: u64,
}

impl OpencvCamera {
    pub fn new(device: i32) -> Self {
        Self {
            device,
            capture: None,
            active: None,
            next_id: 1,
        }
    }
}

fn open_device(
    device: i32,
    constraints: CameraConstraints,
) -> Result<VideoCapture, CameraAccessError> {
    let unavailable =
        |reason: String| CameraAccessError::DeviceUnavailable(format!("camera {device}: {reason}"));

    let mut capture = VideoCapture::new(device, VideoCaptureAPIs::CAP_ANY as i32)
        .map_err(|e| unavailable(e.to_string()))?;
    if !capture.is_opened().map_err(|e| unavailable(e.to_string()))? {
        return Err(unavailable("failed to open camera".into()));
    }
    // Drivers treat the size as a hint and fall back to the nearest mode.
    let _ = capture.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(constraints.width));
    let _ = capture.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(constraints.height));
    Ok(capture)
}

fn read_frame(capture: &mut VideoCapture) -> Result<RgbImage, CameraAccessError> {
    let grab = |e: opencv::Error| CameraAccessError::FrameGrab(e.to_string());

    let mut frame = Mat::default();
    capture.read(&mut frame).map_err(grab)?;
    if frame.empty() {
        return Err(CameraAccessError::FrameGrab("empty frame".into()));
    }

    let mut rgb = Mat::default();
    imgproc::cvt_color(&frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0).map_err(grab)?;
    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    let data = rgb.data_bytes().map_err(grab)?.to_vec();
    RgbImage::from_raw(width, height, data)
        .ok_or_else(|| CameraAccessError::FrameGrab("unexpected frame layout".into()))
}

impl CameraSource for OpencvCamera {
    async fn acquire(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<CameraStream, CameraAccessError> {
        if self.active.is_some() {
            return Err(CameraAccessError::DeviceUnavailable(
                "camera is already in use".into(),
            ));
        }
        let (device, requested) = (self.device, *constraints);
        let capture = tokio::task::spawn_blocking(move || open_device(device, requested))
            .await
            .map_err(|e| CameraAccessError::DeviceUnavailable(format!("open task failed: {e}")))??;

        let id = self.next_id;
        self.next_id += 1;
        self.capture = Some(capture);
        self.active = Some(id);
        tracing::debug!(device, id, "webcam stream acquired");
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
        let mut capture = self
            .capture
            .take()
            .ok_or_else(|| CameraAccessError::FrameGrab("device is not open".into()))?;

        let (capture, frame) = tokio::task::spawn_blocking(move || {
            let frame = read_frame(&mut capture);
            (capture, frame)
        })
        .await
        .map_err(|e| CameraAccessError::FrameGrab(format!("capture task failed: {e}")))?;
        self.capture = Some(capture);

        encode_jpeg(frame?, quality).await
    }

    fn release(&mut self, stream: CameraStream) {
        if self.active != Some(stream.id) {
            return;
        }
        self.active = None;
        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.release() {
                tracing::warn!(device = self.device, "webcam release failed: {e}");
            }
        }
        tracing::debug!(id = stream.id, "webcam stream released");
    }

    fn active_streams(&self) -> usize {
        usize::from(self.active.is_some())
    }
}
