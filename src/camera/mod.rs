//! Camera sources.
//!
//! A camera source hands out at most one live stream at a time, grabs still frames from
//! it and takes the stream back on release. Release consumes the stream handle, so a
//! stream cannot be released twice; releasing a handle the source no longer tracks is a
//! no-op.

mod pattern;
mod snapshot;
#[cfg(feature = "webcam")]
mod webcam;

#[cfg(test)]
pub(crate) mod mock;

pub(crate) use pattern::TestPatternCamera;
pub(crate) use snapshot::SnapshotCamera;
#[cfg(feature = "webcam")]
pub(crate) use webcam::OpencvCamera;

use crate::error::CameraAccessError;
use crate::model::{CameraConstraints, EncodedImage};
use bytes::Bytes;
use image::RgbImage;

/// Handle for an acquired live stream.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CameraStream {
    pub id: u64,
    pub constraints: CameraConstraints,
}

pub(crate) trait CameraSource {
    /// Request exclusive access to the device. Suspends while the host grants permission.
    async fn acquire(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<CameraStream, CameraAccessError>;

    /// Grab one still frame from the live stream, JPEG-encoded at `quality`.
    async fn grab_frame(
        &mut self,
        stream: &CameraStream,
        quality: u8,
    ) -> Result<EncodedImage, CameraAccessError>;

    /// Stop all tracks of the stream.
    fn release(&mut self, stream: CameraStream);

    fn active_streams(&self) -> usize;
}

/// Available camera backends, selected from configuration.
pub(crate) enum AnyCamera {
    Snapshot(SnapshotCamera),
    TestPattern(TestPatternCamera),
    #[cfg(feature = "webcam")]
    Webcam(OpencvCamera),
    #[cfg(test)]
    Mock(mock::MockCamera),
}

impl CameraSource for AnyCamera {
    async fn acquire(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<CameraStream, CameraAccessError> {
        match self {
            AnyCamera::Snapshot(c) => c.acquire(constraints).await,
            AnyCamera::TestPattern(c) => c.acquire(constraints).await,
            #[cfg(feature = "webcam")]
            AnyCamera::Webcam(c) => c.acquire(constraints).await,
            #[cfg(test)]
            AnyCamera::Mock(c) => c.acquire(constraints).await,
        }
    }

    async fn grab_frame(
        &mut self,
        stream: &CameraStream,
        quality: u8,
    ) -> Result<EncodedImage, CameraAccessError> {
        match self {
            AnyCamera::Snapshot(c) => c.grab_frame(stream, quality).await,
            AnyCamera::TestPattern(c) => c.grab_frame(stream, quality).await,
            #[cfg(feature = "webcam")]
            AnyCamera::Webcam(c) => c.grab_frame(stream, quality).await,
            #[cfg(test)]
            AnyCamera::Mock(c) => c.grab_frame(stream, quality).await,
        }
    }

    fn release(&mut self, stream: CameraStream) {
        match self {
            AnyCamera::Snapshot(c) => c.release(stream),
            AnyCamera::TestPattern(c) => c.release(stream),
            #[cfg(feature = "webcam")]
            AnyCamera::Webcam(c) => c.release(stream),
            #[cfg(test)]
            AnyCamera::Mock(c) => c.release(stream),
        }
    }

    fn active_streams(&self) -> usize {
        match self {
            AnyCamera::Snapshot(c) => c.active_streams(),
            AnyCamera::TestPattern(c) => c.active_streams(),
            #[cfg(feature = "webcam")]
            AnyCamera::Webcam(c) => c.active_streams(),
            #[cfg(test)]
            AnyCamera::Mock(c) => c.active_streams(),
        }
    }
}

/// Encode an RGB frame as JPEG off the async runtime.
pub(crate) async fn encode_jpeg(
    frame: RgbImage,
    quality: u8,
) -> Result<EncodedImage, CameraAccessError> {
    let quality = quality.clamp(1, 100);
    tokio::task::spawn_blocking(move || {
        let (width, height) = frame.dimensions();
        let mut jpeg_bytes = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, quality)
            .encode(&frame, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| CameraAccessError::FrameGrab(format!("jpeg encoding failed: {e}")))?;
        Ok(EncodedImage {
            mime: "image/jpeg",
            bytes: Bytes::from(jpeg_bytes),
            width,
            height,
        })
    })
    .await
    .map_err(|e| CameraAccessError::FrameGrab(format!("encoder task failed: {e}")))?
}
