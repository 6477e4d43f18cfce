use super::{encode_jpeg, CameraSource, CameraStream};
use crate::error::CameraAccessError;
use crate::model::{CameraConstraints, EncodedImage};
use image::{Rgb, RgbImage};

/// Largest frame side the synthetic sensor will produce.
pub(crate) const MAX_SIDE: u32 = 8192;

/// Synthetic camera producing a moving gradient with a face-frame guide at the
/// requested resolution. Used when no snapshot source is configured.
pub(crate) struct TestPatternCamera {
    active: Option<u64>,
    next_id: u64,
    frames: u32,
}

impl TestPatternCamera {
    pub fn new() -> Self {
        Self {
            active: None,
            next_id: 1,
            frames: 0,
        }
    }
}

fn render(width: u32, height: u32, tick: u32) -> RgbImage {
    let (w, h) = (width.max(1), height.max(1));
    let mut img = RgbImage::from_fn(w, h, |x, y| {
        let r = (u64::from(x) * 255 / u64::from(w)) as u8;
        let g = (u64::from(y) * 255 / u64::from(h)) as u8;
        let b = ((tick * 16) % 256) as u8;
        Rgb([r, g, b])
    });

    // Corner guide inset by an eighth of the frame, like the scan overlay.
    let (x0, y0) = (w / 8, h / 8);
    let (x1, y1) = (w - 1 - w / 8, h - 1 - h / 8);
    let arm = (w.min(h) / 10).max(1);
    let white = Rgb([255, 255, 255]);
    for d in 0..arm {
        for (x, y) in [
            (x0 + d, y0),
            (x0, y0 + d),
            (x1 - d, y0),
            (x1, y0 + d),
            (x0 + d, y1),
            (x0, y1 - d),
            (x1 - d, y1),
            (x1, y1 - d),
        ] {
            img.put_pixel(x, y, white);
        }
    }
    img
}

impl CameraSource for TestPatternCamera {
    async fn acquire(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<CameraStream, CameraAccessError> {
        if self.active.is_some() {
            return Err(CameraAccessError::DeviceUnavailable(
                "camera is already in use".into(),
            ));
        }
        let sides = 1..=MAX_SIDE;
        if !sides.contains(&constraints.width) || !sides.contains(&constraints.height) {
            return Err(CameraAccessError::DeviceUnavailable(format!(
                "unsupported resolution {}x{}",
                constraints.width, constraints.height
            )));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.active = Some(id);
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
        self.frames = self.frames.wrapping_add(1);
        let frame = render(
            stream.constraints.width,
            stream.constraints.height,
            self.frames,
        );
        encode_jpeg(frame, quality).await
    }

    fn release(&mut self, stream: CameraStream) {
        if self.active == Some(stream.id) {
            self.active = None;
        }
    }

    fn active_streams(&self) -> usize {
        usize::from(self.active.is_some())
    }
}
