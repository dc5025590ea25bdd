//! Shared test fixtures: synthetic marker patterns, screen builders and a
//! scripted fake device.

use crate::device::{DeviceControl, DeviceError, DeviceResult};
use image::{GrayImage, Luma};
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Stripe directions for the synthetic marker patterns. Different seeds give
/// differently oriented stripes, so no pattern is a translate of another and
/// cross-correlation between distinct markers stays far below threshold.
const STRIPE_DIRS: [(u32, u32); 8] = [
    (1, 0),
    (0, 1),
    (1, 1),
    (1, 2),
    (2, 1),
    (1, 4),
    (1, 6),
    (2, 3),
];

pub const PATCH_SIZE: u32 = 16;
pub const SCREEN_SIZE: u32 = 96;

/// A 16x16 high-contrast stripe pattern, distinct per seed.
pub fn marker_patch(seed: usize) -> GrayImage {
    let (a, b) = STRIPE_DIRS[seed % STRIPE_DIRS.len()];
    GrayImage::from_fn(PATCH_SIZE, PATCH_SIZE, |x, y| {
        if (a * x + b * y) % 8 == 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

pub fn encode_png(img: &GrayImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("png encode");
    buf.into_inner()
}

/// Build a PNG screenshot: near-black background with the given marker
/// patches planted at fixed offsets.
pub fn screen_with(patches: &[(usize, u32, u32)]) -> Vec<u8> {
    let mut screen = GrayImage::from_pixel(SCREEN_SIZE, SCREEN_SIZE, Luma([1]));
    for &(seed, x, y) in patches {
        image::imageops::replace(&mut screen, &marker_patch(seed), x as i64, y as i64);
    }
    encode_png(&screen)
}

/// A screenshot matching no marker at all.
pub fn blank_screen() -> Vec<u8> {
    screen_with(&[])
}

/// Save the marker pattern for `seed` as a template file.
pub fn write_template(dir: &Path, name: &str, seed: usize) {
    marker_patch(seed).save(dir.join(name)).expect("save template");
}

/// Scripted device: a queue of captures (None = capture failure) and a tap
/// log. The last queue entry repeats forever so bounded waits can poll past
/// the end of the script.
pub struct FakeDevice {
    screens: Mutex<VecDeque<Option<Vec<u8>>>>,
    taps: Mutex<Vec<(u32, u32)>>,
    connected: AtomicBool,
}

impl FakeDevice {
    pub fn new(screens: Vec<Option<Vec<u8>>>) -> Self {
        Self {
            screens: Mutex::new(screens.into()),
            taps: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    pub fn showing(screen: Vec<u8>) -> Self {
        Self::new(vec![Some(screen)])
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn taps(&self) -> Vec<(u32, u32)> {
        self.taps.lock().expect("tap log poisoned").clone()
    }
}

impl DeviceControl for FakeDevice {
    async fn capture_screen(&self) -> DeviceResult<Vec<u8>> {
        let mut queue = self.screens.lock().expect("screen queue poisoned");
        match queue.pop_front() {
            Some(shot) => {
                if queue.is_empty() {
                    queue.push_back(shot.clone());
                }
                shot.ok_or(DeviceError::CaptureUnavailable {
                    reason: "scripted capture failure".to_string(),
                })
            }
            None => Err(DeviceError::CaptureUnavailable {
                reason: "script exhausted".to_string(),
            }),
        }
    }

    async fn tap(&self, x: u32, y: u32) -> DeviceResult<()> {
        self.taps.lock().expect("tap log poisoned").push((x, y));
        Ok(())
    }

    async fn check_connection(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
