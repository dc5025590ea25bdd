use super::matcher::{Point, TemplateMatcher};
use crate::device::DeviceControl;
use tokio::time::{sleep, Duration, Instant};

/// Poll the screen until one of the candidate templates shows up or the
/// deadline passes.
///
/// Candidates are checked in list order against each screenshot; the order
/// encodes caller priority, so if two candidates match the same frame the
/// earlier one wins. A failed capture skips the poll iteration instead of
/// counting toward the timeout. Worst-case blocking time is
/// `timeout + poll_interval + one capture latency`.
pub async fn wait_for_any<D: DeviceControl>(
    device: &D,
    matcher: &TemplateMatcher,
    candidates: &[&str],
    timeout: Duration,
    poll_interval: Duration,
) -> Option<(String, Point)> {
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        let screen = match device.capture_screen().await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Screen capture failed while waiting: {e}");
                sleep(poll_interval).await;
                continue;
            }
        };

        for name in candidates {
            if let Some(found) = matcher.find_in_screen(&screen, name) {
                log::info!(
                    "Found '{}' at ({}, {}) with confidence {:.3}",
                    name,
                    found.location.x,
                    found.location.y,
                    found.confidence
                );
                return Some((name.to_string(), found.location));
            }
        }

        sleep(poll_interval).await;
    }

    log::warn!("Timed out after {timeout:?} waiting for any of {candidates:?}");
    None
}
