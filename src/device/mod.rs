// Device transport layer.
// The automation engine only ever talks to the device through the
// `DeviceControl` trait: grab a screenshot, fire a tap, probe connectivity.
// `AdbShell` implements it on top of the `adb` command line tool.

pub mod error;
pub mod shell;

pub use error::{DeviceError, DeviceResult};
pub use shell::AdbShell;

/// Capabilities the engine needs from a controlled device.
///
/// Capture and tap are invoked synchronously from the worker and are never
/// retried at this layer. Transient capture failures are policy for the
/// caller (the waiter skips the poll iteration, handlers fall back per
/// state), not for the transport.
pub trait DeviceControl: Send + Sync + 'static {
    /// Capture the current display as encoded image bytes (PNG on Android).
    fn capture_screen(&self) -> impl Future<Output = DeviceResult<Vec<u8>>> + Send;

    /// Fire a single tap at device coordinates. No acknowledgement contract.
    fn tap(&self, x: u32, y: u32) -> impl Future<Output = DeviceResult<()>> + Send;

    /// Cheap connectivity probe, used once at start time.
    fn check_connection(&self) -> impl Future<Output = bool> + Send;
}
