use thiserror::Error;

/// A specialized `Result` type for device transport operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// The error type for device capture/tap operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Failed to run '{command}': {source}")]
    CommandSpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("'{command}' exited with an error: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("No screenshot available: {reason}")]
    CaptureUnavailable { reason: String },

    #[error("Tap coordinates out of bounds: x={x}, y={y} (screen {width}x{height})")]
    TapOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("No devices found")]
    NoDeviceFound,

    #[error("Could not parse screen size from 'wm size' output")]
    ScreenSizeParseFailed,
}
