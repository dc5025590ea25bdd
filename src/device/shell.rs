use super::error::{DeviceError, DeviceResult};
use super::DeviceControl;
use tokio::process::Command;

/// Device transport backed by the `adb` command line tool.
///
/// Screenshots come from `adb exec-out screencap -p`, taps go through
/// `adb shell input tap`. Commands are pinned to a transport id so a second
/// device showing up mid-run cannot hijack the session.
#[derive(Clone, Debug, PartialEq)]
pub struct AdbShell {
    device_name: String,
    transport_id: u32,
    screen_x: u32,
    screen_y: u32,
}

/// One attached device as reported by `adb devices -l`.
#[derive(Clone, Debug, PartialEq)]
pub struct Device {
    pub name: String,
    pub transport_id: Option<String>,
}

impl AdbShell {
    /// Connect to the first device reported by `adb devices -l`.
    pub async fn connect_first() -> DeviceResult<Self> {
        let devices = Self::list_devices().await?;
        let device = devices.into_iter().next().ok_or(DeviceError::NoDeviceFound)?;
        Self::open(device).await
    }

    /// Connect to a device by serial/name.
    pub async fn connect(device_name: &str) -> DeviceResult<Self> {
        let devices = Self::list_devices().await?;
        let device = devices
            .into_iter()
            .find(|d| d.name == device_name)
            .ok_or(DeviceError::NoDeviceFound)?;
        Self::open(device).await
    }

    async fn open(device: Device) -> DeviceResult<Self> {
        let transport_id = device
            .transport_id
            .as_deref()
            .and_then(|tid| tid.parse::<u32>().ok())
            .ok_or(DeviceError::NoDeviceFound)?;
        let (screen_x, screen_y) = Self::query_screen_size(transport_id).await?;
        log::info!(
            "Connected to device '{}' (transport {}, screen {}x{})",
            device.name,
            transport_id,
            screen_x,
            screen_y
        );
        Ok(Self {
            device_name: device.name,
            transport_id,
            screen_x,
            screen_y,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn screen_dimensions(&self) -> (u32, u32) {
        (self.screen_x, self.screen_y)
    }

    pub async fn list_devices() -> DeviceResult<Vec<Device>> {
        let output = Command::new("adb")
            .arg("devices")
            .arg("-l")
            .output()
            .await
            .map_err(|e| DeviceError::CommandSpawnFailed {
                command: "adb devices -l".to_string(),
                source: e,
            })?;
        if !output.status.success() {
            return Err(DeviceError::CommandFailed {
                command: "adb devices -l".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(Self::parse_devices(&String::from_utf8_lossy(&output.stdout)))
    }

    fn parse_devices(output: &str) -> Vec<Device> {
        output
            .lines()
            .skip(1)
            .filter_map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 && parts[1] == "device" {
                    let name = parts[0].to_string();
                    let transport_id = line.split_whitespace().find_map(|part| {
                        part.strip_prefix("transport_id:").map(|id| id.to_string())
                    });
                    Some(Device { name, transport_id })
                } else {
                    None
                }
            })
            .collect()
    }

    async fn query_screen_size(transport_id: u32) -> DeviceResult<(u32, u32)> {
        let output = Command::new("adb")
            .arg("-t")
            .arg(transport_id.to_string())
            .arg("shell")
            .arg("wm")
            .arg("size")
            .output()
            .await
            .map_err(|e| DeviceError::CommandSpawnFailed {
                command: "adb shell wm size".to_string(),
                source: e,
            })?;
        if !output.status.success() {
            return Err(DeviceError::CommandFailed {
                command: "adb shell wm size".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Self::parse_screen_size(&String::from_utf8_lossy(&output.stdout))
    }

    fn parse_screen_size(stdout: &str) -> DeviceResult<(u32, u32)> {
        for line in stdout.lines() {
            if let Some(size_str) = line.strip_prefix("Physical size: ") {
                let parts: Vec<&str> = size_str.trim().split('x').collect();
                if parts.len() == 2
                    && let (Ok(x), Ok(y)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>())
                {
                    return Ok((x, y));
                }
            }
        }
        Err(DeviceError::ScreenSizeParseFailed)
    }
}

impl DeviceControl for AdbShell {
    async fn capture_screen(&self) -> DeviceResult<Vec<u8>> {
        let output = Command::new("adb")
            .arg("-t")
            .arg(self.transport_id.to_string())
            .arg("exec-out")
            .arg("screencap")
            .arg("-p")
            .output()
            .await
            .map_err(|e| DeviceError::CaptureUnavailable {
                reason: format!("failed to run adb screencap: {e}"),
            })?;
        if !output.status.success() {
            return Err(DeviceError::CaptureUnavailable {
                reason: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output.stdout)
    }

    async fn tap(&self, x: u32, y: u32) -> DeviceResult<()> {
        if x > self.screen_x || y > self.screen_y {
            return Err(DeviceError::TapOutOfBounds {
                x,
                y,
                width: self.screen_x,
                height: self.screen_y,
            });
        }
        let output = Command::new("adb")
            .arg("-t")
            .arg(self.transport_id.to_string())
            .arg("shell")
            .arg("input")
            .arg("tap")
            .arg(x.to_string())
            .arg(y.to_string())
            .output()
            .await
            .map_err(|e| DeviceError::CommandSpawnFailed {
                command: "adb shell input tap".to_string(),
                source: e,
            })?;
        if !output.status.success() {
            return Err(DeviceError::CommandFailed {
                command: "adb shell input tap".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }

    async fn check_connection(&self) -> bool {
        match Command::new("adb")
            .arg("-t")
            .arg(self.transport_id.to_string())
            .arg("get-state")
            .output()
            .await
        {
            Ok(output) => {
                output.status.success()
                    && String::from_utf8_lossy(&output.stdout).trim() == "device"
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_devices_basic() {
        let adb_output = "List of devices attached\nabc123 device transport_id:5\n";
        let devs = AdbShell::parse_devices(adb_output);
        assert_eq!(devs.len(), 1);
        assert_eq!(devs[0].name, "abc123");
        assert_eq!(devs[0].transport_id, Some("5".to_string()));
    }

    #[test]
    fn parse_devices_skips_unauthorized() {
        let adb_output =
            "List of devices attached\nabc123 unauthorized transport_id:5\ndef456 device transport_id:7\n";
        let devs = AdbShell::parse_devices(adb_output);
        assert_eq!(devs.len(), 1);
        assert_eq!(devs[0].name, "def456");
    }

    #[test]
    fn parse_screen_size_physical() {
        let out = "Physical size: 1600x900\n";
        assert_eq!(AdbShell::parse_screen_size(out).unwrap(), (1600, 900));
    }

    #[test]
    fn parse_screen_size_garbage_is_error() {
        assert!(AdbShell::parse_screen_size("no size here\n").is_err());
    }
}
