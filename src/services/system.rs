//! Putting the machine to sleep through systemd

use std::fmt;

use clap::ValueEnum;
use tokio::process::Command;
use tracing::info;

/// Power state requested when the timer fires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SleepMode {
    #[default]
    Suspend,
    Hibernate,
    HybridSleep,
}

impl SleepMode {
    /// systemctl verb for this mode
    pub fn verb(self) -> &'static str {
        match self {
            SleepMode::Suspend => "suspend",
            SleepMode::Hibernate => "hibernate",
            SleepMode::HybridSleep => "hybrid-sleep",
        }
    }
}

impl fmt::Display for SleepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Ask systemd to put the machine into `mode`
pub async fn execute_system_sleep(mode: SleepMode) -> Result<(), String> {
    info!("Requesting system {}", mode);

    let output = Command::new("systemctl")
        .arg(mode.verb())
        .output()
        .await
        .map_err(|e| format!("Failed to execute systemctl {}: {}", mode, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("systemctl {} failed: {}", mode, stderr.trim()));
    }

    info!("systemctl {} returned", mode);
    Ok(())
}

/// Check if systemctl is available on the system
pub async fn check_systemctl_available() -> Result<(), String> {
    let output = Command::new("systemctl")
        .arg("--version")
        .output()
        .await
        .map_err(|_| "systemctl is not available. Sleeping the system requires systemd.".to_string())?;

    let version = String::from_utf8_lossy(&output.stdout);
    info!("Found {}", version.lines().next().unwrap_or("systemctl"));
    Ok(())
}
