//! Channel switching through an external viewer command

use tokio::process::Command;
use tracing::{debug, info};

use crate::host::ChannelTarget;

/// Expands `{driver}`, `{space}`, `{channel}`, `{network_id}`, `{service_id}`
/// and `{name}` in each whitespace-separated word of `template`
pub fn render_switch_command(template: &str, target: &ChannelTarget) -> Vec<String> {
    template
        .split_whitespace()
        .map(|word| {
            word.replace("{driver}", &target.driver)
                .replace("{space}", &target.space.to_string())
                .replace("{channel}", &target.channel.to_string())
                .replace("{network_id}", &target.network_id.to_string())
                .replace("{service_id}", &target.service_id.to_string())
                .replace("{name}", &target.name)
        })
        .collect()
}

/// Run the configured switch command for `target`
pub async fn execute_channel_switch(template: &str, target: &ChannelTarget) -> Result<(), String> {
    let args = render_switch_command(template, target);
    let Some((program, rest)) = args.split_first() else {
        return Err("Channel switch command is empty".to_string());
    };

    debug!("Switching channel with {} {:?}", program, rest);

    let output = Command::new(program)
        .args(rest)
        .output()
        .await
        .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} failed: {}", program, stderr));
    }

    info!("Switched to {}", target.name);
    Ok(())
}
