use std::collections::BTreeMap;

use aws_sdk_ssm::primitives::DateTime;
use aws_sdk_ssm::types::{Command, InstanceInformation};
use chrono::Utc;
use colored::{ColoredString, Colorize};
use serde::Serialize;

/// Left gutter width for the stats block
const LPAD: usize = 13;

/// Color a command or invocation status: green for Success, red otherwise
pub fn colorize_status(status: &str) -> ColoredString {
    if status == "Success" {
        status.green()
    } else {
        status.red()
    }
}

/// Render an SSM timestamp without sub-second noise
pub fn format_datetime(datetime: &DateTime) -> String {
    chrono::DateTime::<Utc>::from_timestamp(datetime.secs(), datetime.subsec_nanos())
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| datetime.to_string())
}

/// AWS console URL for a submitted command
pub fn command_url(region: &str, command_id: &str) -> String {
    format!(
        "https://console.aws.amazon.com/ec2/v2/home?region={}#Commands:CommandId={};sort=CommandId",
        region, command_id
    )
}

/// Render the `--show-stats` summary block for a command record
pub fn format_command_stats(command: &Command) -> String {
    let status = command
        .status()
        .map(|s| s.as_str())
        .unwrap_or("Unknown");

    let mut block = format!(
        "{:>pad$}{}\n",
        format!("[{}] ", colorize_status(status)),
        command.command_id().unwrap_or_default(),
        pad = LPAD
    );

    if let Some(requested) = command.requested_date_time() {
        block.push_str(&stat_line("Requested: ", format_datetime(requested)));
    }

    if let Some(text) = command
        .parameters()
        .and_then(|p| p.get("commands"))
        .and_then(|c| c.first())
    {
        block.push_str(&stat_line("Command: ", text));
    }

    if !command.instance_ids().is_empty() {
        block.push_str(&stat_line("InstanceIds: ", command.instance_ids().join(",")));
    }

    if let Some(target) = command.targets().first() {
        block.push_str(&stat_line(
            "Target: ",
            format!(
                "{} - {}",
                target.key().unwrap_or_default(),
                target.values().first().map(String::as_str).unwrap_or_default()
            ),
        ));
    }

    block.push_str(&stat_line(
        "Stats: ",
        format!(
            "Targets: {} Completed: {} Errors: {}",
            command.target_count(),
            command.completed_count(),
            command.error_count()
        ),
    ));

    block
}

fn stat_line(label: &str, value: impl std::fmt::Display) -> String {
    format!("{:pad$}{:<pad$}{}\n", "", label, value, pad = LPAD)
}

/// Serializable projection of an SSM `InstanceInformation` record.
///
/// Field names match the service vocabulary so the JSON reads like the raw
/// API response; absent fields are omitted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceInfo {
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ping_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_latest_version: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    #[serde(rename = "IPAddress", skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

impl From<&InstanceInformation> for InstanceInfo {
    fn from(info: &InstanceInformation) -> Self {
        Self {
            instance_id: info.instance_id().unwrap_or_default().to_string(),
            computer_name: info.computer_name().map(String::from),
            ping_status: info.ping_status().map(|s| s.as_str().to_string()),
            last_ping_date_time: info.last_ping_date_time().map(format_datetime),
            agent_version: info.agent_version().map(String::from),
            is_latest_version: info.is_latest_version(),
            platform_type: info.platform_type().map(|p| p.as_str().to_string()),
            platform_name: info.platform_name().map(String::from),
            platform_version: info.platform_version().map(String::from),
            ip_address: info.ip_address().map(String::from),
            tags: None,
        }
    }
}
