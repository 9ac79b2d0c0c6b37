use std::time::Duration;

use aws_sdk_ssm::types::{Command, CommandStatus};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::aws::client::AwsClients;
use crate::aws::{s3, ssm};
use crate::filter::{parse_filters, FilterSpec};
use crate::{output, state, Result, SshlessError};

#[derive(Args, Debug)]
pub struct CmdArgs {
    /// Shell command to run on the targets
    pub command: String,

    /// Print the command summary block before per-instance output
    #[arg(short, long)]
    pub show_stats: bool,

    /// Target instances by their Name tag
    #[arg(short, long)]
    pub name: Option<String>,

    /// Advanced target filters (Key=Value,...)
    #[arg(short, long, env = "SSHLESS_FILTERS")]
    pub filters: Option<String>,

    /// Comma-separated instance ids (overrides tag and advanced filters)
    #[arg(short, long)]
    pub instances: Option<String>,

    /// Reuse the target filters saved by the previous invocation
    #[arg(long)]
    pub cached_filters: bool,

    /// MaxConcurrency, a count or a percentage (e.g. 10 or 50%)
    #[arg(long)]
    pub max_concurrency: Option<String>,

    /// MaxErrors before SSM stops sending the command
    #[arg(long, default_value = "1")]
    pub max_errors: String,

    /// TimeoutSeconds for each invocation
    #[arg(long)]
    pub timeout: Option<i32>,

    /// Command invocation comment
    #[arg(long, default_value = "sshless cli")]
    pub comment: String,

    /// Poll interval in seconds
    #[arg(long, default_value_t = 1.0)]
    pub interval: f64,

    /// S3 bucket receiving command output; results are fetched from it
    #[arg(long, env = "SSHLESS_S3_OUTPUT")]
    pub s3_output: Option<String>,

    /// Keep fetched S3 output objects instead of deleting them
    #[arg(long)]
    pub preserve_s3_output: bool,
}

/// How the command is targeted at instances
#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetSelection {
    Instances(Vec<String>),
    Filters(Vec<FilterSpec>),
}

pub async fn execute(region: &str, role_arn: Option<&str>, args: CmdArgs) -> Result<()> {
    let selection = resolve_target(&args)?;

    let clients = AwsClients::new(region, role_arn).await?;

    let (instance_ids, targets) = match &selection {
        TargetSelection::Instances(ids) => (Some(ids.clone()), None),
        TargetSelection::Filters(specs) => (None, Some(specs.clone())),
    };

    let request = ssm::CommandRequest {
        command: args.command.clone(),
        comment: args.comment.clone(),
        instance_ids,
        targets,
        max_concurrency: args.max_concurrency.clone(),
        max_errors: args.max_errors.clone(),
        timeout_seconds: args.timeout,
        output_s3_bucket: args.s3_output.clone(),
    };

    let command = ssm::send_command(&clients.ssm, &request).await?;
    let command_id = command.command_id().unwrap_or_default().to_string();
    debug!("==> {}", output::command_url(&clients.region, &command_id));

    if let TargetSelection::Filters(specs) = &selection {
        state::save_filters(specs)?;
    }

    let Some(command) = poll_until_done(&clients, &command_id, args.interval).await? else {
        println!("{}", "TargetCount: 0".red());
        return Ok(());
    };

    if args.show_stats {
        print!("{}", output::format_command_stats(&command));
    }

    match &args.s3_output {
        Some(bucket) => {
            print_s3_output(&clients, bucket, &command_id, args.preserve_s3_output).await
        }
        None => print_invocations(&clients, &command_id).await,
    }
}

fn resolve_target(args: &CmdArgs) -> Result<TargetSelection> {
    if args.name.is_some() && args.filters.is_some() {
        return Err(SshlessError::ConflictingTargets);
    }

    if let Some(instances) = &args.instances {
        if args.name.is_some() || args.filters.is_some() {
            warn!("--instances overrides tag and advanced filters");
        }

        let ids: Vec<String> = instances
            .split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        if ids.is_empty() {
            return Err(SshlessError::NoTargets);
        }
        return Ok(TargetSelection::Instances(ids));
    }

    if let Some(name) = &args.name {
        return Ok(TargetSelection::Filters(vec![FilterSpec::name_tag(name)]));
    }

    if let Some(filters) = &args.filters {
        return Ok(TargetSelection::Filters(parse_filters(filters)?));
    }

    if args.cached_filters {
        return state::load_filters()?
            .map(TargetSelection::Filters)
            .ok_or(SshlessError::NoCachedFilters);
    }

    Err(SshlessError::NoTargets)
}

/// Poll until the command reaches a terminal status with all targets complete.
///
/// Returns `None` when the command matched no targets at all. A flat
/// sleep-then-repoll loop; the remote TimeoutSeconds is the only bound.
async fn poll_until_done(
    clients: &AwsClients,
    command_id: &str,
    interval_secs: f64,
) -> Result<Option<Command>> {
    let spinner = create_spinner(&format!("Waiting for command {}...", command_id));
    let outcome = poll_loop(clients, command_id, interval_secs, &spinner).await;
    spinner.finish_and_clear();
    outcome
}

async fn poll_loop(
    clients: &AwsClients,
    command_id: &str,
    interval_secs: f64,
    spinner: &ProgressBar,
) -> Result<Option<Command>> {
    let interval = Duration::from_secs_f64(interval_secs);

    loop {
        tokio::time::sleep(interval).await;

        let Some(command) = ssm::list_commands(&clients.ssm, command_id)
            .await?
            .into_iter()
            .next()
        else {
            return Err(SshlessError::CommandNotFound(command_id.to_string()));
        };

        if command.target_count() == 0 {
            return Ok(None);
        }

        spinner.set_message(format!(
            "Command {}: {} ({}/{} complete)",
            command_id,
            command.status().map(|s| s.as_str()).unwrap_or("Pending"),
            command.completed_count(),
            command.target_count()
        ));

        if command_complete(&command) {
            return Ok(Some(command));
        }
    }
}

/// Terminal status with every target accounted for
fn command_complete(command: &Command) -> bool {
    let status = command.status().cloned().unwrap_or(CommandStatus::Pending);
    let terminal = !matches!(status, CommandStatus::Pending | CommandStatus::InProgress);
    terminal && command.target_count() == command.completed_count()
}

async fn print_invocations(clients: &AwsClients, command_id: &str) -> Result<()> {
    let invocations = ssm::list_command_invocations(&clients.ssm, command_id, true).await?;
    if invocations.is_empty() {
        return Ok(());
    }

    println!();
    for invocation in &invocations {
        let status = invocation.status().map(|s| s.as_str()).unwrap_or("Unknown");
        println!(
            "[{}] {} {}",
            output::colorize_status(status),
            invocation.instance_id().unwrap_or_default(),
            invocation.instance_name().unwrap_or_default()
        );

        for plugin in invocation.command_plugins() {
            if let Some(text) = plugin.output() {
                println!("{}", text);
            }
        }
    }

    Ok(())
}

async fn print_s3_output(
    clients: &AwsClients,
    bucket: &str,
    command_id: &str,
    preserve: bool,
) -> Result<()> {
    let outputs = s3::fetch_command_output(&clients.s3, bucket, command_id).await?;
    if outputs.is_empty() {
        warn!("no output objects found in s3://{}/{}", bucket, command_id);
        return Ok(());
    }

    println!();
    for entry in &outputs {
        println!(
            "[{}] {}",
            output::colorize_status(entry.stream.status_label()),
            entry.instance_id
        );
        println!("{}", entry.body);
    }

    if !preserve {
        let keys = outputs.into_iter().map(|entry| entry.key).collect();
        s3::delete_command_output(&clients.s3, bucket, keys).await?;
        debug!("deleted command output from s3://{}/{}", bucket, command_id);
    }

    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CmdArgs {
        CmdArgs {
            command: "uptime".to_string(),
            show_stats: false,
            name: None,
            filters: None,
            instances: None,
            cached_filters: false,
            max_concurrency: None,
            max_errors: "1".to_string(),
            timeout: None,
            comment: "sshless cli".to_string(),
            interval: 1.0,
            s3_output: None,
            preserve_s3_output: false,
        }
    }

    #[test]
    fn test_name_and_filters_are_mutually_exclusive() {
        let args = CmdArgs {
            name: Some("web".to_string()),
            filters: Some("tag:Role=web".to_string()),
            ..base_args()
        };

        assert!(matches!(
            resolve_target(&args),
            Err(SshlessError::ConflictingTargets)
        ));
    }

    #[test]
    fn test_conflict_check_runs_before_instances_override() {
        let args = CmdArgs {
            name: Some("web".to_string()),
            filters: Some("tag:Role=web".to_string()),
            instances: Some("i-0123".to_string()),
            ..base_args()
        };

        assert!(matches!(
            resolve_target(&args),
            Err(SshlessError::ConflictingTargets)
        ));
    }

    #[test]
    fn test_instances_override_name() {
        let args = CmdArgs {
            name: Some("web".to_string()),
            instances: Some("i-0123, i-0456".to_string()),
            ..base_args()
        };

        assert_eq!(
            resolve_target(&args).unwrap(),
            TargetSelection::Instances(vec!["i-0123".to_string(), "i-0456".to_string()])
        );
    }

    #[test]
    fn test_name_becomes_tag_filter() {
        let args = CmdArgs {
            name: Some("web".to_string()),
            ..base_args()
        };

        assert_eq!(
            resolve_target(&args).unwrap(),
            TargetSelection::Filters(vec![FilterSpec::name_tag("web")])
        );
    }

    #[test]
    fn test_filters_are_parsed() {
        let args = CmdArgs {
            filters: Some("tag:Role=web,PingStatus=Online".to_string()),
            ..base_args()
        };

        let TargetSelection::Filters(specs) = resolve_target(&args).unwrap() else {
            panic!("expected filter targets");
        };
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].key, "tag:Role");
    }

    #[test]
    fn test_malformed_filters_are_rejected() {
        let args = CmdArgs {
            filters: Some("tag:Role".to_string()),
            ..base_args()
        };

        assert!(matches!(
            resolve_target(&args),
            Err(SshlessError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_no_targets_is_rejected() {
        assert!(matches!(
            resolve_target(&base_args()),
            Err(SshlessError::NoTargets)
        ));
    }

    #[test]
    fn test_command_complete_requires_terminal_status_and_matching_counts() {
        let in_progress = Command::builder()
            .status(CommandStatus::InProgress)
            .target_count(3)
            .completed_count(3)
            .build();
        assert!(!command_complete(&in_progress));

        let partially_complete = Command::builder()
            .status(CommandStatus::Failed)
            .target_count(3)
            .completed_count(2)
            .build();
        assert!(!command_complete(&partially_complete));

        let done = Command::builder()
            .status(CommandStatus::Success)
            .target_count(3)
            .completed_count(3)
            .build();
        assert!(command_complete(&done));
    }

    #[test]
    fn test_empty_instance_list_is_rejected() {
        let args = CmdArgs {
            instances: Some(" , ".to_string()),
            ..base_args()
        };

        assert!(matches!(
            resolve_target(&args),
            Err(SshlessError::NoTargets)
        ));
    }
}
