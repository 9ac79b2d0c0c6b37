use aws_sdk_ssm::types::{Command, CommandInvocation, InstanceInformation, Target};
use aws_sdk_ssm::Client as SsmClient;

use crate::filter::FilterSpec;
use crate::{Result, SshlessError};

/// SSM document executed by `sshless cmd`
pub const RUN_SHELL_SCRIPT: &str = "AWS-RunShellScript";

/// Page size for SSM list calls
const MAX_RESULTS: i32 = 50;

/// A fully resolved SendCommand request
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub command: String,
    pub comment: String,
    pub instance_ids: Option<Vec<String>>,
    pub targets: Option<Vec<FilterSpec>>,
    pub max_concurrency: Option<String>,
    pub max_errors: String,
    pub timeout_seconds: Option<i32>,
    pub output_s3_bucket: Option<String>,
}

/// Send an AWS-RunShellScript command and return the submitted command record
pub async fn send_command(ssm: &SsmClient, request: &CommandRequest) -> Result<Command> {
    let targets: Option<Vec<Target>> = request
        .targets
        .as_ref()
        .map(|specs| specs.iter().map(FilterSpec::to_target).collect());

    let response = ssm
        .send_command()
        .document_name(RUN_SHELL_SCRIPT)
        .parameters("commands", vec![request.command.clone()])
        .comment(&request.comment)
        .set_instance_ids(request.instance_ids.clone())
        .set_targets(targets)
        .set_max_concurrency(request.max_concurrency.clone())
        .max_errors(&request.max_errors)
        .set_timeout_seconds(request.timeout_seconds)
        .set_output_s3_bucket_name(request.output_s3_bucket.clone())
        .send()
        .await
        .map_err(SshlessError::ssm)?;

    response
        .command
        .ok_or_else(|| SshlessError::Ssm("SendCommand returned no command".to_string()))
}

/// List command records for a command id, following pagination
pub async fn list_commands(ssm: &SsmClient, command_id: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let response = ssm
            .list_commands()
            .command_id(command_id)
            .max_results(MAX_RESULTS)
            .set_next_token(next_token.take())
            .send()
            .await
            .map_err(SshlessError::ssm)?;

        commands.extend(response.commands.unwrap_or_default());

        next_token = response.next_token;
        if next_token.is_none() {
            break;
        }
    }

    Ok(commands)
}

/// List per-instance invocations for a command id, following pagination
pub async fn list_command_invocations(
    ssm: &SsmClient,
    command_id: &str,
    details: bool,
) -> Result<Vec<CommandInvocation>> {
    let mut invocations = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let response = ssm
            .list_command_invocations()
            .command_id(command_id)
            .details(details)
            .max_results(MAX_RESULTS)
            .set_next_token(next_token.take())
            .send()
            .await
            .map_err(SshlessError::ssm)?;

        invocations.extend(response.command_invocations.unwrap_or_default());

        next_token = response.next_token;
        if next_token.is_none() {
            break;
        }
    }

    Ok(invocations)
}

/// Describe SSM-managed instances matching the given filters, following pagination
pub async fn describe_instance_information(
    ssm: &SsmClient,
    filters: &[FilterSpec],
) -> Result<Vec<InstanceInformation>> {
    let mut string_filters = Vec::with_capacity(filters.len());
    for spec in filters {
        string_filters.push(spec.to_instance_filter()?);
    }

    let mut instances = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let response = ssm
            .describe_instance_information()
            .set_filters(Some(string_filters.clone()))
            .max_results(MAX_RESULTS)
            .set_next_token(next_token.take())
            .send()
            .await
            .map_err(SshlessError::ssm)?;

        instances.extend(response.instance_information_list.unwrap_or_default());

        next_token = response.next_token;
        if next_token.is_none() {
            break;
        }
    }

    Ok(instances)
}
