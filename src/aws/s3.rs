use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

use crate::{Result, SshlessError};

/// Which plugin stream an S3 output object holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    /// Status label shown next to output retrieved from S3
    pub fn status_label(self) -> &'static str {
        match self {
            OutputStream::Stdout => "Success",
            OutputStream::Stderr => "Error",
        }
    }
}

/// One retrieved per-instance output object
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub key: String,
    pub instance_id: String,
    pub stream: OutputStream,
    pub body: String,
}

/// Parse a Run Command output key into its instance id and stream.
///
/// Keys look like `<command-id>/<instance-id>/awsrunShellScript/0.awsrunShellScript/stdout`.
pub fn parse_output_key(key: &str) -> Option<(String, OutputStream)> {
    let instance_id = key.split('/').nth(1)?;
    if instance_id.is_empty() {
        return None;
    }

    let stream = if key.ends_with("stdout") {
        OutputStream::Stdout
    } else {
        OutputStream::Stderr
    };

    Some((instance_id.to_string(), stream))
}

/// Fetch every output object a command wrote under `<bucket>/<command-id>/`
pub async fn fetch_command_output(
    s3: &S3Client,
    bucket: &str,
    command_id: &str,
) -> Result<Vec<CommandOutput>> {
    let prefix = format!("{}/", command_id);
    let mut keys = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let response = s3
            .list_objects_v2()
            .bucket(bucket)
            .prefix(&prefix)
            .set_continuation_token(continuation_token.take())
            .send()
            .await
            .map_err(SshlessError::s3)?;

        keys.extend(
            response
                .contents
                .unwrap_or_default()
                .into_iter()
                .filter_map(|object| object.key),
        );

        continuation_token = response.next_continuation_token;
        if continuation_token.is_none() {
            break;
        }
    }

    let mut outputs = Vec::with_capacity(keys.len());
    for key in keys {
        let Some((instance_id, stream)) = parse_output_key(&key) else {
            debug!("skipping unrecognized output key: {}", key);
            continue;
        };

        let object = s3
            .get_object()
            .bucket(bucket)
            .key(&key)
            .send()
            .await
            .map_err(SshlessError::s3)?;

        let bytes = object.body.collect().await.map_err(SshlessError::s3)?;
        let body = String::from_utf8_lossy(&bytes.into_bytes()).into_owned();

        outputs.push(CommandOutput {
            key,
            instance_id,
            stream,
            body,
        });
    }

    Ok(outputs)
}

/// Delete fetched output objects in a single batch call
pub async fn delete_command_output(s3: &S3Client, bucket: &str, keys: Vec<String>) -> Result<()> {
    if keys.is_empty() {
        return Ok(());
    }

    let mut objects = Vec::with_capacity(keys.len());
    for key in keys {
        objects.push(
            ObjectIdentifier::builder()
                .key(key)
                .build()
                .map_err(SshlessError::s3)?,
        );
    }

    let delete = Delete::builder()
        .set_objects(Some(objects))
        .build()
        .map_err(SshlessError::s3)?;

    s3.delete_objects()
        .bucket(bucket)
        .delete(delete)
        .send()
        .await
        .map_err(SshlessError::s3)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_key_stdout() {
        let key = "7729dd70-1f85-4b85-b15e-7b0dcdcd6e35/i-0123456789abcdef0/awsrunShellScript/0.awsrunShellScript/stdout";
        let (instance_id, stream) = parse_output_key(key).unwrap();
        assert_eq!(instance_id, "i-0123456789abcdef0");
        assert_eq!(stream, OutputStream::Stdout);
        assert_eq!(stream.status_label(), "Success");
    }

    #[test]
    fn test_parse_output_key_stderr() {
        let key = "7729dd70-1f85-4b85-b15e-7b0dcdcd6e35/i-0123456789abcdef0/awsrunShellScript/0.awsrunShellScript/stderr";
        let (_, stream) = parse_output_key(key).unwrap();
        assert_eq!(stream, OutputStream::Stderr);
        assert_eq!(stream.status_label(), "Error");
    }

    #[test]
    fn test_parse_output_key_malformed() {
        assert!(parse_output_key("no-instance-segment").is_none());
        assert!(parse_output_key("command-id/").is_none());
    }
}
