use std::collections::{BTreeMap, HashMap};

use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::Client as Ec2Client;

use crate::{Result, SshlessError};

/// Fetch EC2 tags for a set of instance ids, keyed by instance id.
pub async fn instance_tags(
    ec2: &Ec2Client,
    instance_ids: &[String],
) -> Result<HashMap<String, BTreeMap<String, String>>> {
    let mut tags: HashMap<String, BTreeMap<String, String>> = HashMap::new();
    if instance_ids.is_empty() {
        return Ok(tags);
    }

    let filter = Filter::builder()
        .name("resource-id")
        .set_values(Some(instance_ids.to_vec()))
        .build();

    let mut next_token: Option<String> = None;
    loop {
        let response = ec2
            .describe_tags()
            .filters(filter.clone())
            .set_next_token(next_token.take())
            .send()
            .await
            .map_err(SshlessError::ec2)?;

        for tag in response.tags.unwrap_or_default() {
            let (Some(resource_id), Some(key)) = (tag.resource_id, tag.key) else {
                continue;
            };
            tags.entry(resource_id)
                .or_default()
                .insert(key, tag.value.unwrap_or_default());
        }

        next_token = response.next_token;
        if next_token.is_none() {
            break;
        }
    }

    Ok(tags)
}
