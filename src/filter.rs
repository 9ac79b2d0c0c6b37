use aws_sdk_ssm::types::{InstanceInformationStringFilter, Target};
use serde::{Deserialize, Serialize};

use crate::{Result, SshlessError};

/// A single Key=Value target filter, usable both as a Run Command `Target`
/// and as a `DescribeInstanceInformation` string filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub key: String,
    pub values: Vec<String>,
}

impl FilterSpec {
    /// Filter matching instances by their `Name` tag
    pub fn name_tag(name: &str) -> Self {
        Self {
            key: "tag:Name".to_string(),
            values: vec![name.to_string()],
        }
    }

    pub fn to_target(&self) -> Target {
        Target::builder()
            .key(&self.key)
            .set_values(Some(self.values.clone()))
            .build()
    }

    pub fn to_instance_filter(&self) -> Result<InstanceInformationStringFilter> {
        InstanceInformationStringFilter::builder()
            .key(&self.key)
            .set_values(Some(self.values.clone()))
            .build()
            .map_err(SshlessError::ssm)
    }
}

/// Parse a comma-separated `Key=Value,Key=Value` filter expression.
///
/// Each element must contain exactly one `=` with a non-empty key and value.
pub fn parse_filters(input: &str) -> Result<Vec<FilterSpec>> {
    let mut specs = Vec::new();

    for element in input.split(',') {
        let element = element.trim();
        let Some((key, value)) = element.split_once('=') else {
            return Err(SshlessError::InvalidFilter(element.to_string()));
        };

        if key.is_empty() || value.is_empty() || value.contains('=') {
            return Err(SshlessError::InvalidFilter(element.to_string()));
        }

        specs.push(FilterSpec {
            key: key.to_string(),
            values: vec![value.to_string()],
        });
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_filter() {
        let specs = parse_filters("PingStatus=Online").unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].key, "PingStatus");
        assert_eq!(specs[0].values, vec!["Online".to_string()]);
    }

    #[test]
    fn test_parse_multiple_filters() {
        let specs = parse_filters("tag:Role=web,PlatformTypes=Linux").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].key, "tag:Role");
        assert_eq!(specs[1].key, "PlatformTypes");
        assert_eq!(specs[1].values, vec!["Linux".to_string()]);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let specs = parse_filters("PingStatus=Online, PlatformTypes=Linux").unwrap();
        assert_eq!(specs[1].key, "PlatformTypes");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_filters("PingStatus").is_err());
        assert!(parse_filters("=Online").is_err());
        assert!(parse_filters("PingStatus=").is_err());
        assert!(parse_filters("PingStatus=On=line").is_err());
        assert!(parse_filters("").is_err());
        assert!(parse_filters("PingStatus=Online,,").is_err());
    }

    #[test]
    fn test_name_tag_filter() {
        let spec = FilterSpec::name_tag("web-frontend");
        assert_eq!(spec.key, "tag:Name");
        assert_eq!(spec.values, vec!["web-frontend".to_string()]);
    }

    #[test]
    fn test_to_target() {
        let target = FilterSpec::name_tag("web").to_target();
        assert_eq!(target.key(), Some("tag:Name"));
        assert_eq!(target.values(), ["web".to_string()]);
    }

    #[test]
    fn test_to_instance_filter() {
        let filter = parse_filters("PingStatus=Online").unwrap()[0]
            .to_instance_filter()
            .unwrap();
        assert_eq!(filter.key(), "PingStatus");
        assert_eq!(filter.values(), ["Online".to_string()]);
    }
}
