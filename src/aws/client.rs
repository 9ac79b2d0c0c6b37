use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_ssm::Client as SsmClient;
use tracing::info;

use crate::Result;

/// Session name recorded in CloudTrail when a role is assumed
const ROLE_SESSION_NAME: &str = "sshless";

/// AWS client wrapper holding all service clients
#[derive(Clone)]
pub struct AwsClients {
    pub ssm: SsmClient,
    pub ec2: Ec2Client,
    pub s3: S3Client,
    pub region: String,
}

impl AwsClients {
    /// Create new AWS clients for a region, optionally assuming an IAM role.
    ///
    /// With no role the ambient credential chain is used (environment,
    /// shared config, instance profile).
    pub async fn new(region: &str, role_arn: Option<&str>) -> Result<Self> {
        let region_provider = Region::new(region.to_string());
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(region_provider.clone());

        if let Some(arn) = role_arn {
            info!("assume role: {}", arn);
            let provider = AssumeRoleProvider::builder(arn)
                .session_name(ROLE_SESSION_NAME)
                .region(region_provider)
                .build()
                .await;
            loader = loader.credentials_provider(provider);
        }

        let config = loader.load().await;

        Ok(Self {
            ssm: SsmClient::new(&config),
            ec2: Ec2Client::new(&config),
            s3: S3Client::new(&config),
            region: region.to_string(),
        })
    }
}
