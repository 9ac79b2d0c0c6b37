use clap::Args;

use crate::aws::client::AwsClients;
use crate::aws::{ec2, ssm};
use crate::output::InstanceInfo;
use crate::{filter, Result};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Instance information filters (Key=Value,...)
    #[arg(short, long, default_value = "PingStatus=Online")]
    pub filters: String,

    /// Enrich each instance with its EC2 tags
    #[arg(short = 't', long)]
    pub show_tags: bool,
}

pub async fn execute(region: &str, role_arn: Option<&str>, args: ListArgs) -> Result<()> {
    let specs = filter::parse_filters(&args.filters)?;

    let clients = AwsClients::new(region, role_arn).await?;
    let instances = ssm::describe_instance_information(&clients.ssm, &specs).await?;

    let mut infos: Vec<InstanceInfo> = instances.iter().map(InstanceInfo::from).collect();

    if args.show_tags && !infos.is_empty() {
        let ids: Vec<String> = infos.iter().map(|i| i.instance_id.clone()).collect();
        let mut tags = ec2::instance_tags(&clients.ec2, &ids).await?;

        for info in &mut infos {
            info.tags = tags.remove(&info.instance_id);
        }
    }

    println!("{}", serde_json::to_string_pretty(&infos)?);

    Ok(())
}
