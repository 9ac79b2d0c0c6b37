pub mod client;
pub mod ec2;
pub mod s3;
pub mod ssm;
