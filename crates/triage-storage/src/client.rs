use aws_sdk_s3::Client;

/// Build an S3 client from a loaded AWS config.
pub fn build_client(config: &aws_config::SdkConfig) -> Client {
    Client::new(config)
}
