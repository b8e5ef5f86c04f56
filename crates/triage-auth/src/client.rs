use aws_sdk_cognitoidentityprovider::Client;

/// Build a Cognito Identity Provider client from a loaded AWS config.
pub fn build_client(config: &aws_config::SdkConfig) -> Client {
    Client::new(config)
}
