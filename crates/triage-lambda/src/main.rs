use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use triage_auth::cognito::CognitoIdentity;
use triage_auth::identity::{IdentityProvider, StaticIdentity};
use triage_auth::jwt::TokenVerifier;
use triage_bedrock::generator::{BedrockGenerator, TimeoutGenerator};
use triage_dialogue::submission::NoteSubmitter;
use triage_lambda::config::AppConfig;
use triage_lambda::state::AppState;
use triage_storage::local::LocalNoteStore;
use triage_storage::s3::S3NoteStore;
use triage_storage::store::NoteStore;
use triage_storage::subscribe::subscribe;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging for CloudWatch
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = AppConfig::from_env()?;
    let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let bedrock = BedrockGenerator::new(triage_bedrock::client::build_client(&aws), &config.model_id)?;
    let generator = Arc::new(TimeoutGenerator::new(bedrock, config.generation_timeout));

    let durable: Arc<dyn NoteStore> = Arc::new(S3NoteStore::new(
        triage_storage::client::build_client(&aws),
        &config.bucket,
        &config.notes_prefix,
    ));
    let local: Arc<dyn NoteStore> = Arc::new(LocalNoteStore::new(&config.local_store));

    let (cognito, verifier) = match &config.cognito {
        Some(cognito) => {
            let identity = Arc::new(CognitoIdentity::new(
                triage_auth::client::build_client(&aws),
                &cognito.client_id,
                cognito.sign_in.clone(),
            ));
            let verifier = match (&cognito.public_key_pem, &cognito.user_pool_id) {
                (Some(pem), Some(pool)) => {
                    Some(Arc::new(TokenVerifier::from_pem(pem, pool, &cognito.region)?))
                }
                _ => None,
            };
            (Some(identity), verifier)
        }
        None => {
            tracing::info!("cognito not configured, notes will carry demo identities");
            (None, None)
        }
    };

    let service_identity: Arc<dyn IdentityProvider> = match &cognito {
        Some(identity) => Arc::clone(identity) as Arc<dyn IdentityProvider>,
        None => Arc::new(StaticIdentity::anonymous()),
    };

    let submitter = NoteSubmitter::new(Arc::clone(&durable), local, Arc::clone(&service_identity));

    let mut state = AppState::new(
        generator,
        config.policy,
        submitter,
        service_identity,
        config.display_tz.clone(),
    );
    state.cognito = cognito;
    state.verifier = verifier;

    state.session_idle = config.session_idle;

    let _feed = subscribe(durable, config.notes_poll_interval, state.note_feed());

    tracing::info!(
        bucket = %config.bucket,
        model = %config.model_id,
        policy = ?config.policy,
        "triage service starting"
    );

    lambda_http::run(triage_lambda::router(state))
        .await
        .map_err(|e| eyre::eyre!(e))
}
