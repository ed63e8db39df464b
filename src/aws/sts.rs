use crate::aws::Credential;
use anyhow::{anyhow, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::error::DisplayErrorContext;
use aws_smithy_types_convert::date_time::DateTimeExt;
use time::format_description::well_known::Rfc3339;

/// Exchanges the SAML assertion for temporary credentials with one blocking
/// `AssumeRoleWithSAML` call. The call is unsigned, so no local credentials
/// are needed. The requested duration goes to STS unvalidated; an
/// out-of-range value comes back as the provider's own error, verbatim.
pub async fn assume_role_with_saml(
    role_arn: String,
    principal_arn: String,
    assertion: String,
    duration_seconds: i32,
    region: String,
) -> Result<Credential> {
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region))
        .no_credentials()
        .load()
        .await;
    let client = aws_sdk_sts::Client::new(&config);

    let response = client
        .assume_role_with_saml()
        .role_arn(role_arn.clone())
        .principal_arn(principal_arn)
        .saml_assertion(assertion)
        .duration_seconds(duration_seconds)
        .send()
        .await
        .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))?;

    let credentials = response
        .credentials()
        .ok_or_else(|| anyhow!("STS returned no credentials"))?;

    let expiration = credentials
        .expiration()
        .to_time()?
        .format(&Rfc3339)?;

    let assumed_role_arn = response
        .assumed_role_user()
        .map(|user| user.arn().to_string())
        .unwrap_or(role_arn);

    Ok(Credential::new(
        credentials.access_key_id().to_string(),
        credentials.secret_access_key().to_string(),
        credentials.session_token().to_string(),
        expiration,
        assumed_role_arn,
    ))
}
