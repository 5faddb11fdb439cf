//! Email verification API.

use tracing::{info, warn};

use crate::client::OnrampClient;
use crate::error::{OnrampError, Result};
use crate::request::RequestSpec;
use crate::resolve::EndpointCategory;
use crate::types::{
    EmailStatusRequest, EmailStatusResponse, RequestCodeRequest, RequestCodeResponse,
    VerifiedSession, VerifyCodeRequest, VerifyCodeResponse,
};
use crate::verification::{EmailOperation, enhance_email_error};

/// Email verification client.
///
/// Errors from [`request_code`](Self::request_code) and
/// [`verify_code`](Self::verify_code) are always
/// [`OnrampError::EmailVerificationFailed`], worded for end users.
pub struct EmailApi {
    client: OnrampClient,
}

impl EmailApi {
    pub(crate) fn new(client: OnrampClient) -> Self {
        Self { client }
    }

    /// Ask the backend to email a verification code.
    pub async fn request_code(&self, email: &str) -> Result<RequestCodeResponse> {
        let spec = RequestSpec::post(EndpointCategory::EmailVerification, "api/v1/email/request-code")
            .typed(RequestCodeRequest {
                email: normalize_email(email),
            });
        self.client
            .execute(spec)
            .await
            .map_err(|e| enhance_email_error(e, EmailOperation::RequestCode))
    }

    /// Verify an emailed code and store the issued bearer credential.
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<VerifiedSession> {
        if self.client.credential_store().is_none() {
            return Err(OnrampError::NotInitialized);
        }

        let spec = RequestSpec::post(EndpointCategory::EmailVerification, "api/v1/email/verify-code")
            .typed(VerifyCodeRequest {
                email: normalize_email(email),
                code: code.trim().to_string(),
            });
        let response: VerifyCodeResponse = self
            .client
            .execute(spec)
            .await
            .map_err(|e| enhance_email_error(e, EmailOperation::VerifyCode))?;

        let Some(credential) = response.credential() else {
            warn!("Verification succeeded without issuing a token");
            return Err(OnrampError::EmailVerificationFailed(
                "Verification succeeded but no authentication token was issued.".to_string(),
            ));
        };
        let expires_at = credential.expires_at();
        self.client.persist_credential(credential).await?;

        info!(new_user = response.is_new_user, "Email verified");
        Ok(VerifiedSession {
            user_id: response.user_id,
            is_new_user: response.is_new_user,
            expires_at,
        })
    }

    /// Check whether an address has been verified.
    pub async fn status(&self, email: &str) -> Result<EmailStatusResponse> {
        let spec = RequestSpec::post(EndpointCategory::EmailVerification, "api/v1/email/status")
            .typed(EmailStatusRequest {
                email: normalize_email(email),
            });
        self.client.execute(spec).await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
