//! PIN API.

use onramp_core::Secret;

use crate::client::OnrampClient;
use crate::error::Result;
use crate::request::RequestSpec;
use crate::resolve::EndpointCategory;
use crate::types::{PinRequest, PinResponse};

/// PIN submission client. Requires a verified email.
pub struct PinApi {
    client: OnrampClient,
}

impl PinApi {
    pub(crate) fn new(client: OnrampClient) -> Self {
        Self { client }
    }

    /// Submit the user's PIN.
    pub async fn submit(&self, pin: &Secret) -> Result<PinResponse> {
        let spec = RequestSpec::post(EndpointCategory::PinSubmission, "api/v1/pin")
            .typed(PinRequest { pin });
        self.client.execute(spec).await
    }
}
