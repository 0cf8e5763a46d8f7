use crate::api1::LegacyJsonClient;
use crate::api2::WebApiClient;
use crate::error::Result;
use crate::types::{ApiVersion, ClientOptions, RepositoryInfo, ReviewFields};

/// A logged-in session with a Review Board server.
pub trait ReviewServer {
    fn login(&mut self, username: &str, password: &str) -> Result<()>;

    fn repositories(&self) -> Result<Vec<RepositoryInfo>>;

    /// Create a request, fill in its draft and attach the diff. Returns the
    /// new request id.
    fn create_request(
        &self,
        repository_id: u64,
        fields: &ReviewFields,
        diff: &[u8],
        parent_diff: &[u8],
    ) -> Result<u64>;

    fn update_request(
        &self,
        request_id: u64,
        fields: &ReviewFields,
        diff: &[u8],
        parent_diff: &[u8],
    ) -> Result<()>;

    fn publish(&self, request_id: u64) -> Result<()>;
}

pub fn make_client(options: &ClientOptions, version: ApiVersion) -> Result<Box<dyn ReviewServer>> {
    Ok(match version {
        ApiVersion::V1 => Box::new(LegacyJsonClient::new(options)?),
        ApiVersion::V2 => Box::new(WebApiClient::new(options)?),
    })
}
