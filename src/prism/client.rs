use crate::prelude::{Error, PrismError, Result};
use crate::prism::Prism;
use crate::prism::types::*;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Path prefix of the Prism v2.0 REST API on the cluster gateway.
pub const API_PREFIX: &str = "/PrismGateway/services/rest/v2.0";

/// Port the Prism gateway listens on.
pub const DEFAULT_PORT: u16 = 9440;

/// Address of a Prism cluster and the credentials to use against it.
///
pub struct ClusterEndpoint {
    base_url: String,
    username: String,
    password: SecretString,
}

impl ClusterEndpoint {
    /// Creates an endpoint for `https://{host}:{port}` with the v2.0 API
    /// prefix. IPv6 literals are bracketed.
    ///
    pub fn new(host: &str, port: u16, username: &str, password: SecretString) -> Self {
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]", host)
        } else {
            host.to_owned()
        };

        Self::with_base_url(
            &format!("https://{}:{}{}", host, port, API_PREFIX),
            username,
            password,
        )
    }

    /// Creates an endpoint with an explicit API base URL, to which request
    /// paths are appended verbatim.
    ///
    pub fn with_base_url(base_url: &str, username: &str, password: SecretString) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            username: username.to_owned(),
            password,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for ClusterEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterEndpoint")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// -----------------------------------------------------------------------------

/// Concrete implementation of the `Prism` trait using `reqwest` crate.
///
/// Each operation is a single request/response exchange, except power-on and
/// delete which first resolve the VM name through the listing endpoint. No
/// state is kept between calls.
///
#[derive(Debug)]
pub struct PrismClient {
    client: Client,
    endpoint: ClusterEndpoint,
}

impl PrismClient {
    /// Creates a new instance of the Prism client.
    ///
    /// # Arguments
    ///
    /// * `endpoint`: Cluster address and credentials.
    /// * `options`: Timeouts and TLS verification for this client only.
    ///
    pub fn new(endpoint: ClusterEndpoint, options: TransportOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if options.insecure_skip_verify {
            tracing::warn!(
                target: "prism",
                url = endpoint.base_url(),
                "TLS certificate and host name verification disabled for this client."
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(options.insecure_skip_verify)
            .danger_accept_invalid_hostnames(options.insecure_skip_verify)
            .use_rustls_tls()
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Generic helper method to perform a request to the Prism API.
    ///
    /// # Types
    ///
    /// * `B`: Type of the request body, which must be serializable.
    /// * `D`: Type of the response data, which must be deserializable.
    ///
    /// # Arguments
    ///
    /// * `method`: HTTP method to use for the request.
    /// * `path`: API endpoint path, relative to the API prefix.
    /// * `body`: Optional JSON request body.
    /// * `error_var`: Operation to report if the call fails.
    ///
    async fn make_request<B, D>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        error_var: PrismError,
    ) -> Result<D>
    where
        B: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        let url = format!("{}{}", self.endpoint.base_url, path);
        tracing::debug!(target: "prism", %method, %url, "Sending request.");

        let mut request = self.client.request(method, &url).basic_auth(
            &self.endpoint.username,
            Some(self.endpoint.password.expose_secret()),
        );
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(target: "prism", %status, %url, "Response received.");

        match status {
            status if status.is_success() => serde_json::from_str(&text)
                .map_err(|error| Error::MalformedResponse(error_var, error.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Auth(error_var, status)),
            status => Err(Error::Prism(error_var, status, text)),
        }
    }

    /// Looks a VM up by name, failing with `NotFound` when nothing matches.
    ///
    async fn resolve(&self, name: &str) -> Result<VmRecord> {
        self.find_vm_by_name(name)
            .await?
            .ok_or_else(|| Error::NotFound(name.to_owned()))
    }
}

#[async_trait]
impl Prism for PrismClient {
    async fn list_vms(&self) -> Result<Vec<VmRecord>> {
        let listing: Entities<VmRecord> = self
            .make_request(Method::GET, "/vms", None::<&()>, PrismError::List)
            .await?;
        Ok(listing.entities)
    }

    async fn find_vm_by_name(&self, name: &str) -> Result<Option<VmRecord>> {
        let records = self.list_vms().await?;
        let found = first_named(records, name);
        tracing::debug!(target: "prism", name, found = found.is_some(), "VM lookup finished.");
        Ok(found)
    }

    async fn create_vm(&self, spec: &VmSpec) -> Result<OperationResult> {
        let body = CreateVmBody::from(spec);
        let response: Value = self
            .make_request(Method::POST, "/vms/", Some(&body), PrismError::Create)
            .await?;
        tracing::info!(target: "prism", name = spec.name.as_str(), "VM creation accepted.");

        Ok(OperationResult {
            target: None,
            body: response,
        })
    }

    async fn power_on(&self, name: &str) -> Result<OperationResult> {
        let vm = self.resolve(name).await?;
        let path = format!("/vms/{}/set_power_state/", vm.uuid.encoded());
        let body = PowerStateBody {
            transition: PowerTransition::On,
        };
        let response: Value = self
            .make_request(Method::POST, &path, Some(&body), PrismError::PowerOn)
            .await?;
        tracing::info!(target: "prism", name, uuid = vm.uuid.as_str(), "VM power-on accepted.");

        Ok(OperationResult {
            target: Some(vm),
            body: response,
        })
    }

    async fn delete_vm(&self, name: &str) -> Result<OperationResult> {
        let vm = self.resolve(name).await?;
        let path = format!("/vms/{}", vm.uuid.encoded());
        let response: Value = self
            .make_request(Method::DELETE, &path, None::<&()>, PrismError::Delete)
            .await?;
        tracing::info!(target: "prism", name, uuid = vm.uuid.as_str(), "VM deletion accepted.");

        Ok(OperationResult {
            target: Some(vm),
            body: response,
        })
    }
}
