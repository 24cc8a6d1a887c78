mod create_step;

// -----------------------------------------------------------------------------

mod helpers {
    use prism_vm::prelude::PrismClient;
    use prism_vm::prism::client::{API_PREFIX, ClusterEndpoint};
    use prism_vm::prism::types::TransportOptions;
    use serde_json::{Value, json};
    use std::io::{self, Write};
    use wiremock::matchers::{basic_auth, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const USERNAME: &str = "admin";
    pub const PASSWORD: &str = "nutanix/4u";

    /// Test helper that pairs a mock Prism gateway with a client pointed at
    /// it, and collects whatever the build step writes to its sink.
    ///
    pub struct TestCluster {
        pub server: MockServer,
        pub client: PrismClient,
        pub output: Vec<u8>,
    }

    impl TestCluster {
        pub async fn new() -> Self {
            let server = MockServer::start().await;
            let base_url = format!("{}{}", server.uri(), API_PREFIX);
            let endpoint = ClusterEndpoint::with_base_url(&base_url, USERNAME, PASSWORD.into());
            let client = PrismClient::new(endpoint, TransportOptions::default()).unwrap();

            TestCluster {
                server,
                client,
                output: Vec::new(),
            }
        }

        /// Serves `entities` from the VM listing endpoint.
        ///
        pub async fn with_vms(self, entities: Value) -> Self {
            Mock::given(method("GET"))
                .and(path(api("/vms")))
                .and(basic_auth(USERNAME, PASSWORD))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({ "entities": entities })),
                )
                .mount(&self.server)
                .await;
            self
        }

        pub fn output(&self) -> String {
            String::from_utf8(self.output.clone()).unwrap()
        }

        /// Number of received requests whose path ends with `suffix`.
        ///
        pub async fn requests_ending_with(&self, http_method: &str, suffix: &str) -> usize {
            self.server
                .received_requests()
                .await
                .unwrap()
                .iter()
                .filter(|request| request.method.as_str() == http_method)
                .filter(|request| request.url.path().ends_with(suffix))
                .count()
        }
    }

    /// Build output that refuses every write.
    ///
    pub struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub fn api(path: &str) -> String {
        format!("{}{}", API_PREFIX, path)
    }

    pub fn task(uuid: &str) -> Value {
        json!({ "task_uuid": uuid })
    }
}
