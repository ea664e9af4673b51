//! In-process end-to-end tests over a real socket.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use sitegate_core::{MemoryObjectStore, ObjectBody, ObjectStore, StoreError, StoredObject};

    use crate::{TestGateway, tenant_host};

    fn store() -> Arc<MemoryObjectStore> {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("__outputs/proj1/index.html", "<h1>proj1</h1>", None);
        store.insert("__outputs/proj1/css/site.css", "h1{color:red}", None);
        store.insert("__outputs/proj2/index.html", "<h1>proj2</h1>", None);
        store
    }

    fn header<'a>(resp: &'a reqwest::Response, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_should_serve_existing_object() {
        let gateway = TestGateway::start(store()).await;

        let resp = gateway.get(&tenant_host("proj1"), "/css/site.css").await;

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(header(&resp, "content-type"), Some("text/css; charset=utf-8"));
        assert_eq!(resp.text().await.expect("body"), "h1{color:red}");
    }

    #[tokio::test]
    async fn test_should_serve_index_for_root_path() {
        let gateway = TestGateway::start(store()).await;

        let resp = gateway.get(&tenant_host("proj1"), "/").await;

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(header(&resp, "content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(resp.text().await.expect("body"), "<h1>proj1</h1>");
    }

    #[tokio::test]
    async fn test_should_fall_back_to_index_for_client_side_routes() {
        let store = store();
        let gateway = TestGateway::start(Arc::clone(&store)).await;

        let resp = gateway.get(&tenant_host("proj1"), "/dashboard/settings").await;

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "<h1>proj1</h1>");
        assert_eq!(
            store.fetched_keys(),
            vec![
                "__outputs/proj1/dashboard/settings",
                "__outputs/proj1/index.html"
            ]
        );
    }

    #[tokio::test]
    async fn test_should_strip_port_from_host() {
        let gateway = TestGateway::start(store()).await;

        let resp = gateway.get("proj2.example.com:8080", "/").await;

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "<h1>proj2</h1>");
    }

    #[tokio::test]
    async fn test_should_return_404_for_unknown_tenant() {
        let gateway = TestGateway::start(store()).await;

        let resp = gateway.get(&tenant_host("ghost"), "/about").await;

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        let body = resp.text().await.expect("body");
        assert_eq!(body, "Not Found\n");
        assert!(!body.contains("__outputs"));
    }

    #[tokio::test]
    async fn test_should_return_400_for_hosts_outside_base_domain() {
        let store = store();
        let gateway = TestGateway::start(Arc::clone(&store)).await;

        for host in ["example.com", "localhost", "proj1.other.com"] {
            let resp = gateway.get(host, "/").await;
            assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST, "host {host}");
            let body = resp.text().await.expect("body");
            assert!(body.starts_with("Bad Request: "), "body {body}");
        }
        assert!(store.fetched_keys().is_empty());
    }

    #[tokio::test]
    async fn test_should_return_500_without_backend_details() {
        let store = store();
        store.fail_on("__outputs/proj1/broken.js", "AccessDenied: policy xyz");
        let gateway = TestGateway::start(store).await;

        let resp = gateway.get(&tenant_host("proj1"), "/broken.js").await;

        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.text().await.expect("body"), "Internal Server Error\n");
    }

    #[tokio::test]
    async fn test_should_answer_health_check() {
        let gateway = TestGateway::start(store()).await;

        let resp = gateway.get("localhost", "/_sitegate/health").await;

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["status"], "running");
        assert_eq!(json["service"], "sitegate");
    }

    #[tokio::test]
    async fn test_should_tag_every_response() {
        let gateway = TestGateway::start(store()).await;

        let ok = gateway.get(&tenant_host("proj1"), "/").await;
        let bad = gateway.get("example.com", "/").await;

        for resp in [&ok, &bad] {
            assert_eq!(header(resp, "server"), Some("sitegate"));
            assert!(header(resp, "x-request-id").is_some());
        }
        assert_ne!(header(&ok, "x-request-id"), header(&bad, "x-request-id"));
    }

    #[tokio::test]
    async fn test_should_stream_large_objects_intact() {
        let store = Arc::new(MemoryObjectStore::new());
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        store.insert("__outputs/big/blob.bin", data.clone(), None);
        let gateway = TestGateway::start(store).await;

        let resp = gateway.get(&tenant_host("big"), "/blob.bin").await;

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(header(&resp, "content-type"), Some("application/octet-stream"));
        assert_eq!(header(&resp, "content-length"), Some("200000"));
        assert_eq!(resp.bytes().await.expect("body").as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn test_should_serve_tenants_concurrently() {
        let gateway = TestGateway::start(store()).await;

        let requests = (0..20).map(|i| {
            let tenant = if i % 2 == 0 { "proj1" } else { "proj2" };
            let gateway = &gateway;
            async move {
                let resp = gateway.get(&tenant_host(tenant), "/").await;
                (tenant, resp.text().await.expect("body"))
            }
        });

        for (tenant, body) in futures::future::join_all(requests).await {
            assert_eq!(body, format!("<h1>{tenant}</h1>"));
        }
    }

    /// Yields one chunk, stalls briefly, then fails.
    #[derive(Debug)]
    struct FlakyStreamStore;

    #[async_trait::async_trait]
    impl ObjectStore for FlakyStreamStore {
        async fn get_object(&self, _key: &str) -> Result<StoredObject, StoreError> {
            // The pause lets the response head and first chunk reach the
            // client before the backend stream breaks.
            let body: ObjectBody = Box::pin(futures::stream::unfold(0u8, |step| async move {
                match step {
                    0 => Some((Ok(Bytes::from_static(b"partial")), 1)),
                    1 => {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        let err = std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            "backend reset",
                        );
                        Some((Err(err), 2))
                    }
                    _ => None,
                }
            }));
            Ok(StoredObject {
                body,
                content_type: None,
                content_length: None,
            })
        }
    }

    #[tokio::test]
    async fn test_should_abort_response_on_stream_failure() {
        let gateway = TestGateway::start_with(Arc::new(FlakyStreamStore)).await;

        let resp = gateway.get(&tenant_host("proj1"), "/app.js").await;

        // The head has already gone out when the body fails.
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert!(resp.bytes().await.is_err());
    }
}
