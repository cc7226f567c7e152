//! Client behaviour against a mock cloudbit API

use cloudbit_client::{Client, ClientError, Cursor, Network, NetworkCreate, Ordering};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> Client {
    Client::builder("secret-token")
        .endpoint(server.uri())
        .user_agent("terraform-provider-cloudbit/test")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_sends_auth_token_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/compute/networks/12"))
        .and(header("X-Auth-Token", "secret-token"))
        .and(header("User-Agent", "terraform-provider-cloudbit/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "name": "backend",
            "cidr": "10.0.0.0/24",
            "description": null,
            "gateway_ip": "10.0.0.1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let network: Network = client(&server).networks().get(12).await.unwrap();
    assert_eq!(network.name, "backend");
    assert_eq!(network.description, None);
    assert_eq!(network.gateway_ip.as_deref(), Some("10.0.0.1"));
}

#[tokio::test]
async fn test_list_walks_all_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/compute/key-pairs"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "50"))
        .and(query_param("no_filter", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pagination-Page-Count", "2")
                .insert_header("X-Pagination-Total-Count", "3")
                .set_body_json(json!([
                    {"id": 1, "name": "a"},
                    {"id": 2, "name": "b"}
                ])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/compute/key-pairs"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pagination-Page-Count", "2")
                .insert_header("X-Pagination-Total-Count", "3")
                .set_body_json(json!([{"id": 3, "name": "c"}])),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let key_pairs = client.key_pairs().list().await.unwrap();
    let names: Vec<_> = key_pairs.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);

    let page = client.key_pairs().list_page(Cursor::default()).await.unwrap();
    assert_eq!(page.page_count, 2);
    assert_eq!(page.total_count, 3);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn test_not_found_is_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/compute/volumes/99"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Volume not found"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).volumes().get(99).await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Volume not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_create_posts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/compute/networks"))
        .and(body_json(json!({
            "name": "backend",
            "location_id": 1,
            "cidr": "10.0.0.0/24"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5,
            "name": "backend",
            "cidr": "10.0.0.0/24"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let network = client(&server)
        .networks()
        .create(&NetworkCreate {
            name: "backend".to_string(),
            location_id: 1,
            cidr: "10.0.0.0/24".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(network.id, 5);
}

#[tokio::test]
async fn test_order_fetched_from_ordering() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/orders/31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 31,
            "type": {"id": 1, "name": "Create"},
            "status": {"id": 3, "name": "Processed"},
            "product_instance_id": 404
        })))
        .mount(&server)
        .await;

    let ordering = Ordering {
        reference: "/v4/orders/31".to_string(),
    };
    let order = client(&server)
        .orders()
        .get_by_ordering(&ordering)
        .await
        .unwrap();
    assert!(order.is_processed());
    assert_eq!(order.product_instance_id, Some(404));
}

#[tokio::test]
async fn test_server_action_posts_action() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/compute/instances/8/action"))
        .and(body_json(json!({"action": "stop"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).servers().action(8, "stop").await.unwrap();
}
