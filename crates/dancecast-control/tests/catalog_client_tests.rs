use dancecast_control::{parse_origin, CatalogClient, ControlError};
use dancecast_core::{CatalogStatus, CatalogView, VisibilityMode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// Answer a single HTTP request with a fixed response
async fn serve_once(status_line: &'static str, body: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 8192];
        let _ = socket.read(&mut request).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });
    parse_origin(&format!("http://{addr}")).unwrap()
}

#[test]
fn test_endpoint_path() {
    let client = CatalogClient::new(parse_origin("http://tv.local:8000/receiver/").unwrap()).unwrap();
    assert_eq!(
        client.endpoint().unwrap().as_str(),
        "http://tv.local:8000/api/videos"
    );
    assert_eq!(client.origin(), "http://tv.local:8000");
}

#[tokio::test]
async fn test_fetch_catalog() {
    let origin = serve_once(
        "200 OK",
        r#"{"videos":[{"name":"a b.mp4","path":"/videos/a b.mp4"},{"name":"c.mp4","path":"/videos/c.mp4"}]}"#,
    )
    .await;
    let client = CatalogClient::new(origin).unwrap();
    let catalog = client.fetch().await.unwrap();

    assert_eq!(catalog.videos.len(), 2);
    assert_eq!(catalog.videos[0].path, "/videos/a b.mp4");
    assert!(catalog.videos[0]
        .media_url(&client.origin())
        .ends_with("/videos/a%20b.mp4"));
}

#[tokio::test]
async fn test_error_status_is_catalog_failure() {
    let origin = serve_once("500 Internal Server Error", "{}").await;
    let client = CatalogClient::new(origin).unwrap();
    match client.fetch().await {
        Err(ControlError::CatalogFetchFailed(reason)) => {
            assert_eq!(reason, "Internal Server Error")
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_failure_renders_as_list_status() {
    let origin = serve_once("503 Service Unavailable", "").await;
    let client = CatalogClient::new(origin).unwrap();

    let mut view = CatalogView::new(client.origin(), 3, VisibilityMode::Eager);
    view.begin_fetch();
    view.apply_fetch(client.fetch_for_view().await);

    assert_eq!(
        view.status(),
        &CatalogStatus::Failed("Service Unavailable".to_string())
    );
    assert_eq!(
        view.status().display_text(),
        "Error loading list: Service Unavailable"
    );
}
