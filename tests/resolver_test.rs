//! Path resolution against a mocked Drive API.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use drive_backup::models::FOLDER_MIME_TYPE;
use drive_backup::{resolve, Credentials, DriveClient, DriveError, Endpoints, Session};

fn client_for(server: &ServerGuard) -> DriveClient {
    let credentials = Credentials {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
    };
    let session = Session::with_endpoints(credentials, Endpoints::single_host(&server.url())).unwrap();
    DriveClient::new(session)
}

fn folder(id: &str, name: &str) -> serde_json::Value {
    json!({ "id": id, "name": name, "mimeType": FOLDER_MIME_TYPE })
}

fn query(q: &str) -> Matcher {
    Matcher::UrlEncoded("q".to_string(), q.to_string())
}

#[tokio::test]
async fn nested_path_resolves_to_deepest_folder() {
    let mut server = Server::new_async().await;
    let backups = server
        .mock("GET", "/files")
        .match_query(query("name = 'backups'"))
        .match_header("authorization", "Bearer access")
        .with_header("content-type", "application/json")
        .with_body(json!({ "files": [folder("F1", "backups")] }).to_string())
        .expect(1)
        .create_async()
        .await;
    let project = server
        .mock("GET", "/files")
        .match_query(query("name = 'project-x' and 'F1' in parents"))
        .with_header("content-type", "application/json")
        .with_body(json!({ "files": [folder("F2", "project-x")] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let resolved = resolve(&client, &["backups", "project-x"]).await.unwrap();

    let resolved = resolved.expect("a folder");
    assert_eq!(resolved.id, "F2");
    assert_eq!(resolved.name, "project-x");
    backups.assert_async().await;
    project.assert_async().await;
}

#[tokio::test]
async fn missing_segment_fails_and_stops_querying() {
    let mut server = Server::new_async().await;
    let backups = server
        .mock("GET", "/files")
        .match_query(query("name = 'backups'"))
        .with_header("content-type", "application/json")
        .with_body(json!({ "files": [folder("F1", "backups")] }).to_string())
        .create_async()
        .await;
    let missing = server
        .mock("GET", "/files")
        .match_query(query("name = 'missing' and 'F1' in parents"))
        .with_header("content-type", "application/json")
        .with_body(json!({ "files": [] }).to_string())
        .expect(1)
        .create_async()
        .await;
    let deeper = server
        .mock("GET", "/files")
        .match_query(Matcher::Regex("deeper".to_string()))
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = resolve(&client, &["backups", "missing", "deeper"])
        .await
        .unwrap_err();

    match err {
        DriveError::PathNotFound { segment } => assert_eq!(segment, "missing"),
        other => panic!("unexpected error: {other:?}"),
    }
    backups.assert_async().await;
    missing.assert_async().await;
    deeper.assert_async().await;
}

#[tokio::test]
async fn empty_path_is_root_without_queries() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let empty: &[&str] = &[];
    assert!(resolve(&client, empty).await.unwrap().is_none());

    let absent: Option<Vec<String>> = None;
    let segments = absent.unwrap_or_default();
    assert!(resolve(&client, &segments).await.unwrap().is_none());

    any.assert_async().await;
}

#[tokio::test]
async fn final_entry_must_be_a_folder() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/files")
        .match_query(query("name = 'backups'"))
        .with_header("content-type", "application/json")
        .with_body(json!({ "files": [folder("F1", "backups")] }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/files")
        .match_query(query("name = 'notes.txt' and 'F1' in parents"))
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "files": [{ "id": "T1", "name": "notes.txt", "mimeType": "text/plain" }] })
                .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let err = resolve(&client, &["backups", "notes.txt"]).await.unwrap_err();

    match err {
        DriveError::NotAFolder { name } => assert_eq!(name, "notes.txt"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn first_match_wins_and_next_page_is_ignored() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/files")
        .match_query(query("name = 'backups'"))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "files": [folder("FIRST", "backups"), folder("SECOND", "backups")],
                "nextPageToken": "p2"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let next_page = server
        .mock("GET", "/files")
        .match_query(Matcher::UrlEncoded("pageToken".to_string(), "p2".to_string()))
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let resolved = resolve(&client, &["backups"]).await.unwrap().unwrap();

    assert_eq!(resolved.id, "FIRST");
    next_page.assert_async().await;
}

#[tokio::test]
async fn api_errors_propagate() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/files")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": { "code": 403, "message": "Insufficient Permission" } }).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let err = resolve(&client, &["backups"]).await.unwrap_err();

    match err {
        DriveError::ApiError { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Insufficient Permission");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
