//! Integration tests for repositories, the file tree and downloads.

use std::io::{Cursor, Read};

use http::StatusCode;
use zip::ZipArchive;

use crate::helpers::TestApp;

fn zip_names(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn zip_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    out
}

#[tokio::test]
async fn test_create_repository_validates_and_rejects_duplicates() {
    let app = TestApp::new().await;
    let (_, token) = app.signed_in("alice").await;

    app.create_repository(&token, "tools", "public").await;

    let response = app
        .request(
            "POST",
            "/api/v1/repository",
            Some(serde_json::json!({ "name": "tools" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app
        .request(
            "POST",
            "/api/v1/repository",
            Some(serde_json::json!({ "name": "Bad Name!" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_visibility_tiers() {
    let app = TestApp::new().await;
    let (_, alice) = app.signed_in("alice").await;
    let (_, bob) = app.signed_in("bob").await;
    let (_, carol) = app.signed_in("carol").await;

    app.create_repository(&alice, "open", "public").await;
    app.create_repository(&alice, "secret", "private").await;
    let team = app.create_repository(&alice, "team", "public").await;

    let response = app
        .request(
            "PUT",
            &format!("/api/v1/repository/{team}"),
            Some(serde_json::json!({
                "access": "private-group",
                "custom_access": ["bob"],
            })),
            Some(&alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let page = |token: Option<String>| {
        let app = &app;
        async move {
            let response = app
                .request("GET", "/api/v1/repository?total=true", None, token.as_deref())
                .await;
            assert_eq!(response.status, StatusCode::OK);
            let mut names: Vec<String> = response.body["body"]["items"]
                .as_array()
                .unwrap()
                .iter()
                .map(|r| r["name"].as_str().unwrap().to_string())
                .collect();
            names.sort();
            names
        }
    };

    assert_eq!(page(None).await, vec!["open"]);
    assert_eq!(page(Some(bob.clone())).await, vec!["open", "team"]);
    assert_eq!(page(Some(carol.clone())).await, vec!["open"]);

    let response = app
        .request("GET", "/api/v1/repository/alice/team", None, Some(&bob))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["body"]["owner"]["username"], "alice");

    let response = app
        .request("GET", "/api/v1/repository/alice/team", None, Some(&carol))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/v1/repository/alice/secret", None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/v1/repository/alice/secret", None, Some(&alice))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // The owner's own page lists everything; others see what they may.
    let response = app
        .request("GET", "/api/v1/repository/alice", None, Some(&alice))
        .await;
    assert_eq!(response.body["body"]["items"].as_array().unwrap().len(), 3);
    let response = app
        .request("GET", "/api/v1/repository/alice", None, None)
        .await;
    assert_eq!(response.body["body"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_username_rejects_allow_list_update() {
    let app = TestApp::new().await;
    let (_, alice) = app.signed_in("alice").await;
    app.signed_in("bob").await;
    let repo = app.create_repository(&alice, "team", "public").await;

    let response = app
        .request(
            "PUT",
            &format!("/api/v1/repository/{repo}"),
            Some(serde_json::json!({
                "access": "private-group",
                "custom_access": ["bob", "ghost"],
            })),
            Some(&alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request("GET", "/api/v1/repository/alice/team", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["body"]["access"], "public");
}

#[tokio::test]
async fn test_tree_and_nested_download() {
    let app = TestApp::new().await;
    let (_, alice) = app.signed_in("alice").await;
    let (_, bob) = app.signed_in("bob").await;
    let repo = app.create_repository(&alice, "bundle", "public").await;

    app.create_file(&alice, repo, None, "a.txt", b"alpha").await;
    let sub = app.create_folder(&alice, repo, None, "sub").await;
    app.create_file(&alice, repo, Some(sub), "b.txt", b"beta").await;

    // Folder listing.
    let response = app
        .request(
            "GET",
            &format!("/api/v1/repository/alice/bundle/{sub}"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["body"][0]["name"], "b.txt");

    // Top-level listing puts directories first.
    let response = app
        .request("GET", "/api/v1/repository/alice/bundle", None, None)
        .await;
    let elements = response.body["body"]["elements"].as_array().unwrap();
    assert_eq!(elements[0]["name"], "sub");
    assert_eq!(elements[1]["name"], "a.txt");

    // Strangers cannot add to the tree.
    let response = app
        .multipart(
            "PUT",
            &format!("/api/v1/repository/element/{repo}"),
            &[("name", "intruder"), ("is_directory", "true")],
            None,
            Some(&bob),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .get_raw(&format!("/api/v1/repository/download/{repo}"), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename='bundle.zip'"
    );
    assert_eq!(zip_names(&response.body), vec!["a.txt", "sub.zip"]);
    assert_eq!(zip_entry(&response.body, "a.txt"), b"alpha");
    let inner = zip_entry(&response.body, "sub.zip");
    assert_eq!(zip_names(&inner), vec!["b.txt"]);
    assert_eq!(zip_entry(&inner, "b.txt"), b"beta");

    let response = app
        .get_raw(
            &format!("/api/v1/repository/download/{repo}?child={sub}"),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename='sub.zip'"
    );
    assert_eq!(zip_names(&response.body), vec!["sub.zip"]);

    // Only the full download counted.
    let response = app
        .request("GET", "/api/v1/repository/alice/bundle", None, None)
        .await;
    assert_eq!(response.body["body"]["downloads"], 1);
}

#[tokio::test]
async fn test_delete_element_removes_subtree() {
    let app = TestApp::new().await;
    let (_, alice) = app.signed_in("alice").await;
    let (_, bob) = app.signed_in("bob").await;
    let repo = app.create_repository(&alice, "tree", "public").await;

    let docs = app.create_folder(&alice, repo, None, "docs").await;
    let inner = app.create_file(&alice, repo, Some(docs), "readme.md", b"# hi").await;
    app.create_file(&alice, repo, None, "keep.txt", b"keep").await;

    let response = app
        .request(
            "DELETE",
            &format!("/api/v1/repository/{repo}/{docs}"),
            None,
            Some(&bob),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            "DELETE",
            &format!("/api/v1/repository/{repo}/{docs}"),
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", "/api/v1/repository/alice/tree", None, None)
        .await;
    let elements = response.body["body"]["elements"].as_array().unwrap();
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0]["name"], "keep.txt");

    assert!(
        app.state
            .stores
            .nodes
            .find_by_id(inner)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_like_toggle() {
    let app = TestApp::new().await;
    let (_, alice) = app.signed_in("alice").await;
    let (_, bob) = app.signed_in("bob").await;
    let repo = app.create_repository(&alice, "liked", "public").await;
    let path = format!("/api/v1/repository/like/{repo}");

    let stars = |plus: bool| {
        let app = &app;
        let path = path.clone();
        let bob = bob.clone();
        async move {
            let response = app
                .request("POST", &path, Some(serde_json::json!({ "plus": plus })), Some(&bob))
                .await;
            assert_eq!(response.status, StatusCode::OK);
            response.body["body"]["stars"].as_i64().unwrap()
        }
    };

    assert_eq!(stars(true).await, 1);
    assert_eq!(stars(true).await, 1);
    assert_eq!(stars(false).await, -1);
}

#[tokio::test]
async fn test_links_and_malformed_ids() {
    let app = TestApp::new().await;
    let (_, alice) = app.signed_in("alice").await;
    let repo = app.create_repository(&alice, "linked", "public").await;

    let response = app
        .request(
            "PUT",
            &format!("/api/v1/repository/link/{repo}"),
            Some(serde_json::json!({
                "type": "github",
                "title": "Source",
                "url": "https://github.com/example/linked",
            })),
            Some(&alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let link = response.body["body"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "DELETE",
            &format!("/api/v1/repository/{repo}/link/{link}"),
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "DELETE",
            &format!("/api/v1/repository/{repo}/link/{link}"),
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request("DELETE", "/api/v1/repository/not-an-id", None, Some(&alice))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_repository() {
    let app = TestApp::new().await;
    let (_, alice) = app.signed_in("alice").await;
    let (_, bob) = app.signed_in("bob").await;
    let repo = app.create_repository(&alice, "gone", "public").await;

    let response = app
        .request("DELETE", &format!("/api/v1/repository/{repo}"), None, Some(&bob))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("DELETE", &format!("/api/v1/repository/{repo}"), None, Some(&alice))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", "/api/v1/repository/alice/gone", None, None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
