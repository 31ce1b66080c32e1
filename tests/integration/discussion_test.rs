//! Integration tests for discussions.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_publish_get_and_list() {
    let app = TestApp::new().await;
    let (_, alice) = app.signed_in("alice").await;
    let (_, bob) = app.signed_in("bob").await;
    let hidden = app.create_repository(&alice, "hidden", "private").await;

    let response = app
        .multipart(
            "POST",
            "/api/v1/discussion",
            &[
                ("title", "Screenshot"),
                ("text", "How does this look?"),
                ("tags", "ui,design"),
            ],
            Some(("image", "shot.png", b"\x89PNG\r\n")),
            Some(&alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    let code = response.body["body"]["code"].as_str().unwrap().to_string();

    let response = app
        .multipart(
            "POST",
            "/api/v1/discussion",
            &[
                ("title", "Internal"),
                ("text", "Private notes"),
                ("repository", &hidden.to_string()),
            ],
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let internal = response.body["body"]["code"].as_str().unwrap().to_string();

    let response = app
        .request("GET", &format!("/api/v1/discussion/{code}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["body"]["title"], "Screenshot");
    assert_eq!(response.body["body"]["tags"], serde_json::json!(["ui", "design"]));

    let response = app
        .request("GET", &format!("/api/v1/discussion/{internal}"), None, Some(&bob))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let titles = |token: Option<String>| {
        let app = &app;
        async move {
            let response = app
                .request("GET", "/api/v1/discussion", None, token.as_deref())
                .await;
            assert_eq!(response.status, StatusCode::OK);
            let mut titles: Vec<String> = response.body["body"]["items"]
                .as_array()
                .unwrap()
                .iter()
                .map(|d| d["title"].as_str().unwrap().to_string())
                .collect();
            titles.sort();
            titles
        }
    };

    assert_eq!(titles(Some(bob.clone())).await, vec!["Screenshot"]);
    assert_eq!(titles(Some(alice.clone())).await, vec!["Internal", "Screenshot"]);
}

#[tokio::test]
async fn test_publish_on_foreign_repository_is_rejected() {
    let app = TestApp::new().await;
    let (_, alice) = app.signed_in("alice").await;
    let (_, bob) = app.signed_in("bob").await;
    let repo = app.create_repository(&alice, "mine", "public").await;

    let response = app
        .multipart(
            "POST",
            "/api/v1/discussion",
            &[
                ("title", "Hijack"),
                ("text", "Not my repository"),
                ("repository", &repo.to_string()),
            ],
            None,
            Some(&bob),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/v1/discussion/unknown-code", None, None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
