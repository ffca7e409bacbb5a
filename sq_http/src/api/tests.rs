use std::sync::Arc;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use sq_system::db::{initialise_database, DbConfig};
use sq_system::features::{Feature, FeatureFlags};
use sq_system::llm::mock::MockLlm;
use sq_system::llm::LlmBackend;
use sq_system::StoryQuestSystem;
use crate::config::Config;
use crate::setup::construct_server;

async fn test_app(features: FeatureFlags) -> eyre::Result<Router> {
    Ok(test_app_with_llm(features).await?.0)
}

/// The full router, alongside the language model it talks to.
async fn test_app_with_llm(features: FeatureFlags) -> eyre::Result<(Router, Arc<MockLlm>)> {
    let mut config = Config::default();
    config.db = DbConfig::in_memory();
    let mock = Arc::new(MockLlm::default());
    let db = initialise_database(config.db.clone()).await?;
    let system = StoryQuestSystem::new(&config.system(), db, LlmBackend::Mock(mock.clone()), features);

    Ok((construct_server(&config, Arc::new(system)), mock))
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> eyre::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&body)?)
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body)?).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, json))
}

async fn register(app: &Router, username: &str) -> eyre::Result<String> {
    let (status, body) = send(app, Method::POST, "/api/auth/register", None, Some(json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "hunter22",
    }))).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn health_and_unknown_routes() -> eyre::Result<()> {
    let app = test_app(FeatureFlags::default()).await?;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK", "message": "Server is running" }));

    let (status, body) = send(&app, Method::GET, "/api/does-not-exist", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "code": 404, "message": "Not Found" }));

    let (status, _) = send(&app, Method::GET, "/api/docs/api.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn authentication_flow() -> eyre::Result<()> {
    let app = test_app(FeatureFlags::default()).await?;
    let token = register(&app, "adventurer").await?;

    let (status, body) = send(&app, Method::GET, "/api/auth/profile", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    let (status, body) = send(&app, Method::GET, "/api/auth/profile", Some("garbage"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, token failed");

    let (status, body) = send(&app, Method::GET, "/api/auth/profile", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "adventurer");
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(&app, Method::POST, "/api/auth/login", None, Some(json!({
        "email": "adventurer@example.com",
        "password": "wrong-password",
    }))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = send(&app, Method::POST, "/api/auth/register", None, Some(json!({
        "username": "copycat",
        "email": "adventurer@example.com",
        "password": "hunter22",
    }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    let (status, _) = send(&app, Method::GET, "/api/auth/users", Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
#[tracing_test::traced_test]
async fn play_a_round() -> eyre::Result<()> {
    let app = test_app(FeatureFlags::default()).await?;
    let token = register(&app, "adventurer").await?;
    let token = Some(token.as_str());

    let (status, campaign) = send(&app, Method::POST, "/api/campaigns", token, Some(json!({
        "name": "Iron Hollow",
        "description": "A mining town under siege",
        "theme": "steampunk",
    }))).await?;
    assert_eq!(status, StatusCode::CREATED, "{campaign}");
    assert_eq!(campaign["status"], "active");
    assert_eq!(campaign["story_posts"].as_array().map(Vec::len), Some(1));
    let campaign_id = campaign["id"].as_i64().unwrap_or_default();

    let (status, character) = send(&app, Method::POST, "/api/characters", token, Some(json!({
        "campaign_id": campaign_id,
        "name": "Ada",
        "race": "Human",
        "class": "Tinker",
    }))).await?;
    assert_eq!(status, StatusCode::CREATED, "{character}");
    assert_eq!(character["stats"]["charisma"], 10);
    let character_id = character["id"].as_i64().unwrap_or_default();

    let (status, exchange) = send(&app, Method::POST, &format!("/api/campaigns/{campaign_id}/dm-response"), token, Some(json!({
        "character_id": character_id,
        "player_input": "I wind up my clockwork owl",
    }))).await?;
    assert_eq!(status, StatusCode::CREATED, "{exchange}");
    assert_eq!(exchange["player_post"]["author_type"], "player");
    assert_eq!(exchange["dm_post"]["content"], "Mock response for: I wind up my clockwork owl");

    let (status, story) = send(&app, Method::GET, &format!("/api/campaigns/{campaign_id}/story"), token, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(story.as_array().map(Vec::len), Some(3));

    let (status, item) = send(&app, Method::POST, &format!("/api/campaigns/{campaign_id}/items"), token, Some(json!({
        "name": "Pocket Watch",
        "description": "Ticks backwards",
        "type": "artifact",
    }))).await?;
    assert_eq!(status, StatusCode::CREATED, "{item}");
    let item_id = item["id"].as_i64().unwrap_or_default();

    let holding = format!("/api/items/{item_id}/characters/{character_id}");
    let (status, _) = send(&app, Method::POST, &holding, token, Some(json!({}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app, Method::POST, &holding, token, Some(json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Character already has this item");

    let (status, inventory) = send(&app, Method::GET, &format!("/api/characters/{character_id}/items"), token, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inventory[0]["name"], "Pocket Watch");
    assert_eq!(inventory[0]["quantity"], 1);
    Ok(())
}

#[tokio::test]
async fn ownership_and_validation_errors() -> eyre::Result<()> {
    let app = test_app(FeatureFlags::default()).await?;
    let owner = register(&app, "owner").await?;
    let intruder = register(&app, "intruder").await?;

    let (status, body) = send(&app, Method::POST, "/api/campaigns", Some(&owner), Some(json!({
        "name": "ab",
        "description": "Too short a name",
        "theme": "horror",
    }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (_, campaign) = send(&app, Method::POST, "/api/campaigns", Some(&owner), Some(json!({
        "name": "Whispering Manor",
        "description": "Something lives in the walls",
        "theme": "horror",
    }))).await?;
    let uri = format!("/api/campaigns/{}", campaign["id"]);

    let (status, _) = send(&app, Method::GET, &uri, Some(&intruder), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::GET, "/api/campaigns/9999", Some(&owner), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&owner), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Campaign removed");
    Ok(())
}

#[tokio::test]
async fn disabled_features_remove_routes() -> eyre::Result<()> {
    let flags = FeatureFlags::default();
    flags.disable(Feature::Items);
    flags.disable(Feature::DmResponses);
    let app = test_app(flags).await?;
    let token = register(&app, "adventurer").await?;

    let (status, _) = send(&app, Method::GET, "/api/campaigns/1/items", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, "/api/campaigns/1/dm-response", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, flags) = send(&app, Method::GET, "/api/features", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flags["items"], false);
    assert_eq!(flags["dmResponses"], false);
    assert_eq!(flags["campaigns"], true);
    assert_eq!(flags["auth"], true);
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_use_the_error_shape() -> eyre::Result<()> {
    let app = test_app(FeatureFlags::default()).await?;

    let (status, body) = send(&app, Method::POST, "/api/auth/register", None, Some(json!({ "username": "abc" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert!(body["message"].as_str().is_some_and(|m| m.contains("is a required property")), "{body}");
    assert!(body.get("schema_validation").is_none());

    let token = register(&app, "adventurer").await?;
    let (status, body) = send(&app, Method::POST, "/api/campaigns/1/dm-response", Some(&token), Some(json!({
        "character_id": 1,
    }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert!(body["message"].as_str().is_some_and(|m| m.contains("player_input")), "{body}");
    Ok(())
}

#[tokio::test]
async fn unavailable_model_is_a_bad_gateway() -> eyre::Result<()> {
    let (app, mock) = test_app_with_llm(FeatureFlags::default()).await?;
    let token = register(&app, "adventurer").await?;
    let token = Some(token.as_str());

    let (_, campaign) = send(&app, Method::POST, "/api/campaigns", token, Some(json!({
        "name": "Dust and Bones",
        "description": "The wasteland remembers",
        "theme": "post-apocalyptic",
    }))).await?;
    let campaign_id = campaign["id"].as_i64().unwrap_or_default();
    let (_, character) = send(&app, Method::POST, "/api/characters", token, Some(json!({
        "campaign_id": campaign_id,
        "name": "Rook",
        "race": "Human",
        "class": "Scavenger",
        "stats": { "strength": 16 },
    }))).await?;
    assert_eq!(character["stats"]["strength"], 16, "{character}");
    assert_eq!(character["stats"]["wisdom"], 10);

    mock.set_failing(true);
    let (status, body) = send(&app, Method::POST, &format!("/api/campaigns/{campaign_id}/dm-response"), token, Some(json!({
        "character_id": character["id"],
        "player_input": "I follow the tracks",
    }))).await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], 502);
    assert_eq!(body["message"], "Failed to generate DM response");
    assert!(body["details"].is_string());

    let (_, story) = send(&app, Method::GET, &format!("/api/campaigns/{campaign_id}/story"), token, None).await?;
    assert_eq!(story.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn story_can_be_limited_to_recent_posts() -> eyre::Result<()> {
    let app = test_app(FeatureFlags::default()).await?;
    let token = register(&app, "adventurer").await?;
    let token = Some(token.as_str());

    let (_, campaign) = send(&app, Method::POST, "/api/campaigns", token, Some(json!({
        "name": "Neon Rain",
        "description": "A heist gone wrong",
        "theme": "cyberpunk",
    }))).await?;
    let uri = format!("/api/campaigns/{}/story", campaign["id"]);
    for content in ["First", "Second", "Third"] {
        let (status, _) = send(&app, Method::POST, &uri, token, Some(json!({ "content": content }))).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, recent) = send(&app, Method::GET, &format!("{uri}?limit=2"), token, None).await?;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<_> = recent.as_array().into_iter().flatten().map(|p| p["content"].clone()).collect();
    assert_eq!(contents, vec![json!("Second"), json!("Third")]);

    let (status, body) = send(&app, Method::GET, &format!("{uri}?limit=many"), token, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    Ok(())
}
