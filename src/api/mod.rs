// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    activity::{Action, Activity, ActivityBucket},
    auth::require_session,
    blockchain::types::{ExecutionResult, ExecutionStatus},
    models::{
        CardResponse, CeremonyRequest, CeremonyResponse, CreateCardRequest, FundCardRequest,
        FundCardResponse, LoginRequestBody, LoginResponse, WithdrawRequest,
    },
    state::AppState,
    storage::CardStatus,
    zklogin::{IssBase64Details, PartialZkLoginInputs, ProofPoints},
};

pub mod activity;
pub mod auth;
pub mod cards;
pub mod health;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/cards", get(cards::list_cards).post(cards::create_card))
        .route("/cards/fund", post(cards::fund_card))
        .route("/cards/withdraw", post(cards::withdraw))
        .route("/cards/{id}/activity", get(cards::card_activity))
        .route("/activity", get(activity::wallet_activity))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let public = Router::new()
        .route("/auth/redirect/{platform}", get(auth::redirect))
        .route("/auth/ceremony", post(auth::ceremony))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::redirect,
        auth::ceremony,
        auth::login,
        cards::list_cards,
        cards::create_card,
        cards::fund_card,
        cards::withdraw,
        cards::card_activity,
        activity::wallet_activity,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            CeremonyRequest,
            CeremonyResponse,
            LoginRequestBody,
            LoginResponse,
            PartialZkLoginInputs,
            ProofPoints,
            IssBase64Details,
            CardResponse,
            CardStatus,
            CreateCardRequest,
            FundCardRequest,
            FundCardResponse,
            WithdrawRequest,
            ExecutionResult,
            ExecutionStatus,
            Activity,
            ActivityBucket,
            Action,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "OAuth redirect and zkLogin ceremony"),
        (name = "Cards", description = "Card sub-wallets"),
        (name = "Activity", description = "Transfer history"),
        (name = "Health", description = "Liveness and readiness")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::keys::SuiKeypair;
    use crate::blockchain::types::MIST_PER_SUI;
    use crate::testing::{test_app, transfer_block, TestApp};
    use crate::zklogin::jwt::tests::unsigned_jwt;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &TestApp, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = router(app.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Run the ceremony and login for `sub`; returns the login response.
    async fn sign_in(app: &TestApp, sub: &str) -> Value {
        let ephemeral = SuiKeypair::generate().unwrap();
        let pk = ephemeral.public_key().to_base64();

        let (status, ceremony) = call(
            app,
            Method::POST,
            "/auth/ceremony",
            None,
            Some(json!({"ephemeralPublicKey": pk})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ceremony["maxEpoch"], 40);

        let token = unsigned_jwt(&format!(
            r#"{{"iss":"https://accounts.google.com","sub":"{sub}","aud":"google-client","nonce":"{}"}}"#,
            ceremony["nonce"].as_str().unwrap()
        ));
        let (status, login) = call(
            app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({
                "token": token,
                "ephemeralPublicKey": pk,
                "maxEpoch": ceremony["maxEpoch"],
                "randomness": ceremony["randomness"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{login}");
        login
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = test_app();
        let _ = router(app.state.clone()).into_make_service();
    }

    #[tokio::test]
    async fn liveness_and_readiness() {
        let app = test_app();
        let (status, body) = call(&app, Method::GET, "/health/live", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = call(&app, Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["epoch"], 10);

        app.chain.fail_rpc(true);
        let (status, body) = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["chain"], "unavailable");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = test_app();
        let (status, body) = call(&app, Method::GET, "/api-doc/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/cards/fund"].is_object());
        assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
    }

    #[tokio::test]
    async fn redirect_to_provider() {
        let app = test_app();
        let request = Request::builder()
            .uri("/auth/redirect/twitch?nonce=abc")
            .body(Body::empty())
            .unwrap();
        let response = router(app.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://id.twitch.tv/oauth2/authorize?"));
        assert!(location.contains("client_id=twitch-client"));
        assert!(location.contains("login_type=login"));

        let (status, _) = call(&app, Method::GET, "/auth/redirect/myspace?nonce=abc", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let app = test_app();
        let request = Request::builder().uri("/health/live").body(Body::empty()).unwrap();
        let response = router(app.state.clone()).oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn cards_require_a_session() {
        let app = test_app();
        let (status, body) = call(&app, Method::GET, "/cards", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "missing_auth_header");

        let (status, _) = call(&app, Method::GET, "/cards", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_bodies_are_validation_errors() {
        let app = test_app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/ceremony")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router(app.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_code"], "validation_error");

        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/ceremony",
            None,
            Some(json!({"ephemeralPublicKey": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "validation_error");
    }

    #[tokio::test]
    async fn login_without_ceremony_is_rejected() {
        let app = test_app();
        let pk = SuiKeypair::generate().unwrap().public_key().to_base64();
        let token = unsigned_jwt(r#"{"iss":"https://accounts.google.com","sub":"u","aud":"a","nonce":"x"}"#);
        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"token": token, "ephemeralPublicKey": pk, "maxEpoch": 40, "randomness": "1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_token");
    }

    #[tokio::test]
    async fn prover_outage_is_bad_gateway() {
        let app = test_app();
        app.prover.fail(true);

        let pk = SuiKeypair::generate().unwrap().public_key().to_base64();
        let (_, ceremony) = call(&app, Method::POST, "/auth/ceremony", None, Some(json!({"ephemeralPublicKey": pk}))).await;
        let token = unsigned_jwt(&format!(
            r#"{{"iss":"https://accounts.google.com","sub":"u","aud":"a","nonce":"{}"}}"#,
            ceremony["nonce"].as_str().unwrap()
        ));
        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({
                "token": token,
                "ephemeralPublicKey": pk,
                "maxEpoch": ceremony["maxEpoch"],
                "randomness": ceremony["randomness"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error_code"], "proof_unavailable");
    }

    #[tokio::test]
    async fn card_lifecycle_over_http() {
        let app = test_app();
        let login = sign_in(&app, "alice").await;
        let token = login["token"].as_str().unwrap();
        let wallet: crate::blockchain::keys::SuiAddress = login["address"].as_str().unwrap().parse().unwrap();

        let (status, cards) = call(&app, Method::GET, "/cards", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cards, json!([]));

        let (status, card) = call(&app, Method::POST, "/cards", Some(token), Some(json!({"label": "Travel"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(card["status"], "inactive");
        assert!(card.get("privateKey").is_none());
        let card_id = card["id"].as_str().unwrap().to_string();
        let card_address: crate::blockchain::keys::SuiAddress = card["address"].as_str().unwrap().parse().unwrap();

        app.chain
            .add_transaction(transfer_block("fund-1", wallet, card_address, 5 * MIST_PER_SUI, 1_704_456_000_000));
        let (status, funded) = call(&app, Method::POST, "/cards/fund", Some(token), Some(json!({"digest": "fund-1"}))).await;
        assert_eq!(status, StatusCode::OK, "{funded}");
        assert_eq!(funded, json!({"ok": true, "cardId": card_id, "status": "pending"}));

        let (status, body) = call(&app, Method::POST, "/cards/fund", Some(token), Some(json!({"digest": "nope"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_code"], "invalid_evidence");

        app.chain.reject_digest("not-a-digest");
        let (status, body) =
            call(&app, Method::POST, "/cards/fund", Some(token), Some(json!({"digest": "not-a-digest"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_code"], "invalid_evidence");

        let (status, _) = call(&app, Method::POST, "/cards/fund", Some(token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        app.chain.fund(card_address, 5 * MIST_PER_SUI);
        let (status, result) = call(
            &app,
            Method::POST,
            "/cards/withdraw",
            Some(token),
            Some(json!({"id": card_id, "amount": "2.5"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{result}");
        assert_eq!(result["status"]["status"], "success");
        assert_eq!(app.chain.built()[0].1, vec![wallet]);
    }

    #[tokio::test]
    async fn foreign_cards_are_forbidden() {
        let app = test_app();
        let alice = sign_in(&app, "alice").await;
        let mallory = sign_in(&app, "mallory").await;
        let alice_token = alice["token"].as_str().unwrap();
        let mallory_token = mallory["token"].as_str().unwrap();

        let (_, card) = call(&app, Method::POST, "/cards", Some(alice_token), Some(json!({"label": "c1"}))).await;
        let card_id = card["id"].as_str().unwrap();

        let (status, body) = call(
            &app,
            Method::POST,
            "/cards/withdraw",
            Some(mallory_token),
            Some(json!({"id": card_id, "amount": "2.5"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "forbidden");
        assert!(app.chain.submitted().is_empty());

        let uri = format!("/cards/{card_id}/activity");
        let (status, _) = call(&app, Method::GET, &uri, Some(mallory_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, buckets) = call(&app, Method::GET, &uri, Some(alice_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(buckets, json!([]));
    }

    #[tokio::test]
    async fn wallet_activity_feed() {
        use crate::blockchain::types::TransactionFilter;

        let app = test_app();
        let login = sign_in(&app, "alice").await;
        let token = login["token"].as_str().unwrap();
        let wallet: crate::blockchain::keys::SuiAddress = login["address"].as_str().unwrap().parse().unwrap();
        let friend: crate::blockchain::keys::SuiAddress = "0xf00d".parse().unwrap();

        app.chain.add_history(
            TransactionFilter::ToAddress(wallet.to_string()),
            transfer_block("gift", friend, wallet, 3 * MIST_PER_SUI, 1_704_456_000_000),
        );

        let (status, buckets) = call(&app, Method::GET, "/activity", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(buckets[0]["key"], "Jan 5, 2024");
        let entry = &buckets[0]["data"][0];
        assert_eq!(entry["action"], "receive");
        assert_eq!(entry["amount"], "3");
        assert_eq!(entry["counterpartyAddress"], friend.to_string());
    }
}
