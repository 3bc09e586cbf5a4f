use crate::handlers;
use crate::middleware;
use crate::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Login
        .route(
            "/auth/login",
            post(handlers::auth::login)
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit_login)),
        )
        // Token-bearing onboarding endpoints
        .route(
            "/invitations/lookup",
            get(handlers::invitation::lookup_invitation)
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit_public)),
        )
        .route(
            "/invitations/accept",
            post(handlers::invitation::accept_invitation)
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit_public)),
        )
        .route(
            "/client-intakes/public",
            post(handlers::intake::create_public_intake)
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit_public)),
        )
        .route(
            "/client-intakes/lookup",
            get(handlers::intake::lookup_intake)
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit_public)),
        )
        .route(
            "/client-intakes/submit",
            post(handlers::intake::submit_intake)
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit_public)),
        );

    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        // Workspaces
        .route("/workspaces", post(handlers::workspace::create_workspace))
        .route(
            "/workspaces/:id",
            get(handlers::workspace::get_workspace).patch(handlers::workspace::update_workspace),
        )
        // Invitations (workspace admin)
        .route(
            "/invitations",
            post(handlers::invitation::create_invitation)
                .get(handlers::invitation::list_invitations),
        )
        .route("/invitations/:id", delete(handlers::invitation::revoke_invitation))
        // Client intakes (workspace admin)
        .route(
            "/client-intakes",
            post(handlers::intake::create_intake).get(handlers::intake::list_intakes),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    public.merge(protected).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use workhub_auth::testing::RecordingNotifier;
    use workhub_auth::{DynNotifier, JwtService, NotifyError, OnboardingConfig, PasswordHasher};
    use workhub_database::MemoryStore;
    use workhub_models::{GlobalRole, User, WorkspaceRole};

    const PASSWORD: &str = "correct-horse-9";

    struct TestApp {
        router: Router,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        jwt: JwtService,
    }

    impl TestApp {
        fn new(notifier: RecordingNotifier) -> Self {
            let store = Arc::new(MemoryStore::new());
            let notifier = Arc::new(notifier);
            let jwt = JwtService::new("router-test-secret", 1);
            let state = AppState::new(
                store.clone(),
                store.clone(),
                notifier.clone() as DynNotifier,
                jwt.clone(),
                OnboardingConfig::default(),
                None,
                StoreBackend::Memory,
            );

            Self {
                router: create_router(Arc::new(state)),
                store,
                notifier,
                jwt,
            }
        }

        async fn user(&self, name: &str, email: &str, role: GlobalRole) -> User {
            let hash = PasswordHasher::hash(PASSWORD).unwrap();
            self.store.seed_user(name, email, role, Some(hash)).await
        }

        fn bearer(&self, user: &User) -> String {
            format!("Bearer {}", self.jwt.issue(user).unwrap())
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            auth: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(auth) = auth {
                builder = builder.header(header::AUTHORIZATION, auth);
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }
    }

    fn token_from_link(link: &str) -> String {
        link.split("token=").nth(1).unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new(RecordingNotifier::new());
        let (status, body) = app.send(Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let app = TestApp::new(RecordingNotifier::new());
        app.user("Ada", "ada@example.com", GlobalRole::User).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["user"].get("passwordHash").is_none());

        let bearer = format!("Bearer {}", body["token"].as_str().unwrap());
        let (status, me) = app.send(Method::GET, "/auth/me", Some(&bearer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = TestApp::new(RecordingNotifier::new());
        app.user("Ada", "ada@example.com", GlobalRole::User).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "nope-nope-1" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_credentials");
    }

    #[tokio::test]
    async fn test_protected_routes_require_bearer() {
        let app = TestApp::new(RecordingNotifier::new());

        let (status, body) = app.send(Method::GET, "/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_auth_header");

        let (status, _) = app
            .send(Method::GET, "/auth/me", Some("Bearer not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let app = TestApp::new(RecordingNotifier::new());
        let (status, body) = app
            .send(
                Method::POST,
                "/invitations/accept",
                None,
                Some(json!({ "password": PASSWORD })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_workspace_read_access() {
        let app = TestApp::new(RecordingNotifier::new());
        let owner = app.user("Owner", "owner@example.com", GlobalRole::User).await;
        let member = app.user("Member", "member@example.com", GlobalRole::User).await;
        let outsider = app.user("Outsider", "out@example.com", GlobalRole::User).await;
        let workspace = app.store.seed_workspace(owner.id, "Acme", "acme").await;
        app.store
            .seed_member(workspace.id, member.id, WorkspaceRole::User)
            .await;
        let uri = format!("/workspaces/{}", workspace.id);

        let (status, body) = app
            .send(Method::GET, &uri, Some(&app.bearer(&owner)), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["settings"].is_object());
        assert_eq!(body["members"].as_array().unwrap().len(), 2);

        let (status, body) = app
            .send(Method::GET, &uri, Some(&app.bearer(&member)), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["settings"].is_null());

        let (status, _) = app
            .send(Method::GET, &uri, Some(&app.bearer(&outsider)), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_and_update_workspace() {
        let app = TestApp::new(RecordingNotifier::new());
        let owner = app.user("Owner", "owner@example.com", GlobalRole::User).await;
        let other = app.user("Other", "other@example.com", GlobalRole::User).await;
        let bearer = app.bearer(&owner);

        let (status, created) = app
            .send(
                Method::POST,
                "/workspaces",
                Some(&bearer),
                Some(json!({ "name": "Acme", "slug": "acme" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = app
            .send(
                Method::POST,
                "/workspaces",
                Some(&app.bearer(&other)),
                Some(json!({ "name": "Acme 2", "slug": "acme" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "conflict");

        let uri = format!("/workspaces/{}", created["id"].as_str().unwrap());
        let (status, _) = app
            .send(
                Method::PATCH,
                &uri,
                Some(&app.bearer(&other)),
                Some(json!({ "name": "Hijacked" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, updated) = app
            .send(Method::PATCH, &uri, Some(&bearer), Some(json!({ "name": "Acme Inc" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Acme Inc");
    }

    #[tokio::test]
    async fn test_invitation_flow() {
        let app = TestApp::new(RecordingNotifier::new());
        let admin = app.user("Admin", "admin@example.com", GlobalRole::User).await;
        let workspace = app.store.seed_workspace(admin.id, "Acme", "acme").await;

        let (status, issued) = app
            .send(
                Method::POST,
                "/invitations",
                Some(&app.bearer(&admin)),
                Some(json!({
                    "email": "new@example.com",
                    "role": "USER",
                    "workspaceId": workspace.id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(issued["emailSent"], true);
        assert!(issued.get("token").is_none());

        let sent = app.notifier.invitations();
        assert_eq!(sent.len(), 1);
        let token = token_from_link(&sent[0].accept_url);

        let (status, details) = app
            .send(
                Method::GET,
                &format!("/invitations/lookup?token={}", token),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(details["email"], "new@example.com");

        let accept = json!({ "token": token, "password": PASSWORD, "name": "Newcomer" });
        let (status, accepted) = app
            .send(Method::POST, "/invitations/accept", None, Some(accept.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);

        let bearer = format!("Bearer {}", accepted["token"].as_str().unwrap());
        let (status, view) = app
            .send(
                Method::GET,
                &format!("/workspaces/{}", workspace.id),
                Some(&bearer),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["members"].as_array().unwrap().len(), 2);

        let (status, body) = app
            .send(Method::POST, "/invitations/accept", None, Some(accept))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "already_consumed");
    }

    #[tokio::test]
    async fn test_invitation_requires_workspace_admin() {
        let app = TestApp::new(RecordingNotifier::new());
        let owner = app.user("Owner", "owner@example.com", GlobalRole::User).await;
        let member = app.user("Member", "member@example.com", GlobalRole::User).await;
        let workspace = app.store.seed_workspace(owner.id, "Acme", "acme").await;
        app.store
            .seed_member(workspace.id, member.id, WorkspaceRole::User)
            .await;

        let (status, _) = app
            .send(
                Method::POST,
                "/invitations",
                Some(&app.bearer(&member)),
                Some(json!({
                    "email": "new@example.com",
                    "role": "USER",
                    "workspaceId": workspace.id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(app.notifier.invitations().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_invitation_token_is_not_found() {
        let app = TestApp::new(RecordingNotifier::new());
        let (status, body) = app
            .send(Method::GET, "/invitations/lookup?token=deadbeef", None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_list_invitations_needs_workspace_id() {
        let app = TestApp::new(RecordingNotifier::new());
        let owner = app.user("Owner", "owner@example.com", GlobalRole::User).await;

        let (status, body) = app
            .send(Method::GET, "/invitations", Some(&app.bearer(&owner)), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    fn sales_funnel() -> Value {
        json!({
            "name": "Grace",
            "email": "grace@example.com",
            "business_model": "B2B SaaS",
            "biggest_bottleneck": "Lead generation",
        })
    }

    async fn open_public_intake(app: &TestApp) -> String {
        let owner = app.user("Owner", "owner@example.com", GlobalRole::User).await;
        let workspace = app.store.seed_workspace(owner.id, "Acme", "acme").await;

        let (status, issued) = app
            .send(
                Method::POST,
                "/client-intakes/public",
                None,
                Some(json!({ "workspaceId": workspace.id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(issued["status"], "OPEN");
        issued["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_intake_submit_posts_webhook_once() {
        let app = TestApp::new(RecordingNotifier::with_webhook());
        let token = open_public_intake(&app).await;

        let (status, context) = app
            .send(
                Method::GET,
                &format!("/client-intakes/lookup?token={}", token),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(context["workspaceName"], "Acme");

        let submit = json!({ "token": token, "payload": sales_funnel() });
        let (status, submitted) = app
            .send(Method::POST, "/client-intakes/submit", None, Some(submit.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(submitted["status"], "SUBMITTED");
        assert_eq!(submitted["webhookSent"], true);
        assert_eq!(app.notifier.webhooks(), vec![sales_funnel()]);

        let (status, body) = app
            .send(Method::POST, "/client-intakes/submit", None, Some(submit))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "already_consumed");
        assert_eq!(app.notifier.webhooks().len(), 1);
        assert_eq!(app.store.clients().await.len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_failure_is_bad_gateway_but_committed() {
        let app = TestApp::new(
            RecordingNotifier::with_webhook().failing_webhook(NotifyError::Status(500)),
        );
        let token = open_public_intake(&app).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/client-intakes/submit",
                None,
                Some(json!({ "token": token, "payload": sales_funnel() })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "upstream_delivery_failed");

        let (status, body) = app
            .send(
                Method::GET,
                &format!("/client-intakes/lookup?token={}", token),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "already_consumed");
        assert_eq!(app.store.clients().await.len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_failure_body_hides_hook_url() {
        use workhub_auth::{DeliveryNotifier, EmailService, WebhookClient};

        // Nothing listens on the discard port, so delivery fails in transport
        let hook = "http://127.0.0.1:9/hooks/SECRET-zap-token";
        let webhook = WebhookClient::new(hook.to_string(), None, std::time::Duration::from_secs(2))
            .unwrap();
        let notifier: DynNotifier =
            Arc::new(DeliveryNotifier::new(EmailService::disabled(), Some(webhook)));

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            store.clone(),
            store.clone(),
            notifier,
            JwtService::new("router-test-secret", 1),
            OnboardingConfig::default(),
            None,
            StoreBackend::Memory,
        );
        let router = create_router(Arc::new(state));

        let owner = store
            .seed_user("Owner", "owner@example.com", GlobalRole::User, None)
            .await;
        let workspace = store.seed_workspace(owner.id, "Acme", "acme").await;

        let call = |uri: &str, body: Value| {
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        let response = router
            .clone()
            .oneshot(call("/client-intakes/public", json!({ "workspaceId": workspace.id })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let issued: Value = serde_json::from_slice(&bytes).unwrap();
        let token = issued["token"].as_str().unwrap().to_string();

        let response = router
            .oneshot(call(
                "/client-intakes/submit",
                json!({ "token": token, "payload": sales_funnel() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let raw = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(raw.contains("upstream_delivery_failed"));
        assert!(!raw.contains("SECRET-zap-token"), "{}", raw);
        assert!(!raw.contains("127.0.0.1"), "{}", raw);
        assert_eq!(store.clients().await.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_payload_skips_webhook() {
        let app = TestApp::new(RecordingNotifier::with_webhook());
        let token = open_public_intake(&app).await;

        let (status, submitted) = app
            .send(
                Method::POST,
                "/client-intakes/submit",
                None,
                Some(json!({
                    "token": token,
                    "payload": { "name": "Grace", "email": "grace@example.com" },
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(submitted["webhookSent"], false);
        assert!(app.notifier.webhooks().is_empty());
    }

    #[tokio::test]
    async fn test_list_intakes_for_admin() {
        let app = TestApp::new(RecordingNotifier::new());
        let owner = app.user("Owner", "owner@example.com", GlobalRole::User).await;
        let member = app.user("Member", "member@example.com", GlobalRole::User).await;
        let workspace = app.store.seed_workspace(owner.id, "Acme", "acme").await;
        app.store
            .seed_member(workspace.id, member.id, WorkspaceRole::User)
            .await;

        let (status, _) = app
            .send(
                Method::POST,
                "/client-intakes",
                Some(&app.bearer(&owner)),
                Some(json!({ "workspaceId": workspace.id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/client-intakes?workspaceId={}", workspace.id);
        let (status, listed) = app
            .send(Method::GET, &uri, Some(&app.bearer(&owner)), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["source"], "INTAKE");

        let (status, _) = app
            .send(Method::GET, &uri, Some(&app.bearer(&member)), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
