//! Callable functions through the full router.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use menuboard_core::{Role, Uid};
use menuboard_functions::store::{DocumentStore, IdentityStore, layout};
use menuboard_integration_tests::{BOOTSTRAP_UID, TestApp, error_status};

const FUNCTIONS: [&str; 3] = ["setUserRole", "deleteUser", "getUserRoleInfo"];

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (status, _) = app.call(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    let app = TestApp::new().await;
    for name in FUNCTIONS {
        let (status, body) = app.function(name, None, json!({"uid": "u1"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{name}");
        assert_eq!(error_status(&body), "UNAUTHENTICATED");
    }
}

#[tokio::test]
async fn test_forged_token_is_unauthenticated() {
    let app = TestApp::new().await;
    let (status, _) = app
        .call(
            Method::POST,
            "/functions/getUserRoleInfo",
            Some("root.9999999999.deadbeef"),
            Some(json!({"uid": "u1"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_superadmins_are_denied_everywhere() {
    let app = TestApp::new().await;
    app.add_user("host1", Role::Host, Some("pizza")).await;
    app.add_user("guest1", Role::Guest, None).await;
    app.add_user("target", Role::Guest, None).await;

    for caller in ["host1", "guest1", "unknown"] {
        for name in FUNCTIONS {
            let (status, body) = app
                .function(
                    name,
                    Some(caller),
                    json!({"uid": "target", "role": "superadmin"}),
                )
                .await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{caller} {name}");
            assert_eq!(error_status(&body), "PERMISSION_DENIED");
        }
    }

    // Nothing changed.
    let record = app
        .identities
        .get_user(&Uid::new("target"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.claims.unwrap().role, Role::Guest);
}

#[tokio::test]
async fn test_set_role_host_round_trip() {
    let app = TestApp::new().await;
    app.add_user("admin", Role::SuperAdmin, None).await;
    app.identities.insert("u1", None, None).await;

    let (status, body) = app
        .function(
            "setUserRole",
            Some("admin"),
            json!({"uid": "u1", "role": "host", "subdomain": "pizza"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["role"], json!("host"));
    assert_eq!(body["subdomain"], json!("pizza"));

    let (status, body) = app
        .function("getUserRoleInfo", Some("admin"), json!({"uid": "u1"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"role": "host", "subdomain": "pizza"}));
}

#[tokio::test]
async fn test_set_role_validation() {
    let app = TestApp::new().await;
    app.identities.insert("u1", None, None).await;

    let cases = [
        json!({"uid": "u1", "role": "owner"}),
        json!({"uid": "u1", "role": "host"}),
        json!({"uid": "u1", "role": "host", "subdomain": ""}),
        json!({"role": "guest"}),
        json!({"uid": "u1", "role": "host", "subdomain": "no spaces"}),
    ];
    for body in cases {
        let (status, response) = app
            .function("setUserRole", Some(BOOTSTRAP_UID), body.clone())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error_status(&response), "INVALID_ARGUMENT");
    }
}

#[tokio::test]
async fn test_superadmin_role_clears_subdomain() {
    let app = TestApp::new().await;
    app.add_user("u1", Role::Host, Some("pizza")).await;

    let (status, body) = app
        .function(
            "setUserRole",
            Some(BOOTSTRAP_UID),
            json!({"uid": "u1", "role": "superadmin", "subdomain": "pizza"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subdomain"], json!(null));

    let claims = app
        .identities
        .get_user(&Uid::new("u1"))
        .await
        .unwrap()
        .unwrap()
        .claims
        .unwrap();
    assert_eq!(claims.role, Role::SuperAdmin);
    assert!(claims.subdomain.is_none());
}

#[tokio::test]
async fn test_promoted_user_gains_access_immediately() {
    let app = TestApp::new().await;
    app.add_user("u1", Role::Guest, None).await;

    let (status, _) = app
        .function("getUserRoleInfo", Some("u1"), json!({"uid": "u1"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.function(
        "setUserRole",
        Some(BOOTSTRAP_UID),
        json!({"uid": "u1", "role": "superadmin"}),
    )
    .await;

    let (status, body) = app
        .function("getUserRoleInfo", Some("u1"), json!({"uid": "u1"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("superadmin"));
}

#[tokio::test]
async fn test_role_info_without_claims_is_guest() {
    let app = TestApp::new().await;
    app.identities.insert("fresh", None, None).await;

    let (status, body) = app
        .function("getUserRoleInfo", Some(BOOTSTRAP_UID), json!({"uid": "fresh"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"role": "guest", "subdomain": null}));
}

#[tokio::test]
async fn test_claims_write_failure_is_internal() {
    let app = TestApp::new().await;
    app.identities.insert("u1", None, None).await;
    app.identities.fail_claim_writes(true);

    let (status, body) = app
        .function(
            "setUserRole",
            Some(BOOTSTRAP_UID),
            json!({"uid": "u1", "role": "guest"}),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_status(&body), "INTERNAL");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("identity service rejected claims update")
    );
}

async fn seed_tenant(app: &TestApp, uid: &str) {
    app.identities.insert(uid, None, None).await;
    app.put(&format!("profile/{uid}"), json!({"name": "Cafe"})).await;
    app.put(
        &format!("profile/{uid}/profile/contact"),
        json!({"email": "owner@cafe.test"}),
    )
    .await;
    app.put(&format!("profile/{uid}/settings/general"), json!({})).await;
    app.put(&format!("menu/{uid}"), json!({})).await;
    for i in 0..3 {
        app.put(&format!("menu/{uid}/categories/c{i}"), json!({"name": "c"}))
            .await;
    }
    for i in 0..5 {
        app.put(&format!("menu/{uid}/items/i{i}"), json!({"name": "i"}))
            .await;
    }
    app.put(&format!("submissions/{uid}"), json!({})).await;
    app.put(
        &format!("submissions/{uid}/data/o1"),
        json!({"customerName": "G"}),
    )
    .await;
    app.put(
        &format!("subdomains/reg-{uid}"),
        json!({"subdomain": format!("{uid}-pizza"), "userId": uid}),
    )
    .await;
    app.put(
        &format!("publicMenus/pm-{uid}"),
        json!({"userId": uid, "name": "Cafe"}),
    )
    .await;
}

#[tokio::test]
async fn test_delete_user_cascade() {
    let app = TestApp::new().await;
    seed_tenant(&app, "u1").await;
    seed_tenant(&app, "u2").await;

    let (status, body) = app
        .function("deleteUser", Some(BOOTSTRAP_UID), json!({"uid": "u1"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    for prefix in [
        "profile/u1",
        "menu/u1/categories",
        "menu/u1/items",
        "submissions/u1",
    ] {
        assert_eq!(app.documents.count_prefix(prefix).await, 0, "{prefix}");
    }
    for index in [layout::subdomains(), layout::public_menus()] {
        let owned = app.documents.query_eq(&index, "userId", "u1").await.unwrap();
        assert!(owned.is_empty(), "{}", index.as_str());
        let other = app.documents.query_eq(&index, "userId", "u2").await.unwrap();
        assert_eq!(other.len(), 1, "{}", index.as_str());
    }
    assert!(
        app.identities
            .get_user(&Uid::new("u1"))
            .await
            .unwrap()
            .is_none()
    );

    // The other tenant keeps everything.
    assert_eq!(app.documents.count_prefix("profile/u2").await, 3);
    assert_eq!(app.documents.count_prefix("menu/u2").await, 9);
    assert_eq!(app.documents.count_prefix("submissions/u2").await, 2);
    assert!(
        app.identities
            .get_user(&Uid::new("u2"))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_delete_user_failed_batch_keeps_everything() {
    let app = TestApp::new().await;
    seed_tenant(&app, "u1").await;
    let before = app.documents.len().await;
    app.documents.fail_commits(true);

    let (status, body) = app
        .function("deleteUser", Some(BOOTSTRAP_UID), json!({"uid": "u1"}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_status(&body), "INTERNAL");
    assert_eq!(app.documents.len().await, before);
    assert!(
        app.identities
            .get_user(&Uid::new("u1"))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_bootstrap_cannot_be_deleted_by_superadmin() {
    let app = TestApp::new().await;
    app.add_user("admin", Role::SuperAdmin, None).await;

    let (status, body) = app
        .function("deleteUser", Some("admin"), json!({"uid": BOOTSTRAP_UID}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_status(&body), "PERMISSION_DENIED");
    assert!(
        app.identities
            .get_user(&Uid::new(BOOTSTRAP_UID))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_delete_unknown_user_is_internal() {
    let app = TestApp::new().await;
    let (status, body) = app
        .function("deleteUser", Some(BOOTSTRAP_UID), json!({"uid": "ghost"}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_status(&body), "INTERNAL");
    assert_eq!(app.documents.commit_attempts(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_argument_after_auth() {
    let app = TestApp::new().await;
    let token = app.token(BOOTSTRAP_UID);
    let (status, body) = app
        .call(
            Method::POST,
            "/functions/getUserRoleInfo",
            Some(&token),
            Some(json!(["not", "an", "object"])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_status(&body), "INVALID_ARGUMENT");

    // Without a token the guard answers first.
    let (status, _) = app
        .call(
            Method::POST,
            "/functions/getUserRoleInfo",
            None,
            Some(json!(["not", "an", "object"])),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_document_is_readable_after_role_changes() {
    // Role changes never touch tenant documents.
    let app = TestApp::new().await;
    seed_tenant(&app, "u1").await;
    app.function(
        "setUserRole",
        Some(BOOTSTRAP_UID),
        json!({"uid": "u1", "role": "host", "subdomain": "pizza"}),
    )
    .await;

    let profile = app
        .documents
        .get(&layout::profile_root(&menuboard_core::TenantId::new("u1")).unwrap())
        .await
        .unwrap();
    assert!(profile.is_some());
}
