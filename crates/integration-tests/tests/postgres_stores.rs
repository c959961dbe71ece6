//! Postgres document and identity stores against a live database.
//!
//! Requires `FUNCTIONS_DATABASE_URL` (or `DATABASE_URL`) pointing at a
//! disposable database. Every test scopes its data under a fresh uuid so
//! runs do not collide.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use sqlx::PgPool;

use menuboard_core::{CustomClaims, Email, Role, Subdomain, TenantId, Uid};
use menuboard_functions::db::{self, PgDocumentStore, PgIdentityStore};
use menuboard_functions::services::{AuthorizationGuard, CascadeStep, TenantDeletionCascade};
use menuboard_functions::store::{
    DocPath, DocumentStore, IdentityStore, StoreError, WriteBatch, layout,
};
use menuboard_functions::token::VerifiedCaller;

async fn pool() -> PgPool {
    let url = std::env::var("FUNCTIONS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap();
    let pool = db::create_pool(&SecretString::from(url)).await.unwrap();
    sqlx::migrate!("../functions/migrations")
        .run(&pool)
        .await
        .unwrap();
    pool
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_document_crud_and_queries() {
    let store = PgDocumentStore::new(pool().await);
    let tenant = unique("tenant");

    let profile = DocPath::parse(&format!("profile/{tenant}")).unwrap();
    store
        .set(&profile, json!({"name": "Cafe", "userId": tenant}))
        .await
        .unwrap();
    let doc = store.get(&profile).await.unwrap().unwrap();
    assert_eq!(doc.data["name"], json!("Cafe"));

    for i in 0..3 {
        let path = DocPath::parse(&format!("menu/{tenant}/items/i{i}")).unwrap();
        store.set(&path, json!({"n": i})).await.unwrap();
    }
    let items = layout::menu_root(&TenantId::new(tenant.clone()))
        .unwrap()
        .collection("items");
    assert_eq!(store.list_collection(&items).await.unwrap().len(), 3);

    let hits = store
        .query_eq(&profile.parent(), "userId", &tenant)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, profile);

    store.delete(&profile).await.unwrap();
    assert!(store.get(&profile).await.unwrap().is_none());
    // Deleting again is not an error.
    store.delete(&profile).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_batch_commit_is_applied_together() {
    let store = PgDocumentStore::new(pool().await);
    let tenant = unique("tenant");
    let a = DocPath::parse(&format!("profile/{tenant}")).unwrap();
    let b = DocPath::parse(&format!("menu/{tenant}")).unwrap();
    store.set(&a, json!({"name": "Cafe"})).await.unwrap();

    let mut batch = WriteBatch::new();
    batch.delete(a.clone()).set(b.clone(), json!({"createdAt": "now"}));
    store.commit(batch).await.unwrap();

    assert!(store.get(&a).await.unwrap().is_none());
    assert!(store.get(&b).await.unwrap().is_some());

    store.commit(WriteBatch::new()).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_identity_lifecycle() {
    let store = PgIdentityStore::new(pool().await);
    let uid = Uid::new(unique("user"));
    let email = Email::parse("owner@menuboard.test").unwrap();

    assert!(store.get_user(&uid).await.unwrap().is_none());
    let created = store.create_user(&uid, Some(&email)).await.unwrap();
    assert!(created.claims.is_none());

    let claims =
        CustomClaims::for_role(Role::Host, Some(Subdomain::parse("pizza").unwrap())).unwrap();
    store.set_custom_claims(&uid, &claims).await.unwrap();
    let record = store.get_user(&uid).await.unwrap().unwrap();
    assert_eq!(record.claims, Some(claims));
    assert_eq!(record.email, Some(email));

    store.delete_user(&uid).await.unwrap();
    assert!(matches!(
        store.delete_user(&uid).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store
            .set_custom_claims(&uid, &CustomClaims::for_role(Role::Guest, None).unwrap())
            .await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_cascade_on_postgres() {
    let pool = pool().await;
    let documents = PgDocumentStore::new(pool.clone());
    let identities = PgIdentityStore::new(pool);
    let admin = Uid::new(unique("admin"));
    let target = unique("tenant");
    let neighbour = unique("tenant");

    identities.create_user(&admin, None).await.unwrap();
    identities
        .set_custom_claims(&admin, &CustomClaims::for_role(Role::SuperAdmin, None).unwrap())
        .await
        .unwrap();
    for uid in [&target, &neighbour] {
        identities
            .create_user(&Uid::new(uid.clone()), None)
            .await
            .unwrap();
        for path in [
            format!("profile/{uid}"),
            format!("profile/{uid}/profile/contact"),
            format!("profile/{uid}/settings/general"),
            format!("menu/{uid}"),
            format!("menu/{uid}/categories/c1"),
            format!("menu/{uid}/items/i1"),
            format!("submissions/{uid}"),
            format!("submissions/{uid}/data/o1"),
            format!("subdomains/reg-{uid}"),
            format!("publicMenus/pm-{uid}"),
        ] {
            documents
                .set(&DocPath::parse(&path).unwrap(), json!({"userId": uid}))
                .await
                .unwrap();
        }
    }

    let bootstrap = Uid::new(unique("bootstrap"));
    let guard = AuthorizationGuard::new(identities.clone(), bootstrap.clone());
    let cascade = TenantDeletionCascade::new(documents.clone(), identities.clone(), bootstrap);
    let caller = VerifiedCaller {
        uid: admin.clone(),
        expires_at: i64::MAX,
    };
    let ctx = guard.authorize(Some(&caller)).await.unwrap();

    let report = cascade.delete_tenant_user(&ctx, &target).await.unwrap();
    assert_eq!(report.count(CascadeStep::Profile), 3);
    assert_eq!(report.count(CascadeStep::SubdomainRegistry), 1);
    assert_eq!(report.count(CascadeStep::PublicMenus), 1);
    assert_eq!(report.total(), 10);

    let tenant = TenantId::new(target.clone());
    assert!(
        documents
            .get(&layout::profile_root(&tenant).unwrap())
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        identities
            .get_user(&Uid::new(target.clone()))
            .await
            .unwrap()
            .is_none()
    );

    for index in [layout::subdomains(), layout::public_menus()] {
        assert!(
            documents
                .query_eq(&index, "userId", &target)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            documents
                .query_eq(&index, "userId", &neighbour)
                .await
                .unwrap()
                .len(),
            1
        );
    }
    let neighbour_profile = layout::profile_root(&TenantId::new(neighbour.clone())).unwrap();
    assert_eq!(
        documents
            .list_collection(&neighbour_profile.collection("profile"))
            .await
            .unwrap()
            .len(),
        1
    );

    // Clean up what this run left behind.
    cascade.delete_tenant_user(&ctx, &neighbour).await.unwrap();
    identities.delete_user(&admin).await.unwrap();
}
