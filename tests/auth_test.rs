mod common;

use sea_orm::{ActiveValue::Set, EntityTrait};
use uuid::Uuid;

use devfolio_api::auth::AuthService;
use devfolio_api::entities::user::{self, UserRole};
use devfolio_api::errors::ServiceError;

use common::TestApp;

#[tokio::test]
async fn authenticate_accepts_the_seeded_credentials() {
    let app = TestApp::new().await;
    let id = app
        .seed_user("admin@site.test", "admin123", UserRole::Admin)
        .await;

    let principal = app
        .auth()
        .authenticate("admin@site.test", "admin123")
        .await
        .unwrap()
        .expect("valid credentials");
    assert_eq!(principal.id, id);
    assert_eq!(principal.role, UserRole::Admin);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new().await;
    app.seed_user("admin@site.test", "admin123", UserRole::Admin)
        .await;

    let wrong_password = app
        .auth()
        .authenticate("admin@site.test", "not-the-password")
        .await
        .unwrap();
    let unknown_email = app
        .auth()
        .authenticate("nobody@site.test", "admin123")
        .await
        .unwrap();
    assert!(wrong_password.is_none());
    assert!(unknown_email.is_none());
}

#[tokio::test]
async fn inactive_users_cannot_authenticate() {
    let app = TestApp::new().await;
    let id = app
        .seed_user("gone@site.test", "admin123", UserRole::Admin)
        .await;

    let mut row: user::ActiveModel = user::Entity::find_by_id(id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap()
        .into();
    row.is_active = Set(false);
    user::Entity::update(row).exec(app.db()).await.unwrap();

    let principal = app
        .auth()
        .authenticate("gone@site.test", "admin123")
        .await
        .unwrap();
    assert!(principal.is_none());
}

#[tokio::test]
async fn change_password_rotates_the_stored_digest() {
    let app = TestApp::new().await;
    let id = app
        .seed_user("admin@site.test", "old-password", UserRole::Admin)
        .await;

    app.auth()
        .change_password(id, "old-password", "new-password")
        .await
        .unwrap();

    assert!(app
        .auth()
        .authenticate("admin@site.test", "old-password")
        .await
        .unwrap()
        .is_none());
    assert!(app
        .auth()
        .authenticate("admin@site.test", "new-password")
        .await
        .unwrap()
        .is_some());

    let stored = user::Entity::find_by_id(id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.password_hash, AuthService::hash_password("new-password"));
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = TestApp::new().await;
    let id = app
        .seed_user("admin@site.test", "old-password", UserRole::Admin)
        .await;

    let err = app
        .auth()
        .change_password(id, "guessed-wrong", "new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    let err = app
        .auth()
        .change_password(Uuid::new_v4(), "old-password", "new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
