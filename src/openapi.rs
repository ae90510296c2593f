use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Devfolio API",
        version = "1.0.0",
        description = r#"
Backend for a small-business product portfolio site.

The public catalog surface always answers: when no database is configured,
or the database errors or is empty, a built-in fallback catalog is served
instead. Admin endpoints require an admin bearer token obtained from
`/api/v1/auth/login` and never fall back to mock data.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "catalog", description = "Public product and category endpoints"),
        (name = "settings", description = "Public site settings"),
        (name = "auth", description = "Authentication"),
        (name = "admin", description = "Administrative endpoints"),
        (name = "health", description = "Health check")
    ),
    paths(
        // Public catalog
        crate::handlers::catalog::list_categories,
        crate::handlers::catalog::list_products,
        crate::handlers::catalog::get_product_by_slug,

        // Settings
        crate::handlers::settings::get_settings,
        crate::handlers::settings::update_settings,

        // Auth
        crate::handlers::auth::login,
        crate::handlers::auth::change_password,

        // Admin catalog
        crate::handlers::catalog::list_products_admin,
        crate::handlers::catalog::create_product,
        crate::handlers::catalog::update_product,
        crate::handlers::catalog::delete_product,
        crate::handlers::catalog::create_category,

        // Uploads
        crate::handlers::uploads::upload_image,
    ),
    components(
        schemas(
            crate::services::catalog::CategoryView,
            crate::services::catalog::ProductView,
            crate::services::catalog::ProductImageView,
            crate::services::catalog::ProductInput,
            crate::services::catalog::ImageInput,
            crate::services::catalog::CategoryInput,
            crate::services::settings::SiteSettings,
            crate::services::settings::SiteSettingsPatch,
            crate::services::settings::PriceDisplayMode,
            crate::services::uploads::UploadResult,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::ChangePasswordRequest,
            crate::auth::Principal,
            crate::entities::product::ProductStatus,
            crate::entities::user::UserRole,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
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
