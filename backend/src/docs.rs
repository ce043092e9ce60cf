#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::cars::CarSearchQuery,
    models::{
        car::{Car, CarDetails, CarImageResponse, CarListItem, CarPayload, UploadedImagesResponse},
        password_reset::{RequestPasswordResetPayload, ResetPasswordPayload},
        user::{LoginRequest, LoginResponse, RegisterAdminPayload, UserResponse, UserRole},
        PaginationQuery,
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        login_doc,
        me_doc,
        forgot_password_doc,
        reset_password_doc,
        list_cars_doc,
        car_details_doc,
        create_car_doc,
        update_car_doc,
        delete_car_doc,
        upload_images_doc,
        delete_image_doc,
        set_primary_image_doc,
        register_admin_doc
    ),
    components(
        schemas(
            // auth
            LoginRequest,
            LoginResponse,
            UserResponse,
            UserRole,
            RegisterAdminPayload,
            RequestPasswordResetPayload,
            ResetPasswordPayload,
            // inventory
            Car,
            CarPayload,
            CarListItem,
            CarDetails,
            CarImageResponse,
            UploadedImagesResponse,
            PaginationQuery
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Login and password reset"),
        (name = "Cars", description = "Public inventory browsing"),
        (name = "Admin", description = "Back-office inventory management")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, description = "The authenticated user", body = UserResponse)),
    tag = "Auth"
)]
fn me_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = RequestPasswordResetPayload,
    responses((status = 200, description = "Acknowledged, whether or not the account exists")),
    tag = "Auth",
    security(())
)]
fn forgot_password_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid request or token")
    ),
    tag = "Auth",
    security(())
)]
fn reset_password_doc() {}

#[utoipa::path(
    get,
    path = "/api/cars",
    params(CarSearchQuery),
    responses((status = 200, description = "Paginated listing summaries", body = [CarListItem])),
    tag = "Cars",
    security(())
)]
fn list_cars_doc() {}

#[utoipa::path(
    get,
    path = "/api/cars/{id}",
    params(("id" = String, Path, description = "Car id")),
    responses(
        (status = 200, description = "Listing with its ordered gallery", body = CarDetails),
        (status = 404, description = "Unknown car")
    ),
    tag = "Cars",
    security(())
)]
fn car_details_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/cars",
    request_body = CarPayload,
    responses((status = 200, description = "Created listing", body = Car)),
    tag = "Admin"
)]
fn create_car_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/cars/{id}",
    params(("id" = String, Path, description = "Car id")),
    request_body = CarPayload,
    responses((status = 200, description = "Updated listing", body = Car)),
    tag = "Admin"
)]
fn update_car_doc() {}

#[utoipa::path(
    delete,
    path = "/api/admin/cars/{id}",
    params(("id" = String, Path, description = "Car id")),
    responses((status = 200, description = "Car and gallery deleted")),
    tag = "Admin"
)]
fn delete_car_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/cars/{id}/images",
    params(("id" = String, Path, description = "Car id")),
    responses(
        (status = 200, description = "Committed gallery entries", body = UploadedImagesResponse),
        (status = 400, description = "One or more files failed validation"),
        (status = 409, description = "Gallery ceiling would be exceeded")
    ),
    tag = "Admin"
)]
fn upload_images_doc() {}

#[utoipa::path(
    delete,
    path = "/api/admin/cars/{id}/images/{image_id}",
    params(
        ("id" = String, Path, description = "Car id"),
        ("image_id" = String, Path, description = "Image id")
    ),
    responses((status = 200, description = "Image removed")),
    tag = "Admin"
)]
fn delete_image_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/cars/{id}/images/{image_id}/primary",
    params(
        ("id" = String, Path, description = "Car id"),
        ("image_id" = String, Path, description = "Image id")
    ),
    responses((status = 200, description = "Primary designation moved")),
    tag = "Admin"
)]
fn set_primary_image_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = RegisterAdminPayload,
    responses(
        (status = 200, description = "Administrator account created", body = UserResponse),
        (status = 409, description = "Email or username already in use")
    ),
    tag = "Admin"
)]
fn register_admin_doc() {}
