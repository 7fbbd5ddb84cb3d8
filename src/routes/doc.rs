use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::products::ProductList,
    error::{ErrorData, FieldError},
    models::{Order, OrderStatus, Product, Role},
    notice::{Notice, NoticeLevel},
    response::{ApiResponse, Meta},
    routes::{dashboard, health, vendor},
    services::{inventory_service::ProductForm, order_service::OrderView},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        dashboard::customer_orders,
        dashboard::live_orders,
        vendor::list_products,
        vendor::create_product,
        vendor::update_product,
        vendor::delete_product
    ),
    components(
        schemas(
            Order,
            OrderStatus,
            OrderView,
            Product,
            ProductForm,
            ProductList,
            Role,
            Notice,
            NoticeLevel,
            FieldError,
            ErrorData,
            Meta,
            ApiResponse<OrderView>,
            ApiResponse<Product>,
            ApiResponse<ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Customer", description = "Customer order dashboard"),
        (name = "Vendor", description = "Vendor product inventory"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
