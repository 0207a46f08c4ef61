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
    dto::{
        auth::{AdminTokenResponse, LoginRequest, RegisterRequest, SessionResponse},
        cart::{AddToCartRequest, CartData, UpdateCartRequest},
        orders::{
            ConfirmPaymentRequest, DeferredCheckout, OrderLineInput, OrderList, PlaceOrderRequest,
            PlacedOrder, UpdateStatusRequest,
        },
        products::{ProductList, ProductUpload, RemoveProductRequest, SingleProductRequest},
    },
    models::{Brand, CartMap, Order, OrderLine, OrderStatus, PaymentMethod, Product, UserProfile},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, orders, products},
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
        auth::register,
        auth::login,
        auth::admin,
        auth::me,
        cart::add_to_cart,
        cart::update_cart,
        cart::get_cart,
        products::list_products,
        products::add_product,
        products::remove_product,
        products::single_product,
        orders::place_order,
        orders::place_deferred,
        orders::list_all_orders,
        orders::user_orders,
        orders::update_status,
        orders::confirm_payment,
        orders::webhook
    ),
    components(
        schemas(
            UserProfile,
            Product,
            Brand,
            Order,
            OrderLine,
            OrderStatus,
            PaymentMethod,
            CartMap,
            RegisterRequest,
            LoginRequest,
            SessionResponse,
            AdminTokenResponse,
            AddToCartRequest,
            UpdateCartRequest,
            CartData,
            ProductList,
            ProductUpload,
            RemoveProductRequest,
            SingleProductRequest,
            OrderLineInput,
            PlaceOrderRequest,
            PlacedOrder,
            DeferredCheckout,
            ConfirmPaymentRequest,
            UpdateStatusRequest,
            OrderList,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartData>,
            ApiResponse<OrderList>,
            ApiResponse<SessionResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "User", description = "Registration, sign-in and profile"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order and payment endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
