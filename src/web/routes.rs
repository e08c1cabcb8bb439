use actix_web::web;

use crate::web::handlers::{auth_handlers, cart_handlers, catalog_handlers, checkout_handlers, order_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .route("/", web::get().to(catalog_handlers::index_handler))
      .route(
        "/catalog/refresh",
        web::post().to(catalog_handlers::catalog_refresh_handler),
      )
      .service(
        web::scope("/auth")
          .route("/signin", web::post().to(auth_handlers::signin_handler))
          .route("/register", web::post().to(auth_handlers::register_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::cart_info_handler))
          .route("/add", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/update", web::post().to(cart_handlers::update_cart_handler))
          .route("/delete", web::post().to(cart_handlers::delete_cart_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/place", web::post().to(checkout_handlers::place_order_handler))
          .route("/commit", web::post().to(checkout_handlers::commit_order_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/pay", web::post().to(order_handlers::start_payment_handler))
          .route("/{order_id}/payment", web::get().to(order_handlers::check_payment_handler))
          .route(
            "/{order_id}/comments",
            web::post().to(order_handlers::submit_comments_handler),
          ),
      )
      .service(
        web::scope("/products").route("/{variant_id}", web::get().to(catalog_handlers::product_detail_handler)),
      )
      .service(web::scope("/users").route("/history", web::get().to(catalog_handlers::browsing_history_handler)))
      .service(
        web::scope("/categories")
          .route("/{category_id}/products", web::get().to(catalog_handlers::category_list_handler)),
      ),
  );
}
