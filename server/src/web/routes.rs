// darkroom_server/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{cart_handlers, checkout_handlers, order_handlers, product_handlers, session_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route(
            "/items/{product_id}",
            web::patch().to(cart_handlers::update_quantity_handler),
          )
          .route(
            "/items/{product_id}",
            web::delete().to(cart_handlers::remove_from_cart_handler),
          ),
      )
      .service(
        web::scope("/checkout")
          .route("", web::post().to(checkout_handlers::start_checkout_handler))
          .route("/{order_id}", web::get().to(order_handlers::review_order_handler))
          .route("/{order_id}/pay", web::post().to(checkout_handlers::pay_order_handler)),
      )
      .route("/session", web::delete().to(session_handlers::close_session_handler)),
  );
}
