// grocer_server/src/web/routes.rs

use actix_web::web;

use crate::state::AppState;
use crate::web::handlers::{order_handlers, return_handlers, rider_handlers};

async fn health_check_handler(app_state: web::Data<AppState>) -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({
    "status": "ok",
    "store": app_state.config.store_backend.as_str(),
  }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/history", web::get().to(order_handlers::order_history_handler))
          .route("/{order_id}/transition", web::post().to(order_handlers::transition_order_handler))
          .route("/{order_id}/confirm", web::post().to(order_handlers::confirm_order_handler))
          .route("/{order_id}/preparation", web::post().to(order_handlers::update_preparation_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler))
          .route("/{order_id}/ship", web::post().to(order_handlers::ship_order_handler))
          .route("/{order_id}/deliver", web::post().to(order_handlers::deliver_order_handler))
          .route("/{order_id}/assign-rider", web::post().to(order_handlers::assign_rider_handler)),
      )
      .route(
        "/shops/{shop_id}/orders/{order_id}/auto-assign",
        web::post().to(order_handlers::auto_assign_handler),
      )
      .service(
        web::scope("/riders/me")
          .route("/availability", web::put().to(rider_handlers::set_availability_handler))
          .route("/location", web::put().to(rider_handlers::update_location_handler)),
      )
      .service(
        web::scope("/order-items/{order_item_id}/returns")
          .route("", web::post().to(return_handlers::request_return_handler))
          .route("/history", web::get().to(return_handlers::return_history_handler)),
      )
      .service(
        web::scope("/returns/{return_id}")
          .route("", web::get().to(return_handlers::get_return_handler))
          .route("/decision", web::post().to(return_handlers::process_return_handler))
          .route("/picked-up", web::post().to(return_handlers::picked_up_handler))
          .route("/received", web::post().to(return_handlers::received_handler))
          .route("/refund", web::post().to(return_handlers::refunded_handler)),
      ),
  );
}
