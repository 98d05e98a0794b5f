use actix_web::web::*;

use crate::handlers::otp;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/otp")
            .route("", post().to(otp::request_otp))
            .route("/verify", post().to(otp::verify_otp)),
    );
}
