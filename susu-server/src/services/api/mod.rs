use actix_web::web::*;

mod health;
mod otp;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/api")
            .configure(otp::configure)
            .configure(health::configure),
    );
}
