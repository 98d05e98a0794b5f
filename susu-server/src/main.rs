use susu_common::clock::{Clock, SystemClock};
use susu_common::db::{self, DbAsyncPool};
use susu_common::delivery::OtpDispatcher;
use susu_common::email::senders::mock_sender::MockSender;
use susu_common::email::senders::smtp_sender::SmtpSender;
use susu_common::email::EmailSender;
use susu_common::otp::{OtpHasher, OtpIssuer, OtpRecordStore, OtpVerifier};
use susu_common::sms::senders::mock_sender::MockSmsSender;
use susu_common::sms::SmsSender;

use actix_protobuf::ProtoBufConfig;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use flexi_logger::{
    Age, Cleanup, Criterion, Duplicate, FileSpec, LogSpecification, Logger, Naming, WriteMode,
};
use std::sync::Arc;

mod env;
mod handlers;
mod services;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let mut port = 9000u16;

    let mut args = std::env::args();

    // Eat the first argument, which is the relative path to the executable
    args.next();

    while let Some(arg) = args.next() {
        match arg.to_lowercase().as_str() {
            "--port" => {
                let port_str = {
                    let next_arg = args.next();

                    match next_arg {
                        Some(s) => s,
                        None => {
                            eprintln!("ERROR: --port option specified but no port was given");
                            std::process::exit(1);
                        }
                    }
                };

                port = {
                    let port_result = port_str.parse::<u16>();

                    match port_result {
                        Ok(p) => p,
                        Err(_) => {
                            eprintln!("ERROR: Incorrect format for port. Integer expected");
                            std::process::exit(1);
                        }
                    }
                };

                continue;
            }
            a => {
                eprintln!("ERROR: Invalid argument: {}", &a);
                std::process::exit(1);
            }
        }
    }

    let conf = match env::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    let log_spec = match LogSpecification::parse(&conf.log_level) {
        Ok(s) => s,
        Err(_) => {
            eprintln!(
                "WARNING: Invalid log level '{}'. Defaulting to info",
                conf.log_level
            );
            LogSpecification::info()
        }
    };

    let _logger = match Logger::with(log_spec)
        .log_to_file(FileSpec::default().directory("./logs"))
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogAndCompressedFiles(60, 365),
        )
        .cleanup_in_background_thread(true)
        .duplicate_to_stdout(Duplicate::All)
        .write_mode(WriteMode::Async)
        .format(|writer, now, record| {
            write!(
                writer,
                "{:5} | {} | {}:{} | {}",
                record.level(),
                now.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
                record.module_path().unwrap_or("<unknown>"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .use_utc()
        .start()
    {
        Ok(l) => l,
        Err(e) => {
            eprintln!("ERROR: Failed to start logger: {e}");
            std::process::exit(1);
        }
    };

    let actix_workers = conf.actix_worker_count;

    // To prevent resource starvation, max connections must be at least as large as the number of
    // actix workers
    let db_max_connections = conf.db_max_connections.max(actix_workers as u32);

    log::info!("Connecting to database...");

    let db_async_pool: DbAsyncPool =
        match db::create_db_async_pool(&conf.database_uri(), db_max_connections).await {
            Ok(p) => p,
            Err(e) => {
                log::error!("Failed to create database pool: {e}");
                std::process::exit(1);
            }
        };

    if let Err(e) = db_async_pool.get().await {
        log::error!("Failed to connect to database: {e}");
        std::process::exit(1);
    }

    log::info!("Successfully connected to database");

    let otp_hasher = match OtpHasher::new(&conf.otp_hashing_key) {
        Ok(h) => Arc::new(h),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let email_sender: EmailSender = if conf.email_enabled {
        log::info!("Connecting to SMTP relay...");

        let smtp_sender = match SmtpSender::new(
            &conf.smtp_address,
            &conf.smtp_username,
            &conf.smtp_password,
        ) {
            Ok(s) => s,
            Err(e) => {
                log::error!("Failed to create SMTP sender: {e}");
                std::process::exit(1);
            }
        };

        log::info!("SMTP relay configured");

        Box::new(smtp_sender)
    } else {
        log::info!("Emails are disabled. Using mock email sender.");
        Box::new(MockSender::new())
    };

    let sms_sender: Option<SmsSender> = if conf.sms_enabled {
        log::info!("SMS is enabled. Using mock SMS sender.");
        Some(Box::new(MockSmsSender::new()))
    } else {
        log::info!("SMS is disabled. Phone identifiers will be rejected.");
        None
    };

    let otp_store: Arc<dyn OtpRecordStore> =
        Arc::new(db::otp::Dao::new(&db_async_pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let otp_issuer = Data::new(OtpIssuer::new(
        Arc::clone(&otp_store),
        Arc::clone(&otp_hasher),
        Arc::clone(&clock),
        conf.otp_settings(),
    ));
    let otp_verifier = Data::new(OtpVerifier::new(otp_store, otp_hasher, clock));
    let otp_dispatcher = Data::new(OtpDispatcher::new(
        email_sender,
        sms_sender,
        conf.email_from_address.clone(),
        conf.email_reply_to_address.clone(),
        conf.otp_lifetime,
    ));

    let db_async_pool = Data::new(db_async_pool);
    let conf = Data::new(conf);

    let base_addr = format!("127.0.0.1:{}", &port);
    log::info!("Listening on {base_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(db_async_pool.clone())
            .app_data(conf.clone())
            .app_data(otp_issuer.clone())
            .app_data(otp_verifier.clone())
            .app_data(otp_dispatcher.clone())
            .app_data(ProtoBufConfig::default())
            .configure(services::api::configure)
            .wrap(actix_web::middleware::Logger::default())
    })
    .workers(actix_workers)
    .bind(base_addr)?
    .run()
    .await?;

    Ok(())
}
