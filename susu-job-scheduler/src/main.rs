use susu_common::clock::{Clock, SystemClock};
use susu_common::db::{self, otp::Dao as OtpDao};
use susu_common::otp::OtpRecordStore;

use flexi_logger::{Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode};
use runner::JobRunner;
use std::sync::Arc;

mod env;
mod jobs;
mod runner;

use jobs::ClearExpiredOtpsJob;

fn main() {
    let conf = match env::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(conf.worker_threads)
        .enable_all()
        .build()
        .expect("Failed to launch asynchronous runtime")
        .block_on(async move {
            let _logger = Logger::try_with_str(&conf.log_level)
                .expect(
                    "Invalid log level. Options: ERROR, WARN, INFO, DEBUG, TRACE. \
                     Example: `info, my::critical::module=trace`",
                )
                .log_to_file(FileSpec::default().directory("./logs"))
                .rotate(
                    Criterion::Age(Age::Day),
                    Naming::Timestamps,
                    Cleanup::KeepLogAndCompressedFiles(60, 365),
                )
                .cleanup_in_background_thread(true)
                .duplicate_to_stdout(Duplicate::All)
                .write_mode(WriteMode::BufferAndFlush)
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
                .expect("Failed to start logger");

            log::info!("Connecting to database...");

            let db_async_pool =
                match db::create_db_async_pool(&conf.database_uri(), conf.db_max_connections)
                    .await
                {
                    Ok(p) => p,
                    Err(e) => {
                        log::error!("Failed to create database pool: {e}");
                        std::process::exit(1);
                    }
                };

            log::info!("Successfully connected to database");

            let otp_store: Arc<dyn OtpRecordStore> = Arc::new(OtpDao::new(&db_async_pool));
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);

            let mut job_runner = JobRunner::new(conf.update_frequency, &db_async_pool);

            job_runner
                .register(
                    Box::new(ClearExpiredOtpsJob::new(otp_store, clock)),
                    conf.clear_expired_otps_job_frequency,
                )
                .await;

            job_runner.start().await;
        });
}
