use susu_common::clock::Clock;
use susu_common::otp::OtpRecordStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::jobs::{Job, JobError};

pub struct ClearExpiredOtpsJob {
    otp_store: Arc<dyn OtpRecordStore>,
    clock: Arc<dyn Clock>,
    is_running: bool,
}

impl ClearExpiredOtpsJob {
    pub fn new(otp_store: Arc<dyn OtpRecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            otp_store,
            clock,
            is_running: false,
        }
    }
}

#[async_trait]
impl Job for ClearExpiredOtpsJob {
    fn name(&self) -> &'static str {
        "Clear Expired OTPs"
    }

    fn is_ready(&self) -> bool {
        !self.is_running
    }

    async fn execute(&mut self) -> Result<(), JobError> {
        self.is_running = true;

        let result = self.otp_store.delete_all_expired(self.clock.now()).await;

        self.is_running = false;

        let deleted_count = result?;
        log::info!("Deleted {deleted_count} expired OTP record(s)");

        Ok(())
    }
}
