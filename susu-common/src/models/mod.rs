pub mod job_registry_item;
pub mod otp_record;
