#![cfg(not(doctest))]

pub mod clock;
pub mod db;
pub mod delivery;
pub mod email;
pub mod messages;
pub mod models;
pub mod otp;
pub mod schema;
pub mod sms;
pub mod threadrand;
pub mod validators;
