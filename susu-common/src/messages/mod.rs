//! Protobuf bodies for the HTTP API.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OtpRequest {
    #[prost(string, tag = "1")]
    pub identifier: String,
    #[prost(string, tag = "2")]
    pub purpose: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OtpVerification {
    #[prost(string, tag = "1")]
    pub identifier: String,
    #[prost(string, tag = "2")]
    pub purpose: String,
    #[prost(string, tag = "3")]
    pub code: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VerificationResult {
    #[prost(bool, tag = "1")]
    pub verified: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerErrorResponse {
    #[prost(enumeration = "ErrorType", tag = "1")]
    pub err_type: i32,
    #[prost(string, tag = "2")]
    pub err_message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ErrorType {
    IncorrectlyFormed = 0,
    IncorrectCredential = 1,
    TooManyRequests = 2,
    InternalError = 3,
}
