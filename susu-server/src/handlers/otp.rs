use actix_protobuf::{ProtoBuf, ProtoBufResponseBuilder};
use actix_web::{web, HttpResponse};
use susu_common::delivery::OtpDispatcher;
use susu_common::messages::{OtpRequest, OtpVerification, VerificationResult};
use susu_common::otp::{OtpIssuer, OtpPurpose, OtpVerifier};
use susu_common::validators::Identifier;
use zeroize::Zeroizing;

use crate::handlers::error::HttpErrorResponse;

const WRONG_OR_EXPIRED_OTP_MSG: &str = "OTP was incorrect or has expired";

const MAX_IDENTIFIER_LEN: usize = 320;
const MAX_SUPPLIED_OTP_LEN: usize = 16;

pub async fn request_otp(
    issuer: web::Data<OtpIssuer>,
    dispatcher: web::Data<OtpDispatcher>,
    otp_request: ProtoBuf<OtpRequest>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let identifier = Identifier::parse(&otp_request.identifier)
        .map_err(|e| HttpErrorResponse::IncorrectlyFormed(e.to_string()))?;
    let purpose = parse_purpose(&otp_request.purpose)?;

    if !dispatcher.can_deliver_to(&identifier) {
        return Err(HttpErrorResponse::IncorrectlyFormed(String::from(
            "Codes cannot be sent to phone numbers at this time",
        )));
    }

    let otp = Zeroizing::new(issuer.issue(identifier.as_str(), purpose).await?);

    if let Err(e) = dispatcher.deliver(&identifier, purpose, &otp).await {
        log::error!("{e}");
        return Err(HttpErrorResponse::InternalError(String::from(
            "Failed to send OTP",
        )));
    }

    Ok(HttpResponse::Ok().finish())
}

pub async fn verify_otp(
    verifier: web::Data<OtpVerifier>,
    otp_verification: ProtoBuf<OtpVerification>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let purpose = parse_purpose(&otp_verification.purpose)?;

    if otp_verification.identifier.len() > MAX_IDENTIFIER_LEN
        || otp_verification.code.len() > MAX_SUPPLIED_OTP_LEN
    {
        return Err(HttpErrorResponse::IncorrectCredential(String::from(
            WRONG_OR_EXPIRED_OTP_MSG,
        )));
    }

    // No code can exist for an identifier that doesn't parse
    let Ok(identifier) = Identifier::parse(&otp_verification.identifier) else {
        return Err(HttpErrorResponse::IncorrectCredential(String::from(
            WRONG_OR_EXPIRED_OTP_MSG,
        )));
    };

    let is_verified = verifier
        .verify(identifier.as_str(), purpose, &otp_verification.code)
        .await?;

    if !is_verified {
        return Err(HttpErrorResponse::IncorrectCredential(String::from(
            WRONG_OR_EXPIRED_OTP_MSG,
        )));
    }

    Ok(HttpResponse::Ok().protobuf(VerificationResult { verified: true })?)
}

fn parse_purpose(purpose: &str) -> Result<OtpPurpose, HttpErrorResponse> {
    purpose
        .parse()
        .map_err(|_| HttpErrorResponse::IncorrectlyFormed(format!("Unknown purpose '{purpose}'")))
}
