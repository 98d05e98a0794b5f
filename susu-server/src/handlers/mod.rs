pub mod health;
pub mod otp;

pub mod error {
    use actix_protobuf::ProtoBufResponseBuilder;
    use actix_web::http::{header, StatusCode};
    use actix_web::{HttpResponse, HttpResponseBuilder};
    use std::fmt;
    use susu_common::messages::{ErrorType, ServerErrorResponse};
    use susu_common::otp::OtpError;

    #[derive(Debug)]
    pub enum HttpErrorResponse {
        // 400
        IncorrectlyFormed(String),

        // 401
        IncorrectCredential(String),

        // 429
        TooManyRequests { retry_after_secs: u64 },

        // 500
        InternalError(String),
    }

    impl std::error::Error for HttpErrorResponse {}

    impl fmt::Display for HttpErrorResponse {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let server_error: ServerErrorResponse = self.into();
            write!(f, "{:?}", server_error)
        }
    }

    impl From<HttpErrorResponse> for ServerErrorResponse {
        fn from(resp: HttpErrorResponse) -> Self {
            (&resp).into()
        }
    }

    impl From<&HttpErrorResponse> for ServerErrorResponse {
        fn from(resp: &HttpErrorResponse) -> Self {
            match resp {
                // 400
                HttpErrorResponse::IncorrectlyFormed(msg) => ServerErrorResponse {
                    err_type: ErrorType::IncorrectlyFormed.into(),
                    err_message: format!("Incorrectly formed request: {msg}"),
                },

                // 401
                HttpErrorResponse::IncorrectCredential(msg) => ServerErrorResponse {
                    err_type: ErrorType::IncorrectCredential.into(),
                    err_message: format!("Incorrect credential: {msg}"),
                },

                // 429
                HttpErrorResponse::TooManyRequests { retry_after_secs } => ServerErrorResponse {
                    err_type: ErrorType::TooManyRequests.into(),
                    err_message: format!(
                        "Too many requests: A code was sent recently, retry in \
                         {retry_after_secs} seconds"
                    ),
                },

                // 500
                HttpErrorResponse::InternalError(msg) => ServerErrorResponse {
                    err_type: ErrorType::InternalError.into(),
                    err_message: format!("Internal error: {msg}"),
                },
            }
        }
    }

    impl actix_web::error::ResponseError for HttpErrorResponse {
        fn error_response(&self) -> HttpResponse {
            let mut builder = HttpResponseBuilder::new(self.status_code());
            builder.insert_header((header::CONTENT_TYPE, "application/protobuf"));

            if let HttpErrorResponse::TooManyRequests { retry_after_secs } = self {
                builder.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
            }

            builder
                .protobuf::<ServerErrorResponse>(self.into())
                .unwrap_or_else(|_| HttpResponse::InternalServerError().finish())
        }

        fn status_code(&self) -> StatusCode {
            match *self {
                HttpErrorResponse::IncorrectlyFormed(_) => StatusCode::BAD_REQUEST,
                HttpErrorResponse::IncorrectCredential(_) => StatusCode::UNAUTHORIZED,
                HttpErrorResponse::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
                HttpErrorResponse::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl From<actix_web::Error> for HttpErrorResponse {
        fn from(_err: actix_web::Error) -> Self {
            HttpErrorResponse::InternalError(String::from("Failed to serialize ProtoBuf response"))
        }
    }

    impl From<OtpError> for HttpErrorResponse {
        fn from(err: OtpError) -> Self {
            match err {
                OtpError::RateLimited { retry_after_secs } => {
                    HttpErrorResponse::TooManyRequests { retry_after_secs }
                }
                OtpError::StoreUnavailable(e) => {
                    log::error!("{e}");
                    HttpErrorResponse::InternalError(String::from("Failed to access OTP store"))
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use actix_web::body::to_bytes;
        use actix_web::ResponseError;
        use prost::Message;

        #[actix_web::test]
        async fn test_rate_limited_response_carries_retry_after() {
            let resp = HttpErrorResponse::TooManyRequests {
                retry_after_secs: 55,
            }
            .error_response();

            assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(
                resp.headers().get(header::RETRY_AFTER).unwrap(),
                "55"
            );

            let body = to_bytes(resp.into_body()).await.unwrap();
            let body = ServerErrorResponse::decode(body).unwrap();
            assert_eq!(body.err_type(), ErrorType::TooManyRequests);
            assert!(body.err_message.contains("55 seconds"));
        }

        #[test]
        fn test_status_codes() {
            assert_eq!(
                HttpErrorResponse::IncorrectlyFormed(String::new()).status_code(),
                StatusCode::BAD_REQUEST
            );
            assert_eq!(
                HttpErrorResponse::IncorrectCredential(String::new()).status_code(),
                StatusCode::UNAUTHORIZED
            );
            assert_eq!(
                HttpErrorResponse::InternalError(String::new()).status_code(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }
}
