use actix_web::HttpRequest;
use log::debug;

use crate::errors::ServerError;

/// The upstream auth gateway puts the authenticated user's id in this header.
pub const USER_ID_HEADER: &str = "X-Market-User-Id";

/// Reads the caller's user id from the request headers.
pub fn caller_id(req: &HttpRequest) -> Result<i64, ServerError> {
    let value = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| ServerError::MissingIdentity(format!("{USER_ID_HEADER} header is required")))?;
    let value = value.to_str().map_err(|e| {
        debug!("💻️ Could not read {USER_ID_HEADER} header. {e}");
        ServerError::MissingIdentity(format!("{USER_ID_HEADER} header is not valid text"))
    })?;
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServerError::MissingIdentity(format!("{value} is not a valid user id")))
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn reads_user_id() {
        let req = TestRequest::default().insert_header((USER_ID_HEADER, "42")).to_http_request();
        assert_eq!(caller_id(&req).unwrap(), 42);
    }

    #[test]
    fn missing_or_bad_user_id() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(caller_id(&req), Err(ServerError::MissingIdentity(_))));
        let req = TestRequest::default().insert_header((USER_ID_HEADER, "alice")).to_http_request();
        assert!(matches!(caller_id(&req), Err(ServerError::MissingIdentity(_))));
        let req = TestRequest::default().insert_header((USER_ID_HEADER, "-3")).to_http_request();
        assert!(matches!(caller_id(&req), Err(ServerError::MissingIdentity(_))));
    }
}
