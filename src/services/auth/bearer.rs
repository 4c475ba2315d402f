/*
 * Responsibility
 * - `Authorization` header value -> raw compact token
 * - Only the exact `Bearer <token>` form is accepted (case-sensitive, single space)
 */
use super::error::AuthError;

const SCHEME: &str = "Bearer";

pub fn extract_bearer(raw: Option<&str>) -> Result<&str, AuthError> {
    let value = match raw {
        Some(v) if !v.is_empty() => v,
        _ => return Err(AuthError::malformed_header("authorization header is expected")),
    };

    if !value.starts_with("Bearer ") {
        return Err(AuthError::malformed_header(
            "authorization header must start with \"Bearer\"",
        ));
    }

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if *scheme == SCHEME && !token.is_empty() => Ok(*token),
        [_, token] if token.is_empty() => Err(AuthError::malformed_header("token not found")),
        _ => Err(AuthError::malformed_header(
            "authorization header must be bearer token",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::AuthErrorKind;

    fn kind_of(raw: Option<&str>) -> AuthErrorKind {
        extract_bearer(raw).unwrap_err().kind()
    }

    #[test]
    fn accepts_plain_bearer_token() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_and_empty_headers() {
        assert_eq!(kind_of(None), AuthErrorKind::MissingOrMalformedHeader);
        assert_eq!(kind_of(Some("")), AuthErrorKind::MissingOrMalformedHeader);
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            kind_of(Some("Basic abc123")),
            AuthErrorKind::MissingOrMalformedHeader
        );
        assert_eq!(
            kind_of(Some("bearer abc.def.ghi")),
            AuthErrorKind::MissingOrMalformedHeader
        );
        assert_eq!(
            kind_of(Some("Bearer\tabc.def.ghi")),
            AuthErrorKind::MissingOrMalformedHeader
        );
    }

    #[test]
    fn rejects_extra_parts_and_empty_token() {
        assert_eq!(
            kind_of(Some("Bearer abc def")),
            AuthErrorKind::MissingOrMalformedHeader
        );
        assert_eq!(
            kind_of(Some("Bearer  abc")),
            AuthErrorKind::MissingOrMalformedHeader
        );
        assert_eq!(kind_of(Some("Bearer ")), AuthErrorKind::MissingOrMalformedHeader);
    }
}
