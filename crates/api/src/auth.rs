use crate::util;
use db::Database;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::AUTHORIZATION;
use hyper::{HeaderMap, Response, StatusCode};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use model::user::{Claims, Login, Registration};

/// Seconds until an issued token expires.
const TOKEN_LIFETIME: u64 = 60 * 60;

/// Issues and verifies the bearer tokens handed out at registration and login.
pub struct Issuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Issuer {
    pub fn new(secret: &[u8]) -> Self {
        Self { encoding: EncodingKey::from_secret(secret), decoding: DecodingKey::from_secret(secret) }
    }

    fn issue(&self, id: i64) -> Result<alloc::string::String, StatusCode> {
        let exp = jsonwebtoken::get_current_timestamp() + TOKEN_LIFETIME;
        jsonwebtoken::encode(&Header::default(), &Claims { id, exp }, &self.encoding)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Resolves a token to the user it was issued for. Expired and forged
    /// tokens resolve to nothing.
    pub fn verify(&self, token: &str) -> Option<i64> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default()).ok()?;
        Some(data.claims.id)
    }
}

/// Extracts the bearer token from a map of headers.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers.get(AUTHORIZATION).ok_or(StatusCode::UNAUTHORIZED)?;
    let text = header.to_str().map_err(|_| StatusCode::BAD_REQUEST)?;
    text.strip_prefix("Bearer ").ok_or(StatusCode::UNAUTHORIZED)
}

/// Resolves the caller to a user ID, rejecting requests without a valid
/// bearer credential.
pub fn authenticate(headers: &HeaderMap, issuer: &Issuer) -> Result<i64, StatusCode> {
    let token = extract_bearer(headers)?;
    issuer.verify(token).ok_or(StatusCode::UNAUTHORIZED)
}

pub async fn try_register<B: Body>(
    body: B,
    db: &Database,
    issuer: &Issuer,
) -> Result<Response<Full<Bytes>>, StatusCode> {
    let bytes = util::aggregate(body).await?;
    let Registration { username, email, password } =
        serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?;
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let hash = util::password::hash(&password).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let id = match db.create_user(&username, &email, &hash).await {
        Ok(id) => id,
        // The original API reports a duplicate registration as a client error.
        Err(db::error::Error::AlreadyExists) => return Err(StatusCode::BAD_REQUEST),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    log::info!("registered user {id}");
    let token = issuer.issue(id)?;
    crate::json_response(StatusCode::CREATED, &serde_json::json!({ "token": token }))
}

pub async fn try_login<B: Body>(body: B, db: &Database, issuer: &Issuer) -> Result<Response<Full<Bytes>>, StatusCode> {
    let bytes = util::aggregate(body).await?;
    let Login { email, password } = serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?;

    // Unknown emails and wrong passwords are indistinguishable to the caller.
    let (id, hash) = match db.get_user_by_email(&email).await {
        Ok(pair) => pair,
        Err(db::error::Error::NotFound) => return Err(StatusCode::BAD_REQUEST),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };
    if !util::password::verify(&hash, &password) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let token = issuer.issue(id)?;
    crate::json_response(StatusCode::OK, &serde_json::json!({ "token": token }))
}

#[cfg(test)]
mod tests {
    use super::{authenticate, extract_bearer, Claims, Header, Issuer};
    use hyper::header::{HeaderValue, AUTHORIZATION};
    use hyper::{HeaderMap, StatusCode};

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), Err(StatusCode::UNAUTHORIZED));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_bearer(&headers), Err(StatusCode::UNAUTHORIZED));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&headers), Ok("abc.def.ghi"));
    }

    #[test]
    fn issued_tokens_round_trip() {
        let issuer = Issuer::new(b"super-secret");
        let token = issuer.issue(42).unwrap();
        assert_eq!(issuer.verify(&token), Some(42));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
        assert_eq!(authenticate(&headers, &issuer), Ok(42));
    }

    #[test]
    fn foreign_and_expired_tokens_are_rejected() {
        let issuer = Issuer::new(b"super-secret");
        let forged = Issuer::new(b"other-secret").issue(42).unwrap();
        assert_eq!(issuer.verify(&forged), None);

        let exp = jsonwebtoken::get_current_timestamp() - 120;
        let expired = jsonwebtoken::encode(&Header::default(), &Claims { id: 42, exp }, &issuer.encoding).unwrap();
        assert_eq!(issuer.verify(&expired), None);
    }
}
