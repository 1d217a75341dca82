#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod analysis;
pub mod auth;
pub mod quiz;
pub mod response;
pub mod util;

pub use db;

use alloc::{boxed::Box, sync::Arc};
use db::Database;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{
    HeaderValue, InvalidHeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::{Method, Request, Response, StatusCode};

struct Inner {
    db: Database,
    issuer: auth::Issuer,
    /// Origin allowed by CORS; also the base of shareable quiz links.
    origin: HeaderValue,
    frontend: Box<str>,
}

#[derive(Clone)]
pub struct App {
    inner: Arc<Inner>,
}

impl App {
    pub fn new(db: Database, jwt_secret: &[u8], frontend: &str) -> Result<Self, InvalidHeaderValue> {
        let frontend = frontend.trim_end_matches('/');
        let origin = HeaderValue::from_str(frontend)?;
        let inner = Inner { db, issuer: auth::Issuer::new(jwt_secret), origin, frontend: frontend.into() };
        Ok(Self { inner: Arc::new(inner) })
    }

    pub async fn respond<B: Body>(&self, req: Request<B>) -> Response<Full<Bytes>> {
        let mut res = match self.try_respond(req).await {
            Ok(res) => res,
            Err(code) => error_response(code),
        };
        let headers = res.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.inner.origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        res
    }

    async fn try_respond<B: Body>(&self, req: Request<B>) -> Result<Response<Full<Bytes>>, StatusCode> {
        let (parts, body) = req.into_parts();
        if parts.method == Method::OPTIONS {
            return Ok(preflight());
        }

        let db = &self.inner.db;
        let issuer = &self.inner.issuer;
        match resolve(&parts.method, parts.uri.path())? {
            Route::Register => auth::try_register(body, db, issuer).await,
            Route::Login => auth::try_login(body, db, issuer).await,
            Route::Dashboard => analysis::try_dashboard(&parts.headers, db, issuer).await,
            Route::Create => quiz::try_create(body, &parts.headers, db, issuer).await,
            Route::MyQuizzes => quiz::try_list(&parts.headers, db, issuer).await,
            Route::Share(id) => quiz::try_share(&parts.headers, id, db, issuer, &self.inner.frontend).await,
            Route::Analysis(id) => analysis::try_analysis(&parts.headers, id, db, issuer).await,
            Route::Submit(id) => response::try_submit(body, &parts.headers, id, db, issuer).await,
            Route::Fetch(id) => quiz::try_fetch(id, db).await,
            Route::Update(id) => quiz::try_update(body, &parts.headers, id, db, issuer).await,
            Route::Delete(id) => quiz::try_delete(&parts.headers, id, db, issuer).await,
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
enum Route {
    Register,
    Login,
    Dashboard,
    Create,
    MyQuizzes,
    Share(i64),
    Analysis(i64),
    Submit(i64),
    Fetch(i64),
    Update(i64),
    Delete(i64),
}

/// Maps a method and path onto a handler, tolerating a trailing slash.
fn resolve(method: &Method, path: &str) -> Result<Route, StatusCode> {
    let route = path.strip_prefix("/api/").ok_or(StatusCode::NOT_FOUND)?;
    let route = route.trim_end_matches('/');
    let (root, rest) = match route.split_once('/') {
        Some(pair) => pair,
        _ => (route, ""),
    };
    match root {
        "auth" => match (method, rest) {
            (&Method::POST, "register") => Ok(Route::Register),
            (&Method::POST, "login") => Ok(Route::Login),
            _ => Err(StatusCode::NOT_FOUND),
        },
        "quizzes" => match (method, rest) {
            (&Method::GET, "dashboard-data") => Ok(Route::Dashboard),
            (&Method::POST, "create") => Ok(Route::Create),
            (&Method::GET, "my-quizzes") => Ok(Route::MyQuizzes),
            _ => {
                if let Some(id) = rest.strip_prefix("share/") {
                    match *method {
                        Method::GET => Ok(Route::Share(parse_id(id)?)),
                        _ => Err(StatusCode::METHOD_NOT_ALLOWED),
                    }
                } else if let Some(id) = rest.strip_prefix("analysis/") {
                    match *method {
                        Method::GET => Ok(Route::Analysis(parse_id(id)?)),
                        _ => Err(StatusCode::METHOD_NOT_ALLOWED),
                    }
                } else if let Some(id) = rest.strip_prefix("response/") {
                    match *method {
                        Method::POST => Ok(Route::Submit(parse_id(id)?)),
                        _ => Err(StatusCode::METHOD_NOT_ALLOWED),
                    }
                } else if rest.is_empty() || rest.contains('/') {
                    Err(StatusCode::NOT_FOUND)
                } else {
                    let id = parse_id(rest)?;
                    match *method {
                        Method::GET => Ok(Route::Fetch(id)),
                        Method::PUT => Ok(Route::Update(id)),
                        Method::DELETE => Ok(Route::Delete(id)),
                        _ => Err(StatusCode::METHOD_NOT_ALLOWED),
                    }
                }
            }
        },
        _ => Err(StatusCode::NOT_FOUND),
    }
}

fn parse_id(text: &str) -> Result<i64, StatusCode> {
    text.parse().map_err(|_| StatusCode::BAD_REQUEST)
}

fn preflight() -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(Bytes::new()));
    let headers = res.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Authorization, Content-Type"));
    res
}

pub(crate) fn json_response<T>(status: StatusCode, payload: &T) -> Result<Response<Full<Bytes>>, StatusCode>
where
    T: serde::Serialize,
{
    let bytes = serde_json::to_vec(payload).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut res = Response::new(Full::new(Bytes::from(bytes)));
    *res.status_mut() = status;
    assert!(res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json")).is_none());
    Ok(res)
}

fn error_response(code: StatusCode) -> Response<Full<Bytes>> {
    let message = match code {
        StatusCode::BAD_REQUEST => "Invalid request.",
        StatusCode::UNAUTHORIZED => "Missing or invalid credentials.",
        StatusCode::FORBIDDEN => "Not authorized.",
        StatusCode::NOT_FOUND => "Not found.",
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed.",
        _ => "Server error.",
    };
    let bytes = serde_json::to_vec(&serde_json::json!({ "message": message })).unwrap_or_default();
    let mut res = Response::new(Full::new(Bytes::from(bytes)));
    *res.status_mut() = code;
    res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    res
}

#[cfg(test)]
mod tests {
    use super::{parse_id, resolve, Route};
    use hyper::{Method, StatusCode};

    #[test]
    fn identifiers_must_be_integers() {
        assert_eq!(parse_id("42"), Ok(42));
        assert_eq!(parse_id("66cf0f8d2d watch"), Err(StatusCode::BAD_REQUEST));
        assert_eq!(parse_id(""), Err(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn fixed_routes_dispatch_by_method_and_path() {
        assert_eq!(resolve(&Method::POST, "/api/auth/register"), Ok(Route::Register));
        assert_eq!(resolve(&Method::POST, "/api/auth/login"), Ok(Route::Login));
        assert_eq!(resolve(&Method::GET, "/api/quizzes/dashboard-data"), Ok(Route::Dashboard));
        assert_eq!(resolve(&Method::POST, "/api/quizzes/create"), Ok(Route::Create));
        assert_eq!(resolve(&Method::GET, "/api/quizzes/my-quizzes"), Ok(Route::MyQuizzes));
        assert_eq!(resolve(&Method::GET, "/api/quizzes/my-quizzes/"), Ok(Route::MyQuizzes));
        assert_eq!(resolve(&Method::GET, "/api/auth/register"), Err(StatusCode::NOT_FOUND));
    }

    #[test]
    fn identified_routes_carry_the_parsed_id() {
        assert_eq!(resolve(&Method::GET, "/api/quizzes/share/7"), Ok(Route::Share(7)));
        assert_eq!(resolve(&Method::GET, "/api/quizzes/analysis/7"), Ok(Route::Analysis(7)));
        assert_eq!(resolve(&Method::POST, "/api/quizzes/response/7"), Ok(Route::Submit(7)));
        assert_eq!(resolve(&Method::GET, "/api/quizzes/7"), Ok(Route::Fetch(7)));
        assert_eq!(resolve(&Method::PUT, "/api/quizzes/7"), Ok(Route::Update(7)));
        assert_eq!(resolve(&Method::DELETE, "/api/quizzes/7"), Ok(Route::Delete(7)));
        assert_eq!(resolve(&Method::GET, "/api/quizzes/abc"), Err(StatusCode::BAD_REQUEST));
        assert_eq!(resolve(&Method::POST, "/api/quizzes/response/abc"), Err(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn wrong_methods_and_unknown_paths_are_rejected() {
        assert_eq!(resolve(&Method::DELETE, "/api/quizzes/share/7"), Err(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(resolve(&Method::POST, "/api/quizzes/analysis/7"), Err(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(resolve(&Method::GET, "/api/quizzes/response/7"), Err(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(resolve(&Method::POST, "/api/quizzes/7"), Err(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(resolve(&Method::GET, "/quizzes/7"), Err(StatusCode::NOT_FOUND));
        assert_eq!(resolve(&Method::GET, "/api/quizzes"), Err(StatusCode::NOT_FOUND));
        assert_eq!(resolve(&Method::GET, "/api/quizzes/7/extra"), Err(StatusCode::NOT_FOUND));
        assert_eq!(resolve(&Method::GET, "/api/users/7"), Err(StatusCode::NOT_FOUND));
    }
}
