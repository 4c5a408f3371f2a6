#![allow(dead_code)]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{json, Value};

use marquei_api::app;
use marquei_api::auth::{KeySet, TokenVerifier};

pub const ISSUER: &str = "http://localhost:8080/realms/marquei";
pub const AUDIENCE: &str = "marquei-api";
pub const KID: &str = "test-key";

const PRIVATE_KEY_PEM: &str = include_str!("keys/private.pem");
const PUBLIC_KEY_PEM: &str = include_str!("keys/public.pem");

/// Full application router with the key set pinned to the test keypair.
pub fn test_app() -> Router {
    let decoding = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM.as_bytes()).expect("test public key");
    let keys = Arc::new(KeySet::preloaded([(KID.to_string(), decoding)]));
    let verifier = Arc::new(TokenVerifier::new(ISSUER, AUDIENCE, keys));
    app(verifier)
}

pub fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64
}

/// Claims that pass every check.
pub fn valid_claims() -> Value {
    json!({
        "sub": "c2f3b9a0-0000-0000-0000-000000000001",
        "email": "ana@marquei.com.br",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": now_ts() + 3600,
        "iat": now_ts(),
    })
}

/// Sign arbitrary claims with the test private key under the known kid.
pub fn token(claims: &Value) -> String {
    token_with_kid(claims, KID)
}

pub fn token_with_kid(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM.as_bytes()).expect("test private key");
    encode(&header, claims, &key).expect("token encoding")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn get_with_auth(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", authorization)
        .body(Body::empty())
        .expect("request")
}

pub fn post_json(uri: &str, authorization: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", authorization)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is json")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body is utf-8")
}
