use super::*;

#[test]
fn join_url_avoids_double_slash() {
    assert_eq!(join_url("http://x/api/", LOGIN_PATH), "http://x/api/auth/login");
    assert_eq!(join_url("http://x/api", ME_PATH), "http://x/api/auth/me");
}

#[test]
fn mark_read_path_plain_id() {
    assert_eq!(mark_read_path("n1"), "/notifications/n1/read");
}

#[test]
fn mark_read_path_uuid_id_untouched() {
    let id = "6f1c2a9e-1b3d-4f5a-9c8e-0d2b7a6e4f10";
    assert_eq!(mark_read_path(id), format!("/notifications/{id}/read"));
}

#[test]
fn mark_read_path_escapes_reserved_characters() {
    assert_eq!(mark_read_path("a/b c"), "/notifications/a%2Fb%20c/read");
    assert_eq!(mark_read_path("é"), "/notifications/%C3%A9/read");
}

#[test]
fn mark_read_path_cannot_escape_the_route() {
    assert_eq!(mark_read_path("../read-all"), "/notifications/..%2Fread-all/read");
    assert_eq!(mark_read_path("n1?x=1#f"), "/notifications/n1%3Fx%3D1%23f/read");
}

#[test]
fn parse_body_reports_parse_errors() {
    let result = parse_body::<User>("{\"id\":");
    assert!(matches!(result, Err(ApiError::Parse(_))));
}

#[test]
fn http_api_trims_base_url() {
    let api = HttpApi::new("http://127.0.0.1:9/api/", TokenStore::detached(), HttpTimeouts::default()).unwrap();
    assert_eq!(api.base_url(), "http://127.0.0.1:9/api");
}
