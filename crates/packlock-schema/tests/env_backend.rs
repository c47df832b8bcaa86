//! The JSON backend is chosen from the environment on every read.
//!
//! Kept in its own test binary: it mutates the process environment.

use packlock_schema::{read_package_spec, CodecConfig, JsonBackend, JSON_BACKEND_ENV};

const BAD: &str = "{\n  \"title\": [1]\n}";

#[test]
fn each_read_observes_the_current_backend() {
    std::env::remove_var(JSON_BACKEND_ENV);
    assert_eq!(CodecConfig::from_env().json_backend, JsonBackend::Streaming);
    let err = read_package_spec(BAD, "app", "project.json").unwrap_err();
    assert_eq!(err.line(), 2);

    std::env::set_var(JSON_BACKEND_ENV, "document");
    assert_eq!(CodecConfig::from_env().json_backend, JsonBackend::Document);
    let err = read_package_spec(BAD, "app", "project.json").unwrap_err();
    assert_eq!(err.line(), 0);
    assert_eq!(err.path(), Some("project.json"));

    let text = r#"{"title": "T", "frameworks": {"net6.0": {}}}"#;
    let from_document = read_package_spec(text, "app", "project.json").unwrap();

    std::env::set_var(JSON_BACKEND_ENV, "no-such-backend");
    assert_eq!(CodecConfig::from_env().json_backend, JsonBackend::Streaming);
    let from_streaming = read_package_spec(text, "app", "project.json").unwrap();
    assert_eq!(from_document, from_streaming);

    std::env::remove_var(JSON_BACKEND_ENV);
}
