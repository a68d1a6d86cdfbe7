
use car_listings_backend::settings::AppEnvironment;

use test_utils::{test_config, TestStorage};

#[test]
fn test_default_test_config_is_valid() {
    let storage = TestStorage::new();
    assert!(test_config(&storage.root).validate().is_ok());
}

#[test]
fn test_validate_collects_every_problem() {
    let storage = TestStorage::new();
    let mut config = test_config(&storage.root);
    config.jwt_secret = "short".into();
    config.public_base_url = "media/".into();
    config.max_image_bytes = 0;

    let message = config.validate().unwrap_err().to_string();

    assert!(message.contains("JWT_SECRET"));
    assert!(message.contains("PUBLIC_BASE_URL"));
    assert!(message.contains("MAX_IMAGE_BYTES"));
}

#[test]
fn test_production_rejects_wildcard_cors() {
    let storage = TestStorage::new();
    let mut config = test_config(&storage.root);
    config.env = AppEnvironment::Production;

    assert!(config.validate().is_err());

    config.cors_allowed_origins = vec!["https://cars.example.com, https://admin.example.com".into()];
    assert!(config.validate().is_ok());
    assert_eq!(config.cors_origins().len(), 2);
}

#[test]
fn test_debug_output_redacts_secrets() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let debug = format!("{:?}", config);

    assert!(!debug.contains(&config.jwt_secret));
    assert!(debug.contains("[REDACTED]"));
}

#[test]
fn test_draft_ttl_follows_minutes() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    assert_eq!(config.draft_ttl(), chrono::Duration::minutes(60));
}
