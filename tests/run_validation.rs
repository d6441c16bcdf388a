use pdf_translator::{run, ApiError, Config, TranslateError};

fn base_config() -> Config {
    Config {
        pdf_path: Some("no-such-file.pdf".to_string()),
        target_lang: Some("SK".to_string()),
        auth_key: Some("test-key".to_string()),
        output: None,
        source_lang: "auto".to_string(),
        settings_path: None,
        keep_intermediate: false,
        show_supported_languages: false,
    }
}

#[tokio::test]
async fn unsupported_target_language_fails_before_anything_else() {
    let mut config = base_config();
    config.target_lang = Some("xx".to_string());
    let err = run(config).await.unwrap_err();
    assert!(matches!(err, TranslateError::UnsupportedLanguage { .. }));
}

#[tokio::test]
async fn unsupported_source_language_is_rejected() {
    let mut config = base_config();
    config.source_lang = "qq".to_string();
    let err = run(config).await.unwrap_err();
    assert!(matches!(
        err,
        TranslateError::UnsupportedSourceLanguage { .. }
    ));
}

#[tokio::test]
async fn missing_auth_key_is_an_authentication_error() {
    if std::env::var_os("DEEPL_AUTH_KEY").is_some() {
        return;
    }
    let mut config = base_config();
    config.auth_key = None;
    let err = run(config).await.unwrap_err();
    assert!(matches!(err, TranslateError::Api(ApiError::MissingKey)));
}

#[tokio::test]
async fn missing_input_is_an_input_error_not_an_api_error() {
    let err = run(base_config()).await.unwrap_err();
    assert!(matches!(err, TranslateError::InputNotFound { .. }));
}

#[tokio::test]
async fn input_format_is_checked_by_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake.pdf");
    std::fs::write(&path, b"just text pretending to be a pdf").unwrap();
    let mut config = base_config();
    config.pdf_path = Some(path.to_string_lossy().into_owned());
    let err = run(config).await.unwrap_err();
    assert!(matches!(err, TranslateError::NotAPdf { .. }));
}

#[tokio::test]
async fn missing_positional_arguments_are_usage_errors() {
    let mut config = base_config();
    config.pdf_path = None;
    let err = run(config).await.unwrap_err();
    assert!(matches!(err, TranslateError::Usage { .. }));

    let mut config = base_config();
    config.target_lang = None;
    let err = run(config).await.unwrap_err();
    assert!(matches!(err, TranslateError::Usage { .. }));
}

#[tokio::test]
async fn listing_languages_needs_no_other_arguments() {
    let config = Config {
        pdf_path: None,
        target_lang: None,
        auth_key: None,
        output: None,
        source_lang: "auto".to_string(),
        settings_path: None,
        keep_intermediate: false,
        show_supported_languages: true,
    };
    let listing = run(config).await.unwrap();
    assert!(listing.contains("sk\tSlovak"));
    assert!(listing.contains("de\tGerman"));
}

#[tokio::test]
async fn missing_settings_file_is_reported() {
    let mut config = base_config();
    config.settings_path = Some("no-such-settings.toml".to_string());
    let err = run(config).await.unwrap_err();
    assert!(matches!(err, TranslateError::Settings { .. }));
}
