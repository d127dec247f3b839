use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_serve_spanish_in_santiago() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.site.languages, vec!["es".to_string()]);
    assert_eq!(settings.site.default_language, "es");
    assert_eq!(settings.site.display_timezone, chrono_tz::America::Santiago);
    assert_eq!(settings.site.base_url, "http://localhost:8000");
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.backend, CacheBackendKind::Memory);
    assert_eq!(settings.captcha.ttl, Duration::from_secs(300));
    assert!(settings.admin.token.is_none());
}

#[test]
fn default_language_must_be_configured() {
    let mut raw = RawSettings::default();
    raw.site.languages = Some(vec!["en".to_string(), "pt".to_string()]);
    raw.site.default_language = Some("es".to_string());

    let err = Settings::from_raw(raw).expect_err("default outside languages");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "site.default_language",
            ..
        }
    ));
}

#[test]
fn languages_are_trimmed_and_deduplicated() {
    let mut raw = RawSettings::default();
    raw.site.languages = Some(vec![
        " es ".to_string(),
        "en".to_string(),
        "es".to_string(),
        String::new(),
    ]);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.languages, vec!["es".to_string(), "en".to_string()]);
}

#[test]
fn unknown_timezone_is_rejected() {
    let mut raw = RawSettings::default();
    raw.site.display_timezone = Some("Mars/Olympus".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid timezone");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "site.display_timezone",
            ..
        }
    ));
}

#[test]
fn base_url_loses_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.site.base_url = Some("https://example.cl/".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.base_url, "https://example.cl");
}

#[test]
fn redis_backend_requires_url() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some(CacheBackendKind::Redis);

    let err = Settings::from_raw(raw).expect_err("missing redis url");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.redis_url",
            ..
        }
    ));
}

#[test]
fn blank_admin_token_disables_the_api() {
    let mut raw = RawSettings::default();
    raw.admin.token = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.admin.token.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["landing-news"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "landing-news",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
