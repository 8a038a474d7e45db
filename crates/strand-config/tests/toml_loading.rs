//! Integration tests for TOML and environment configuration loading.
//!
//! Uses `figment::Jail` for sandboxed working directory and env vars.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use strand_config::StrandConfig;

#[test]
fn loads_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "/var/lib/strand/graphs.db"

[resources]
timeout_secs = 30
user_agent = "strand-tests"
location_fallback_url = "https://resources.example.org/go-cc.belns"

[general]
deep_decomposition = true
log_filter = "strand_db=debug"
"#,
        )?;

        let config: StrandConfig = Figment::from(Serialized::defaults(StrandConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.database.path, "/var/lib/strand/graphs.db");
        assert_eq!(config.resources.timeout_secs, 30);
        assert_eq!(config.resources.user_agent, "strand-tests");
        assert_eq!(config.resources.default_encoding, "ABCGMOPR");
        assert_eq!(
            config.resources.location_fallback(),
            Some("https://resources.example.org/go-cc.belns")
        );
        assert!(config.general.deep_decomposition);
        assert_eq!(config.general.log_filter, "strand_db=debug");
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up_by_load() {
    Jail::expect_with(|jail| {
        jail.create_dir(".strand")?;
        jail.create_file(
            ".strand/config.toml",
            r#"
[database]
path = "project.db"
"#,
        )?;

        let config = StrandConfig::load().expect("config loads");
        assert_eq!(config.database.path, "project.db");
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".strand")?;
        jail.create_file(
            ".strand/config.toml",
            r#"
[resources]
timeout_secs = 30
"#,
        )?;
        jail.set_env("STRAND_RESOURCES__TIMEOUT_SECS", "45");
        jail.set_env("STRAND_GENERAL__DEEP_DECOMPOSITION", "true");

        let config = StrandConfig::load().expect("config loads");
        assert_eq!(config.resources.timeout_secs, 45);
        assert!(config.general.deep_decomposition);
        Ok(())
    });
}

#[test]
fn invalid_value_fails_load() {
    Jail::expect_with(|jail| {
        jail.set_env("STRAND_RESOURCES__TIMEOUT_SECS", "0");
        let err = StrandConfig::load().unwrap_err();
        assert!(err.to_string().contains("resources.timeout_secs"));
        Ok(())
    });
}
