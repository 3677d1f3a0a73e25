//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use skt_config::SktConfig;

#[test]
fn loads_every_section_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/srv/skilltrack/portal.db"

[general]
default_page_size = 25
max_page_size = 200

[jobs]
evidence_expiry_days = 14
export_dir = "./exports-out"

[uploads]
max_csv_bytes = 1048576
"#,
        )?;

        let config: SktConfig = Figment::from(Serialized::defaults(SktConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.server.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.database.path, "/srv/skilltrack/portal.db");
        assert_eq!(config.general.default_page_size, 25);
        assert_eq!(config.general.max_page_size, 200);
        assert_eq!(config.jobs.evidence_expiry_days, 14);
        assert_eq!(config.jobs.export_dir, "./exports-out");
        assert_eq!(config.uploads.max_csv_bytes, 1_048_576);
        Ok(())
    });
}

#[test]
fn partial_section_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[server]\nport = 7000\n")?;

        let config: SktConfig = Figment::from(Serialized::defaults(SktConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.general.max_page_size, 100);
        Ok(())
    });
}

#[test]
fn explicit_file_layers_over_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".skilltrack")?;
        jail.create_file(".skilltrack/config.toml", "[server]\nport = 6000\nhost = \"127.0.0.1\"\n")?;
        jail.create_file("override.toml", "[server]\nport = 6500\n")?;

        let path = jail.directory().join("override.toml");
        let config = SktConfig::load_from(&path).expect("config loads");
        assert_eq!(config.server.port, 6500);
        assert_eq!(config.server.host, "127.0.0.1");
        Ok(())
    });
}
