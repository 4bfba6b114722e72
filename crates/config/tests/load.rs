//! Loading config files from real paths outside the working directory.

use figment::Jail;
use std::io::Write;
use websync_config::Config;

#[test]
fn absolute_path_with_yml_extension() {
    Jail::expect_with(|jail| {
        // Stands in for a variable leaking in from the CI environment.
        jail.set_env("WEBSYNC_S3__ENDPOINT", "http://leaked.invalid");
        jail.clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("websync.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "s3:\n  endpoint: http://localhost:9000\n  key_id: minio\n  key_secret: minio123").unwrap();

        let config = Config::from_file(Some(&path)).unwrap();
        assert_eq!(config.s3.endpoint.as_deref(), Some("http://localhost:9000"));
        Ok(())
    });
}

#[test]
fn default_path_is_named_config_toml() {
    if let Some(path) = Config::default_path() {
        assert!(path.ends_with(websync_config::CONFIG_FILE_NAME));
    }
}
