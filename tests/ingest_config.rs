// tests/ingest_config.rs
use listnd::ingest::config::{
    load_config_default, load_config_from, PipelineConfig, ENV_CONFIG_PATH,
};
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("listnd.toml");
    fs::write(
        &p_toml,
        r#"
years = [2024, 2023]
watched_prefix = "Viewed "
"#,
    )
    .unwrap();
    let v = load_config_from(&p_toml).unwrap();
    assert_eq!(v.years, vec![2023, 2024]);
    assert_eq!(v.watched_prefix, "Viewed ");
    assert_eq!(v.youtube_header, "YouTube Music");

    let p_json = dir.path().join("listnd.json");
    fs::write(&p_json, r#"{"title_boilerplate": ["(Live)"]}"#).unwrap();
    let vj = load_config_from(&p_json).unwrap();
    assert_eq!(vj.title_boilerplate, vec!["(Live)".to_string()]);
    assert!(vj.default_years().contains(2024));
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var(ENV_CONFIG_PATH);

    // 1) nothing → defaults
    let v = load_config_default().unwrap();
    assert_eq!(v, PipelineConfig::default());

    // 2) fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("listnd.toml"), "years = [2022]").unwrap();
    let vt = load_config_default().unwrap();
    assert_eq!(vt.years, vec![2022]);

    // 3) env wins
    let p_env = tmp.path().join("override.json");
    fs::write(&p_env, r#"{"years":[2020]}"#).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let ve = load_config_default().unwrap();
    assert_eq!(ve.years, vec![2020]);
    env::remove_var(ENV_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}
