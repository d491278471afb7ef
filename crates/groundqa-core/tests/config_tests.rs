use figment::Jail;
use groundqa_core::config::{Config, ABSTENTION_TEXT};

#[test]
fn defaults_without_any_config_file() {
    Jail::expect_with(|_jail| {
        let settings = Config::load_for_env("test").expect("load").settings().expect("settings");
        assert_eq!(settings.retrieval.k, 8);
        assert_eq!(settings.retrieval.fetch_k, 30);
        assert!((settings.retrieval.lambda_mult - 0.5).abs() < f32::EPSILON);
        assert_eq!(settings.retrieval.min_docs, 2);
        assert_eq!(settings.answer.abstention_text, ABSTENTION_TEXT);
        assert_eq!(settings.model.api_base, None);
        Ok(())
    });
}

#[test]
fn files_and_env_layer_over_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[retrieval]\nk = 4\nfetch_k = 12\n\n[data]\ntable = \"corpus\"\n")?;
        jail.create_file("config.test.toml", "[retrieval]\nmin_docs = 3\n")?;
        jail.set_env("APP_RETRIEVAL__K", "6");
        jail.set_env("APP_MODEL__API_BASE", "http://localhost:11434/v1");

        let config = Config::load_for_env("test").expect("load");
        let settings = config.settings().expect("settings");
        assert_eq!(settings.retrieval.k, 6);
        assert_eq!(settings.retrieval.fetch_k, 12);
        assert_eq!(settings.retrieval.min_docs, 3);
        assert_eq!(settings.data.table, "corpus");
        assert_eq!(settings.data.raw_dir, "data/raw");
        assert_eq!(settings.model.api_base.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.get::<usize>("retrieval.fetch_k").expect("get"), 12);
        Ok(())
    });
}

#[test]
fn invalid_values_are_reported() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[retrieval]\nk = 10\nfetch_k = 5\n")?;
        let err = Config::load_for_env("test").expect("load").settings().expect_err("fetch_k < k");
        assert!(err.to_string().contains("fetch_k"));
        Ok(())
    });
}
