use figment::Jail;
use pretty_assertions::assert_eq;
use rstest::rstest;

use cardsearch_core::config::{Config, Settings};
use cardsearch_core::{EntityType, HierarchyMode, ScopeConfig, Strategy};

// Every config test runs inside a figment Jail: it serializes tests that
// touch the process environment and gives each one a scratch directory.

fn settings_in(jail: &Jail, env_name: &str) -> figment::Result<Settings> {
    let config = Config::load_from(jail.directory(), env_name).map_err(|e| e.to_string())?;
    Ok(config.settings().map_err(|e| e.to_string())?)
}

#[test]
fn load_from_dir_layers_env_file_over_base() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[search]\nmin_length = 3\nlimit = 20\n")?;
        jail.create_file("config.test.toml", "[search]\nlimit = 10\n[api]\nbase_url = \"http://cards.test\"\n")?;

        let settings = settings_in(jail, "test")?;

        assert_eq!(settings.search.min_length, 3, "base file value survives");
        assert_eq!(settings.search.limit, 10, "env file overrides base");
        assert_eq!(settings.api.base_url, "http://cards.test");
        assert_eq!(settings.cache.fresh_secs, 120, "untouched sections keep defaults");
        Ok(())
    });
}

#[test]
fn missing_files_fall_back_to_defaults() {
    Jail::expect_with(|jail| {
        assert_eq!(settings_in(jail, "dev")?, Settings::default());
        Ok(())
    });
}

#[test]
fn env_vars_override_files() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[search]\nstrategy = \"autocomplete\"\ndebounce_ms = 400\n")?;
        jail.set_env("RUST_ENV", "test");
        jail.set_env("APP_SEARCH__DEBOUNCE_MS", "250");
        jail.set_env("APP_CACHE__FRESH_SECS", "30");

        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.search.strategy, Strategy::Autocomplete);
        assert_eq!(settings.search.debounce_ms, 250);
        assert_eq!(settings.cache.fresh_secs, 30);
        let limit: usize = config.get("search.limit").map_err(|e| e.to_string())?;
        assert_eq!(limit, 50);
        Ok(())
    });
}

#[rstest]
#[case("[search]\nlimit = 0\n")]
#[case("[cache]\nfresh_secs = 600\nevict_secs = 60\n")]
#[case("[api]\nbase_url = \"\"\n")]
#[case("[search]\nstrategy = \"hierarchical\"\n")]
fn invalid_settings_are_rejected(#[case] body: &str) {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", body)?;
        assert!(Config::load_from(jail.directory(), "dev").is_err(), "expected rejection for {body:?}");
        Ok(())
    });
}

#[test]
fn hierarchy_mode_parses_from_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            "[search]\nstrategy = \"hierarchical\"\nhierarchy = \"setProduct-product\"\ntypes = [\"setProduct\", \"product\"]\n",
        )?;
        let settings = settings_in(jail, "dev")?;
        assert_eq!(settings.search.hierarchy, Some(HierarchyMode::SetProductProduct));
        assert_eq!(settings.search.types, vec![EntityType::SetProduct, EntityType::Product]);
        Ok(())
    });
}

#[rstest]
#[case(HierarchyMode::SetCard, EntityType::Set, EntityType::Card, "setId")]
#[case(HierarchyMode::SetSetProduct, EntityType::Set, EntityType::SetProduct, "setId")]
#[case(HierarchyMode::SetProductProduct, EntityType::SetProduct, EntityType::Product, "setProductId")]
fn hierarchy_modes_pair_parent_and_child(
    #[case] mode: HierarchyMode,
    #[case] parent: EntityType,
    #[case] child: EntityType,
    #[case] field: &str,
) {
    assert_eq!(mode.parent_type(), parent);
    assert_eq!(mode.child_type(), child);
    assert_eq!(mode.parent_id_field(), field);
    assert_eq!(mode.as_str().parse::<HierarchyMode>().unwrap(), mode);
}

#[test]
fn entity_type_parses_singular_and_plural() {
    assert_eq!("cards".parse::<EntityType>().unwrap(), EntityType::Card);
    assert_eq!("SetProduct".parse::<EntityType>().unwrap(), EntityType::SetProduct);
    assert!("booster".parse::<EntityType>().is_err());
}

#[test]
fn scope_drops_duplicate_types_but_keeps_order() {
    let scope = ScopeConfig::new([EntityType::Card, EntityType::Set, EntityType::Card]).with_filter("setId", "S1");
    assert_eq!(scope.types, vec![EntityType::Card, EntityType::Set]);
    assert_eq!(scope.limit, 50);
    assert_eq!(scope.filters.get("setId").map(String::as_str), Some("S1"));
}

#[test]
fn search_result_serializes_kind_as_type() {
    let r = cardsearch_core::SearchResult {
        id: "c1".into(),
        display_name: "Pikachu".into(),
        kind: EntityType::SetProduct,
        data: serde_json::json!({"name": "Pikachu"}),
    };
    let v = serde_json::to_value(&r).unwrap();
    assert_eq!(v["type"], "setProduct");
    assert_eq!(v["displayName"], "Pikachu");
}
