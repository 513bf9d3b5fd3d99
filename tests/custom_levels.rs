//! Level-table replacement tests, kept in their own binary because the
//! table is process-global state.

use hierlog::{
    get_level, get_level_name, reset_levels, set_levels, LevelDef, LevelsConfig, Registry, ALL,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn game_levels() -> LevelsConfig {
    let mut levels = BTreeMap::new();
    levels.insert("CHATTER".to_string(), LevelDef::new(5).with_color("cyan"));
    levels.insert("EVENT".to_string(), LevelDef::new(25));
    levels.insert("ALARM".to_string(), LevelDef::new(65).with_color("red"));
    let console = [
        ("trace", "CHATTER"),
        ("log", "CHATTER"),
        ("info", "EVENT"),
        ("warn", "ALARM"),
        ("error", "ALARM"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let mut aliases = BTreeMap::new();
    aliases.insert("SIREN".to_string(), "ALARM".to_string());
    LevelsConfig {
        levels,
        console,
        aliases,
    }
}

#[test]
fn test_replaced_table_drives_dispatch() {
    set_levels(game_levels()).unwrap();

    assert_eq!(get_level("event"), Some(25));
    assert_eq!(get_level("siren"), Some(65));
    assert_eq!(get_level_name(65).as_deref(), Some("ALARM"));
    // the stock names are gone until reset
    assert_eq!(get_level("INFO"), None);

    let registry = Registry::new();
    let sink = Arc::new(hierlog::StreamHandler::new(Vec::new()));
    let logger = registry.get_logger("game");
    logger.set_level(ALL).unwrap();
    logger.add_handler(sink.clone());

    logger.log("alarm", "base breached").wait().unwrap();
    // the built-in convenience name no longer resolves: silently a no-op
    logger.debug("nobody hears this").wait().unwrap();

    let output = sink.with_stream(|s| String::from_utf8(s.clone()).unwrap());
    assert_eq!(output, "base breached\n");

    reset_levels();
    assert_eq!(get_level("INFO"), Some(hierlog::INFO));
}
