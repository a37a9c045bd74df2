use sense::core::config::{ColorName, Config, ConfigLoad, PaletteRole};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_first_run_writes_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sense").join("config.yaml");

    match Config::load_or_create(&path).unwrap() {
        ConfigLoad::Created(created) => assert_eq!(created, path),
        ConfigLoad::Loaded(_) => panic!("expected a fresh config file"),
    }
    assert!(path.is_file());

    // Second run loads what the first one wrote.
    match Config::load_or_create(&path).unwrap() {
        ConfigLoad::Loaded(config) => {
            assert_eq!(config.queue_length, 3600);
            assert_eq!(config.update_delay, 1.0);
            assert!(config.blacklist.contains(&"beep_enable".to_string()));
        }
        ConfigLoad::Created(_) => panic!("config should already exist"),
    }
}

#[test]
fn test_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "update_delay: 0.5\nblacklist:\n  - fan2\n  - msr\n").unwrap();

    let config = match Config::load_or_create(&path).unwrap() {
        ConfigLoad::Loaded(config) => config,
        ConfigLoad::Created(_) => panic!("file exists"),
    };

    assert_eq!(config.update_delay().as_millis(), 500);
    assert_eq!(config.queue_length, 3600);
    assert_eq!(config.blacklist, vec!["fan2".to_string(), "msr".to_string()]);
    assert!(config.is_disabled("msr"));
    assert_eq!(config.palette.get(PaletteRole::Chip).fg, ColorName::DarkCyan);
}

#[test]
fn test_legacy_palette_list() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(
        &path,
        "palette:\n  - chip:\n      fg: light red\n      bg: default\n  - date:\n      fg: white\n      bg: dark blue\n",
    )
    .unwrap();

    let config = match Config::load_or_create(&path).unwrap() {
        ConfigLoad::Loaded(config) => config,
        ConfigLoad::Created(_) => panic!("file exists"),
    };

    assert_eq!(config.palette.get(PaletteRole::Chip).fg, ColorName::LightRed);
    assert_eq!(config.palette.get(PaletteRole::Date).bg, ColorName::DarkBlue);
    assert_eq!(config.palette.get(PaletteRole::Title).fg, ColorName::LightGreen);
}

#[test]
fn test_invalid_file_names_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "queue_length: 0\n").unwrap();

    let err = Config::load_or_create(&path).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("config.yaml"));
    assert!(message.contains("queue_length"));
}

#[test]
fn test_saved_config_reloads_identically() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.yaml");

    let mut config = Config::default();
    config.queue_length = 120;
    config.date_format = "%H:%M".to_string();
    config.save(&path).unwrap();

    let source = fs::read_to_string(&path).unwrap();
    assert_eq!(Config::from_yaml(&source).unwrap(), config);
}
