use std::path::PathBuf;
use std::time::Duration;

use andika::config::{
    ConfigFlags, clear_config_flags, load_config_flags, parse_flag_tokens, save_config_flags,
};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".andikarc");
    let content = r#"
# comment
--no-sentences

--scroll-ms 120

--debug-log=andika.log
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_sentences);
    assert!(!flags.no_highlight);
    assert_eq!(flags.scroll_ms, Some(120));
    assert_eq!(flags.debug_log, Some(PathBuf::from("andika.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".andikarc");
    let content = "--no-sentences\n--scroll-ms 120\n--debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "andika".to_string(),
        "session".to_string(),
        "--scroll-ms".to_string(),
        "400".to_string(),
        "--no-highlight".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_sentences, "file flags should remain enabled");
    assert!(effective.no_highlight, "cli flags should be applied");
    assert_eq!(
        effective.scroll_duration(),
        Some(Duration::from_millis(400)),
        "cli should override scroll length"
    );
    assert_eq!(
        effective.debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );

    let options = effective.locator_options();
    assert!(!options.enabled);
    assert!(!options.sentences);
}

#[test]
fn test_saved_flags_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("andika").join("config");
    let flags = ConfigFlags {
        no_sentences: true,
        perf: true,
        scroll_ms: Some(90),
        ..ConfigFlags::default()
    };
    save_config_flags(&path, &flags).unwrap();
    assert_eq!(load_config_flags(&path).unwrap(), flags);

    clear_config_flags(&path).unwrap();
    assert!(!path.exists());
    assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
}

#[test]
fn test_unknown_tokens_are_ignored() {
    let args = vec![
        "andika".to_string(),
        "inspect".to_string(),
        "notes.md".to_string(),
        "--caret".to_string(),
        "4".to_string(),
        "--perf".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(
        flags,
        ConfigFlags {
            perf: true,
            ..ConfigFlags::default()
        }
    );
}
