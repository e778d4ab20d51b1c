use logtee::host::{CancelSignal, Host, Registry, Task};
use logtee::log::{setup, CONFIG_KEY};
use logtee::SetupError;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn config_json(path: &Path, extra: &str) -> String {
    format!(
        r#"{{"logs":{{"console":{{"level":1}},"file":{{"level":3,"store":{{"path":{},"compress":false}}}}}}{}}}"#,
        serde_json::to_string(&path.to_string_lossy()).unwrap(),
        extra
    )
}

fn read_json_lines(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_registry_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("logs/app.log");
    let registry = Registry::new();
    registry
        .set_config_bytes(CONFIG_KEY, config_json(&path, r#","call_depth":0"#))
        .unwrap();

    setup::register(&registry).unwrap();
    registry.run(&CancelSignal::new()).unwrap();

    // 规范化后的配置
    let published = registry.config(CONFIG_KEY).unwrap();
    assert_eq!(published["call_depth"], 1);
    assert_eq!(published["logs"]["file"]["store"]["max_size"], 1024);
    assert_eq!(published["logs"]["file"]["store"]["max_backups"], 7);
    assert_eq!(published["logs"]["file"]["store"]["max_age"], 30);

    let logger = registry.logger(CONFIG_KEY).unwrap();
    assert_eq!(logger.stages().len(), 2);

    logger.info("console only").unwrap();
    logger.error("console and file").unwrap();
    logger.sync().unwrap();

    let lines = read_json_lines(&path);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "ERROR");
    assert_eq!(lines[0]["msg"], "console and file");
    assert!(lines[0]["caller"]
        .as_str()
        .unwrap()
        .starts_with("tests/setup_tests.rs:"));

    // writer 写入所有目标的原始字节
    let writer = registry.writer(CONFIG_KEY).unwrap();
    writer.write(b"{\"raw\":true}\n").unwrap();
    writer.flush().unwrap();
    let lines = read_json_lines(&path);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["raw"], true);
}

#[test]
fn test_run_after_orders_initialization() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    let registry = Registry::new();
    registry
        .set_config_bytes(CONFIG_KEY, config_json(&path, r#","run_after":["config"]"#))
        .unwrap();

    let trace = Arc::new(Mutex::new(Vec::new()));

    // 依赖日志的组件先注册
    let server_trace = Arc::clone(&trace);
    registry
        .register(Task::new(
            "server",
            vec![CONFIG_KEY.to_string()],
            move |host, _| {
                assert!(host.logger(CONFIG_KEY).is_some());
                server_trace.lock().unwrap().push("server");
                Ok(())
            },
        ))
        .unwrap();
    setup::register(&registry).unwrap();
    let config_trace = Arc::clone(&trace);
    registry
        .register(Task::new("config", Vec::new(), move |host, _| {
            assert!(host.logger(CONFIG_KEY).is_none());
            config_trace.lock().unwrap().push("config");
            Ok(())
        }))
        .unwrap();

    registry.run(&CancelSignal::new()).unwrap();
    assert_eq!(*trace.lock().unwrap(), vec!["config", "server"]);
    assert!(registry.logger(CONFIG_KEY).is_some());
}

#[test]
fn test_register_twice_is_rejected() {
    let registry = Registry::new();
    setup::register(&registry).unwrap();

    let err = setup::register(&registry).unwrap_err();
    assert!(matches!(err, SetupError::Host(_)));
    assert_eq!(registry.pending_tasks(), vec![CONFIG_KEY.to_string()]);
}

#[test]
fn test_canceled_before_start() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    let registry = Registry::new();
    registry
        .set_config_bytes(CONFIG_KEY, config_json(&path, ""))
        .unwrap();
    setup::register(&registry).unwrap();

    let cancel = CancelSignal::new();
    cancel.cancel();
    let err = registry.run(&cancel).unwrap_err();

    let cause = err.root_cause().to_string();
    assert_eq!(cause, "logtee: context has been canceled");
    assert!(!path.exists());
    assert!(registry.logger(CONFIG_KEY).is_none());
    assert!(registry.writer(CONFIG_KEY).is_none());
}

#[test]
fn test_unwritable_path_fails_initialization() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "plain file").unwrap();

    let registry = Registry::new();
    registry
        .set_config_bytes(CONFIG_KEY, config_json(&blocker.join("app.log"), ""))
        .unwrap();

    let err = setup::init(&registry, &CancelSignal::new()).unwrap_err();
    assert!(matches!(err, SetupError::Writer { .. }));
    // 配置已发布，logger 未发布
    assert!(registry.config(CONFIG_KEY).is_some());
    assert!(registry.logger(CONFIG_KEY).is_none());
}
