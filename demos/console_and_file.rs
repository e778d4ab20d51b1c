//! 同时输出到终端和滚动文件
//!
//! ```text
//! cargo run --example console_and_file -- /tmp/logtee/app.log
//! ```

use logtee::host::{CancelSignal, Host, Registry};
use logtee::log::{bridge, setup, CONFIG_KEY};
use logtee::{global, MetadataValue};

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/logtee/app.log".to_string());

    let registry = Registry::global();
    registry.set_config_bytes(
        CONFIG_KEY,
        serde_json::to_vec(&serde_json::json!({
            "logs": {
                "console": { "level": 0 },
                "file": { "level": 2, "store": { "path": path, "max_size": 16 } }
            }
        }))?,
    )?;

    setup::register(registry)?;
    registry.run(&CancelSignal::new())?;

    let logger = registry
        .logger(CONFIG_KEY)
        .ok_or_else(|| anyhow::anyhow!("logger not published"))?;
    global::install(logger.clone())?;
    bridge::install(logger, ::log::LevelFilter::Debug)?;

    global::debug("console only")?;
    global::warn("console and file")?;
    global::infom(
        "request done",
        vec![
            ("status", MetadataValue::from(200)),
            ("path", MetadataValue::from("/api/users")),
        ],
    )?;
    ::log::warn!("forwarded from the log crate");

    global::sync()?;
    Ok(())
}
