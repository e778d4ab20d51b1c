use crate::log::appender::LogAppender;
use crate::log::config::StoreConfig;
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use crossbeam::channel::{self, Sender};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

const MEGABYTE: u64 = 1024 * 1024;

/// 切分文件名中的时间戳格式：app-2024-05-01T12-34-56.789.log
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

const COMPRESS_SUFFIX: &str = ".gz";

/// 保留天数上限，超出时按上限处理
const MAX_AGE_DAYS: i64 = 365 * 10_000;

/// 当前写入的文件
struct CurrentFile {
    file: File,
    size: u64,
    last_backup: Option<NaiveDateTime>,
}

/// 一个切分出来的历史文件
struct Backup {
    path: PathBuf,
    time: DateTime<Utc>,
    compressed: bool,
}

/// 历史文件的命名与清理策略，和后台清理线程共享
struct Retention {
    dir: PathBuf,
    prefix: String,
    ext: String,
    max_backups: usize,
    max_age: Duration,
    compress: bool,
    local_zone: bool,
    lock: Mutex<()>,
}

impl Retention {
    fn now(&self) -> NaiveDateTime {
        if self.local_zone {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        }
    }

    fn backup_path(&self, time: NaiveDateTime) -> PathBuf {
        self.dir.join(format!(
            "{}{}{}",
            self.prefix,
            time.format(BACKUP_TIME_FORMAT),
            self.ext
        ))
    }

    /// 生成一个未被占用的历史文件名
    ///
    /// 时间戳严格递增：同一毫秒内多次切分时顺延，保证文件名顺序与切分顺序一致
    fn next_backup_path(&self, last: Option<NaiveDateTime>) -> (PathBuf, NaiveDateTime) {
        let mut time = self.now();
        if let Some(last) = last {
            time = time.max(last + Duration::milliseconds(1));
        }
        loop {
            let path = self.backup_path(time);
            if !path.exists() && !append_suffix(&path, COMPRESS_SUFFIX).exists() {
                return (path, time);
            }
            time += Duration::milliseconds(1);
        }
    }

    /// 从文件名解析切分时间，不是本文件的历史文件时返回 None
    fn backup_time(&self, file_name: &str) -> Option<(DateTime<Utc>, bool)> {
        let rest = file_name.strip_prefix(&self.prefix)?;
        let (rest, compressed) = match rest.strip_suffix(COMPRESS_SUFFIX) {
            Some(rest) => (rest, true),
            None => (rest, false),
        };
        let stamp = rest.strip_suffix(&self.ext)?;
        let naive = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()?;
        let time = if self.local_zone {
            Local
                .from_local_datetime(&naive)
                .earliest()?
                .with_timezone(&Utc)
        } else {
            Utc.from_utc_datetime(&naive)
        };
        Some((time, compressed))
    }

    /// 列出所有历史文件，最新的在前；同一时间戳未压缩文件排在压缩文件之前
    fn backups(&self) -> io::Result<Vec<Backup>> {
        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some((time, compressed)) = self.backup_time(name) {
                backups.push(Backup {
                    path: entry.path(),
                    time,
                    compressed,
                });
            }
        }
        backups.sort_by(|a, b| {
            b.time
                .cmp(&a.time)
                .then_with(|| a.compressed.cmp(&b.compressed))
        });
        Ok(backups)
    }

    /// 清理并压缩历史文件
    ///
    /// 超出数量上限或超出保留时间的文件都会被删除，两个条件独立生效
    fn mill(&self) -> io::Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "mill lock poisoned"))?;

        let mut seen = HashSet::new();
        let mut remove = Vec::new();
        let mut unique = Vec::new();
        for backup in self.backups()? {
            // 压缩中断时原文件完整而 .gz 可能只写了一半：保留原文件，删除 .gz，之后重新压缩
            if seen.insert(backup.time) {
                unique.push(backup);
            } else {
                remove.push(backup);
            }
        }

        let cutoff = Utc::now() - self.max_age;
        let mut kept = Vec::new();
        for (i, backup) in unique.into_iter().enumerate() {
            if i >= self.max_backups || backup.time < cutoff {
                remove.push(backup);
            } else {
                kept.push(backup);
            }
        }

        for backup in &remove {
            remove_if_exists(&backup.path)?;
        }

        if self.compress {
            for backup in kept.iter().filter(|b| !b.compressed) {
                compress_file(&backup.path)?;
            }
        }

        Ok(())
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn compress_file(src: &Path) -> io::Result<()> {
    let mut input = match File::open(src) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let dst = append_suffix(src, COMPRESS_SUFFIX);
    let mut encoder = GzEncoder::new(File::create(&dst)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()?;
    drop(input);
    remove_if_exists(src)
}

/// 滚动文件输出器
///
/// 追加写入配置的文件，大小超过 `max_size` MB 时将当前文件重命名为带时间戳的历史文件
/// 并打开新文件。每次切分后由后台线程清理超出 `max_backups` 数量或超过 `max_age`
/// 天的历史文件，并在开启 `compress` 时压缩剩余的历史文件。当前写入的文件从不压缩。
pub struct RollingFileAppender {
    path: PathBuf,
    max_bytes: u64,
    current: Mutex<CurrentFile>,
    retention: Arc<Retention>,
    mill_tx: Sender<()>,
}

impl RollingFileAppender {
    /// 创建输出器，立即创建目录并打开文件
    ///
    /// 路径不可用时直接返回错误
    pub fn new(config: &StoreConfig) -> io::Result<Self> {
        let config = config.validated();
        let path = PathBuf::from(&config.path);

        let invalid_path = || {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid log file path: {}", config.path),
            )
        };
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(invalid_path)?
            .to_string();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| format!(".{}", s))
            .unwrap_or_default();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        fs::create_dir_all(&dir)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();

        let retention = Arc::new(Retention {
            dir,
            prefix: format!("{}-", stem),
            ext,
            max_backups: usize::try_from(config.max_backups).unwrap_or(usize::MAX),
            max_age: Duration::days(config.max_age.min(MAX_AGE_DAYS)),
            compress: config.compress,
            local_zone: config.local_zone,
            lock: Mutex::new(()),
        });

        // 容量为 1：清理进行中时再次切分只需要再排队一次
        let (mill_tx, mill_rx) = channel::bounded::<()>(1);
        let worker = Arc::clone(&retention);
        thread::Builder::new()
            .name("logtee-mill".to_string())
            .spawn(move || {
                for () in mill_rx.iter() {
                    if let Err(e) = worker.mill() {
                        eprintln!("logtee: failed to clean up rotated log files: {}", e);
                    }
                }
            })?;

        Ok(Self {
            path,
            max_bytes: u64::try_from(config.max_size)
                .unwrap_or(1)
                .max(1)
                .saturating_mul(MEGABYTE),
            current: Mutex::new(CurrentFile {
                file,
                size,
                last_backup: None,
            }),
            retention,
            mill_tx,
        })
    }

    /// 当前写入的文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 立即切分
    pub fn rotate(&self) -> io::Result<()> {
        let mut current = self.lock_current()?;
        self.rotate_locked(&mut current)
    }

    /// 同步执行一次清理
    pub fn mill(&self) -> io::Result<()> {
        self.retention.mill()
    }

    /// 所有历史文件，最新的在前
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .retention
            .backups()?
            .into_iter()
            .map(|b| b.path)
            .collect())
    }

    fn lock_current(&self) -> io::Result<MutexGuard<'_, CurrentFile>> {
        self.current
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))
    }

    fn rotate_locked(&self, current: &mut CurrentFile) -> io::Result<()> {
        current.file.flush()?;

        let (backup, time) = self.retention.next_backup_path(current.last_backup);
        match fs::rename(&self.path, &backup) {
            // 文件被外部删除时直接新建
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        *current = CurrentFile {
            file,
            size: 0,
            last_backup: Some(time),
        };

        let _ = self.mill_tx.try_send(());
        Ok(())
    }

    #[cfg(test)]
    fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl LogAppender for RollingFileAppender {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if len > self.max_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {} exceeds maximum file size {}",
                    len, self.max_bytes
                ),
            ));
        }

        let mut current = self.lock_current()?;
        if current.size + len > self.max_bytes {
            self.rotate_locked(&mut current)?;
        }

        current.file.write_all(buf)?;
        current.size += len;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        self.lock_current()?.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn store(dir: &TempDir, name: &str) -> StoreConfig {
        StoreConfig {
            path: dir.path().join(name).to_string_lossy().to_string(),
            compress: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_rolling_file_appender_create() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config = store(&temp_dir, "nested/dir/app.log");

        let appender = RollingFileAppender::new(&config)?;
        assert!(appender.path().exists());
        assert!(appender.backups()?.is_empty());

        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_invalid_path() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"not a directory")?;

        let config = StoreConfig {
            path: blocker.join("app.log").to_string_lossy().to_string(),
            ..Default::default()
        };
        assert!(RollingFileAppender::new(&config).is_err());

        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_append() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let appender = RollingFileAppender::new(&store(&temp_dir, "app.log"))?;

        appender.append("first")?;
        appender.append("second")?;
        appender.flush()?;

        let contents = fs::read_to_string(appender.path())?;
        assert_eq!(contents, "first\nsecond\n");
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_rotates_by_size() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let appender = RollingFileAppender::new(&store(&temp_dir, "app.log"))?.with_max_bytes(64);

        for i in 0..3 {
            appender.append(&format!("{:039}", i))?;
        }

        // 每行 40 字节，每次写入都会切分出一个新文件
        let backups = appender.backups()?;
        assert_eq!(backups.len(), 2);
        assert_eq!(fs::read_to_string(appender.path())?, format!("{:039}\n", 2));
        assert_eq!(fs::read_to_string(&backups[0])?, format!("{:039}\n", 1));
        assert_eq!(fs::read_to_string(&backups[1])?, format!("{:039}\n", 0));

        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_respects_existing_size() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config = store(&temp_dir, "app.log");
        fs::write(&config.path, vec![b'x'; 50])?;

        let appender = RollingFileAppender::new(&config)?.with_max_bytes(64);
        appender.append("0123456789012345678")?;

        assert_eq!(appender.backups()?.len(), 1);
        assert_eq!(fs::read_to_string(appender.path())?, "0123456789012345678\n");
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_write_too_large() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let appender = RollingFileAppender::new(&store(&temp_dir, "app.log"))?.with_max_bytes(10);

        let err = appender.write(&[b'a'; 20]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(fs::metadata(appender.path())?.len(), 0);
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_max_backups() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config = StoreConfig {
            max_backups: 2,
            ..store(&temp_dir, "app.log")
        };
        let appender = RollingFileAppender::new(&config)?.with_max_bytes(64);

        for i in 0..8 {
            appender.append(&format!("{:039}", i))?;
        }
        appender.mill()?;

        let backups = appender.backups()?;
        assert_eq!(backups.len(), 2);
        // 保留最新的两个
        assert_eq!(fs::read_to_string(&backups[0])?, format!("{:039}\n", 6));
        assert_eq!(fs::read_to_string(&backups[1])?, format!("{:039}\n", 5));
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_max_age() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config = StoreConfig {
            max_age: 1,
            local_zone: false,
            ..store(&temp_dir, "app.log")
        };
        let appender = RollingFileAppender::new(&config)?;

        let old = temp_dir.path().join("app-2000-01-01T00-00-00.000.log");
        let old_compressed = temp_dir.path().join("app-2001-01-01T00-00-00.000.log.gz");
        let unrelated = temp_dir.path().join("app-server.log");
        fs::write(&old, b"old")?;
        fs::write(&old_compressed, b"old")?;
        fs::write(&unrelated, b"keep")?;

        appender.append("current")?;
        appender.rotate()?;
        appender.mill()?;

        assert!(!old.exists());
        assert!(!old_compressed.exists());
        assert!(unrelated.exists());
        assert_eq!(appender.backups()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_compress() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config = StoreConfig {
            compress: true,
            ..store(&temp_dir, "app.log")
        };
        let appender = RollingFileAppender::new(&config)?;

        appender.append("rotated line")?;
        appender.rotate()?;
        appender.append("active line")?;
        appender.mill()?;

        let backups = appender.backups()?;
        assert_eq!(backups.len(), 1);
        assert!(backups[0].to_string_lossy().ends_with(".log.gz"));

        let mut decoder = flate2::read::GzDecoder::new(File::open(&backups[0])?);
        let mut contents = String::new();
        decoder.read_to_string(&mut contents)?;
        assert_eq!(contents, "rotated line\n");

        // 当前文件不压缩
        assert_eq!(fs::read_to_string(appender.path())?, "active line\n");
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_recompress_interrupted() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config = StoreConfig {
            compress: true,
            local_zone: false,
            ..store(&temp_dir, "app.log")
        };
        let appender = RollingFileAppender::new(&config)?;

        let stamp = Utc::now().naive_utc().format(BACKUP_TIME_FORMAT).to_string();
        let original = temp_dir.path().join(format!("app-{}.log", stamp));
        let partial = temp_dir.path().join(format!("app-{}.log.gz", stamp));
        fs::write(&original, "important rotated data\n")?;
        fs::write(&partial, [0x1f, 0x8b])?;

        appender.mill()?;

        assert!(!original.exists());
        let mut decoder = flate2::read::GzDecoder::new(File::open(&partial)?);
        let mut contents = String::new();
        decoder.read_to_string(&mut contents)?;
        assert_eq!(contents, "important rotated data\n");
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_keeps_original_without_compress() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config = StoreConfig {
            local_zone: false,
            ..store(&temp_dir, "app.log")
        };
        let appender = RollingFileAppender::new(&config)?;

        let stamp = Utc::now().naive_utc().format(BACKUP_TIME_FORMAT).to_string();
        let original = temp_dir.path().join(format!("app-{}.log", stamp));
        let partial = temp_dir.path().join(format!("app-{}.log.gz", stamp));
        fs::write(&original, "rotated\n")?;
        fs::write(&partial, [0x1f, 0x8b])?;

        appender.mill()?;

        assert_eq!(fs::read_to_string(&original)?, "rotated\n");
        assert!(!partial.exists());
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_utc_backup_name() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config = StoreConfig {
            local_zone: false,
            ..store(&temp_dir, "app.log")
        };
        let appender = RollingFileAppender::new(&config)?;
        appender.rotate()?;

        let backups = appender.backups()?;
        assert_eq!(backups.len(), 1);
        let name = backups[0].file_name().unwrap().to_string_lossy().to_string();
        let stamp = name
            .strip_prefix("app-")
            .and_then(|s| s.strip_suffix(".log"))
            .unwrap();
        let time = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT)?;
        let drift = (Utc::now().naive_utc() - time).num_seconds().abs();
        assert!(drift < 60, "backup time {} is not UTC", stamp);
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_backup_names_are_unique() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let appender = RollingFileAppender::new(&store(&temp_dir, "app.log"))?;

        for _ in 0..5 {
            appender.rotate()?;
        }
        let backups: HashSet<_> = appender.backups()?.into_iter().collect();
        assert_eq!(backups.len(), 5);
        Ok(())
    }

    #[test]
    fn test_rolling_file_appender_without_extension() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let appender = RollingFileAppender::new(&store(&temp_dir, "server"))?;
        appender.append("line")?;
        appender.rotate()?;

        let backups = appender.backups()?;
        assert_eq!(backups.len(), 1);
        assert!(backups[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("server-"));
        Ok(())
    }
}
