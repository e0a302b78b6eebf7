//! 크기 기반 로그 파일 로테이션
//!
//! `app.log`가 `max_size`를 넘으면 `app.log.1`로 밀어내고, 기존 백업은
//! `app.log.2`, `app.log.3` ... 으로 한 칸씩 이동합니다. `max_backups`를 넘는 파일과
//! `max_age`보다 오래된 백업은 삭제합니다. `compress`이면 백업은 `app.log.1.gz`처럼 gzip으로 보관합니다.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use flate2::Compression;
use flate2::write::GzEncoder;
use crate::config::LogConfig;

const MEGABYTE: u64 = 1024 * 1024;
const DAY_SECS: u64 = 24 * 60 * 60;

/// 로테이션 정책
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub max_backups: usize,
    pub max_age: Option<Duration>,
    pub compress: bool,
}

impl RotationPolicy {
    pub fn from_log_config(conf: &LogConfig) -> Self {
        Self {
            max_bytes: conf.max_size.max(1).saturating_mul(MEGABYTE),
            max_backups: conf.max_backups,
            max_age: (conf.max_age > 0).then(|| Duration::from_secs(conf.max_age.saturating_mul(DAY_SECS))),
            compress: conf.compress,
        }
    }
}

pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            policy,
            file,
            written,
        })
    }

    fn backup_path(&self, index: usize, gzipped: bool) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        if gzipped {
            name.push(".gz");
        }
        PathBuf::from(name)
    }

    // 압축 여부와 관계없이 실제로 존재하는 백업 파일들
    fn existing_backups(&self, index: usize) -> Vec<(PathBuf, bool)> {
        [false, true]
            .into_iter()
            .map(|gz| (self.backup_path(index, gz), gz))
            .filter(|(path, _)| path.exists())
            .collect()
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.policy.max_backups == 0 {
            self.file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
            self.written = 0;
            return Ok(());
        }

        for (oldest, _) in self.existing_backups(self.policy.max_backups) {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.policy.max_backups).rev() {
            for (from, gz) in self.existing_backups(index) {
                fs::rename(&from, self.backup_path(index + 1, gz))?;
            }
        }
        let first = self.backup_path(1, false);
        fs::rename(&self.path, &first)?;

        self.file = open_append(&self.path)?;
        self.written = 0;

        if self.policy.compress {
            gzip(&first, &self.backup_path(1, true))?;
        }
        self.prune_expired();
        Ok(())
    }

    fn prune_expired(&self) {
        let Some(max_age) = self.policy.max_age else {
            return;
        };
        let now = SystemTime::now();
        for index in 1..=self.policy.max_backups {
            for (backup, _) in self.existing_backups(index) {
                let expired = fs::metadata(&backup)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > max_age);
                if expired {
                    let _ = fs::remove_file(&backup);
                }
            }
        }
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written.saturating_add(buf.len() as u64) > self.policy.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `from`을 gzip으로 `to`에 쓰고 원본을 지웁니다.
fn gzip(from: &Path, to: &Path) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(from)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(to)?), Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()?;
    fs::remove_file(from)
}
