//! Point-in-time copies of the SQLite database file, taken with
//! `VACUUM INTO` into a `db_backups/` directory next to the database.

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDateTime};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use std::path::{Path, PathBuf};
use tracing::info;

pub const BACKUP_PREFIX: &str = "db_backup_";
pub const PRE_RESTORE_PREFIX: &str = "pre_restore_";
const EXTENSION: &str = "sqlite3";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// Extracts the file path from a `sqlite:` URL. `None` for in-memory databases.
#[must_use]
pub fn sqlite_file_path(db_url: &str) -> Option<PathBuf> {
    if db_url.contains(":memory:") {
        return None;
    }

    let path = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
    let path = path.split('?').next().unwrap_or(path);
    (!path.is_empty()).then(|| PathBuf::from(path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    /// 1-based position in the newest-first listing.
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub taken_at: Option<NaiveDateTime>,
}

impl BackupInfo {
    fn from_path(index: usize, path: PathBuf) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let size_bytes = std::fs::metadata(&path)
            .with_context(|| format!("Failed to stat backup {}", path.display()))?
            .len();
        let taken_at = name
            .strip_prefix(BACKUP_PREFIX)
            .and_then(|rest| rest.strip_suffix(&format!(".{EXTENSION}")))
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok());

        Ok(Self {
            index,
            name,
            path,
            size_bytes,
            taken_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    db_path: PathBuf,
    dir: PathBuf,
}

impl BackupManager {
    #[must_use]
    pub fn for_database(db_path: &Path) -> Self {
        let dir = db_path
            .parent()
            .map_or_else(|| PathBuf::from("db_backups"), |p| p.join("db_backups"));

        Self {
            db_path: db_path.to_path_buf(),
            dir,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a consistent copy of the database behind `conn`.
    pub async fn snapshot(&self, conn: &DatabaseConnection, prefix: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let stamp = Local::now().format(TIMESTAMP_FORMAT);
        let target = self.dir.join(format!("{prefix}{stamp}.{EXTENSION}"));
        if target.exists() {
            bail!("Backup {} already exists", target.display());
        }

        let backend = conn.get_database_backend();
        conn.execute(Statement::from_sql_and_values(
            backend,
            "VACUUM INTO ?",
            [target.to_string_lossy().into_owned().into()],
        ))
        .await
        .with_context(|| format!("Failed to write backup {}", target.display()))?;

        info!(path = %target.display(), "Database backed up");
        Ok(target)
    }

    /// Regular backups, newest first.
    pub fn list(&self) -> Result<Vec<BackupInfo>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| {
                        n.starts_with(BACKUP_PREFIX) && n.ends_with(&format!(".{EXTENSION}"))
                    })
            })
            .collect();

        // Timestamped names sort chronologically.
        paths.sort();
        paths.reverse();

        paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| BackupInfo::from_path(i + 1, path))
            .collect()
    }

    /// Resolves a 1-based index or a name fragment against [`Self::list`].
    pub fn find(&self, selector: &str) -> Result<BackupInfo> {
        let backups = self.list()?;

        if let Ok(index) = selector.trim().parse::<usize>() {
            return backups
                .into_iter()
                .find(|b| b.index == index)
                .with_context(|| format!("Invalid backup index: {selector}"));
        }

        backups
            .into_iter()
            .find(|b| b.name.contains(selector))
            .with_context(|| format!("Backup not found: {selector}"))
    }

    /// Replaces the database file with `backup`.
    ///
    /// When `current` is given, the live database is first saved as a
    /// `pre_restore_` file and the connection closed. No other process may
    /// have the database open.
    pub async fn restore(
        &self,
        backup: &BackupInfo,
        current: Option<DatabaseConnection>,
    ) -> Result<Option<PathBuf>> {
        let pre_restore = match current {
            Some(conn) => {
                let saved = self.snapshot(&conn, PRE_RESTORE_PREFIX).await?;
                conn.close().await.context("Failed to close database")?;
                Some(saved)
            }
            None => None,
        };

        tokio::fs::copy(&backup.path, &self.db_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to copy {} over {}",
                    backup.path.display(),
                    self.db_path.display()
                )
            })?;

        // Stale WAL pages would be replayed on top of the restored file.
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = self.db_path.clone().into_os_string();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            if sidecar.exists() {
                tokio::fs::remove_file(&sidecar)
                    .await
                    .with_context(|| format!("Failed to remove {}", sidecar.display()))?;
            }
        }

        info!(backup = %backup.name, "Database restored");
        Ok(pre_restore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_file_path_parses_urls() {
        assert_eq!(
            sqlite_file_path("sqlite:data/larder.db"),
            Some(PathBuf::from("data/larder.db"))
        );
        assert_eq!(
            sqlite_file_path("sqlite:///tmp/x.db?mode=rwc"),
            Some(PathBuf::from("/tmp/x.db"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
    }

    #[test]
    fn backups_live_next_to_the_database() {
        let manager = BackupManager::for_database(Path::new("data/larder.db"));
        assert_eq!(manager.dir(), Path::new("data/db_backups"));
    }

    #[test]
    fn list_orders_newest_first_and_parses_timestamps() {
        let root = std::env::temp_dir().join(format!("larder-backup-{}", uuid::Uuid::new_v4()));
        let manager = BackupManager::for_database(&root.join("larder.db"));
        std::fs::create_dir_all(manager.dir()).unwrap();

        for name in [
            "db_backup_20260101_080000_000.sqlite3",
            "db_backup_20260301_090000_500.sqlite3",
            "pre_restore_20260401_000000_000.sqlite3",
            "notes.txt",
        ] {
            std::fs::write(manager.dir().join(name), b"x").unwrap();
        }

        let backups = manager.list().unwrap();
        let names: Vec<&str> = backups.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "db_backup_20260301_090000_500.sqlite3",
                "db_backup_20260101_080000_000.sqlite3",
            ]
        );
        assert_eq!(backups[0].index, 1);
        assert_eq!(
            backups[0].taken_at.unwrap().to_string(),
            "2026-03-01 09:00:00.500"
        );

        assert_eq!(manager.find("2").unwrap().name, backups[1].name);
        assert_eq!(manager.find("20260301").unwrap().index, 1);
        assert!(manager.find("9").is_err());
        assert!(manager.find("nope").is_err());

        std::fs::remove_dir_all(root).ok();
    }
}
