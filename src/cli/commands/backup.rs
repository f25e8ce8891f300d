//! Backup command handler

use anyhow::Context;
use sea_orm::Database;

use crate::cli::BackupAction;
use crate::config::Config;
use crate::db::backup::{BACKUP_PREFIX, BackupManager, sqlite_file_path};

pub async fn cmd_backup(config: &Config, action: BackupAction) -> anyhow::Result<()> {
    let db_url = &config.general.database_path;
    let db_path = sqlite_file_path(db_url)
        .context("Backups need a file-backed SQLite database_path")?;
    let manager = BackupManager::for_database(&db_path);

    match action {
        BackupAction::List => {
            let backups = manager.list()?;
            if backups.is_empty() {
                println!("No backups found in {}", manager.dir().display());
                return Ok(());
            }

            println!("Found {} backup(s):\n", backups.len());
            for backup in backups {
                let taken_at = backup.taken_at.map_or_else(
                    || "unknown".to_string(),
                    |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
                );
                println!("  [{}] {}", backup.index, backup.name);
                println!("      Date: {taken_at}");
                println!("      Size: {:.2} KB", backup.size_bytes as f64 / 1024.0);
                println!("      Path: {}\n", backup.path.display());
            }
        }

        BackupAction::Create => {
            if !db_path.exists() {
                anyhow::bail!("No database at {}", db_path.display());
            }
            let conn = Database::connect(db_url.as_str()).await?;
            let path = manager.snapshot(&conn, BACKUP_PREFIX).await?;
            conn.close().await?;
            println!("✓ Database backed up to: {}", path.display());
        }

        BackupAction::Restore { selector } => {
            let backup = manager.find(&selector)?;
            println!("⚠ Replacing {} with {}", db_path.display(), backup.name);

            let current = if db_path.exists() {
                Some(Database::connect(db_url.as_str()).await?)
            } else {
                None
            };

            if let Some(saved) = manager.restore(&backup, current).await? {
                println!("  Current database saved as: {}", saved.display());
            }
            println!("✓ Database restored from: {}", backup.name);
            println!("  Pending migrations run on the next start.");
        }
    }

    Ok(())
}
