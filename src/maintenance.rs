use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context as _;

use crate::cli::{InitDbArgs, PruneUploadsArgs};
use crate::file_store::{FileStore, LocalFsFileStore};
use crate::storage::Database;

pub fn init_db(args: InitDbArgs) -> anyhow::Result<()> {
    let db = Database::new(&args.database);
    db.init()
        .with_context(|| format!("init database: {}", args.database.display()))?;
    tracing::info!(database = %args.database.display(), "database ready");
    Ok(())
}

/// Files in the store that no book row points at, including leftovers from
/// interrupted writes. Files younger than `min_age` are skipped: an upload
/// renames its file into place before the row is committed.
pub async fn find_orphans(
    db: &Database,
    store: &dyn FileStore,
    min_age: Duration,
) -> anyhow::Result<Vec<String>> {
    let db = db.clone();
    let referenced: HashSet<String> = tokio::task::spawn_blocking(move || db.book_filenames())
        .await
        .context("join database task")??
        .into_iter()
        .collect();

    let orphans = store
        .list()
        .await
        .context("list uploads")?
        .into_iter()
        .filter(|file| !referenced.contains(&file.name))
        .filter(|file| {
            file.modified
                .elapsed()
                .map_or(min_age.is_zero(), |age| age >= min_age)
        })
        .map(|file| file.name)
        .collect();
    Ok(orphans)
}

pub async fn prune_uploads(args: PruneUploadsArgs) -> anyhow::Result<()> {
    let db = Database::new(&args.storage.database);
    // A mistyped path must not turn into an empty database that references
    // nothing.
    db.ensure_existing()
        .with_context(|| format!("open database: {}", args.storage.database.display()))?;
    let store = LocalFsFileStore::new(&args.storage.upload_dir);

    let min_age = Duration::from_secs(args.min_age_secs);
    let orphans = find_orphans(&db, &store, min_age).await?;
    for name in &orphans {
        if args.dry_run {
            println!("would remove {name}");
            continue;
        }
        store.remove(name).await?;
        println!("removed {name}");
    }
    tracing::info!(count = orphans.len(), dry_run = args.dry_run, "pruned uploads");
    Ok(())
}
