//! User-lookup demo: a group of pooled workers drains a channel of random
//! ids and collects the matching users.

mod users;

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tracing::info;

use gpool::{logging, Config, Pool};

use crate::users::{Storage, User};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    logging::init(&config.logging);

    info!("Starting gpool {} demo...", gpool::PKG_VERSION);
    config.log_summary();

    let users = u32::try_from(config.demo.users)?;
    let storage = Arc::new(Storage::seeded(users));
    let pool = Pool::new(config.pool.capacity())?;

    let found = run_lookup(&pool, &storage, config.pool.group_size())?;

    let report = json!({
        "users": found,
        "stats": pool.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    pool.close();
    Ok(())
}

/// Fan the random ids out over a group of `group_size` workers.
fn run_lookup(
    pool: &Pool,
    storage: &Arc<Storage>,
    group_size: usize,
) -> Result<Vec<User>, Box<dyn std::error::Error + Send + Sync>> {
    let found = Arc::new(Mutex::new(Vec::new()));
    let (id_tx, id_rx) = crossbeam_channel::unbounded::<u32>();

    let group = pool.acquire_group(group_size)?;
    {
        let storage = Arc::clone(storage);
        let found = Arc::clone(&found);
        group.exec(move || {
            for id in id_rx.iter() {
                if let Some(user) = storage.query_user(id) {
                    found.lock().push(user);
                }
            }
        })?;
    }

    let ids = storage.random_ids();
    info!(ids = ids.len(), workers = group_size, "dispatching lookups");
    for id in ids {
        id_tx.send(id)?;
    }

    // Workers leave their loop once the channel is drained and closed.
    drop(id_tx);
    group.wait_and_release();

    let mut found = std::mem::take(&mut *found.lock());
    found.sort_by_key(|user| user.id);
    info!(found = found.len(), "lookups complete");
    Ok(found)
}
