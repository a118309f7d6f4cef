use log::*;
use shelf_engine::{GameApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the shelves rebuild worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker periodically replaces the denormalized per-game `shelves` index from current
/// shelf membership. Reads in between rebuilds may see a stale index; that is the documented
/// eventually-consistent contract, and the read path makes no stronger promise.
pub fn start_shelves_worker(db: SqliteDatabase, interval: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = GameApi::new(db);
        info!("🕰️ Shelves rebuild worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running shelves rebuild job");
            match api.rebuild_shelves().await {
                Ok(rows) => debug!("🕰️ Shelves index rebuilt: {rows} entries"),
                Err(e) => error!("🕰️ Error rebuilding shelves index: {e}"),
            }
        }
    })
}
