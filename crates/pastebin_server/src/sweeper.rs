//! Background removal of expired pastes and sessions.

use pastebin_core::service::{AuthService, PasteService};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Rows removed by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub pastes: usize,
    pub sessions: usize,
}

/// Run both sweeps once. Failures are logged and counted as zero.
pub fn run_sweep_once(pastes: &PasteService, auth: &AuthService) -> SweepReport {
    let report = SweepReport {
        pastes: pastes.expire_sweep().unwrap_or_else(|err| {
            tracing::error!("Paste sweep failed: {}", err);
            0
        }),
        sessions: auth.expire_sweep().unwrap_or_else(|err| {
            tracing::error!("Session sweep failed: {}", err);
            0
        }),
    };
    if report.pastes + report.sessions > 0 {
        tracing::info!(
            pastes = report.pastes,
            sessions = report.sessions,
            "expiry sweep removed rows"
        );
    }
    report
}

/// Periodic sweep task. Stops on [`ExpirySweeper::shutdown`] or when dropped.
pub struct ExpirySweeper {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ExpirySweeper {
    /// Spawn the sweep loop on the current tokio runtime. The first sweep runs
    /// immediately.
    pub fn spawn(pastes: PasteService, auth: AuthService, every: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let pastes = pastes.clone();
                        let auth = auth.clone();
                        let swept =
                            tokio::task::spawn_blocking(move || run_sweep_once(&pastes, &auth)).await;
                        if let Err(err) = swept {
                            tracing::error!("Sweep task panicked: {}", err);
                        }
                    }
                }
            }
            tracing::debug!("expiry sweeper stopped");
        });
        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Signal the loop to stop and wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::warn!("Sweeper did not stop cleanly: {}", err);
            }
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pastebin_core::models::NewPaste;
    use pastebin_core::{Database, ManualClock, Services};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn services() -> (Services, Arc<Database>, Arc<ManualClock>, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("sweep.redb");
        let db = Arc::new(Database::new(path.to_str().expect("path")).expect("db"));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().expect("time"),
        ));
        let services = Services::new(db.clone(), clock.clone());
        (services, db, clock, dir)
    }

    #[test]
    fn sweep_once_removes_expired_rows() {
        let (services, _db, clock, _dir) = services();
        let user = services.auth.register("alice", "hunter2x").expect("user");
        services.auth.create_session(user.id).expect("session");
        services
            .pastes
            .create(NewPaste {
                content: "short-lived".into(),
                expires_in_minutes: Some(1),
                ..NewPaste::default()
            })
            .expect("paste");

        assert_eq!(
            run_sweep_once(&services.pastes, &services.auth),
            SweepReport::default()
        );

        clock.advance(chrono::Duration::days(31));
        assert_eq!(
            run_sweep_once(&services.pastes, &services.auth),
            SweepReport {
                pastes: 1,
                sessions: 1
            }
        );
    }

    #[tokio::test]
    async fn spawned_sweeper_purges_and_shuts_down() {
        let (services, db, clock, _dir) = services();
        let paste = services
            .pastes
            .create(NewPaste {
                content: "gone soon".into(),
                expires_in_minutes: Some(5),
                ..NewPaste::default()
            })
            .expect("paste")
            .into_paste();
        clock.advance(chrono::Duration::minutes(6));

        let sweeper = ExpirySweeper::spawn(
            services.pastes.clone(),
            services.auth.clone(),
            Duration::from_millis(10),
        );
        let mut purged = false;
        for _ in 0..100 {
            if db.pastes.get(&paste.id).expect("get").is_none() {
                purged = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        sweeper.shutdown().await;
        assert!(purged, "sweeper never purged the expired paste");
    }
}
