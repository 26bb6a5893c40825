//! The poll loop: one timer, one owner of the displayed state.
//!
//! Each tick lists connections, reconciles, then runs the status queries for
//! the surviving entries concurrently. A tick finishes only when all of its
//! queries have answered or run out of time, so ticks never overlap. Every
//! nmcli call in a tick is bounded by the poll interval. User commands are
//! handled between ticks on the same task.

use crossbeam_channel::Sender;
use futures::future::join_all;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::Settings;
use crate::error::NmError;
use crate::import::import_config;
use crate::nmcli::{connection_status, list_connections, ConnectionManager};
use crate::parse::StateLine;
use crate::reconcile::{AppletEvent, Reconciler};
use crate::toggle::toggle_connection;
use crate::utils::CancellationToken;

/// Requests from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherCommand {
    Toggle { uuid: String, on: bool },
    Import(PathBuf),
    /// Poll now instead of waiting for the next tick.
    Refresh,
}

pub struct Watcher<M> {
    manager: M,
    reconciler: Reconciler,
    connection_type: String,
    interval: Duration,
    clear_on_error: bool,
    events: Sender<AppletEvent>,
}

impl<M: ConnectionManager> Watcher<M> {
    pub fn new(manager: M, settings: &Settings, events: Sender<AppletEvent>) -> Self {
        Self {
            manager,
            reconciler: Reconciler::new(),
            connection_type: settings.connection_type.clone(),
            interval: settings.poll_interval(),
            clear_on_error: settings.clear_on_error,
            events,
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Runs until `cancel` fires or every command sender is dropped.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<WatcherCommand>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!(
            "Watching {} connections every {:?}",
            self.connection_type,
            self.interval
        );

        while !cancel.is_cancelled() {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }

        log::info!("Watcher stopped");
    }

    /// One poll cycle.
    pub async fn tick(&mut self) {
        log::trace!("Polling {} connections", self.connection_type);

        let listing = list_connections(&self.manager, &self.connection_type);
        let snapshot = match within(self.interval, &["connection", "show"], listing).await {
            Ok(snapshot) => snapshot,
            Err(e) if self.clear_on_error => {
                log::warn!("Listing connections failed, clearing: {}", e);
                Vec::new()
            }
            Err(e) => {
                log::warn!("Listing connections failed, keeping last state: {}", e);
                return;
            }
        };

        let outcome = self.reconciler.reconcile(&snapshot);
        self.emit(outcome.events);

        let manager = &self.manager;
        let limit = self.interval;
        let answers = join_all(outcome.queries.iter().map(|query| {
            within(
                limit,
                &["connection", "show", &query.uuid],
                connection_status(manager, &query.uuid),
            )
        }))
        .await;

        for (query, answer) in outcome.queries.iter().zip(answers) {
            let state = answer.unwrap_or_else(|e| {
                log::warn!("Status of {} unavailable: {}", query.uuid, e);
                StateLine::Missing
            });
            let events = self.reconciler.apply_status(query, state);
            self.emit(events);
        }
    }

    pub async fn handle(&mut self, command: WatcherCommand) {
        log::debug!("Handling {:?}", command);
        match command {
            WatcherCommand::Toggle { uuid, on } => {
                let events = toggle_connection(&self.manager, &mut self.reconciler, &uuid, on);
                self.emit(events);
            }
            WatcherCommand::Import(path) => {
                if let Err(e) = import_config(&self.manager, &path, &self.connection_type) {
                    log::error!("{}", e);
                }
            }
            WatcherCommand::Refresh => self.tick().await,
        }
    }

    fn emit(&self, events: Vec<AppletEvent>) {
        for event in events {
            if self.events.send(event).is_err() {
                log::trace!("No listener for applet events");
            }
        }
    }
}

/// Runs one nmcli call, failing it with [`NmError::TimedOut`] after `limit`.
fn within<T>(
    limit: Duration,
    args: &[&str],
    call: impl Future<Output = Result<T, NmError>>,
) -> impl Future<Output = Result<T, NmError>> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    async move {
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(NmError::TimedOut {
                args,
                after: limit,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmcli::testing::FakeManager;
    use crate::reconcile::Caption;
    use async_trait::async_trait;
    use std::sync::Arc;

    const A: &str = "deb63752-d5e7-4b93-a03d-9ec9f5fa7b73";
    const B: &str = "0f0e0d0c-1111-4222-8333-444455556666";

    const LISTING: &str = "\
NAME         UUID                                  TYPE       DEVICE
prod-tunnel  deb63752-d5e7-4b93-a03d-9ec9f5fa7b73  wireguard  prod-tunnel
home         0f0e0d0c-1111-4222-8333-444455556666  wireguard  --
office-lan   abc12345-aaaa-4bbb-8ccc-ddddeeeeffff  ethernet   --
";

    fn watcher(
        settings: &Settings,
    ) -> (
        Arc<FakeManager>,
        Watcher<Arc<FakeManager>>,
        crossbeam_channel::Receiver<AppletEvent>,
    ) {
        let nm = Arc::new(FakeManager::default());
        nm.respond("connection show", LISTING);
        let (tx, rx) = crossbeam_channel::unbounded();
        let watcher = Watcher::new(Arc::clone(&nm), settings, tx);
        (nm, watcher, rx)
    }

    #[tokio::test]
    async fn first_tick_adds_rows_without_status_queries() {
        let (nm, mut w, rx) = watcher(&Settings::default());
        w.tick().await;

        assert_eq!(nm.outputs(), vec!["connection show"]);
        let events: Vec<AppletEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], AppletEvent::EntryAdded { uuid, position: 0, .. } if uuid == A));
        assert!(matches!(&events[1], AppletEvent::EntryAdded { uuid, position: 1, .. } if uuid == B));
    }

    #[tokio::test]
    async fn second_tick_queries_each_row_and_applies_state() {
        let (nm, mut w, rx) = watcher(&Settings::default());
        nm.respond(
            &format!("connection show {}", A),
            "connection.id:  prod-tunnel\nGENERAL.STATE:  activated\n",
        );
        w.tick().await;
        w.tick().await;

        assert_eq!(
            nm.outputs(),
            vec![
                "connection show".to_string(),
                "connection show".to_string(),
                format!("connection show {}", A),
                format!("connection show {}", B),
            ]
        );
        assert!(w.reconciler().entry(A).unwrap().active);
        assert!(!w.reconciler().entry(B).unwrap().active);
        let events: Vec<AppletEvent> = rx.try_iter().collect();
        assert!(events.contains(&AppletEvent::Caption(Caption::Connected(
            "prod-tunnel".into()
        ))));
    }

    #[tokio::test]
    async fn failed_listing_keeps_rows_by_default() {
        let (nm, mut w, _rx) = watcher(&Settings::default());
        w.tick().await;
        nm.fail("connection show");
        w.tick().await;
        assert_eq!(w.reconciler().entries().len(), 2);
    }

    #[tokio::test]
    async fn failed_listing_clears_rows_when_configured() {
        let settings = Settings {
            clear_on_error: true,
            ..Settings::default()
        };
        let (nm, mut w, rx) = watcher(&settings);
        w.tick().await;
        nm.fail("connection show");
        w.tick().await;

        assert!(w.reconciler().entries().is_empty());
        let removed = rx
            .try_iter()
            .filter(|e| matches!(e, AppletEvent::EntryRemoved { .. }))
            .count();
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn failed_status_query_counts_as_not_activated() {
        let (nm, mut w, _rx) = watcher(&Settings::default());
        nm.respond(&format!("connection show {}", A), "GENERAL.STATE:  activated\n");
        w.tick().await;
        w.tick().await;
        assert!(w.reconciler().entry(A).unwrap().active);

        nm.fail(&format!("connection show {}", A));
        w.tick().await;
        assert!(!w.reconciler().entry(A).unwrap().active);
        assert_eq!(w.reconciler().caption(), &Caption::Disconnected);
    }

    #[tokio::test]
    async fn commands_toggle_and_import() {
        let (nm, mut w, rx) = watcher(&Settings::default());
        w.tick().await;

        w.handle(WatcherCommand::Toggle {
            uuid: A.into(),
            on: true,
        })
        .await;
        w.handle(WatcherCommand::Import(PathBuf::from("/tmp/wg9.conf")))
            .await;

        assert_eq!(
            nm.spawned(),
            vec![
                format!("connection up {}", A),
                "connection import type wireguard file /tmp/wg9.conf".to_string(),
            ]
        );
        assert!(rx
            .try_iter()
            .any(|e| e == AppletEvent::Caption(Caption::Connected("prod-tunnel".into()))));
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_when_commands_close() {
        let (nm, mut w, _rx) = watcher(&Settings::default());
        w.tick().await;

        let (tx, commands) = mpsc::channel(8);
        tx.send(WatcherCommand::Toggle {
            uuid: B.into(),
            on: true,
        })
        .await
        .unwrap();
        drop(tx);

        w.run(commands, CancellationToken::new()).await;
        assert_eq!(nm.spawned(), vec![format!("connection up {}", B)]);
    }

    /// Answers the listing but never answers a per-connection status query.
    struct StuckStatus(FakeManager);

    #[async_trait]
    impl ConnectionManager for StuckStatus {
        async fn output(&self, args: &[&str]) -> Result<String, NmError> {
            let answer = self.0.output(args).await;
            if args.len() == 3 && args[1] == "show" {
                return std::future::pending().await;
            }
            answer
        }

        fn spawn(&self, args: &[&str]) -> Result<(), NmError> {
            self.0.spawn(args)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_status_query_times_out_and_commands_still_run() {
        let nm = Arc::new(StuckStatus(FakeManager::default()));
        nm.0.respond("connection show", LISTING);
        let (tx, rx) = crossbeam_channel::unbounded();
        let w = Watcher::new(Arc::clone(&nm), &Settings::default(), tx);

        let (commands_tx, commands) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(w.run(commands, cancel.clone()));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        commands_tx
            .send(WatcherCommand::Toggle {
                uuid: A.into(),
                on: true,
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(nm.0.spawned(), vec![format!("connection up {}", A)]);
        let listings = nm
            .0
            .outputs()
            .iter()
            .filter(|args| args.as_str() == "connection show")
            .count();
        assert!(listings >= 4, "polling stalled after {} listings", listings);
        assert!(rx
            .try_iter()
            .any(|e| e == AppletEvent::Caption(Caption::Connected("prod-tunnel".into()))));

        cancel.cancel();
        drop(commands_tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn run_returns_immediately_when_cancelled() {
        let (nm, w, _rx) = watcher(&Settings::default());
        let (_tx, commands) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        w.run(commands, cancel).await;
        assert!(nm.outputs().is_empty());
    }
}
