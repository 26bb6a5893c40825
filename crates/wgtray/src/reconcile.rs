//! Reconciliation of polled connection lists against the displayed toggle rows.
//!
//! The [`Reconciler`] owns every [`DisplayEntry`] and the shared caption. It
//! performs no I/O: it returns the status queries a tick should issue and the
//! [`AppletEvent`]s a front end should apply.

use crate::parse::{ConnectionRecord, StateLine};

/// Tooltip and icon shared by the whole applet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Caption {
    #[default]
    Disconnected,
    Connected(String),
}

impl Caption {
    pub fn tooltip(&self) -> String {
        match self {
            Caption::Disconnected => "Not connected!".to_string(),
            Caption::Connected(name) => format!("Connected to {}!", name),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Caption::Connected(_))
    }
}

/// One toggle row bound to a connection UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    pub uuid: String,
    pub name: String,
    pub active: bool,
    /// Bumped whenever the entry's state is set by the user, so status
    /// responses issued before that point can be recognised as stale.
    pub generation: u64,
}

/// A status query issued for an existing entry during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusQuery {
    pub uuid: String,
    pub name: String,
    pub generation: u64,
}

/// Changes a front end applies to its visible state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppletEvent {
    /// A row to insert at `position` among the connection rows, i.e. before
    /// the trailing static menu items.
    EntryAdded {
        uuid: String,
        name: String,
        position: usize,
    },
    EntryRemoved {
        uuid: String,
    },
    EntryState {
        uuid: String,
        active: bool,
    },
    Caption(Caption),
}

/// Output of one reconciliation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub events: Vec<AppletEvent>,
    pub queries: Vec<StatusQuery>,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    entries: Vec<DisplayEntry>,
    caption: Caption,
    next_generation: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[DisplayEntry] {
        &self.entries
    }

    pub fn entry(&self, uuid: &str) -> Option<&DisplayEntry> {
        self.entries.iter().find(|e| e.uuid == uuid)
    }

    pub fn caption(&self) -> &Caption {
        &self.caption
    }

    /// Diffs a fresh snapshot against the displayed entries.
    ///
    /// Entries missing from the snapshot are dropped, unseen connections get a
    /// new deactivated entry, and every entry that already existed gets one
    /// status query.
    pub fn reconcile(&mut self, snapshot: &[ConnectionRecord]) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        self.entries.retain(|entry| {
            let keep = snapshot.iter().any(|r| r.uuid == entry.uuid);
            if !keep {
                log::info!("Connection '{}' ({}) is gone", entry.name, entry.uuid);
                outcome.events.push(AppletEvent::EntryRemoved {
                    uuid: entry.uuid.clone(),
                });
            }
            keep
        });

        for record in snapshot {
            match self.entries.iter().find(|e| e.uuid == record.uuid) {
                Some(entry) => outcome.queries.push(StatusQuery {
                    uuid: entry.uuid.clone(),
                    name: record.name.clone(),
                    generation: entry.generation,
                }),
                None => {
                    log::info!("New connection '{}' ({})", record.name, record.uuid);
                    let generation = self.bump();
                    let position = self.entries.len();
                    self.entries.push(DisplayEntry {
                        uuid: record.uuid.clone(),
                        name: record.name.clone(),
                        active: false,
                        generation,
                    });
                    outcome.events.push(AppletEvent::EntryAdded {
                        uuid: record.uuid.clone(),
                        name: record.name.clone(),
                        position,
                    });
                }
            }
        }

        outcome
    }

    /// Applies the answer to a status query.
    ///
    /// The answer is dropped if the entry was removed or its generation moved
    /// on since the query was issued. An active state claims the shared
    /// caption, so with several active connections the last one applied wins.
    /// A missing state line only clears entries that were active; a present
    /// but not-yet-active state changes nothing.
    pub fn apply_status(&mut self, query: &StatusQuery, state: StateLine) -> Vec<AppletEvent> {
        let mut events = Vec::new();

        let Some(entry) = self.entries.iter_mut().find(|e| e.uuid == query.uuid) else {
            log::debug!("Dropping status for removed connection {}", query.uuid);
            return events;
        };
        if entry.generation != query.generation {
            log::debug!(
                "Dropping stale status for {} (generation {} < {})",
                query.uuid,
                query.generation,
                entry.generation
            );
            return events;
        }

        let caption = match state {
            StateLine::Present { active: true } => {
                if !entry.active {
                    entry.active = true;
                    events.push(AppletEvent::EntryState {
                        uuid: entry.uuid.clone(),
                        active: true,
                    });
                }
                Caption::Connected(query.name.clone())
            }
            StateLine::Missing if entry.active => {
                entry.active = false;
                events.push(AppletEvent::EntryState {
                    uuid: entry.uuid.clone(),
                    active: false,
                });
                Caption::Disconnected
            }
            _ => return events,
        };

        self.set_caption(caption, &mut events);
        events
    }

    /// Records a user toggle optimistically.
    ///
    /// Returns `None` if no entry is bound to `uuid`.
    pub fn toggle(&mut self, uuid: &str, on: bool) -> Option<Vec<AppletEvent>> {
        let generation = self.bump();
        let entry = self.entries.iter_mut().find(|e| e.uuid == uuid)?;
        entry.active = on;
        entry.generation = generation;

        let caption = if on {
            Caption::Connected(entry.name.clone())
        } else {
            Caption::Disconnected
        };
        let mut events = vec![AppletEvent::EntryState {
            uuid: uuid.to_string(),
            active: on,
        }];
        self.set_caption(caption, &mut events);
        Some(events)
    }

    fn set_caption(&mut self, caption: Caption, events: &mut Vec<AppletEvent>) {
        if self.caption != caption {
            self.caption = caption.clone();
            events.push(AppletEvent::Caption(caption));
        }
    }

    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}
