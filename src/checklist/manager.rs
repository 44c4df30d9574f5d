use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::{debug, info, instrument, warn};

use crate::{
    store::{KeyValueStore, ITEMS_KEY, LAST_COMPLETED_KEY, STREAK_KEY},
    utils::{clock::Clock, time::calendar_day_string},
};

use super::entities::{default_items, AppState, ChecklistItem, DayCompletion, ItemId};

/// What to do when the stored item list can't be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MalformedDataPolicy {
    /// Refuse to start.
    #[default]
    Fail,
    /// Start over from the default items. The broken value is overwritten on the next change.
    Defaults,
}

/// Controller for the checklist state of one app load. Every mutation is applied in memory and
/// then written through to the store before returning.
pub struct Checklist<S: KeyValueStore> {
    state: AppState,
    store: S,
    clock: Box<dyn Clock>,
}

impl<S: KeyValueStore> Checklist<S> {
    /// Reads all three slots. Missing slots fall back to the first-run state.
    pub fn load(store: S, clock: Box<dyn Clock>, policy: MalformedDataPolicy) -> Result<Self> {
        let items = match store.get(ITEMS_KEY)? {
            Some(saved) if !saved.is_empty() => {
                match serde_json::from_str::<Vec<ChecklistItem>>(&saved) {
                    Ok(items) => items,
                    Err(e) => match policy {
                        MalformedDataPolicy::Fail => {
                            return Err(e).with_context(|| {
                                format!("Stored value of {ITEMS_KEY} is not a valid item list")
                            })
                        }
                        MalformedDataPolicy::Defaults => {
                            warn!("Ignoring malformed {ITEMS_KEY} ({e}), using default items");
                            default_items()
                        }
                    },
                }
            }
            _ => default_items(),
        };

        let streak = match store.get(STREAK_KEY)? {
            Some(saved) if !saved.trim().is_empty() => {
                saved.trim().parse::<u64>().unwrap_or_else(|e| {
                    warn!("Stored streak {saved:?} is not a number ({e}), starting from 0");
                    0
                })
            }
            _ => 0,
        };

        let last_completed = store.get(LAST_COMPLETED_KEY)?.filter(|v| !v.is_empty());

        debug!(
            "Loaded {} items, streak {streak}, last completed {last_completed:?}",
            items.len()
        );

        Ok(Self {
            state: AppState {
                items,
                streak,
                last_completed,
            },
            store,
            clock,
        })
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.state.items
    }

    pub fn streak(&self) -> u64 {
        self.state.streak
    }

    pub fn last_completed(&self) -> Option<&str> {
        self.state.last_completed.as_deref()
    }

    /// An empty checklist counts as done.
    pub fn all_done(&self) -> bool {
        self.state.items.iter().all(|i| i.done)
    }

    /// Flips `done` on the item with `id`. Returns false if there is no such item.
    #[instrument(skip(self))]
    pub fn toggle(&mut self, id: ItemId) -> Result<bool> {
        let Some(position) = self.position(id) else {
            debug!("No item with id {id}");
            return Ok(false);
        };
        let item = self.state.items[position].clone().toggled();
        self.state.items[position] = item;
        self.persist_items()?;
        Ok(true)
    }

    /// Appends a new unfinished item. Blank text is ignored and yields [None].
    #[instrument(skip(self))]
    pub fn add(&mut self, text: &str) -> Result<Option<ItemId>> {
        if text.trim().is_empty() {
            debug!("Ignoring blank item");
            return Ok(None);
        }
        let id = self.fresh_id()?;
        self.state.items.push(ChecklistItem::new(id, text));
        self.persist_items()?;
        info!("Added item {id}");
        Ok(Some(id))
    }

    /// Deletes the item with `id`. Returns false if there is no such item.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: ItemId) -> Result<bool> {
        let Some(position) = self.position(id) else {
            debug!("No item with id {id}");
            return Ok(false);
        };
        self.state.items.remove(position);
        self.persist_items()?;
        info!("Removed item {id}");
        Ok(true)
    }

    /// Extends the streak once per calendar day and unchecks every item. The caller is expected
    /// to check [Self::all_done] first.
    #[instrument(skip(self))]
    pub fn complete_day(&mut self) -> Result<DayCompletion> {
        let today = calendar_day_string(self.clock.time().date_naive());
        let incremented = self.state.last_completed.as_deref() != Some(today.as_str());

        if incremented {
            self.state.streak = self.state.streak.saturating_add(1);
            self.state.last_completed = Some(today);
            self.persist_streak()?;
            self.persist_last_completed()?;
            info!("Streak extended to {}", self.state.streak);
        } else {
            info!("Day {today} was already completed, streak stays {}", self.state.streak);
        }

        self.state.items = std::mem::take(&mut self.state.items)
            .into_iter()
            .map(ChecklistItem::reset)
            .collect();
        self.persist_items()?;

        Ok(DayCompletion {
            streak: self.state.streak,
            incremented,
        })
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.state.items.iter().position(|i| i.id == id)
    }

    /// Ids come from the creation timestamp, bumped past existing ids when the clock would
    /// collide with or go behind them. When the largest id can't be bumped, the first free id
    /// below the timestamp is used.
    fn fresh_id(&self) -> Result<ItemId> {
        let candidate = self.clock.time().timestamp_millis();
        match self.state.items.iter().map(|i| i.id).max() {
            Some(max) if max >= candidate => match max.checked_add(1) {
                Some(id) => Ok(id),
                None => (0..=candidate)
                    .rev()
                    .find(|id| self.position(*id).is_none())
                    .context("No free item id left"),
            },
            _ => Ok(candidate),
        }
    }

    fn persist_items(&mut self) -> Result<()> {
        let text = serde_json::to_string(&self.state.items)?;
        self.store.set(ITEMS_KEY, &text)
    }

    fn persist_streak(&mut self) -> Result<()> {
        self.store.set(STREAK_KEY, &self.state.streak.to_string())
    }

    fn persist_last_completed(&mut self) -> Result<()> {
        let value = self.state.last_completed.as_deref().unwrap_or_default();
        self.store.set(LAST_COMPLETED_KEY, value)
    }
}
