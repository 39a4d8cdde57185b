//! The owned phrase store.
//!
//! [`PhraseStore`] is the single owner of [`PhraseState`]. Every change goes
//! through [`PhraseStore::dispatch`], which runs the reducer and mirrors the
//! collection to storage once the initial load has completed. The async
//! operations wrap dispatches around the storage call and the optional
//! network simulation, and turn any failure into one `SET_ERROR`.

use std::sync::Arc;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::debounce::Debouncer;
use crate::error::PhraseError;
use crate::phrase_model::{Clock, Phrase, SystemClock};
use crate::phrase_state::{reduce, Action, PhraseState};
use crate::phrase_storage::PhraseStorage;
use crate::search_filter;
use crate::simulation::{self, NetworkSimulation, RemoteOp};
use crate::validation;

pub const LOAD_ERROR: &str = "Error loading phrases";
pub const SAVE_ERROR: &str = "Error saving phrases";
pub const ADD_ERROR: &str = "Error adding phrase";
pub const UPDATE_ERROR: &str = "Error updating phrase";
pub const DELETE_ERROR: &str = "Error deleting phrase";

/// Summary figures for the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseStats {
    pub total: usize,
    /// Size of the filtered view.
    pub matching: usize,
    /// Whether the raw search query is non-empty.
    pub searching: bool,
    /// `total / 7`, rounded half up.
    pub average_per_day: usize,
}

pub struct PhraseStore {
    state: Arc<PhraseState>,
    storage: Box<dyn PhraseStorage>,
    simulation: Box<dyn NetworkSimulation>,
    clock: Box<dyn Clock>,
    rng: StdRng,
    search: Debouncer<String>,
    hydrated: bool,
}

impl PhraseStore {
    /// Creates a store over `storage` using the simulation and debounce
    /// window from `config`.
    ///
    /// # Errors
    ///
    /// [`PhraseError::Config`] for an invalid configuration,
    /// [`PhraseError::Runtime`] when called outside a Tokio runtime.
    pub fn new(config: &StoreConfig, storage: Box<dyn PhraseStorage>) -> Result<Self, PhraseError> {
        config.validate()?;
        let search = Debouncer::new(String::new(), config.debounce_window())?;
        info!("Creating phrase store (debounce {} ms)", config.debounce_ms);
        Ok(Self::with_parts(
            storage,
            simulation::from_config(&config.simulation),
            Box::new(SystemClock),
            search,
        ))
    }

    /// Creates a store from explicit parts.
    pub fn with_parts(
        storage: Box<dyn PhraseStorage>,
        simulation: Box<dyn NetworkSimulation>,
        clock: Box<dyn Clock>,
        search: Debouncer<String>,
    ) -> Self {
        Self {
            state: Arc::new(PhraseState::initial()),
            storage,
            simulation,
            clock,
            rng: StdRng::from_os_rng(),
            search,
            hydrated: false,
        }
    }

    /// Shared snapshot of the current state.
    pub fn state(&self) -> Arc<PhraseState> {
        Arc::clone(&self.state)
    }

    /// Whether the initial load has completed successfully.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Applies `action` and mirrors the collection to storage when the change
    /// is committed.
    ///
    /// A save only happens once hydrated, while not loading, and when the
    /// action touched the collection or was the `SET_LOADING(false)` that ends
    /// a loading phase. Error transitions never save. A failed save sets
    /// [`SAVE_ERROR`] on the state and is returned.
    pub fn dispatch(&mut self, action: Action) -> Result<(), PhraseError> {
        let touches_phrases = action.touches_phrases();
        let ends_loading = matches!(action, Action::SetLoading(false));
        let previous = Arc::clone(&self.state);
        let next = reduce(&previous, action);

        if Arc::ptr_eq(&previous, &next) {
            debug!("Ignoring unknown action");
            return Ok(());
        }
        self.state = next;

        let finished_loading = ends_loading && previous.is_loading;
        if self.hydrated && !self.state.is_loading && (touches_phrases || finished_loading) {
            self.persist()?;
        }
        Ok(())
    }

    /// Loads the stored collection, replacing the in-memory one.
    ///
    /// Returns the number of phrases loaded and clears any earlier error. On
    /// failure the store stays unhydrated, so nothing is written back over
    /// the stored slot.
    pub async fn load(&mut self) -> Result<usize, PhraseError> {
        self.dispatch(Action::SetLoading(true))?;

        if let Err(e) = self.simulate(RemoteOp::Load).await {
            return Err(self.fail(LOAD_ERROR, e));
        }

        let phrases = match self.storage.load() {
            Ok(phrases) => phrases,
            Err(e) => return Err(self.fail(LOAD_ERROR, e)),
        };

        let count = phrases.len();
        self.dispatch(Action::LoadPhrases(phrases))?;
        self.hydrated = true;
        if self.state.error.is_some() {
            self.dispatch(Action::SetError(None))?;
        }
        info!("Loaded {count} phrases");
        Ok(count)
    }

    /// Validates `text`, builds a phrase from it and prepends it.
    ///
    /// Validation failures return early and leave the state untouched.
    pub async fn add_phrase(&mut self, text: &str) -> Result<Phrase, PhraseError> {
        let trimmed = validation::validate_new(text, &self.state.phrases)?.to_string();

        self.dispatch(Action::SetLoading(true))?;

        if let Err(e) = self.simulate(RemoteOp::Add).await {
            return Err(self.fail(ADD_ERROR, e));
        }

        let phrase = Phrase::create(&trimmed, self.clock.now_millis(), &mut self.rng);
        self.dispatch(Action::AddPhrase(phrase.clone()))?;
        self.dispatch(Action::SetLoading(false))?;
        Ok(phrase)
    }

    /// Replaces the text of phrase `id`.
    ///
    /// Returns whether the phrase existed. An absent id is reported before
    /// the text is validated and leaves the collection as it was.
    pub async fn edit_phrase(&mut self, id: &str, text: &str) -> Result<bool, PhraseError> {
        if !self.state.contains(id) {
            debug!("Edit of unknown phrase {id} ignored");
            return Ok(false);
        }

        let trimmed = validation::validate_edit(id, text, &self.state.phrases)?.to_string();

        if let Err(e) = self.simulate(RemoteOp::Update).await {
            return Err(self.fail(UPDATE_ERROR, e));
        }

        self.dispatch(Action::EditPhrase {
            id: id.to_string(),
            text: trimmed,
        })?;
        Ok(true)
    }

    /// Removes phrase `id`. Returns whether it existed.
    pub async fn delete_phrase(&mut self, id: &str) -> Result<bool, PhraseError> {
        if let Err(e) = self.simulate(RemoteOp::Delete).await {
            return Err(self.fail(DELETE_ERROR, e));
        }

        let existed = self.state.contains(id);
        if !existed {
            debug!("Delete of unknown phrase {id} ignored");
        }
        self.dispatch(Action::DeletePhrase(id.to_string()))?;
        Ok(existed)
    }

    /// Records the raw query and schedules it for the filtered view.
    pub fn set_search_query(&mut self, query: &str) -> Result<(), PhraseError> {
        self.dispatch(Action::SetSearchQuery(query.to_string()))?;
        self.search.push(query.to_string());
        Ok(())
    }

    /// The query the filtered view currently uses.
    pub fn settled_query(&self) -> String {
        self.search.settled()
    }

    pub fn search_pending(&self) -> bool {
        self.search.is_pending()
    }

    /// Phrases matching the settled query, newest first.
    pub fn filtered_phrases(&self) -> Vec<&Phrase> {
        let query = self.search.settled();
        search_filter::filter_phrases(&self.state.phrases, &query)
    }

    pub fn stats(&self) -> PhraseStats {
        let total = self.state.phrases.len();
        PhraseStats {
            total,
            matching: self.filtered_phrases().len(),
            searching: !self.state.search_query.is_empty(),
            average_per_day: (2 * total + 7) / 14,
        }
    }

    async fn simulate(&mut self, op: RemoteOp) -> Result<(), PhraseError> {
        let outcome = self.simulation.plan(op);
        if !outcome.latency.is_zero() {
            tokio::time::sleep(outcome.latency).await;
        }
        if outcome.fail {
            return Err(PhraseError::RemoteFailure(op.to_string()));
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<(), PhraseError> {
        if let Err(e) = self.storage.save(&self.state.phrases) {
            warn!("{SAVE_ERROR}: {e}");
            self.state = reduce(&self.state, Action::SetError(Some(SAVE_ERROR.to_string())));
            return Err(e);
        }
        Ok(())
    }

    fn fail(&mut self, message: &str, err: PhraseError) -> PhraseError {
        warn!("{message}: {err}");
        self.state = reduce(&self.state, Action::SetError(Some(message.to_string())));
        err
    }
}
