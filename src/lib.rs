//! # Phrase Core
//!
//! The non-visual core of a phrase manager: a pure state reducer over a
//! phrase collection, a debounced literal search filter, and a single-slot
//! LMDB persistence adapter, exposed over FFI for Flutter and other
//! cross-platform hosts.
//!
//! ## Features
//!
//! - **Pure reducer**: every change is an [`Action`](phrase_state::Action) applied by
//!   [`reduce`](phrase_state::reduce); unknown actions return the same state
//! - **Debounced search**: the filtered view follows the query only after it has
//!   been stable for the debounce window (300 ms by default)
//! - **Literal matching**: queries are escaped before matching, so regex
//!   metacharacters are searched for as text
//! - **Single-slot storage**: the collection is one JSON array in LMDB, replaced
//!   in one transaction on every committed change
//! - **Failure simulation**: optional latency and random faults to exercise a
//!   host's error handling
//!
//! ## Quick Start
//!
//! ```no_run
//! use phrase_core::{create_store, load_phrases, add_phrase, free_response};
//! use std::ffi::CString;
//!
//! let config = CString::new(r#"{"db_path":"my_phrases"}"#).unwrap();
//! let store = create_store(config.as_ptr());
//!
//! free_response(load_phrases(store));
//!
//! let text = CString::new("Hola mundo").unwrap();
//! let response = add_phrase(store, text.as_ptr());
//! free_response(response);
//! ```
//!
//! ## FFI Functions
//!
//! - [`create_store`] - Open storage and create a store handle
//! - [`load_phrases`] - Load the stored collection
//! - [`add_phrase`] - Validate and add a phrase
//! - [`edit_phrase`] - Replace a phrase's text
//! - [`delete_phrase`] - Remove a phrase by id
//! - [`set_search_query`] - Update the (debounced) search query
//! - [`dispatch_action`] - Apply a raw reducer action
//! - [`get_state`] - Current state
//! - [`get_filtered_phrases`] - Phrases matching the settled query
//! - [`get_stats`] - Collection statistics
//! - [`close_store`] - Release the handle
//! - [`free_response`] - Release a returned string

pub mod config;
pub mod debounce;
pub mod error;
pub mod phrase_model;
pub mod phrase_state;
pub mod phrase_storage;
pub mod search_filter;
pub mod simulation;
pub mod store;
pub mod validation;
mod app_response;

use crate::config::StoreConfig;
use crate::phrase_state::Action;
use crate::phrase_storage::LmdbStorage;
use crate::store::PhraseStore;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use log::{info, warn};
use tokio::runtime::Runtime;

pub use crate::app_response::AppResponse;

/// A store together with the runtime that drives its timers.
///
/// Hosts only ever see a pointer to this.
pub struct PhraseHandle {
    store: PhraseStore,
    runtime: Runtime,
}

impl PhraseHandle {
    /// Opens LMDB storage and builds a store as described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self, AppResponse> {
        config.validate().map_err(|e| AppResponse::BadRequest(format!("Invalid configuration: {e}")))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .build()
            .map_err(|e| AppResponse::DatabaseError(format!("Cannot start runtime: {e}")))?;

        let storage = LmdbStorage::init(&config.db_path, &config.slot_name, config.map_size_bytes)?;

        let store = {
            let _guard = runtime.enter();
            PhraseStore::new(config, Box::new(storage))?
        };

        Ok(Self { store, runtime })
    }

    pub fn store(&self) -> &PhraseStore {
        &self.store
    }
}

/// Creates a phrase store from a JSON configuration.
///
/// Opens (or creates) the LMDB environment at `<db_path>.lmdb` and starts a
/// one-worker runtime for the search debouncer. The store starts in the
/// loading state; call [`load_phrases`] next.
///
/// # Parameters
///
/// * `config_json` - Null-terminated JSON [`StoreConfig`]; `{}` uses every default
///
/// # Returns
///
/// A pointer to the [`PhraseHandle`] on success, or a null pointer on failure.
/// Release it with [`close_store`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use phrase_core::create_store;
///
/// let config = CString::new(r#"{"db_path":"phrases","debounce_ms":250}"#).unwrap();
/// let store = create_store(config.as_ptr());
///
/// if !store.is_null() {
///     // Store created successfully
/// }
/// ```
///
/// # Errors
///
/// Returns null pointer if:
/// - Input pointer is null
/// - Input string contains invalid UTF-8 or invalid configuration
/// - Storage or runtime initialization fails
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(config_json: *const c_char) -> *mut PhraseHandle {
    if config_json.is_null() {
        warn!("Null config pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let config_str = match unsafe { CStr::from_ptr(config_json).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = match StoreConfig::from_json(config_str) {
        Ok(c) => c,
        Err(e) => {
            warn!("Rejected store configuration: {e}");
            return std::ptr::null_mut();
        }
    };

    let lmdb_dir = format!("{}.lmdb", config.db_path);
    if Path::new(&lmdb_dir).exists() {
        info!("Reopening phrase storage at: {}", lmdb_dir);
    } else {
        info!("Creating new phrase storage at: {}", lmdb_dir);
    }

    match PhraseHandle::open(&config) {
        Ok(handle) => {
            info!("✅ Phrase store initialized successfully");
            Box::into_raw(Box::new(handle))
        }
        Err(e) => {
            warn!("❌ Failed to initialize phrase store: {e}");
            warn!("Attempted path: {}", lmdb_dir);
            std::ptr::null_mut()
        }
    }
}

/// Loads the stored collection into the store.
///
/// # Returns
///
/// `Ok` with the resulting state as JSON, or a `DatabaseError` when storage
/// cannot be read. In the error case the state also carries the message and
/// nothing is written back to storage.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn load_phrases(handle: *mut PhraseHandle) -> *const c_char {
    let handle = match handle_mut(handle, "load_phrases") {
        Ok(h) => h,
        Err(err) => return err,
    };

    match handle.runtime.block_on(handle.store.load()) {
        Ok(_) => response_to_c_string(&AppResponse::from_json(&*handle.store.state())),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Validates and adds a new phrase.
///
/// The text is trimmed and must be 3 to 200 characters and not a
/// case-insensitive duplicate of an existing phrase.
///
/// # Returns
///
/// `Ok` with the new phrase as JSON, `ValidationError` when the text is
/// rejected, or `DatabaseError` when the operation fails.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use phrase_core::{create_store, add_phrase};
///
/// let config = CString::new("{}").unwrap();
/// let store = create_store(config.as_ptr());
///
/// let text = CString::new("  Hola mundo  ").unwrap();
/// let result = add_phrase(store, text.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_phrase(handle: *mut PhraseHandle, text: *const c_char) -> *const c_char {
    let handle = match handle_mut(handle, "add_phrase") {
        Ok(h) => h,
        Err(err) => return err,
    };

    let text = match c_ptr_to_string(text, "text") {
        Ok(t) => t,
        Err(err) => return err,
    };

    match handle.runtime.block_on(handle.store.add_phrase(&text)) {
        Ok(phrase) => response_to_c_string(&AppResponse::from_json(&phrase)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Replaces the text of an existing phrase.
///
/// # Returns
///
/// `Ok` with the updated phrase as JSON, `NotFound` if no phrase has that id,
/// `ValidationError` when the text is rejected, or `DatabaseError`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn edit_phrase(
    handle: *mut PhraseHandle,
    id: *const c_char,
    text: *const c_char,
) -> *const c_char {
    let handle = match handle_mut(handle, "edit_phrase") {
        Ok(h) => h,
        Err(err) => return err,
    };

    let id = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    let text = match c_ptr_to_string(text, "text") {
        Ok(t) => t,
        Err(err) => return err,
    };

    match handle.runtime.block_on(handle.store.edit_phrase(&id, &text)) {
        Ok(true) => {
            let state = handle.store.state();
            match state.phrases.iter().find(|p| p.id == id) {
                Some(phrase) => response_to_c_string(&AppResponse::from_json(phrase)),
                None => response_to_c_string(&AppResponse::NotFound(format!("No phrase found with id: {id}"))),
            }
        }
        Ok(false) => {
            response_to_c_string(&AppResponse::NotFound(format!("No phrase found with id: {id}")))
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Deletes a phrase by id.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_phrase(handle: *mut PhraseHandle, id: *const c_char) -> *const c_char {
    let handle = match handle_mut(handle, "delete_phrase") {
        Ok(h) => h,
        Err(err) => return err,
    };

    let id = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    match handle.runtime.block_on(handle.store.delete_phrase(&id)) {
        Ok(true) => response_to_c_string(&AppResponse::success("Phrase deleted successfully")),
        Ok(false) => {
            response_to_c_string(&AppResponse::NotFound(format!("No phrase found with id: {id}")))
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Updates the search query.
///
/// The raw query is stored immediately; [`get_filtered_phrases`] picks it up
/// once it has been stable for the debounce window.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_search_query(handle: *mut PhraseHandle, query: *const c_char) -> *const c_char {
    let handle = match handle_mut(handle, "set_search_query") {
        Ok(h) => h,
        Err(err) => return err,
    };

    let query = match c_ptr_to_string(query, "query") {
        Ok(q) => q,
        Err(err) => return err,
    };

    match handle.store.set_search_query(&query) {
        Ok(()) => response_to_c_string(&AppResponse::success("Search query updated")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Applies a raw reducer action.
///
/// Expected JSON structure:
/// ```json
/// { "type": "SET_LOADING", "payload": false }
/// ```
///
/// Unrecognized types are accepted and leave the state unchanged.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn dispatch_action(handle: *mut PhraseHandle, action_json: *const c_char) -> *const c_char {
    let handle = match handle_mut(handle, "dispatch_action") {
        Ok(h) => h,
        Err(err) => return err,
    };

    let json_str = match c_ptr_to_string(action_json, "action") {
        Ok(json) => json,
        Err(err) => return err,
    };

    let action: Action = match serde_json::from_str(&json_str) {
        Ok(a) => a,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid action JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match handle.store.dispatch(action) {
        Ok(()) => response_to_c_string(&AppResponse::from_json(&*handle.store.state())),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Returns the current state as JSON.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_state(handle: *mut PhraseHandle) -> *const c_char {
    match handle_ref(handle, "get_state") {
        Ok(h) => response_to_c_string(&AppResponse::from_json(&*h.store.state())),
        Err(err) => err,
    }
}

/// Returns the phrases matching the settled search query as a JSON array.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_filtered_phrases(handle: *mut PhraseHandle) -> *const c_char {
    match handle_ref(handle, "get_filtered_phrases") {
        Ok(h) => response_to_c_string(&AppResponse::from_json(&h.store.filtered_phrases())),
        Err(err) => err,
    }
}

/// Returns [`PhraseStats`](store::PhraseStats) as JSON.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_stats(handle: *mut PhraseHandle) -> *const c_char {
    match handle_ref(handle, "get_stats") {
        Ok(h) => response_to_c_string(&AppResponse::from_json(&h.store.stats())),
        Err(err) => err,
    }
}

/// Closes the store and releases the handle.
///
/// Pending debounce timers are cancelled and the LMDB environment is closed.
/// The pointer must not be used afterwards.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use phrase_core::{create_store, close_store};
///
/// let config = CString::new("{}").unwrap();
/// let store = create_store(config.as_ptr());
///
/// // Before hot restart or application shutdown
/// let result = close_store(store);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(handle: *mut PhraseHandle) -> *const c_char {
    if handle.is_null() {
        let error = AppResponse::BadRequest("Null handle pointer passed to close_store".to_string());
        return response_to_c_string(&error);
    }

    let handle = unsafe { Box::from_raw(handle) };
    drop(handle);
    info!("Phrase store closed");

    response_to_c_string(&AppResponse::success("Store closed successfully"))
}

/// Releases a string returned by any function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

/// Converts an [`AppResponse`] to a C-compatible string.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// * `Ok(String)` - If conversion was successful
/// * `Err(*const c_char)` - `BadRequest` response for a null pointer or invalid UTF-8
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn handle_mut<'a>(ptr: *mut PhraseHandle, caller: &str) -> Result<&'a mut PhraseHandle, *const c_char> {
    match unsafe { ptr.as_mut() } {
        Some(h) => Ok(h),
        None => {
            let error = AppResponse::BadRequest(format!("Null handle pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn handle_ref<'a>(ptr: *mut PhraseHandle, caller: &str) -> Result<&'a PhraseHandle, *const c_char> {
    match unsafe { ptr.as_ref() } {
        Some(h) => Ok(h),
        None => {
            let error = AppResponse::BadRequest(format!("Null handle pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}
