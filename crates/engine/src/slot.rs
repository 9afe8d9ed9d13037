//! Field slots and compute groups
//!
//! A [`Slot`] is the memoization cell behind one resource field. It starts
//! `Unset`, and the first read runs the field's compute function exactly once.
//! Whatever comes out, value, null, or error, is frozen and handed back on
//! every later read.
//!
//! ## Locking
//!
//! Each slot has two locks:
//! - `cell`: an `RwLock` around the current [`TValue`], held only for copies
//! - `compute`: a `Mutex` held while the compute function runs
//!
//! Concurrent first readers serialize on `compute`; the losers re-check the
//! cell after acquiring it and return the frozen value without computing.
//!
//! A [`ComputeGroup`] fills several slots from one expensive computation
//! (e.g. parsing a certificate). The group caches its own outcome, so the
//! populate function runs at most once per resource. Group members call
//! [`ComputeGroup::run`] from inside their compute function; the group writes
//! the member cells directly, which is why a successful compute that returns
//! `Ok(None)` keeps a value the group already stored.
//!
//! A compute function must not read its own slot: the compute lock is not
//! reentrant.

use factgraph_core::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lifecycle state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// Never computed or assigned
    #[default]
    Unset,
    /// Frozen with a value or an error
    Set,
    /// Frozen as legitimately absent
    SetAndNull,
}

/// Snapshot of a slot: data, error, and state
#[derive(Debug, Clone, PartialEq)]
pub struct TValue<T> {
    /// Value when state is `Set` and no error occurred
    pub data: Option<T>,
    /// Frozen error
    pub error: Option<Error>,
    /// Current state
    pub state: SlotState,
}

impl<T> Default for TValue<T> {
    fn default() -> Self {
        TValue::unset()
    }
}

impl<T> TValue<T> {
    /// Not yet computed
    pub fn unset() -> Self {
        TValue {
            data: None,
            error: None,
            state: SlotState::Unset,
        }
    }

    /// Frozen value
    pub fn value(data: T) -> Self {
        TValue {
            data: Some(data),
            error: None,
            state: SlotState::Set,
        }
    }

    /// Frozen as absent
    pub fn null() -> Self {
        TValue {
            data: None,
            error: None,
            state: SlotState::SetAndNull,
        }
    }

    /// Frozen error
    pub fn failed(error: Error) -> Self {
        TValue {
            data: None,
            error: Some(error),
            state: SlotState::Set,
        }
    }

    /// Whether the slot is frozen
    pub fn is_set(&self) -> bool {
        self.state != SlotState::Unset
    }

    /// Whether the slot is frozen as absent
    pub fn is_null(&self) -> bool {
        self.state == SlotState::SetAndNull
    }

    /// Whether the slot is frozen with an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Take the value; `Ok(None)` when absent or unset
    pub fn into_result(self) -> Result<Option<T>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }
}

impl<T: Clone> TValue<T> {
    /// Borrowing variant of [`TValue::into_result`]
    pub fn result(&self) -> Result<Option<T>> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self.data.clone()),
        }
    }
}

/// Memoization cell for one field
#[derive(Debug)]
pub struct Slot<T> {
    cell: RwLock<TValue<T>>,
    compute: Mutex<()>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot {
            cell: RwLock::new(TValue::unset()),
            compute: Mutex::new(()),
        }
    }
}

impl<T: Clone> Slot<T> {
    /// Create an unset slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> TValue<T> {
        self.cell.read().clone()
    }

    /// Whether the slot is frozen
    pub fn is_set(&self) -> bool {
        self.cell.read().is_set()
    }

    /// Overwrite the slot.
    ///
    /// Used by construction, recordings, and store requests.
    /// Readers that already copied the previous value keep their copy.
    pub fn set(&self, value: TValue<T>) {
        *self.cell.write() = value;
    }

    /// Freeze with a value
    pub fn set_value(&self, data: T) {
        self.set(TValue::value(data));
    }

    /// Freeze as absent
    pub fn set_null(&self) {
        self.set(TValue::null());
    }

    /// Freeze with an error
    pub fn set_error(&self, error: Error) {
        self.set(TValue::failed(error));
    }

    /// Freeze with `data` when present, as absent otherwise
    pub fn set_option(&self, data: Option<T>) {
        match data {
            Some(data) => self.set_value(data),
            None => self.set_null(),
        }
    }

    /// Freeze with `data` (or as absent) unless the slot is already frozen.
    ///
    /// Compute groups fill their members with this, so a member that was
    /// hydrated from a recording or a store request keeps that value.
    /// Returns whether the slot changed.
    pub fn fill(&self, data: Option<T>) -> bool {
        let mut cell = self.cell.write();
        if cell.is_set() {
            return false;
        }
        *cell = match data {
            Some(data) => TValue::value(data),
            None => TValue::null(),
        };
        true
    }

    /// Return the frozen value, computing it first if the slot is unset.
    ///
    /// `compute` runs at most once over the lifetime of the slot:
    /// - `Ok(Some(v))` freezes `v`
    /// - `Ok(None)` freezes as absent, unless `compute` populated the slot itself
    /// - `Err(e)` freezes `e`; it is never retried
    pub fn get_or_compute<F>(&self, compute: F) -> TValue<T>
    where
        F: FnOnce() -> Result<Option<T>>,
    {
        {
            let current = self.cell.read();
            if current.is_set() {
                return current.clone();
            }
        }

        let _guard = self.compute.lock();
        {
            let current = self.cell.read();
            if current.is_set() {
                return current.clone();
            }
        }

        let outcome = compute();

        let mut cell = self.cell.write();
        match outcome {
            Err(e) => *cell = TValue::failed(e),
            Ok(_) if cell.is_set() => {}
            Ok(Some(data)) => *cell = TValue::value(data),
            Ok(None) => *cell = TValue::null(),
        }
        cell.clone()
    }
}

/// One computation that fills several slots of a resource
#[derive(Debug, Default)]
pub struct ComputeGroup {
    outcome: Mutex<Option<Result<()>>>,
    runs: AtomicUsize,
}

impl ComputeGroup {
    /// Create a group that has not run yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `populate` unless it already ran, and return its outcome.
    ///
    /// The outcome, success or error, is cached: later callers get the
    /// cached result without running `populate` again.
    pub fn run<F>(&self, populate: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let mut outcome = self.outcome.lock();
        if let Some(done) = outcome.as_ref() {
            return done.clone();
        }
        self.runs.fetch_add(1, Ordering::Relaxed);
        let result = populate();
        *outcome = Some(result.clone());
        result
    }

    /// Whether `populate` has completed
    pub fn is_done(&self) -> bool {
        self.outcome.lock().is_some()
    }

    /// How many times `populate` ran (0 or 1)
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }
}
