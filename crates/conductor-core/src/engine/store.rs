//! In-memory map from plan ID to its live execution state.

use std::collections::HashMap;

use crate::{
    error::{EngineError, Result},
    models::{ExecutionOptions, ExecutionState, Plan},
};

/// Single source of truth for every registered execution.
///
/// At most one entry exists per plan ID. Nothing here is persisted.
#[derive(Debug, Default)]
pub struct ExecutionStore {
    entries: HashMap<String, ExecutionState>,
    last_run_id: u64,
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new execution for `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyRunning`] if the plan ID is already
    /// registered; the existing entry is left untouched.
    pub fn register(&mut self, plan: Plan, options: ExecutionOptions) -> Result<&mut ExecutionState> {
        if self.entries.contains_key(&plan.id) {
            return Err(EngineError::AlreadyRunning { plan_id: plan.id });
        }
        self.last_run_id += 1;
        let plan_id = plan.id.clone();
        let state = ExecutionState::new(plan, options, self.last_run_id);
        Ok(self.entries.entry(plan_id).or_insert(state))
    }

    pub fn get(&self, plan_id: &str) -> Option<&ExecutionState> {
        self.entries.get(plan_id)
    }

    pub fn get_mut(&mut self, plan_id: &str) -> Option<&mut ExecutionState> {
        self.entries.get_mut(plan_id)
    }

    /// Looks up an entry only if it still belongs to the given run.
    pub fn get_run_mut(&mut self, plan_id: &str, run_id: u64) -> Option<&mut ExecutionState> {
        self.entries
            .get_mut(plan_id)
            .filter(|state| state.run_id == run_id)
    }

    pub fn remove(&mut self, plan_id: &str) -> Option<ExecutionState> {
        self.entries.remove(plan_id)
    }

    pub fn contains(&self, plan_id: &str) -> bool {
        self.entries.contains_key(plan_id)
    }

    /// IDs of all registered plans, sorted for stable output.
    pub fn plan_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanStep;

    fn plan(id: &str) -> Plan {
        Plan::new(id, "Test", vec![PlanStep::think("s1", "hmm")])
    }

    #[test]
    fn test_register_and_get() {
        let mut store = ExecutionStore::new();
        store
            .register(plan("a"), ExecutionOptions::default())
            .expect("register should succeed");

        let state = store.get("a").expect("entry should exist");
        assert_eq!(state.plan_id(), "a");
        assert_eq!(state.current_step_index, 0);
        assert!(!state.is_paused);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_register_rejected_and_original_untouched() {
        let mut store = ExecutionStore::new();
        store
            .register(plan("a"), ExecutionOptions::default())
            .expect("first register");
        store.get_mut("a").unwrap().current_step_index = 1;

        let err = store
            .register(plan("a"), ExecutionOptions::manual())
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyRunning { ref plan_id } if plan_id == "a"));

        let state = store.get("a").unwrap();
        assert_eq!(state.current_step_index, 1);
        assert!(state.options.auto_proceed);
    }

    #[test]
    fn test_run_ids_are_distinct_across_registrations() {
        let mut store = ExecutionStore::new();
        let first = store
            .register(plan("a"), ExecutionOptions::default())
            .unwrap()
            .run_id;
        store.remove("a");
        let second = store
            .register(plan("a"), ExecutionOptions::default())
            .unwrap()
            .run_id;

        assert_ne!(first, second);
        assert!(store.get_run_mut("a", first).is_none());
        assert!(store.get_run_mut("a", second).is_some());
    }

    #[test]
    fn test_remove_and_ids() {
        let mut store = ExecutionStore::new();
        store.register(plan("b"), ExecutionOptions::default()).unwrap();
        store.register(plan("a"), ExecutionOptions::default()).unwrap();
        assert_eq!(store.plan_ids(), vec!["a".to_string(), "b".to_string()]);

        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(!store.contains("a"));
        assert!(!store.is_empty());
    }
}
