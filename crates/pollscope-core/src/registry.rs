use crate::{Poll, RawEvent, TaskDecl, TaskId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("task {0} is already registered")]
    Duplicate(TaskId),
}

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub name: String,
    pub runner: usize,
    pub pending: Option<RawEvent>,
    pub polls: Vec<Poll>,
}

/// Tracked tasks keyed by feed-assigned id. Tasks are never removed;
/// lane order is registration order.
#[derive(Debug, Default)]
pub struct Registry {
    tasks: HashMap<TaskId, TaskRecord>,
    order: Vec<TaskId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, decl: &TaskDecl) -> Result<(), RegistryError> {
        if self.tasks.contains_key(&decl.id) {
            return Err(RegistryError::Duplicate(decl.id));
        }
        self.tasks.insert(
            decl.id,
            TaskRecord {
                name: decl.name.clone(),
                runner: decl.runner,
                pending: None,
                polls: Vec::new(),
            },
        );
        self.order.push(decl.id);
        Ok(())
    }

    pub fn lookup(&self, id: TaskId) -> Option<&TaskRecord> {
        self.tasks.get(&id)
    }

    pub fn lookup_mut(&mut self, id: TaskId) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(&id)
    }

    pub fn lane_of(&self, id: TaskId) -> Option<usize> {
        self.order.iter().position(|task| *task == id)
    }

    pub fn lanes(&self) -> impl Iterator<Item = (usize, TaskId, &TaskRecord)> {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(lane, id)| self.tasks.get(id).map(|record| (lane, *id, record)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(id: TaskId, name: &str) -> TaskDecl {
        TaskDecl {
            id,
            name: name.to_string(),
            runner: 0,
        }
    }

    #[test]
    fn register_creates_empty_record() {
        let mut registry = Registry::new();
        registry.register(&decl(7, "worker")).expect("first insert");

        let record = registry.lookup(7).expect("registered");
        assert_eq!(record.name, "worker");
        assert!(record.pending.is_none());
        assert!(record.polls.is_empty());
    }

    #[test]
    fn duplicate_registration_is_an_error_not_an_overwrite() {
        let mut registry = Registry::new();
        registry.register(&decl(3, "original")).expect("first insert");

        let err = registry.register(&decl(3, "impostor")).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate(3));
        assert_eq!(registry.lookup(3).expect("still there").name, "original");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lanes_follow_registration_order() {
        let mut registry = Registry::new();
        registry.register(&decl(9, "c")).unwrap();
        registry.register(&decl(2, "a")).unwrap();
        registry.register(&decl(5, "b")).unwrap();

        let ids: Vec<TaskId> = registry.lanes().map(|(_, id, _)| id).collect();
        assert_eq!(ids, vec![9, 2, 5]);
        assert_eq!(registry.lane_of(5), Some(2));
        assert_eq!(registry.lane_of(1), None);
    }
}
