//! Subsystem registry and resource arbitration
//!
//! The registry is the sole arbiter of subsystem ownership. It tracks, for
//! each registered subsystem, which command (if any) currently owns exclusive
//! use of it. Claims are all-or-nothing across a command's whole requirement
//! set: partial acquisition is never visible, which rules out deadlock from
//! half-claimed resource sets.

use std::fmt;

use crate::command::CommandId;
use crate::error::{TalosError, TalosResult};

/// Identity of one physical resource domain (drivetrain, arm, winch, ...).
/// Issued once at registration and valid for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubsystemId(pub(crate) u32);

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subsystem#{}", self.0)
    }
}

/// A claim that failed against a non-interruptible owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimConflict {
    pub subsystem: SubsystemId,
    pub owner: CommandId,
}

struct SubsystemEntry {
    name: String,
    owner: Option<CommandId>,
}

/// Mapping from subsystem to its currently-owning command
#[derive(Default)]
pub struct SubsystemRegistry {
    entries: Vec<SubsystemEntry>,
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subsystem under a unique name
    pub fn register(&mut self, name: &str) -> TalosResult<SubsystemId> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(TalosError::invalid_input(format!(
                "subsystem '{}' is already registered",
                name
            )));
        }
        let id = SubsystemId(self.entries.len() as u32);
        self.entries.push(SubsystemEntry {
            name: name.to_string(),
            owner: None,
        });
        Ok(id)
    }

    /// Whether the id refers to a registered subsystem
    pub fn contains(&self, id: SubsystemId) -> bool {
        (id.0 as usize) < self.entries.len()
    }

    /// Name of a registered subsystem ("?" for an unknown id)
    pub fn name(&self, id: SubsystemId) -> &str {
        self.entries
            .get(id.0 as usize)
            .map(|e| e.name.as_str())
            .unwrap_or("?")
    }

    /// The command currently owning a subsystem, if any
    pub fn owner(&self, id: SubsystemId) -> Option<CommandId> {
        self.entries.get(id.0 as usize).and_then(|e| e.owner)
    }

    /// All registered subsystem ids, in registration order
    pub fn ids(&self) -> Vec<SubsystemId> {
        (0..self.entries.len() as u32).map(SubsystemId).collect()
    }

    /// Number of registered subsystems
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no subsystems are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subsystems currently owned by a command
    pub fn owned_by(&self, owner: CommandId) -> Vec<SubsystemId> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.owner == Some(owner))
            .map(|(i, _)| SubsystemId(i as u32))
            .collect()
    }

    /// Atomically claim every requested subsystem for `requester`.
    ///
    /// Succeeds only if each requested subsystem is free or held by an owner
    /// `can_interrupt` approves. On success all requested subsystems are
    /// reassigned at once and the deduplicated list of dispossessed owners is
    /// returned (the caller must cancel them). On failure nothing changes.
    pub fn try_claim(
        &mut self,
        requester: CommandId,
        requirements: &[SubsystemId],
        can_interrupt: &dyn Fn(CommandId) -> bool,
    ) -> Result<Vec<CommandId>, ClaimConflict> {
        // First pass: check every subsystem before touching any of them
        for id in requirements {
            if let Some(owner) = self.owner(*id) {
                if owner != requester && !can_interrupt(owner) {
                    return Err(ClaimConflict {
                        subsystem: *id,
                        owner,
                    });
                }
            }
        }

        // Second pass: reassign, collecting dispossessed owners
        let mut dispossessed = Vec::new();
        for id in requirements {
            if let Some(entry) = self.entries.get_mut(id.0 as usize) {
                if let Some(owner) = entry.owner {
                    if owner != requester && !dispossessed.contains(&owner) {
                        dispossessed.push(owner);
                    }
                }
                entry.owner = Some(requester);
            }
        }
        Ok(dispossessed)
    }

    /// Release every subsystem still owned by `owner`, returning the freed ids
    pub fn release(&mut self, owner: CommandId) -> Vec<SubsystemId> {
        let mut freed = Vec::new();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if entry.owner == Some(owner) {
                entry.owner = None;
                freed.push(SubsystemId(i as u32));
            }
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[&str]) -> (SubsystemRegistry, Vec<SubsystemId>) {
        let mut registry = SubsystemRegistry::new();
        let ids = names
            .iter()
            .map(|n| registry.register(n).unwrap())
            .collect();
        (registry, ids)
    }

    #[test]
    fn test_register_and_lookup() {
        let (registry, ids) = registry_with(&["drivetrain", "arm"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name(ids[0]), "drivetrain");
        assert_eq!(registry.name(ids[1]), "arm");
        assert!(registry.contains(ids[1]));
        assert_eq!(registry.owner(ids[0]), None);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = SubsystemRegistry::new();
        registry.register("drivetrain").unwrap();
        assert!(registry.register("drivetrain").is_err());
    }

    #[test]
    fn test_claim_free_subsystems() {
        let (mut registry, ids) = registry_with(&["drivetrain", "arm"]);
        let cmd = CommandId(1);

        let dispossessed = registry.try_claim(cmd, &ids, &|_| false).unwrap();
        assert!(dispossessed.is_empty());
        assert_eq!(registry.owner(ids[0]), Some(cmd));
        assert_eq!(registry.owner(ids[1]), Some(cmd));
        assert_eq!(registry.owned_by(cmd), ids);
    }

    #[test]
    fn test_claim_preempts_interruptible_owner() {
        let (mut registry, ids) = registry_with(&["drivetrain"]);
        let old = CommandId(1);
        let new = CommandId(2);

        registry.try_claim(old, &ids, &|_| false).unwrap();
        let dispossessed = registry.try_claim(new, &ids, &|_| true).unwrap();

        assert_eq!(dispossessed, vec![old]);
        assert_eq!(registry.owner(ids[0]), Some(new));
    }

    #[test]
    fn test_claim_is_all_or_nothing() {
        let (mut registry, ids) = registry_with(&["drivetrain", "arm"]);
        let holder = CommandId(1);
        let requester = CommandId(2);

        // holder owns only the arm, non-interruptibly
        registry.try_claim(holder, &ids[1..], &|_| false).unwrap();

        let conflict = registry
            .try_claim(requester, &ids, &|_| false)
            .unwrap_err();
        assert_eq!(conflict.subsystem, ids[1]);
        assert_eq!(conflict.owner, holder);
        // the free subsystem must not have been partially claimed
        assert_eq!(registry.owner(ids[0]), None);
        assert_eq!(registry.owner(ids[1]), Some(holder));
    }

    #[test]
    fn test_reclaim_by_same_owner_is_not_a_conflict() {
        let (mut registry, ids) = registry_with(&["drivetrain"]);
        let cmd = CommandId(1);

        registry.try_claim(cmd, &ids, &|_| false).unwrap();
        let dispossessed = registry.try_claim(cmd, &ids, &|_| false).unwrap();
        assert!(dispossessed.is_empty());
        assert_eq!(registry.owner(ids[0]), Some(cmd));
    }

    #[test]
    fn test_release_frees_only_owned() {
        let (mut registry, ids) = registry_with(&["drivetrain", "arm", "winch"]);
        let a = CommandId(1);
        let b = CommandId(2);

        registry.try_claim(a, &ids[..2], &|_| false).unwrap();
        registry.try_claim(b, &ids[2..], &|_| false).unwrap();

        let freed = registry.release(a);
        assert_eq!(freed, vec![ids[0], ids[1]]);
        assert_eq!(registry.owner(ids[2]), Some(b));
    }

    #[test]
    fn test_dispossessed_owner_deduplicated() {
        let (mut registry, ids) = registry_with(&["drivetrain", "arm"]);
        let old = CommandId(1);
        let new = CommandId(2);

        registry.try_claim(old, &ids, &|_| false).unwrap();
        let dispossessed = registry.try_claim(new, &ids, &|_| true).unwrap();
        assert_eq!(dispossessed, vec![old]);
    }
}
