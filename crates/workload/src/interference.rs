//! Cross-machine performance interference model
//!
//! Machines that share a group degrade each other once the group's combined
//! load crosses the group's target ratio. A machine may belong to any number
//! of groups; its profile carries all of them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A set of virtual machines that interfere with each other
#[derive(Debug, Clone, PartialEq)]
pub struct InterferenceGroup {
    /// Names of the member machines
    pub members: HashSet<String>,
    /// Load threshold above which the group degrades
    pub target_ratio: f64,
    /// Performance score applied while the group is saturated
    pub score: f64,
}

/// All interference groups of a trace plus a per-machine membership index
#[derive(Debug, Clone, Default)]
pub struct InterferenceModel {
    groups: Arc<Vec<InterferenceGroup>>,
    membership: HashMap<String, Vec<usize>>,
}

impl InterferenceModel {
    /// Start building a model
    pub fn builder() -> InterferenceModelBuilder {
        InterferenceModelBuilder::default()
    }

    /// The interference profile of the given machine, if it belongs to any group
    pub fn profile_for(&self, id: &str) -> Option<InterferenceProfile> {
        self.membership.get(id).map(|indices| InterferenceProfile {
            groups: Arc::clone(&self.groups),
            membership: indices.clone(),
        })
    }

    /// Number of groups in the model
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the model holds no groups
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Builder for [`InterferenceModel`]
#[derive(Debug, Default)]
pub struct InterferenceModelBuilder {
    groups: Vec<InterferenceGroup>,
}

impl InterferenceModelBuilder {
    /// Record one interference group
    pub fn add_group(&mut self, members: HashSet<String>, target_ratio: f64, score: f64) {
        self.groups.push(InterferenceGroup {
            members,
            target_ratio,
            score,
        });
    }

    /// Finalize the model and derive the membership index
    pub fn build(self) -> InterferenceModel {
        let mut membership: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, group) in self.groups.iter().enumerate() {
            for member in &group.members {
                membership.entry(member.clone()).or_default().push(index);
            }
        }

        InterferenceModel {
            groups: Arc::new(self.groups),
            membership,
        }
    }
}

/// The groups one virtual machine is a member of
///
/// Shares the model's group table; cloning a profile is cheap.
#[derive(Debug, Clone)]
pub struct InterferenceProfile {
    groups: Arc<Vec<InterferenceGroup>>,
    membership: Vec<usize>,
}

impl InterferenceProfile {
    /// Iterate over the groups this machine belongs to
    pub fn groups(&self) -> impl Iterator<Item = &InterferenceGroup> {
        self.membership.iter().map(|&index| &self.groups[index])
    }

    /// Number of groups this machine belongs to
    pub fn group_count(&self) -> usize {
        self.membership.len()
    }
}

impl PartialEq for InterferenceProfile {
    fn eq(&self, other: &Self) -> bool {
        self.groups().eq(other.groups())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn machine_outside_every_group_has_no_profile() {
        let mut builder = InterferenceModel::builder();
        builder.add_group(members(&["vm-a", "vm-b"]), 0.8, 0.9);
        let model = builder.build();

        assert!(model.profile_for("vm-c").is_none());
    }

    #[test]
    fn profile_carries_the_machines_groups() {
        let mut builder = InterferenceModel::builder();
        builder.add_group(members(&["vm-a", "vm-b"]), 0.8, 0.9);
        builder.add_group(members(&["vm-b", "vm-c"]), 0.5, 0.7);
        let model = builder.build();

        let profile = model.profile_for("vm-a").unwrap();
        assert_eq!(profile.group_count(), 1);
        assert_eq!(profile.groups().next().unwrap().score, 0.9);
    }

    #[test]
    fn membership_in_several_groups_is_preserved() {
        // Which group "wins" is the consumer's policy; the model only
        // guarantees that every membership is visible.
        let mut builder = InterferenceModel::builder();
        builder.add_group(members(&["vm-a", "vm-b"]), 0.8, 0.9);
        builder.add_group(members(&["vm-b", "vm-c"]), 0.5, 0.7);
        let model = builder.build();

        let profile = model.profile_for("vm-b").unwrap();
        assert_eq!(profile.group_count(), 2);
        let targets: Vec<f64> = profile.groups().map(|g| g.target_ratio).collect();
        assert_eq!(targets, [0.8, 0.5]);
    }

    #[test]
    fn empty_model_yields_no_profiles() {
        let model = InterferenceModel::builder().build();
        assert!(model.is_empty());
        assert!(model.profile_for("vm-a").is_none());
    }
}
