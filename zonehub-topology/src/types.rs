//! Validated topology model.
//!
//! A [`Topology`] is only ever produced whole by the resolver, after the
//! one-coordinator-per-group invariant has been checked, so these types can
//! expose a coordinator on every group without a failure path.

use std::fmt;
use std::net::Ipv4Addr;

/// Identifier of a playback group.
///
/// For a device playing on its own this is the device's own uuid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One device's place in the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyEntry {
    pub address: Ipv4Addr,
    pub group: GroupId,
    pub coordinator: bool,
    pub room: String,
    pub uuid: String,
}

/// A playback group: one coordinator plus zero or more followers.
#[derive(Debug, Clone)]
pub struct Group {
    id: GroupId,
    coordinator: TopologyEntry,
    followers: Vec<TopologyEntry>,
}

impl Group {
    pub(crate) fn new(id: GroupId, coordinator: TopologyEntry, followers: Vec<TopologyEntry>) -> Self {
        Self {
            id,
            coordinator,
            followers,
        }
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    /// The entry that owns the group's queue and transport.
    pub fn coordinator(&self) -> &TopologyEntry {
        &self.coordinator
    }

    pub fn followers(&self) -> &[TopologyEntry] {
        &self.followers
    }

    /// All entries, coordinator first.
    pub fn entries(&self) -> impl Iterator<Item = &TopologyEntry> {
        std::iter::once(&self.coordinator).chain(self.followers.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.followers.len()
    }

    /// Always false. A group contains at least its coordinator.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A complete, validated snapshot of the network's group structure.
///
/// Snapshots are immutable; a change on the network is reflected by building
/// a fresh one, never by editing in place.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    groups: Vec<Group>,
}

impl Topology {
    pub(crate) fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn entries(&self) -> impl Iterator<Item = &TopologyEntry> {
        self.groups.iter().flat_map(Group::entries)
    }

    pub fn entry_at(&self, address: Ipv4Addr) -> Option<&TopologyEntry> {
        self.entries().find(|e| e.address == address)
    }

    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id() == id)
    }

    /// The group a given device belongs to.
    pub fn group_of(&self, address: Ipv4Addr) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.entries().any(|e| e.address == address))
    }
}
