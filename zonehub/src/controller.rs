//! Controller handles.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use zonehub_topology::{Group, GroupId};

use crate::invoker::{ActionInvoker, InvokeError};

/// A handle on one playback group, addressed through its coordinator.
///
/// Controllers are cheap snapshots taken from a topology; after
/// [`Network::clear_topology`](crate::Network::clear_topology) they may name
/// a coordinator that no longer leads its group, so ask the directory for
/// fresh ones rather than holding these long-term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controller {
    pub address: Ipv4Addr,
    pub room: String,
    pub group: GroupId,
}

impl Controller {
    pub(crate) fn for_group(group: &Group) -> Self {
        let coordinator = group.coordinator();
        Self {
            address: coordinator.address,
            room: coordinator.room.clone(),
            group: group.id().clone(),
        }
    }

    /// Route an action to this controller's coordinator.
    pub fn send(
        &self,
        invoker: &dyn ActionInvoker,
        service: &str,
        action: &str,
        arguments: &[(&str, &str)],
    ) -> Result<HashMap<String, String>, InvokeError> {
        invoker.invoke(self.address, service, action, arguments)
    }
}
