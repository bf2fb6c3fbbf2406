use tracing::{debug, info, warn};

use crate::core::mac::MacAddress;
use crate::core::registry::HostRegistry;
use crate::core::vm::{ComputeNode, VirtualMachine};
use crate::errors::DriverError;

impl VirtualMachine {
    /// Hardware address of the machine's primary adapter, asked from the
    /// driver every time. `None` when there is no adapter, the adapter has no
    /// address, or the owning host has gone away.
    pub async fn mac_address(&self) -> Result<Option<MacAddress>, DriverError> {
        let Some(host) = self.host() else {
            debug!(host = %self.host_name(), machine = %self.name(), "Host dropped, no MAC to fetch");
            return Ok(None);
        };
        let raw = host
            .driver()
            .mac_address(host.connection(), self.name())
            .await?;

        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => match raw.parse::<MacAddress>() {
                Ok(mac) => Ok(Some(mac)),
                Err(e) => {
                    warn!(host = %self.host_name(), machine = %self.name(), error = %e, "Driver reported an unusable MAC address");
                    Ok(None)
                }
            },
        }
    }
}

/// A node whose lookup failed during a MAC scan.
#[derive(Debug)]
pub struct NodeFailure<'n> {
    pub node: &'n ComputeNode,
    pub error: DriverError,
}

/// Outcome of scanning nodes for a MAC address.
#[derive(Debug)]
pub struct MacScan<'n> {
    pub matched: Option<&'n ComputeNode>,
    /// Nodes that could not be checked. The scan carried on past them.
    pub failures: Vec<NodeFailure<'n>>,
}

/// Whether a node's machine really carries the address the node declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityCheck {
    Confirmed,
    Mismatch { actual: Option<MacAddress> },
    /// The node's host or machine could not be resolved.
    Unresolved,
    /// The node declares no address, so there is nothing to compare.
    NotDeclared,
}

impl HostRegistry {
    /// Walks `nodes` in the order given, resolving each node's machine and
    /// comparing its MAC against `target`. Stops at the first match.
    ///
    /// A freshly booted machine only knows its own MAC, so every node has to
    /// be considered. One node failing (host down, timeout) is recorded and
    /// skipped rather than ending the scan.
    pub async fn scan_nodes_by_mac<'n>(
        &self,
        nodes: &'n [ComputeNode],
        target: &MacAddress,
    ) -> MacScan<'n> {
        info!(mac = %target, nodes = nodes.len(), "Searching compute node by MAC address");
        let mut failures = Vec::new();

        for node in nodes {
            match self.node_mac_address(node).await {
                Ok(Some(mac)) => {
                    debug!(node = %node.name, mac = %mac, "MAC address of node");
                    if mac == *target {
                        info!(node = %node.name, mac = %target, "Found compute node for MAC address");
                        return MacScan {
                            matched: Some(node),
                            failures,
                        };
                    }
                }
                Ok(None) => {
                    debug!(node = %node.name, "Node has no resolvable MAC address");
                }
                Err(error) => {
                    warn!(
                        node = %node.name,
                        host = %node.host_name,
                        error = %error,
                        "MAC lookup failed for node, continuing scan"
                    );
                    failures.push(NodeFailure { node, error });
                }
            }
        }

        info!(mac = %target, failed = failures.len(), "No compute node matches MAC address");
        MacScan {
            matched: None,
            failures,
        }
    }

    pub async fn find_node_by_mac<'n>(
        &self,
        nodes: &'n [ComputeNode],
        target: &MacAddress,
    ) -> Option<&'n ComputeNode> {
        self.scan_nodes_by_mac(nodes, target).await.matched
    }

    /// Compares the node's declared address with what its machine reports.
    pub async fn verify_binding(&self, node: &ComputeNode) -> Result<IdentityCheck, DriverError> {
        let Some(expected) = node.mac_address else {
            return Ok(IdentityCheck::NotDeclared);
        };
        let Some(vm) = self.resolve(&node.host_name, &node.virtual_machine_name).await? else {
            return Ok(IdentityCheck::Unresolved);
        };
        let actual = vm.mac_address().await?;
        if actual == Some(expected) {
            Ok(IdentityCheck::Confirmed)
        } else {
            warn!(node = %node.name, expected = %expected, "Machine does not carry the declared MAC address");
            Ok(IdentityCheck::Mismatch { actual })
        }
    }

    async fn node_mac_address(&self, node: &ComputeNode) -> Result<Option<MacAddress>, DriverError> {
        match self.resolve(&node.host_name, &node.virtual_machine_name).await? {
            Some(vm) => vm.mac_address().await,
            None => Ok(None),
        }
    }
}
