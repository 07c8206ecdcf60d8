//! Navigation tree and the visibility filter applied to it.

use serde::{Deserialize, Serialize};

use crate::gates::Criteria;
use crate::permissions::{Permission, PermissionResolver};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNode {
    pub label: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_divisions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_grant: Option<Permission>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            required_roles: Vec::new(),
            required_divisions: Vec::new(),
            required_grant: None,
            children: Vec::new(),
        }
    }

    pub fn roles(mut self, roles: &[&str]) -> Self {
        self.required_roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn divisions(mut self, divisions: &[&str]) -> Self {
        self.required_divisions = divisions.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn grant(mut self, p: Permission) -> Self {
        self.required_grant = Some(p);
        self
    }

    pub fn children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool { self.children.is_empty() }

    fn criteria(&self) -> Criteria {
        Criteria { roles: self.required_roles.clone(), divisions: self.required_divisions.clone(), permission: self.required_grant }
    }

    /// Depth-first list of every path in the tree.
    pub fn paths(&self) -> Vec<&str> {
        let mut out = vec![self.path.as_str()];
        for c in &self.children { out.extend(c.paths()); }
        out
    }
}

/// Subset of `tree` visible to the resolver's identity, in original order.
///
/// A node whose own constraint fails is dropped with its whole subtree; its children
/// are never looked at. A node that passes but had children is dropped when none survive.
pub fn filter_menu(tree: &[MenuNode], resolver: &PermissionResolver) -> Vec<MenuNode> {
    tree.iter().filter_map(|node| filter_node(node, resolver)).collect()
}

fn filter_node(node: &MenuNode, resolver: &PermissionResolver) -> Option<MenuNode> {
    node.criteria().check(resolver, resolver.policy()).ok()?;
    if node.is_leaf() {
        return Some(node.clone());
    }
    let children = filter_menu(&node.children, resolver);
    if children.is_empty() {
        return None;
    }
    Some(MenuNode {
        label: node.label.clone(),
        path: node.path.clone(),
        required_roles: node.required_roles.clone(),
        required_divisions: node.required_divisions.clone(),
        required_grant: node.required_grant,
        children,
    })
}
