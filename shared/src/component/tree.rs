use std::fmt;

use crate::model::Gid;

/// Snapshot of a component and its children, for debugging
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentTree {
    pub type_name: &'static str,
    pub gid: Gid,
    pub active: bool,
    pub edges: Vec<TreeEdge>,
}

/// Children reached through one sync. Referenced components are listed by
/// gid only, so cycles through references cannot recurse.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeEdge {
    Owned { path: String, children: Vec<ComponentTree> },
    References { path: String, gids: Vec<Gid> },
}

impl TreeEdge {
    pub(crate) fn owned(path: &str, children: Vec<ComponentTree>) -> Self {
        Self::Owned {
            path: path.to_string(),
            children,
        }
    }

    pub(crate) fn references(path: &str, gids: Vec<Gid>) -> Self {
        Self::References {
            path: path.to_string(),
            gids,
        }
    }
}

impl ComponentTree {
    /// Number of components in this tree, references excluded
    pub fn size(&self) -> usize {
        1 + self
            .edges
            .iter()
            .map(|edge| match edge {
                TreeEdge::Owned { children, .. } => children.iter().map(ComponentTree::size).sum(),
                TreeEdge::References { .. } => 0,
            })
            .sum::<usize>()
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        let state = if self.active { "" } else { " (inactive)" };
        writeln!(f, "{}{} {}{}", indent, self.type_name, self.gid, state)?;
        for edge in &self.edges {
            match edge {
                TreeEdge::Owned { path, children } => {
                    writeln!(f, "{}  .{}", indent, path)?;
                    for child in children {
                        child.write(f, depth + 2)?;
                    }
                }
                TreeEdge::References { path, gids } => {
                    let gids: Vec<&str> = gids.iter().map(Gid::as_str).collect();
                    writeln!(f, "{}  .{} -> [{}]", indent, path, gids.join(", "))?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, 0)
    }
}
