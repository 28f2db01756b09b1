/// Contains Config properties which will be used by a Factory
#[derive(Clone, Debug)]
pub struct FactoryConfig {
    /// Whether `create()` runs a registry-wide reference pass after building
    /// a root, so references between siblings in the new tree are linked
    /// before the call returns
    pub resolve_references_on_create: bool,
    /// Whether reference syncs that fail to resolve are queued and retried
    /// as soon as a component with one of the missing gids is registered
    pub auto_resolve_references: bool,
    /// Whether roots built by `create()` start active. When false a root is
    /// created disabled and activates on `set_enabled(true)`
    pub activate_roots: bool,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            resolve_references_on_create: true,
            auto_resolve_references: true,
            activate_roots: true,
        }
    }
}
