// adapters.rs — Tool-name to adapter-URL routing.
//
// The map is fixed at construction and read lock-free. Adapters are
// opaque HTTP endpoints; the gateway never inspects what they return.

use std::collections::HashMap;

/// Immutable mapping from tool name to adapter base URL.
#[derive(Debug, Clone, Default)]
pub struct AdapterRouter {
    routes: HashMap<String, String>,
}

impl AdapterRouter {
    pub fn new(routes: HashMap<String, String>) -> Self {
        Self { routes }
    }

    /// Base URL for a tool, if an adapter is configured.
    pub fn resolve(&self, tool: &str) -> Option<&str> {
        self.routes.get(tool).map(String::as_str)
    }

    /// Number of configured adapters.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Target URL for an action: `<base>/<action>`, with at most one
    /// trailing slash trimmed from the base.
    pub fn target_url(base: &str, action: &str) -> String {
        let base = base.strip_suffix('/').unwrap_or(base);
        format!("{}/{}", base, action)
    }
}
