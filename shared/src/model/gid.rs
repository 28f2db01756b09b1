use std::fmt;

/// Global identity of a model node. Runtime components are registered
/// under the gid of the node they mirror.
#[derive(PartialEq, Eq, Hash, Clone, Debug, PartialOrd, Ord)]
pub struct Gid(String);

impl Gid {
    pub fn new(value: impl Into<String>) -> Self {
        Gid(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Gid {
    fn from(value: &str) -> Self {
        Gid(value.to_string())
    }
}

impl From<String> for Gid {
    fn from(value: String) -> Self {
        Gid(value)
    }
}
