//! Statements and the identity under which prepared handles are cached.

/// Whether a statement's prepared handle may be reused across executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Prepare fresh on every execution and drop the handle afterwards.
    Uncached,
    /// Keep the prepared handle in the connection's statement cache, keyed
    /// by [`StatementKey`].
    StatementCache,
}

/// A SQL statement plus its caching intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Cache name. Empty for unnamed one-shot statements.
    pub name: String,
    /// The SQL source text.
    pub text: String,
    pub cache_mode: CacheMode,
}

impl Statement {
    /// An unnamed statement, prepared and executed once.
    pub fn one_shot(text: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            text: text.into(),
            cache_mode: CacheMode::Uncached,
        }
    }

    /// A named statement whose prepared handle is reused across executions
    /// on the same connection.
    pub fn cached(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            cache_mode: CacheMode::StatementCache,
        }
    }

    /// Cache identity: name and text together. Two statements with the same
    /// name but different text never share a prepared handle.
    #[must_use]
    pub fn key(&self) -> StatementKey {
        StatementKey {
            name: self.name.clone(),
            text: self.text.clone(),
        }
    }
}

/// Key under which a prepared handle is cached on a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementKey {
    name: String,
    text: String,
}
