/// Options that control how introspection behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectOptions {
    /// Namespace whose tables are captured.
    pub schema: String,
    pub include_indexes: bool,
    pub include_comments: bool,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            include_indexes: true,
            include_comments: true,
        }
    }
}

impl IntrospectOptions {
    pub fn for_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }
}
