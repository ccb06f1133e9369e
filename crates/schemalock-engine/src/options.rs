/// Options for `load` and `drop`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Skip the confirmation prompt before dropping existing tables.
    pub assume_yes: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeedImportOptions {
    /// Empty every seeded table before inserting.
    pub truncate: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Rows per table; `None` means unbounded.
    pub record_limit: Option<u64>,
    /// Raw SQL condition applied to every table.
    pub filter: Option<String>,
    pub excluded_tables: Vec<String>,
}

impl GenerateOptions {
    pub fn is_excluded(&self, table: &str) -> bool {
        self.excluded_tables.iter().any(|excluded| excluded == table)
    }
}
