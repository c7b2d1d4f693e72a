/// Options for a save pipeline.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Include entity values in error messages and debug logs.
    pub sensitive_data_logging: bool,
    /// Joins the key values of a document identity.
    pub key_separator: char,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            sensitive_data_logging: false,
            key_separator: '|',
        }
    }
}
