use credline_core::Delimiters;

/// Configuration for one import run.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Institution token matched against raw affiliations
    pub institution: String,
    /// Splitting rules for the author columns
    pub delimiters: Delimiters,
    /// Prefix the report artifact with a UTF-8 BOM
    pub report_bom: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            institution: "innopolis".to_string(),
            delimiters: Delimiters::default(),
            report_bom: true,
        }
    }
}
