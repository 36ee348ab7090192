use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum AsmError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid configuration in {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A fatal diagnostic was reported; the run cannot continue.
    #[error("{0}")]
    Fatal(String),
}
