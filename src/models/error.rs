use derive_more::Display;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum SError {
    #[display("I/O error: {_0}")]
    IOError(String),
    #[display("Parse error: {_0}")]
    ParseError(String),
    #[display("Archive error: {_0}")]
    ArchiveError(String),
    #[display("File or directory not found: {_0}")]
    FileOrDirectoryNotFound(String),
    #[display("Path is not valid UTF-8: {_0}")]
    InvalidPath(String),
    #[display("An entry named '{_0}' already exists")]
    NameCollision(String),
    #[display("Name must not be empty")]
    EmptyName,
    #[display("'{_0}' is not a valid folder name")]
    InvalidName(String),
    #[display("New name is the same as the current name")]
    UnchangedName,
    #[display("Nothing was selected")]
    EmptySelection,
    #[display("No entry named '{_0}'")]
    EntryNotFound(String),
    #[display("Index {_0} is out of range")]
    IndexOutOfRange(usize),
    #[display("Input closed")]
    InputClosed,
    #[display("Configuration error: {_0}")]
    ConfigError(String),
    #[display("Unexpected error: {_0}")]
    Unexpected(String),
}

impl std::error::Error for SError {}

impl From<std::io::Error> for SError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => SError::FileOrDirectoryNotFound(e.to_string()),
            _ => SError::IOError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for SError {
    fn from(e: serde_json::Error) -> Self {
        SError::ParseError(e.to_string())
    }
}

impl From<zip::result::ZipError> for SError {
    fn from(e: zip::result::ZipError) -> Self {
        SError::ArchiveError(e.to_string())
    }
}

impl From<walkdir::Error> for SError {
    fn from(e: walkdir::Error) -> Self {
        SError::IOError(e.to_string())
    }
}

impl From<std::path::StripPrefixError> for SError {
    fn from(e: std::path::StripPrefixError) -> Self {
        SError::Unexpected(e.to_string())
    }
}

impl From<camino::FromPathBufError> for SError {
    fn from(e: camino::FromPathBufError) -> Self {
        SError::InvalidPath(e.into_path_buf().display().to_string())
    }
}

impl From<confy::ConfyError> for SError {
    fn from(e: confy::ConfyError) -> Self {
        SError::ConfigError(e.to_string())
    }
}
