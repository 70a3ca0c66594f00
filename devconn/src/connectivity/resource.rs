//! In-memory downloadable documents

/// A named document served as an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl Resource {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Content as text, empty when not valid UTF-8
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.content).unwrap_or_default()
    }
}
