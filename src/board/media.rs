//! Image references attached to clues
//!
//! A clue only names its image file. Where that file lives is a property of
//! the board it was loaded with, so the two halves are joined into an
//! [`ImageRef`] when a question opens.

use serde::{Deserialize, Serialize};

/// A resolved image for an open question
///
/// The transport layer serves `folder/file` from wherever it keeps
/// uploaded question media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Folder the board's images were loaded from
    pub folder: String,
    /// File name of the image within the folder
    pub file: String,
}

impl ImageRef {
    /// Joins a board's image folder with a clue's image name
    ///
    /// Both halves must be present and non-blank, otherwise the clue is
    /// shown without an image.
    pub fn resolve(folder: Option<&str>, file: Option<&str>) -> Option<Self> {
        let folder = folder.map(str::trim).filter(|f| !f.is_empty())?;
        let file = file.map(str::trim).filter(|f| !f.is_empty())?;

        Some(Self {
            folder: folder.to_owned(),
            file: file.to_owned(),
        })
    }
}
