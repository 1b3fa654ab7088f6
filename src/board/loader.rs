//! Board loading
//!
//! Boards come from outside the engine: either a JSON document describing
//! the board directly, or a question bank from which one clue per
//! (category, value) bucket is drawn at random. Parsing spreadsheets into a
//! question bank is left to the caller; this module only consumes
//! already-typed [`BankEntry`] rows.
//!
//! Loading never falls back on its own. Callers decide whether a failure
//! means "use the sample board" via [`load_or_sample`].

use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Board, Category, Clue};
use crate::constants::board::DEFAULT_SAMPLED_VALUES;

/// Category used for bank entries that name none
const FALLBACK_CATEGORY: &str = "General";

/// Number of empty choices given to placeholder clues
const PLACEHOLDER_CHOICE_COUNT: usize = 4;

/// Errors that can occur while loading a board
#[derive(Error, Debug)]
pub enum LoadError {
    /// The board file could not be read
    #[error("could not read board: {0}")]
    Io(#[from] std::io::Error),
    /// The board document is not valid JSON or has the wrong shape
    #[error("malformed board document: {0}")]
    Json(#[from] serde_json::Error),
    /// The board parsed but breaks a structural rule
    #[error("board failed validation: {0}")]
    Invalid(garde::Report),
    /// The question bank has no usable entries
    #[error("question bank contains no questions")]
    NoQuestions,
    /// Every question in a bucket was already used and reuse is disallowed
    #[error("no unused question left for {category} {value}")]
    Exhausted {
        /// Category of the exhausted bucket
        category: String,
        /// Point value of the exhausted bucket
        value: u32,
    },
}

/// Validates a board, handing it back unchanged on success
///
/// # Errors
///
/// Returns [`LoadError::Invalid`] if the board breaks any structural rule.
pub fn validated(board: Board) -> Result<Board, LoadError> {
    board.validate().map_err(LoadError::Invalid)?;
    Ok(board)
}

/// Parses and validates a board from a JSON string
///
/// # Errors
///
/// Returns [`LoadError::Json`] on malformed input and
/// [`LoadError::Invalid`] if the board breaks a structural rule.
pub fn from_json_str(json: &str) -> Result<Board, LoadError> {
    validated(serde_json::from_str(json)?)
}

/// Parses and validates a board from a JSON reader
///
/// # Errors
///
/// Returns [`LoadError::Json`] on malformed input and
/// [`LoadError::Invalid`] if the board breaks a structural rule.
pub fn from_json_reader<R: Read>(reader: R) -> Result<Board, LoadError> {
    validated(serde_json::from_reader(reader)?)
}

/// Parses and validates a board from a JSON file
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be opened, otherwise the
/// same errors as [`from_json_reader`].
pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Board, LoadError> {
    let file = File::open(path)?;
    from_json_reader(BufReader::new(file))
}

/// Substitutes the sample board for a failed load
pub fn load_or_sample(result: Result<Board, LoadError>) -> Board {
    result.unwrap_or_else(|e| {
        log::warn!("falling back to the sample board: {e}");
        Board::sample()
    })
}

/// One question of a question bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEntry {
    /// Stable identifier used to track which questions were already played
    pub id: u64,
    /// Category the question belongs to
    #[serde(default)]
    pub category: String,
    /// Point value bucket of the question
    pub value: u32,
    /// The question text
    #[serde(default)]
    pub question: String,
    /// Answer choices in display order
    #[serde(default)]
    pub choices: Vec<String>,
    /// Zero-based index of the correct choice
    #[serde(default)]
    pub answer: usize,
    /// Image file name, if the question has one
    #[serde(default)]
    pub image: Option<String>,
}

impl BankEntry {
    /// The category name after trimming, or the fallback name when blank
    fn category_name(&self) -> &str {
        match self.category.trim() {
            "" => FALLBACK_CATEGORY,
            name => name,
        }
    }

    /// Whether any of the choices has text
    fn has_choices(&self) -> bool {
        self.choices.iter().any(|c| !c.trim().is_empty())
    }

    fn to_clue(&self, reused: bool) -> Clue {
        Clue {
            value: self.value,
            question: self.question.trim().to_owned(),
            choices: self.choices.iter().map(|c| c.trim().to_owned()).collect_vec(),
            answer: self.answer,
            image: self
                .image
                .as_deref()
                .map(str::trim)
                .filter(|i| !i.is_empty())
                .map(str::to_owned),
            reused,
            unavailable: false,
        }
    }
}

/// What to do when every question in a bucket has already been used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReusePolicy {
    /// Draw an already used question again and flag the clue as reused
    #[default]
    Reuse,
    /// Treat the bucket as empty and put a placeholder clue in its place
    Placeholder,
    /// Refuse to build the board
    Fail,
}

/// Options for drawing a board from a question bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingOptions {
    /// Point values drawn for every category, in row order
    pub values_per_category: Vec<u32>,
    /// Behaviour for buckets whose questions were all used before
    pub reuse: ReusePolicy,
    /// Seed for reproducible draws
    pub seed: Option<u64>,
    /// Folder holding the bank's images
    pub image_folder: Option<String>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            values_per_category: DEFAULT_SAMPLED_VALUES.to_vec(),
            reuse: ReusePolicy::default(),
            seed: None,
            image_folder: None,
        }
    }
}

/// A board drawn from a question bank
#[derive(Debug, Clone)]
pub struct SampledBoard {
    /// The validated board
    pub board: Board,
    /// Identifiers drawn fresh for this board, to be appended to the
    /// caller's record of used questions
    pub drawn_ids: Vec<u64>,
}

/// Draws one question per (category, value) bucket from a question bank
///
/// Categories appear in name order. Questions whose identifier is in
/// `used_ids` are only drawn when a bucket has nothing fresh left, and
/// then only as `options.reuse` allows. Buckets with no questions at all
/// get a placeholder clue flagged as unavailable.
///
/// Every distinct category in the bank becomes a column, so a bank with
/// more than [`MAX_CATEGORY_COUNT`](crate::constants::board::MAX_CATEGORY_COUNT)
/// categories is rejected as invalid rather than truncated.
///
/// # Errors
///
/// Returns [`LoadError::NoQuestions`] for an empty bank,
/// [`LoadError::Exhausted`] when a bucket is used up under
/// [`ReusePolicy::Fail`], and [`LoadError::Invalid`] if the drawn board
/// breaks a structural rule.
pub fn sample_board(
    bank: &[BankEntry],
    used_ids: &HashSet<u64>,
    options: &SamplingOptions,
) -> Result<SampledBoard, LoadError> {
    let buckets: HashMap<(&str, u32), Vec<&BankEntry>> = bank
        .iter()
        .into_group_map_by(|entry| (entry.category_name(), entry.value));

    let category_names = buckets.keys().map(|(name, _)| *name).unique().sorted().collect_vec();

    if category_names.is_empty() {
        return Err(LoadError::NoQuestions);
    }

    let mut rng = options
        .seed
        .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
    let mut used = used_ids.clone();
    let mut drawn_ids = Vec::new();
    let mut categories = Vec::with_capacity(category_names.len());

    for name in category_names {
        let mut clues = Vec::with_capacity(options.values_per_category.len());

        for &value in &options.values_per_category {
            let pool = buckets.get(&(name, value)).map_or(&[][..], Vec::as_slice);
            let fresh = pool.iter().filter(|e| !used.contains(&e.id)).collect_vec();

            let clue = if !fresh.is_empty() {
                let entry = fresh[rng.usize(..fresh.len())];
                if entry.has_choices() {
                    used.insert(entry.id);
                    drawn_ids.push(entry.id);
                }
                entry.to_clue(false)
            } else if pool.is_empty() {
                placeholder(name, value)
            } else {
                match options.reuse {
                    ReusePolicy::Reuse => {
                        log::debug!("reusing a question for {name} {value}");
                        pool[rng.usize(..pool.len())].to_clue(true)
                    }
                    ReusePolicy::Placeholder => placeholder(name, value),
                    ReusePolicy::Fail => {
                        return Err(LoadError::Exhausted {
                            category: name.to_owned(),
                            value,
                        });
                    }
                }
            };

            clues.push(clue);
        }

        categories.push(Category {
            name: name.to_owned(),
            clues,
        });
    }

    let board = validated(Board {
        categories,
        image_folder: options.image_folder.clone(),
    })?;

    log::info!(
        "sampled a board of {} tiles ({} fresh questions)",
        board.tile_count(),
        drawn_ids.len()
    );

    Ok(SampledBoard { board, drawn_ids })
}

/// A clue standing in for a bucket with nothing to draw
fn placeholder(category: &str, value: u32) -> Clue {
    Clue {
        value,
        question: format!("(no question available for {category} {value})"),
        choices: vec![String::new(); PLACEHOLDER_CHOICE_COUNT],
        answer: 0,
        image: None,
        reused: false,
        unavailable: true,
    }
}
