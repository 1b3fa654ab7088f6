//! Board data model
//!
//! A board is an ordered list of categories, each holding an ordered list of
//! clues. Boards are fixed once loaded: a round never edits a clue, it only
//! records which tiles have been resolved, and that bookkeeping lives in
//! [`crate::game::GameSession`]. This module also defines the tile
//! coordinate used to address a clue and the terminal statuses a tile can
//! reach.

pub mod loader;
pub mod media;
mod sample;

use std::{fmt::Display, num::ParseIntError, str::FromStr};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay, skip_serializing_none};
use thiserror::Error;

use crate::constants::board::{
    MAX_CATEGORY_COUNT, MAX_CATEGORY_NAME_LENGTH, MAX_CHOICE_COUNT, MAX_CLUE_COUNT,
    MAX_IMAGE_NAME_LENGTH, MAX_QUESTION_LENGTH,
};

/// A complete board of categories and clues
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Board {
    /// Categories in display order
    #[garde(length(min = 1, max = MAX_CATEGORY_COUNT), dive)]
    pub categories: Vec<Category>,
    /// Folder holding the images referenced by this board's clues
    #[garde(skip)]
    #[serde(default)]
    pub image_folder: Option<String>,
}

/// A named column of clues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Category {
    /// Category title shown above its column
    #[garde(length(min = 1, max = MAX_CATEGORY_NAME_LENGTH))]
    pub name: String,
    /// Clues from top to bottom
    #[garde(length(min = 1, max = MAX_CLUE_COUNT), dive)]
    pub clues: Vec<Clue>,
}

/// A single question on the board
///
/// A clue with no choices is free-response: the moderator judges the
/// answer and `answer` is ignored.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Clue {
    /// Points won for a correct answer and lost for a wrong one
    #[garde(range(min = 1))]
    pub value: u32,
    /// The question text
    #[garde(length(max = MAX_QUESTION_LENGTH))]
    pub question: String,
    /// Answer choices in display order
    #[garde(length(max = MAX_CHOICE_COUNT), inner(length(max = MAX_QUESTION_LENGTH)))]
    #[serde(default)]
    pub choices: Vec<String>,
    /// Zero-based index of the correct choice
    #[garde(custom(answer_within(&self.choices)))]
    #[serde(default)]
    pub answer: usize,
    /// Image file name, resolved against [`Board::image_folder`]
    #[garde(length(max = MAX_IMAGE_NAME_LENGTH))]
    #[serde(default)]
    pub image: Option<String>,
    /// Set when the sampler had to repeat an already used question
    #[garde(skip)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reused: bool,
    /// Set on placeholder clues standing in for an empty bucket
    #[garde(skip)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unavailable: bool,
}

/// Checks that the correct answer points at one of the choices
fn answer_within(choices: &[String]) -> impl FnOnce(&usize, &()) -> garde::Result + '_ {
    move |answer, _| {
        if choices.is_empty() || *answer < choices.len() {
            Ok(())
        } else {
            Err(garde::Error::new(format!(
                "answer {answer} is outside of the {} choices",
                choices.len()
            )))
        }
    }
}

impl Clue {
    /// Creates a multiple choice clue
    pub fn new(value: u32, question: &str, choices: &[&str], answer: usize) -> Self {
        Self {
            value,
            question: question.to_owned(),
            choices: choices.iter().map(|&c| c.to_owned()).collect_vec(),
            answer,
            image: None,
            reused: false,
            unavailable: false,
        }
    }

    /// Whether the clue is judged by the moderator rather than by choice index
    pub fn is_free_response(&self) -> bool {
        self.choices.is_empty()
    }
}

impl Board {
    /// Returns the built-in sample board
    ///
    /// Used whenever no board was supplied or the supplied one failed to
    /// load.
    pub fn sample() -> Self {
        sample::board().clone()
    }

    /// Looks up the clue at a tile coordinate
    pub fn clue(&self, tile: TileId) -> Option<&Clue> {
        self.categories
            .get(tile.category)
            .and_then(|category| category.clues.get(tile.clue))
    }

    /// Looks up the category a tile belongs to
    pub fn category(&self, tile: TileId) -> Option<&Category> {
        self.categories.get(tile.category)
    }

    /// Iterates over every tile coordinate on the board
    pub fn tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        self.categories
            .iter()
            .enumerate()
            .flat_map(|(category, c)| (0..c.clues.len()).map(move |clue| TileId { category, clue }))
    }

    /// Total number of tiles on the board
    pub fn tile_count(&self) -> usize {
        self.categories.iter().map(|c| c.clues.len()).sum()
    }
}

/// The stable coordinate of a tile: `(category index, clue index)`
///
/// Serialized as `"category,clue"` so it can key a JSON object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct TileId {
    /// Index of the category (column)
    pub category: usize,
    /// Index of the clue within its category (row)
    pub clue: usize,
}

impl TileId {
    /// Creates a tile coordinate
    pub fn new(category: usize, clue: usize) -> Self {
        Self { category, clue }
    }
}

impl Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.category, self.clue)
    }
}

/// Errors from parsing a `"category,clue"` coordinate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseTileIdError {
    /// The text has no comma separator
    #[error("tile coordinate is missing a comma")]
    MissingSeparator,
    /// One of the halves is not an index
    #[error("invalid tile index: {0}")]
    Index(#[from] ParseIntError),
}

impl FromStr for TileId {
    type Err = ParseTileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, clue) = s
            .split_once(',')
            .ok_or(ParseTileIdError::MissingSeparator)?;

        Ok(Self {
            category: category.trim().parse()?,
            clue: clue.trim().parse()?,
        })
    }
}

/// Terminal status of a resolved tile
///
/// Unopened tiles have no status at all. Once a tile reaches one of these
/// it can never be selected again until the game is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileStatus {
    /// A team answered the tile correctly
    Correct,
    /// Every team failed the tile
    Used,
}
