//! Configuration constants for the Painani game system
//!
//! This module contains all the limits and fixed values used throughout
//! the game engine, from the team count bounds to the board size limits
//! enforced when a board is validated.

/// Team roster configuration constants
pub mod teams {
    /// Fewest teams a session can be configured with
    pub const MIN_COUNT: usize = 2;
    /// Most teams a session can be configured with
    pub const MAX_COUNT: usize = 10;
    /// Number of teams a fresh session starts with
    pub const DEFAULT_COUNT: usize = 5;
}

/// Answer timer configuration constants
pub mod timer {
    use web_time::Duration;

    /// Time a team holding the buzzer has to answer before the transport
    /// layer is expected to trigger a timeout
    pub const ANSWER_TIME_LIMIT: Duration = Duration::from_secs(10);
}

/// Board configuration constants
pub mod board {
    /// Maximum number of categories on a single board, sampled boards included
    pub const MAX_CATEGORY_COUNT: usize = 50;
    /// Maximum number of clues within a single category
    pub const MAX_CLUE_COUNT: usize = 10;
    /// Maximum length of a category name in characters
    pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
    /// Maximum length of a question text in characters
    pub const MAX_QUESTION_LENGTH: usize = 500;
    /// Maximum number of answer choices for a single clue
    pub const MAX_CHOICE_COUNT: usize = 8;
    /// Maximum length of an image file name
    pub const MAX_IMAGE_NAME_LENGTH: usize = 255;
    /// Point values drawn for each category when sampling from a question bank
    pub const DEFAULT_SAMPLED_VALUES: [u32; 5] = [100, 200, 300, 400, 500];
}

/// Connection registry configuration constants
pub mod watchers {
    /// Maximum number of simultaneous connections to a single room
    pub const MAX_WATCHER_COUNT: usize = 200;
}
