//! Core game logic and state management
//!
//! This module contains [`GameSession`], the state machine behind a single
//! buzzer quiz game: which tile is open, which team holds the buzzer, who
//! already failed the open question, the score of every team, and which
//! tiles have been resolved.
//!
//! The session is a plain value. It never blocks, never reads the clock and
//! never talks to clients; whoever owns it must serialize calls to its
//! `&mut self` methods (see [`crate::room::Room`]). Every operation is
//! total: a rejected call returns an [`Error`] and leaves the session
//! exactly as it was.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::Debug,
};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::{
    board::{Board, Category, TileId, TileStatus, media::ImageRef},
    constants::teams,
};

/// Errors returned when an operation's preconditions are not met
///
/// None of these mutate the session; they are acknowledged to the caller
/// that made the request and to nobody else.
#[derive(Error, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The team index is not a team of this session
    #[error("invalid team index")]
    InvalidTeamIndex,
    /// The requested team count is not a number
    #[error("invalid team count")]
    InvalidCount,
    /// The requested score or score change is not a number
    #[error("invalid score")]
    InvalidScore,
    /// The operation needs an open question and there is none
    #[error("no active question")]
    NoActiveQuestion,
    /// The operation needs a team holding the buzzer and none does
    #[error("no team holds the buzzer")]
    NoActivePlayer,
    /// Another team already holds the buzzer
    #[error("another team is already answering")]
    BuzzerAlreadyHeld,
    /// The team already failed the open question
    #[error("this team already attempted the question")]
    TeamAlreadyAttempted,
    /// The team does not hold the buzzer
    #[error("not this team's turn")]
    NotYourTurn,
    /// The tile was already answered or used up
    #[error("tile already resolved")]
    TileAlreadyResolved,
    /// The tile coordinate is not on the board
    #[error("no such tile")]
    InvalidTile,
    /// A question is already open
    #[error("a question is already open")]
    QuestionInProgress,
}

/// Configuration options for a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Options {
    /// Number of competing teams
    #[garde(range(min = teams::MIN_COUNT, max = teams::MAX_COUNT))]
    pub team_count: usize,
    /// Whether choices are withheld from contestants so the moderator judges
    #[garde(skip)]
    pub hide_answers: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            team_count: teams::DEFAULT_COUNT,
            hide_answers: false,
        }
    }
}

/// The coarse state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No question is open and the board is selectable
    Idle,
    /// A question is open and any team that has not failed it may buzz
    Open,
    /// A team holds the buzzer and is expected to answer
    Buzzed,
}

/// The open question, copied off the board when it was opened
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveQuestion {
    /// Coordinate of the tile the question came from
    pub tile: TileId,
    /// Name of the tile's category
    pub category: String,
    /// Points at stake
    pub value: u32,
    /// The question text
    pub question: String,
    /// Answer choices in display order
    pub choices: Vec<String>,
    /// Zero-based index of the correct choice
    pub answer: usize,
    /// Image shown with the question
    pub image: Option<ImageRef>,
}

/// What clients are shown about the open question
///
/// Choices and answer are withheld from contestants in moderator-judged
/// mode.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// Coordinate of the tile the question came from
    pub tile: TileId,
    /// Name of the tile's category
    pub category: String,
    /// Points at stake
    pub value: u32,
    /// The question text
    pub question: String,
    /// Answer choices, if revealed
    pub choices: Option<Vec<String>>,
    /// Index of the correct choice, if revealed
    pub answer: Option<usize>,
    /// Image shown with the question
    pub image: Option<ImageRef>,
}

impl ActiveQuestion {
    /// Builds the client view, revealing choices and answer only if asked
    pub fn view(&self, reveal: bool) -> QuestionView {
        QuestionView {
            tile: self.tile,
            category: self.category.clone(),
            value: self.value,
            question: self.question.clone(),
            choices: reveal.then(|| self.choices.clone()),
            answer: reveal.then_some(self.answer),
            image: self.image.clone(),
        }
    }
}

/// Whether an attempt was right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The team answered correctly
    Correct,
    /// The team answered wrongly or ran out of time
    Incorrect,
}

/// The result of resolving an answer attempt
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    /// Whether the attempt was right
    pub result: Verdict,
    /// The team that attempted
    pub team: usize,
    /// The team's score after the attempt
    pub new_score: i64,
    /// The tile the question came from
    pub tile: TileId,
    /// Whether the question is now closed
    pub close_question: bool,
    /// For wrong answers, whether other teams may still buzz
    pub rebound: Option<bool>,
    /// Teams still allowed to buzz, on a rebound
    pub remaining_teams: Option<Vec<usize>>,
}

/// Full board state: the clues plus every resolved tile and all scores
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Categories and their clues
    pub categories: Vec<Category>,
    /// Folder holding the board's images
    pub image_folder: Option<String>,
    /// Status of every resolved tile; unopened tiles are absent
    pub tile_status: BTreeMap<TileId, TileStatus>,
    /// Score of every team
    pub scores: Vec<i64>,
    /// Number of teams
    pub team_count: usize,
}

/// Turn state: who holds the buzzer, who already failed, and the scores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Score of every team
    pub scores: Vec<i64>,
    /// Team holding the buzzer
    pub current_buzzer: Option<usize>,
    /// Teams that failed the open question, ascending
    pub tried_teams: Vec<usize>,
    /// Whether a team's answer countdown is running
    pub timer_active: bool,
    /// Whether choices are withheld from contestants
    pub hide_answers: bool,
    /// Whether a question is open
    pub has_question: bool,
    /// Number of teams
    pub team_count: usize,
}

/// A single buzzer quiz game
pub struct GameSession {
    /// The board being played
    board: Board,
    /// Score of every team; its length is the team count
    scores: Vec<i64>,
    /// Resolved tiles; a tile absent from the map is unopened
    tile_status: HashMap<TileId, TileStatus>,
    /// The open question, if any
    active_question: Option<ActiveQuestion>,
    /// Team holding the buzzer, never a member of `tried_teams`
    current_buzzer: Option<usize>,
    /// Teams that already failed the open question
    tried_teams: BTreeSet<usize>,
    /// Whether a team's answer countdown is running
    timer_active: bool,
    /// Whether choices are withheld from contestants
    hide_answers: bool,
}

impl Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("scores", &self.scores)
            .field("current_buzzer", &self.current_buzzer)
            .field("tried_teams", &self.tried_teams)
            .field("has_question", &self.active_question.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(Board::sample(), Options::default())
    }
}

/// Clamps a requested team count into the allowed range
fn clamp_team_count(requested: i64) -> usize {
    if requested <= teams::MIN_COUNT as i64 {
        teams::MIN_COUNT
    } else if requested >= teams::MAX_COUNT as i64 {
        teams::MAX_COUNT
    } else {
        requested as usize
    }
}

// Queries
impl GameSession {
    /// Number of teams
    pub fn team_count(&self) -> usize {
        self.scores.len()
    }

    /// Score of every team
    pub fn scores(&self) -> &[i64] {
        &self.scores
    }

    /// Team holding the buzzer
    pub fn current_buzzer(&self) -> Option<usize> {
        self.current_buzzer
    }

    /// Teams that already failed the open question, ascending
    pub fn tried_teams(&self) -> impl Iterator<Item = usize> + '_ {
        self.tried_teams.iter().copied()
    }

    /// Whether a team's answer countdown is running
    pub fn timer_active(&self) -> bool {
        self.timer_active
    }

    /// Whether choices are withheld from contestants
    pub fn hide_answers(&self) -> bool {
        self.hide_answers
    }

    /// The open question
    pub fn active_question(&self) -> Option<&ActiveQuestion> {
        self.active_question.as_ref()
    }

    /// The board being played
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Status of a tile, `None` while it is unopened
    pub fn tile_status(&self, tile: TileId) -> Option<TileStatus> {
        self.tile_status.get(&tile).copied()
    }

    /// The coarse state of the session
    pub fn phase(&self) -> Phase {
        match (&self.active_question, self.current_buzzer) {
            (None, _) => Phase::Idle,
            (Some(_), None) => Phase::Open,
            (Some(_), Some(_)) => Phase::Buzzed,
        }
    }

    /// Teams that may still buzz on the open question
    pub fn remaining_teams(&self) -> Vec<usize> {
        (0..self.team_count())
            .filter(|team| !self.tried_teams.contains(team))
            .collect_vec()
    }

    /// Deep copy of the board, tile statuses and scores
    pub fn board_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            categories: self.board.categories.clone(),
            image_folder: self.board.image_folder.clone(),
            tile_status: self
                .tile_status
                .iter()
                .map(|(tile, status)| (*tile, *status))
                .collect(),
            scores: self.scores.clone(),
            team_count: self.team_count(),
        }
    }

    /// Deep copy of the turn state and scores
    pub fn session_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            scores: self.scores.clone(),
            current_buzzer: self.current_buzzer,
            tried_teams: self.tried_teams().collect_vec(),
            timer_active: self.timer_active,
            hide_answers: self.hide_answers,
            has_question: self.active_question.is_some(),
            team_count: self.team_count(),
        }
    }

    /// Rejects team indices outside the roster
    fn check_team(&self, team: usize) -> Result<(), Error> {
        if team < self.team_count() {
            Ok(())
        } else {
            Err(Error::InvalidTeamIndex)
        }
    }
}

impl GameSession {
    /// Creates a session over a board
    ///
    /// An out-of-range team count in `options` is clamped rather than
    /// rejected.
    pub fn new(board: Board, options: Options) -> Self {
        Self {
            board,
            scores: vec![0; options.team_count.clamp(teams::MIN_COUNT, teams::MAX_COUNT)],
            tile_status: HashMap::new(),
            active_question: None,
            current_buzzer: None,
            tried_teams: BTreeSet::new(),
            timer_active: false,
            hide_answers: options.hide_answers,
        }
    }

    /// Opens the question on a tile
    ///
    /// # Errors
    ///
    /// * [`Error::QuestionInProgress`] if a question is already open
    /// * [`Error::InvalidTile`] if the coordinate is not on the board
    /// * [`Error::TileAlreadyResolved`] if the tile was answered or used up
    pub fn open_question(&mut self, tile: TileId) -> Result<&ActiveQuestion, Error> {
        if self.active_question.is_some() {
            return Err(Error::QuestionInProgress);
        }

        let (Some(category), Some(clue)) = (self.board.category(tile), self.board.clue(tile))
        else {
            return Err(Error::InvalidTile);
        };

        if self.tile_status.contains_key(&tile) {
            return Err(Error::TileAlreadyResolved);
        }

        let question = ActiveQuestion {
            tile,
            category: category.name.clone(),
            value: clue.value,
            question: clue.question.clone(),
            choices: clue.choices.clone(),
            answer: clue.answer,
            image: ImageRef::resolve(self.board.image_folder.as_deref(), clue.image.as_deref()),
        };

        log::info!("opened {tile} ({} for {})", question.category, question.value);

        self.tried_teams.clear();
        self.current_buzzer = None;
        self.timer_active = false;

        Ok(&*self.active_question.insert(question))
    }

    /// Gives a team the exclusive right to answer the open question
    ///
    /// # Errors
    ///
    /// * [`Error::NoActiveQuestion`] if no question is open
    /// * [`Error::InvalidTeamIndex`] if the team is not on the roster
    /// * [`Error::BuzzerAlreadyHeld`] if another team is answering
    /// * [`Error::TeamAlreadyAttempted`] if the team already failed this question
    pub fn press_buzzer(&mut self, team: usize) -> Result<(), Error> {
        if self.active_question.is_none() {
            return Err(Error::NoActiveQuestion);
        }
        self.check_team(team)?;
        if self.current_buzzer.is_some() {
            return Err(Error::BuzzerAlreadyHeld);
        }
        if self.tried_teams.contains(&team) {
            return Err(Error::TeamAlreadyAttempted);
        }

        log::debug!("team {team} holds the buzzer");

        self.current_buzzer = Some(team);
        self.timer_active = true;

        Ok(())
    }

    /// Resolves the answering team's choice
    ///
    /// A missing or out-of-range choice counts as a wrong answer.
    ///
    /// # Errors
    ///
    /// * [`Error::NoActiveQuestion`] if no question is open
    /// * [`Error::InvalidTeamIndex`] if the team is not on the roster
    /// * [`Error::NotYourTurn`] if the team does not hold the buzzer
    pub fn submit_answer(
        &mut self,
        team: usize,
        choice: Option<usize>,
    ) -> Result<AnswerOutcome, Error> {
        self.resolve(team, |question| {
            choice.is_some_and(|c| c < question.choices.len() && c == question.answer)
        })
    }

    /// Moderator ruling that the answering team was right
    ///
    /// # Errors
    ///
    /// Same as [`GameSession::submit_answer`].
    pub fn judge_correct(&mut self, team: usize) -> Result<AnswerOutcome, Error> {
        self.resolve(team, |_| true)
    }

    /// Moderator ruling that the answering team was wrong
    ///
    /// # Errors
    ///
    /// Same as [`GameSession::submit_answer`].
    pub fn judge_incorrect(&mut self, team: usize) -> Result<AnswerOutcome, Error> {
        self.resolve(team, |_| false)
    }

    /// Resolves the answering team's attempt as wrong because time ran out
    ///
    /// # Errors
    ///
    /// [`Error::NoActivePlayer`] if no team holds the buzzer.
    pub fn timeout(&mut self) -> Result<AnswerOutcome, Error> {
        let team = self.current_buzzer.ok_or(Error::NoActivePlayer)?;
        self.submit_answer(team, None)
    }

    fn resolve<J: FnOnce(&ActiveQuestion) -> bool>(
        &mut self,
        team: usize,
        judge: J,
    ) -> Result<AnswerOutcome, Error> {
        let question = self
            .active_question
            .as_ref()
            .ok_or(Error::NoActiveQuestion)?;
        self.check_team(team)?;
        if self.current_buzzer != Some(team) {
            return Err(Error::NotYourTurn);
        }

        let correct = judge(question);
        let tile = question.tile;
        let value = i64::from(question.value);

        self.current_buzzer = None;
        self.timer_active = false;

        if correct {
            let new_score = self.scores[team].saturating_add(value);
            self.scores[team] = new_score;
            self.close_question(tile, TileStatus::Correct);

            log::info!("team {team} answered {tile} correctly");

            return Ok(AnswerOutcome {
                result: Verdict::Correct,
                team,
                new_score,
                tile,
                close_question: true,
                rebound: None,
                remaining_teams: None,
            });
        }

        let new_score = self.scores[team].saturating_sub(value);
        self.scores[team] = new_score;
        self.tried_teams.insert(team);

        let remaining = self.remaining_teams();

        if remaining.is_empty() {
            self.close_question(tile, TileStatus::Used);

            log::info!("every team missed {tile}");

            Ok(AnswerOutcome {
                result: Verdict::Incorrect,
                team,
                new_score,
                tile,
                close_question: true,
                rebound: Some(false),
                remaining_teams: None,
            })
        } else {
            log::debug!("team {team} missed {tile}, rebound to {remaining:?}");

            Ok(AnswerOutcome {
                result: Verdict::Incorrect,
                team,
                new_score,
                tile,
                close_question: false,
                rebound: Some(true),
                remaining_teams: Some(remaining),
            })
        }
    }

    /// Marks a tile resolved and returns to idle
    fn close_question(&mut self, tile: TileId, status: TileStatus) {
        self.tile_status.entry(tile).or_insert(status);
        self.active_question = None;
        self.current_buzzer = None;
        self.tried_teams.clear();
        self.timer_active = false;
    }

    /// Closes the open question without scoring it
    ///
    /// The tile stays unopened and can be selected again.
    ///
    /// # Errors
    ///
    /// [`Error::NoActiveQuestion`] if no question is open.
    pub fn cancel_question(&mut self) -> Result<(), Error> {
        let question = self
            .active_question
            .take()
            .ok_or(Error::NoActiveQuestion)?;

        log::info!("cancelled {}", question.tile);

        self.current_buzzer = None;
        self.tried_teams.clear();
        self.timer_active = false;

        Ok(())
    }

    /// Adds `delta` to a team's score, returning the new score
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTeamIndex`] if the team is not on the roster.
    pub fn adjust_score(&mut self, team: usize, delta: i64) -> Result<i64, Error> {
        self.check_team(team)?;
        self.scores[team] = self.scores[team].saturating_add(delta);
        Ok(self.scores[team])
    }

    /// Overwrites a team's score
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTeamIndex`] if the team is not on the roster.
    pub fn set_score(&mut self, team: usize, score: i64) -> Result<i64, Error> {
        self.check_team(team)?;
        self.scores[team] = score;
        Ok(score)
    }

    /// Changes the number of teams, clamped to the allowed range
    ///
    /// New teams start at zero and removed teams lose their scores. Removed
    /// teams are dropped from the tried set, and if the team holding the
    /// buzzer is removed the buzzer is released while the question stays
    /// open.
    pub fn set_team_count(&mut self, requested: i64) -> SessionSnapshot {
        let count = clamp_team_count(requested);

        if count != self.team_count() {
            log::info!("team count {} -> {count}", self.team_count());

            self.scores.resize(count, 0);
            self.tried_teams.retain(|team| *team < count);

            if self.current_buzzer.is_some_and(|team| team >= count) {
                self.current_buzzer = None;
                self.timer_active = false;
            }
        }

        self.session_snapshot()
    }

    /// Shows or withholds choices from contestants
    pub fn set_hide_answers(&mut self, hide: bool) {
        self.hide_answers = hide;
    }

    /// Starts the game over on the same board with the same teams
    ///
    /// Scores go back to zero, every tile becomes selectable again and any
    /// open question is dropped.
    pub fn reset_game(&mut self) {
        log::info!("game reset with {} teams", self.team_count());

        self.scores = vec![0; self.team_count()];
        self.tile_status.clear();
        self.active_question = None;
        self.current_buzzer = None;
        self.tried_teams.clear();
        self.timer_active = false;
    }

    /// Replaces the board and resets the game
    pub fn load_board(&mut self, board: Board) {
        log::info!("loaded a board of {} tiles", board.tile_count());

        self.board = board;
        self.reset_game();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::board::Clue;

    fn create_test_board() -> Board {
        Board {
            categories: vec![
                Category {
                    name: "Science".to_owned(),
                    clues: vec![
                        Clue::new(100, "Closest planet?", &["Venus", "Mercury", "Mars"], 1),
                        Clue::new(200, "Negative particle?", &["Proton", "Electron"], 1),
                    ],
                },
                Category {
                    name: "History".to_owned(),
                    clues: vec![
                        Clue::new(200, "Year?", &["1492", "1519", "1776"], 0),
                        Clue::new(400, "Name the painter.", &[], 0),
                    ],
                },
            ],
            image_folder: None,
        }
    }

    fn create_session(team_count: usize) -> GameSession {
        GameSession::new(
            create_test_board(),
            Options {
                team_count,
                hide_answers: false,
            },
        )
    }

    fn assert_idle(session: &GameSession) {
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.active_question().is_none());
        assert!(session.current_buzzer().is_none());
        assert_eq!(session.tried_teams().count(), 0);
        assert!(!session.timer_active());
    }

    #[test]
    fn test_new_session() {
        let session = GameSession::default();
        assert_eq!(session.team_count(), teams::DEFAULT_COUNT);
        assert_eq!(session.scores(), &[0; teams::DEFAULT_COUNT]);
        assert!(!session.hide_answers());
        assert_idle(&session);
    }

    #[test]
    fn test_new_session_clamps_team_count() {
        assert_eq!(create_session(0).team_count(), teams::MIN_COUNT);
        assert_eq!(create_session(50).team_count(), teams::MAX_COUNT);
        assert_eq!(create_session(usize::MAX).team_count(), teams::MAX_COUNT);
    }

    #[test]
    fn test_options_validation() {
        assert!(Options::default().validate().is_ok());
        let options = Options {
            team_count: 11,
            hide_answers: false,
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_scenario_correct_answer() {
        let mut session = create_session(3);
        let tile = TileId::new(0, 0);

        let question = session.open_question(tile).unwrap();
        assert_eq!(question.value, 100);
        assert_eq!(question.answer, 1);
        assert_eq!(session.phase(), Phase::Open);

        session.press_buzzer(2).unwrap();
        assert_eq!(session.current_buzzer(), Some(2));
        assert!(session.timer_active());
        assert_eq!(session.phase(), Phase::Buzzed);

        let outcome = session.submit_answer(2, Some(1)).unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome {
                result: Verdict::Correct,
                team: 2,
                new_score: 100,
                tile,
                close_question: true,
                rebound: None,
                remaining_teams: None,
            }
        );
        assert_eq!(session.scores(), &[0, 0, 100]);
        assert_eq!(session.tile_status(tile), Some(TileStatus::Correct));
        assert_idle(&session);
    }

    #[test]
    fn test_scenario_rebound() {
        let mut session = create_session(3);
        let tile = TileId::new(1, 0);
        session.open_question(tile).unwrap();

        session.press_buzzer(0).unwrap();
        let outcome = session.submit_answer(0, Some(2)).unwrap();
        assert_eq!(outcome.result, Verdict::Incorrect);
        assert_eq!(outcome.new_score, -200);
        assert!(!outcome.close_question);
        assert_eq!(outcome.rebound, Some(true));
        assert_eq!(outcome.remaining_teams, Some(vec![1, 2]));
        assert_eq!(session.tile_status(tile), None);
        assert_eq!(session.phase(), Phase::Open);
        assert!(!session.timer_active());

        session.press_buzzer(1).unwrap();
        let outcome = session.submit_answer(1, Some(0)).unwrap();
        assert_eq!(outcome.result, Verdict::Correct);
        assert_eq!(session.scores(), &[-200, 200, 0]);
        assert_eq!(session.tile_status(tile), Some(TileStatus::Correct));
        assert_idle(&session);
    }

    #[test]
    fn test_scenario_exhausted() {
        let mut session = create_session(2);
        let tile = TileId::new(1, 0);
        session.open_question(tile).unwrap();

        session.press_buzzer(0).unwrap();
        let outcome = session.submit_answer(0, Some(2)).unwrap();
        assert_eq!(outcome.remaining_teams, Some(vec![1]));

        session.press_buzzer(1).unwrap();
        let outcome = session.submit_answer(1, Some(1)).unwrap();
        assert_eq!(outcome.result, Verdict::Incorrect);
        assert!(outcome.close_question);
        assert_eq!(outcome.rebound, Some(false));
        assert_eq!(outcome.remaining_teams, None);

        assert_eq!(session.scores(), &[-200, -200]);
        assert_eq!(session.tile_status(tile), Some(TileStatus::Used));
        assert_idle(&session);
    }

    #[test]
    fn test_scenario_shrink_releases_buzzer() {
        let mut session = create_session(5);
        session.open_question(TileId::new(0, 0)).unwrap();
        session.press_buzzer(1).unwrap();
        session.submit_answer(1, Some(0)).unwrap();
        session.press_buzzer(3).unwrap();
        session.submit_answer(3, Some(0)).unwrap();
        session.press_buzzer(4).unwrap();

        let snapshot = session.set_team_count(3);
        assert_eq!(snapshot.team_count, 3);
        assert_eq!(snapshot.current_buzzer, None);
        assert!(!snapshot.timer_active);
        assert_eq!(snapshot.scores, vec![0, -100, 0]);
        assert_eq!(snapshot.tried_teams, vec![1]);
        assert!(snapshot.has_question);
        assert_eq!(session.phase(), Phase::Open);
    }

    #[test]
    fn test_set_team_count_grow_and_clamp() {
        let mut session = create_session(2);
        session.adjust_score(1, 50).unwrap();

        let snapshot = session.set_team_count(4);
        assert_eq!(snapshot.scores, vec![0, 50, 0, 0]);

        assert_eq!(session.set_team_count(-3).team_count, teams::MIN_COUNT);
        assert_eq!(session.set_team_count(99).team_count, teams::MAX_COUNT);
    }

    #[test]
    fn test_set_team_count_keeps_buzzer_in_range() {
        let mut session = create_session(5);
        session.open_question(TileId::new(0, 0)).unwrap();
        session.press_buzzer(1).unwrap();

        let snapshot = session.set_team_count(3);
        assert_eq!(snapshot.current_buzzer, Some(1));
        assert!(snapshot.timer_active);
    }

    #[test]
    fn test_cancel_twice() {
        let mut session = create_session(3);
        let tile = TileId::new(0, 1);
        session.open_question(tile).unwrap();
        session.press_buzzer(0).unwrap();

        session.cancel_question().unwrap();
        assert_idle(&session);
        let before = session.session_snapshot();

        assert_eq!(session.cancel_question(), Err(Error::NoActiveQuestion));
        assert_eq!(session.session_snapshot(), before);
        assert_eq!(session.tile_status(tile), None);

        // Cancelled tiles stay selectable
        assert!(session.open_question(tile).is_ok());
    }

    #[test]
    fn test_cancel_keeps_scores() {
        let mut session = create_session(2);
        session.open_question(TileId::new(0, 0)).unwrap();
        session.press_buzzer(0).unwrap();
        session.submit_answer(0, Some(0)).unwrap();
        session.cancel_question().unwrap();
        assert_eq!(session.scores(), &[-100, 0]);
    }

    #[test]
    fn test_timeout_matches_wrong_answer() {
        let mut timed_out = create_session(3);
        let mut answered = create_session(3);

        for session in [&mut timed_out, &mut answered] {
            session.open_question(TileId::new(0, 0)).unwrap();
            session.press_buzzer(1).unwrap();
        }

        let by_timeout = timed_out.timeout().unwrap();
        let by_answer = answered.submit_answer(1, Some(2)).unwrap();

        assert_eq!(by_timeout, by_answer);
        assert_eq!(timed_out.session_snapshot(), answered.session_snapshot());
    }

    #[test]
    fn test_timeout_without_buzzer() {
        let mut session = create_session(2);
        assert_eq!(session.timeout(), Err(Error::NoActivePlayer));
        session.open_question(TileId::new(0, 0)).unwrap();
        assert_eq!(session.timeout(), Err(Error::NoActivePlayer));
    }

    #[test]
    fn test_invalid_choice_is_wrong() {
        let mut session = create_session(3);
        session.open_question(TileId::new(0, 0)).unwrap();

        session.press_buzzer(0).unwrap();
        assert_eq!(
            session.submit_answer(0, None).unwrap().result,
            Verdict::Incorrect
        );

        session.press_buzzer(1).unwrap();
        assert_eq!(
            session.submit_answer(1, Some(99)).unwrap().result,
            Verdict::Incorrect
        );
    }

    #[test]
    fn test_free_response_needs_judging() {
        let mut session = create_session(2);
        let tile = TileId::new(1, 1);
        let question = session.open_question(tile).unwrap();
        assert!(question.choices.is_empty());

        session.press_buzzer(0).unwrap();
        assert_eq!(
            session.submit_answer(0, Some(0)).unwrap().result,
            Verdict::Incorrect
        );

        session.press_buzzer(1).unwrap();
        let outcome = session.judge_correct(1).unwrap();
        assert_eq!(outcome.result, Verdict::Correct);
        assert_eq!(session.scores(), &[-400, 400]);
        assert_eq!(session.tile_status(tile), Some(TileStatus::Correct));
    }

    #[test]
    fn test_judge_incorrect_rebounds() {
        let mut session = create_session(3);
        session.open_question(TileId::new(0, 1)).unwrap();
        session.press_buzzer(2).unwrap();

        let outcome = session.judge_incorrect(2).unwrap();
        assert_eq!(outcome.rebound, Some(true));
        assert_eq!(outcome.remaining_teams, Some(vec![0, 1]));
        assert_eq!(outcome.new_score, -200);
    }

    #[test]
    fn test_open_question_errors() {
        let mut session = create_session(2);
        assert_eq!(
            session.open_question(TileId::new(9, 0)).err(),
            Some(Error::InvalidTile)
        );
        assert_eq!(
            session.open_question(TileId::new(0, 9)).err(),
            Some(Error::InvalidTile)
        );

        session.open_question(TileId::new(0, 0)).unwrap();
        assert_eq!(
            session.open_question(TileId::new(0, 1)).err(),
            Some(Error::QuestionInProgress)
        );

        session.press_buzzer(0).unwrap();
        session.submit_answer(0, Some(1)).unwrap();
        assert_eq!(
            session.open_question(TileId::new(0, 0)).err(),
            Some(Error::TileAlreadyResolved)
        );
    }

    #[test]
    fn test_open_question_copies_clue() {
        let mut session = create_session(2);
        let question = session.open_question(TileId::new(1, 0)).unwrap().clone();

        session.load_board(Board::sample());
        assert_ne!(session.board().categories[1].clues[0].question, question.question);
        assert_eq!(question.category, "History");
        assert_eq!(question.question, "Year?");
    }

    #[test]
    fn test_press_buzzer_errors() {
        let mut session = create_session(3);
        assert_eq!(session.press_buzzer(0), Err(Error::NoActiveQuestion));

        session.open_question(TileId::new(0, 0)).unwrap();
        assert_eq!(session.press_buzzer(3), Err(Error::InvalidTeamIndex));

        session.press_buzzer(0).unwrap();
        assert_eq!(session.press_buzzer(1), Err(Error::BuzzerAlreadyHeld));
        assert_eq!(session.press_buzzer(0), Err(Error::BuzzerAlreadyHeld));

        session.submit_answer(0, Some(0)).unwrap();
        assert_eq!(session.press_buzzer(0), Err(Error::TeamAlreadyAttempted));
    }

    #[test]
    fn test_submit_answer_errors() {
        let mut session = create_session(3);
        assert_eq!(
            session.submit_answer(0, Some(1)),
            Err(Error::NoActiveQuestion)
        );

        session.open_question(TileId::new(0, 0)).unwrap();
        assert_eq!(session.submit_answer(0, Some(1)), Err(Error::NotYourTurn));
        assert_eq!(
            session.submit_answer(7, Some(1)),
            Err(Error::InvalidTeamIndex)
        );

        session.press_buzzer(1).unwrap();
        let before = session.session_snapshot();
        assert_eq!(session.submit_answer(0, Some(1)), Err(Error::NotYourTurn));
        assert_eq!(session.judge_correct(2), Err(Error::NotYourTurn));
        assert_eq!(session.session_snapshot(), before);
    }

    #[test]
    fn test_score_side_channel() {
        let mut session = create_session(3);
        session.open_question(TileId::new(0, 0)).unwrap();
        session.press_buzzer(1).unwrap();

        assert_eq!(session.adjust_score(0, 250), Ok(250));
        assert_eq!(session.adjust_score(0, -300), Ok(-50));
        assert_eq!(session.set_score(2, 1000), Ok(1000));
        assert_eq!(session.adjust_score(3, 1), Err(Error::InvalidTeamIndex));
        assert_eq!(session.set_score(3, 1), Err(Error::InvalidTeamIndex));

        assert_eq!(session.scores(), &[-50, 0, 1000]);
        assert_eq!(session.current_buzzer(), Some(1));
        assert_eq!(session.phase(), Phase::Buzzed);
    }

    #[test]
    fn test_adjust_score_saturates() {
        let mut session = create_session(2);
        session.set_score(0, i64::MAX).unwrap();
        assert_eq!(session.adjust_score(0, 1), Ok(i64::MAX));
    }

    #[test]
    fn test_reset_game() {
        let mut session = create_session(4);
        session.set_hide_answers(true);
        session.open_question(TileId::new(0, 0)).unwrap();
        session.press_buzzer(0).unwrap();
        session.submit_answer(0, Some(1)).unwrap();
        session.open_question(TileId::new(0, 1)).unwrap();
        session.press_buzzer(2).unwrap();

        session.reset_game();

        assert_idle(&session);
        assert_eq!(session.scores(), &[0, 0, 0, 0]);
        assert_eq!(session.tile_status(TileId::new(0, 0)), None);
        assert!(session.hide_answers());
        assert!(session.open_question(TileId::new(0, 0)).is_ok());
    }

    #[test]
    fn test_question_view_hides_choices() {
        let mut session = create_session(2);
        let question = session.open_question(TileId::new(0, 0)).unwrap();

        let hidden = question.view(false);
        assert!(hidden.choices.is_none());
        assert!(hidden.answer.is_none());
        let json = serde_json::to_string(&hidden).unwrap();
        assert!(!json.contains("choices"));
        assert!(!json.contains("answer"));

        let full = question.view(true);
        assert_eq!(full.choices.as_ref().map(Vec::len), Some(3));
        assert_eq!(full.answer, Some(1));
    }

    #[test]
    fn test_question_image_resolution() {
        let mut board = create_test_board();
        board.categories[0].clues[0].image = Some("sun.png".to_owned());
        let mut session = GameSession::new(board.clone(), Options::default());
        assert_eq!(
            session.open_question(TileId::new(0, 0)).unwrap().image,
            None
        );

        board.image_folder = Some("space".to_owned());
        session.load_board(board);
        assert_eq!(
            session.open_question(TileId::new(0, 0)).unwrap().image,
            Some(ImageRef {
                folder: "space".to_owned(),
                file: "sun.png".to_owned(),
            })
        );
    }

    #[test]
    fn test_snapshots_are_detached() {
        let mut session = create_session(2);
        let mut snapshot = session.board_snapshot();
        snapshot.scores[0] = 999;
        snapshot.categories.clear();

        session.open_question(TileId::new(0, 0)).unwrap();
        session.press_buzzer(0).unwrap();
        session.submit_answer(0, Some(1)).unwrap();

        assert_eq!(session.scores(), &[100, 0]);
        assert_eq!(session.board().categories.len(), 2);
        assert!(snapshot.tile_status.is_empty());
    }

    #[test]
    fn test_board_snapshot_serialization() {
        let mut session = create_session(2);
        session.open_question(TileId::new(0, 1)).unwrap();
        session.press_buzzer(1).unwrap();
        session.submit_answer(1, Some(1)).unwrap();

        let json = serde_json::to_value(session.board_snapshot()).unwrap();
        assert_eq!(json["tile_status"]["0,1"], "correct");
        assert_eq!(json["scores"], serde_json::json!([0, 200]));
        assert_eq!(json["team_count"], 2);
    }

    #[test]
    fn test_session_snapshot_contents() {
        let mut session = create_session(3);
        session.set_hide_answers(true);
        session.open_question(TileId::new(0, 0)).unwrap();
        session.press_buzzer(2).unwrap();
        session.submit_answer(2, None).unwrap();
        session.press_buzzer(0).unwrap();

        assert_eq!(
            session.session_snapshot(),
            SessionSnapshot {
                scores: vec![0, 0, -100],
                current_buzzer: Some(0),
                tried_teams: vec![2],
                timer_active: true,
                hide_answers: true,
                has_question: true,
                team_count: 3,
            }
        );
    }

    #[test]
    fn test_answer_outcome_serialization() {
        let mut session = create_session(2);
        session.open_question(TileId::new(0, 0)).unwrap();
        session.press_buzzer(0).unwrap();
        let json = serde_json::to_value(session.submit_answer(0, Some(1)).unwrap()).unwrap();

        assert_eq!(json["result"], "correct");
        assert_eq!(json["close_question"], true);
        assert!(json.get("rebound").is_none());
        assert!(json.get("remaining_teams").is_none());
    }
}
