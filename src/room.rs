//! Transport mapping for a single game
//!
//! A [`Room`] owns one [`GameSession`] and the connections watching it. It
//! turns tagged client requests into session operations, answers rejected
//! requests to their sender only, and fans successful results out to every
//! connection. It also owns the answer countdown: the session never reads
//! a clock, so the room schedules an [`AlarmMessage`] through the host's
//! scheduler whenever a team takes the buzzer and resolves the attempt as
//! a timeout when that alarm comes back still current.
//!
//! Like the session, a room is mutated through `&mut self`; the host must
//! serialize calls to it.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    board::{Board, TileId},
    constants::timer::ANSWER_TIME_LIMIT,
    game::{
        self, ActiveQuestion, AnswerOutcome, BoardSnapshot, GameSession, Options, QuestionView,
        SessionSnapshot,
    },
    session::Tunnel,
    watcher::{self, Id, ValueKind, Watchers},
};

/// A loosely typed number as sent by clients
///
/// Clients may send numbers as JSON integers, floats or numeric strings.
/// They are coerced here so the session only ever sees well-typed values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Lenient {
    /// A JSON integer
    Integer(i64),
    /// A JSON float, truncated toward zero
    Float(f64),
    /// A string that may hold an integer
    Text(String),
    /// Anything else, never a number
    Other(serde_json::Value),
}

impl Lenient {
    /// The value as an integer, if it is integer-like
    pub fn integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Float(_) | Self::Other(_) => None,
        }
    }

    /// The value as a non-negative index, if it is one
    pub fn index(&self) -> Option<usize> {
        self.integer().and_then(|i| usize::try_from(i).ok())
    }

    /// The value as a non-negative index, only if it was sent as a JSON integer
    pub fn strict_index(&self) -> Option<usize> {
        match self {
            Self::Integer(i) => usize::try_from(*i).ok(),
            Self::Float(_) | Self::Text(_) | Self::Other(_) => None,
        }
    }
}

/// Coerces a team field, which must be a JSON integer
fn team_index(team: &Lenient) -> Result<usize, game::Error> {
    team.strict_index().ok_or(game::Error::InvalidTeamIndex)
}

/// Coerces an optional score field, absent meaning zero
fn score_value(score: Option<&Lenient>) -> Result<i64, game::Error> {
    match score {
        None => Ok(0),
        Some(score) => score.integer().ok_or(game::Error::InvalidScore),
    }
}

/// Requests a connection can send, one per session operation
#[derive(Debug, Clone, Deserialize)]
pub enum IncomingMessage {
    /// Open the question on a tile
    OpenQuestion {
        /// Category (column) index
        category: Lenient,
        /// Clue (row) index
        clue: Lenient,
    },
    /// A team takes the buzzer
    PressBuzzer {
        /// The buzzing team
        team: Lenient,
    },
    /// The answering team picks a choice
    SubmitAnswer {
        /// The answering team
        team: Lenient,
        /// Picked choice; missing or malformed counts as wrong
        #[serde(default)]
        choice: Option<Lenient>,
    },
    /// The moderator rules the answering team right
    JudgeCorrect {
        /// The answering team
        team: Lenient,
    },
    /// The moderator rules the answering team wrong
    JudgeIncorrect {
        /// The answering team
        team: Lenient,
    },
    /// Close the open question without scoring it
    CancelQuestion,
    /// The answering team ran out of time
    Timeout,
    /// Show or withhold choices from displays
    SetHideAnswers(bool),
    /// Add to a team's score
    AdjustScore {
        /// The team
        team: Lenient,
        /// Points to add, may be negative
        #[serde(default)]
        delta: Option<Lenient>,
    },
    /// Overwrite a team's score
    SetScore {
        /// The team
        team: Lenient,
        /// The new score
        #[serde(default)]
        score: Option<Lenient>,
    },
    /// Change the number of teams
    SetTeamCount {
        /// Requested number of teams, clamped to the allowed range
        count: Lenient,
    },
    /// Start over on the same board
    ResetGame,
}

/// Incremental updates sent to connections
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// A question was opened
    #[from]
    QuestionOpened(QuestionView),
    /// A team took the buzzer
    BuzzerActivated {
        /// The answering team
        team: usize,
    },
    /// The answering team's countdown started
    StartTimer {
        /// Time the team has to answer
        #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
        duration: web_time::Duration,
    },
    /// The countdown stopped
    StopTimer,
    /// An attempt was resolved
    #[from]
    AnswerResult(AnswerOutcome),
    /// Score of every team
    ScoresUpdate(Vec<i64>),
    /// The open question was closed
    CloseQuestion,
    /// Choices are now shown to or withheld from displays
    HideAnswersToggled(bool),
    /// The number of teams changed
    #[from]
    TeamCountUpdated(SessionSnapshot),
    /// Board state after a change to the teams
    BoardUpdated(BoardSnapshot),
    /// The game started over
    GameReset(BoardSnapshot),
    /// The sender's request was rejected
    #[from]
    Error(game::Error),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Full state sent to a connection when it joins
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// Everything a fresh client needs to draw the game
    Connected {
        /// Role the connection joined as
        role: ValueKind,
        /// Board, tile statuses and scores
        board: BoardSnapshot,
        /// Turn state
        game: SessionSnapshot,
        /// The open question, as this connection may see it
        question: Option<QuestionView>,
    },
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Timed events the room asks its host to deliver back later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The answering team's time is up
    AnswerTimeout {
        /// The buzz this countdown belongs to
        turn: u64,
    },
}

/// A game together with the connections watching it
#[derive(Debug)]
pub struct Room {
    game: GameSession,
    watchers: Watchers,
    /// Incremented on every accepted buzz to tell current alarms from stale ones
    turn: u64,
}

impl Default for Room {
    fn default() -> Self {
        Self::with_sample_board()
    }
}

impl Room {
    /// Creates a room playing `board`
    pub fn new(board: Board, options: Options) -> Self {
        Self {
            game: GameSession::new(board, options),
            watchers: Watchers::default(),
            turn: 0,
        }
    }

    /// Creates a room playing the built-in sample board
    pub fn with_sample_board() -> Self {
        Self::new(Board::sample(), Options::default())
    }

    /// The game being played
    pub fn game(&self) -> &GameSession {
        &self.game
    }

    /// The connections watching the game
    pub fn watchers(&self) -> &Watchers {
        &self.watchers
    }

    /// Registers a connection and sends it the current state
    ///
    /// # Errors
    ///
    /// Returns [`watcher::Error::MaximumWatchers`] if the room is full.
    pub fn add_watcher<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        watcher_id: Id,
        kind: ValueKind,
        tunnel_finder: F,
    ) -> Result<(), watcher::Error> {
        self.watchers.add_watcher(watcher_id, kind)?;

        log::debug!(
            "{watcher_id} joined as {kind:?}, {} connected in that role",
            self.watchers.specific_count(kind)
        );

        if let Some(state) = self.state_message(watcher_id) {
            self.watchers.send_state(&state, watcher_id, tunnel_finder);
        }

        Ok(())
    }

    /// Forgets a disconnected connection
    pub fn remove_watcher(&mut self, watcher_id: Id) -> Option<ValueKind> {
        let kind = self.watchers.remove_watcher(watcher_id)?;

        log::debug!("{watcher_id} left");

        Some(kind)
    }

    /// Replaces the board, resets the game and tells every connection
    pub fn load_board<T: Tunnel, F: Fn(Id) -> Option<T>>(&mut self, board: Board, tunnel_finder: F) {
        self.game.load_board(board);
        self.watchers.announce(
            &UpdateMessage::GameReset(self.game.board_snapshot()),
            tunnel_finder,
        );
    }

    /// The state a connection should be shown, if it is registered
    pub fn state_message(&self, watcher_id: Id) -> Option<SyncMessage> {
        let role = self.watchers.get_watcher_kind(watcher_id)?;

        Some(SyncMessage::Connected {
            role,
            board: self.game.board_snapshot(),
            game: self.game.session_snapshot(),
            question: self
                .game
                .active_question()
                .map(|question| question.view(self.reveals_to(role))),
        })
    }

    /// Whether a role may see the choices of the open question
    fn reveals_to(&self, kind: ValueKind) -> bool {
        match kind {
            ValueKind::Moderator => true,
            ValueKind::Display => !self.game.hide_answers(),
        }
    }

    /// Handles a request from a connection
    ///
    /// Requests from unregistered connections are ignored. A rejected
    /// request is answered with [`UpdateMessage::Error`] to its sender and
    /// to nobody else.
    ///
    /// # Arguments
    ///
    /// * `watcher_id` - The connection sending the request
    /// * `message` - The request
    /// * `schedule_message` - Asks the host to deliver an alarm after a delay
    /// * `tunnel_finder` - Maps a connection to its tunnel
    pub fn receive_message<
        T: Tunnel,
        F: Fn(Id) -> Option<T>,
        S: FnMut(AlarmMessage, web_time::Duration),
    >(
        &mut self,
        watcher_id: Id,
        message: IncomingMessage,
        schedule_message: S,
        tunnel_finder: F,
    ) {
        if !self.watchers.has_watcher(watcher_id) {
            return;
        }

        if let Err(error) = self.dispatch(message, schedule_message, &tunnel_finder) {
            log::debug!("rejected request from {watcher_id}: {error}");

            self.watchers
                .send_message(&error.into(), watcher_id, &tunnel_finder);
        }
    }

    fn dispatch<T: Tunnel, F: Fn(Id) -> Option<T>, S: FnMut(AlarmMessage, web_time::Duration)>(
        &mut self,
        message: IncomingMessage,
        mut schedule_message: S,
        tunnel_finder: &F,
    ) -> Result<(), game::Error> {
        match message {
            IncomingMessage::OpenQuestion { category, clue } => {
                let (Some(category), Some(clue)) = (category.index(), clue.index()) else {
                    return Err(game::Error::InvalidTile);
                };

                let question = self.game.open_question(TileId::new(category, clue))?.clone();
                self.announce_question(&question, tunnel_finder);
            }
            IncomingMessage::PressBuzzer { team } => {
                let team = team_index(&team)?;
                self.game.press_buzzer(team)?;
                self.turn += 1;

                self.watchers
                    .announce(&UpdateMessage::BuzzerActivated { team }, tunnel_finder);
                self.watchers.announce(
                    &UpdateMessage::StartTimer {
                        duration: ANSWER_TIME_LIMIT,
                    },
                    tunnel_finder,
                );

                schedule_message(
                    AlarmMessage::AnswerTimeout { turn: self.turn },
                    ANSWER_TIME_LIMIT,
                );
            }
            IncomingMessage::SubmitAnswer { team, choice } => {
                let team = team_index(&team)?;
                let choice = choice.as_ref().and_then(Lenient::index);
                let outcome = self.game.submit_answer(team, choice)?;
                self.announce_outcome(outcome, tunnel_finder);
            }
            IncomingMessage::JudgeCorrect { team } => {
                let outcome = self.game.judge_correct(team_index(&team)?)?;
                self.announce_outcome(outcome, tunnel_finder);
            }
            IncomingMessage::JudgeIncorrect { team } => {
                let outcome = self.game.judge_incorrect(team_index(&team)?)?;
                self.announce_outcome(outcome, tunnel_finder);
            }
            IncomingMessage::Timeout => {
                let outcome = self.game.timeout()?;
                self.announce_outcome(outcome, tunnel_finder);
            }
            IncomingMessage::CancelQuestion => {
                self.game.cancel_question()?;
                self.watchers
                    .announce(&UpdateMessage::StopTimer, tunnel_finder);
                self.watchers
                    .announce(&UpdateMessage::CloseQuestion, tunnel_finder);
            }
            IncomingMessage::SetHideAnswers(hide) => {
                self.game.set_hide_answers(hide);
                self.watchers
                    .announce(&UpdateMessage::HideAnswersToggled(hide), tunnel_finder);
            }
            IncomingMessage::AdjustScore { team, delta } => {
                let team = team_index(&team)?;
                let delta = score_value(delta.as_ref())?;
                self.game.adjust_score(team, delta)?;
                self.announce_scores(tunnel_finder);
            }
            IncomingMessage::SetScore { team, score } => {
                let team = team_index(&team)?;
                let score = score_value(score.as_ref())?;
                self.game.set_score(team, score)?;
                self.announce_scores(tunnel_finder);
            }
            IncomingMessage::SetTeamCount { count } => {
                let count = count.integer().ok_or(game::Error::InvalidCount)?;
                let snapshot = self.game.set_team_count(count);

                self.watchers.announce(&snapshot.into(), tunnel_finder);
                self.announce_scores(tunnel_finder);
                self.watchers.announce(
                    &UpdateMessage::BoardUpdated(self.game.board_snapshot()),
                    tunnel_finder,
                );
            }
            IncomingMessage::ResetGame => {
                self.game.reset_game();
                self.watchers.announce(
                    &UpdateMessage::GameReset(self.game.board_snapshot()),
                    tunnel_finder,
                );
            }
        }

        Ok(())
    }

    /// Handles an alarm scheduled by this room
    ///
    /// An alarm from an earlier buzz, or one arriving after the attempt was
    /// already resolved, is ignored.
    pub fn receive_alarm<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        message: AlarmMessage,
        tunnel_finder: F,
    ) {
        match message {
            AlarmMessage::AnswerTimeout { turn } => {
                if turn != self.turn || self.game.current_buzzer().is_none() {
                    log::debug!("ignoring stale answer timeout for turn {turn}");
                    return;
                }

                match self.game.timeout() {
                    Ok(outcome) => self.announce_outcome(outcome, &tunnel_finder),
                    Err(error) => log::debug!("answer timeout for turn {turn} failed: {error}"),
                }
            }
        }
    }

    /// Sends the open question, stripped of its choices for displays that may not see them
    fn announce_question<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        question: &ActiveQuestion,
        tunnel_finder: &F,
    ) {
        let full = question.view(true);
        let hidden = question.view(!self.game.hide_answers());

        self.watchers.announce_specific(
            ValueKind::Moderator,
            &UpdateMessage::QuestionOpened(full),
            tunnel_finder,
        );
        self.watchers.announce_specific(
            ValueKind::Display,
            &UpdateMessage::QuestionOpened(hidden),
            tunnel_finder,
        );
    }

    fn announce_outcome<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        outcome: AnswerOutcome,
        tunnel_finder: &F,
    ) {
        let close_question = outcome.close_question;

        self.watchers.announce(&outcome.into(), tunnel_finder);
        self.watchers
            .announce(&UpdateMessage::StopTimer, tunnel_finder);
        self.announce_scores(tunnel_finder);

        if close_question {
            self.watchers
                .announce(&UpdateMessage::CloseQuestion, tunnel_finder);
        }
    }

    fn announce_scores<T: Tunnel, F: Fn(Id) -> Option<T>>(&self, tunnel_finder: &F) {
        self.watchers.announce(
            &UpdateMessage::ScoresUpdate(self.game.scores().to_vec()),
            tunnel_finder,
        );
    }
}
