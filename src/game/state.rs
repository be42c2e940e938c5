//! Game state management.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GameError;
use crate::game::{
    Board, CellId, GameEvent, Player, PlayerId, combat, invariants, region, reinforce,
    surrender,
};
use crate::game::combat::AttackOutcome;
use crate::game::reinforce::TurnSummary;
use crate::game::surrender::SurrenderSummary;
use crate::rng::{GameRng, RandomSource};

/// Maximum number of civilizations in a game.
pub const MAX_PLAYERS: usize = 8;

/// Game lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Moves are accepted.
    Play,
    /// Terminal; at most one civilization remains.
    Victory,
}

/// Rule set for map setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Territory split between players.
    #[default]
    Classic,
    /// One stronghold per player, barbarians everywhere else.
    Conquest,
}

/// AI strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Loose odds floor, occasional mistakes.
    Easy,
    /// Standard scoring.
    #[default]
    Normal,
    /// Capacity-aware hoarding.
    Hard,
}

/// How dice stacks are drawn by a front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiceDisplay {
    /// Pip faces.
    #[default]
    Pips,
    /// Numerals.
    Digits,
}

/// Pass-through options. Only `corruption` affects the rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    /// 50% loss on reinforcement placed outside the largest region.
    pub corruption: bool,
    /// Dice rendering style.
    pub dice_display: DiceDisplay,
    /// Seconds a notification stays visible.
    pub notification_duration: f32,
    /// Show the battle result overlay.
    pub show_dice_results: bool,
    /// Seconds the battle result stays visible.
    pub dice_result_duration: f32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            corruption: false,
            dice_display: DiceDisplay::Pips,
            notification_duration: 3.0,
            show_dice_results: true,
            dice_result_duration: 1.5,
        }
    }
}

/// Members of the two alliance groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliances {
    /// Group A.
    pub a: BTreeSet<PlayerId>,
    /// Group B.
    pub b: BTreeSet<PlayerId>,
}

impl Alliances {
    /// Whether a player belongs to both groups.
    #[must_use]
    pub fn is_double_member(&self, player: PlayerId) -> bool {
        self.a.contains(&player) && self.b.contains(&player)
    }

    /// Whether no alliances exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.b.is_empty()
    }
}

/// A source and target pair handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRef {
    /// Source cell.
    pub from: CellId,
    /// Target cell.
    pub to: CellId,
}

/// A move submitted by a human or the AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Regular attack by the active player.
    Attack {
        /// Source cell.
        from: CellId,
        /// Target cell.
        to: CellId,
    },
    /// Reserve-funded drop by the active player.
    Paratroop {
        /// Target cell.
        target: CellId,
    },
    /// Reinforce and pass the turn.
    EndTurn,
    /// A player gives up.
    Surrender {
        /// Surrendering player.
        player: PlayerId,
        /// Recipient, `None` to split among neighbors.
        to: Option<PlayerId>,
    },
}

/// Result of an applied action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Attack or paratroop result.
    Attack(AttackOutcome),
    /// Reinforcement summary.
    TurnEnded(TurnSummary),
    /// Surrender summary.
    Surrendered(SurrenderSummary),
}

/// Complete game state.
///
/// The gameplay generator is not persisted; only its draw count is, and
/// `reseed` rebuilds it from `seed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Cell arena.
    pub board: Board,
    /// Roster, indexed by player id.
    pub players: Vec<Player>,
    /// Player holding the turn.
    pub active: PlayerId,
    /// Fractional turn counter; one full round adds roughly 1.0.
    pub turn: f64,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Setup rule set.
    pub mode: GameMode,
    /// AI strength.
    pub difficulty: Difficulty,
    /// Alliance groups.
    #[serde(default)]
    pub alliances: Alliances,
    /// Pass-through options.
    #[serde(default)]
    pub options: GameOptions,
    /// Event history, oldest first.
    pub log: Vec<GameEvent>,
    /// Custom map name, if any.
    #[serde(default)]
    pub map_name: Option<String>,
    /// Gameplay seed.
    pub seed: String,
    /// Map seed.
    #[serde(default)]
    pub map_seed: String,
    /// Declared attack awaiting resolution.
    #[serde(default)]
    pub pending: Option<AttackRef>,
    /// Most recently resolved attack.
    #[serde(default)]
    pub last_attack: Option<AttackRef>,
    #[serde(default, rename = "rng_draws")]
    pub(crate) rng: GameRng,
}

impl GameState {
    /// Assemble a state from a prepared board and roster.
    ///
    /// Player cell sets are rebuilt from the board, regions are computed and
    /// victory is checked.
    #[must_use]
    pub fn new(board: Board, players: Vec<Player>, active: PlayerId, seed: &str) -> Self {
        let mut state = Self {
            board,
            players,
            active,
            turn: 1.0,
            phase: Phase::Play,
            mode: GameMode::Classic,
            difficulty: Difficulty::Normal,
            alliances: Alliances::default(),
            options: GameOptions::default(),
            log: Vec::new(),
            map_name: None,
            seed: seed.to_string(),
            map_seed: String::new(),
            pending: None,
            last_attack: None,
            rng: GameRng::new(seed),
        };
        state.rebuild_cell_sets();
        state.settle();
        state
    }

    /// Rebuild the gameplay generator from `seed` and the stored draw count.
    pub fn reseed(&mut self) {
        self.rng = GameRng::resume(&self.seed, self.rng.draws());
    }

    /// The gameplay generator.
    #[must_use]
    pub fn rng(&self) -> &GameRng {
        &self.rng
    }

    /// Take the gameplay generator out of the state, leaving a placeholder.
    ///
    /// Must be returned with [`GameState::restore_rng`].
    pub(crate) fn take_rng(&mut self) -> GameRng {
        std::mem::take(&mut self.rng)
    }

    pub(crate) fn restore_rng(&mut self, rng: GameRng) {
        self.rng = rng;
    }

    /// Check if the game is over.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::Victory
    }

    /// Whole rounds elapsed, starting at 1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn round(&self) -> u32 {
        self.turn.floor().max(0.0) as u32
    }

    /// Get a player by ID.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(usize::from(id))
    }

    /// Get a mutable reference to a player by ID.
    #[must_use]
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(usize::from(id))
    }

    /// The player holding the turn.
    #[must_use]
    pub fn active_player(&self) -> Option<&Player> {
        self.player(self.active)
    }

    /// Living players, barbarians included.
    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive)
    }

    /// Living civilizations.
    pub fn alive_civilizations(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive && p.is_civilization())
    }

    /// The strongest living civilization by cell count, lowest id on ties.
    #[must_use]
    pub fn leader(&self) -> Option<&Player> {
        self.alive_civilizations()
            .fold(None, |best: Option<&Player>, p| match best {
                Some(b) if b.cell_count() >= p.cell_count() => Some(b),
                _ => Some(p),
            })
    }

    /// The winner once the game is over.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        if !self.is_over() {
            return None;
        }
        let mut civs = self.alive_civilizations();
        match (civs.next(), civs.next()) {
            (Some(p), None) => Some(p.id),
            _ => None,
        }
    }

    /// Append to the event log.
    pub(crate) fn push_event(&mut self, event: GameEvent) {
        debug!(%event, "game event");
        self.log.push(event);
    }

    /// Move a cell to a new owner with a new dice count, keeping player
    /// cell sets in sync. Does not recompute regions.
    pub(crate) fn transfer_cell(&mut self, cell: CellId, owner: Option<PlayerId>, dice: u8) {
        let Some(target) = self.board.get_mut(cell) else {
            return;
        };
        let previous = target.owner;
        target.owner = owner;
        target.dice = dice;

        if let Some(prev) = previous.and_then(|p| self.players.get_mut(usize::from(p))) {
            prev.cells.remove(&cell);
        }
        if let Some(next) = owner.and_then(|p| self.players.get_mut(usize::from(p))) {
            next.cells.insert(cell);
        }
    }

    /// Rebuild every player's cell set from the board.
    pub(crate) fn rebuild_cell_sets(&mut self) {
        for player in &mut self.players {
            player.cells.clear();
        }
        for cell in self.board.iter() {
            if let Some(player) = cell.owner.and_then(|p| self.players.get_mut(usize::from(p))) {
                player.cells.insert(cell.id);
            }
        }
    }

    /// Refresh cached dice totals.
    pub(crate) fn refresh_totals(&mut self) {
        for player in &mut self.players {
            let on_board: u32 = player
                .cells
                .iter()
                .filter_map(|&c| self.board.get(c))
                .map(|c| u32::from(c.dice))
                .sum();
            player.total_dice = if player.alive { on_board + player.reserve } else { 0 };
        }
    }

    /// Post-mutation bookkeeping: eliminations, regions, totals, victory.
    pub(crate) fn settle(&mut self) {
        let fallen: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.alive && p.cells.is_empty())
            .map(|p| p.id)
            .collect();
        for id in fallen {
            if let Some(player) = self.player_mut(id) {
                player.eliminate();
            }
            info!(player = id, "player eliminated");
            self.push_event(GameEvent::Eliminated { player: id });
        }

        region::recompute_all_regions(self);
        self.refresh_totals();
        self.check_victory();
        invariants::enforce(self);
    }

    fn check_victory(&mut self) {
        if self.phase != Phase::Play {
            return;
        }
        let civs: Vec<PlayerId> = self.alive_civilizations().map(|p| p.id).collect();
        if civs.len() <= 1 {
            self.phase = Phase::Victory;
            self.pending = None;
            let winner = civs.first().copied();
            info!(?winner, turn = self.turn, "game over");
            self.push_event(GameEvent::Victory { winner });
        }
    }

    /// Next living player after `from` in seat order.
    ///
    /// Bounded by twice the roster length.
    #[must_use]
    pub fn next_alive_after(&self, from: PlayerId) -> Option<PlayerId> {
        let count = self.players.len();
        if count == 0 {
            return None;
        }
        let mut next = usize::from(from);
        for _ in 0..count * 2 {
            next = (next + 1) % count;
            if self.players[next].alive {
                return PlayerId::try_from(next).ok();
            }
        }
        tracing::warn!(from, "no living player found while passing the turn");
        None
    }

    /// Hand the turn to the next living player.
    pub(crate) fn pass_turn(&mut self) {
        if let Some(next) = self.next_alive_after(self.active) {
            self.active = next;
        }
    }

    /// Reject mutations once the game is over.
    pub(crate) fn ensure_playing(&self) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    /// Apply an action using the state's own gameplay generator.
    ///
    /// # Errors
    ///
    /// Returns a `GameError` if the action is illegal; the state is unchanged.
    pub fn apply(&mut self, action: Action) -> Result<Outcome, GameError> {
        let mut rng = self.take_rng();
        let result = self.apply_with(action, &mut rng);
        self.restore_rng(rng);
        result
    }

    /// Apply an action on behalf of `player`.
    ///
    /// Attacks, drops and turn ends are only accepted from the player holding
    /// the turn; surrenders are accepted from anyone still alive.
    ///
    /// # Errors
    ///
    /// Returns `NotYourTurn` for an out-of-turn move, otherwise as
    /// [`GameState::apply`].
    pub fn apply_as(&mut self, player: PlayerId, action: Action) -> Result<Outcome, GameError> {
        let turn_bound = !matches!(action, Action::Surrender { .. });
        if turn_bound && player != self.active {
            return Err(GameError::NotYourTurn {
                player,
                active: self.active,
            });
        }
        if let Action::Surrender { player: who, .. } = action
            && who != player
        {
            return Err(GameError::NotYourTurn {
                player,
                active: self.active,
            });
        }
        self.apply(action)
    }

    /// Apply an action with an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns a `GameError` if the action is illegal; the state is unchanged.
    pub fn apply_with<R: RandomSource>(
        &mut self,
        action: Action,
        rng: &mut R,
    ) -> Result<Outcome, GameError> {
        match action {
            Action::Attack { from, to } => {
                if self.pending.is_some() {
                    return Err(GameError::AttackPending);
                }
                combat::resolve_attack(self, from, to, rng).map(Outcome::Attack)
            }
            Action::Paratroop { target } => {
                if self.pending.is_some() {
                    return Err(GameError::AttackPending);
                }
                combat::resolve_paratroop(self, target, rng).map(Outcome::Attack)
            }
            Action::EndTurn => reinforce::end_turn(self, rng).map(Outcome::TurnEnded),
            Action::Surrender { player, to } => {
                surrender::surrender(self, player, to, rng).map(Outcome::Surrendered)
            }
        }
    }

    /// Validate an attack and hold it until the caller resolves or cancels it.
    ///
    /// # Errors
    ///
    /// Returns a `GameError` if the attack is illegal or one is already pending.
    pub fn declare_attack(&mut self, from: CellId, to: CellId) -> Result<(), GameError> {
        if self.pending.is_some() {
            return Err(GameError::AttackPending);
        }
        combat::validate_attack(self, from, to)?;
        self.pending = Some(AttackRef { from, to });
        Ok(())
    }

    /// Abandon the declared attack. Nothing has been rolled yet.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingAttack` if nothing was declared.
    pub fn cancel_attack(&mut self) -> Result<AttackRef, GameError> {
        self.pending.take().ok_or(GameError::NoPendingAttack)
    }

    /// Resolve the declared attack atomically.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingAttack` if nothing was declared, or a validation
    /// error if the board changed since declaration.
    pub fn resolve_pending(&mut self) -> Result<AttackOutcome, GameError> {
        let pending = self.pending.ok_or(GameError::NoPendingAttack)?;
        combat::validate_attack(self, pending.from, pending.to)?;
        self.pending = None;
        let mut rng = self.take_rng();
        let result = combat::resolve_attack(self, pending.from, pending.to, &mut rng);
        self.restore_rng(rng);
        result
    }
}
