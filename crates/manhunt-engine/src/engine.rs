//! The engine actor: single owner of all mutable session state.
//!
//! Everything that mutates — the roster, the respawn table, the proximity
//! map, the lifecycle phase — lives inside one task and is touched only by
//! that task. Commands arrive on a bounded mpsc channel; timer firings
//! arrive on a second channel of plain tick messages. Each command is
//! handled to completion before the next is read, so the invariant chain
//! "roster mutation → cache invalidation → win/start re-check" can never
//! interleave with another command.
//!
//! Timers are deliberately dumb: a spawned task that sleeps and sends one
//! message back in. All decisions happen here, where the state is, which
//! is why a stale timer firing after a role change or a match end is
//! harmless — the handler re-checks reality before acting.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use manhunt_core::{
    Notice, PlayerId, Position, ProximityTier, RespawnPolicy, Role, SessionPhase, Stat, Team,
    WinRecord, WinTrigger, WorldId,
};
use manhunt_roster::{Roster, RosterError, TeamCounts};
use manhunt_timer::{
    announce_reset_tick, send_after, send_every, urgent_respawn_tick, TaskRegistry,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::bus::{EventBus, EventStreams};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::proximity::scan_runner;
use crate::respawn::RespawnTable;
use crate::spatial::SpatialQuery;
use crate::win::{evaluate, WinInputs};

/// Capacity of the command and tick channels. Commands are cheap to
/// handle, so backpressure here means the embedding server is flooding
/// the engine far beyond any realistic player count.
const DEFAULT_CHANNEL_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Identifies a running timer so it can be cancelled or replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TimerKey {
    StartCountdown,
    ResetCountdown,
    ProximityScan,
    /// The one-shot that ends a player's death (ticketed or quick).
    Respawn(PlayerId),
    /// The per-second countdown broadcast for a ticketed runner.
    RespawnTicker(PlayerId),
}

/// Messages timers send back into the actor. Kept separate from
/// [`EngineCommand`] because repeating timers need a `Clone` payload,
/// and commands carry one-shot reply channels.
#[derive(Debug, Clone, Copy)]
enum TimerEvent {
    StartTick,
    ResetTick,
    ProximityScan,
    RespawnFired(PlayerId),
    RespawnTick(PlayerId),
}

/// Commands accepted by the engine actor.
enum EngineCommand {
    Join {
        player: PlayerId,
        role: Option<Role>,
        reply: oneshot::Sender<Result<JoinOutcome, EngineError>>,
    },
    Leave {
        player: PlayerId,
        intentional: bool,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    SetRole {
        player: PlayerId,
        role: Role,
        admin: bool,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    PinRole {
        player: PlayerId,
        pinned: bool,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    ReportDeath {
        player: PlayerId,
        killer: Option<PlayerId>,
    },
    ReportDamage {
        attacker: PlayerId,
        victim: PlayerId,
        amount: f64,
    },
    ReportDimensionVisit {
        player: PlayerId,
        world: WorldId,
    },
    ObjectiveComplete {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    ForceStart {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    ForceEnd {
        reason: String,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    ForceReset {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    SetMinPlayers {
        min: usize,
    },
    SetCustomRespawn {
        player: PlayerId,
        secs: Option<u32>,
    },
    GetInfo {
        reply: oneshot::Sender<SessionInfo>,
    },
    RemainingRespawn {
        player: PlayerId,
        reply: oneshot::Sender<Option<u32>>,
    },
    Shutdown,
}

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

/// What a join request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The role the player holds after the join.
    pub role: Role,
    /// `true` if the player reclaimed a role they held before a mid-match
    /// disconnect.
    pub rejoined: bool,
}

/// A point-in-time snapshot of the session, for status commands.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub phase: SessionPhase,
    pub counts: TeamCounts,
    /// Time since the match started, while one is (or was) live.
    pub elapsed: Option<Duration>,
    /// Players currently dead (ticketed runners plus down hunters).
    pub dead: usize,
    /// The recorded outcome, once the session has ended.
    pub outcome: Option<WinRecord>,
}

/// A cloneable handle for talking to the running engine actor.
///
/// Every method is a message round-trip (or a fire-and-forget send for
/// the report surface). All errors are [`EngineError`]; a dead actor
/// surfaces as [`EngineError::Unavailable`].
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    async fn request<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> EngineCommand,
    ) -> Result<R, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| EngineError::Unavailable)?;
        rx.await.map_err(|_| EngineError::Unavailable)
    }

    async fn send(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        self.tx.send(cmd).await.map_err(|_| EngineError::Unavailable)
    }

    /// Adds a player to the session.
    ///
    /// While waiting, `role` is honored (defaulting to spectator). In any
    /// other phase the request role is ignored: mid-match joiners watch,
    /// unless they hold a disconnected-role record, in which case they
    /// reclaim that role.
    pub async fn join(
        &self,
        player: PlayerId,
        role: Option<Role>,
    ) -> Result<JoinOutcome, EngineError> {
        self.request(|reply| EngineCommand::Join { player, role, reply })
            .await?
    }

    /// Removes a player. `intentional` distinguishes a deliberate
    /// opt-out (mid-match this is a concession: the player stays, as a
    /// spectator) from a connection drop (mid-match the role is retained
    /// for rejoin). Outside a running match both are a plain removal.
    pub async fn leave(&self, player: PlayerId, intentional: bool) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::Leave {
            player,
            intentional,
            reply,
        })
        .await?
    }

    /// Changes a player's role. Refused outside the waiting phase unless
    /// `admin` is set.
    pub async fn set_role(
        &self,
        player: PlayerId,
        role: Role,
        admin: bool,
    ) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::SetRole {
            player,
            role,
            admin,
            reply,
        })
        .await?
    }

    /// Pins (or unpins) a player's role against auto-assignment.
    pub async fn pin_role(&self, player: PlayerId, pinned: bool) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::PinRole {
            player,
            pinned,
            reply,
        })
        .await?
    }

    /// Reports a death. Fire-and-forget: outside a running match this
    /// only feeds statistics.
    pub async fn report_death(
        &self,
        player: PlayerId,
        killer: Option<PlayerId>,
    ) -> Result<(), EngineError> {
        self.send(EngineCommand::ReportDeath { player, killer }).await
    }

    /// Reports damage dealt, for the statistics surface.
    pub async fn report_damage(
        &self,
        attacker: PlayerId,
        victim: PlayerId,
        amount: f64,
    ) -> Result<(), EngineError> {
        self.send(EngineCommand::ReportDamage {
            attacker,
            victim,
            amount,
        })
        .await
    }

    /// Reports a player entering a world, for the statistics surface.
    pub async fn report_dimension_visit(
        &self,
        player: PlayerId,
        world: WorldId,
    ) -> Result<(), EngineError> {
        self.send(EngineCommand::ReportDimensionVisit { player, world })
            .await
    }

    /// A runner completed the end objective: the match ends, runners win.
    pub async fn objective_complete(&self, player: PlayerId) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::ObjectiveComplete { player, reply })
            .await?
    }

    /// Admin: begin the start countdown now, skipping the eligibility check.
    pub async fn force_start(&self) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::ForceStart { reply }).await?
    }

    /// Admin: end the match with no winner.
    pub async fn force_end(&self, reason: impl Into<String>) -> Result<(), EngineError> {
        let reason = reason.into();
        self.request(|reply| EngineCommand::ForceEnd { reason, reply })
            .await?
    }

    /// Admin: skip the remainder of the reset countdown.
    pub async fn force_reset(&self) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::ForceReset { reply }).await?
    }

    /// Admin: change the auto-start minimum. Values below 2 are raised.
    pub async fn set_min_players(&self, min: usize) -> Result<(), EngineError> {
        self.send(EngineCommand::SetMinPlayers { min }).await
    }

    /// Admin: override a runner's respawn duration. `None` restores the
    /// configured default. Applies to future deaths, and retimes an
    /// in-flight ticket (a duration already served respawns them now).
    pub async fn set_custom_respawn(
        &self,
        player: PlayerId,
        secs: Option<u32>,
    ) -> Result<(), EngineError> {
        self.send(EngineCommand::SetCustomRespawn { player, secs })
            .await
    }

    /// A snapshot of the session for status displays.
    pub async fn info(&self) -> Result<SessionInfo, EngineError> {
        self.request(|reply| EngineCommand::GetInfo { reply }).await
    }

    /// The current lifecycle phase.
    pub async fn phase(&self) -> Result<SessionPhase, EngineError> {
        Ok(self.info().await?.phase)
    }

    /// Seconds until a dead runner respawns, `None` if they have no ticket.
    pub async fn remaining_respawn(&self, player: PlayerId) -> Result<Option<u32>, EngineError> {
        self.request(|reply| EngineCommand::RemainingRespawn { player, reply })
            .await
    }

    /// Stops the engine actor. Every pending timer is aborted.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Shutdown).await
    }
}

/// Spawns the engine actor and returns a handle plus the outbound event
/// streams. The config is validated (out-of-range values repaired) before
/// use.
pub fn spawn_engine<S: SpatialQuery>(
    config: EngineConfig,
    spatial: S,
) -> (EngineHandle, EventStreams) {
    let config = config.validated();
    let (bus, streams) = EventBus::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
    let (tick_tx, tick_rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);

    let actor = EngineActor {
        config,
        phase: SessionPhase::Waiting,
        started_at: None,
        roster: Roster::new(),
        respawns: RespawnTable::new(),
        dead: HashSet::new(),
        hunter_pending: HashSet::new(),
        proximity: HashMap::new(),
        custom_durations: HashMap::new(),
        runner_ever_joined: false,
        win: None,
        start_remaining: 0,
        reset_remaining: 0,
        timers: TaskRegistry::new(),
        spatial,
        bus,
        tick_tx,
        rx: cmd_rx,
        tick_rx,
    };
    tokio::spawn(actor.run());

    (EngineHandle { tx: cmd_tx }, streams)
}

// ---------------------------------------------------------------------------
// The actor
// ---------------------------------------------------------------------------

struct EngineActor<S> {
    config: EngineConfig,
    phase: SessionPhase,
    /// Set when the match transitions to Running; kept through Ended for
    /// status displays, cleared on reset.
    started_at: Option<Instant>,
    roster: Roster,
    respawns: RespawnTable,
    /// Every currently dead player, regardless of role.
    dead: HashSet<PlayerId>,
    /// Dead hunters with an instant respawn already scheduled.
    hunter_pending: HashSet<PlayerId>,
    /// Last broadcast tier per runner; notices fire only on change.
    proximity: HashMap<PlayerId, ProximityTier>,
    /// Per-player respawn duration overrides, in seconds.
    custom_durations: HashMap<PlayerId, u32>,
    /// Guards win evaluation against a match that never fielded a runner.
    runner_ever_joined: bool,
    win: Option<WinRecord>,
    start_remaining: u32,
    reset_remaining: u32,
    timers: TaskRegistry<TimerKey>,
    spatial: S,
    bus: EventBus,
    tick_tx: mpsc::Sender<TimerEvent>,
    rx: mpsc::Receiver<EngineCommand>,
    tick_rx: mpsc::Receiver<TimerEvent>,
}

impl<S: SpatialQuery> EngineActor<S> {
    async fn run(mut self) {
        info!("session engine started, phase Waiting");
        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                    }
                    // Every handle dropped: nothing can reach us again.
                    None => break,
                },
                // The actor holds a tick sender itself, so this branch
                // never yields None.
                Some(tick) = self.tick_rx.recv() => self.handle_tick(tick),
            }
        }
        info!("session engine stopped");
        // TaskRegistry::drop aborts any timers still running.
    }

    /// Returns `true` when the actor should stop.
    fn handle_command(&mut self, cmd: EngineCommand) -> bool {
        match cmd {
            EngineCommand::Join { player, role, reply } => {
                let _ = reply.send(self.handle_join(player, role));
            }
            EngineCommand::Leave {
                player,
                intentional,
                reply,
            } => {
                let _ = reply.send(self.handle_leave(player, intentional));
            }
            EngineCommand::SetRole {
                player,
                role,
                admin,
                reply,
            } => {
                let _ = reply.send(self.handle_set_role(player, role, admin));
            }
            EngineCommand::PinRole {
                player,
                pinned,
                reply,
            } => {
                let result = self.roster.set_pinned(player, pinned).map_err(Into::into);
                let _ = reply.send(result);
            }
            EngineCommand::ReportDeath { player, killer } => {
                self.handle_report_death(player, killer);
            }
            EngineCommand::ReportDamage {
                attacker,
                victim,
                amount,
            } => {
                self.bus.stat(Stat::Damage {
                    attacker,
                    victim,
                    amount,
                });
            }
            EngineCommand::ReportDimensionVisit { player, world } => {
                self.bus.stat(Stat::DimensionVisit { player, world });
            }
            EngineCommand::ObjectiveComplete { player, reply } => {
                let _ = reply.send(self.handle_objective_complete(player));
            }
            EngineCommand::ForceStart { reply } => {
                let _ = reply.send(self.handle_force_start());
            }
            EngineCommand::ForceEnd { reason, reply } => {
                let _ = reply.send(self.handle_force_end(reason));
            }
            EngineCommand::ForceReset { reply } => {
                let _ = reply.send(self.handle_force_reset());
            }
            EngineCommand::SetMinPlayers { min } => {
                self.config.min_players = min.max(2);
                info!(min_players = self.config.min_players, "minimum players updated");
                self.check_auto_start();
            }
            EngineCommand::SetCustomRespawn { player, secs } => {
                self.handle_set_custom_respawn(player, secs);
            }
            EngineCommand::GetInfo { reply } => {
                let _ = reply.send(self.session_info());
            }
            EngineCommand::RemainingRespawn { player, reply } => {
                let _ = reply.send(self.respawns.remaining_secs(player));
            }
            EngineCommand::Shutdown => return true,
        }
        false
    }

    fn handle_tick(&mut self, tick: TimerEvent) {
        match tick {
            TimerEvent::StartTick => self.on_start_tick(),
            TimerEvent::ResetTick => self.on_reset_tick(),
            TimerEvent::ProximityScan => self.on_proximity_scan(),
            TimerEvent::RespawnFired(player) => self.on_respawn_fired(player),
            TimerEvent::RespawnTick(player) => self.on_respawn_tick(player),
        }
    }

    // -- Roster surface ----------------------------------------------------

    fn handle_join(
        &mut self,
        player: PlayerId,
        requested: Option<Role>,
    ) -> Result<JoinOutcome, EngineError> {
        if let Some(current) = self.roster.role_of(player) {
            debug!(%player, "join for already-rostered player is a no-op");
            return Ok(JoinOutcome {
                role: current,
                rejoined: false,
            });
        }

        if self.roster.disconnected_role(player).is_some() {
            if self.phase.is_running() {
                let role = self.roster.take_disconnected(player)?;
                self.roster.add(player, role);
                // A reclaimed role stays pinned.
                let _ = self.roster.set_pinned(player, true);
                info!(%player, %role, "player rejoined mid-match");
                self.bus.notice(Notice::PlayerRejoined { player, role });
                self.bus.stat(Stat::Join { player });
                return Ok(JoinOutcome { role, rejoined: true });
            }
            // The match the record belonged to is over; drop it so the
            // invariant "records exist only for absent mid-match players"
            // holds across phases.
            let _ = self.roster.take_disconnected(player);
        }

        let role = if self.phase.roles_unlocked() {
            requested.unwrap_or(Role::Spectator)
        } else {
            // Roles are locked: late joiners watch.
            Role::Spectator
        };
        self.roster.add(player, role);
        if requested.is_some() && self.phase.roles_unlocked() {
            // An explicit choice counts as a pin.
            let _ = self.roster.set_pinned(player, true);
        }
        self.bus.notice(Notice::PlayerJoined { player, role });
        self.bus.stat(Stat::Join { player });
        self.check_auto_start();
        Ok(JoinOutcome {
            role,
            rejoined: false,
        })
    }

    fn handle_leave(&mut self, player: PlayerId, intentional: bool) -> Result<(), EngineError> {
        let Some(role) = self.roster.role_of(player) else {
            if self.roster.disconnected_role(player).is_some() {
                // Duplicate disconnect notification; the role is already
                // stored.
                return Ok(());
            }
            return Err(RosterError::UnknownPlayer(player).into());
        };

        self.purge_respawn_state(player);

        if self.phase.is_running() {
            if intentional && role.is_competitor() {
                // A deliberate mid-match opt-out is a concession: the
                // player stays on the roster as a spectator and never
                // gets the competitor role back.
                self.roster.set_role(player, Role::Spectator)?;
                info!(%player, "conceded, now spectating");
                self.bus.notice(Notice::RoleChanged {
                    player,
                    role: Role::Spectator,
                });
            } else if intentional {
                // A spectator walking out mid-match is a plain removal.
                self.roster.remove(player)?;
                self.bus.notice(Notice::PlayerLeft { player });
                self.bus.stat(Stat::Leave { player });
            } else {
                self.roster.mark_disconnected(player)?;
                self.bus.notice(Notice::PlayerLeft { player });
                self.bus.stat(Stat::Leave { player });
            }
            if role.is_competitor() {
                self.evaluate_win();
            }
            return Ok(());
        }

        self.roster.remove(player)?;
        self.bus.notice(Notice::PlayerLeft { player });
        self.bus.stat(Stat::Leave { player });
        if self.phase == SessionPhase::Starting {
            self.verify_teams_or_cancel();
        }
        Ok(())
    }

    fn handle_set_role(
        &mut self,
        player: PlayerId,
        role: Role,
        admin: bool,
    ) -> Result<(), EngineError> {
        if !admin && !self.phase.roles_unlocked() {
            return Err(EngineError::RolesLocked);
        }
        let old = self.roster.set_role(player, role)?;
        if old == role {
            return Ok(());
        }
        let _ = self.roster.set_pinned(player, true);
        // Whatever death bookkeeping existed belonged to the old role.
        self.purge_respawn_state(player);
        self.bus.notice(Notice::RoleChanged { player, role });

        match self.phase {
            SessionPhase::Waiting => self.check_auto_start(),
            SessionPhase::Starting => self.verify_teams_or_cancel(),
            SessionPhase::Running => self.evaluate_win(),
            SessionPhase::Ended => {}
        }
        Ok(())
    }

    // -- Start / reset lifecycle -------------------------------------------

    fn check_auto_start(&mut self) {
        if !self.config.auto_start || self.phase != SessionPhase::Waiting {
            return;
        }
        let counts = self.roster.counts();
        let eligible = counts.competitors() >= self.config.min_players
            && counts.hunters > 0
            && counts.runners > 0;
        if eligible {
            info!(
                competitors = counts.competitors(),
                min = self.config.min_players,
                "eligibility reached, starting countdown"
            );
            self.begin_starting();
        }
    }

    fn begin_starting(&mut self) {
        self.transition(SessionPhase::Starting);
        self.auto_assign();

        let counts = self.roster.counts();
        if counts.hunters == 0 || counts.runners == 0 {
            self.cancel_start("not enough willing players to field both teams");
            return;
        }

        self.start_remaining = self.config.start_countdown_secs;
        self.bus.notice(Notice::StartCountdown {
            remaining: self.start_remaining,
        });
        self.timers.insert(
            TimerKey::StartCountdown,
            send_every(
                Duration::from_secs(1),
                Duration::ZERO,
                self.tick_tx.clone(),
                TimerEvent::StartTick,
            ),
        );
    }

    /// Fills an empty team from the unpinned spectators, lowest id first.
    fn auto_assign(&mut self) {
        for team_role in [Role::Hunter, Role::Runner] {
            if !self.roster.all_with_role(team_role).is_empty() {
                continue;
            }
            let candidate = self
                .roster
                .all_with_role(Role::Spectator)
                .into_iter()
                .find(|p| !self.roster.is_pinned(*p));
            if let Some(player) = candidate {
                if self.roster.set_role(player, team_role).is_ok() {
                    info!(%player, role = %team_role, "auto-assigned to fill an empty team");
                    self.bus.notice(Notice::RoleChanged {
                        player,
                        role: team_role,
                    });
                }
            }
        }
    }

    fn on_start_tick(&mut self) {
        if self.phase != SessionPhase::Starting {
            return;
        }
        self.start_remaining = self.start_remaining.saturating_sub(1);
        if self.start_remaining == 0 {
            // Final verification: the countdown is long enough for a team
            // to have emptied out under us.
            let counts = self.roster.counts();
            if counts.hunters == 0 || counts.runners == 0 {
                self.cancel_start("a team emptied out during the countdown");
            } else {
                self.begin_running();
            }
        } else {
            self.bus.notice(Notice::StartCountdown {
                remaining: self.start_remaining,
            });
        }
    }

    fn verify_teams_or_cancel(&mut self) {
        let counts = self.roster.counts();
        if counts.hunters == 0 || counts.runners == 0 {
            self.cancel_start("a team emptied out during the countdown");
        }
    }

    fn cancel_start(&mut self, reason: &str) {
        self.timers.cancel(&TimerKey::StartCountdown);
        warn!(%reason, "start cancelled");
        self.bus.notice(Notice::StartCancelled {
            reason: reason.to_string(),
        });
        self.transition(SessionPhase::Waiting);
    }

    fn begin_running(&mut self) {
        self.timers.cancel(&TimerKey::StartCountdown);
        self.transition(SessionPhase::Running);
        self.started_at = Some(Instant::now());
        // The start verification just confirmed a non-empty runner team.
        self.runner_ever_joined = true;
        self.timers.insert(
            TimerKey::ProximityScan,
            send_every(
                self.config.proximity.scan_interval,
                Duration::ZERO,
                self.tick_tx.clone(),
                TimerEvent::ProximityScan,
            ),
        );
        info!("match running");
    }

    fn on_reset_tick(&mut self) {
        if !self.phase.is_ended() {
            return;
        }
        self.reset_remaining = self.reset_remaining.saturating_sub(1);
        if self.reset_remaining == 0 {
            self.reset_session();
        } else if announce_reset_tick(self.reset_remaining) {
            self.bus.notice(Notice::ResetCountdown {
                remaining: self.reset_remaining,
            });
        }
    }

    fn reset_session(&mut self) {
        self.timers.cancel_all();
        self.roster.clear();
        self.respawns.clear();
        self.dead.clear();
        self.hunter_pending.clear();
        self.proximity.clear();
        self.custom_durations.clear();
        self.win = None;
        self.started_at = None;
        self.runner_ever_joined = false;
        self.start_remaining = 0;
        self.reset_remaining = 0;
        self.transition(SessionPhase::Waiting);
        info!("session reset, accepting joins");
    }

    // -- Deaths and respawns -----------------------------------------------

    fn handle_report_death(&mut self, player: PlayerId, killer: Option<PlayerId>) {
        self.bus.stat(Stat::Death { player });
        if let Some(killer) = killer {
            self.bus.stat(Stat::Kill {
                killer,
                victim: player,
            });
        }
        if !self.phase.is_running() {
            trace!(%player, phase = %self.phase, "death outside a running match, scheduler ignores it");
            return;
        }
        let Some(role) = self.roster.role_of(player) else {
            debug!(%player, "death report for unrostered player ignored");
            return;
        };

        match role.respawn_policy() {
            RespawnPolicy::Ticketed => {
                let secs = self
                    .custom_durations
                    .get(&player)
                    .copied()
                    .unwrap_or(self.config.respawn_secs);
                if secs == 0 {
                    // Zero duration: down and back up within one command,
                    // never counted as dead.
                    self.bus.notice(Notice::Respawned { player });
                    return;
                }
                let death_position = match self.spatial.locate(player) {
                    Ok(pos) => Some(pos),
                    Err(err) => {
                        debug!(%player, %err, "death position unreadable, respawn will not teleport");
                        None
                    }
                };
                let duration = Duration::from_secs(u64::from(secs));
                self.dead.insert(player);
                // Dead runners carry no threat tier; the next scan after
                // respawn re-establishes one.
                self.proximity.remove(&player);
                self.respawns.insert(player, duration, death_position);
                self.timers.insert(
                    TimerKey::Respawn(player),
                    send_after(duration, self.tick_tx.clone(), TimerEvent::RespawnFired(player)),
                );
                self.timers.insert(
                    TimerKey::RespawnTicker(player),
                    send_every(
                        Duration::from_secs(1),
                        Duration::ZERO,
                        self.tick_tx.clone(),
                        TimerEvent::RespawnTick(player),
                    ),
                );
                self.bus.notice(Notice::RespawnCountdown {
                    player,
                    remaining: secs,
                    urgent: urgent_respawn_tick(secs),
                });
                self.evaluate_win();
            }
            RespawnPolicy::Quick => {
                self.dead.insert(player);
                if self.config.hunter_instant_respawn {
                    self.hunter_pending.insert(player);
                    self.timers.insert(
                        TimerKey::Respawn(player),
                        send_after(
                            self.config.hunter_respawn_delay,
                            self.tick_tx.clone(),
                            TimerEvent::RespawnFired(player),
                        ),
                    );
                } else {
                    info!(%player, "hunter down with instant respawn disabled, out for the round");
                }
                self.evaluate_win();
            }
            RespawnPolicy::NotApplicable => {
                trace!(%player, "spectator death, nothing to schedule");
            }
        }
    }

    fn on_respawn_fired(&mut self, player: PlayerId) {
        if !self.phase.is_running() {
            return;
        }
        if !self.dead.contains(&player) {
            trace!(%player, "stale respawn timer ignored");
            return;
        }
        self.finish_respawn(player);
    }

    fn on_respawn_tick(&mut self, player: PlayerId) {
        if !self.phase.is_running() {
            return;
        }
        let Some(remaining) = self.respawns.remaining_secs(player) else {
            return;
        };
        if remaining > 0 {
            self.bus.notice(Notice::RespawnCountdown {
                player,
                remaining,
                urgent: urgent_respawn_tick(remaining),
            });
        }
    }

    fn handle_set_custom_respawn(&mut self, player: PlayerId, secs: Option<u32>) {
        match secs {
            Some(s) => {
                info!(%player, secs = s, "custom respawn duration set");
                self.custom_durations.insert(player, s);
            }
            None => {
                self.custom_durations.remove(&player);
            }
        }
        if !self.respawns.contains(player) {
            return;
        }
        // An active ticket is retimed against its original death instant.
        let duration = Duration::from_secs(u64::from(secs.unwrap_or(self.config.respawn_secs)));
        match self.respawns.reschedule(player, duration) {
            Some(left) => {
                self.timers.insert(
                    TimerKey::Respawn(player),
                    send_after(left, self.tick_tx.clone(), TimerEvent::RespawnFired(player)),
                );
                let remaining = self.respawns.remaining_secs(player).unwrap_or(0);
                self.bus.notice(Notice::RespawnCountdown {
                    player,
                    remaining,
                    urgent: urgent_respawn_tick(remaining),
                });
            }
            // The new duration has already been served in full.
            None => self.finish_respawn(player),
        }
    }

    fn finish_respawn(&mut self, player: PlayerId) {
        self.timers.cancel(&TimerKey::Respawn(player));
        self.timers.cancel(&TimerKey::RespawnTicker(player));
        let ticket = self.respawns.remove(player);
        self.dead.remove(&player);
        self.hunter_pending.remove(&player);

        if let Some(pos) = ticket.and_then(|t| t.death_position) {
            if let Err(err) = self.spatial.teleport(player, pos) {
                warn!(%player, %err, "respawn teleport failed, leaving player in place");
            }
        }
        info!(%player, "respawned");
        self.bus.notice(Notice::Respawned { player });
        // A respawn narrows nobody's options, but the evaluator is the
        // single source of truth, so ask it anyway.
        self.evaluate_win();
    }

    /// Drops every piece of death bookkeeping a player might hold. Safe
    /// to call for players with none — all operations are idempotent.
    fn purge_respawn_state(&mut self, player: PlayerId) {
        self.timers.cancel(&TimerKey::Respawn(player));
        self.timers.cancel(&TimerKey::RespawnTicker(player));
        self.respawns.remove(player);
        self.dead.remove(&player);
        self.hunter_pending.remove(&player);
        self.proximity.remove(&player);
    }

    // -- Win evaluation and match end --------------------------------------

    fn evaluate_win(&mut self) {
        if self.win.is_some() || !self.phase.is_running() {
            return;
        }
        let hunters = self.roster.all_with_role(Role::Hunter);
        let runners = self.roster.all_with_role(Role::Runner);
        let record = evaluate(&WinInputs {
            hunters: &hunters,
            runners: &runners,
            dead: &self.dead,
            hunter_respawn_pending: &self.hunter_pending,
            runner_ever_joined: self.runner_ever_joined,
        });
        if let Some(record) = record {
            self.end_match(record);
        }
    }

    fn handle_objective_complete(&mut self, player: PlayerId) -> Result<(), EngineError> {
        if !self.phase.is_running() {
            return Err(EngineError::InvalidPhase {
                action: "complete the objective",
                actual: self.phase,
            });
        }
        match self.roster.role_of(player) {
            Some(Role::Runner) => {
                info!(%player, "objective completed, runners win");
                self.end_match(WinRecord {
                    winner: Some(Team::Runners),
                    trigger: WinTrigger::Objective { player },
                });
                Ok(())
            }
            Some(role) => {
                warn!(%player, %role, "objective completion by a non-runner ignored");
                Ok(())
            }
            None => Err(RosterError::UnknownPlayer(player).into()),
        }
    }

    fn end_match(&mut self, record: WinRecord) {
        if self.win.is_some() {
            // The outcome is immutable; a second trigger in the same
            // command batch loses.
            return;
        }
        self.timers.cancel_all();
        self.respawns.clear();
        self.dead.clear();
        self.hunter_pending.clear();
        self.proximity.clear();

        self.transition(SessionPhase::Ended);
        info!(winner = ?record.winner, trigger = ?record.trigger, "match ended");
        self.bus.notice(Notice::MatchEnded {
            record: record.clone(),
        });
        self.win = Some(record);

        self.reset_remaining = self.config.reset_countdown_secs;
        if announce_reset_tick(self.reset_remaining) {
            self.bus.notice(Notice::ResetCountdown {
                remaining: self.reset_remaining,
            });
        }
        self.timers.insert(
            TimerKey::ResetCountdown,
            send_every(
                Duration::from_secs(1),
                Duration::ZERO,
                self.tick_tx.clone(),
                TimerEvent::ResetTick,
            ),
        );
    }

    // -- Admin surface -------------------------------------------------------

    fn handle_force_start(&mut self) -> Result<(), EngineError> {
        if self.phase != SessionPhase::Waiting {
            return Err(EngineError::InvalidPhase {
                action: "force start",
                actual: self.phase,
            });
        }
        info!("start forced by admin");
        self.begin_starting();
        Ok(())
    }

    fn handle_force_end(&mut self, reason: String) -> Result<(), EngineError> {
        match self.phase {
            SessionPhase::Starting | SessionPhase::Running => {
                info!(%reason, "match force-ended by admin");
                self.end_match(WinRecord {
                    winner: None,
                    trigger: WinTrigger::AdminForced { reason },
                });
                Ok(())
            }
            actual => Err(EngineError::InvalidPhase {
                action: "force end",
                actual,
            }),
        }
    }

    fn handle_force_reset(&mut self) -> Result<(), EngineError> {
        if !self.phase.is_ended() {
            return Err(EngineError::InvalidPhase {
                action: "force reset",
                actual: self.phase,
            });
        }
        info!("reset forced by admin");
        self.reset_session();
        Ok(())
    }

    // -- Proximity -----------------------------------------------------------

    fn on_proximity_scan(&mut self) {
        if !self.phase.is_running() {
            return;
        }

        let hunter_ids = self.roster.all_with_role(Role::Hunter);
        let mut hunters: Vec<(PlayerId, Position)> = Vec::with_capacity(hunter_ids.len());
        for hunter in hunter_ids {
            if self.dead.contains(&hunter) {
                continue;
            }
            match self.spatial.locate(hunter) {
                Ok(pos) => hunters.push((hunter, pos)),
                Err(err) => trace!(%hunter, %err, "hunter position unreadable this tick"),
            }
        }

        for runner in self.roster.all_with_role(Role::Runner) {
            if self.dead.contains(&runner) {
                continue;
            }
            let runner_pos = match self.spatial.locate(runner) {
                Ok(pos) => pos,
                Err(err) => {
                    // No information this tick: keep the previous tier.
                    trace!(%runner, %err, "runner position unreadable this tick");
                    continue;
                }
            };
            let tier = scan_runner(
                &self.spatial,
                runner,
                &runner_pos,
                &hunters,
                &self.config.proximity,
            );
            let prev = self.proximity.get(&runner).copied().unwrap_or_default();
            if tier != prev {
                self.proximity.insert(runner, tier);
                debug!(%runner, %tier, "proximity tier changed");
                self.bus.notice(Notice::ProximityChanged {
                    player: runner,
                    tier,
                });
            }
        }
    }

    // -- Internals -----------------------------------------------------------

    fn session_info(&mut self) -> SessionInfo {
        SessionInfo {
            phase: self.phase,
            counts: self.roster.counts(),
            elapsed: self.started_at.map(|t| t.elapsed()),
            dead: self.dead.len(),
            outcome: self.win.clone(),
        }
    }

    fn transition(&mut self, to: SessionPhase) {
        if !self.phase.can_transition_to(to) {
            warn!(from = %self.phase, %to, "illegal phase transition refused");
            return;
        }
        let from = self.phase;
        self.phase = to;
        info!(%from, %to, "session phase changed");
        self.bus.notice(Notice::PhaseChanged { from, to });
    }
}

// =========================================================================
// Tests
// =========================================================================
