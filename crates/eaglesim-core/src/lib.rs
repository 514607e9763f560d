//! Core types and turn resolution for the eagle foraging simulation.
//!
//! The engine is single-threaded and fully synchronous: a session is a
//! sequence of days, each resolved by calling [`Simulation::start_day`],
//! [`Simulation::apply`], and [`Simulation::finish_day`] in order. All
//! randomness flows through one seeded RNG owned by the simulation, and all
//! state changes are mirrored to an installed [`SimObserver`] so a renderer
//! can subscribe without feeding anything back into the engine.

use rand::{Rng, RngCore, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

new_key_type! {
    /// Stable handle for resources backed by a generational slot map.
    pub struct ResourceId;
}

/// Minimum number of hours a single rest may cover.
pub const MIN_REST_HOURS: i64 = 1;
/// Maximum number of hours a single rest may cover.
pub const MAX_REST_HOURS: i64 = 10;

/// Errors produced by the simulation engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Rest duration outside the allowed window; no state was changed.
    #[error("resting hours should be between {MIN_REST_HOURS} and {MAX_REST_HOURS}, got {hours}")]
    RestOutOfRange { hours: i64 },
}

/// Static configuration for one foraging session.
///
/// The defaults reproduce the classic ruleset: a 100x100 territory centered
/// on the origin, a quarter chance of a resource per day, and 25 actionable
/// days with the following day reserved for the win declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Half-extent of the territory along the x axis.
    pub territory_length: i32,
    /// Half-extent of the territory along the y axis.
    pub territory_width: i32,
    /// Per-day probability that a resource appears.
    pub spawn_probability: f64,
    /// Smallest energy payload a spawned resource may carry.
    pub resource_energy_min: i32,
    /// Largest energy payload a spawned resource may carry.
    pub resource_energy_max: i32,
    /// Shortest lifetime (in days) of a spawned resource.
    pub resource_duration_min: u32,
    /// Longest lifetime (in days) of a spawned resource.
    pub resource_duration_max: u32,
    /// Energy the eagle starts the session with.
    pub starting_energy: f64,
    /// Number of actionable days before the reserved win day.
    pub playable_days: u32,
    /// Optional RNG seed for reproducible sessions.
    pub rng_seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            territory_length: 100,
            territory_width: 100,
            spawn_probability: 0.25,
            resource_energy_min: 1,
            resource_energy_max: 10,
            resource_duration_min: 1,
            resource_duration_max: 3,
            starting_energy: 250.0,
            playable_days: 25,
            rng_seed: None,
        }
    }
}

impl SimConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.territory_length <= 0 || self.territory_width <= 0 {
            return Err(SimError::InvalidConfig(
                "territory dimensions must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(SimError::InvalidConfig(
                "spawn_probability must lie in [0, 1]",
            ));
        }
        if self.resource_energy_min < 1 || self.resource_energy_min > self.resource_energy_max {
            return Err(SimError::InvalidConfig(
                "resource energy range must be non-empty and start at 1 or above",
            ));
        }
        if self.resource_duration_min < 1 || self.resource_duration_min > self.resource_duration_max
        {
            return Err(SimError::InvalidConfig(
                "resource duration range must be non-empty and start at 1 or above",
            ));
        }
        if self.starting_energy <= 0.0 {
            return Err(SimError::InvalidConfig("starting_energy must be positive"));
        }
        if self.playable_days == 0 {
            return Err(SimError::InvalidConfig("playable_days must be non-zero"));
        }
        Ok(())
    }

    /// Territory bounds derived from the configured dimensions.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        Bounds {
            length: self.territory_length,
            width: self.territory_width,
        }
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Legal coordinate range of a territory, symmetric around the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    /// Half-extent along x; legal x values lie in `[-length, length]`.
    pub length: i32,
    /// Half-extent along y; legal y values lie in `[-width, width]`.
    pub width: i32,
}

impl Bounds {
    /// Clamps a coordinate pair into the legal range.
    #[must_use]
    pub fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        (
            x.clamp(-self.length, self.length),
            y.clamp(-self.width, self.width),
        )
    }

    /// Whether a coordinate pair lies inside the legal range.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= -self.length && x <= self.length && y >= -self.width && y <= self.width
    }
}

/// Values chosen by a spawner for a new resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSeed {
    pub x: i32,
    pub y: i32,
    pub energy: i32,
    pub duration: u32,
}

/// A transient, collectible energy source.
///
/// The active flag transitions exactly once: a resource that expired or was
/// consumed never becomes active again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    x: i32,
    y: i32,
    energy: i32,
    duration: u32,
    active: bool,
}

impl Resource {
    fn new(seed: ResourceSeed) -> Self {
        Self {
            x: seed.x,
            y: seed.y,
            energy: seed.energy,
            duration: seed.duration,
            active: true,
        }
    }

    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    #[must_use]
    pub const fn energy(&self) -> i32 {
        self.energy
    }

    /// Remaining lifetime in days.
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.duration
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    /// Ages the resource by one day, returning `true` if it expired.
    fn age(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.duration = self.duration.saturating_sub(1);
        if self.duration == 0 {
            self.active = false;
            return true;
        }
        false
    }
}

/// Decides whether a resource appears on a given day.
///
/// Implementations draw from the supplied RNG only, so a scripted spawner in
/// tests can ignore it entirely.
pub trait ResourceSpawner: Send {
    fn maybe_spawn(&mut self, bounds: &Bounds, rng: &mut dyn RngCore) -> Option<ResourceSeed>;
}

/// The production spawner: uniform position, energy, and duration draws
/// gated by a fixed per-day probability.
#[derive(Debug, Clone)]
pub struct RandomResourceSpawner {
    probability: f64,
    energy_min: i32,
    energy_max: i32,
    duration_min: u32,
    duration_max: u32,
}

impl RandomResourceSpawner {
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            probability: config.spawn_probability,
            energy_min: config.resource_energy_min,
            energy_max: config.resource_energy_max,
            duration_min: config.resource_duration_min,
            duration_max: config.resource_duration_max,
        }
    }
}

impl ResourceSpawner for RandomResourceSpawner {
    fn maybe_spawn(&mut self, bounds: &Bounds, rng: &mut dyn RngCore) -> Option<ResourceSeed> {
        if rng.random::<f64>() >= self.probability {
            return None;
        }
        Some(ResourceSeed {
            x: rng.random_range(-bounds.length..=bounds.length),
            y: rng.random_range(-bounds.width..=bounds.width),
            energy: rng.random_range(self.energy_min..=self.energy_max),
            duration: rng.random_range(self.duration_min..=self.duration_max),
        })
    }
}

/// State-change events published to the installed observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SimEvent {
    ResourceSpawned {
        id: ResourceId,
        x: i32,
        y: i32,
        energy: i32,
        duration: u32,
    },
    ResourceExpired {
        id: ResourceId,
    },
    ResourceConsumed {
        id: ResourceId,
        energy: i32,
    },
    EagleMoved {
        x: i32,
        y: i32,
        distance: f64,
        speed: i32,
        energy: f64,
    },
    EagleRested {
        hours: i64,
        energy: f64,
    },
}

/// Sink for state-change events; the engine never blocks on it and nothing
/// flows back through it.
pub trait SimObserver: Send {
    fn on_event(&mut self, event: &SimEvent);
}

/// No-op observer installed by default.
pub struct NullObserver;

impl SimObserver for NullObserver {
    fn on_event(&mut self, _event: &SimEvent) {}
}

/// Summary of one completed flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Flight {
    pub x: i32,
    pub y: i32,
    pub speed: i32,
    pub distance: f64,
    pub time: f64,
    pub energy_burned: f64,
    pub energy_left: f64,
}

/// One resource consumed during a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Consumption {
    pub id: ResourceId,
    pub x: i32,
    pub y: i32,
    pub energy: i32,
}

/// Point-in-time snapshot of the eagle's cumulative accounting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    pub day: u32,
    pub total_distance: f64,
    pub total_time: f64,
    pub energy: f64,
}

/// Read-only view of one active resource, presented to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceView {
    pub id: ResourceId,
    pub x: i32,
    pub y: i32,
    pub energy: i32,
    pub duration: u32,
}

/// The player-controlled agent.
///
/// Energy is a soft budget: a flight may drive it negative, and survival is
/// only checked once per day after the action resolves. Score is the sum of
/// per-flight Euclidean distances and never decreases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eagle {
    name: String,
    energy: f64,
    x: i32,
    y: i32,
    total_distance: f64,
    total_time: f64,
    score: f64,
}

impl Eagle {
    #[must_use]
    pub fn new(name: impl Into<String>, energy: f64) -> Self {
        Self {
            name: name.into(),
            energy,
            x: 0,
            y: 0,
            total_distance: 0.0,
            total_time: 0.0,
            score: 0.0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn energy(&self) -> f64 {
        self.energy
    }

    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    #[must_use]
    pub const fn total_distance(&self) -> f64 {
        self.total_distance
    }

    #[must_use]
    pub const fn total_time(&self) -> f64 {
        self.total_time
    }

    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Flies straight to `(x, y)` at `speed`, paying the distance-based
    /// energy cost. Never fails: insufficient energy does not block movement
    /// and is only observed later through [`Eagle::is_alive`].
    ///
    /// Callers guarantee `speed > 0`; the shell rejects anything else before
    /// it reaches the engine.
    pub fn fly_to(&mut self, x: i32, y: i32, speed: i32) -> Flight {
        let dx = f64::from(x - self.x);
        let dy = f64::from(y - self.y);
        let distance = dx.hypot(dy);
        let time = distance / f64::from(speed);
        let energy_burned = distance / 10.0 * f64::from(speed);

        self.x = x;
        self.y = y;
        self.energy -= energy_burned;
        self.total_distance += distance;
        self.total_time += time;
        self.score += distance;

        Flight {
            x,
            y,
            speed,
            distance,
            time,
            energy_burned,
            energy_left: self.energy,
        }
    }

    /// Rests for `hours`, regaining one energy per hour. Rejects hours
    /// outside `[MIN_REST_HOURS, MAX_REST_HOURS]` without any state change.
    pub fn rest(&mut self, hours: i64) -> Result<(), SimError> {
        if !(MIN_REST_HOURS..=MAX_REST_HOURS).contains(&hours) {
            return Err(SimError::RestOutOfRange { hours });
        }
        self.energy += hours as f64;
        self.total_time += hours as f64;
        Ok(())
    }

    /// Consumes `resource` if the eagle sits exactly on it and it is still
    /// active, returning the energy gained. Anywhere else this is a silent
    /// no-op, which is the common case.
    pub fn consume(&mut self, resource: &mut Resource) -> Option<i32> {
        if (self.x, self.y) != resource.position() || !resource.is_active() {
            return None;
        }
        self.energy += f64::from(resource.energy());
        resource.deactivate();
        Some(resource.energy())
    }

    /// Whether the eagle still has energy left to continue.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }

    /// Pure snapshot of the cumulative accounting for `day`.
    #[must_use]
    pub fn status(&self, day: u32) -> StatusReport {
        StatusReport {
            day,
            total_distance: self.total_distance,
            total_time: self.total_time,
            energy: self.energy,
        }
    }
}

/// The bounded coordinate space and resource registry.
///
/// Every resource ever spawned is retained; expired and consumed ones stay
/// in the collection inactive so renderers and post-mortems can walk the
/// full history.
#[derive(Debug)]
pub struct Territory {
    bounds: Bounds,
    resources: SlotMap<ResourceId, Resource>,
    spawn_order: Vec<ResourceId>,
}

impl Territory {
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            resources: SlotMap::with_key(),
            spawn_order: Vec::new(),
        }
    }

    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Registers a freshly spawned resource, returning its handle.
    pub fn insert(&mut self, seed: ResourceSeed) -> ResourceId {
        let id = self.resources.insert(Resource::new(seed));
        self.spawn_order.push(id);
        id
    }

    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(id)
    }

    /// Total number of resources ever spawned, active or not.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.spawn_order.len()
    }

    /// Iterates active resources in spawn order.
    pub fn active(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.spawn_order
            .iter()
            .filter_map(|id| self.resources.get(*id).map(|r| (*id, r)))
            .filter(|(_, r)| r.is_active())
    }

    /// Views of the active resources in spawn order, for the shell.
    #[must_use]
    pub fn active_views(&self) -> Vec<ResourceView> {
        self.active()
            .map(|(id, r)| ResourceView {
                id,
                x: r.position().0,
                y: r.position().1,
                energy: r.energy(),
                duration: r.duration(),
            })
            .collect()
    }

    /// Ages every active resource by one day, returning the handles of those
    /// that expired. Per-resource mutation is independent, so iteration
    /// order does not affect the outcome.
    pub fn age_resources(&mut self) -> Vec<ResourceId> {
        let mut expired = Vec::new();
        for id in &self.spawn_order {
            if let Some(resource) = self.resources.get_mut(*id)
                && resource.age()
            {
                expired.push(*id);
            }
        }
        expired
    }

    /// Clamps a coordinate pair into the territory bounds.
    #[must_use]
    pub fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        self.bounds.clamp(x, y)
    }
}

/// One action chosen by the player for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnAction {
    Fly { x: i32, y: i32, speed: i32 },
    Rest { hours: i64 },
}

/// Result of applying a [`TurnAction`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ActionOutcome {
    /// The eagle flew and then attempted consumption against the day's
    /// resource snapshot.
    Flew {
        flight: Flight,
        consumed: Vec<Consumption>,
    },
    /// The eagle rested successfully.
    Rested { hours: i64, energy: f64 },
    /// Rest hours were out of range; nothing changed.
    RestRejected { hours: i64 },
}

/// What the engine reports when a new day begins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DayStart {
    /// The reserved final day: the session is won, no action is taken.
    Win { score: f64 },
    /// A playable day, with whatever spawned this morning and the snapshot
    /// of currently active resources.
    Play {
        day: u32,
        spawned: Option<ResourceView>,
        active: Vec<ResourceView>,
    },
}

/// End-of-day bookkeeping produced by [`Simulation::finish_day`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayEnd {
    pub status: StatusReport,
    pub alive: bool,
    /// Resources that expired during aging; empty when the eagle died,
    /// since a dead eagle ends the session before aging runs.
    pub expired: Vec<ResourceId>,
    pub score: f64,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The eagle survived all playable days.
    Won,
    /// Energy ran out before the reserved final day.
    Died,
}

/// Aggregate session state: the eagle, the territory, the spawner, and the
/// day counter, advanced in lockstep by the shell.
pub struct Simulation {
    config: SimConfig,
    rng: SmallRng,
    eagle: Eagle,
    territory: Territory,
    spawner: Box<dyn ResourceSpawner>,
    observer: Box<dyn SimObserver>,
    day: u32,
    day_snapshot: Vec<ResourceId>,
    outcome: Option<SessionOutcome>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("day", &self.day)
            .field("eagle", &self.eagle)
            .field("resource_count", &self.territory.resource_count())
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl Simulation {
    /// Builds a simulation with the production spawner and no observer.
    pub fn new(config: SimConfig, name: impl Into<String>) -> Result<Self, SimError> {
        let spawner = Box::new(RandomResourceSpawner::from_config(&config));
        Self::with_parts(config, name, spawner, Box::new(NullObserver))
    }

    /// Builds a simulation from explicit collaborators, the seam used by
    /// tests and renderers.
    pub fn with_parts(
        config: SimConfig,
        name: impl Into<String>,
        spawner: Box<dyn ResourceSpawner>,
        observer: Box<dyn SimObserver>,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let rng = config.seeded_rng();
        let territory = Territory::new(config.bounds());
        let eagle = Eagle::new(name, config.starting_energy);
        Ok(Self {
            config,
            rng,
            eagle,
            territory,
            spawner,
            observer,
            day: 0,
            day_snapshot: Vec::new(),
            outcome: None,
        })
    }

    /// Replace the observer sink.
    pub fn set_observer(&mut self, observer: Box<dyn SimObserver>) {
        self.observer = observer;
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn eagle(&self) -> &Eagle {
        &self.eagle
    }

    #[must_use]
    pub fn territory(&self) -> &Territory {
        &self.territory
    }

    /// Day counter; 0 until the first [`Simulation::start_day`].
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    fn emit(&mut self, event: SimEvent) {
        self.observer.on_event(&event);
    }

    /// Advances to the next day. On a playable day this runs the spawn roll
    /// and captures the consumption snapshot; on the reserved day after the
    /// last playable one it declares the win instead.
    pub fn start_day(&mut self) -> DayStart {
        self.day += 1;
        if self.day > self.config.playable_days {
            self.outcome = Some(SessionOutcome::Won);
            return DayStart::Win {
                score: self.eagle.score(),
            };
        }

        let bounds = self.territory.bounds();
        let seed = self.spawner.maybe_spawn(&bounds, &mut self.rng);
        let spawned = seed.map(|seed| {
            let id = self.territory.insert(seed);
            self.emit(SimEvent::ResourceSpawned {
                id,
                x: seed.x,
                y: seed.y,
                energy: seed.energy,
                duration: seed.duration,
            });
            ResourceView {
                id,
                x: seed.x,
                y: seed.y,
                energy: seed.energy,
                duration: seed.duration,
            }
        });

        let active = self.territory.active_views();
        self.day_snapshot = active.iter().map(|view| view.id).collect();
        DayStart::Play {
            day: self.day,
            spawned,
            active,
        }
    }

    /// Applies the player's action for the day.
    ///
    /// A flight clamps its destination into the territory, moves the eagle,
    /// and then attempts consumption against the snapshot captured by
    /// [`Simulation::start_day`] — a resource spawned later the same day is
    /// not eligible.
    pub fn apply(&mut self, action: TurnAction) -> ActionOutcome {
        match action {
            TurnAction::Fly { x, y, speed } => {
                let (x, y) = self.territory.clamp(x, y);
                let flight = self.eagle.fly_to(x, y, speed);
                self.emit(SimEvent::EagleMoved {
                    x,
                    y,
                    distance: flight.distance,
                    speed,
                    energy: flight.energy_left,
                });

                let snapshot = std::mem::take(&mut self.day_snapshot);
                let mut consumed = Vec::new();
                for id in &snapshot {
                    if let Some(resource) = self.territory.get_mut(*id) {
                        let (rx, ry) = resource.position();
                        if let Some(energy) = self.eagle.consume(resource) {
                            self.emit(SimEvent::ResourceConsumed { id: *id, energy });
                            consumed.push(Consumption {
                                id: *id,
                                x: rx,
                                y: ry,
                                energy,
                            });
                        }
                    }
                }
                self.day_snapshot = snapshot;
                ActionOutcome::Flew { flight, consumed }
            }
            TurnAction::Rest { hours } => match self.eagle.rest(hours) {
                Ok(()) => {
                    let energy = self.eagle.energy();
                    self.emit(SimEvent::EagleRested { hours, energy });
                    ActionOutcome::Rested { hours, energy }
                }
                Err(SimError::RestOutOfRange { hours }) => ActionOutcome::RestRejected { hours },
                Err(_) => unreachable!("rest only reports out-of-range hours"),
            },
        }
    }

    /// Closes the day: status snapshot, survival check, and — only if the
    /// eagle lives — resource aging. Death is terminal and recorded as the
    /// session outcome.
    pub fn finish_day(&mut self) -> DayEnd {
        let status = self.eagle.status(self.day);
        let alive = self.eagle.is_alive();
        let expired = if alive {
            let expired = self.territory.age_resources();
            for id in &expired {
                self.emit(SimEvent::ResourceExpired { id: *id });
            }
            expired
        } else {
            self.outcome = Some(SessionOutcome::Died);
            Vec::new()
        };
        DayEnd {
            status,
            alive,
            expired,
            score: self.eagle.score(),
        }
    }
}
