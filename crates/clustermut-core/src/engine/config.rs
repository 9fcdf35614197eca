use crate::core::collision::CollisionStrategy;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Seven bohr, the default random box increment of the packer, in Angstroms.
pub const DEFAULT_BOX_INCREMENT: f64 = 7.0 * 0.529_177_210_9;

/// Upper bound on lattice points per axis for the partner grid.
const MAX_PARTNER_GRID_POINTS: f64 = 1000.0;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Heuristic used to pick the unit that gets relocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitSelection {
    /// Unit with the fewest inter-unit contacts in the bond graph.
    #[default]
    LeastConnected,
    /// Unit with the largest single-unit contribution to the total energy.
    HighestEnergy,
}

/// Strategy used to enumerate candidate positions for the relocated unit.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case"
)]
pub enum SearchStrategy {
    /// Lattice over the bounding box of all unit centers.
    BoundingBoxGrid {
        #[serde(default = "default_scale_factor")]
        scale_factor: f64,
        #[serde(default)]
        range_mod_factor: f64,
    },
    /// Surface unit centers pushed radially outwards.
    SurfaceRadial,
    /// Centroids of close surface-unit triangles, pushed outwards if needed.
    SurfaceTriangulated,
    /// Cubic lattice centered on the move partner. Multi-atom units are
    /// additionally tried on a grid of Euler orientations.
    PartnerGrid {
        #[serde(default = "default_half_length")]
        half_length: f64,
        #[serde(default = "default_increment")]
        increment: f64,
        #[serde(default = "default_euler_increment")]
        euler_increment: f64,
    },
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_half_length() -> f64 {
    5.0
}

fn default_increment() -> f64 {
    0.5
}

fn default_euler_increment() -> f64 {
    std::f64::consts::FRAC_PI_3
}

impl Default for SearchStrategy {
    fn default() -> Self {
        SearchStrategy::BoundingBoxGrid {
            scale_factor: default_scale_factor(),
            range_mod_factor: 0.0,
        }
    }
}

impl SearchStrategy {
    pub fn needs_surface(&self) -> bool {
        matches!(
            self,
            SearchStrategy::SurfaceRadial | SearchStrategy::SurfaceTriangulated
        )
    }
}

/// How a surviving candidate is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointScoring {
    /// A single energy evaluation with the unit at the candidate.
    #[default]
    EnergyOnly,
    /// A full local optimization started from the candidate.
    LocallyOptimized,
}

/// What to do with an input geometry that already collides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialCollisionPolicy {
    #[default]
    Proceed,
    /// Return [`MutationOutcome::Discarded`](crate::workflows::mutate::MutationOutcome::Discarded).
    Discard,
}

/// Order in which the packer places units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackingOrder {
    #[default]
    Ascending,
    Random,
    /// Largest units (by atom count) first; equal sizes keep index order.
    BySize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationConfig {
    pub collision_blow_factor: f64,
    pub bond_blow_factor: f64,
    pub dissociation_blow_factor: f64,
    pub units_to_move: usize,
    pub mark_moved_unmovable: bool,
    pub fully_relaxed: bool,
    pub relax_first: bool,
    pub collision_check_first: bool,
    pub on_initial_collision: InitialCollisionPolicy,
    pub check_dissociation: bool,
    pub selection: UnitSelection,
    pub search: SearchStrategy,
    pub scoring: PointScoring,
    pub collision_detection: CollisionStrategy,
}

impl MutationConfig {
    /// Whether any knob requires a local optimizer.
    pub fn needs_optimizer(&self) -> bool {
        self.fully_relaxed || self.relax_first || self.scoring == PointScoring::LocallyOptimized
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let builder: MutationConfigBuilder =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        builder.build()
    }
}

impl fmt::Display for MutationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "directed mutation")?;
        writeln!(f, "  selection:             {:?}", self.selection)?;
        writeln!(f, "  search:                {:?}", self.search)?;
        writeln!(f, "  scoring:               {:?}", self.scoring)?;
        writeln!(f, "  units to move:         {}", self.units_to_move)?;
        writeln!(f, "  mark moved unmovable:  {}", self.mark_moved_unmovable)?;
        writeln!(f, "  fully relaxed:         {}", self.fully_relaxed)?;
        writeln!(f, "  relax first:           {}", self.relax_first)?;
        writeln!(
            f,
            "  collision check first: {} ({:?})",
            self.collision_check_first, self.on_initial_collision
        )?;
        writeln!(f, "  check dissociation:    {}", self.check_dissociation)?;
        writeln!(
            f,
            "  blow factors:          collision {}, bonds {}, dissociation {}",
            self.collision_blow_factor, self.bond_blow_factor, self.dissociation_blow_factor
        )?;
        write!(f, "  collision detection:   {:?}", self.collision_detection)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MutationConfigBuilder {
    collision_blow_factor: Option<f64>,
    bond_blow_factor: Option<f64>,
    dissociation_blow_factor: Option<f64>,
    units_to_move: Option<usize>,
    mark_moved_unmovable: Option<bool>,
    fully_relaxed: Option<bool>,
    relax_first: Option<bool>,
    collision_check_first: Option<bool>,
    on_initial_collision: Option<InitialCollisionPolicy>,
    check_dissociation: Option<bool>,
    selection: Option<UnitSelection>,
    search: Option<SearchStrategy>,
    scoring: Option<PointScoring>,
    collision_detection: Option<CollisionStrategy>,
}

impl MutationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collision_blow_factor(mut self, factor: f64) -> Self {
        self.collision_blow_factor = Some(factor);
        self
    }

    pub fn bond_blow_factor(mut self, factor: f64) -> Self {
        self.bond_blow_factor = Some(factor);
        self
    }

    pub fn dissociation_blow_factor(mut self, factor: f64) -> Self {
        self.dissociation_blow_factor = Some(factor);
        self
    }

    pub fn units_to_move(mut self, n: usize) -> Self {
        self.units_to_move = Some(n);
        self
    }

    pub fn mark_moved_unmovable(mut self, mark: bool) -> Self {
        self.mark_moved_unmovable = Some(mark);
        self
    }

    pub fn fully_relaxed(mut self, relaxed: bool) -> Self {
        self.fully_relaxed = Some(relaxed);
        self
    }

    pub fn relax_first(mut self, relax: bool) -> Self {
        self.relax_first = Some(relax);
        self
    }

    pub fn collision_check_first(mut self, check: bool, policy: InitialCollisionPolicy) -> Self {
        self.collision_check_first = Some(check);
        self.on_initial_collision = Some(policy);
        self
    }

    pub fn check_dissociation(mut self, check: bool) -> Self {
        self.check_dissociation = Some(check);
        self
    }

    pub fn selection(mut self, selection: UnitSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn search(mut self, search: SearchStrategy) -> Self {
        self.search = Some(search);
        self
    }

    pub fn scoring(mut self, scoring: PointScoring) -> Self {
        self.scoring = Some(scoring);
        self
    }

    pub fn collision_detection(mut self, strategy: CollisionStrategy) -> Self {
        self.collision_detection = Some(strategy);
        self
    }

    pub fn build(self) -> Result<MutationConfig, ConfigError> {
        let config = MutationConfig {
            collision_blow_factor: positive(
                "collision_blow_factor",
                self.collision_blow_factor.unwrap_or(1.0),
            )?,
            bond_blow_factor: positive("bond_blow_factor", self.bond_blow_factor.unwrap_or(1.2))?,
            dissociation_blow_factor: positive(
                "dissociation_blow_factor",
                self.dissociation_blow_factor.unwrap_or(3.0),
            )?,
            units_to_move: at_least_one("units_to_move", self.units_to_move.unwrap_or(1))?,
            mark_moved_unmovable: self.mark_moved_unmovable.unwrap_or(true),
            fully_relaxed: self.fully_relaxed.unwrap_or(false),
            relax_first: self.relax_first.unwrap_or(false),
            collision_check_first: self.collision_check_first.unwrap_or(false),
            on_initial_collision: self.on_initial_collision.unwrap_or_default(),
            check_dissociation: self.check_dissociation.unwrap_or(false),
            selection: self.selection.unwrap_or_default(),
            search: validate_search(self.search.unwrap_or_default())?,
            scoring: self.scoring.unwrap_or_default(),
            collision_detection: self.collision_detection.unwrap_or_default(),
        };
        Ok(config)
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be finite and positive, got {}", value),
        })
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be finite, got {}", value),
        })
    }
}

fn at_least_one(name: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: "must be at least 1".to_string(),
        })
    }
}

fn validate_search(search: SearchStrategy) -> Result<SearchStrategy, ConfigError> {
    match search {
        SearchStrategy::BoundingBoxGrid {
            scale_factor,
            range_mod_factor,
        } => {
            positive("scale_factor", scale_factor)?;
            finite("range_mod_factor", range_mod_factor)?;
        }
        SearchStrategy::PartnerGrid {
            half_length,
            increment,
            euler_increment,
        } => {
            positive("half_length", half_length)?;
            positive("increment", increment)?;
            positive("euler_increment", euler_increment)?;
            if euler_increment > std::f64::consts::PI {
                return Err(ConfigError::InvalidParameter {
                    name: "euler_increment",
                    reason: format!("must not exceed pi, got {}", euler_increment),
                });
            }
            if (2.0 * half_length / increment).ceil() > MAX_PARTNER_GRID_POINTS {
                return Err(ConfigError::InvalidParameter {
                    name: "increment",
                    reason: format!(
                        "grid would need more than {} points per axis",
                        MAX_PARTNER_GRID_POINTS
                    ),
                });
            }
        }
        SearchStrategy::SurfaceRadial | SearchStrategy::SurfaceTriangulated => {}
    }
    Ok(search)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackingConfig {
    pub order: PackingOrder,
    pub collision_blow_factor: f64,
    pub dissociation_blow_factor: f64,
    /// Consecutive collisions before the box grows.
    pub attempts_before_inflation: usize,
    /// Upper bound of the random box growth per axis, in Angstroms.
    pub box_increment: f64,
    /// Failed attempts (collision or dissociation) before the box is recomputed.
    pub tries_before_reset: usize,
    /// Box recomputations allowed per unit before the unit is given up on.
    pub max_resets: usize,
    /// Environment placements tried before the last one is accepted as is.
    pub max_environment_attempts: usize,
    pub collision_detection: CollisionStrategy,
}

impl PackingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let builder: PackingConfigBuilder =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        builder.build()
    }
}

impl fmt::Display for PackingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "incremental 2D packing")?;
        writeln!(f, "  order:                     {:?}", self.order)?;
        writeln!(
            f,
            "  blow factors:              collision {}, dissociation {}",
            self.collision_blow_factor, self.dissociation_blow_factor
        )?;
        writeln!(
            f,
            "  inflation:                 every {} collisions, up to {:.3} A per axis",
            self.attempts_before_inflation, self.box_increment
        )?;
        writeln!(
            f,
            "  resets:                    after {} failures, at most {}",
            self.tries_before_reset, self.max_resets
        )?;
        write!(
            f,
            "  environment attempts:      {}",
            self.max_environment_attempts
        )
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PackingConfigBuilder {
    order: Option<PackingOrder>,
    collision_blow_factor: Option<f64>,
    dissociation_blow_factor: Option<f64>,
    attempts_before_inflation: Option<usize>,
    box_increment: Option<f64>,
    tries_before_reset: Option<usize>,
    max_resets: Option<usize>,
    max_environment_attempts: Option<usize>,
    collision_detection: Option<CollisionStrategy>,
}

impl PackingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, order: PackingOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn collision_blow_factor(mut self, factor: f64) -> Self {
        self.collision_blow_factor = Some(factor);
        self
    }

    pub fn dissociation_blow_factor(mut self, factor: f64) -> Self {
        self.dissociation_blow_factor = Some(factor);
        self
    }

    pub fn attempts_before_inflation(mut self, n: usize) -> Self {
        self.attempts_before_inflation = Some(n);
        self
    }

    pub fn box_increment(mut self, increment: f64) -> Self {
        self.box_increment = Some(increment);
        self
    }

    pub fn tries_before_reset(mut self, n: usize) -> Self {
        self.tries_before_reset = Some(n);
        self
    }

    pub fn max_resets(mut self, n: usize) -> Self {
        self.max_resets = Some(n);
        self
    }

    pub fn max_environment_attempts(mut self, n: usize) -> Self {
        self.max_environment_attempts = Some(n);
        self
    }

    pub fn collision_detection(mut self, strategy: CollisionStrategy) -> Self {
        self.collision_detection = Some(strategy);
        self
    }

    pub fn build(self) -> Result<PackingConfig, ConfigError> {
        Ok(PackingConfig {
            order: self.order.unwrap_or_default(),
            collision_blow_factor: positive(
                "collision_blow_factor",
                self.collision_blow_factor.unwrap_or(1.0),
            )?,
            dissociation_blow_factor: positive(
                "dissociation_blow_factor",
                self.dissociation_blow_factor.unwrap_or(3.0),
            )?,
            attempts_before_inflation: at_least_one(
                "attempts_before_inflation",
                self.attempts_before_inflation.unwrap_or(500),
            )?,
            box_increment: positive(
                "box_increment",
                self.box_increment.unwrap_or(DEFAULT_BOX_INCREMENT),
            )?,
            tries_before_reset: at_least_one(
                "tries_before_reset",
                self.tries_before_reset.unwrap_or(10_000),
            )?,
            max_resets: self.max_resets.unwrap_or(5),
            max_environment_attempts: at_least_one(
                "max_environment_attempts",
                self.max_environment_attempts.unwrap_or(1_000),
            )?,
            collision_detection: self.collision_detection.unwrap_or_default(),
        })
    }
}
