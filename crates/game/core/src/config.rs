/// Rule-table constants and tunable parameters.
///
/// Every number the combat pipeline would otherwise hard-code lives here so a
/// table can run house rules (or the 2014 exhaustion table) without touching
/// the engine. `Default` follows the 2024 rules.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RulesConfig {
    /// Grid scale. Distances, reach and ranges are converted with this.
    pub feet_per_cell: u32,
    /// Lowest natural d20 that counts as a critical hit.
    pub crit_threshold: u32,
    /// d20 penalty applied per Exhaustion level.
    pub exhaustion_penalty_per_level: i32,
    /// Speed lost per Exhaustion level, in feet.
    pub exhaustion_speed_per_level: u32,
    pub half_cover_bonus: i32,
    pub three_quarters_cover_bonus: i32,
    pub power_attack_penalty: i32,
    pub power_attack_bonus: i32,
    pub archery_bonus: i32,
    pub dueling_bonus: i32,
    pub thrown_weapon_bonus: i32,
    pub concentration_min_dc: i32,
    /// Rounds a Vex/Sap/Slow rider lasts.
    pub mastery_rider_rounds: u32,
    /// Speed lost while Slowed, in feet.
    pub slow_speed_penalty: u32,
    /// Distance a Push mastery moves the target, in feet.
    pub push_mastery_feet: u32,
    /// Distance a shove moves the target, in feet.
    pub shove_feet: u32,
}

impl RulesConfig {
    pub const DEFAULT_FEET_PER_CELL: u32 = 5;
    pub const DEFAULT_CRIT_THRESHOLD: u32 = 20;
    pub const DEFAULT_EXHAUSTION_PENALTY: i32 = 2;
    pub const DEFAULT_EXHAUSTION_SPEED: u32 = 5;
    pub const MAX_EXHAUSTION_LEVEL: u8 = 6;

    pub const fn new() -> Self {
        Self {
            feet_per_cell: Self::DEFAULT_FEET_PER_CELL,
            crit_threshold: Self::DEFAULT_CRIT_THRESHOLD,
            exhaustion_penalty_per_level: Self::DEFAULT_EXHAUSTION_PENALTY,
            exhaustion_speed_per_level: Self::DEFAULT_EXHAUSTION_SPEED,
            half_cover_bonus: 2,
            three_quarters_cover_bonus: 5,
            power_attack_penalty: -5,
            power_attack_bonus: 10,
            archery_bonus: 2,
            dueling_bonus: 2,
            thrown_weapon_bonus: 2,
            concentration_min_dc: 10,
            mastery_rider_rounds: 1,
            slow_speed_penalty: 10,
            push_mastery_feet: 10,
            shove_feet: 5,
        }
    }

    /// Converts a distance in feet to whole grid cells, rounding up.
    pub fn cells_for(&self, feet: u32) -> u32 {
        let scale = self.feet_per_cell.max(1);
        feet.div_ceil(scale)
    }

    /// Converts a cell count to feet.
    pub fn feet_for(&self, cells: u32) -> u32 {
        cells.saturating_mul(self.feet_per_cell)
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::new()
    }
}
