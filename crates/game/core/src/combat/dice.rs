//! Dice expressions like `2d6+3`, `1d8+1d6` or a flat `1`.

use std::fmt;
use std::str::FromStr;

use crate::env::RandomSource;

const MAX_DICE: u32 = 1000;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiceParseError {
    #[error("empty dice expression")]
    Empty,

    #[error("invalid dice term `{0}`")]
    InvalidTerm(String),

    #[error("dice cannot be subtracted: `{0}`")]
    NegativeDice(String),

    #[error("too many dice in `{0}`")]
    TooManyDice(String),
}

/// `count` dice with `sides` faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiceTerm {
    pub count: u32,
    pub sides: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiceExpr {
    pub dice: Vec<DiceTerm>,
    pub modifier: i32,
}

/// Individual results and the total of one evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiceRoll {
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
}

impl DiceExpr {
    pub fn flat(modifier: i32) -> Self {
        Self {
            dice: Vec::new(),
            modifier,
        }
    }

    pub fn dice(count: u32, sides: u32) -> Self {
        Self {
            dice: vec![DiceTerm { count, sides }],
            modifier: 0,
        }
    }

    /// Parses `text`, degrading to an empty expression (zero dice, no
    /// modifier) when it cannot be read.
    pub fn parse_or_zero(text: &str) -> Self {
        text.parse().unwrap_or_default()
    }

    pub fn dice_count(&self) -> u32 {
        self.dice.iter().map(|term| term.count).sum()
    }

    /// Same expression with every dice count doubled. The flat modifier is
    /// untouched.
    pub fn doubled(&self) -> Self {
        Self {
            dice: self
                .dice
                .iter()
                .map(|term| DiceTerm {
                    count: term.count.saturating_mul(2),
                    sides: term.sides,
                })
                .collect(),
            modifier: self.modifier,
        }
    }

    pub fn roll(&self, rng: &mut dyn RandomSource) -> DiceRoll {
        let mut rolls = Vec::with_capacity(self.dice_count() as usize);
        for term in &self.dice {
            rolls.extend(rng.roll_dice(term.count, term.sides));
        }
        let sum: i64 = rolls.iter().map(|&roll| i64::from(roll)).sum();
        let total = (sum + i64::from(self.modifier)).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        DiceRoll {
            rolls,
            modifier: self.modifier,
            total,
        }
    }
}

impl FromStr for DiceExpr {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if cleaned.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let mut terms: Vec<(bool, String)> = Vec::new();
        let mut current = String::new();
        let mut negative = false;
        for (index, ch) in cleaned.char_indices() {
            match ch {
                '+' | '-' if index == 0 => negative = ch == '-',
                '+' | '-' => {
                    if current.is_empty() {
                        return Err(DiceParseError::InvalidTerm(cleaned.clone()));
                    }
                    terms.push((negative, std::mem::take(&mut current)));
                    negative = ch == '-';
                }
                _ => current.push(ch),
            }
        }
        if current.is_empty() {
            return Err(DiceParseError::InvalidTerm(cleaned));
        }
        terms.push((negative, current));

        let mut expr = DiceExpr::default();
        for (negative, term) in terms {
            match term.split_once('d') {
                Some((count, sides)) => {
                    if negative {
                        return Err(DiceParseError::NegativeDice(term));
                    }
                    let count: u32 = if count.is_empty() {
                        1
                    } else {
                        count
                            .parse()
                            .map_err(|_| DiceParseError::InvalidTerm(term.clone()))?
                    };
                    let sides: u32 = sides
                        .parse()
                        .map_err(|_| DiceParseError::InvalidTerm(term.clone()))?;
                    if count == 0 || sides == 0 {
                        return Err(DiceParseError::InvalidTerm(term));
                    }
                    if expr.dice_count().saturating_add(count) > MAX_DICE {
                        return Err(DiceParseError::TooManyDice(cleaned));
                    }
                    expr.dice.push(DiceTerm { count, sides });
                }
                None => {
                    let value: i32 = term
                        .parse()
                        .map_err(|_| DiceParseError::InvalidTerm(term.clone()))?;
                    expr.modifier += if negative { -value } else { value };
                }
            }
        }
        Ok(expr)
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, term) in self.dice.iter().enumerate() {
            if index > 0 {
                write!(f, "+")?;
            }
            write!(f, "{}d{}", term.count, term.sides)?;
        }
        match (self.dice.is_empty(), self.modifier) {
            (true, modifier) => write!(f, "{modifier}"),
            (false, 0) => Ok(()),
            (false, modifier) if modifier > 0 => write!(f, "+{modifier}"),
            (false, modifier) => write!(f, "{modifier}"),
        }
    }
}
