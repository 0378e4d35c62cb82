// Notation - Compact text form of a pattern
// "D..UUD..UUD. x4 | D-U- x2" : blocks separated by '|', optional xN repeat suffix

use super::model::{Pattern, PatternBlock};
use super::symbol::StepSymbol;
use std::fmt;
use std::str::FromStr;

/// Notation parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("Unknown step symbol '{symbol}' in block {block}")]
    UnknownSymbol { block: usize, symbol: char },

    #[error("Invalid repeat count '{text}' in block {block}")]
    InvalidRepeats { block: usize, text: String },
}

fn parse_block(index: usize, text: &str) -> Result<PatternBlock, NotationError> {
    let mut steps = Vec::new();
    let mut repeats = 1i64;

    for token in text.split_whitespace() {
        if let Some(count) = token.strip_prefix(['x', 'X'])
            && !count.is_empty()
        {
            repeats = count.parse().map_err(|_| NotationError::InvalidRepeats {
                block: index,
                text: token.to_string(),
            })?;
            continue;
        }

        for c in token.chars() {
            let symbol = StepSymbol::from_char(c).ok_or(NotationError::UnknownSymbol {
                block: index,
                symbol: c,
            })?;
            steps.push(symbol);
        }
    }

    Ok(PatternBlock::new(steps, repeats))
}

impl FromStr for Pattern {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Pattern::new());
        }

        let blocks = s
            .split('|')
            .enumerate()
            .map(|(i, text)| parse_block(i, text))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Pattern::from_blocks(blocks))
    }
}

impl fmt::Display for PatternBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in self.steps() {
            write!(f, "{}", step)?;
        }
        if !self.is_empty() {
            write!(f, " ")?;
        }
        write!(f, "x{}", self.repeats())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks().iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}
