// Pattern model - Ordered strum blocks with repeat counts
// The editor mutates it, the transport reads a snapshot of it

use super::symbol::StepSymbol;
use std::sync::atomic::{AtomicU64, Ordering};

/// Pattern editing errors
/// Only index errors surface; bad repeat counts are clamped instead
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Block index {index} out of range (pattern has {len} blocks)")]
    BlockOutOfRange { index: usize, len: usize },

    #[error("Step index {index} out of range (block {block} has {len} steps)")]
    StepOutOfRange { block: usize, index: usize, len: usize },
}

pub type PatternResult<T> = Result<T, PatternError>;

/// Serialized shape of a block, before repeat clamping
#[derive(serde::Deserialize)]
struct PatternBlockRepr {
    #[serde(default)]
    steps: Vec<StepSymbol>,
    #[serde(default = "default_repeats")]
    repeats: i64,
}

fn default_repeats() -> i64 {
    1
}

impl From<PatternBlockRepr> for PatternBlock {
    fn from(repr: PatternBlockRepr) -> Self {
        PatternBlock::new(repr.steps, repr.repeats)
    }
}

/// A run of steps played `repeats` times in a row
///
/// The step list may be empty (a block waiting for edits). `repeats` is never
/// below 1.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "PatternBlockRepr")]
pub struct PatternBlock {
    steps: Vec<StepSymbol>,
    repeats: u32,
}

impl PatternBlock {
    /// Repeat count of a freshly appended block
    pub const DEFAULT_REPEATS: i64 = 2;

    /// Create a block, clamping `repeats` into `1..=u32::MAX`
    pub fn new(steps: Vec<StepSymbol>, repeats: i64) -> Self {
        Self {
            steps,
            repeats: clamp_repeats(repeats),
        }
    }

    /// Single rest, repeated twice
    pub fn new_default() -> Self {
        Self::new(vec![StepSymbol::Rest], Self::DEFAULT_REPEATS)
    }

    pub fn steps(&self) -> &[StepSymbol] {
        &self.steps
    }

    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for PatternBlock {
    fn default() -> Self {
        Self::new_default()
    }
}

fn clamp_repeats(repeats: i64) -> u32 {
    repeats.clamp(1, u32::MAX as i64) as u32
}

/// Revisions are unique across every pattern in the process, so a pattern
/// swapped in wholesale never shares a revision with the one it replaced
fn next_revision() -> u64 {
    static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// An ordered list of blocks, in playback order
///
/// Every construction and successful mutation takes a fresh `revision()`,
/// which is how cached flattenings know they are stale. Equality compares
/// blocks only.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(from = "Vec<PatternBlock>", into = "Vec<PatternBlock>")]
pub struct Pattern {
    blocks: Vec<PatternBlock>,
    revision: u64,
}

impl Pattern {
    /// Create an empty pattern
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            revision: next_revision(),
        }
    }

    /// Create a pattern from existing blocks
    pub fn from_blocks(blocks: Vec<PatternBlock>) -> Self {
        Self {
            blocks,
            revision: next_revision(),
        }
    }

    /// The classic 12-step strum `D..UUD..UUD.` played four times
    pub fn default_strum() -> Self {
        use StepSymbol::{Down as D, Rest as R, Up as U};
        Self::from_blocks(vec![PatternBlock::new(
            vec![D, R, R, U, U, D, R, R, U, U, D, R],
            4,
        )])
    }

    pub fn blocks(&self) -> &[PatternBlock] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&PatternBlock> {
        self.blocks.get(index)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total number of steps across all blocks, counting repeats
    pub fn total_steps(&self) -> u64 {
        self.blocks
            .iter()
            .map(|b| b.step_count() as u64 * b.repeats as u64)
            .sum()
    }

    /// True if the cycle has no steps at all (rests still count as steps)
    pub fn is_silent_cycle(&self) -> bool {
        self.total_steps() == 0
    }

    /// Revision of the current contents
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a block, returning its index
    pub fn append_block(&mut self, initial: Vec<StepSymbol>, repeats: i64) -> usize {
        self.blocks.push(PatternBlock::new(initial, repeats));
        self.touch();
        self.blocks.len() - 1
    }

    /// Append the editor's default block (`[Rest]` x2)
    pub fn append_default_block(&mut self) -> usize {
        self.append_block(vec![StepSymbol::Rest], PatternBlock::DEFAULT_REPEATS)
    }

    /// Remove a block
    pub fn remove_block(&mut self, index: usize) -> PatternResult<PatternBlock> {
        self.check_block(index)?;
        let removed = self.blocks.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Append a step to a block
    pub fn append_step(&mut self, block: usize, symbol: StepSymbol) -> PatternResult<()> {
        self.block_mut(block)?.steps.push(symbol);
        self.touch();
        Ok(())
    }

    /// Remove the last step of a block
    /// Returns None (and changes nothing) if the block is already empty
    pub fn remove_last_step(&mut self, block: usize) -> PatternResult<Option<StepSymbol>> {
        let removed = self.block_mut(block)?.steps.pop();
        if removed.is_some() {
            self.touch();
        }
        Ok(removed)
    }

    /// Set a step, or toggle it (Rest -> Down -> Up -> Rest) when `symbol` is None
    /// Returns the symbol now stored at that step
    pub fn set_step(
        &mut self,
        block: usize,
        step: usize,
        symbol: Option<StepSymbol>,
    ) -> PatternResult<StepSymbol> {
        let target = self.block_mut(block)?;
        let len = target.steps.len();
        let slot = target
            .steps
            .get_mut(step)
            .ok_or(PatternError::StepOutOfRange {
                block,
                index: step,
                len,
            })?;

        let stored = match symbol {
            Some(symbol) => symbol,
            None => slot.toggled(),
        };
        *slot = stored;
        self.touch();
        Ok(stored)
    }

    /// Set the repeat count of a block, clamped to at least 1
    /// Returns the stored value
    pub fn set_repeats(&mut self, block: usize, repeats: i64) -> PatternResult<u32> {
        let target = self.block_mut(block)?;
        target.repeats = clamp_repeats(repeats);
        let stored = target.repeats;
        self.touch();
        Ok(stored)
    }

    fn check_block(&self, index: usize) -> PatternResult<()> {
        if index < self.blocks.len() {
            Ok(())
        } else {
            Err(PatternError::BlockOutOfRange {
                index,
                len: self.blocks.len(),
            })
        }
    }

    fn block_mut(&mut self, index: usize) -> PatternResult<&mut PatternBlock> {
        let len = self.blocks.len();
        self.blocks
            .get_mut(index)
            .ok_or(PatternError::BlockOutOfRange { index, len })
    }

    fn touch(&mut self) {
        self.revision = next_revision();
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Eq for Pattern {}

impl Default for Pattern {
    fn default() -> Self {
        Self::default_strum()
    }
}

impl From<Vec<PatternBlock>> for Pattern {
    fn from(blocks: Vec<PatternBlock>) -> Self {
        Self::from_blocks(blocks)
    }
}

impl From<Pattern> for Vec<PatternBlock> {
    fn from(pattern: Pattern) -> Self {
        pattern.blocks
    }
}
