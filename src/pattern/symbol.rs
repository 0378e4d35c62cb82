// Step symbols - The three things a strum step can be
// Every symbol-dependent behavior (glyph, audio, toggling) is looked up here

use std::fmt;

/// Audible strum direction
/// Only these reach the audio subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Stroke {
    Down,
    Up,
}

impl Stroke {
    /// Start frequency of the tone (Hz)
    pub fn start_frequency(&self) -> f32 {
        match self {
            Stroke::Down => 150.0,
            Stroke::Up => 250.0,
        }
    }

    /// Frequency reached at the end of the pitch fall (Hz)
    pub fn end_frequency(&self) -> f32 {
        match self {
            Stroke::Down => 80.0,
            Stroke::Up => 150.0,
        }
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stroke::Down => write!(f, "down"),
            Stroke::Up => write!(f, "up"),
        }
    }
}

/// One step of a strum pattern (an eighth note)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum StepSymbol {
    Down,
    Up,
    #[default]
    Rest,
}

impl StepSymbol {
    /// All symbols in toggle order
    pub const ALL: [StepSymbol; 3] = [StepSymbol::Rest, StepSymbol::Down, StepSymbol::Up];

    /// Glyph shown on the scrolling strip
    pub fn glyph(&self) -> char {
        match self {
            StepSymbol::Down => '↓',
            StepSymbol::Up => '↑',
            StepSymbol::Rest => '•',
        }
    }

    /// Style class used by renderers
    pub fn class(&self) -> &'static str {
        match self {
            StepSymbol::Down => "down",
            StepSymbol::Up => "up",
            StepSymbol::Rest => "rest",
        }
    }

    /// Audio profile (None for silent steps)
    pub fn stroke(&self) -> Option<Stroke> {
        match self {
            StepSymbol::Down => Some(Stroke::Down),
            StepSymbol::Up => Some(Stroke::Up),
            StepSymbol::Rest => None,
        }
    }

    pub fn is_audible(&self) -> bool {
        self.stroke().is_some()
    }

    /// Next symbol in the editor's toggle cycle: Rest -> Down -> Up -> Rest
    pub fn toggled(&self) -> Self {
        match self {
            StepSymbol::Rest => StepSymbol::Down,
            StepSymbol::Down => StepSymbol::Up,
            StepSymbol::Up => StepSymbol::Rest,
        }
    }

    /// Parse a notation character
    /// `D`/`d` down, `U`/`u` up, `-` and `.` are both rest
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'D' | 'd' => Some(StepSymbol::Down),
            'U' | 'u' => Some(StepSymbol::Up),
            '-' | '.' => Some(StepSymbol::Rest),
            _ => None,
        }
    }

    /// Notation character (rests are written as `.`)
    pub fn to_char(&self) -> char {
        match self {
            StepSymbol::Down => 'D',
            StepSymbol::Up => 'U',
            StepSymbol::Rest => '.',
        }
    }
}

impl From<Stroke> for StepSymbol {
    fn from(stroke: Stroke) -> Self {
        match stroke {
            Stroke::Down => StepSymbol::Down,
            Stroke::Up => StepSymbol::Up,
        }
    }
}

impl fmt::Display for StepSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_cycle() {
        let mut symbol = StepSymbol::Rest;
        symbol = symbol.toggled();
        assert_eq!(symbol, StepSymbol::Down);
        symbol = symbol.toggled();
        assert_eq!(symbol, StepSymbol::Up);
        symbol = symbol.toggled();
        assert_eq!(symbol, StepSymbol::Rest);
    }

    #[test]
    fn test_audibility() {
        assert_eq!(StepSymbol::Down.stroke(), Some(Stroke::Down));
        assert_eq!(StepSymbol::Up.stroke(), Some(Stroke::Up));
        assert!(!StepSymbol::Rest.is_audible());
    }

    #[test]
    fn test_notation_chars() {
        assert_eq!(StepSymbol::from_char('d'), Some(StepSymbol::Down));
        assert_eq!(StepSymbol::from_char('U'), Some(StepSymbol::Up));
        assert_eq!(StepSymbol::from_char('-'), Some(StepSymbol::Rest));
        assert_eq!(StepSymbol::from_char('.'), Some(StepSymbol::Rest));
        assert_eq!(StepSymbol::from_char('x'), None);

        for symbol in StepSymbol::ALL {
            assert_eq!(StepSymbol::from_char(symbol.to_char()), Some(symbol));
        }
    }

    #[test]
    fn test_down_is_lower_than_up() {
        assert!(Stroke::Down.start_frequency() < Stroke::Up.start_frequency());
        assert!(Stroke::Down.end_frequency() < Stroke::Down.start_frequency());
        assert!(Stroke::Up.end_frequency() < Stroke::Up.start_frequency());
    }
}
