use std::fmt;

use serde::Serialize;

/// Diagnosis categories, in the order of the model's output classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Diagnosis {
    Bacterial,
    Normal,
    Viral,
}

impl Diagnosis {
    pub const ALL: [Diagnosis; 3] = [Diagnosis::Bacterial, Diagnosis::Normal, Diagnosis::Viral];

    /// Maps a model output index to its label; `None` outside 0..=2.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bacterial => "Bacterial",
            Self::Normal => "Normal",
            Self::Viral => "Viral",
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_table() {
        assert_eq!(Diagnosis::from_index(0), Some(Diagnosis::Bacterial));
        assert_eq!(Diagnosis::from_index(1), Some(Diagnosis::Normal));
        assert_eq!(Diagnosis::from_index(2), Some(Diagnosis::Viral));
        assert_eq!(Diagnosis::from_index(3), None);

        for label in Diagnosis::ALL {
            assert_eq!(Diagnosis::from_index(label.index()), Some(label));
        }
    }

    #[test]
    fn test_serializes_as_label_name() {
        assert_eq!(serde_json::to_string(&Diagnosis::Viral).unwrap(), "\"Viral\"");
        assert_eq!(Diagnosis::Normal.to_string(), "Normal");
    }
}
