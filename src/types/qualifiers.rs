use std::fmt::Display;

/// How often a value may change while a script runs. Ordered from the
/// most stable to the least stable; `NoQualifier` means "not stated".
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default)]
pub enum Qualifier {
    #[default]
    NoQualifier,
    Const,
    Input,
    Simple,
    Series,
}

impl Qualifier {
    pub fn from_keyword(keyword: &str) -> Option<Qualifier> {
        match keyword {
            "const" => Some(Qualifier::Const),
            "input" => Some(Qualifier::Input),
            "simple" => Some(Qualifier::Simple),
            "series" => Some(Qualifier::Series),
            _ => None,
        }
    }

    /// The least stable of two qualifiers.
    pub fn join(self, other: Qualifier) -> Qualifier {
        self.max(other)
    }

    /// Whether a parameter declared with `self` accepts an argument
    /// qualified with `argument`. Unqualified arguments count as const.
    pub fn accepts(self, argument: Qualifier) -> bool {
        self == Qualifier::NoQualifier || argument <= self
    }
}

impl Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Qualifier::NoQualifier => write!(f, ""),
            Qualifier::Const => write!(f, "const"),
            Qualifier::Input => write!(f, "input"),
            Qualifier::Simple => write!(f, "simple"),
            Qualifier::Series => write!(f, "series"),
        }
    }
}
