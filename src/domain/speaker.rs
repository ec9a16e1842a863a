use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    Ai,
    Candidate,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Ai => "AI",
            Speaker::Candidate => "CANDIDATE",
        }
    }
}

impl FromStr for Speaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AI" => Ok(Speaker::Ai),
            "CANDIDATE" => Ok(Speaker::Candidate),
            _ => Err(format!("Invalid speaker: {}", s)),
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
