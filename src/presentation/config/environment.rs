use std::fmt;

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Test,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }

    /// Reads `APP_ENVIRONMENT`, defaulting to local.
    pub fn from_env() -> Result<Self, String> {
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".to_string())
            .try_into()
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "test" => Ok(Self::Test),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(format!(
                "Invalid environment: {}. Expected: local, test, or prod",
                other
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
