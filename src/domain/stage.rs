use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageType {
    Template,
    Generated,
    FollowUp,
    Terminal,
}

impl StageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageType::Template => "template",
            StageType::Generated => "generated",
            StageType::FollowUp => "follow_up",
            StageType::Terminal => "terminal",
        }
    }

    /// Stages whose text comes from a fixed template rather than the model.
    pub fn is_rendered(&self) -> bool {
        matches!(self, StageType::Template | StageType::Terminal)
    }
}

impl FromStr for StageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "template" => Ok(StageType::Template),
            "generated" => Ok(StageType::Generated),
            "follow_up" => Ok(StageType::FollowUp),
            "terminal" => Ok(StageType::Terminal),
            _ => Err(format!("Invalid stage type: {}", s)),
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of an interview script.
///
/// `text_template` is only meaningful for rendered stages; generated and
/// follow-up stages are driven by `guide` and `retrieval_query`. Slots use
/// `{name}` syntax and are filled from the session context.
#[derive(Debug, Clone, PartialEq)]
pub struct StageDefinition {
    pub name: String,
    pub order: u32,
    pub stage_type: StageType,
    pub parent: Option<String>,
    pub retrieval_query: String,
    pub guide: String,
    pub text_template: Option<String>,
    pub evaluation_category: Option<String>,
}

impl StageDefinition {
    pub fn template(name: &str, order: u32, text: &str) -> Self {
        Self::rendered(name, order, StageType::Template, text)
    }

    pub fn terminal(name: &str, order: u32, text: &str) -> Self {
        Self::rendered(name, order, StageType::Terminal, text)
    }

    pub fn generated(name: &str, order: u32, retrieval_query: &str, guide: &str) -> Self {
        Self {
            name: name.to_string(),
            order,
            stage_type: StageType::Generated,
            parent: None,
            retrieval_query: retrieval_query.to_string(),
            guide: guide.to_string(),
            text_template: None,
            evaluation_category: None,
        }
    }

    pub fn follow_up(name: &str, order: u32, parent: &str, guide: &str) -> Self {
        Self {
            name: name.to_string(),
            order,
            stage_type: StageType::FollowUp,
            parent: Some(parent.to_string()),
            retrieval_query: String::new(),
            guide: guide.to_string(),
            text_template: None,
            evaluation_category: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.evaluation_category = Some(category.to_string());
        self
    }

    pub fn with_retrieval_query(mut self, query: &str) -> Self {
        self.retrieval_query = query.to_string();
        self
    }

    fn rendered(name: &str, order: u32, stage_type: StageType, text: &str) -> Self {
        Self {
            name: name.to_string(),
            order,
            stage_type,
            parent: None,
            retrieval_query: String::new(),
            guide: String::new(),
            text_template: Some(text.to_string()),
            evaluation_category: None,
        }
    }
}
