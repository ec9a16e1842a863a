use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{StageDefinition, StageType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogId {
    Standard,
    Transition,
}

impl CatalogId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogId::Standard => "standard",
            CatalogId::Transition => "transition",
        }
    }
}

impl FromStr for CatalogId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(CatalogId::Standard),
            "transition" => Ok(CatalogId::Transition),
            _ => Err(format!("Invalid catalog id: {}", s)),
        }
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("catalog {0} has no stages")]
    Empty(CatalogId),
    #[error("duplicate stage name: {0}")]
    DuplicateStage(String),
    #[error("stage orders must run 1..=n without gaps, found {found} at position {expected}")]
    OrderGap { expected: u32, found: u32 },
    #[error("follow-up stage {stage} has invalid parent {parent:?}")]
    InvalidParent {
        stage: String,
        parent: Option<String>,
    },
    #[error("registry slot {slot} was given catalog {given}")]
    MismatchedId { slot: CatalogId, given: CatalogId },
}

/// Ordered, immutable table of stages for one scenario variant.
#[derive(Debug, Clone)]
pub struct Catalog {
    id: CatalogId,
    version: String,
    stages: Vec<StageDefinition>,
}

impl Catalog {
    /// Validates and freezes a stage table. Stages are sorted by `order`,
    /// which must run `1..=n`.
    pub fn new(
        id: CatalogId,
        version: impl Into<String>,
        mut stages: Vec<StageDefinition>,
    ) -> Result<Self, CatalogError> {
        if stages.is_empty() {
            return Err(CatalogError::Empty(id));
        }

        stages.sort_by_key(|s| s.order);

        let mut seen = HashSet::new();
        for (idx, stage) in stages.iter().enumerate() {
            let expected = idx as u32 + 1;
            if stage.order != expected {
                return Err(CatalogError::OrderGap {
                    expected,
                    found: stage.order,
                });
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(CatalogError::DuplicateStage(stage.name.clone()));
            }
        }

        for stage in stages.iter().filter(|s| s.stage_type == StageType::FollowUp) {
            let parent_ok = stage
                .parent
                .as_deref()
                .and_then(|p| stages.iter().find(|s| s.name == p))
                .is_some_and(|p| p.order < stage.order);
            if !parent_ok {
                return Err(CatalogError::InvalidParent {
                    stage: stage.name.clone(),
                    parent: stage.parent.clone(),
                });
            }
        }

        Ok(Self {
            id,
            version: version.into(),
            stages,
        })
    }

    pub fn id(&self) -> CatalogId {
        self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn first(&self) -> &StageDefinition {
        &self.stages[0]
    }

    /// The stage emitted together with the first one when a session opens.
    pub fn second(&self) -> Option<&StageDefinition> {
        self.stages.get(1)
    }

    pub fn get(&self, name: &str) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn by_order(&self, order: u32) -> Option<&StageDefinition> {
        order
            .checked_sub(1)
            .and_then(|idx| self.stages.get(idx as usize))
    }

    /// Stage at `ordinal(last) + 1`. `None` as input means the session has
    /// not started, so the first stage is returned; `None` as output means
    /// `last` was the final stage. A name unknown to this catalog restarts
    /// from the first stage.
    pub fn successor_of(&self, last: Option<&str>) -> Option<&StageDefinition> {
        match last.map(|name| self.get(name)) {
            None | Some(None) => Some(self.first()),
            Some(Some(stage)) => self.by_order(stage.order + 1),
        }
    }

    pub fn last(&self) -> &StageDefinition {
        &self.stages[self.stages.len() - 1]
    }
}

/// Process-wide set of catalogs, one per [`CatalogId`], built once at startup.
#[derive(Debug, Clone)]
pub struct CatalogRegistry {
    standard: Arc<Catalog>,
    transition: Arc<Catalog>,
}

impl CatalogRegistry {
    pub fn new(standard: Catalog, transition: Catalog) -> Result<Self, CatalogError> {
        for (slot, catalog) in [
            (CatalogId::Standard, &standard),
            (CatalogId::Transition, &transition),
        ] {
            if catalog.id() != slot {
                return Err(CatalogError::MismatchedId {
                    slot,
                    given: catalog.id(),
                });
            }
        }

        Ok(Self {
            standard: Arc::new(standard),
            transition: Arc::new(transition),
        })
    }

    pub fn get(&self, id: CatalogId) -> Arc<Catalog> {
        match id {
            CatalogId::Standard => Arc::clone(&self.standard),
            CatalogId::Transition => Arc::clone(&self.transition),
        }
    }
}
