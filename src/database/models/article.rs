use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ArticleId, UserId};
use crate::database::entity::{audited_columns, AuditFields, Auditable, Entity, Table};

/// Upper bound on article content, in characters
pub const CONTENT_MAX_CHARS: usize = 1000;

/// A short text post. `created_by_id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub created_by_id: UserId,
    pub content: String,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Article {
    pub fn new(content: impl Into<String>, owner: UserId) -> Self {
        Self {
            id: ArticleId::new(),
            created_by_id: owner,
            content: content.into(),
            audit: AuditFields::new(),
        }
    }
}

impl Auditable for Article {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Entity for Article {
    const TABLE: Table = Table {
        name: "articles",
        columns: audited_columns![("id", Uuid), ("created_by_id", Uuid), ("content", Text)],
    };

    fn key(&self) -> Uuid {
        self.id.as_uuid()
    }
}
