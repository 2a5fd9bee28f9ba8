//! Shared campaign input record.
//!
//! Every task in a run receives the same context; task descriptions are
//! templates with `{placeholder}` fields rendered from it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Input record shared by every task in a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignContext {
    /// Product being marketed
    pub product_name: String,

    /// Audience the campaign targets
    pub target_audience: String,

    /// One-paragraph product description
    pub product_description: String,

    /// Campaign budget (free text, currency included)
    pub budget: String,

    /// Date injected into prompts (YYYY-MM-DD)
    pub current_date: String,
}

impl CampaignContext {
    /// Create a context with today's date
    pub fn new(
        product_name: impl Into<String>,
        target_audience: impl Into<String>,
        product_description: impl Into<String>,
        budget: impl Into<String>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            target_audience: target_audience.into(),
            product_description: product_description.into(),
            budget: budget.into(),
            current_date: Utc::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// Override the injected date (useful for reproducible runs)
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.current_date = date.into();
        self
    }

    /// Render a prompt template, substituting `{field}` placeholders
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{product_name}", &self.product_name)
            .replace("{target_audience}", &self.target_audience)
            .replace("{product_description}", &self.product_description)
            .replace("{budget}", &self.budget)
            .replace("{current_date}", &self.current_date)
    }
}
