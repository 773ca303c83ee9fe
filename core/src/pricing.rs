//! Unit price resolution and price edits.
//!
//! RESOLUTION ORDER (first match wins):
//!   1. The teacher row's own price, if finite and >= 0. Zero counts.
//!   2. The local override store, if the teacher id is non-blank.
//!   3. The configured default price.

use crate::{
    error::{ReportError, ReportResult},
    model::Teacher,
    overrides::OverrideStore,
    store::SourceStore,
    types::{is_valid_price, Price},
};
use serde::{Deserialize, Serialize};

/// Which tier a resolved price came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Authoritative,
    Override,
    Default,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResolvedPrice {
    pub price:  Price,
    pub source: PriceSource,
}

pub struct PriceResolver<'a> {
    overrides:     &'a OverrideStore,
    default_price: Price,
}

impl<'a> PriceResolver<'a> {
    pub fn new(overrides: &'a OverrideStore, default_price: Price) -> Self {
        Self { overrides, default_price }
    }

    pub fn default_price(&self) -> Price {
        self.default_price
    }

    /// Total over all inputs; never fails.
    pub fn resolve(&self, entity_id: Option<&str>, authoritative: Option<Price>) -> Price {
        self.resolve_with_source(entity_id, authoritative).price
    }

    pub fn resolve_with_source(
        &self,
        entity_id: Option<&str>,
        authoritative: Option<Price>,
    ) -> ResolvedPrice {
        if let Some(price) = authoritative.filter(|p| is_valid_price(*p)) {
            if price == 0.0 {
                log::debug!("pricing: {entity_id:?} has an authoritative price of 0");
            }
            return ResolvedPrice { price, source: PriceSource::Authoritative };
        }

        if let Some(price) = entity_id
            .filter(|id| !id.is_empty())
            .and_then(|id| self.overrides.lookup(id))
        {
            return ResolvedPrice { price, source: PriceSource::Override };
        }

        log::debug!("pricing: {entity_id:?} falls back to default {}", self.default_price);
        ResolvedPrice { price: self.default_price, source: PriceSource::Default }
    }

    pub fn resolve_teacher(&self, teacher: &Teacher) -> ResolvedPrice {
        self.resolve_with_source(Some(teacher.id.as_str()), teacher.price_per_student)
    }
}

/// Commit a price typed into an edit control for `teacher`.
///
/// Invalid values (negative, NaN, infinite) are dropped and return
/// `Ok(false)`. A valid value is written to the teacher row in the
/// source; if the teacher had no usable price of its own, the value
/// is also cached in the override store.
pub fn commit_price_edit(
    source: &SourceStore,
    overrides: &OverrideStore,
    teacher: &Teacher,
    value: Price,
) -> ReportResult<bool> {
    if !is_valid_price(value) {
        log::debug!("pricing: rejected edit for {} ({value})", teacher.id);
        return Ok(false);
    }

    let touched = source.update_teacher_price(&teacher.id, value)?;
    if touched == 0 {
        return Err(ReportError::TeacherNotFound { id: teacher.id.clone() });
    }

    if teacher.authoritative_price().is_none() {
        overrides.set(&teacher.id, value);
    }

    log::info!(
        "pricing: {} price set to {:.2} ({} row(s))",
        teacher.id, value, touched
    );
    Ok(true)
}
