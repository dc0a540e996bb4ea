//! Browsing-time totals over recorded visits.

use std::collections::HashMap;

use serde::Serialize;

use crate::visits::{Category, VisitRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlTotal {
    pub url: String,
    pub total_secs: u64,
    pub visits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: Category,
    pub total_secs: u64,
    pub visits: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_secs: u64,
    pub visits: u32,
    pub by_category: Vec<CategoryTotal>,
    pub by_url: Vec<UrlTotal>,
}

/// Time per URL, most time first (ties by URL).
pub fn totals_by_url(visits: &[VisitRecord]) -> Vec<UrlTotal> {
    let mut totals: HashMap<&str, (u64, u32)> = HashMap::new();
    for visit in visits {
        let entry = totals.entry(visit.url.as_str()).or_default();
        entry.0 += visit.duration_secs;
        entry.1 += 1;
    }
    let mut out: Vec<UrlTotal> = totals
        .into_iter()
        .map(|(url, (total_secs, visits))| UrlTotal {
            url: url.to_string(),
            total_secs,
            visits,
        })
        .collect();
    out.sort_by(|a, b| b.total_secs.cmp(&a.total_secs).then_with(|| a.url.cmp(&b.url)));
    out
}

/// Time per category, most time first (ties by category order).
pub fn totals_by_category(visits: &[VisitRecord]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<Category, (u64, u32)> = HashMap::new();
    for visit in visits {
        let entry = totals.entry(visit.category).or_default();
        entry.0 += visit.duration_secs;
        entry.1 += 1;
    }
    let mut out: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (total_secs, visits))| CategoryTotal {
            category,
            total_secs,
            visits,
        })
        .collect();
    out.sort_by(|a, b| b.total_secs.cmp(&a.total_secs).then_with(|| a.category.cmp(&b.category)));
    out
}

pub fn summarize(visits: &[VisitRecord]) -> Summary {
    Summary {
        total_secs: visits.iter().map(|v| v.duration_secs).sum(),
        visits: u32::try_from(visits.len()).unwrap_or(u32::MAX),
        by_category: totals_by_category(visits),
        by_url: totals_by_url(visits),
    }
}
