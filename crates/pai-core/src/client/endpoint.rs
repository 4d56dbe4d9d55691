//! PAI backend products and their endpoints

use serde::{Deserialize, Serialize};
use std::fmt;

/// A PAI backend service, each with its own endpoint and API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    /// Workspaces, datasets, models, images
    #[value(name = "aiworkspace")]
    AiWorkspace,
    /// Deep-learning container training jobs
    #[value(name = "dlc")]
    Dlc,
    /// Pipelines and pipeline runs
    #[value(name = "paiflow")]
    PaiFlow,
    /// Elastic algorithm service (online inference)
    #[value(name = "eas")]
    Eas,
}

impl Product {
    pub const ALL: [Product; 4] = [
        Product::AiWorkspace,
        Product::Dlc,
        Product::PaiFlow,
        Product::Eas,
    ];

    /// API version sent in `x-acs-version`
    pub fn api_version(&self) -> &'static str {
        match self {
            Product::AiWorkspace => "2021-02-04",
            Product::Dlc => "2020-12-03",
            Product::PaiFlow => "2021-12-02",
            Product::Eas => "2021-07-01",
        }
    }

    /// Host prefix of the public endpoint
    pub fn endpoint_prefix(&self) -> &'static str {
        match self {
            Product::AiWorkspace => "aiworkspace",
            Product::Dlc => "pai-dlc",
            Product::PaiFlow => "paiflow",
            Product::Eas => "pai-eas",
        }
    }

    /// Public endpoint for `region_id`
    pub fn default_endpoint(&self, region_id: &str) -> String {
        format!(
            "https://{}.{}.aliyuncs.com",
            self.endpoint_prefix(),
            region_id
        )
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Product::AiWorkspace => "aiworkspace",
            Product::Dlc => "dlc",
            Product::PaiFlow => "paiflow",
            Product::Eas => "eas",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        assert_eq!(
            Product::Eas.default_endpoint("cn-shanghai"),
            "https://pai-eas.cn-shanghai.aliyuncs.com"
        );
        assert_eq!(
            Product::Dlc.default_endpoint("cn-hangzhou"),
            "https://pai-dlc.cn-hangzhou.aliyuncs.com"
        );
    }

    #[test]
    fn test_versions_are_distinct() {
        let mut versions: Vec<_> = Product::ALL.iter().map(|p| p.api_version()).collect();
        versions.sort();
        versions.dedup();
        assert_eq!(versions.len(), 4);
    }
}
