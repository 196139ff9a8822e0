use serde::{Deserialize, Serialize};

/// Acquisition strategy for a collection job; also the job's `jobType` tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMethod {
    #[default]
    Api,
    Scraping,
}

impl CollectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionMethod::Api => "api",
            CollectionMethod::Scraping => "scraping",
        }
    }
}

impl std::fmt::Display for CollectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CollectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(CollectionMethod::Api),
            "scraping" => Ok(CollectionMethod::Scraping),
            _ => Err(format!("Invalid collection method: {}", s)),
        }
    }
}
