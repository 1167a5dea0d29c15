//! Product variant and version of the remote system.
//!
//! Detected once by the caller and handed to the reconciler by reference.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::middleware::{Middleware, MiddlewareError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProductType {
    Scale,
    Core,
    CommunityEdition,
    Enterprise,
    Other(String),
}

impl ProductType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCALE" => ProductType::Scale,
            "CORE" => ProductType::Core,
            "COMMUNITY_EDITION" => ProductType::CommunityEdition,
            "ENTERPRISE" | "SCALE_ENTERPRISE" => ProductType::Enterprise,
            _ => ProductType::Other(s.trim().to_string()),
        }
    }

    fn label(&self) -> &str {
        match self {
            ProductType::Scale => "SCALE",
            ProductType::Core => "CORE",
            ProductType::CommunityEdition => "Community Edition",
            ProductType::Enterprise => "Enterprise",
            ProductType::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub product_name: String,
    pub product_type: ProductType,
    pub version: String,
}

impl SystemInfo {
    pub fn scale(version: &str) -> Self {
        Self {
            product_name: "TrueNAS".to_string(),
            product_type: ProductType::Scale,
            version: version.to_string(),
        }
    }

    /// Whether `pool.dataset.create` accepts `create_ancestors`.
    pub fn supports_create_ancestors(&self) -> bool {
        self.product_type != ProductType::Core
    }

    pub fn product_label(&self) -> String {
        format!("{} {}", self.product_name, self.product_type.label())
    }

    pub async fn detect(client: &dyn Middleware) -> Result<Self, MiddlewareError> {
        let product_type = as_string(client.call("system.product_type", vec![]).await?);
        let full_version = as_string(client.call("system.version", vec![]).await?);

        // CORE still exposes the product name; newer SCALE releases dropped it.
        let mut product_name = None;
        if ProductType::parse(&product_type) == ProductType::Core {
            product_name = Some(as_string(client.call("system.product_name", vec![]).await?));
        }

        let parsed = split_version(&full_version);
        let product_type = if product_type.trim().is_empty() {
            parsed.product_type.unwrap_or_default()
        } else {
            product_type
        };

        let info = Self {
            product_name: product_name
                .or(parsed.name)
                .unwrap_or_else(|| "TrueNAS".to_string()),
            product_type: ProductType::parse(&product_type),
            version: parsed.version,
        };
        debug!(?info, "Detected remote system");
        Ok(info)
    }
}

fn as_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct VersionParts {
    name: Option<String>,
    product_type: Option<String>,
    version: String,
}

/// Split `<name>-<version>` or `<name>-<type>-<version>`. Anything else is
/// kept whole as the version.
fn split_version(full: &str) -> VersionParts {
    let whole = || VersionParts {
        name: None,
        product_type: None,
        version: full.to_string(),
    };
    let is_word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_');

    let parts: Vec<&str> = full.split('-').collect();
    let Some(start) = parts
        .iter()
        .position(|p| p.starts_with(|c: char| c.is_ascii_digit()))
    else {
        return whole();
    };
    if start == 0 || start > 2 || !parts[..start].iter().all(|p| is_word(*p)) {
        return whole();
    }

    VersionParts {
        name: Some(parts[0].to_string()),
        product_type: (start == 2).then(|| parts[1].to_string()),
        version: parts[start..].join("-"),
    }
}
