//! Domain value objects: ServiceType, InjectionKind, DependencyKind.
//!
//! # Design
//!
//! These are pure value types: `Copy`, equality-by-value, no identity.
//! This file's only job is to define the types, their string
//! representations, and their `FromStr` parsers.
//!
//! # Adding New Variants
//!
//! 1. Add the enum variant here
//! 2. Add the `as_str` arm and the `FromStr` arm here
//! 3. Add it to the `ALL` table
//! 4. Done, nothing else changes

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── ServiceType ───────────────────────────────────────────────────────────────

/// The capability a service provides to a project.
///
/// `Database` and `Auth` are *exclusive*: a project may run at most one
/// enabled service of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Database,
    Auth,
    Payment,
    Notification,
    Analytics,
    Monitoring,
    Cache,
    Storage,
    Api,
    Messaging,
    Search,
    Cdn,
    Logger,
}

impl ServiceType {
    pub const ALL: [ServiceType; 13] = [
        Self::Database,
        Self::Auth,
        Self::Payment,
        Self::Notification,
        Self::Analytics,
        Self::Monitoring,
        Self::Cache,
        Self::Storage,
        Self::Api,
        Self::Messaging,
        Self::Search,
        Self::Cdn,
        Self::Logger,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Auth => "auth",
            Self::Payment => "payment",
            Self::Notification => "notification",
            Self::Analytics => "analytics",
            Self::Monitoring => "monitoring",
            Self::Cache => "cache",
            Self::Storage => "storage",
            Self::Api => "api",
            Self::Messaging => "messaging",
            Self::Search => "search",
            Self::Cdn => "cdn",
            Self::Logger => "logger",
        }
    }

    /// Whether at most one enabled service of this type may be active.
    pub const fn is_exclusive(self) -> bool {
        matches!(self, Self::Database | Self::Auth)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "database" | "db" => Ok(Self::Database),
            "auth" => Ok(Self::Auth),
            "payment" | "payments" => Ok(Self::Payment),
            "notification" | "notifications" | "email" => Ok(Self::Notification),
            "analytics" => Ok(Self::Analytics),
            "monitoring" => Ok(Self::Monitoring),
            "cache" => Ok(Self::Cache),
            "storage" => Ok(Self::Storage),
            "api" => Ok(Self::Api),
            "messaging" | "queue" => Ok(Self::Messaging),
            "search" => Ok(Self::Search),
            "cdn" => Ok(Self::Cdn),
            "logger" | "logging" => Ok(Self::Logger),
            other => Err(DomainError::UnknownServiceType(other.to_string())),
        }
    }
}

// ── InjectionKind ─────────────────────────────────────────────────────────────

/// What an injection point touches on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionKind {
    #[default]
    File,
    Directory,
    Config,
}

impl InjectionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for InjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InjectionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "directory" | "dir" => Ok(Self::Directory),
            "config" => Ok(Self::Config),
            other => Err(DomainError::invalid_template(
                "<kind>",
                format!("unknown injection kind '{other}'; expected file, directory or config"),
            )),
        }
    }
}

// ── DependencyKind ────────────────────────────────────────────────────────────

/// How a package dependency is declared in the target project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Dev,
    Peer,
    #[default]
    Runtime,
}

impl DependencyKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Peer => "peer",
            Self::Runtime => "runtime",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "peer" => Ok(Self::Peer),
            "runtime" | "prod" => Ok(Self::Runtime),
            other => Err(DomainError::invalid_template(
                "<dependency>",
                format!("unknown dependency kind '{other}'; expected dev, peer or runtime"),
            )),
        }
    }
}

// ── ProjectPreset ─────────────────────────────────────────────────────────────

/// A project archetype with a recommended service mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectPreset {
    Saas,
    Ecommerce,
    Api,
    Blog,
    Marketplace,
}

impl ProjectPreset {
    pub const ALL: [ProjectPreset; 5] = [
        Self::Saas,
        Self::Ecommerce,
        Self::Api,
        Self::Blog,
        Self::Marketplace,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Saas => "saas",
            Self::Ecommerce => "ecommerce",
            Self::Api => "api",
            Self::Blog => "blog",
            Self::Marketplace => "marketplace",
        }
    }

    pub const fn recommended(&self) -> &'static [ServiceType] {
        use ServiceType::*;
        match self {
            Self::Saas => &[Auth, Database, Payment, Notification, Analytics, Monitoring],
            Self::Ecommerce => &[Database, Payment, Storage, Search, Notification, Analytics, Cdn],
            Self::Api => &[Database, Auth, Cache, Monitoring, Logger],
            Self::Blog => &[Database, Storage, Cdn, Analytics, Search],
            Self::Marketplace => &[
                Auth,
                Database,
                Payment,
                Storage,
                Search,
                Notification,
                Messaging,
            ],
        }
    }
}

impl fmt::Display for ProjectPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectPreset {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "saas" => Ok(Self::Saas),
            "ecommerce" | "e-commerce" | "shop" => Ok(Self::Ecommerce),
            "api" => Ok(Self::Api),
            "blog" => Ok(Self::Blog),
            "marketplace" => Ok(Self::Marketplace),
            other => Err(DomainError::InvalidConfiguration {
                service: "<project>".into(),
                errors: vec![format!(
                    "unknown project type '{other}'; expected saas, ecommerce, api, blog or marketplace"
                )],
            }),
        }
    }
}
