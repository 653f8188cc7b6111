//! Facility configuration
//!
//! Configuration structs are plain serde types so the (external) input layer
//! can load them from JSON. Validation happens once, at facility construction:
//!
//! - commodity preferences default to 1.0 when none are given;
//! - a preference list of the wrong length is a `ConfigurationMismatch`;
//! - every recipe, package and transport unit name must resolve in the catalog.
//!
//! # Example
//!
//! ```rust
//! use facility_sim_core::config::StorageConfig;
//!
//! let json = r#"{
//!     "in_commods": ["spent_fuel"],
//!     "out_commods": ["stored_fuel"],
//!     "residence_time": 3
//! }"#;
//! let config: StorageConfig = serde_json::from_str(json).unwrap();
//! assert_eq!(config.throughput, f64::MAX);
//! assert!(!config.discrete_handling);
//! assert_eq!(config.package, "unpackaged");
//! ```

use crate::catalog::Catalog;
use crate::models::packaging::{Packager, ShippingLimit, UNRESTRICTED};
use crate::models::resource::{Composition, UNPACKAGED};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while validating a facility configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Configuration mismatch: {commodities} commodities but {preferences} preferences")]
    ConfigurationMismatch {
        commodities: usize,
        preferences: usize,
    },

    #[error("At least one input commodity is required")]
    EmptyCommodities,

    #[error("Unknown recipe: {0}")]
    UnknownRecipe(String),

    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    #[error("Unknown transport unit: {0}")]
    UnknownTransportUnit(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

fn default_throughput() -> f64 {
    f64::MAX
}

fn default_package() -> String {
    UNPACKAGED.to_string()
}

fn default_transport_unit() -> String {
    UNRESTRICTED.to_string()
}

/// Input commodities paired with their request preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityPreferences {
    commodities: Vec<String>,
    preferences: Vec<f64>,
}

impl CommodityPreferences {
    /// Pair commodities with preferences, defaulting every preference to 1.0
    /// when none are given
    ///
    /// # Example
    /// ```
    /// use facility_sim_core::config::CommodityPreferences;
    ///
    /// let prefs = CommodityPreferences::new(vec!["a".into(), "b".into()], vec![]).unwrap();
    /// assert_eq!(prefs.preferences(), &[1.0, 1.0]);
    ///
    /// assert!(CommodityPreferences::new(vec!["a".into()], vec![1.0, 2.0]).is_err());
    /// ```
    pub fn new(commodities: Vec<String>, preferences: Vec<f64>) -> Result<Self, ConfigError> {
        if commodities.is_empty() {
            return Err(ConfigError::EmptyCommodities);
        }
        let preferences = if preferences.is_empty() {
            vec![1.0; commodities.len()]
        } else {
            preferences
        };
        if preferences.len() != commodities.len() {
            return Err(ConfigError::ConfigurationMismatch {
                commodities: commodities.len(),
                preferences: preferences.len(),
            });
        }
        if let Some(bad) = preferences.iter().find(|p| p.is_nan() || **p <= 0.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "commodity preference must be positive, got {}",
                bad
            )));
        }
        Ok(Self {
            commodities,
            preferences,
        })
    }

    pub fn commodities(&self) -> &[String] {
        &self.commodities
    }

    pub fn preferences(&self) -> &[f64] {
        &self.preferences
    }

    /// (commodity, preference) pairs in declared order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.commodities
            .iter()
            .map(String::as_str)
            .zip(self.preferences.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.commodities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commodities.is_empty()
    }
}

/// Configuration for a [`Conversion`](crate::facility::Conversion) facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Commodities accepted, in preference-declaration order
    pub in_commods: Vec<String>,

    /// Preference per input commodity (defaults to 1.0 each)
    #[serde(default)]
    pub in_commod_prefs: Vec<f64>,

    /// Recipe for requested material; empty accepts anything
    #[serde(default)]
    pub inrecipe_name: String,

    /// Commodity offered
    pub outcommod: String,

    /// Recipe of offered material; empty matches whatever is requested
    #[serde(default)]
    pub outrecipe: String,

    /// Maximum quantity accepted and offered per timestep (kg)
    #[serde(default = "default_throughput")]
    pub throughput: f64,

    #[serde(default = "default_package")]
    pub package: String,

    #[serde(default = "default_transport_unit")]
    pub transport_unit: String,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,
}

impl ConversionConfig {
    /// Minimal configuration with every optional field defaulted
    pub fn new(in_commods: Vec<String>, outcommod: impl Into<String>) -> Self {
        Self {
            in_commods,
            in_commod_prefs: Vec::new(),
            inrecipe_name: String::new(),
            outcommod: outcommod.into(),
            outrecipe: String::new(),
            throughput: default_throughput(),
            package: default_package(),
            transport_unit: default_transport_unit(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    /// Validate and resolve every name against the catalog
    pub fn resolve(&self, catalog: &dyn Catalog) -> Result<ResolvedConfig, ConfigError> {
        check_non_negative("throughput", self.throughput)?;
        Ok(ResolvedConfig {
            preferences: CommodityPreferences::new(
                self.in_commods.clone(),
                self.in_commod_prefs.clone(),
            )?,
            in_recipe: resolve_recipe(catalog, &self.inrecipe_name)?,
            out_recipe: resolve_recipe(catalog, &self.outrecipe)?,
            packager: resolve_package(catalog, &self.package)?,
            shipping: resolve_transport_unit(catalog, &self.transport_unit)?,
        })
    }

    /// SHA-256 of the canonical JSON form
    pub fn config_hash(&self) -> String {
        hash_config(self)
    }
}

/// Configuration for a [`Storage`](crate::facility::Storage) facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Commodities accepted, in preference-declaration order
    pub in_commods: Vec<String>,

    /// Preference per input commodity (defaults to 1.0 each)
    #[serde(default)]
    pub in_commod_prefs: Vec<f64>,

    /// Output commodity; every input is lumped into the first entry
    pub out_commods: Vec<String>,

    /// Recipe for requested material; empty accepts anything
    #[serde(default)]
    pub in_recipe: String,

    /// Minimum timesteps between receiving and offering
    #[serde(default)]
    pub residence_time: usize,

    /// Maximum quantity moved through the facility per timestep (kg)
    #[serde(default = "default_throughput")]
    pub throughput: f64,

    /// Maximum quantity held across all stages (kg)
    #[serde(default = "default_throughput")]
    pub max_inv_size: f64,

    /// Treat received lots as indivisible quanta while staging
    #[serde(default)]
    pub discrete_handling: bool,

    #[serde(default = "default_package")]
    pub package: String,

    #[serde(default = "default_transport_unit")]
    pub transport_unit: String,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,
}

impl StorageConfig {
    /// Minimal configuration with every optional field defaulted
    pub fn new(in_commods: Vec<String>, outcommod: impl Into<String>) -> Self {
        Self {
            in_commods,
            in_commod_prefs: Vec::new(),
            out_commods: vec![outcommod.into()],
            in_recipe: String::new(),
            residence_time: 0,
            throughput: default_throughput(),
            max_inv_size: default_throughput(),
            discrete_handling: false,
            package: default_package(),
            transport_unit: default_transport_unit(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    /// Validate and resolve every name against the catalog
    pub fn resolve(&self, catalog: &dyn Catalog) -> Result<ResolvedConfig, ConfigError> {
        check_non_negative("throughput", self.throughput)?;
        check_non_negative("max_inv_size", self.max_inv_size)?;
        if self.out_commods.is_empty() {
            return Err(ConfigError::InvalidParameter(
                "out_commods must name at least one commodity".to_string(),
            ));
        }
        Ok(ResolvedConfig {
            preferences: CommodityPreferences::new(
                self.in_commods.clone(),
                self.in_commod_prefs.clone(),
            )?,
            in_recipe: resolve_recipe(catalog, &self.in_recipe)?,
            out_recipe: None,
            packager: resolve_package(catalog, &self.package)?,
            shipping: resolve_transport_unit(catalog, &self.transport_unit)?,
        })
    }

    /// SHA-256 of the canonical JSON form
    pub fn config_hash(&self) -> String {
        hash_config(self)
    }
}

/// A validated configuration with every name looked up
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub preferences: CommodityPreferences,
    pub in_recipe: Option<Composition>,
    pub out_recipe: Option<Composition>,
    pub packager: Arc<dyn Packager>,
    pub shipping: Arc<dyn ShippingLimit>,
}

fn check_non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value < 0.0 {
        return Err(ConfigError::InvalidParameter(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

fn resolve_recipe(catalog: &dyn Catalog, name: &str) -> Result<Option<Composition>, ConfigError> {
    if name.is_empty() {
        return Ok(None);
    }
    catalog
        .recipe(name)
        .map(Some)
        .ok_or_else(|| ConfigError::UnknownRecipe(name.to_string()))
}

fn resolve_package(catalog: &dyn Catalog, name: &str) -> Result<Arc<dyn Packager>, ConfigError> {
    catalog
        .package(name)
        .ok_or_else(|| ConfigError::UnknownPackage(name.to_string()))
}

fn resolve_transport_unit(
    catalog: &dyn Catalog,
    name: &str,
) -> Result<Arc<dyn ShippingLimit>, ConfigError> {
    catalog
        .transport_unit(name)
        .ok_or_else(|| ConfigError::UnknownTransportUnit(name.to_string()))
}

fn hash_config<T: Serialize>(config: &T) -> String {
    // Serializing plain structs of strings and numbers cannot fail
    let json = serde_json::to_string(config).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}
