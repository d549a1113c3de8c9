use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use shared::domain::{Shipment, ShipmentId};
use thiserror::Error;
use tracing::info;

/// The catalog source was unreachable or its payload malformed. Callers are
/// expected to continue with [`ShipmentCatalog::empty`] rather than abort.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog source '{path}': {source}")]
    Unreachable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("duplicate shipment id '{0}' in catalog payload")]
    DuplicateId(ShipmentId),
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    shipments: Vec<Shipment>,
}

/// Read-only set of shipments eligible for root-cause analysis, loaded once
/// at session start. Exposes no mutation.
#[derive(Debug, Default)]
pub struct ShipmentCatalog {
    shipments: Vec<Shipment>,
    index: HashMap<ShipmentId, usize>,
}

impl ShipmentCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the catalog from a JSON document on disk. A document without a
    /// `shipments` field yields an empty catalog, not an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Unreachable {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            shipments = catalog.len(),
            "catalog: loaded shipment set"
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Self::from_shipments(document.shipments)
    }

    fn from_shipments(shipments: Vec<Shipment>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(shipments.len());
        for (position, shipment) in shipments.iter().enumerate() {
            if index
                .insert(shipment.shipment_id.clone(), position)
                .is_some()
            {
                return Err(CatalogError::DuplicateId(shipment.shipment_id.clone()));
            }
        }
        Ok(Self { shipments, index })
    }

    /// All loaded shipments in source order. Each call starts a fresh pass.
    pub fn list(&self) -> impl Iterator<Item = &Shipment> + '_ {
        self.shipments.iter()
    }

    pub fn get(&self, shipment_id: &ShipmentId) -> Option<&Shipment> {
        self.index
            .get(shipment_id)
            .map(|position| &self.shipments[*position])
    }

    pub fn contains(&self, shipment_id: &ShipmentId) -> bool {
        self.index.contains_key(shipment_id)
    }

    pub fn len(&self) -> usize {
        self.shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
