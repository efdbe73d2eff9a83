//! Family (household) model.
//!
//! A family is the unit that drives and rides. Families are owned by the
//! registration subsystem; the scheduler only reads them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Carpool group identifier.
pub type GroupId = String;
/// Family identifier (unique within the directory).
pub type FamilyId = String;
/// Parent/guardian identifier.
pub type ParentId = String;
/// Child identifier.
pub type ChildId = String;

/// Home location of a family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Free-form street address, if known.
    pub address: Option<String>,
}

impl Location {
    /// Creates a location from coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }

    /// Sets the street address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// A household participating in a carpool group.
///
/// `parent_ids` is ordered: the first parent is the designated driver
/// whenever the family is assigned to drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    /// Unique family identifier.
    pub id: FamilyId,
    /// Parents/guardians, in driving priority order.
    pub parent_ids: Vec<ParentId>,
    /// Children riding with the carpool.
    pub child_ids: BTreeSet<ChildId>,
    /// Home location.
    pub home: Location,
}

impl Family {
    /// Creates a family with no parents or children.
    pub fn new(id: impl Into<FamilyId>) -> Self {
        Self {
            id: id.into(),
            parent_ids: Vec::new(),
            child_ids: BTreeSet::new(),
            home: Location::default(),
        }
    }

    /// Appends a parent/guardian.
    pub fn with_parent(mut self, parent_id: impl Into<ParentId>) -> Self {
        self.parent_ids.push(parent_id.into());
        self
    }

    /// Adds a child.
    pub fn with_child(mut self, child_id: impl Into<ChildId>) -> Self {
        self.child_ids.insert(child_id.into());
        self
    }

    /// Sets the home location.
    pub fn with_home(mut self, home: Location) -> Self {
        self.home = home;
        self
    }

    /// The parent who drives when this family is assigned.
    pub fn designated_driver(&self) -> Option<&ParentId> {
        self.parent_ids.first()
    }
}
