//! Domain types shared between the store and the HTTP layer
//!
//! These are the storage-facing shapes; the wire-facing DTOs live in
//! [`crate::http`] and convert from/to these.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a courier travels, which constrains the regions and load they can
/// take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CourierType {
    Foot,
    Bike,
    Auto,
}

impl CourierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourierType::Foot => "FOOT",
            CourierType::Bike => "BIKE",
            CourierType::Auto => "AUTO",
        }
    }
}

impl fmt::Display for CourierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourierType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOOT" => Ok(CourierType::Foot),
            "BIKE" => Ok(CourierType::Bike),
            "AUTO" => Ok(CourierType::Auto),
            _ => Err(anyhow!(
                "Invalid courier type: {}. Valid options are: FOOT, BIKE, AUTO",
                s
            )),
        }
    }
}

/// A registered courier.
#[derive(Debug, Clone, PartialEq)]
pub struct Courier {
    pub courier_id: i64,
    pub courier_type: CourierType,
    pub regions: Vec<i64>,
    pub working_hours: Vec<String>,
}

/// Courier attributes supplied at creation; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewCourier {
    pub courier_type: CourierType,
    pub regions: Vec<i64>,
    pub working_hours: Vec<String>,
}

/// A delivery order. `completed_time` and `completed_courier_id` are set
/// together, exactly once, by the completion guard.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: i64,
    pub weight: f64,
    pub regions: i64,
    pub delivery_hours: Vec<String>,
    pub cost: i64,
    pub completed_time: Option<DateTime<Utc>>,
    pub completed_courier_id: Option<i64>,
}

/// Order attributes supplied at creation; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub weight: f64,
    pub regions: i64,
    pub delivery_hours: Vec<String>,
    pub cost: i64,
}
