//! Wire-level request and response shapes
//!
//! Field names match the service's public JSON contract; conversions to and
//! from the domain types in [`crate::types`] live here so handlers stay
//! declarative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Courier, CourierType, NewCourier, NewOrder, Order};

/// `limit`/`offset` query parameters for listings. The service's contract
/// defaults `limit` to a single record.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateCourierRequest {
    pub couriers: Vec<CreateCourierDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCourierDto {
    pub courier_type: CourierType,
    pub regions: Vec<i64>,
    pub working_hours: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourierDto {
    pub courier_id: i64,
    pub courier_type: CourierType,
    pub regions: Vec<i64>,
    pub working_hours: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCouriersResponse {
    pub couriers: Vec<CourierDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub orders: Vec<CreateOrderDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderDto {
    pub weight: f64,
    pub regions: i64,
    pub delivery_hours: Vec<String>,
    pub cost: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDto {
    pub order_id: i64,
    pub weight: f64,
    pub regions: i64,
    pub delivery_hours: Vec<String>,
    pub cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteOrdersRequest {
    pub complete_info: Vec<CompleteOrderDto>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteOrderDto {
    pub courier_id: i64,
    pub order_id: i64,
    pub complete_time: DateTime<Utc>,
}

impl From<CreateCourierDto> for NewCourier {
    fn from(dto: CreateCourierDto) -> Self {
        NewCourier {
            courier_type: dto.courier_type,
            regions: dto.regions,
            working_hours: dto.working_hours,
        }
    }
}

impl From<Courier> for CourierDto {
    fn from(courier: Courier) -> Self {
        CourierDto {
            courier_id: courier.courier_id,
            courier_type: courier.courier_type,
            regions: courier.regions,
            working_hours: courier.working_hours,
        }
    }
}

impl From<CreateOrderDto> for NewOrder {
    fn from(dto: CreateOrderDto) -> Self {
        NewOrder {
            weight: dto.weight,
            regions: dto.regions,
            delivery_hours: dto.delivery_hours,
            cost: dto.cost,
        }
    }
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        OrderDto {
            order_id: order.order_id,
            weight: order.weight,
            regions: order.regions,
            delivery_hours: order.delivery_hours,
            cost: order.cost,
            completed_time: order.completed_time,
        }
    }
}
