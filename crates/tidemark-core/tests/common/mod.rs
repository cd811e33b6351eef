// SPDX-License-Identifier: Apache-2.0
//! Shared fixtures: a Widget node type and an in-memory keyset executor.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::Cell;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tidemark_core::{
    FetchError, FetchPage, NodeEntity, NodeRegistry, NodeRegistryBuilder, NodeTypeDescriptor,
    OrderSource, OrderSpec, OrderValue, Paginator, QueryExecutor, TokenCodec,
};
use tidemark_token::{AesGcmCipher, DomainKeys};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    pub id: u64,
    pub name: String,
    pub rating: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Widget {
    pub fn new(id: u64, name: &str, rating: Option<i64>) -> Self {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Self {
            id,
            name: name.to_owned(),
            rating,
            created_at: base + Duration::days(i64::try_from(id).unwrap()),
        }
    }
}

impl OrderSource for Widget {
    fn order_value(&self, field: &str) -> Option<OrderValue> {
        match field {
            "id" => i64::try_from(self.id).ok().map(OrderValue::Long),
            "name" => Some(OrderValue::Text(self.name.clone())),
            "rating" => self.rating.map(OrderValue::Long),
            "created_at" => Some(OrderValue::Instant(self.created_at)),
            _ => None,
        }
    }
}

impl NodeEntity for Widget {
    fn entity_id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gadget {
    pub id: u64,
}

impl OrderSource for Gadget {
    fn order_value(&self, field: &str) -> Option<OrderValue> {
        match field {
            "id" => i64::try_from(self.id).ok().map(OrderValue::Long),
            _ => None,
        }
    }
}

impl NodeEntity for Gadget {
    fn entity_id(&self) -> u64 {
        self.id
    }
}

/// Registry with Widget (derived id) and Gadget (derived id).
pub fn registry() -> Arc<NodeRegistry> {
    Arc::new(
        NodeRegistryBuilder::new()
            .register::<Widget>(NodeTypeDescriptor::new("Widget"))
            .register::<Gadget>(NodeTypeDescriptor::new("Gadget"))
            .build()
            .unwrap(),
    )
}

pub fn cursor_codec() -> TokenCodec {
    let keys = DomainKeys::from_raw([0x4C; 32], b"test-cursor-domain".to_vec()).unwrap();
    TokenCodec::cursor_domain(keys, Arc::new(AesGcmCipher))
}

pub fn id_codec() -> TokenCodec {
    let keys = DomainKeys::from_raw([0x1D; 32], b"test-id-domain".to_vec()).unwrap();
    TokenCodec::id_domain(keys, Arc::new(AesGcmCipher))
}

pub fn paginator(max_page_size: usize) -> Paginator {
    Paginator::new(registry(), cursor_codec(), max_page_size)
}

/// Five widgets with ids 1..=5, distinct names, all rated.
pub fn five_widgets() -> Vec<Widget> {
    vec![
        Widget::new(1, "anchor", Some(10)),
        Widget::new(2, "bobbin", Some(20)),
        Widget::new(3, "caliper", Some(20)),
        Widget::new(4, "dynamo", Some(30)),
        Widget::new(5, "easel", Some(30)),
    ]
}

/// In-memory reference executor: sorts with the spec's comparator and seeks
/// with its strictly-after predicate, so engine tests exercise the same
/// keyset semantics a SQL backend must implement.
pub struct MemoryExecutor {
    rows: Vec<Widget>,
    pub calls: Cell<usize>,
}

impl MemoryExecutor {
    pub fn new(rows: Vec<Widget>) -> Self {
        Self {
            rows,
            calls: Cell::new(0),
        }
    }
}

impl QueryExecutor<Widget> for MemoryExecutor {
    fn fetch(
        &self,
        spec: &OrderSpec,
        seek: Option<&[OrderValue]>,
        count: usize,
    ) -> Result<FetchPage<Widget>, FetchError> {
        self.calls.set(self.calls.get() + 1);

        let mut sorted = self.rows.clone();
        sorted.sort_by(|a, b| spec.compare(a, b));

        let matched: Vec<Widget> = match seek {
            Some(key) => sorted
                .iter()
                .filter(|row| spec.is_strictly_after(*row, key))
                .cloned()
                .collect(),
            None => sorted.clone(),
        };
        let skipped = sorted.len() - matched.len();
        let has_more_after = matched.len() > count;
        let rows: Vec<Widget> = matched.into_iter().take(count).collect();
        Ok(FetchPage {
            rows,
            has_more_before: skipped > 0,
            has_more_after,
        })
    }
}
