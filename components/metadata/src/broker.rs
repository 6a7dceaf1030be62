use std::collections::BTreeMap;

use log::{error, warn};

use crate::error::MetadataError;
use crate::object::WalObject;

/// Per-broker collection of WAL objects, kept in commit order.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerWalIndex {
    broker_id: i32,

    /// Keyed by order id, so iteration yields the broker's commit order.
    wal_objects: BTreeMap<u64, WalObject>,
}

impl BrokerWalIndex {
    pub fn new(broker_id: i32) -> Self {
        Self {
            broker_id,
            wal_objects: BTreeMap::new(),
        }
    }

    /// Build from a fully-formed map, for the metadata-log applier.
    pub fn with_contents(broker_id: i32, wal_objects: BTreeMap<u64, WalObject>) -> Self {
        Self {
            broker_id,
            wal_objects,
        }
    }

    pub fn broker_id(&self) -> i32 {
        self.broker_id
    }

    pub fn apply(&mut self, object: WalObject) -> Result<(), MetadataError> {
        if object.broker_id() != self.broker_id {
            error!(
                "Broker-id mismatch, broker_id={}, record broker_id={}",
                self.broker_id,
                object.broker_id()
            );
            return Err(MetadataError::BrokerIdMismatch {
                expected: self.broker_id,
                actual: object.broker_id(),
            });
        }
        if let Some(prior) = self.wal_objects.insert(object.order_id(), object) {
            warn!(
                "Replaced WAL object {} of broker {} at order {}",
                prior.object_id(),
                self.broker_id,
                prior.order_id()
            );
        }
        Ok(())
    }

    /// WAL objects in ascending commit order.
    pub fn wal_objects(&self) -> impl Iterator<Item = &WalObject> {
        self.wal_objects.values()
    }

    pub fn is_empty(&self) -> bool {
        self.wal_objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.wal_objects.len()
    }
}
