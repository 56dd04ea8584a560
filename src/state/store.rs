// state/store.rs
// In-memory entity collections backed by a BlobStore. Mutations are applied
// here and followed by a wholesale save of the affected collections.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, warn};

use crate::models::{
    Client, ConsumptionRecord, Credentials, DefaultValues, InvoiceGroup, Period, ProRatedCharge,
};

use super::blob::BlobStore;

/// Named collection; also the blob key and the broadcast event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Periods,
    Consumption,
    ProRations,
    Groups,
    Credentials,
    DefaultValues,
}

impl Collection {
    /// Collections pushed to every socket on connect.
    pub const SNAPSHOT: [Collection; 5] = [
        Collection::Clients,
        Collection::Periods,
        Collection::Consumption,
        Collection::ProRations,
        Collection::Groups,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Collection::Clients => "clientes",
            Collection::Periods => "periodos",
            Collection::Consumption => "consumos",
            Collection::ProRations => "prorrateos",
            Collection::Groups => "grupos",
            Collection::Credentials => "auth",
            Collection::DefaultValues => "default_values",
        }
    }
}

pub trait Identified {
    fn id(&self) -> &str;
}

macro_rules! identified {
    ($($ty:ty),*) => {
        $(impl Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

identified!(Client, Period, ConsumptionRecord, ProRatedCharge, InvoiceGroup);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Replaced,
}

/// Replaces the item with the same id, or appends it.
pub fn upsert<T: Identified>(items: &mut Vec<T>, item: T) -> Upserted {
    match items.iter().position(|existing| existing.id() == item.id()) {
        Some(index) => {
            items[index] = item;
            Upserted::Replaced
        }
        None => {
            items.push(item);
            Upserted::Inserted
        }
    }
}

/// Removes every item matching `predicate`; returns how many were removed.
pub fn delete_where<T>(items: &mut Vec<T>, mut predicate: impl FnMut(&T) -> bool) -> usize {
    let before = items.len();
    items.retain(|item| !predicate(item));
    before - items.len()
}

pub fn find<T>(items: &[T], mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
    items.iter().find(|item| predicate(item))
}

/// Canonical period ordering: chronological by (year, month) parsed from the
/// MMYYYY name. Names that do not parse go last, ordered by raw name.
pub fn chronological_cmp(a: &Period, b: &Period) -> Ordering {
    match (a.chronological_key(), b.chronological_key()) {
        (Some(ka), Some(kb)) => ka.cmp(&kb).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}

pub struct EntityStore {
    pub clients: Vec<Client>,
    pub periods: Vec<Period>,
    pub consumption: Vec<ConsumptionRecord>,
    pub prorations: Vec<ProRatedCharge>,
    pub groups: Vec<InvoiceGroup>,
    pub credentials: Credentials,
    pub default_values: DefaultValues,
    blobs: Box<dyn BlobStore>,
}

impl EntityStore {
    /// Loads every collection; unreadable blobs fall back to empty/default.
    pub fn load(blobs: Box<dyn BlobStore>) -> Self {
        let mut store = Self {
            clients: load_blob(blobs.as_ref(), Collection::Clients),
            periods: load_blob(blobs.as_ref(), Collection::Periods),
            consumption: load_blob(blobs.as_ref(), Collection::Consumption),
            prorations: load_blob(blobs.as_ref(), Collection::ProRations),
            groups: load_blob(blobs.as_ref(), Collection::Groups),
            credentials: load_blob(blobs.as_ref(), Collection::Credentials),
            default_values: load_blob(blobs.as_ref(), Collection::DefaultValues),
            blobs,
        };
        store.sort_periods();
        store
    }

    /// Writes the given collections. Failures are logged; memory stays authoritative.
    pub fn persist(&self, collections: &[Collection]) {
        for collection in collections {
            let encoded = match *collection {
                Collection::Clients => serde_json::to_string_pretty(&self.clients),
                Collection::Periods => serde_json::to_string_pretty(&self.periods),
                Collection::Consumption => serde_json::to_string_pretty(&self.consumption),
                Collection::ProRations => serde_json::to_string_pretty(&self.prorations),
                Collection::Groups => serde_json::to_string_pretty(&self.groups),
                Collection::Credentials => serde_json::to_string_pretty(&self.credentials),
                Collection::DefaultValues => serde_json::to_string_pretty(&self.default_values),
            };
            let result = encoded
                .map_err(anyhow::Error::from)
                .and_then(|contents| self.blobs.save(collection.key(), &contents));
            match result {
                Ok(()) => debug!(collection = collection.key(), "collection saved"),
                Err(err) => warn!(
                    collection = collection.key(),
                    error = %format!("{err:#}"),
                    "failed to persist collection; keeping in-memory state"
                ),
            }
        }
    }

    /// JSON value of a collection as broadcast to sockets.
    pub fn snapshot(&self, collection: Collection) -> Value {
        match collection {
            Collection::Clients => to_value(&self.clients),
            Collection::Periods => to_value(&self.periods),
            Collection::Consumption => to_value(&self.consumption),
            Collection::ProRations => to_value(&self.prorations),
            Collection::Groups => to_value(&self.groups),
            Collection::Credentials => Value::Null,
            Collection::DefaultValues => to_value(&self.default_values),
        }
    }

    /// Timestamp-derived id, bumped until unique in `collection`.
    pub fn new_id(&self, collection: Collection) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.id_taken(collection, &candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn id_taken(&self, collection: Collection, id: &str) -> bool {
        match collection {
            Collection::Clients => self.clients.iter().any(|c| c.id == id),
            Collection::Periods => self.periods.iter().any(|p| p.id == id),
            Collection::Consumption => self.consumption.iter().any(|c| c.id == id),
            Collection::ProRations => self.prorations.iter().any(|p| p.id == id),
            Collection::Groups => self.groups.iter().any(|g| g.id == id),
            Collection::Credentials | Collection::DefaultValues => false,
        }
    }

    /// Uses the supplied id unless it is blank.
    pub fn id_or_new(&self, collection: Collection, id: Option<&str>) -> String {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => self.new_id(collection),
        }
    }

    pub fn sort_periods(&mut self) {
        self.periods.sort_by(chronological_cmp);
    }

    /// Chronologically-last period; the fallback tariff for pro-rations.
    /// Periods with unparsable names only qualify when no other period exists.
    pub fn latest_period(&self) -> Option<&Period> {
        self.periods
            .iter()
            .filter(|p| p.chronological_key().is_some())
            .max_by(|a, b| chronological_cmp(a, b))
            .or_else(|| self.periods.iter().max_by(|a, b| chronological_cmp(a, b)))
    }

    pub fn client_by_code(&self, code: &str) -> Option<&Client> {
        find(&self.clients, |c| c.code == code)
    }

    pub fn client_by_id(&self, id: &str) -> Option<&Client> {
        find(&self.clients, |c| c.id == id)
    }

    pub fn period_by_id(&self, id: &str) -> Option<&Period> {
        find(&self.periods, |p| p.id == id)
    }
}

fn load_blob<T: DeserializeOwned + Default>(blobs: &dyn BlobStore, collection: Collection) -> T {
    let key = collection.key();
    let raw = match blobs.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!(collection = key, error = %format!("{err:#}"), "failed to read collection");
            return T::default();
        }
    };
    if raw.trim().is_empty() {
        return T::default();
    }
    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => {
            warn!(collection = key, error = %err, "failed to decode collection");
            T::default()
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        warn!(error = %err, "failed to encode collection snapshot");
        Value::Null
    })
}
