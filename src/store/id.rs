use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::ParseIntError;

use rocket::request::FromParam;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Surrogate key of a stored `Item`.
///
/// The phantom type keeps venue, artist and show keys apart. All trait impls
/// are written by hand, because derive would put bounds on `Item`. See
/// https://github.com/rust-lang/rust/issues/26925
pub struct Id<Item> {
    id: i32,
    item: PhantomData<fn() -> Item>,
}

impl<Item> Id<Item> {
    pub fn new(id: i32) -> Self {
        Id {
            id,
            item: PhantomData,
        }
    }

    pub fn get(self) -> i32 {
        self.id
    }
}

impl<Item> From<i32> for Id<Item> {
    fn from(id: i32) -> Self {
        Id::new(id)
    }
}

impl<Item> Clone for Id<Item> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Item> Copy for Id<Item> {}

impl<Item> PartialEq for Id<Item> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<Item> Eq for Id<Item> {}

impl<Item> PartialOrd for Id<Item> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Item> Ord for Id<Item> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<Item> Hash for Id<Item> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<Item> Debug for Id<Item> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.id)
    }
}

impl<Item> Display for Id<Item> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.id, f)
    }
}

impl<Item> Serialize for Id<Item> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.id)
    }
}

impl<'de, Item> Deserialize<'de> for Id<Item> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(Id::new)
    }
}

impl<'a, Item> FromParam<'a> for Id<Item> {
    type Error = ParseIntError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse().map(Id::new)
    }
}
