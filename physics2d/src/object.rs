// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Object identifiers
//!
//! Every collidable object is addressed by a stable integer id that the
//! broadphase, the contact store and the body set all agree on. Pairs of ids
//! are canonicalized so `(a, b)` and `(b, a)` hash and sort identically.

use std::fmt;

/// Stable identifier for a collidable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Create a new ObjectId from a raw value
    pub fn new(id: u32) -> Self {
        ObjectId(id)
    }

    /// Get the raw value
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Raw value widened for slice indexing
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(id: u32) -> Self {
        ObjectId(id)
    }
}

/// Unordered pair of object ids, stored as `(min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectPair {
    a: ObjectId,
    b: ObjectId,
}

impl ObjectPair {
    /// Create a canonical pair; argument order does not matter
    pub fn new(x: ObjectId, y: ObjectId) -> Self {
        if x <= y {
            ObjectPair { a: x, b: y }
        } else {
            ObjectPair { a: y, b: x }
        }
    }

    /// The smaller id
    pub fn a(&self) -> ObjectId {
        self.a
    }

    /// The larger id
    pub fn b(&self) -> ObjectId {
        self.b
    }

    /// Whether `id` is one of the two endpoints
    pub fn contains(&self, id: ObjectId) -> bool {
        self.a == id || self.b == id
    }

    /// The endpoint that is not `id`, if `id` is an endpoint
    pub fn other(&self, id: ObjectId) -> Option<ObjectId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

impl fmt::Display for ObjectPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pair({}, {})", self.a.0, self.b.0)
    }
}
