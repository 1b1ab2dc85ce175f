// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-record plans: the classified wire fields plus a key dispatch table built once.

use std::collections::{BTreeMap, BTreeSet};

use arow_wire::WireKey;
use tracing::debug;

use crate::classify::{classify, TypePath, WireField};
use crate::error::GenError;
use crate::schema::{RecordSchema, SchemaSet};

/// Wire fields of one record in schema order, with key lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPlan {
    /// Record type.
    pub path: TypePath,
    fields: Vec<WireField>,
    dispatch: BTreeMap<WireKey, usize>,
}

impl RecordPlan {
    /// Classify every field of `record` and index the participating ones by key.
    ///
    /// Two participating fields packing to the same key is an error naming both.
    pub fn build(set: &SchemaSet, record: &RecordSchema) -> Result<Self, GenError> {
        let mut members = BTreeSet::new();
        let mut fields: Vec<WireField> = Vec::new();
        let mut dispatch: BTreeMap<WireKey, usize> = BTreeMap::new();
        for def in &record.fields {
            if !members.insert(def.member.as_str()) {
                return Err(GenError::Argument(format!(
                    "{}: member `{}` is declared more than once",
                    record.qualified_name(),
                    def.member
                )));
            }
            let Some(field) = classify(set, record, def)? else {
                continue;
            };
            if let Some(&first) = dispatch.get(&field.key) {
                return Err(GenError::DuplicateWireKey {
                    record: record.qualified_name(),
                    key: field.key.decode(),
                    first: fields[first].member.clone(),
                    second: field.member,
                });
            }
            dispatch.insert(field.key, fields.len());
            fields.push(field);
        }
        debug!(record = %record.qualified_name(), fields = fields.len(), "planned record");
        Ok(Self {
            path: TypePath {
                namespace: record.namespace.clone(),
                name: record.name.clone(),
            },
            fields,
            dispatch,
        })
    }

    /// Participating fields in serialization order.
    pub fn fields(&self) -> &[WireField] {
        &self.fields
    }

    /// Field a key dispatches to.
    pub fn field_for(&self, key: WireKey) -> Option<&WireField> {
        self.dispatch.get(&key).map(|&i| &self.fields[i])
    }
}

/// Plans for every record of a schema set.
#[derive(Debug, Clone, Default)]
pub struct PlanSet {
    plans: Vec<RecordPlan>,
    index: BTreeMap<TypePath, usize>,
}

impl PlanSet {
    /// Build all plans, failing on the first invalid record.
    pub fn build(set: &SchemaSet) -> Result<Self, GenError> {
        let mut plans = Vec::with_capacity(set.records().len());
        let mut index = BTreeMap::new();
        for record in set.records() {
            let plan = RecordPlan::build(set, record)?;
            index.insert(plan.path.clone(), plans.len());
            plans.push(plan);
        }
        Ok(Self { plans, index })
    }

    /// Plans in schema order.
    pub fn plans(&self) -> &[RecordPlan] {
        &self.plans
    }

    /// Plan for a record type.
    pub fn get(&self, path: &TypePath) -> Option<&RecordPlan> {
        self.index.get(path).map(|&i| &self.plans[i])
    }

    /// Plan by qualified name (`a::b::Name` or `a.b.Name`).
    pub fn by_name(&self, qualified: &str) -> Option<&RecordPlan> {
        let normalized = qualified.trim().replace('.', "::");
        self.plans.iter().find(|p| p.path.to_string() == normalized)
    }
}
