// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arow schema IR (JSON) consumed by the generator.

use serde::{Deserialize, Serialize};

use crate::error::GenError;
use crate::schema::{EnumSchema, FieldDef, Namespace, RecordSchema, SchemaSet};

/// The only IR version this generator reads.
pub const IR_VERSION: &str = "arow-ir/v1";

/// Top-level IR document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArowIR {
    /// Must equal [`IR_VERSION`].
    #[serde(default)]
    pub ir_version: Option<String>,
    /// Producer of this document, informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<GeneratedBy>,
    /// Enum types fields may refer to.
    #[serde(default)]
    pub enums: Vec<EnumDefinition>,
    /// Record types to generate, in provider order.
    #[serde(default)]
    pub records: Vec<RecordDefinition>,
}

/// Tool that produced an IR document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedBy {
    /// Tool name.
    pub tool: String,
    /// Tool version.
    #[serde(default)]
    pub version: Option<String>,
}

/// IR enum entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDefinition {
    /// Dotted or `::` module path; empty for the root.
    #[serde(default)]
    pub namespace: String,
    /// Type name.
    pub name: String,
}

/// IR record entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDefinition {
    /// Dotted or `::` module path; empty for the root.
    #[serde(default)]
    pub namespace: String,
    /// Type name.
    pub name: String,
    /// Fields in serialization order.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// IR field entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Rust member name.
    pub name: String,
    /// Type expression.
    #[serde(rename = "type")]
    pub type_name: String,
    /// `Option<_>` for scalar and enum members.
    #[serde(default)]
    pub nullable: bool,
    /// Backend name; absent keeps the member off the wire.
    #[serde(default)]
    pub backend: Option<String>,
}

impl ArowIR {
    /// Parse an IR document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, GenError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check the version marker.
    pub fn check_version(&self) -> Result<(), GenError> {
        match self.ir_version.as_deref() {
            Some(IR_VERSION) => Ok(()),
            Some(other) => Err(GenError::UnsupportedIrVersion(other.to_owned())),
            None => Err(GenError::MissingIrVersion),
        }
    }

    /// Validate the document and build the schema set.
    pub fn into_schema(self) -> Result<SchemaSet, GenError> {
        self.check_version()?;
        let enums = self
            .enums
            .into_iter()
            .map(|e| {
                Ok(EnumSchema {
                    namespace: Namespace::parse(&e.namespace)?,
                    name: e.name,
                })
            })
            .collect::<Result<Vec<_>, GenError>>()?;
        let records = self
            .records
            .into_iter()
            .map(|r| {
                Ok(RecordSchema {
                    namespace: Namespace::parse(&r.namespace)?,
                    name: r.name,
                    fields: r
                        .fields
                        .into_iter()
                        .map(|f| FieldDef {
                            member: f.name,
                            ty: f.type_name,
                            nullable: f.nullable,
                            backend: f.backend,
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, GenError>>()?;
        SchemaSet::new(records, enums)
    }
}

/// Parse and validate an IR document in one step.
pub fn load_schema(text: &str) -> Result<SchemaSet, GenError> {
    ArowIR::from_json(text)?.into_schema()
}
