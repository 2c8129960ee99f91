//! Writer/reader schema resolution.
//!
//! Files written under an older schema stay readable under a newer one as long as every
//! field the reader adds declares a default. Fields present only in the writer schema are
//! dropped; fields present in both are copied (and coerced where Avro allows, e.g.
//! `int` to `long`, or a plain value into a nullable union).

use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind};
use apache_avro::Schema;
use apache_avro::schema::{Name, RecordField, ResolvedSchema};
use apache_avro::types::Value;
use std::collections::{HashMap, HashSet};

/// Named types (records, enums, fixed) of one schema, keyed by full name.
type NamedTypes = HashMap<Name, Schema>;

/// A checked `(writer, reader)` schema pair.
#[derive(Debug, Clone)]
pub struct SchemaPair {
    writer: Schema,
    reader: Schema,
    writer_names: NamedTypes,
    reader_names: NamedTypes,
}

impl SchemaPair {
    /// Pair the schemas, failing early if the reader cannot resolve the writer.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleSchema` when a record field added by the reader has no
    /// default, when the two top-level schemas are of unrelated kinds, or when either
    /// schema refers to a named type it never defines.
    pub fn new(writer: Schema, reader: Schema) -> DatasetResult<Self> {
        let pair = Self {
            writer_names: named_types(&writer)?,
            reader_names: named_types(&reader)?,
            writer,
            reader,
        };
        pair.check_compatible(&pair.writer, &pair.reader, "", &mut HashSet::new())?;
        Ok(pair)
    }

    /// Pair for files read under their own schema.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleSchema` if the schema refers to a named type it never defines.
    pub fn identity(schema: Schema) -> DatasetResult<Self> {
        let names = named_types(&schema)?;
        Ok(Self {
            writer: schema.clone(),
            reader: schema,
            writer_names: names.clone(),
            reader_names: names,
        })
    }

    #[must_use]
    pub fn writer(&self) -> &Schema {
        &self.writer
    }

    #[must_use]
    pub fn reader(&self) -> &Schema {
        &self.reader
    }

    /// Project a value decoded under the writer schema onto the reader schema.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleSchema` if a value cannot be coerced to the reader's type.
    pub fn project(&self, value: Value) -> DatasetResult<Value> {
        self.project_onto(value, &self.reader)
    }

    fn check_compatible(
        &self,
        writer: &Schema,
        reader: &Schema,
        path: &str,
        seen: &mut HashSet<(Name, Name)>,
    ) -> DatasetResult<()> {
        let writer = lookup(writer, &self.writer_names)?;
        let reader = lookup(reader, &self.reader_names)?;
        match (writer, reader) {
            (Schema::Record(w), Schema::Record(r)) => {
                // Recursive types are checked once per name pair.
                if !seen.insert((w.name.clone(), r.name.clone())) {
                    return Ok(());
                }
                for rf in &r.fields {
                    let field_path = if path.is_empty() {
                        rf.name.clone()
                    } else {
                        format!("{path}.{}", rf.name)
                    };
                    match w.fields.iter().find(|wf| wf.name == rf.name) {
                        Some(wf) => self.check_compatible(&wf.schema, &rf.schema, &field_path, seen)?,
                        None if rf.default.is_some() => {}
                        None => {
                            return Err(DatasetError::new(
                                ErrorKind::IncompatibleSchema,
                                format!(
                                    "field '{field_path}' is missing from the writer schema and has no default"
                                ),
                            ));
                        }
                    }
                }
                Ok(())
            }
            (Schema::Record(_), other) | (other, Schema::Record(_)) if !is_union(other) => {
                Err(DatasetError::new(
                    ErrorKind::IncompatibleSchema,
                    format!(
                        "cannot read {} as {} at '{}'",
                        kind_name(writer),
                        kind_name(reader),
                        if path.is_empty() { "<root>" } else { path }
                    ),
                ))
            }
            _ => Ok(()),
        }
    }

    fn project_onto(&self, value: Value, reader: &Schema) -> DatasetResult<Value> {
        let Schema::Record(record) = lookup(reader, &self.reader_names)? else {
            return self.resolve(value, reader);
        };
        let fields = match value {
            Value::Record(fields) => fields,
            other => return self.resolve(other, reader),
        };

        let mut by_name: HashMap<String, Value> = fields.into_iter().collect();
        let mut out = Vec::with_capacity(record.fields.len());
        for rf in &record.fields {
            let projected = match by_name.remove(&rf.name) {
                Some(v) => self.project_onto(v, &rf.schema)?,
                None => self.default_value(rf)?,
            };
            out.push((rf.name.clone(), projected));
        }
        Ok(Value::Record(out))
    }

    /// Turn a field's JSON default into a value of its type. For unions the default
    /// belongs to the first branch.
    fn default_value(&self, field: &RecordField) -> DatasetResult<Value> {
        let default = field.default.clone().ok_or_else(|| {
            DatasetError::new(
                ErrorKind::IncompatibleSchema,
                format!("field '{}' has no value and no default", field.name),
            )
        })?;
        let value = Value::from(default);
        match &field.schema {
            Schema::Union(union) => {
                let first = union.variants().first().ok_or_else(|| {
                    DatasetError::new(ErrorKind::IncompatibleSchema, "empty union in reader schema")
                })?;
                let inner = self.resolve(value, first)?;
                Ok(Value::Union(0, Box::new(inner)))
            }
            schema => self.resolve(value, schema),
        }
    }

    /// Resolve against a part of the reader schema, with the whole reader schema in
    /// scope so references to its named types can be followed.
    fn resolve(&self, value: Value, schema: &Schema) -> DatasetResult<Value> {
        value
            .resolve_schemata(schema, vec![&self.reader])
            .map_err(incompatible)
    }
}

fn named_types(schema: &Schema) -> DatasetResult<NamedTypes> {
    let resolved = ResolvedSchema::try_from(schema).map_err(incompatible)?;
    Ok(resolved
        .get_names()
        .iter()
        .map(|(name, schema)| (name.clone(), (*schema).clone()))
        .collect())
}

/// Follow a reference to the named type it stands for. Parsed references carry
/// fully-qualified names.
fn lookup<'a>(schema: &'a Schema, names: &'a NamedTypes) -> DatasetResult<&'a Schema> {
    match schema {
        Schema::Ref { name } => names.get(name).ok_or_else(|| {
            DatasetError::new(
                ErrorKind::IncompatibleSchema,
                format!("unresolved schema reference: {}", name.fullname(None)),
            )
        }),
        other => Ok(other),
    }
}

fn is_union(schema: &Schema) -> bool {
    matches!(schema, Schema::Union(_))
}

fn kind_name(schema: &Schema) -> &'static str {
    match schema {
        Schema::Record(_) => "record",
        Schema::Union(_) => "union",
        Schema::Array(_) => "array",
        Schema::Map(_) => "map",
        Schema::Enum(_) => "enum",
        Schema::Fixed(_) => "fixed",
        _ => "primitive",
    }
}

fn incompatible(err: apache_avro::Error) -> DatasetError {
    DatasetError::new(ErrorKind::IncompatibleSchema, err.to_string())
}

/// Serde support for an optional schema, stored as its JSON text.
pub(crate) mod serde_schema {
    use apache_avro::Schema;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(schema: &Option<Schema>, s: S) -> Result<S::Ok, S::Error> {
        schema
            .as_ref()
            .map(|schema| serde_json::to_string(schema).map_err(serde::ser::Error::custom))
            .transpose()?
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Schema>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|json| Schema::parse_str(&json).map_err(D::Error::custom))
            .transpose()
    }
}
