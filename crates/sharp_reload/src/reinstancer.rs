//! Live instance migration
//!
//! After the user assembly is reloaded, every live instance of a managed
//! type whose layout changed is rebuilt against the new layout. Fields that
//! survive with a compatible type keep their values; everything else starts
//! from its default.
//!
//! The new assembly publishes its layouts through
//! [`InstanceReinstancer::stage_layout`] while it loads. Nothing in this
//! crate stages layouts itself: the host's type registration (a custom
//! `AssemblyLoader`, or code driven by the assembly's load hook) must do so
//! before reinstancing runs. Types with no staged layout are treated as
//! unchanged, so a host that never stages anything migrates nothing.

use crate::error::{ReloadError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Post-reload fix-up of live objects
///
/// `start_reinstancing` is fire-and-forget: the pipeline does not wait on or
/// inspect its result.
pub trait Reinstancer: Send + Sync {
    fn initialize(&self);
    fn start_reinstancing(&self);
}

/// Declared type of a managed field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
    Vec3,
    /// Reference to another managed object
    Object,
    Array(Box<FieldType>),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => write!(f, "bool"),
            FieldType::Int => write!(f, "int"),
            FieldType::Float => write!(f, "float"),
            FieldType::String => write!(f, "string"),
            FieldType::Vec3 => write!(f, "vec3"),
            FieldType::Object => write!(f, "object"),
            FieldType::Array(element) => write!(f, "array<{}>", element),
        }
    }
}

/// Value stored in a managed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vec3([f32; 3]),
    /// Object reference by instance id; `None` is a null reference
    Object(Option<u64>),
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// Default value for a field of the given type
    pub fn default_for(field_type: &FieldType) -> Self {
        match field_type {
            FieldType::Bool => FieldValue::Bool(false),
            FieldType::Int => FieldValue::Int(0),
            FieldType::Float => FieldValue::Float(0.0),
            FieldType::String => FieldValue::String(String::new()),
            FieldType::Vec3 => FieldValue::Vec3([0.0; 3]),
            FieldType::Object => FieldValue::Object(None),
            FieldType::Array(_) => FieldValue::Array(Vec::new()),
        }
    }

    /// Whether this value can be stored in a field of `field_type` as is
    pub fn matches(&self, field_type: &FieldType) -> bool {
        match (self, field_type) {
            (FieldValue::Bool(_), FieldType::Bool)
            | (FieldValue::Int(_), FieldType::Int)
            | (FieldValue::Float(_), FieldType::Float)
            | (FieldValue::String(_), FieldType::String)
            | (FieldValue::Vec3(_), FieldType::Vec3)
            | (FieldValue::Object(_), FieldType::Object) => true,
            (FieldValue::Array(items), FieldType::Array(element)) => {
                items.iter().all(|item| item.matches(element))
            }
            _ => false,
        }
    }

    /// Convert into a field of `field_type`, if the types are compatible
    ///
    /// Only lossless widening is allowed besides exact matches; an int that
    /// a float cannot represent exactly does not convert.
    pub fn convert_to(&self, field_type: &FieldType) -> Option<FieldValue> {
        if self.matches(field_type) {
            return Some(self.clone());
        }
        match (self, field_type) {
            (FieldValue::Int(v), FieldType::Float) => {
                let widened = *v as f64;
                (widened as i128 == *v as i128).then_some(FieldValue::Float(widened))
            }
            (FieldValue::Array(items), FieldType::Array(element)) => items
                .iter()
                .map(|item| item.convert_to(element))
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::Array),
            _ => None,
        }
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
            FieldValue::Vec3(_) => "vec3",
            FieldValue::Object(_) => "object",
            FieldValue::Array(_) => "array",
        }
    }
}

/// A named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub name: String,
    pub field_type: FieldType,
}

/// Field layout of one managed type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLayout {
    pub name: String,
    pub fields: Vec<FieldLayout>,
}

impl TypeLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field (builder pattern)
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldLayout {
            name: name.into(),
            field_type,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.field_type)
    }

    fn default_fields(&self) -> BTreeMap<String, FieldValue> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), FieldValue::default_for(&f.field_type)))
            .collect()
    }
}

/// Identifier of a live instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live object of a managed type
#[derive(Debug, Clone, PartialEq)]
pub struct LiveInstance {
    pub id: InstanceId,
    pub type_name: String,
    pub fields: BTreeMap<String, FieldValue>,
    /// Reinstancing pass that last rebuilt this instance (0 = never)
    pub generation: u64,
}

impl LiveInstance {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// Summary of one reinstancing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReinstanceReport {
    /// Types seen for the first time
    pub types_added: usize,
    /// Existing types whose layout changed
    pub types_updated: usize,
    pub instances_migrated: usize,
    /// Fields copied unchanged
    pub fields_preserved: usize,
    /// Fields carried over through a widening conversion
    pub fields_converted: usize,
    /// Fields reset to their default (new or incompatible)
    pub fields_reset: usize,
    /// Fields removed from the layout
    pub fields_dropped: usize,
}

#[derive(Default)]
struct ReinstanceState {
    initialized: bool,
    layouts: HashMap<String, TypeLayout>,
    staged: HashMap<String, TypeLayout>,
    instances: BTreeMap<InstanceId, LiveInstance>,
    next_id: u64,
    generation: u64,
    last_report: Option<ReinstanceReport>,
}

/// Reinstancer that migrates field values between layouts
#[derive(Default)]
pub struct InstanceReinstancer {
    state: Mutex<ReinstanceState>,
}

impl InstanceReinstancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    // ========== Layouts ==========

    /// Register a layout immediately, without migrating anything
    pub fn register_type(&self, layout: TypeLayout) {
        log::debug!("Registered managed type: {}", layout.name);
        self.state.lock().layouts.insert(layout.name.clone(), layout);
    }

    /// Stage a layout published by a freshly loaded assembly
    pub fn stage_layout(&self, layout: TypeLayout) {
        self.state.lock().staged.insert(layout.name.clone(), layout);
    }

    pub fn staged_count(&self) -> usize {
        self.state.lock().staged.len()
    }

    /// Current layout of a type
    pub fn layout(&self, type_name: &str) -> Option<TypeLayout> {
        self.state.lock().layouts.get(type_name).cloned()
    }

    // ========== Instances ==========

    /// Create an instance with default field values
    pub fn spawn(&self, type_name: &str) -> Result<InstanceId> {
        let mut state = self.state.lock();
        let fields = state
            .layouts
            .get(type_name)
            .ok_or_else(|| ReloadError::TypeNotFound(type_name.to_string()))?
            .default_fields();

        state.next_id += 1;
        let id = InstanceId(state.next_id);
        state.instances.insert(
            id,
            LiveInstance {
                id,
                type_name: type_name.to_string(),
                fields,
                generation: 0,
            },
        );
        Ok(id)
    }

    pub fn despawn(&self, id: InstanceId) -> bool {
        self.state.lock().instances.remove(&id).is_some()
    }

    pub fn set_field(&self, id: InstanceId, field: &str, value: FieldValue) -> Result<()> {
        let mut state = self.state.lock();
        let ReinstanceState {
            layouts, instances, ..
        } = &mut *state;

        let instance = instances
            .get_mut(&id)
            .ok_or(ReloadError::InstanceNotFound(id.0))?;
        let field_type = layouts
            .get(&instance.type_name)
            .and_then(|layout| layout.field(field))
            .ok_or_else(|| ReloadError::FieldNotFound {
                type_name: instance.type_name.clone(),
                field: field.to_string(),
            })?;

        if !value.matches(field_type) {
            return Err(ReloadError::FieldTypeMismatch {
                field: field.to_string(),
                expected: field_type.to_string(),
                found: value.type_name().to_string(),
            });
        }

        instance.fields.insert(field.to_string(), value);
        Ok(())
    }

    /// Snapshot of an instance
    pub fn instance(&self, id: InstanceId) -> Option<LiveInstance> {
        self.state.lock().instances.get(&id).cloned()
    }

    pub fn instance_count(&self) -> usize {
        self.state.lock().instances.len()
    }

    pub fn last_report(&self) -> Option<ReinstanceReport> {
        self.state.lock().last_report.clone()
    }

    // ========== Migration ==========

    /// Commit staged layouts and rebuild affected instances
    pub fn reinstance(&self) -> ReinstanceReport {
        let mut state = self.state.lock();
        let mut report = ReinstanceReport::default();

        if state.staged.is_empty() {
            state.last_report = Some(report.clone());
            return report;
        }

        state.generation += 1;
        let generation = state.generation;
        let staged = std::mem::take(&mut state.staged);

        for (name, new_layout) in staged {
            if state.layouts.get(&name) == Some(&new_layout) {
                continue;
            }
            let Some(old_layout) = state.layouts.get(&name).cloned() else {
                report.types_added += 1;
                state.layouts.insert(name, new_layout);
                continue;
            };

            report.types_updated += 1;
            for instance in state.instances.values_mut().filter(|i| i.type_name == name) {
                migrate_instance(instance, &old_layout, &new_layout, &mut report);
                instance.generation = generation;
                report.instances_migrated += 1;
            }

            log::debug!("Reinstanced type {}", name);
            state.layouts.insert(name, new_layout);
        }

        state.last_report = Some(report.clone());
        report
    }
}

fn migrate_instance(
    instance: &mut LiveInstance,
    old_layout: &TypeLayout,
    new_layout: &TypeLayout,
    report: &mut ReinstanceReport,
) {
    let mut old_fields = std::mem::take(&mut instance.fields);

    for field in &new_layout.fields {
        let carried = old_layout
            .field(&field.name)
            .and_then(|_| old_fields.remove(&field.name))
            .and_then(|old| {
                let preserved = old.matches(&field.field_type);
                old.convert_to(&field.field_type).map(|value| (value, preserved))
            });

        let value = match carried {
            Some((value, true)) => {
                report.fields_preserved += 1;
                value
            }
            Some((value, false)) => {
                report.fields_converted += 1;
                value
            }
            None => {
                report.fields_reset += 1;
                FieldValue::default_for(&field.field_type)
            }
        };
        instance.fields.insert(field.name.clone(), value);
    }

    report.fields_dropped += old_layout
        .fields
        .iter()
        .filter(|f| new_layout.field(&f.name).is_none())
        .count();
}

impl Reinstancer for InstanceReinstancer {
    fn initialize(&self) {
        let mut state = self.state.lock();
        if !state.initialized {
            state.initialized = true;
            log::info!("Reinstancer initialized");
        }
    }

    fn start_reinstancing(&self) {
        if !self.is_initialized() {
            log::warn!("Reinstancing requested before the reinstancer was initialized");
            return;
        }

        let report = self.reinstance();
        log::info!(
            "Reinstanced {} instance(s) across {} changed type(s), {} new type(s)",
            report.instances_migrated,
            report.types_updated,
            report.types_added
        );
    }
}

impl fmt::Debug for InstanceReinstancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InstanceReinstancer")
            .field("initialized", &state.initialized)
            .field("types", &state.layouts.len())
            .field("instances", &state.instances.len())
            .finish()
    }
}
