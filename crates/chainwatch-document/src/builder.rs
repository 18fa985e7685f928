use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use chainwatch_types::{ChainwatchError, Result};

/// Options controlling how documents are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentParams {
    /// Skip optional fields that have no value instead of writing `null`.
    #[serde(default)]
    pub omit_null_fields: bool,

    /// Render JSON with indentation.
    #[serde(default)]
    pub pretty: bool,
}

/// A value that writes itself as an object into an open [`DocumentBuilder`].
pub trait ToDocument {
    fn to_document(&self, builder: &mut DocumentBuilder, params: &DocumentParams) -> Result<()>;
}

struct OpenObject {
    name: Option<String>,
    fields: Map<String, Value>,
}

/// Streaming builder for JSON documents whose object fields keep insertion
/// order.
#[derive(Default)]
pub struct DocumentBuilder {
    stack: Vec<OpenObject>,
    pending_name: Option<String>,
    root: Option<Value>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an object. Inside another object it is attached under the name
    /// set by the preceding [`Self::field_name`].
    pub fn start_object(&mut self) -> Result<&mut Self> {
        let name = self.pending_name.take();
        if !self.stack.is_empty() && name.is_none() {
            return Err(doc_error("nested object started without a field name"));
        }
        if self.stack.is_empty() && self.root.is_some() {
            return Err(doc_error("document already has a root object"));
        }
        self.stack.push(OpenObject {
            name,
            fields: Map::new(),
        });
        Ok(self)
    }

    pub fn start_object_field(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.field_name(name)?;
        self.start_object()
    }

    pub fn end_object(&mut self) -> Result<&mut Self> {
        if self.pending_name.is_some() {
            return Err(doc_error("object closed with a dangling field name"));
        }
        let obj = self
            .stack
            .pop()
            .ok_or_else(|| doc_error("end_object without a matching start_object"))?;
        let value = Value::Object(obj.fields);
        match (self.stack.last_mut(), obj.name) {
            (Some(parent), Some(name)) => {
                parent.fields.insert(name, value);
            }
            (None, _) => self.root = Some(value),
            (Some(_), None) => return Err(doc_error("nested object has no field name")),
        }
        Ok(self)
    }

    /// Names the next object opened with [`Self::start_object`].
    pub fn field_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        if self.stack.is_empty() {
            return Err(doc_error("field name outside of an object"));
        }
        if self.pending_name.is_some() {
            return Err(doc_error("field name set twice"));
        }
        self.pending_name = Some(name.into());
        Ok(self)
    }

    pub fn field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        if self.pending_name.is_some() {
            return Err(doc_error("field written while a field name is pending"));
        }
        let current = self
            .stack
            .last_mut()
            .ok_or_else(|| doc_error("field outside of an object"))?;
        current.fields.insert(name.into(), value.into());
        Ok(self)
    }

    pub fn null_field(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.field(name, Value::Null)
    }

    pub fn optional_field<V: Into<Value>>(
        &mut self,
        name: impl Into<String>,
        value: Option<V>,
        params: &DocumentParams,
    ) -> Result<&mut Self> {
        match value {
            Some(v) => self.field(name, v),
            None if params.omit_null_fields => Ok(self),
            None => self.null_field(name),
        }
    }

    pub fn object_field<T: ToDocument + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
        params: &DocumentParams,
    ) -> Result<&mut Self> {
        let depth = self.stack.len();
        self.field_name(name)?;
        value.to_document(self, params)?;
        if self.pending_name.is_some() || self.stack.len() != depth {
            return Err(doc_error("value did not write exactly one object"));
        }
        Ok(self)
    }

    /// Writes `name` as an object whose fields are `entries`, in iteration order.
    pub fn map_field<'a, I, T>(
        &mut self,
        name: impl Into<String>,
        entries: I,
        params: &DocumentParams,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (&'a str, &'a T)>,
        T: ToDocument + 'a,
    {
        self.start_object_field(name)?;
        for (key, value) in entries {
            self.object_field(key, value, params)?;
        }
        self.end_object()
    }

    /// Finishes the document, failing if any object is still open.
    pub fn build(self) -> Result<Value> {
        if !self.stack.is_empty() {
            return Err(doc_error(format!("{} objects left open", self.stack.len())));
        }
        self.root
            .ok_or_else(|| doc_error("document has no root object"))
    }
}

/// Renders a standalone value as a JSON document.
pub fn to_value<T: ToDocument + ?Sized>(value: &T, params: &DocumentParams) -> Result<Value> {
    let mut builder = DocumentBuilder::new();
    value.to_document(&mut builder, params)?;
    builder.build()
}

pub fn to_json_string(value: &Value, params: &DocumentParams) -> Result<String> {
    let rendered = if params.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.map_err(|e| ChainwatchError::Document(e.to_string()))
}

fn doc_error(msg: impl Into<String>) -> ChainwatchError {
    ChainwatchError::Document(msg.into())
}
