//! Client state: view fields mirrored into the rendered markup.
//!
//! A view with a [`ClientStateSchema`] gets a [`ClientState`] per dispatch,
//! seeded from the field defaults. On htmx requests the client posts the
//! state back under `<prefix><element id>`; fields flagged
//! `client_to_server` are then decoded from that JSON and override the
//! defaults. [`ClientStateSchema::render_attrs`] produces the attributes the
//! client-side script reads (`x-data` carries the state).

use std::collections::HashMap;

use hyperpony_core::{HyperponyError, HyperponyResult, Request};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Attribute naming the element that owns a client state.
pub const CLIENT_STATE_ATTR: &str = "__hyperpony_client_state__";

/// JSON shape a field accepts, taken from its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Text; also used for `null` defaults.
    String,
    /// Integer number.
    Integer,
    /// Any number.
    Number,
    /// Boolean.
    Bool,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl FieldKind {
    fn of(default: &Value) -> Self {
        match default {
            Value::Null | Value::String(_) => Self::String,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_f64() => Self::Number,
            Value::Number(_) => Self::Integer,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Bool => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// One client state field.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientStateField {
    default: Value,
    kind: FieldKind,
    client_to_server: bool,
}

impl ClientStateField {
    /// A field the client receives but never sends back.
    #[must_use]
    pub fn new(default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            kind: FieldKind::of(&default),
            default,
            client_to_server: false,
        }
    }

    /// Lets the client send the field back.
    #[must_use]
    pub fn client_to_server(mut self) -> Self {
        self.client_to_server = true;
        self
    }

    /// The default value.
    #[must_use]
    pub const fn default_value(&self) -> &Value {
        &self.default
    }

    /// The accepted JSON shape.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns `true` if inbound values are applied.
    #[must_use]
    pub const fn is_client_to_server(&self) -> bool {
        self.client_to_server
    }
}

/// The client state fields of a view, in declaration order.
///
/// # Example
///
/// ```
/// use hyperpony_view::{ClientStateField, ClientStateSchema};
///
/// let schema = ClientStateSchema::new()
///     .field("count", ClientStateField::new(0))
///     .field("open", ClientStateField::new(false).client_to_server());
///
/// let state = schema.defaults();
/// assert_eq!(
///     schema.render_attrs("Counter", &state).unwrap(),
///     r#"__hyperpony_client_state__='Counter' x-data='{"client_state":{"count":0,"open":false},"client_to_server_excludes":["count"]}'"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientStateSchema {
    fields: IndexMap<String, ClientStateField>,
}

impl ClientStateSchema {
    /// An empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: ClientStateField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClientStateField> {
        self.fields.get(name)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of fields the client must not send back.
    #[must_use]
    pub fn client_to_server_excludes(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, field)| !field.client_to_server)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// State holding every default.
    #[must_use]
    pub fn defaults(&self) -> ClientState {
        ClientState {
            values: self
                .fields
                .iter()
                .map(|(name, field)| (name.clone(), field.default.clone()))
                .collect(),
            present: false,
        }
    }

    /// Applies the inbound JSON of `element_id` to `state`.
    ///
    /// Only `client_to_server` fields are taken; other keys are ignored.
    ///
    /// # Errors
    ///
    /// `ClientState` if `raw` is not a JSON object or a field has the wrong
    /// shape.
    pub fn decode(&self, element_id: &str, raw: &str, state: &mut ClientState) -> HyperponyResult<()> {
        let inbound: IndexMap<String, Value> = serde_json::from_str(raw)
            .map_err(|e| client_state_error(element_id, format!("invalid JSON: {e}")))?;

        for (name, field) in self.fields.iter().filter(|(_, f)| f.client_to_server) {
            let Some(value) = inbound.get(name) else {
                continue;
            };
            let accepted = field.kind.accepts(value) || (value.is_null() && field.default.is_null());
            if !accepted {
                return Err(client_state_error(
                    element_id,
                    format!("field '{name}' expects {}", field.kind.as_str()),
                ));
            }
            state.values.insert(name.clone(), value.clone());
        }

        state.present = true;
        tracing::debug!(element_id, fields = state.values.len(), "client state applied");
        Ok(())
    }

    /// Renders the owner and `x-data` attributes for `state`.
    ///
    /// # Errors
    ///
    /// `ClientState` if the state cannot be serialized.
    pub fn render_attrs(&self, element_id: &str, state: &ClientState) -> HyperponyResult<String> {
        let values: IndexMap<&str, &Value> = self
            .fields
            .keys()
            .filter_map(|name| state.values.get(name).map(|v| (name.as_str(), v)))
            .collect();
        let x_data = serde_json::to_string(&XData {
            client_state: values,
            client_to_server_excludes: self.client_to_server_excludes(),
        })
        .map_err(|e| client_state_error(element_id, e.to_string()))?;
        Ok(format!(
            "{CLIENT_STATE_ATTR}='{}' x-data='{}'",
            escape_single_quoted(element_id),
            escape_single_quoted(&x_data)
        ))
    }
}

#[derive(Serialize)]
struct XData<'a> {
    client_state: IndexMap<&'a str, &'a Value>,
    client_to_server_excludes: Vec<&'a str>,
}

/// The client state values of one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    values: IndexMap<String, Value>,
    present: bool,
}

impl ClientState {
    /// Returns `true` if the client sent state for this element.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.present
    }

    /// The raw JSON value of a field.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// A field deserialized into `T`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.values
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Replaces a field's value.
    ///
    /// # Errors
    ///
    /// `ClientState` if the field is not declared or `value` does not
    /// serialize.
    pub fn set<T: Serialize>(&mut self, name: &str, value: T) -> HyperponyResult<()> {
        let slot = self.values.get_mut(name).ok_or_else(|| {
            HyperponyError::ClientState {
                element_id: String::new(),
                message: format!("unknown client state field '{name}'"),
            }
        })?;
        *slot = serde_json::to_value(value).map_err(|e| HyperponyError::ClientState {
            element_id: String::new(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Iterates over the fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Collects `<prefix><element id>` entries from the form data and query.
///
/// Query values override form values; only the first value of a key is
/// kept.
#[must_use]
pub fn collect_client_states(request: &dyn Request, prefix: &str) -> HashMap<String, String> {
    let mut states = HashMap::new();
    for dict in [request.post(), request.query()] {
        for (key, values) in dict.iter() {
            if let (Some(element_id), Some(first)) = (key.strip_prefix(prefix), values.first()) {
                states.insert(element_id.to_string(), first.clone());
            }
        }
    }
    tracing::trace!(count = states.len(), "collected client states");
    states
}

fn client_state_error(element_id: &str, message: String) -> HyperponyError {
    HyperponyError::ClientState {
        element_id: element_id.to_string(),
        message,
    }
}

fn escape_single_quoted(value: &str) -> String {
    value.replace('&', "&amp;").replace('\'', "&#x27;")
}
