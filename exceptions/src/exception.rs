use std::fmt;
use std::sync::Once;

use serde_json::{Map, Value};
use tracing::warn;

use crate::args::Arg;
use crate::config;
use crate::error::Error;
use crate::kind::{Kind, KindId};
use crate::stacktrace;

static CREATE_DEPRECATION: Once = Once::new();

/// One error occurrence: a message, a stack trace (sanitized unless the
/// process-wide switch disables it), and an open set of structured fields.
///
/// `message` and `stack` are always present, possibly empty. The identity
/// of the originating [`Kind`] is carried as a hidden marker: it is never
/// serialized and never appears among the fields.
#[derive(Debug, Clone)]
pub struct Exception {
    message: String,
    stack: String,
    fields: Map<String, Value>,
    kind_id: Option<KindId>,
}

impl Exception {
    /// Zero-argument construction: empty message, trace captured at this
    /// call site.
    pub fn new() -> Self {
        Self::from_args([])
    }

    /// Construct from an ordered sequence of classified arguments, merged
    /// left-to-right:
    ///
    /// - [`Arg::Source`]: message kept only if none captured yet; stack
    ///   text, when present, overwrites any previous one.
    /// - [`Arg::Text`]: becomes the message unconditionally.
    /// - [`Arg::Fields`]: merged into the field set, overwriting per key.
    /// - [`Arg::Skipped`]: ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = Arg>,
    {
        Self::assemble(args, Map::new(), None)
    }

    pub(crate) fn assemble<I>(
        args: I,
        defaults: Map<String, Value>,
        kind_id: Option<KindId>,
    ) -> Self
    where
        I: IntoIterator<Item = Arg>,
    {
        let mut fields = defaults;
        let mut message: Option<String> = None;
        let mut stack: Option<String> = None;

        for arg in args {
            match arg {
                Arg::Source {
                    message: source_message,
                    stack: source_stack,
                } => {
                    // First error's message wins, last error's stack wins.
                    if message.is_none() {
                        message = Some(source_message);
                    }
                    if source_stack.is_some() {
                        stack = source_stack;
                    }
                }
                Arg::Text(text) => message = Some(text),
                Arg::Fields(map) => fields.extend(map),
                Arg::Skipped => {}
            }
        }

        // `message` and `stack` are first-class attributes, never generic
        // fields. A string `message` default fills in when no argument set
        // one; a `stack` key is discarded outright.
        let default_message = match fields.remove("message") {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };
        fields.remove("stack");

        let message = message.or(default_message).unwrap_or_default();
        let stack = stack.unwrap_or_else(|| stacktrace::capture(&message));
        let stack = if config::sanitize_stacks_enabled() {
            stacktrace::sanitize(&stack, stacktrace::exec_path())
        } else {
            stack
        };

        Exception {
            message,
            stack,
            fields,
            kind_id,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// The merged field set, `message` and `stack` excluded.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Attach or overwrite a field after construction. String values under
    /// the reserved `message`/`stack` names update the first-class
    /// attributes instead of the field set.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match (name.as_str(), value) {
            ("message", Value::String(text)) => self.message = text,
            ("stack", Value::String(text)) => self.stack = text,
            (_, value) => {
                self.fields.insert(name, value);
            }
        }
    }

    pub fn kind_id(&self) -> Option<KindId> {
        self.kind_id
    }

    pub(crate) fn set_kind_id(&mut self, kind_id: Option<KindId>) {
        self.kind_id = kind_id;
    }

    /// The canonical membership test: true iff this instance carries the
    /// given kind's identity token.
    pub fn is(&self, kind: &Kind) -> bool {
        self.kind_id == Some(kind.id())
    }

    /// True for any exception produced by this crate, whatever its kind;
    /// false for unrelated error values.
    pub fn is_exception(error: &(dyn std::error::Error + 'static)) -> bool {
        error.is::<Exception>()
    }

    /// Every field of the instance as a plain mapping, `message` included,
    /// `stack` only when asked for.
    pub fn to_object(&self, include_stacktrace: bool) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert("message".to_string(), Value::String(self.message.clone()));
        if include_stacktrace {
            object.insert("stack".to_string(), Value::String(self.stack.clone()));
        }
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        object
    }

    pub fn to_json(&self, include_stacktrace: bool) -> String {
        serde_json::to_string(&self.to_object(include_stacktrace))
            .expect("string-keyed maps serialize")
    }

    /// Rehydrate from JSON text. A direct field transplant: no merge, no
    /// classification, no sanitization. The parse failure of malformed
    /// input surfaces to the caller; the shape itself is trusted.
    pub fn deserialize(text: &str) -> Result<Self, Error> {
        let mut object: Map<String, Value> = serde_json::from_str(text)?;

        let message = match object.remove("message") {
            Some(Value::String(text)) => text,
            _ => String::new(),
        };
        let stack = match object.remove("stack") {
            Some(Value::String(text)) => text,
            _ => String::new(),
        };

        Ok(Exception {
            message,
            stack,
            fields: object,
            kind_id: None,
        })
    }

    /// Deprecated single-error-property builder, kept for callers that
    /// have not moved to [`Kind::define`]. Warns once per process.
    pub fn create<A: Into<CreateArgs>>(mut self, args: A) -> Finisher {
        CREATE_DEPRECATION.call_once(|| {
            warn!("Exception::create is deprecated; define a Kind and construct through it");
        });

        match args.into() {
            CreateArgs::Codename(codename) => {
                self.fields
                    .insert("codename".to_string(), Value::String(codename));
            }
            CreateArgs::Code(code) => {
                self.fields.insert("code".to_string(), Value::from(code));
            }
            CreateArgs::Pair { code, codename } => {
                self.fields.insert("code".to_string(), Value::from(code));
                self.fields
                    .insert("codename".to_string(), Value::String(codename));
            }
            CreateArgs::Params(map) => {
                for (key, value) in map {
                    self.set_field(key, value);
                }
            }
            CreateArgs::None => {
                self.fields.insert("code".to_string(), Value::from(0));
                self.fields
                    .insert("codename".to_string(), Value::String("NONE".to_string()));
            }
        }

        Finisher { exception: self }
    }
}

impl Default for Exception {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Exception {
    /// The message, or the symbolic `codename` field when the message is
    /// empty. Never the stack.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            return f.write_str(&self.message);
        }
        if let Some(Value::String(codename)) = self.fields.get("codename") {
            return f.write_str(codename);
        }
        Ok(())
    }
}

impl std::error::Error for Exception {}

impl serde::Serialize for Exception {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_object(false).serialize(serializer)
    }
}

impl From<&str> for Exception {
    fn from(message: &str) -> Self {
        Self::from_args([Arg::text(message)])
    }
}

impl From<String> for Exception {
    fn from(message: String) -> Self {
        Self::from_args([Arg::Text(message)])
    }
}

/// Argument shapes accepted by the legacy [`Exception::create`] builder.
#[derive(Debug, Clone, Default)]
pub enum CreateArgs {
    /// A bare symbolic name.
    Codename(String),
    /// A bare numeric code.
    Code(i64),
    /// Both, explicitly.
    Pair { code: i64, codename: String },
    /// A structured mapping, merged wholesale.
    Params(Map<String, Value>),
    /// Neither: `code`/`codename` fall back to `0`/`"NONE"`.
    #[default]
    None,
}

impl From<&str> for CreateArgs {
    fn from(codename: &str) -> Self {
        CreateArgs::Codename(codename.to_string())
    }
}

impl From<String> for CreateArgs {
    fn from(codename: String) -> Self {
        CreateArgs::Codename(codename)
    }
}

impl From<i64> for CreateArgs {
    fn from(code: i64) -> Self {
        CreateArgs::Code(code)
    }
}

impl From<(i64, &str)> for CreateArgs {
    fn from((code, codename): (i64, &str)) -> Self {
        CreateArgs::Pair {
            code,
            codename: codename.to_string(),
        }
    }
}

impl From<(i64, String)> for CreateArgs {
    fn from((code, codename): (i64, String)) -> Self {
        CreateArgs::Pair { code, codename }
    }
}

impl From<Map<String, Value>> for CreateArgs {
    fn from(params: Map<String, Value>) -> Self {
        CreateArgs::Params(params)
    }
}

impl From<Value> for CreateArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::String(codename) => CreateArgs::Codename(codename),
            Value::Number(number) => match number.as_i64() {
                Some(code) => CreateArgs::Code(code),
                _ => CreateArgs::None,
            },
            Value::Object(params) => CreateArgs::Params(params),
            _ => CreateArgs::None,
        }
    }
}

/// The callable returned by [`Exception::create`]: finishes the instance
/// with one more optional payload.
#[derive(Debug)]
pub struct Finisher {
    exception: Exception,
}

impl Finisher {
    /// Finish with a payload: mappings merge into the instance, scalars
    /// land in `message` (when still unset) or in a `details` field.
    pub fn with(mut self, params: Value) -> Exception {
        match params {
            Value::Object(map) => {
                for (key, value) in map {
                    self.exception.set_field(key, value);
                }
            }
            Value::Null => {}
            Value::String(text) => {
                if self.exception.message.is_empty() {
                    self.exception.message = text;
                } else {
                    self.exception
                        .fields
                        .insert("details".to_string(), Value::String(text));
                }
            }
            scalar => {
                if self.exception.message.is_empty() {
                    self.exception.message = scalar.to_string();
                } else {
                    self.exception.fields.insert("details".to_string(), scalar);
                }
            }
        }

        self.exception
    }

    /// Finish without a payload.
    pub fn finish(self) -> Exception {
        self.exception
    }
}
