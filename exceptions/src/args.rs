use serde_json::{Map, Value};

use crate::exception::Exception;

/// One constructor argument, already classified. Construction accepts any
/// mix of these, in any order, any count; the merge applies them
/// left-to-right.
#[derive(Debug, Clone)]
pub enum Arg {
    /// A native-error-shaped argument: its message and, when the error
    /// carried one, its raw stack text.
    Source {
        message: String,
        stack: Option<String>,
    },
    /// A bare string, used as the message.
    Text(String),
    /// A structured mapping, merged into the field set key by key.
    Fields(Map<String, Value>),
    /// Any other shape. Ignored by the merge rather than rejected.
    Skipped,
}

impl Arg {
    /// Classify an error value. Exceptions contribute their stack text,
    /// other errors only their message.
    pub fn source(error: &(dyn std::error::Error + 'static)) -> Self {
        if let Some(exception) = error.downcast_ref::<Exception>() {
            return Arg::Source {
                message: exception.message().to_string(),
                stack: Some(exception.stack().to_string()),
            };
        }

        Arg::Source {
            message: error.to_string(),
            stack: None,
        }
    }

    /// A (message, raw stack text) pair from outside the process, e.g. a
    /// trace shipped in an event payload.
    pub fn source_with_stack(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Arg::Source {
            message: message.into(),
            stack: Some(stack.into()),
        }
    }

    pub fn text(message: impl Into<String>) -> Self {
        Arg::Text(message.into())
    }

    pub fn fields(fields: Map<String, Value>) -> Self {
        Arg::Fields(fields)
    }

    /// Classify a loose JSON value the way a dynamically typed caller
    /// would be classified: strings become the message, objects become
    /// fields, everything else (arrays, numbers, bools, null) is skipped.
    pub fn value(value: Value) -> Self {
        match value {
            Value::String(text) => Arg::Text(text),
            Value::Object(map) => Arg::Fields(map),
            _ => Arg::Skipped,
        }
    }
}

impl From<&str> for Arg {
    fn from(message: &str) -> Self {
        Arg::Text(message.to_string())
    }
}

impl From<String> for Arg {
    fn from(message: String) -> Self {
        Arg::Text(message)
    }
}

impl From<Map<String, Value>> for Arg {
    fn from(fields: Map<String, Value>) -> Self {
        Arg::Fields(fields)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::value(value)
    }
}

impl From<&Exception> for Arg {
    fn from(exception: &Exception) -> Self {
        Arg::Source {
            message: exception.message().to_string(),
            stack: Some(exception.stack().to_string()),
        }
    }
}
